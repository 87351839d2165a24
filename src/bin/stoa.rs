use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use serde::Serialize;
use stoa_wm::common::config::{Config, config_file};
use stoa_wm::common::geometry::{Rect, Size};
use stoa_wm::common::log;
use stoa_wm::layout_engine::{Direction, InsertDirection, LayoutCommand, LayoutEngine};
use stoa_wm::model::{ContentKind, PaneContent, PaneId, SplitTree};

#[derive(Parser)]
#[command(version, about = "Inspect and edit a stoa split layout")]
struct Cli {
    /// Layout file to operate on (overrides the configured restore file).
    #[arg(long, value_name = "PATH", global = true)]
    layout: Option<PathBuf>,

    /// Path to configuration file to use (overrides default).
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the tree and the rectangle of every pane.
    Show {
        #[arg(long, default_value_t = 1920.0)]
        width: f64,
        #[arg(long, default_value_t = 1080.0)]
        height: f64,
        /// Print JSON instead of the ascii tree.
        #[arg(long)]
        json: bool,
    },
    /// Split a pane and print the id of the new one.
    Split {
        at: PaneId,
        /// left, right, above (up) or below (down).
        direction: InsertDirection,
        /// terminal, web_view=URL, browser=URL or editor=PATH.
        #[arg(long, value_parser = parse_content)]
        content: Option<PaneContent>,
    },
    /// Remove a pane; its sibling takes over the space.
    Close { pane: PaneId },
    /// Print the pane focus would move to, or `none`.
    Focus { pane: PaneId, direction: Direction },
    /// Check the configuration and the layout file.
    Validate,
    /// Replace the layout with a single empty pane.
    Reset,
}

#[derive(Serialize)]
struct ShowOutput<'a> {
    tree: &'a SplitTree,
    bounds: Vec<PaneBounds>,
}

#[derive(Serialize)]
struct PaneBounds {
    pane: PaneId,
    rect: Rect,
}

fn parse_content(s: &str) -> Result<PaneContent, String> {
    let (kind, value) = match s.split_once('=') {
        Some((kind, value)) => (kind, Some(value)),
        None => (s, None),
    };
    let kind: ContentKind = kind.parse().map_err(|_| format!("unknown content kind: {kind}"))?;
    match (kind, value) {
        (ContentKind::Terminal, None) => Ok(PaneContent::Terminal),
        (ContentKind::Terminal, Some(_)) => Err("terminal takes no value".to_string()),
        (ContentKind::WebView, Some(url)) => Ok(PaneContent::WebView { url: url.to_string() }),
        (ContentKind::Browser, Some(url)) => Ok(PaneContent::Browser { url: url.to_string() }),
        (ContentKind::Editor, Some(path)) => Ok(PaneContent::Editor { path: path.into() }),
        (kind, None) => Err(format!("{kind} needs a value, e.g. {kind}=...")),
    }
}

fn open_layout(path: &Path, config: &Config) -> anyhow::Result<LayoutEngine> {
    if !path.exists() {
        return Ok(LayoutEngine::new(&config.settings));
    }
    let tree = LayoutEngine::load(path)
        .with_context(|| format!("Could not load layout {}", path.display()))?;
    Ok(LayoutEngine::with_tree(tree, &config.settings))
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config_path = cli.config.unwrap_or_else(config_file);
    let config = Config::read_or_default(&config_path)?;
    let layout_path = cli.layout.unwrap_or_else(|| config.settings.restore.file());

    match cli.command {
        Commands::Show { width, height, json } => {
            let engine = open_layout(&layout_path, &config)?;
            let viewport = Rect::from_size(Size::new(width, height));
            let bounds: Vec<PaneBounds> = engine
                .calculate_layout(viewport)
                .into_iter()
                .map(|(pane, rect)| PaneBounds { pane, rect })
                .collect();
            if json {
                let output = ShowOutput { tree: engine.tree(), bounds };
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else {
                print!("{}", engine.tree());
                for PaneBounds { pane, rect } in bounds {
                    println!(
                        "pane {pane}: x={} y={} w={} h={}",
                        rect.min_x(),
                        rect.min_y(),
                        rect.size.width,
                        rect.size.height
                    );
                }
            }
        }
        Commands::Split { at, direction, content } => {
            let mut engine = open_layout(&layout_path, &config)?;
            let response = engine.handle_command(LayoutCommand::SplitAt {
                at,
                direction,
                content: content.unwrap_or_default(),
            });
            let Some(created) = response.created.first() else {
                bail!("Pane not found: {at}");
            };
            engine.save(&layout_path)?;
            println!("{created}");
        }
        Commands::Close { pane } => {
            let mut engine = open_layout(&layout_path, &config)?;
            let response = engine.handle_command(LayoutCommand::Close(pane));
            if response.removed.is_empty() {
                bail!("Pane not found: {pane}");
            }
            engine.save(&layout_path)?;
        }
        Commands::Focus { pane, direction } => {
            let engine = open_layout(&layout_path, &config)?;
            let tree = engine.tree();
            let Some(from) = tree.find(pane) else {
                bail!("Pane not found: {pane}");
            };
            let metric = config.settings.navigation.distance;
            match tree.focus_target_with(from, direction, metric) {
                Some(target) => println!("{}", target.id),
                None => println!("none"),
            }
        }
        Commands::Validate => {
            let issues = config.validate();
            if !issues.is_empty() {
                for issue in issues {
                    eprintln!("{}", issue);
                }
                process::exit(1);
            }
            if layout_path.exists() {
                LayoutEngine::load(&layout_path)
                    .with_context(|| format!("Could not load layout {}", layout_path.display()))?;
            }
            println!("Config validation passed");
        }
        Commands::Reset => LayoutEngine::new(&config.settings).save(&layout_path)?,
    }
    Ok(())
}

fn main() {
    sigpipe::reset();
    let cli = Cli::parse();
    log::init_logging();

    if let Err(err) = run(cli) {
        eprintln!("{err:#}");
        process::exit(1);
    }
}
