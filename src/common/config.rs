use std::path::{Path, PathBuf};

use anyhow::bail;
use serde::{Deserialize, Serialize};

use crate::layout_engine::DistanceMetric;

fn home_dir() -> PathBuf { dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")) }

pub fn data_dir() -> PathBuf { home_dir().join(".stoa") }
pub fn restore_file() -> PathBuf { data_dir().join("layout.ron") }
pub fn config_file() -> PathBuf { home_dir().join(".config").join("stoa").join("config.toml") }

#[derive(Serialize, Deserialize, Debug, Default, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub settings: Settings,
}

#[derive(Serialize, Deserialize, Debug, Default, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    #[serde(default)]
    pub layout: LayoutSettings,
    #[serde(default)]
    pub navigation: NavigationSettings,
    #[serde(default)]
    pub restore: RestoreSettings,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct LayoutSettings {
    /// Smallest ratio a divider drag or resize may produce.
    #[serde(default = "default_min_ratio")]
    pub min_ratio: f64,
    #[serde(default = "default_max_ratio")]
    pub max_ratio: f64,
    /// Ratio change applied by one resize step.
    #[serde(default = "default_resize_step")]
    pub resize_step: f64,
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            min_ratio: default_min_ratio(),
            max_ratio: default_max_ratio(),
            resize_step: default_resize_step(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Default, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct NavigationSettings {
    #[serde(default)]
    pub distance: DistanceMetric,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct RestoreSettings {
    #[serde(default = "yes")]
    pub enabled: bool,
    /// Overrides the default restore file location.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl Default for RestoreSettings {
    fn default() -> Self { Self { enabled: true, path: None } }
}

impl RestoreSettings {
    pub fn file(&self) -> PathBuf { self.path.clone().unwrap_or_else(restore_file) }
}

fn yes() -> bool { true }

fn default_min_ratio() -> f64 { 0.1 }

fn default_max_ratio() -> f64 { 0.9 }

fn default_resize_step() -> f64 { 0.05 }

impl LayoutSettings {
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();

        for (name, value) in [("min_ratio", self.min_ratio), ("max_ratio", self.max_ratio)] {
            if !(value > 0.0 && value < 1.0) {
                issues.push(format!("layout.{name} must be between 0 and 1 exclusive, got {value}"));
            }
        }

        if self.min_ratio >= self.max_ratio {
            issues.push(format!(
                "layout.min_ratio ({}) must be less than layout.max_ratio ({})",
                self.min_ratio, self.max_ratio
            ));
        }

        if !(self.resize_step > 0.0 && self.resize_step <= 0.5) {
            issues.push(format!(
                "layout.resize_step must be in (0, 0.5], got {}",
                self.resize_step
            ));
        }

        issues
    }

    /// Clamps a ratio into the configured range.
    pub fn clamp_ratio(&self, ratio: f64) -> f64 {
        if self.min_ratio < self.max_ratio {
            ratio.clamp(self.min_ratio, self.max_ratio)
        } else {
            ratio
        }
    }
}

impl Settings {
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();

        issues.extend(self.layout.validate());

        if let Some(path) = &self.restore.path
            && path.as_os_str().is_empty()
        {
            issues.push("restore.path must not be empty".to_string());
        }

        issues
    }
}

impl Config {
    pub fn read(path: &Path) -> anyhow::Result<Config> {
        let buf = std::fs::read_to_string(path)?;
        Self::parse(&buf)
    }

    /// Reads `path` when it exists, otherwise returns the defaults.
    pub fn read_or_default(path: &Path) -> anyhow::Result<Config> {
        if path.exists() { Self::read(path) } else { Ok(Config::default()) }
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let toml_string = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, toml_string.as_bytes())?;
        Ok(())
    }

    /// Validates the entire configuration and returns a list of issues found.
    pub fn validate(&self) -> Vec<String> { self.settings.validate() }

    pub fn parse(buf: &str) -> anyhow::Result<Config> {
        match toml::from_str::<Config>(buf) {
            Ok(config) => Ok(config),
            Err(e) => bail!("Could not parse config: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_file_matches_defaults() {
        let config = Config::parse(include_str!("../../stoa.default.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_empty_config_is_default_and_valid() {
        let config = Config::parse("").unwrap();
        assert_eq!(config, Config::default());
        assert!(config.validate().is_empty());
    }

    #[test]
    fn test_partial_config_keeps_other_defaults() {
        let config = Config::parse(
            r#"
            [settings.layout]
            min_ratio = 0.2

            [settings.navigation]
            distance = "edge"
            "#,
        )
        .unwrap();
        assert_eq!(config.settings.layout.min_ratio, 0.2);
        assert_eq!(config.settings.layout.max_ratio, 0.9);
        assert_eq!(config.settings.navigation.distance, DistanceMetric::Edge);
        assert!(config.settings.restore.enabled);
    }

    #[test]
    fn test_unknown_fields_are_rejected() {
        assert!(Config::parse("[settings.layout]\ngap = 4").is_err());
        assert!(Config::parse("[settings.navigation]\ndistance = \"manhattan\"").is_err());
    }

    #[test]
    fn test_layout_validation_out_of_range() {
        let layout = LayoutSettings {
            min_ratio: 0.0,
            max_ratio: 1.2,
            resize_step: 0.05,
        };
        let issues = layout.validate();
        assert_eq!(issues.len(), 2);
        assert!(issues[0].contains("min_ratio"));
        assert!(issues[1].contains("max_ratio"));
    }

    #[test]
    fn test_layout_validation_inverted_bounds() {
        let layout = LayoutSettings {
            min_ratio: 0.8,
            max_ratio: 0.2,
            resize_step: 0.05,
        };
        assert!(layout.validate().iter().any(|i| i.contains("must be less than")));
    }

    #[test]
    fn test_layout_validation_resize_step() {
        let layout = LayoutSettings { resize_step: 0.0, ..LayoutSettings::default() };
        assert_eq!(layout.validate().len(), 1);
        let layout = LayoutSettings { resize_step: 0.6, ..LayoutSettings::default() };
        assert_eq!(layout.validate().len(), 1);
    }

    #[test]
    fn test_clamp_ratio() {
        let layout = LayoutSettings::default();
        assert_eq!(layout.clamp_ratio(0.02), 0.1);
        assert_eq!(layout.clamp_ratio(0.97), 0.9);
        assert_eq!(layout.clamp_ratio(0.42), 0.42);
    }

    #[test]
    fn test_empty_restore_path_is_an_issue() {
        let mut config = Config::default();
        config.settings.restore.path = Some(PathBuf::new());
        assert_eq!(config.validate().len(), 1);
    }

    #[test]
    fn test_restore_file_override() {
        let mut restore = RestoreSettings::default();
        assert_eq!(restore.file(), restore_file());
        restore.path = Some(PathBuf::from("/tmp/custom.ron"));
        assert_eq!(restore.file(), PathBuf::from("/tmp/custom.ron"));
    }

    #[test]
    fn test_save_and_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut config = Config::default();
        config.settings.layout.resize_step = 0.1;
        config.settings.navigation.distance = DistanceMetric::Edge;
        config.save(&path).unwrap();
        assert_eq!(Config::read(&path).unwrap(), config);
    }

    #[test]
    fn test_read_or_default_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::read_or_default(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, Config::default());
    }
}
