use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Identity of a pane, stable for its whole lifetime and never reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaneId(u64);

impl PaneId {
    /// Reserved: the generator saturates here, so no tree may hold it.
    pub const MAX: PaneId = PaneId(u64::MAX);

    pub const fn new(raw: u64) -> Self { PaneId(raw) }

    pub fn get(self) -> u64 { self.0 }
}

impl fmt::Display for PaneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

impl std::str::FromStr for PaneId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> { s.parse().map(PaneId) }
}

/// Hands out increasing pane ids.
#[derive(Clone, Debug, Default)]
pub struct PaneIdGen {
    next: u64,
}

impl PaneIdGen {
    pub fn new() -> Self { Self::default() }

    /// Starts strictly after every id in `existing`.
    pub fn after<'a>(existing: impl IntoIterator<Item = &'a PaneId>) -> Self {
        let next = existing.into_iter().map(|id| id.0.saturating_add(1)).max().unwrap_or(0);
        PaneIdGen { next }
    }

    pub fn next_id(&mut self) -> PaneId {
        let id = PaneId(self.next);
        self.next = self.next.saturating_add(1);
        id
    }

    /// Never moves backwards, so ids handed out earlier stay unique.
    pub fn observe(&mut self, id: PaneId) { self.next = self.next.max(id.0.saturating_add(1)); }
}

/// The kinds of content a pane can be assigned.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum ContentKind {
    Terminal,
    WebView,
    Browser,
    Editor,
}

/// What a pane displays.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaneContent {
    /// Waiting for the user to pick a kind.
    #[default]
    Unselected,
    Terminal,
    /// A lightweight web view.
    WebView { url: String },
    /// An embedded browser engine view.
    Browser { url: String },
    Editor { path: PathBuf },
}

impl PaneContent {
    pub fn kind(&self) -> Option<ContentKind> {
        match self {
            PaneContent::Unselected => None,
            PaneContent::Terminal => Some(ContentKind::Terminal),
            PaneContent::WebView { .. } => Some(ContentKind::WebView),
            PaneContent::Browser { .. } => Some(ContentKind::Browser),
            PaneContent::Editor { .. } => Some(ContentKind::Editor),
        }
    }

    pub fn is_unselected(&self) -> bool { matches!(self, PaneContent::Unselected) }
}

impl fmt::Display for PaneContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaneContent::Unselected => f.write_str("unselected"),
            PaneContent::Terminal => f.write_str("terminal"),
            PaneContent::WebView { url } => write!(f, "web_view {url}"),
            PaneContent::Browser { url } => write!(f, "browser {url}"),
            PaneContent::Editor { path } => write!(f, "editor {}", path.display()),
        }
    }
}

/// One rectangular content area.
///
/// Realized views for a pane live with the controller, keyed by [`PaneId`];
/// see [`crate::layout_engine::RealizedPanes`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Pane {
    pub id: PaneId,
    #[serde(default)]
    pub content: PaneContent,
    /// Kind highlighted in an unconfirmed selector. Never persisted.
    #[serde(skip)]
    pub pending_selection: Option<ContentKind>,
}

impl Pane {
    pub fn new(id: PaneId, content: PaneContent) -> Self {
        Pane { id, content, pending_selection: None }
    }

    pub fn unselected(id: PaneId) -> Self { Self::new(id, PaneContent::Unselected) }

    pub fn with_content(&self, content: PaneContent) -> Self {
        Pane {
            id: self.id,
            content,
            pending_selection: None,
        }
    }

    pub fn with_pending_selection(&self, kind: Option<ContentKind>) -> Self {
        Pane {
            pending_selection: kind,
            ..self.clone()
        }
    }
}

/// Panes are the same pane when their ids match, whatever they display.
impl PartialEq for Pane {
    fn eq(&self, other: &Self) -> bool { self.id == other.id }
}

impl Eq for Pane {}
