use thiserror::Error;

use crate::model::pane::PaneId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TreeError {
    #[error("Pane not found: {0}")]
    PaneNotFound(PaneId),
    #[error("Pane already in tree: {0}")]
    DuplicatePane(PaneId),
    #[error("Malformed layout data: {0}")]
    Malformed(String),
    #[error("Could not encode layout: {0}")]
    Encode(String),
}
