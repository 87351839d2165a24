pub mod error;
pub mod pane;
pub mod split_tree;
pub mod tree;

pub use error::TreeError;
pub use pane::{ContentKind, Pane, PaneContent, PaneId, PaneIdGen};
pub use split_tree::SplitTree;
pub use tree::{Node, Split};
