use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::common::geometry::Size;
use crate::layout_engine::{InsertDirection, Orientation};
use crate::model::error::TreeError;
use crate::model::pane::{Pane, PaneId};

pub const DEFAULT_RATIO: f64 = 0.5;

/// Binary layout tree node.
///
/// Nodes are immutable. Every edit returns a new root and shares every subtree
/// that is not on the path from the root to the edited node.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Node {
    Leaf(Pane),
    Split(Split),
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Split {
    #[serde(rename = "direction")]
    pub orientation: Orientation,
    /// Fraction of the split's extent given to `left`.
    pub ratio: f64,
    pub left: Arc<Node>,
    pub right: Arc<Node>,
}

impl Split {
    fn with_children(&self, left: Arc<Node>, right: Arc<Node>) -> Split {
        Split {
            orientation: self.orientation,
            ratio: self.ratio,
            left,
            right,
        }
    }

    fn with_ratio(&self, ratio: f64) -> Split {
        Split {
            orientation: self.orientation,
            ratio,
            left: Arc::clone(&self.left),
            right: Arc::clone(&self.right),
        }
    }

    /// Whether `target` is one of the two direct children.
    pub fn has_child(&self, target: &Node) -> bool {
        *self.left == *target || *self.right == *target
    }
}

fn same_subtree(a: &Arc<Node>, b: &Arc<Node>) -> bool { Arc::ptr_eq(a, b) || **a == **b }

impl PartialEq for Split {
    fn eq(&self, other: &Self) -> bool {
        self.orientation == other.orientation
            && self.ratio == other.ratio
            && same_subtree(&self.left, &other.left)
            && same_subtree(&self.right, &other.right)
    }
}

/// Leaves compare by pane id only, so a pane whose content changed is still
/// found by searches.
impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Node::Leaf(a), Node::Leaf(b)) => a.id == b.id,
            (Node::Split(a), Node::Split(b)) => a == b,
            _ => false,
        }
    }
}

impl Node {
    pub fn leaf(pane: Pane) -> Node { Node::Leaf(pane) }

    pub fn split(orientation: Orientation, ratio: f64, left: Node, right: Node) -> Node {
        Node::Split(Split {
            orientation,
            ratio,
            left: Arc::new(left),
            right: Arc::new(right),
        })
    }

    pub fn pane(&self) -> Option<&Pane> {
        match self {
            Node::Leaf(pane) => Some(pane),
            Node::Split(_) => None,
        }
    }

    pub fn as_split(&self) -> Option<&Split> {
        match self {
            Node::Leaf(_) => None,
            Node::Split(split) => Some(split),
        }
    }

    pub fn is_leaf(&self) -> bool { matches!(self, Node::Leaf(_)) }

    pub fn contains(&self, target: &Node) -> bool {
        if self == target {
            return true;
        }
        match self {
            Node::Leaf(_) => false,
            Node::Split(split) => split.left.contains(target) || split.right.contains(target),
        }
    }

    pub fn contains_pane(&self, id: PaneId) -> bool {
        match self {
            Node::Leaf(pane) => pane.id == id,
            Node::Split(split) => split.left.contains_pane(id) || split.right.contains_pane(id),
        }
    }

    /// Replaces the leaf holding `at` with a split of `new_pane` and `at`.
    pub fn insert(
        self: &Arc<Self>,
        new_pane: Pane,
        at: &Pane,
        direction: InsertDirection,
    ) -> Result<Arc<Node>, TreeError> {
        self.insert_at(&new_pane, at.id, direction).ok_or(TreeError::PaneNotFound(at.id))
    }

    fn insert_at(
        self: &Arc<Self>,
        new_pane: &Pane,
        at: PaneId,
        direction: InsertDirection,
    ) -> Option<Arc<Node>> {
        match &**self {
            Node::Leaf(existing) if existing.id == at => {
                let existing = Arc::clone(self);
                let created = Arc::new(Node::Leaf(new_pane.clone()));
                let (left, right) = if direction.new_pane_first() {
                    (created, existing)
                } else {
                    (existing, created)
                };
                Some(Arc::new(Node::Split(Split {
                    orientation: direction.orientation(),
                    ratio: DEFAULT_RATIO,
                    left,
                    right,
                })))
            }
            Node::Leaf(_) => None,
            Node::Split(split) => {
                if let Some(left) = split.left.insert_at(new_pane, at, direction) {
                    return Some(Arc::new(Node::Split(
                        split.with_children(left, Arc::clone(&split.right)),
                    )));
                }
                split.right.insert_at(new_pane, at, direction).map(|right| {
                    Arc::new(Node::Split(split.with_children(Arc::clone(&split.left), right)))
                })
            }
        }
    }

    /// Removes `target`, collapsing any split left with a single child.
    ///
    /// Returns `None` when nothing remains of this subtree.
    pub fn remove(self: &Arc<Self>, target: &Node) -> Option<Arc<Node>> {
        if **self == *target {
            return None;
        }
        let Node::Split(split) = &**self else {
            return Some(Arc::clone(self));
        };
        match (split.left.remove(target), split.right.remove(target)) {
            (Some(left), Some(right)) => {
                if Arc::ptr_eq(&left, &split.left) && Arc::ptr_eq(&right, &split.right) {
                    Some(Arc::clone(self))
                } else {
                    Some(Arc::new(Node::Split(split.with_children(left, right))))
                }
            }
            (Some(only), None) | (None, Some(only)) => Some(only),
            (None, None) => None,
        }
    }

    /// Panes in left-to-right, depth-first order.
    pub fn leaves(&self) -> Vec<&Pane> {
        fn collect<'a>(node: &'a Node, out: &mut Vec<&'a Pane>) {
            match node {
                Node::Leaf(pane) => out.push(pane),
                Node::Split(split) => {
                    collect(&split.left, out);
                    collect(&split.right, out);
                }
            }
        }
        let mut out = Vec::new();
        collect(self, &mut out);
        out
    }

    pub fn leaf_count(&self) -> usize {
        match self {
            Node::Leaf(_) => 1,
            Node::Split(split) => split.left.leaf_count() + split.right.leaf_count(),
        }
    }

    pub fn leftmost_leaf(&self) -> &Pane {
        let mut node = self;
        loop {
            match node {
                Node::Leaf(pane) => return pane,
                Node::Split(split) => node = &split.left,
            }
        }
    }

    pub fn rightmost_leaf(&self) -> &Pane {
        let mut node = self;
        loop {
            match node {
                Node::Leaf(pane) => return pane,
                Node::Split(split) => node = &split.right,
            }
        }
    }

    /// The split that has `target` as a direct child.
    pub fn parent_of(&self, target: &Node) -> Option<&Split> {
        let Node::Split(split) = self else {
            return None;
        };
        if split.has_child(target) {
            return Some(split);
        }
        split.left.parent_of(target).or_else(|| split.right.parent_of(target))
    }

    /// Sets the ratio of the split that has `target` as a direct child.
    ///
    /// `target` itself is left untouched. Returns `None` when no split has it
    /// as a child.
    pub fn update_parent_ratio(self: &Arc<Self>, target: &Node, ratio: f64) -> Option<Arc<Node>> {
        let Node::Split(split) = &**self else {
            return None;
        };
        if split.has_child(target) {
            return Some(Arc::new(Node::Split(split.with_ratio(ratio))));
        }
        if let Some(left) = split.left.update_parent_ratio(target, ratio) {
            return Some(Arc::new(Node::Split(
                split.with_children(left, Arc::clone(&split.right)),
            )));
        }
        split
            .right
            .update_parent_ratio(target, ratio)
            .map(|right| Arc::new(Node::Split(split.with_children(Arc::clone(&split.left), right))))
    }

    /// Swaps in a new value for the leaf with the same pane id.
    pub fn replace_pane(self: &Arc<Self>, pane: &Pane) -> Option<Arc<Node>> {
        match &**self {
            Node::Leaf(existing) if existing.id == pane.id => Some(Arc::new(Node::Leaf(pane.clone()))),
            Node::Leaf(_) => None,
            Node::Split(split) => {
                if let Some(left) = split.left.replace_pane(pane) {
                    return Some(Arc::new(Node::Split(
                        split.with_children(left, Arc::clone(&split.right)),
                    )));
                }
                split.right.replace_pane(pane).map(|right| {
                    Arc::new(Node::Split(split.with_children(Arc::clone(&split.left), right)))
                })
            }
        }
    }

    /// Natural size in unit cells: a leaf is 1x1, a split adds its children
    /// along its axis and takes the larger of the two across it.
    pub fn dimensions(&self) -> Size {
        match self {
            Node::Leaf(_) => Size::UNIT,
            Node::Split(split) => {
                let left = split.left.dimensions();
                let right = split.right.dimensions();
                match split.orientation {
                    Orientation::Horizontal => Size::new(
                        left.width + right.width,
                        f64::max(left.height, right.height),
                    ),
                    Orientation::Vertical => Size::new(
                        f64::max(left.width, right.width),
                        left.height + right.height,
                    ),
                }
            }
        }
    }

    pub(crate) fn ascii_tree(&self) -> ascii_tree::Tree {
        match self {
            Node::Leaf(pane) => ascii_tree::Tree::Leaf(vec![format!(
                "pane {} [{}]",
                pane.id, pane.content
            )]),
            Node::Split(split) => ascii_tree::Tree::Node(
                format!("{} {:.2}", split.orientation, split.ratio),
                vec![split.left.ascii_tree(), split.right.ascii_tree()],
            ),
        }
    }
}
