use std::fmt;
use std::sync::Arc;

use ron::ser::PrettyConfig;
use serde::{Deserialize, Serialize};
use static_assertions::assert_impl_all;

use crate::common::collections::HashSet;
use crate::common::geometry::Size;
use crate::layout_engine::{Direction, DistanceMetric, InsertDirection, SpatialIndex};
use crate::model::error::TreeError;
use crate::model::pane::{Pane, PaneId};
use crate::model::tree::{Node, Split};

/// The layout of one window: an optional root node.
///
/// Every operation returns a new tree and leaves `self` untouched.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SplitTree {
    root: Option<Arc<Node>>,
}

assert_impl_all!(SplitTree: Send, Sync);

impl SplitTree {
    pub fn empty() -> Self { SplitTree { root: None } }

    pub fn singleton(pane: Pane) -> Self { SplitTree { root: Some(Arc::new(Node::Leaf(pane))) } }

    pub fn from_root(root: Node) -> Self { SplitTree { root: Some(Arc::new(root)) } }

    pub fn is_empty(&self) -> bool { self.root.is_none() }

    pub fn root(&self) -> Option<&Node> { self.root.as_deref() }

    pub fn insert(
        &self,
        pane: Pane,
        at: &Pane,
        direction: InsertDirection,
    ) -> Result<SplitTree, TreeError> {
        let root = self.root.as_ref().ok_or(TreeError::PaneNotFound(at.id))?;
        if root.contains_pane(pane.id) {
            return Err(TreeError::DuplicatePane(pane.id));
        }
        let root = root.insert(pane, at, direction)?;
        Ok(SplitTree { root: Some(root) })
    }

    /// Removing the last pane gives an empty tree; removing an absent pane
    /// gives this tree back.
    pub fn remove(&self, pane: &Pane) -> SplitTree { self.remove_node(&Node::Leaf(pane.clone())) }

    pub fn remove_node(&self, target: &Node) -> SplitTree {
        match &self.root {
            None => SplitTree::empty(),
            Some(root) if **root == *target => SplitTree::empty(),
            Some(root) => SplitTree { root: root.remove(target) },
        }
    }

    /// Sets the ratio of the split directly above `pane`; no-op when the pane
    /// is the root or absent.
    pub fn update_ratio(&self, pane: &Pane, ratio: f64) -> SplitTree {
        self.update_node_ratio(&Node::Leaf(pane.clone()), ratio)
    }

    pub fn update_node_ratio(&self, target: &Node, ratio: f64) -> SplitTree {
        match self.root.as_ref().and_then(|root| root.update_parent_ratio(target, ratio)) {
            Some(root) => SplitTree { root: Some(root) },
            None => self.clone(),
        }
    }

    /// Replaces the stored value of the pane with the same id; no-op when
    /// absent.
    pub fn update_pane(&self, pane: &Pane) -> SplitTree {
        match self.root.as_ref().and_then(|root| root.replace_pane(pane)) {
            Some(root) => SplitTree { root: Some(root) },
            None => self.clone(),
        }
    }

    pub fn panes(&self) -> Vec<&Pane> { self.root().map(Node::leaves).unwrap_or_default() }

    pub fn pane_ids(&self) -> Vec<PaneId> { self.panes().into_iter().map(|p| p.id).collect() }

    pub fn len(&self) -> usize { self.root().map_or(0, Node::leaf_count) }

    pub fn find(&self, id: PaneId) -> Option<&Pane> {
        self.panes().into_iter().find(|pane| pane.id == id)
    }

    pub fn parent_split(&self, pane: &Pane) -> Option<&Split> {
        self.root()?.parent_of(&Node::Leaf(pane.clone()))
    }

    /// Spatial index over the tree, sized to `bounds` or to the tree's unit
    /// grid when `None`.
    pub fn spatial(&self, bounds: Option<Size>) -> Option<SpatialIndex<'_>> {
        self.root().map(|root| SpatialIndex::new(root, bounds))
    }

    /// Nearest pane from `from` in `direction`, using origin distance.
    pub fn focus_target(&self, from: &Pane, direction: Direction) -> Option<&Pane> {
        self.focus_target_with(from, direction, DistanceMetric::Origin)
    }

    pub fn focus_target_with(
        &self,
        from: &Pane,
        direction: Direction,
        metric: DistanceMetric,
    ) -> Option<&Pane> {
        let index = self.spatial(None)?;
        let reference = Node::Leaf(from.clone());
        let nearest = index.slots_in_direction(direction, &reference, metric).into_iter().next()?;
        Some(match nearest.node {
            Node::Leaf(pane) => pane,
            split if direction.is_toward_start() => split.rightmost_leaf(),
            split => split.leftmost_leaf(),
        })
    }

    pub fn to_ron(&self) -> Result<String, TreeError> {
        ron::ser::to_string_pretty(self, PrettyConfig::default())
            .map_err(|e| TreeError::Encode(e.to_string()))
    }

    pub fn from_ron(buf: &str) -> Result<SplitTree, TreeError> {
        ron::from_str::<SplitTree>(buf).map_err(|e| TreeError::Malformed(e.to_string()))?.checked()
    }

    pub fn to_json(&self) -> Result<String, TreeError> {
        serde_json::to_string_pretty(self).map_err(|e| TreeError::Encode(e.to_string()))
    }

    pub fn from_json(buf: &str) -> Result<SplitTree, TreeError> {
        serde_json::from_str::<SplitTree>(buf)
            .map_err(|e| TreeError::Malformed(e.to_string()))?
            .checked()
    }

    /// Rejects decoded trees that list a pane id twice, use the reserved id,
    /// or hold a ratio outside the open interval (0, 1).
    fn checked(self) -> Result<SplitTree, TreeError> {
        fn bad_ratio(node: &Node) -> Option<f64> {
            let split = node.as_split()?;
            if !(split.ratio > 0.0 && split.ratio < 1.0) {
                return Some(split.ratio);
            }
            bad_ratio(&split.left).or_else(|| bad_ratio(&split.right))
        }

        let mut seen = HashSet::default();
        let ids = self.pane_ids();
        if let Some(id) = ids.iter().find(|id| !seen.insert(**id)) {
            return Err(TreeError::Malformed(format!("pane {id} appears more than once")));
        }
        if ids.contains(&PaneId::MAX) {
            return Err(TreeError::Malformed(format!("pane id {} is reserved", PaneId::MAX)));
        }
        if let Some(ratio) = self.root().and_then(bad_ratio) {
            return Err(TreeError::Malformed(format!("split ratio {ratio} is outside (0, 1)")));
        }
        Ok(self)
    }
}

impl fmt::Display for SplitTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.root() {
            Some(root) => ascii_tree::write_tree(f, &root.ascii_tree()),
            None => f.write_str("<empty>\n"),
        }
    }
}
