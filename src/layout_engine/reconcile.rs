//! Bookkeeping for the heavyweight resources behind panes.
//!
//! The tree only stores pane values. Live terminals, browser instances and
//! editor sessions are owned here, keyed by [`PaneId`], and brought in line
//! with a tree by [`RealizedPanes::reconcile`].

use tracing::debug;

use crate::common::collections::{HashMap, HashSet};
use crate::model::pane::{ContentKind, Pane, PaneId};
use crate::model::split_tree::SplitTree;

/// Creates and tears down the resource behind a pane.
pub trait PaneHost {
    type Handle;

    /// Returns `None` for panes with nothing to realize yet.
    fn realize(&mut self, pane: &Pane) -> Option<Self::Handle>;

    fn release(&mut self, id: PaneId, handle: Self::Handle);
}

struct Realized<H> {
    kind: ContentKind,
    handle: H,
}

/// Side table from pane id to realized handle.
pub struct RealizedPanes<H> {
    entries: HashMap<PaneId, Realized<H>>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReconcileStats {
    pub realized: usize,
    pub released: usize,
}

impl<H> Default for RealizedPanes<H> {
    fn default() -> Self { Self { entries: HashMap::default() } }
}

impl<H> RealizedPanes<H> {
    pub fn new() -> Self { Self::default() }

    pub fn get(&self, id: PaneId) -> Option<&H> { self.entries.get(&id).map(|r| &r.handle) }

    pub fn len(&self) -> usize { self.entries.len() }

    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    /// Releases handles whose pane left the tree or changed kind, then
    /// realizes every pane that has content but no handle.
    pub fn reconcile<P>(&mut self, tree: &SplitTree, host: &mut P) -> ReconcileStats
    where P: PaneHost<Handle = H> {
        let mut stats = ReconcileStats::default();
        let panes = tree.panes();
        let wanted: HashMap<PaneId, Option<ContentKind>> =
            panes.iter().map(|pane| (pane.id, pane.content.kind())).collect();

        let stale: HashSet<PaneId> = self
            .entries
            .iter()
            .filter(|(id, realized)| wanted.get(*id).copied().flatten() != Some(realized.kind))
            .map(|(id, _)| *id)
            .collect();
        for id in stale {
            if let Some(realized) = self.entries.remove(&id) {
                debug!(pane = %id, kind = %realized.kind, "releasing pane resources");
                host.release(id, realized.handle);
                stats.released += 1;
            }
        }

        for pane in panes {
            if self.entries.contains_key(&pane.id) {
                continue;
            }
            let Some(kind) = pane.content.kind() else { continue };
            if let Some(handle) = host.realize(pane) {
                debug!(pane = %pane.id, %kind, "realized pane");
                self.entries.insert(pane.id, Realized { kind, handle });
                stats.realized += 1;
            }
        }

        stats
    }

    /// Releases everything, e.g. on shutdown.
    pub fn release_all<P>(&mut self, host: &mut P) -> usize
    where P: PaneHost<Handle = H> {
        let count = self.entries.len();
        for (id, realized) in self.entries.drain() {
            host.release(id, realized.handle);
        }
        count
    }
}
