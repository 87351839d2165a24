use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::{Direction, InsertDirection, Orientation, SpatialIndex};
use crate::common::collections::HashSet;
use crate::common::config::{LayoutSettings, NavigationSettings, RestoreSettings, Settings};
use crate::common::geometry::{Point, Rect};
use crate::model::pane::{ContentKind, Pane, PaneContent, PaneId, PaneIdGen};
use crate::model::split_tree::SplitTree;
use crate::model::tree::Node;

#[non_exhaustive]
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum LayoutCommand {
    /// Split the focused pane.
    Split {
        direction: InsertDirection,
        #[serde(default)]
        content: PaneContent,
    },
    SplitAt {
        at: PaneId,
        direction: InsertDirection,
        #[serde(default)]
        content: PaneContent,
    },
    Close(PaneId),
    CloseFocused,
    Focus(PaneId),
    MoveFocus(Direction),
    SetContent {
        pane: PaneId,
        content: PaneContent,
    },
    SetPendingSelection {
        pane: PaneId,
        kind: Option<ContentKind>,
    },
    SetRatio {
        pane: PaneId,
        ratio: f64,
    },
    ResizeGrow,
    ResizeShrink,
    ResizeBy {
        amount: f64,
    },
    DragDivider {
        pane: PaneId,
        position: Point,
        viewport: Rect,
    },
    Reset,
}

/// What the caller has to do after a command.
#[must_use]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventResponse {
    /// Set when focus moved to a different pane.
    pub focus: Option<PaneId>,
    pub created: Vec<PaneId>,
    /// Panes whose realized resources must be released.
    pub removed: Vec<PaneId>,
    pub content_changed: Vec<PaneId>,
    /// Tree shape or ratios changed; bounds must be recomputed.
    pub relayout: bool,
}

/// Owns the current tree and focus and applies commands to them.
pub struct LayoutEngine {
    tree: SplitTree,
    focused: Option<PaneId>,
    ids: PaneIdGen,
    layout_settings: LayoutSettings,
    navigation_settings: NavigationSettings,
    restore_settings: RestoreSettings,
}

impl LayoutEngine {
    /// Starts with a single unselected pane.
    pub fn new(settings: &Settings) -> Self {
        let mut ids = PaneIdGen::new();
        let pane = Pane::unselected(ids.next_id());
        let focused = Some(pane.id);
        LayoutEngine {
            tree: SplitTree::singleton(pane),
            focused,
            ids,
            layout_settings: settings.layout.clone(),
            navigation_settings: settings.navigation.clone(),
            restore_settings: settings.restore.clone(),
        }
    }

    pub fn with_tree(tree: SplitTree, settings: &Settings) -> Self {
        let ids = PaneIdGen::after(tree.pane_ids().iter());
        let focused = tree.panes().first().map(|pane| pane.id);
        LayoutEngine {
            tree,
            focused,
            ids,
            layout_settings: settings.layout.clone(),
            navigation_settings: settings.navigation.clone(),
            restore_settings: settings.restore.clone(),
        }
    }

    /// Restores the layout saved at `path`, falling back to a fresh single
    /// pane when restore is disabled or the file is missing, empty or
    /// unreadable.
    pub fn restore(path: &Path, settings: &Settings) -> Self {
        if !settings.restore.enabled {
            info!(path = %path.display(), "layout restore disabled, starting fresh");
            return Self::new(settings);
        }
        if !path.exists() {
            info!(path = %path.display(), "no saved layout, starting fresh");
            return Self::new(settings);
        }
        match Self::load(path) {
            Ok(tree) if !tree.is_empty() => {
                info!(path = %path.display(), panes = tree.len(), "restored layout");
                Self::with_tree(tree, settings)
            }
            Ok(_) => Self::new(settings),
            Err(error) => {
                warn!(path = %path.display(), %error, "could not restore layout, starting fresh");
                Self::new(settings)
            }
        }
    }

    pub fn load(path: &Path) -> anyhow::Result<SplitTree> {
        let buf = fs::read_to_string(path)?;
        Ok(SplitTree::from_ron(&buf)?)
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, self.tree.to_ron()?)?;
        Ok(())
    }

    /// Restores from the configured restore file.
    pub fn restore_session(settings: &Settings) -> Self {
        Self::restore(&settings.restore.file(), settings)
    }

    /// Saves to the configured restore file. Returns whether anything was
    /// written; nothing is when restore is disabled.
    pub fn save_session(&self) -> anyhow::Result<bool> {
        if !self.restore_settings.enabled {
            debug!("layout restore disabled, not saving");
            return Ok(false);
        }
        self.save(&self.restore_settings.file())?;
        Ok(true)
    }

    pub fn tree(&self) -> &SplitTree { &self.tree }

    pub fn focused(&self) -> Option<PaneId> { self.focused }

    pub fn focused_pane(&self) -> Option<&Pane> { self.focused.and_then(|id| self.tree.find(id)) }

    /// Leaf rectangles for a viewport, in traversal order.
    pub fn calculate_layout(&self, viewport: Rect) -> Vec<(PaneId, Rect)> {
        self.tree
            .root()
            .map(|root| SpatialIndex::with_bounds(root, viewport).leaf_bounds())
            .unwrap_or_default()
    }

    pub fn handle_command(&mut self, command: LayoutCommand) -> EventResponse {
        debug!(?command, focused = ?self.focused, "layout command");
        debug!("Tree:\n{}", self.tree.to_string().trim());

        match command {
            LayoutCommand::Split { direction, content } => match self.anchor() {
                Some(at) => self.split_at(at, direction, content),
                None => self.reset(content),
            },
            LayoutCommand::SplitAt { at, direction, content } => {
                self.split_at(at, direction, content)
            }
            LayoutCommand::Close(id) => self.close(id),
            LayoutCommand::CloseFocused => match self.focused {
                Some(id) => self.close(id),
                None => EventResponse::default(),
            },
            LayoutCommand::Focus(id) => {
                if self.tree.find(id).is_none() {
                    debug!(pane = %id, "focus target not in tree");
                    return EventResponse::default();
                }
                self.focus(id)
            }
            LayoutCommand::MoveFocus(direction) => self.move_focus(direction),
            LayoutCommand::SetContent { pane, content } => {
                let Some(existing) = self.tree.find(pane) else {
                    return EventResponse::default();
                };
                if existing.content == content {
                    return EventResponse::default();
                }
                let updated = existing.with_content(content);
                let tree = self.tree.update_pane(&updated);
                let mut response = self.apply(tree, self.focused);
                response.content_changed.push(pane);
                response
            }
            LayoutCommand::SetPendingSelection { pane, kind } => {
                if let Some(existing) = self.tree.find(pane) {
                    let updated = existing.with_pending_selection(kind);
                    self.tree = self.tree.update_pane(&updated);
                }
                EventResponse::default()
            }
            LayoutCommand::SetRatio { pane, ratio } => {
                let Some(existing) = self.tree.find(pane).cloned() else {
                    return EventResponse::default();
                };
                let ratio = self.layout_settings.clamp_ratio(ratio);
                let tree = self.tree.update_ratio(&existing, ratio);
                self.apply(tree, self.focused)
            }
            LayoutCommand::ResizeGrow => self.resize_focused_by(self.layout_settings.resize_step),
            LayoutCommand::ResizeShrink => {
                self.resize_focused_by(-self.layout_settings.resize_step)
            }
            LayoutCommand::ResizeBy { amount } => self.resize_focused_by(amount),
            LayoutCommand::DragDivider { pane, position, viewport } => {
                self.drag_divider(pane, position, viewport)
            }
            LayoutCommand::Reset => self.reset(PaneContent::Unselected),
        }
    }

    fn anchor(&self) -> Option<PaneId> {
        self.focused_pane()
            .or_else(|| self.tree.panes().first().copied())
            .map(|pane| pane.id)
    }

    fn split_at(
        &mut self,
        at: PaneId,
        direction: InsertDirection,
        content: PaneContent,
    ) -> EventResponse {
        let pane = Pane::new(self.ids.next_id(), content);
        let id = pane.id;
        match self.tree.insert(pane, &Pane::unselected(at), direction) {
            Ok(tree) => {
                debug!(new = %id, %at, %direction, "split pane");
                self.apply(tree, Some(id))
            }
            Err(error) => {
                warn!(%at, %error, "abandoning split");
                EventResponse::default()
            }
        }
    }

    fn close(&mut self, id: PaneId) -> EventResponse {
        let Some(pane) = self.tree.find(id).cloned() else {
            debug!(pane = %id, "close target not in tree");
            return EventResponse::default();
        };
        let tree = self.tree.remove(&pane);
        let focus = match self.focused {
            Some(focused) if focused != id && tree.find(focused).is_some() => Some(focused),
            _ => tree.panes().first().map(|pane| pane.id),
        };
        self.apply(tree, focus)
    }

    fn focus(&mut self, id: PaneId) -> EventResponse {
        if self.focused == Some(id) {
            return EventResponse::default();
        }
        self.focused = Some(id);
        EventResponse { focus: Some(id), ..Default::default() }
    }

    fn move_focus(&mut self, direction: Direction) -> EventResponse {
        let Some(from) = self.focused_pane() else {
            return EventResponse::default();
        };
        let metric = self.navigation_settings.distance;
        match self.tree.focus_target_with(from, direction, metric) {
            Some(target) => {
                let target = target.id;
                self.focus(target)
            }
            None => {
                debug!(%direction, "no pane in direction, keeping focus");
                EventResponse::default()
            }
        }
    }

    /// Grows the focused pane by `amount` of its parent split.
    fn resize_focused_by(&mut self, amount: f64) -> EventResponse {
        let Some(pane) = self.focused_pane().cloned() else {
            return EventResponse::default();
        };
        let Some(parent) = self.tree.parent_split(&pane) else {
            return EventResponse::default();
        };
        let ratio = if *parent.left == Node::Leaf(pane.clone()) {
            parent.ratio + amount
        } else {
            parent.ratio - amount
        };
        let ratio = self.layout_settings.clamp_ratio(ratio);
        let tree = self.tree.update_ratio(&pane, ratio);
        self.apply(tree, self.focused)
    }

    /// Moves the divider next to `pane` so it sits under `position`.
    fn drag_divider(&mut self, pane: PaneId, position: Point, viewport: Rect) -> EventResponse {
        let Some(root) = self.tree.root() else {
            return EventResponse::default();
        };
        let Some(target) = self.tree.find(pane).cloned().map(Node::Leaf) else {
            return EventResponse::default();
        };
        let index = SpatialIndex::with_bounds(root, viewport);
        let Some((orientation, bounds)) = index.slots().iter().find_map(|slot| {
            slot.node
                .as_split()
                .filter(|split| split.has_child(&target))
                .map(|split| (split.orientation, slot.bounds))
        }) else {
            return EventResponse::default();
        };
        let (offset, extent) = match orientation {
            Orientation::Horizontal => (position.x - bounds.min_x(), bounds.size.width),
            Orientation::Vertical => (position.y - bounds.min_y(), bounds.size.height),
        };
        if extent <= 0.0 {
            return EventResponse::default();
        }
        let ratio = self.layout_settings.clamp_ratio(offset / extent);
        let tree = self.tree.update_node_ratio(&target, ratio);
        self.apply(tree, self.focused)
    }

    fn reset(&mut self, content: PaneContent) -> EventResponse {
        let pane = Pane::new(self.ids.next_id(), content);
        let id = pane.id;
        self.apply(SplitTree::singleton(pane), Some(id))
    }

    /// Swaps in `tree` and reports what changed relative to the old one.
    fn apply(&mut self, tree: SplitTree, focus: Option<PaneId>) -> EventResponse {
        let before: HashSet<PaneId> = self.tree.pane_ids().into_iter().collect();
        let after: HashSet<PaneId> = tree.pane_ids().into_iter().collect();

        let created = tree.pane_ids().into_iter().filter(|id| !before.contains(id)).collect();
        let removed = self.tree.pane_ids().into_iter().filter(|id| !after.contains(id)).collect();
        let relayout = tree != self.tree;
        let focus_changed = (focus != self.focused).then_some(focus).flatten();

        self.tree = tree;
        self.focused = focus;

        EventResponse {
            focus: focus_changed,
            created,
            removed,
            content_changed: Vec::new(),
            relayout,
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use test_log::test;

    use super::*;
    use crate::common::geometry::Size;

    fn id(raw: u64) -> PaneId { PaneId::new(raw) }

    fn engine() -> LayoutEngine { LayoutEngine::new(&Settings::default()) }

    fn split(direction: InsertDirection) -> LayoutCommand {
        LayoutCommand::Split { direction, content: PaneContent::Unselected }
    }

    fn viewport() -> Rect { Rect::from_size(Size::new(1000.0, 600.0)) }

    #[test]
    fn starts_with_one_focused_pane() {
        let engine = engine();
        assert_eq!(engine.tree().len(), 1);
        assert_eq!(engine.focused(), Some(id(0)));
    }

    #[test]
    fn split_focuses_new_pane() {
        let mut engine = engine();
        let response = engine.handle_command(split(InsertDirection::Right));
        assert_eq!(response.focus, Some(id(1)));
        assert_eq!(response.created, vec![id(1)]);
        assert!(response.removed.is_empty());
        assert!(response.relayout);
        assert_eq!(engine.tree().pane_ids(), vec![id(0), id(1)]);
    }

    #[test]
    fn split_at_missing_pane_is_abandoned() {
        let mut engine = engine();
        let before = engine.tree().clone();
        let response = engine.handle_command(LayoutCommand::SplitAt {
            at: id(42),
            direction: InsertDirection::Below,
            content: PaneContent::Terminal,
        });
        assert_eq!(response, EventResponse::default());
        assert_eq!(*engine.tree(), before);
        assert_eq!(engine.focused(), Some(id(0)));
    }

    #[test]
    fn closing_focused_pane_focuses_first_pane() {
        let mut engine = engine();
        let _ = engine.handle_command(split(InsertDirection::Right));
        let _ = engine.handle_command(split(InsertDirection::Below));
        assert_eq!(engine.focused(), Some(id(2)));

        let response = engine.handle_command(LayoutCommand::CloseFocused);
        assert_eq!(response.removed, vec![id(2)]);
        assert_eq!(response.focus, Some(id(0)));
        assert_eq!(engine.tree().pane_ids(), vec![id(0), id(1)]);
    }

    #[test]
    fn closing_other_pane_keeps_focus() {
        let mut engine = engine();
        let _ = engine.handle_command(split(InsertDirection::Right));
        let response = engine.handle_command(LayoutCommand::Close(id(0)));
        assert_eq!(response.focus, None);
        assert_eq!(engine.focused(), Some(id(1)));
    }

    #[test]
    fn closing_last_pane_then_splitting_seeds_a_new_tree() {
        let mut engine = engine();
        let response = engine.handle_command(LayoutCommand::CloseFocused);
        assert_eq!(response.removed, vec![id(0)]);
        assert!(engine.tree().is_empty());
        assert_eq!(engine.focused(), None);

        let response = engine.handle_command(split(InsertDirection::Left));
        assert_eq!(response.created, vec![id(1)]);
        assert_eq!(engine.focused(), Some(id(1)));
    }

    #[test]
    fn ids_are_never_reused() {
        let mut engine = engine();
        let _ = engine.handle_command(split(InsertDirection::Right));
        let _ = engine.handle_command(LayoutCommand::Close(id(1)));
        let response = engine.handle_command(split(InsertDirection::Right));
        assert_eq!(response.created, vec![id(2)]);
    }

    #[test]
    fn move_focus_and_dead_ends() {
        let mut engine = engine();
        let _ = engine.handle_command(split(InsertDirection::Right));
        let response = engine.handle_command(LayoutCommand::MoveFocus(Direction::Left));
        assert_eq!(response.focus, Some(id(0)));

        let response = engine.handle_command(LayoutCommand::MoveFocus(Direction::Left));
        assert_eq!(response, EventResponse::default());
        assert_eq!(engine.focused(), Some(id(0)));
    }

    #[test]
    fn focus_unknown_pane_is_ignored() {
        let mut engine = engine();
        let _ = engine.handle_command(LayoutCommand::Focus(id(5)));
        assert_eq!(engine.focused(), Some(id(0)));
    }

    #[test]
    fn set_content_reports_change_without_relayout() {
        let mut engine = engine();
        let response = engine.handle_command(LayoutCommand::SetContent {
            pane: id(0),
            content: PaneContent::Terminal,
        });
        assert_eq!(response.content_changed, vec![id(0)]);
        assert!(!response.relayout);
        assert_eq!(engine.focused_pane().unwrap().content, PaneContent::Terminal);

        let again = engine.handle_command(LayoutCommand::SetContent {
            pane: id(0),
            content: PaneContent::Terminal,
        });
        assert!(again.content_changed.is_empty());
    }

    #[test]
    fn pending_selection_is_tracked() {
        let mut engine = engine();
        let _ = engine.handle_command(LayoutCommand::SetPendingSelection {
            pane: id(0),
            kind: Some(ContentKind::Browser),
        });
        assert_eq!(engine.focused_pane().unwrap().pending_selection, Some(ContentKind::Browser));
    }

    #[test]
    fn ratios_are_clamped() {
        let mut engine = engine();
        let _ = engine.handle_command(split(InsertDirection::Right));
        let _ = engine.handle_command(LayoutCommand::SetRatio { pane: id(0), ratio: 0.01 });
        let pane = engine.tree().find(id(0)).unwrap().clone();
        assert_eq!(engine.tree().parent_split(&pane).unwrap().ratio, 0.1);
    }

    #[test]
    fn resize_grows_focused_side() {
        let mut engine = engine();
        let _ = engine.handle_command(split(InsertDirection::Right));
        // focused pane is the right child, growing it moves the divider left
        let response = engine.handle_command(LayoutCommand::ResizeGrow);
        assert!(response.relayout);
        let pane = engine.focused_pane().unwrap().clone();
        let ratio = engine.tree().parent_split(&pane).unwrap().ratio;
        assert!((ratio - 0.45).abs() < 1e-9);

        let _ = engine.handle_command(LayoutCommand::Focus(id(0)));
        let _ = engine.handle_command(LayoutCommand::ResizeBy { amount: 0.2 });
        let ratio = engine.tree().parent_split(&pane).unwrap().ratio;
        assert!((ratio - 0.65).abs() < 1e-9);
    }

    #[test]
    fn resize_without_parent_is_noop() {
        let mut engine = engine();
        let response = engine.handle_command(LayoutCommand::ResizeShrink);
        assert_eq!(response, EventResponse::default());
    }

    #[test]
    fn drag_divider_follows_pointer() {
        let mut engine = engine();
        let _ = engine.handle_command(split(InsertDirection::Right));
        let response = engine.handle_command(LayoutCommand::DragDivider {
            pane: id(1),
            position: Point::new(250.0, 100.0),
            viewport: viewport(),
        });
        assert!(response.relayout);
        let layout = engine.calculate_layout(viewport());
        assert_eq!(layout[0].1.size.width, 250.0);
        assert_eq!(layout[1].1.min_x(), 250.0);
    }

    #[test]
    fn calculate_layout_covers_viewport() {
        let mut engine = engine();
        let _ = engine.handle_command(split(InsertDirection::Below));
        let layout = engine.calculate_layout(viewport());
        assert_eq!(layout.len(), 2);
        assert_eq!(layout[0].1.size.height, 300.0);
        assert_eq!(layout[1].1.min_y(), 300.0);
        assert_eq!(layout[1].1.size.width, 1000.0);
    }

    #[test]
    fn reset_replaces_everything() {
        let mut engine = engine();
        let _ = engine.handle_command(split(InsertDirection::Right));
        let response = engine.handle_command(LayoutCommand::Reset);
        assert_eq!(response.created, vec![id(2)]);
        assert_eq!(response.removed, vec![id(0), id(1)]);
        assert_eq!(engine.tree().len(), 1);
    }

    mod persistence {
        use pretty_assertions::assert_eq;
        use test_log::test;

        use super::*;

        #[test]
        fn save_and_restore() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("state").join("layout.ron");
            let mut engine = engine();
            let _ = engine.handle_command(LayoutCommand::Split {
                direction: InsertDirection::Right,
                content: PaneContent::Editor { path: "README.md".into() },
            });
            engine.save(&path).unwrap();

            let mut restored = LayoutEngine::restore(&path, &Settings::default());
            assert_eq!(restored.tree(), engine.tree());
            assert_eq!(restored.focused(), Some(id(0)));
            let response = restored.handle_command(split(InsertDirection::Below));
            assert_eq!(response.created, vec![id(2)]);
        }

        #[test]
        fn missing_file_starts_fresh() {
            let dir = tempfile::tempdir().unwrap();
            let engine = LayoutEngine::restore(&dir.path().join("none.ron"), &Settings::default());
            assert_eq!(engine.tree().len(), 1);
        }

        #[test]
        fn malformed_file_starts_fresh() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("layout.ron");
            fs::write(&path, "(root: Some(tabs([])))").unwrap();
            assert!(LayoutEngine::load(&path).is_err());
            let engine = LayoutEngine::restore(&path, &Settings::default());
            assert_eq!(engine.tree().len(), 1);
            assert_eq!(engine.focused(), Some(id(0)));
        }

        #[test]
        fn out_of_range_ratio_starts_fresh() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("layout.ron");
            let mut engine = engine();
            let _ = engine.handle_command(split(InsertDirection::Right));
            let saved = engine.tree().to_ron().unwrap().replacen("ratio: 0.5", "ratio: 1.5", 1);
            fs::write(&path, saved).unwrap();

            let restored = LayoutEngine::restore(&path, &Settings::default());
            assert_eq!(restored.tree().pane_ids(), vec![id(0)]);
        }

        fn session_settings(dir: &Path, enabled: bool) -> Settings {
            let mut settings = Settings::default();
            settings.restore.enabled = enabled;
            settings.restore.path = Some(dir.join("session.ron"));
            settings
        }

        #[test]
        fn session_round_trip() {
            let dir = tempfile::tempdir().unwrap();
            let settings = session_settings(dir.path(), true);
            let mut engine = LayoutEngine::new(&settings);
            let _ = engine.handle_command(split(InsertDirection::Right));
            assert!(engine.save_session().unwrap());

            let restored = LayoutEngine::restore_session(&settings);
            assert_eq!(restored.tree(), engine.tree());
        }

        #[test]
        fn disabled_restore_ignores_saved_layout() {
            let dir = tempfile::tempdir().unwrap();
            let mut engine = LayoutEngine::new(&session_settings(dir.path(), true));
            let _ = engine.handle_command(split(InsertDirection::Right));
            engine.save_session().unwrap();

            let settings = session_settings(dir.path(), false);
            let restored = LayoutEngine::restore_session(&settings);
            assert_eq!(restored.tree().pane_ids(), vec![id(0)]);
            assert_eq!(LayoutEngine::load(&dir.path().join("session.ron")).unwrap().len(), 2);
        }

        #[test]
        fn disabled_restore_skips_saving() {
            let dir = tempfile::tempdir().unwrap();
            let engine = LayoutEngine::new(&session_settings(dir.path(), false));
            assert!(!engine.save_session().unwrap());
            assert!(!dir.path().join("session.ron").exists());
        }
    }
}
