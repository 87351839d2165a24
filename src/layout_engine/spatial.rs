use crate::common::geometry::{Point, Rect, SameAs, Size};
use crate::layout_engine::{Direction, DistanceMetric, Orientation};
use crate::model::pane::PaneId;
use crate::model::tree::Node;

/// A node together with the rectangle it occupies.
#[derive(Clone, Copy, Debug)]
pub struct Slot<'a> {
    pub node: &'a Node,
    pub bounds: Rect,
}

/// Screen-space view of a tree, derived on demand.
///
/// Holds one slot per node (splits included) in pre-order, so a split always
/// comes before its children.
#[derive(Clone, Debug)]
pub struct SpatialIndex<'a> {
    slots: Vec<Slot<'a>>,
}

/// The second child starts on the divider and is sized from it to the
/// parent's far edge, so both children agree on the divider coordinate.
fn split_rect(rect: Rect, orientation: Orientation, ratio: f64) -> (Rect, Rect) {
    match orientation {
        Orientation::Horizontal => {
            let divider = rect.min_x() + rect.size.width * ratio;
            (
                Rect::new(rect.origin, Size::new(divider - rect.min_x(), rect.size.height)),
                Rect::new(
                    Point::new(divider, rect.min_y()),
                    Size::new(rect.max_x() - divider, rect.size.height),
                ),
            )
        }
        Orientation::Vertical => {
            let divider = rect.min_y() + rect.size.height * ratio;
            (
                Rect::new(rect.origin, Size::new(rect.size.width, divider - rect.min_y())),
                Rect::new(
                    Point::new(rect.min_x(), divider),
                    Size::new(rect.size.width, rect.max_y() - divider),
                ),
            )
        }
    }
}

/// `a <= b`, treating float noise from ratio arithmetic as equal.
fn at_or_before(a: f64, b: f64) -> bool { a <= b || a.same_as(b) }

/// Whether `candidate` lies entirely on the `direction` side of `reference`.
fn is_beyond(candidate: Rect, reference: Rect, direction: Direction) -> bool {
    match direction {
        Direction::Left => at_or_before(candidate.max_x(), reference.min_x()),
        Direction::Right => at_or_before(reference.max_x(), candidate.min_x()),
        Direction::Up => at_or_before(candidate.max_y(), reference.min_y()),
        Direction::Down => at_or_before(reference.max_y(), candidate.min_y()),
    }
}

fn axis_gap(candidate: Rect, reference: Rect, direction: Direction) -> f64 {
    let gap = match direction {
        Direction::Left => reference.min_x() - candidate.max_x(),
        Direction::Right => candidate.min_x() - reference.max_x(),
        Direction::Up => reference.min_y() - candidate.max_y(),
        Direction::Down => candidate.min_y() - reference.max_y(),
    };
    f64::max(0.0, gap)
}

fn cross_gap(candidate: Rect, reference: Rect, direction: Direction) -> f64 {
    let (c_min, c_max, r_min, r_max) = match direction.orientation() {
        Orientation::Horizontal => {
            (candidate.min_y(), candidate.max_y(), reference.min_y(), reference.max_y())
        }
        Orientation::Vertical => {
            (candidate.min_x(), candidate.max_x(), reference.min_x(), reference.max_x())
        }
    };
    f64::max(0.0, f64::max(c_min - r_max, r_min - c_max))
}

impl<'a> SpatialIndex<'a> {
    /// Lays `root` out over `bounds`, or over its unit-cell dimensions when
    /// no size is given.
    pub fn new(root: &'a Node, bounds: Option<Size>) -> Self {
        let size = bounds.unwrap_or_else(|| root.dimensions());
        Self::with_bounds(root, Rect::from_size(size))
    }

    pub fn with_bounds(root: &'a Node, bounds: Rect) -> Self {
        fn partition<'a>(node: &'a Node, bounds: Rect, out: &mut Vec<Slot<'a>>) {
            out.push(Slot { node, bounds });
            if let Node::Split(split) = node {
                let (left, right) = split_rect(bounds, split.orientation, split.ratio);
                partition(&split.left, left, out);
                partition(&split.right, right, out);
            }
        }
        let mut slots = Vec::new();
        partition(root, bounds, &mut slots);
        SpatialIndex { slots }
    }

    pub fn slots(&self) -> &[Slot<'a>] { &self.slots }

    pub fn slot_of(&self, node: &Node) -> Option<Slot<'a>> {
        self.slots.iter().copied().find(|slot| *slot.node == *node)
    }

    pub fn bounds_of(&self, id: PaneId) -> Option<Rect> {
        self.slots
            .iter()
            .find(|slot| slot.node.pane().is_some_and(|pane| pane.id == id))
            .map(|slot| slot.bounds)
    }

    /// Rectangles of every leaf, in traversal order.
    pub fn leaf_bounds(&self) -> Vec<(PaneId, Rect)> {
        self.slots
            .iter()
            .filter_map(|slot| slot.node.pane().map(|pane| (pane.id, slot.bounds)))
            .collect()
    }

    /// Deepest slot containing `point`.
    pub fn slot_at(&self, point: Point) -> Option<Slot<'a>> {
        self.slots.iter().rev().copied().find(|slot| slot.bounds.contains(point))
    }

    /// Slots strictly on the `direction` side of `from`, nearest first.
    ///
    /// With [`DistanceMetric::Origin`] nearness is the distance between
    /// rectangle origins, which can rank a farther pane first when aspect
    /// ratios differ a lot. [`DistanceMetric::Edge`] only ranks leaves.
    pub fn slots_in_direction(
        &self,
        direction: Direction,
        from: &Node,
        metric: DistanceMetric,
    ) -> Vec<Slot<'a>> {
        let Some(reference) = self.slot_of(from) else {
            return Vec::new();
        };
        let origin = reference.bounds.origin;
        let mut candidates: Vec<Slot<'a>> = self
            .slots
            .iter()
            .copied()
            .filter(|slot| !std::ptr::eq(slot.node, reference.node))
            .filter(|slot| is_beyond(slot.bounds, reference.bounds, direction))
            .filter(|slot| metric == DistanceMetric::Origin || slot.node.is_leaf())
            .collect();

        let origin_distance = |slot: &Slot<'_>| slot.bounds.origin.distance_to(origin);
        match metric {
            DistanceMetric::Origin => {
                candidates.sort_by(|a, b| origin_distance(a).total_cmp(&origin_distance(b)))
            }
            DistanceMetric::Edge => candidates.sort_by(|a, b| {
                let gap = |slot: &Slot<'_>| axis_gap(slot.bounds, reference.bounds, direction);
                let cross = |slot: &Slot<'_>| cross_gap(slot.bounds, reference.bounds, direction);
                gap(a)
                    .total_cmp(&gap(b))
                    .then_with(|| cross(a).total_cmp(&cross(b)))
                    .then_with(|| origin_distance(a).total_cmp(&origin_distance(b)))
            }),
        }
        candidates
    }
}
