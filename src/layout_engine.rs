pub mod engine;
pub(crate) mod graph;
pub mod reconcile;
pub mod spatial;

pub use engine::{EventResponse, LayoutCommand, LayoutEngine};
pub use graph::{Direction, DistanceMetric, InsertDirection, Orientation};
pub use reconcile::{PaneHost, RealizedPanes, ReconcileStats};
pub use spatial::{Slot, SpatialIndex};
