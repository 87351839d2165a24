use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// How a split arranges its two children.
///
/// `Horizontal` places them side by side, `Vertical` stacks them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Orientation {
    Horizontal,
    Vertical,
}

/// Screen-space direction used for focus movement.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

impl Direction {
    pub fn orientation(self) -> Orientation {
        match self {
            Direction::Left | Direction::Right => Orientation::Horizontal,
            Direction::Up | Direction::Down => Orientation::Vertical,
        }
    }

    pub fn opposite(self) -> Direction {
        match self {
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
        }
    }

    /// Whether moving this way goes toward the start of an axis (left or top).
    pub fn is_toward_start(self) -> bool { matches!(self, Direction::Left | Direction::Up) }
}

/// Where a new pane goes relative to the pane being split.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum InsertDirection {
    Left,
    Right,
    #[strum(to_string = "above", serialize = "up")]
    Above,
    #[strum(to_string = "below", serialize = "down")]
    Below,
}

impl InsertDirection {
    pub fn orientation(self) -> Orientation {
        match self {
            InsertDirection::Left | InsertDirection::Right => Orientation::Horizontal,
            InsertDirection::Above | InsertDirection::Below => Orientation::Vertical,
        }
    }

    /// True when the new pane becomes the `left` (first) child of the split.
    pub fn new_pane_first(self) -> bool {
        matches!(self, InsertDirection::Left | InsertDirection::Above)
    }
}

impl From<Direction> for InsertDirection {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Left => InsertDirection::Left,
            Direction::Right => InsertDirection::Right,
            Direction::Up => InsertDirection::Above,
            Direction::Down => InsertDirection::Below,
        }
    }
}

/// How candidates in a direction are ranked.
#[derive(
    Default, Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DistanceMetric {
    /// Euclidean distance between rectangle origins.
    #[default]
    Origin,
    /// Gap along the movement axis, then gap on the cross axis.
    Edge,
}
