//! Platform-neutral layout geometry.
//!
//! Origin is top-left and y grows downward. Renderers convert into their own
//! coordinate space.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self { Point { x, y } }

    pub fn distance_to(&self, other: Point) -> f64 { (self.x - other.x).hypot(self.y - other.y) }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const UNIT: Size = Size { width: 1.0, height: 1.0 };

    pub fn new(width: f64, height: f64) -> Self { Size { width, height } }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub origin: Point,
    pub size: Size,
}

impl Rect {
    pub fn new(origin: Point, size: Size) -> Self { Rect { origin, size } }

    pub fn from_size(size: Size) -> Self { Rect { origin: Point::ZERO, size } }

    pub fn min_x(&self) -> f64 { self.origin.x }

    pub fn max_x(&self) -> f64 { self.origin.x + self.size.width }

    pub fn min_y(&self) -> f64 { self.origin.y }

    pub fn max_y(&self) -> f64 { self.origin.y + self.size.height }

    pub fn contains(&self, point: Point) -> bool {
        (self.min_x()..=self.max_x()).contains(&point.x)
            && (self.min_y()..=self.max_y()).contains(&point.y)
    }

    pub fn union(&self, other: Rect) -> Rect {
        let min_x = f64::min(self.min_x(), other.min_x());
        let min_y = f64::min(self.min_y(), other.min_y());
        let max_x = f64::max(self.max_x(), other.max_x());
        let max_y = f64::max(self.max_y(), other.max_y());
        Rect::new(Point::new(min_x, min_y), Size::new(max_x - min_x, max_y - min_y))
    }
}

pub trait IsWithin {
    fn is_within(&self, how_much: f64, other: Self) -> bool;
}

impl IsWithin for Rect {
    fn is_within(&self, how_much: f64, other: Self) -> bool {
        self.origin.is_within(how_much, other.origin) && self.size.is_within(how_much, other.size)
    }
}

impl IsWithin for Point {
    fn is_within(&self, how_much: f64, other: Self) -> bool {
        self.x.is_within(how_much, other.x) && self.y.is_within(how_much, other.y)
    }
}

impl IsWithin for Size {
    fn is_within(&self, how_much: f64, other: Self) -> bool {
        self.width.is_within(how_much, other.width) && self.height.is_within(how_much, other.height)
    }
}

impl IsWithin for f64 {
    fn is_within(&self, how_much: f64, other: Self) -> bool { (self - other).abs() < how_much }
}

/// Equality up to float noise from repeated ratio arithmetic.
pub trait SameAs: IsWithin + Sized {
    fn same_as(&self, other: Self) -> bool { self.is_within(1e-9, other) }
}

impl SameAs for Rect {}
impl SameAs for Point {}
impl SameAs for Size {}
impl SameAs for f64 {}
