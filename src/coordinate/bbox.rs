//! Bounding box structure for defining regions

use std::fmt;

use super::point::Point;

/// An axis-aligned bounding box
///
/// For geographic boxes the fields read as west, south, east, north.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    /// Minimum X coordinate (west)
    pub min_x: f64,
    /// Minimum Y coordinate (south)
    pub min_y: f64,
    /// Maximum X coordinate (east)
    pub max_x: f64,
    /// Maximum Y coordinate (north)
    pub max_y: f64,
}

impl BoundingBox {
    /// Create a new bounding box
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        BoundingBox { min_x, min_y, max_x, max_y }
    }

    /// `[west, south, east, north]`
    pub fn to_array(&self) -> [f64; 4] {
        [self.min_x, self.min_y, self.max_x, self.max_y]
    }

    /// Smallest box containing all points, `None` for an empty iterator
    pub fn envelope<I: IntoIterator<Item = Point>>(points: I) -> Option<Self> {
        points.into_iter().fold(None, |acc: Option<BoundingBox>, p| {
            Some(match acc {
                None => BoundingBox::new(p.x, p.y, p.x, p.y),
                Some(b) => BoundingBox::new(b.min_x.min(p.x), b.min_y.min(p.y), b.max_x.max(p.x), b.max_y.max(p.y)),
            })
        })
    }

    /// Get the width of the bounding box
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    /// Get the height of the bounding box
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Get the center point of the bounding box
    pub fn center(&self) -> Point {
        Point::new(
            self.min_x + self.width() / 2.0,
            self.min_y + self.height() / 2.0,
        )
    }

    /// Whether min < max on both axes
    pub fn is_valid(&self) -> bool {
        self.min_x < self.max_x && self.min_y < self.max_y
    }

    /// Whether the two boxes share any area or edge
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.min_x <= other.max_x && other.min_x <= self.max_x &&
            self.min_y <= other.max_y && other.min_y <= self.max_y
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:.5}, {:.5}, {:.5}, {:.5}]", self.min_x, self.min_y, self.max_x, self.max_y)
    }
}
