//! Point structure for representing coordinates

/// A point in a coordinate system
///
/// In geographic systems `x` is longitude and `y` latitude.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    /// Create a new 2D point
    pub fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }
}
