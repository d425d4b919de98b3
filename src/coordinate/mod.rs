//! Coordinate handling for geospatial windows
//!
//! Bounding boxes, supported coordinate systems, WGS 84 projections and
//! the helpers that turn a point of interest into raster windows.

mod bbox;
mod point;
mod transform;
mod crs;
pub mod window;

pub use self::bbox::BoundingBox;
pub use self::point::Point;
pub use self::transform::{CoordinateTransformer, DENSIFY_POINTS};
pub use self::crs::CoordinateSystem;
pub use self::window::{area_bbox, pixel_window};
