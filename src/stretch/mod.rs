//! Percentile stretches from raw thermal values to 8 bits

pub mod engine;
pub mod percentile;

pub use engine::{StretchInfo, StretchMode, StretchResult, ZonalStretchEngine};
pub use percentile::{percentile, percentile_pair};
