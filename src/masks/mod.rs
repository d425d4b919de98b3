//! Pixel masks: cloud decoding, morphology and water zoning

pub mod cloud;
pub mod layer;
pub mod morphology;
pub mod zones;

pub use cloud::{clear_mask, clear_percentage, is_clear};
pub use layer::MaskLayer;
pub use morphology::{dilate, erode};
pub use zones::{WaterZoneClassifier, ZoneMasks};
