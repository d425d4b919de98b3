pub mod io;
pub mod tiff;
pub mod utils;
pub mod compression;
pub mod extractor;
pub mod coordinate;
pub mod raster;
pub mod catalog;
pub mod masks;
pub mod stretch;
pub mod render;
pub mod retry;
pub mod scene;
pub mod config;
pub mod errors;
pub mod commands;
pub mod api;

#[cfg(test)]
mod test_support;

pub use crate::api::{PipelineOutput, ThermalKit};
pub use crate::config::PipelineConfig;
pub use crate::errors::{PipelineError, PipelineResult};

pub use tiff::TiffReader;
pub use coordinate::{area_bbox, BoundingBox, Point, CoordinateTransformer, CoordinateSystem};
pub use raster::{Grid, RasterAligner, RasterSource, GeoTiffSource};
pub use catalog::{LocalCatalog, SceneCatalog};
pub use masks::WaterZoneClassifier;
pub use retry::{CancelToken, RetryExecutor};
pub use scene::{SceneLocator, SelectedScene};
pub use stretch::ZonalStretchEngine;
pub use render::ThermalRenderer;
