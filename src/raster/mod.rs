//! Raster grids, band sources and aligned band reads

pub mod grid;
pub mod band;
mod source;
mod aligner;

pub use self::grid::Grid;
pub use self::band::{BandRole, CropInfo, RasterWindow};
pub use self::source::{read_bounds, GeoTiffDataset, GeoTiffSource, RasterDataset, RasterProfile, RasterSource};
pub use self::aligner::RasterAligner;
