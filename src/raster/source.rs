//! Raster read capability
//!
//! `RasterSource` opens an asset reference; the resulting `RasterDataset`
//! reports its georeferencing and reads pixel windows. `GeoTiffSource` is
//! the implementation over local GeoTIFF and Cloud-Optimized GeoTIFF files.

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use log::{debug, info};

use crate::coordinate::{pixel_window, BoundingBox, CoordinateSystem, CoordinateTransformer};
use crate::errors::{PipelineError, PipelineResult};
use crate::extractor::resample;
use crate::extractor::{PixelWindow, WindowReader};
use crate::raster::grid::Grid;
use crate::retry::CancelToken;
use crate::tiff::errors::TiffError;
use crate::tiff::geo_keys::GeoReference;
use crate::tiff::ifd::IFD;
use crate::tiff::reader::TiffReader;

/// Georeferencing and extent of a dataset
#[derive(Debug, Clone, PartialEq)]
pub struct RasterProfile {
    pub epsg: Option<u32>,
    pub geo: GeoReference,
    pub width: usize,
    pub height: usize,
}

impl RasterProfile {
    /// Coordinate system of the dataset
    ///
    /// Datasets without an EPSG code are taken to be geographic WGS 84.
    pub fn crs(&self) -> PipelineResult<CoordinateSystem> {
        match self.epsg {
            Some(code) => CoordinateSystem::from_epsg(code)
                .map_err(|e| PipelineError::ExternalRead(e.to_string())),
            None => Ok(CoordinateSystem::WGS84),
        }
    }

    /// Pixel window covering WGS 84 bounds
    ///
    /// The bounds are transformed into the dataset's native system, mapped
    /// through the inverse geotransform and clipped to the raster.
    pub fn window_for(&self, bounds_wgs84: &BoundingBox) -> PipelineResult<PixelWindow> {
        let crs = self.crs()?;
        let native = CoordinateTransformer::transform_bounds(bounds_wgs84, &crs);
        debug!("Bounds {} in {}: {}", bounds_wgs84, crs.description(), native);

        pixel_window(&native, &self.geo, self.width, self.height).ok_or_else(|| {
            PipelineError::ExternalRead(format!("Area {} does not overlap the raster", bounds_wgs84))
        })
    }
}

/// An opened raster band
pub trait RasterDataset {
    fn profile(&self) -> &RasterProfile;

    /// Reads a pixel window of the first band
    ///
    /// # Arguments
    /// * `window` - Window inside the raster extent
    /// * `out_shape` - Optional `(rows, cols)` to resample to, nearest neighbour
    /// * `cancel` - Token checked between blocks
    fn read(&mut self, window: PixelWindow, out_shape: Option<(usize, usize)>, cancel: &CancelToken) -> PipelineResult<Grid<f64>>;
}

/// Opens asset references as datasets
pub trait RasterSource {
    fn open(&self, href: &str) -> PipelineResult<Box<dyn RasterDataset>>;
}

/// Reads WGS 84 bounds from a dataset: the windowed read used by every band
pub fn read_bounds(
    dataset: &mut dyn RasterDataset,
    bounds_wgs84: &BoundingBox,
    out_shape: Option<(usize, usize)>,
    cancel: &CancelToken,
) -> PipelineResult<Grid<f64>> {
    let window = dataset.profile().window_for(bounds_wgs84)?;
    dataset.read(window, out_shape, cancel)
}

/// `RasterSource` over local GeoTIFF files
///
/// Accepts plain paths and `file://` URLs.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeoTiffSource;

impl GeoTiffSource {
    pub fn new() -> Self {
        GeoTiffSource
    }

    /// Local path of an asset reference
    pub fn resolve(href: &str) -> PipelineResult<PathBuf> {
        if let Some(path) = href.strip_prefix("file://") {
            return Ok(PathBuf::from(path));
        }
        if href.contains("://") {
            return Err(PipelineError::ExternalRead(format!("Unsupported asset scheme: {}", href)));
        }
        Ok(PathBuf::from(href))
    }
}

impl RasterSource for GeoTiffSource {
    fn open(&self, href: &str) -> PipelineResult<Box<dyn RasterDataset>> {
        let path = Self::resolve(href)?;
        let dataset = GeoTiffDataset::open(path)?;
        Ok(Box::new(dataset))
    }
}

/// A GeoTIFF opened for windowed reads of its full-resolution image
pub struct GeoTiffDataset {
    path: PathBuf,
    reader: BufReader<File>,
    tiff_reader: TiffReader,
    ifd: IFD,
    profile: RasterProfile,
}

impl GeoTiffDataset {
    /// Parses the directory structure and georeferencing of a file
    pub fn open(path: PathBuf) -> PipelineResult<Self> {
        let file = File::open(&path).map_err(|e| external(&path, e.into()))?;
        let mut reader = BufReader::new(file);

        let mut tiff_reader = TiffReader::new();
        let tiff = tiff_reader.read(&mut reader).map_err(|e| external(&path, e))?;
        let ifd = tiff.full_resolution_ifd()
            .cloned()
            .ok_or_else(|| PipelineError::ExternalRead(format!("{}: no image directory", path.display())))?;

        let (width, height) = ifd.get_dimensions()
            .ok_or_else(|| external(&path, TiffError::MissingDimensions))?;
        let geo = GeoReference::read(&tiff_reader, &mut reader, &ifd).map_err(|e| external(&path, e))?;

        info!("  Source CRS: {}", geo.epsg.map_or("unknown".to_string(), |c| format!("EPSG:{}", c)));
        info!("  Source size: {}x{}", width, height);

        let profile = RasterProfile { epsg: geo.epsg, geo, width: width as usize, height: height as usize };
        Ok(GeoTiffDataset { path, reader, tiff_reader, ifd, profile })
    }
}

impl RasterDataset for GeoTiffDataset {
    fn profile(&self) -> &RasterProfile {
        &self.profile
    }

    fn read(&mut self, window: PixelWindow, out_shape: Option<(usize, usize)>, cancel: &CancelToken) -> PipelineResult<Grid<f64>> {
        info!("  Window size: {}x{} native pixels", window.width, window.height);

        let window_reader = WindowReader::new(&self.tiff_reader, &self.ifd);
        let mut keep_going = || cancel.check().is_ok();
        let grid = match window_reader.read(&mut self.reader, window, &mut keep_going) {
            Ok(grid) => grid,
            Err(TiffError::Interrupted) => {
                cancel.check()?;
                return Err(PipelineError::Cancelled);
            },
            Err(e) => return Err(external(&self.path, e)),
        };

        match out_shape {
            Some((rows, cols)) if (rows, cols) != grid.shape() => resample::nearest(&grid, rows, cols)
                .ok_or_else(|| PipelineError::ExternalRead(format!("Cannot resample to {}x{}", rows, cols))),
            _ => Ok(grid),
        }
    }
}

fn external(path: &std::path::Path, error: TiffError) -> PipelineError {
    PipelineError::ExternalRead(format!("{}: {}", path.display(), error))
}
