//! Pixel-aligned band reads
//!
//! The thermal band is read first and centre-cropped to a square. The crop
//! is recorded in `CropInfo` and replayed on the quality and land-cover
//! bands so that every grid handed to the stretch shares one pixel grid.

use crate::catalog::{CatalogQuery, SceneCatalog};
use crate::config::{LandCoverConfig, PRODUCT_VERSION_PROPERTY};
use crate::coordinate::BoundingBox;
use crate::errors::{PipelineError, PipelineResult};
use crate::masks::{clear_mask, MaskLayer};
use crate::retry::RetryExecutor;
use crate::scene::SelectedScene;
use crate::utils::logger::Logger;
use super::band::{BandRole, CropInfo, RasterWindow};
use super::grid::Grid;
use super::source::{read_bounds, RasterSource};

/// Reads the bands of a selected scene onto one square grid
pub struct RasterAligner<'a> {
    source: &'a dyn RasterSource,
    catalog: &'a dyn SceneCatalog,
    land_cover: LandCoverConfig,
    retry: &'a RetryExecutor<'a>,
    logger: &'a Logger,
}

impl<'a> RasterAligner<'a> {
    /// Create a new aligner
    ///
    /// # Arguments
    /// * `source` - Raster access for every band
    /// * `catalog` - Catalog holding the land-cover tiles
    /// * `land_cover` - Land-cover collection settings
    /// * `retry` - Retry policy shared with the rest of the invocation
    /// * `logger` - Logger for read diagnostics
    pub fn new(
        source: &'a dyn RasterSource,
        catalog: &'a dyn SceneCatalog,
        land_cover: LandCoverConfig,
        retry: &'a RetryExecutor<'a>,
        logger: &'a Logger,
    ) -> Self {
        RasterAligner { source, catalog, land_cover, retry, logger }
    }

    /// Reads the thermal band and fixes the crop
    ///
    /// # Returns
    /// The square thermal window and the crop every other band must follow.
    /// Any read failure left after retries is returned to the caller.
    pub fn fetch_thermal(&self, scene: &SelectedScene) -> PipelineResult<(RasterWindow, CropInfo)> {
        let href = &scene.candidate.thermal_href;
        let data = self.read_band("Thermal band read", href, &scene.bbox, None, self.retry.policy().max_attempts)?;
        let (rows, cols) = data.shape();
        self.logger.info(&format!("  Thermal window: {}x{} pixels", cols, rows));

        let crop = CropInfo::centered(data.shape());
        if crop.is_identity() {
            return Ok((RasterWindow::new(BandRole::Thermal, data), crop));
        }

        let cropped = crop.apply(&data)?;
        self.logger.info(&format!("  Cropped to square: {}x{}", crop.size, crop.size));
        Ok((RasterWindow::new(BandRole::Thermal, cropped), crop))
    }

    /// Reads the quality band and decodes it into a clear mask
    ///
    /// A missing asset, a failed read or a band that cannot be aligned
    /// yields `MaskLayer::Absent`; only cancellation is returned as an error.
    pub fn fetch_clear_mask(&self, scene: &SelectedScene, crop: &CropInfo) -> PipelineResult<MaskLayer> {
        let href = match &scene.candidate.quality_href {
            Some(href) => href,
            None => {
                self.logger.warn("  No quality asset, continuing without cloud mask");
                return Ok(MaskLayer::Absent);
            },
        };

        let attempts = self.retry.policy().max_attempts;
        let qa = self.read_band("Quality band read", href, &scene.bbox, None, attempts)
            .and_then(|qa| self.align(BandRole::Quality, &qa, crop));
        let qa = match degrade(qa, BandRole::Quality, self.logger)? {
            Some(qa) => qa,
            None => return Ok(MaskLayer::Absent),
        };

        let mask = clear_mask(&qa);
        self.logger.info(&format!("  Clear pixels: {:.1}%", mask.percent_true()));
        Ok(MaskLayer::Present(mask))
    }

    /// Finds the land-cover tile for `bbox` and extracts its water class
    ///
    /// The land-cover band is resampled to the thermal window's pre-crop
    /// shape before the crop is applied, since the two products have
    /// different resolutions. Any failure other than cancellation yields
    /// `MaskLayer::Absent`.
    pub fn fetch_water_mask(&self, bbox: &BoundingBox, crop: &CropInfo) -> PipelineResult<MaskLayer> {
        let classes = match degrade(self.read_land_cover(bbox, crop), BandRole::LandCover, self.logger)? {
            Some(classes) => classes,
            None => return Ok(MaskLayer::Absent),
        };

        let water_class = self.land_cover.water_class as f64;
        let water = classes.map(|class| *class == water_class);
        self.logger.info(&format!("  Water coverage: {:.1}%", water.percent_true()));
        Ok(MaskLayer::Present(water))
    }

    fn read_land_cover(&self, bbox: &BoundingBox, crop: &CropInfo) -> PipelineResult<Grid<f64>> {
        let config = &self.land_cover;
        let query = CatalogQuery::new(&config.collection, *bbox)
            .property_eq(PRODUCT_VERSION_PROPERTY, &config.product_version)
            .limit(1);
        let policy = self.retry.policy().with_attempts(config.max_attempts);
        let items = self.retry.run_with(policy, "Land cover search", || self.catalog.search(&query))?;

        let item = items.first()
            .ok_or_else(|| PipelineError::MissingOptionalAsset(format!("no {} tile covers the area", config.collection)))?;
        let asset = item.asset(&config.asset)
            .ok_or_else(|| PipelineError::MissingOptionalAsset(format!("{}: no '{}' asset", item.id, config.asset)))?;

        let classes = self.read_band("Land cover read", &asset.href, bbox, Some(crop.orig_shape), config.max_attempts)?;
        self.align(BandRole::LandCover, &classes, crop)
    }

    fn read_band(
        &self,
        label: &str,
        href: &str,
        bbox: &BoundingBox,
        out_shape: Option<(usize, usize)>,
        attempts: u32,
    ) -> PipelineResult<Grid<f64>> {
        let cancel = self.retry.cancel_token();
        let policy = self.retry.policy().with_attempts(attempts);
        self.retry.run_with(policy, label, || {
            let mut dataset = self.source.open(href)?;
            read_bounds(dataset.as_mut(), bbox, out_shape, cancel)
        })
    }

    /// Replays the crop on a secondary band, re-cropping when its shape drifted
    fn align(&self, role: BandRole, grid: &Grid<f64>, crop: &CropInfo) -> PipelineResult<Grid<f64>> {
        let shape = grid.shape();
        if shape != crop.orig_shape && shape != crop.target_shape() {
            self.logger.warn(&format!(
                "  {} band is {}x{}, expected {}x{}; re-cropping",
                role, shape.1, shape.0, crop.orig_shape.1, crop.orig_shape.0
            ));
        }
        crop.apply(grid)
    }
}

/// Turns a non-fatal band failure into `None` with a warning
fn degrade<T>(result: PipelineResult<T>, role: BandRole, logger: &Logger) -> PipelineResult<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.is_terminal() => Err(e),
        Err(e) => {
            logger.warn(&format!("  Skipping {} mask: {}", role, e));
            Ok(None)
        },
    }
}
