//! Library facade
//!
//! `ThermalKit` validates a point and date, then runs scene selection,
//! aligned reads, the zonal stretch and rendering as one logged pipeline.

use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use lazy_static::lazy_static;
use regex::Regex;

use crate::catalog::{LocalCatalog, SceneCatalog};
use crate::config::PipelineConfig;
use crate::errors::{PipelineError, PipelineResult};
use crate::raster::{GeoTiffSource, RasterAligner, RasterSource};
use crate::render::{OverlayContent, ThermalRenderer};
use crate::retry::{CancelToken, RetryExecutor, Sleeper, ThreadSleeper};
use crate::scene::{SceneLocator, SelectedScene};
use crate::stretch::{StretchInfo, StretchMode, ZonalStretchEngine};
use crate::utils::logger::Logger;

lazy_static! {
    static ref DATE_PATTERN: Regex = Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap();
}

/// Latitudes this close to a pole are rejected; the window width diverges there
pub const MAX_ABS_LATITUDE: f64 = 89.999;

/// Result of one pipeline invocation
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Written JPEG
    pub image_path: PathBuf,
    pub scene: SelectedScene,
    /// Stretch bounds in raw digital numbers
    pub stretch: StretchInfo,
    /// Stretch bounds in degrees Celsius
    pub celsius: StretchInfo,
    pub mode: StretchMode,
}

/// Main interface to the ThermalKit library
pub struct ThermalKit<'a> {
    config: PipelineConfig,
    catalog: Box<dyn SceneCatalog>,
    source: Box<dyn RasterSource>,
    sleeper: Box<dyn Sleeper>,
    logger: &'a Logger,
}

impl<'a> ThermalKit<'a> {
    /// Create a new ThermalKit instance
    ///
    /// # Arguments
    /// * `config` - Pipeline settings
    /// * `catalog` - Scene and land-cover catalog
    /// * `source` - Raster access for band reads
    /// * `logger` - Logger shared by every stage
    pub fn new(
        config: PipelineConfig,
        catalog: Box<dyn SceneCatalog>,
        source: Box<dyn RasterSource>,
        logger: &'a Logger,
    ) -> Self {
        ThermalKit { config, catalog, source, sleeper: Box::new(ThreadSleeper), logger }
    }

    /// Create an instance over local catalog documents and GeoTIFF files
    ///
    /// # Arguments
    /// * `config` - Pipeline settings
    /// * `catalog_files` - STAC ItemCollection JSON documents
    /// * `logger` - Logger shared by every stage
    ///
    /// # Returns
    /// A ThermalKit instance or an error if a catalog document cannot be read
    pub fn open_local<P: AsRef<Path>>(
        config: PipelineConfig,
        catalog_files: &[P],
        logger: &'a Logger,
    ) -> PipelineResult<Self> {
        let catalog = LocalCatalog::from_files(catalog_files)?;
        logger.info(&format!("Catalog: {} items", catalog.len()));
        Ok(Self::new(config, Box::new(catalog), Box::new(GeoTiffSource::new()), logger))
    }

    /// Replaces the backoff clock
    pub fn with_sleeper(mut self, sleeper: Box<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn logger(&self) -> &'a Logger {
        self.logger
    }

    /// Cancel token for one invocation, expiring at the configured deadline
    pub fn new_cancel_token(&self) -> CancelToken {
        match self.config.retry.deadline() {
            Some(timeout) => CancelToken::with_timeout(timeout),
            None => CancelToken::new(),
        }
    }

    /// Selects a scene without reading or rendering any band
    ///
    /// # Arguments
    /// * `lat`, `lon` - Point of interest in degrees
    /// * `before_date` - Optional `YYYY-MM-DD` upper bound on capture date
    pub fn locate(&self, lat: f64, lon: f64, before_date: Option<&str>) -> PipelineResult<SelectedScene> {
        validate_coordinates(lat, lon)?;
        let before = before_date.map(end_of_day).transpose()?;

        let cancel = self.new_cancel_token();
        let retry = RetryExecutor::new(self.config.retry.policy(), self.sleeper.as_ref(), cancel, self.logger);
        self.locator(&retry).locate(lat, lon, before)
    }

    /// Runs the whole pipeline for a point
    ///
    /// # Arguments
    /// * `lat`, `lon` - Point of interest in degrees
    /// * `before_date` - Optional `YYYY-MM-DD` upper bound on capture date
    ///
    /// # Returns
    /// The written image and the metadata that produced it, or the first fatal error
    pub fn run(&self, lat: f64, lon: f64, before_date: Option<&str>) -> PipelineResult<PipelineOutput> {
        self.run_with_cancel(lat, lon, before_date, self.new_cancel_token())
    }

    /// Runs the whole pipeline under a caller-owned cancel token
    pub fn run_with_cancel(
        &self,
        lat: f64,
        lon: f64,
        before_date: Option<&str>,
        cancel: CancelToken,
    ) -> PipelineResult<PipelineOutput> {
        let start = Instant::now();
        validate_coordinates(lat, lon)?;
        let before = before_date.map(end_of_day).transpose()?;

        let logger = self.logger;
        logger.info("Satellite Thermal Image Fetcher");
        logger.info(&format!("Location: {:.4}, {:.4}", lat, lon));
        logger.info(&format!("Area: {}km x {}km", self.config.search.area_size_km, self.config.search.area_size_km));
        if let Some(date) = before_date {
            logger.info(&format!("Before date: {}", date));
        }

        let retry = RetryExecutor::new(self.config.retry.policy(), self.sleeper.as_ref(), cancel.clone(), logger);

        logger.info("[1/5] Searching catalog (checking local cloud cover)...");
        let scene = self.locator(&retry).locate(lat, lon, before)?;

        let aligner = RasterAligner::new(
            self.source.as_ref(),
            self.catalog.as_ref(),
            self.config.land_cover.clone(),
            &retry,
            logger,
        );

        cancel.check()?;
        logger.info("[2/5] Fetching thermal data...");
        let (thermal, crop) = aligner.fetch_thermal(&scene)?;

        cancel.check()?;
        logger.info("[3/5] Fetching clear-sky mask...");
        let clear = aligner.fetch_clear_mask(&scene, &crop)?;

        cancel.check()?;
        logger.info("[4/5] Fetching land/water mask...");
        let water = aligner.fetch_water_mask(&scene.bbox, &crop)?;

        cancel.check()?;
        logger.info("[5/5] Processing image...");
        let stretched = ZonalStretchEngine::new(logger).stretch(&thermal.data, &clear, &water)?;
        let celsius = self.config.calibration.stretch_to_celsius(&stretched.info);
        logger.info(&format!(
            "  Land: {:.1}°C to {:.1}°C | Water: {:.1}°C to {:.1}°C",
            celsius.land_low, celsius.land_high, celsius.water_low, celsius.water_high
        ));

        let renderer = ThermalRenderer::new(self.config.render.clone(), logger);
        let overlay = OverlayContent { lat, lon, captured: scene.datetime(), celsius };
        let rendered = renderer.render(&stretched.normalized, Some(&overlay))?;

        let image_path = renderer.output_path(lat, lon, Utc::now().timestamp());
        renderer.save_jpeg(&rendered.composite, &image_path)?;

        logger.info(&format!(
            "Complete in {:.1}s | Output: {}", start.elapsed().as_secs_f64(), image_path.display()
        ));

        Ok(PipelineOutput {
            image_path,
            scene,
            stretch: stretched.info,
            celsius,
            mode: stretched.mode,
        })
    }

    fn locator<'r>(&'r self, retry: &'r RetryExecutor<'r>) -> SceneLocator<'r> {
        SceneLocator::new(
            self.config.search.clone(),
            self.catalog.as_ref(),
            self.source.as_ref(),
            retry,
            self.logger,
        )
    }
}

/// Rejects coordinates outside the accepted domain
///
/// Latitudes within 0.001 degrees of a pole are rejected as well; the
/// longitude span of the window is undefined there.
pub fn validate_coordinates(lat: f64, lon: f64) -> PipelineResult<()> {
    if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
        return Err(PipelineError::InvalidInput(format!("Latitude must be between -90 and 90, got {}", lat)));
    }
    if !lon.is_finite() || !(-180.0..=180.0).contains(&lon) {
        return Err(PipelineError::InvalidInput(format!("Longitude must be between -180 and 180, got {}", lon)));
    }
    if lat.abs() >= MAX_ABS_LATITUDE {
        return Err(PipelineError::InvalidInput(format!("Latitude {} is too close to a pole", lat)));
    }
    Ok(())
}

/// Parses a `YYYY-MM-DD` date
pub fn parse_date(value: &str) -> PipelineResult<NaiveDate> {
    if !DATE_PATTERN.is_match(value) {
        return Err(PipelineError::InvalidInput(format!("Date must be YYYY-MM-DD, got '{}'", value)));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|e| PipelineError::InvalidInput(format!("Invalid date '{}': {}", value, e)))
}

/// Last second of a `YYYY-MM-DD` day in UTC, the inclusive search bound
pub fn end_of_day(value: &str) -> PipelineResult<DateTime<Utc>> {
    let date = parse_date(value)?;
    let naive = date.and_hms_opt(23, 59, 59)
        .ok_or_else(|| PipelineError::InvalidInput(format!("Invalid date '{}'", value)))?;
    Ok(Utc.from_utc_datetime(&naive))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::Grid;
    use crate::retry::RecordingSleeper;
    use crate::test_support::{item, MemoryCatalog, MemorySource};
    use log::Level;
    use tempfile::tempdir;

    #[test]
    fn test_validate_coordinates() {
        assert!(validate_coordinates(44.43, -110.59).is_ok());
        assert!(validate_coordinates(-89.9, 180.0).is_ok());
        assert!(matches!(validate_coordinates(91.0, 0.0), Err(PipelineError::InvalidInput(_))));
        assert!(matches!(validate_coordinates(0.0, -180.5), Err(PipelineError::InvalidInput(_))));
        assert!(matches!(validate_coordinates(f64::NAN, 0.0), Err(PipelineError::InvalidInput(_))));
        assert!(matches!(validate_coordinates(89.9995, 0.0), Err(PipelineError::InvalidInput(_))));
    }

    #[test]
    fn test_dates() {
        assert_eq!(parse_date("2025-10-06").unwrap(), NaiveDate::from_ymd_opt(2025, 10, 6).unwrap());
        assert!(parse_date("2025-1-6").is_err());
        assert!(parse_date("2025-02-30").is_err());
        assert!(parse_date("06/10/2025").is_err());

        let end = end_of_day("2024-07-12").unwrap();
        assert_eq!(end, Utc.with_ymd_and_hms(2024, 7, 12, 23, 59, 59).unwrap());
    }

    fn kit<'a>(output_dir: &Path, catalog: MemoryCatalog, source: MemorySource, logger: &'a Logger) -> ThermalKit<'a> {
        let mut config = PipelineConfig::default();
        config.render.output_dir = output_dir.to_path_buf();
        config.render.upscale = 2;
        ThermalKit::new(config, Box::new(catalog), Box::new(source), logger)
            .with_sleeper(Box::new(RecordingSleeper::new()))
    }

    fn thermal() -> Grid<f64> {
        Grid::from_fn(30, 40, |r, c| 40000.0 + (r * 40 + c) as f64 * 5.0)
    }

    #[test]
    fn test_run_without_masks_uses_single_stretch() {
        let dir = tempdir().unwrap();
        let catalog = MemoryCatalog::new(vec![
            item("LC09_A", "landsat-c2-l2", "2024-07-20T18:00:00Z", Some(4.0), &[("lwir11", "b10")]),
        ]);
        let source = MemorySource::new().with("b10", thermal());

        let logger = Logger::capturing();
        let kit = kit(dir.path(), catalog, source, &logger);
        let output = kit.run(44.43, -110.59, None).unwrap();

        assert_eq!(output.scene.id(), "LC09_A");
        assert_eq!(output.mode, StretchMode::Single);
        assert_eq!(output.stretch.land_low, output.stretch.water_low);
        assert!(output.celsius.land_low < output.celsius.land_high);

        let name = output.image_path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("thermal_44.43_-110.59_"));
        let img = image::open(&output.image_path).unwrap();
        assert_eq!((img.width(), img.height()), (60, 60));

        let info = logger.messages_at(Level::Info);
        for stage in ["[1/5]", "[2/5]", "[3/5]", "[4/5]", "[5/5]"] {
            assert!(info.iter().any(|m| m.starts_with(stage)), "missing stage {}", stage);
        }
        assert!(info.iter().any(|m| m.starts_with("Complete in ")));
    }

    #[test]
    fn test_run_with_water_mask_uses_zonal_stretch() {
        let dir = tempdir().unwrap();
        let catalog = MemoryCatalog::new(vec![
            item("LC09_A", "landsat-c2-l2", "2024-07-20T18:00:00Z", Some(4.0), &[("lwir11", "b10"), ("qa_pixel", "qa")]),
            item("WC", "esa-worldcover", "2021-01-01T00:00:00Z", None, &[("map", "map")]),
        ]);
        let classes = Grid::from_fn(30, 40, |_, c| if c < 20 { 80.0 } else { 10.0 });
        let source = MemorySource::new()
            .with("b10", thermal())
            .with("qa", Grid::filled(30, 40, 21824.0))
            .with("map", classes);

        let logger = Logger::capturing();
        let output = kit(dir.path(), catalog, source, &logger).run(44.43, -110.59, Some("2024-08-01")).unwrap();
        assert_eq!(output.mode, StretchMode::Zonal);
        assert_eq!(output.scene.local_clear, 100.0);
        assert!(output.image_path.exists());
    }

    #[test]
    fn test_run_rejects_bad_input_before_searching() {
        let dir = tempdir().unwrap();
        let logger = Logger::capturing();
        let kit = kit(dir.path(), MemoryCatalog::new(Vec::new()), MemorySource::new(), &logger);
        assert!(matches!(kit.run(95.0, 0.0, None), Err(PipelineError::InvalidInput(_))));
        assert!(matches!(kit.run(10.0, 10.0, Some("yesterday")), Err(PipelineError::InvalidInput(_))));
        assert!(logger.messages_at(Level::Info).is_empty());
    }

    #[test]
    fn test_run_honours_cancellation() {
        let dir = tempdir().unwrap();
        let catalog = MemoryCatalog::new(vec![
            item("LC09_A", "landsat-c2-l2", "2024-07-20T18:00:00Z", Some(4.0), &[("lwir11", "b10")]),
        ]);
        let logger = Logger::capturing();
        let kit = kit(dir.path(), catalog, MemorySource::new().with("b10", thermal()), &logger);
        let cancel = CancelToken::new();
        cancel.cancel();
        assert!(matches!(kit.run_with_cancel(44.43, -110.59, None, cancel), Err(PipelineError::Cancelled)));
    }

    #[test]
    fn test_locate_only() {
        let dir = tempdir().unwrap();
        let catalog = MemoryCatalog::new(vec![
            item("LC09_A", "landsat-c2-l2", "2024-07-20T18:00:00Z", Some(4.0), &[("lwir11", "b10")]),
        ]);
        let logger = Logger::capturing();
        let scene = kit(dir.path(), catalog, MemorySource::new(), &logger).locate(44.43, -110.59, None).unwrap();
        assert_eq!(scene.id(), "LC09_A");
        assert_eq!(scene.local_clear, 100.0);
    }
}
