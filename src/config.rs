//! Pipeline configuration
//!
//! Every setting has a built-in default. A TOML document may override any
//! subset of them:
//!
//! ```toml
//! [search]
//! collection = "landsat-c2-l2"
//! max_cloud_cover = 85
//! candidates = 10
//! min_local_clear = 50
//! area_size_km = 4
//! thermal_assets = ["lwir11", "st_b10", "ST_B10"]
//! quality_asset = "qa_pixel"
//!
//! [land_cover]
//! collection = "esa-worldcover"
//! product_version = "2.0.0"
//! asset = "map"
//! water_class = 80
//!
//! [retry]
//! max_attempts = 3
//! backoff_base = 2.0
//! deadline_secs = 300
//!
//! [render]
//! upscale = 4
//! jpeg_quality = 85
//! output_dir = "thermal_output"
//! overlay = true
//!
//! [calibration]
//! scale = 0.00341802
//! offset = 149.0
//! ```
//!
//! Unknown keys are ignored; a key with the wrong type is an error.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::debug;

use crate::errors::{PipelineError, PipelineResult};
use crate::retry::RetryPolicy;
use crate::stretch::StretchInfo;

/// Scene search settings
#[derive(Debug, Clone, PartialEq)]
pub struct SearchConfig {
    /// Catalog collection holding the thermal scenes
    pub collection: String,
    /// Relaxed scene-level cloud ceiling applied by the catalog, percent
    pub max_cloud_cover: f64,
    /// Maximum number of candidates requested
    pub candidates: usize,
    /// Minimum clear percentage inside the window to accept a scene
    pub min_local_clear: f64,
    /// Half-width of the area of interest in kilometres
    pub area_size_km: f64,
    /// Thermal band asset keys, tried in order
    pub thermal_assets: Vec<String>,
    /// Quality bitmask asset key
    pub quality_asset: String,
    /// Draw a progress bar while checking candidates
    pub show_progress: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            collection: "landsat-c2-l2".to_string(),
            max_cloud_cover: 85.0,
            candidates: 10,
            min_local_clear: 50.0,
            area_size_km: 4.0,
            thermal_assets: vec!["lwir11".to_string(), "st_b10".to_string(), "ST_B10".to_string()],
            quality_asset: "qa_pixel".to_string(),
            show_progress: false,
        }
    }
}

/// Land-cover (water mask) settings
#[derive(Debug, Clone, PartialEq)]
pub struct LandCoverConfig {
    pub collection: String,
    /// Required value of the `esa_worldcover:product_version` property
    pub product_version: String,
    pub asset: String,
    /// Class code marking permanent water
    pub water_class: u32,
    /// Attempts for land-cover reads, lower than the default policy
    pub max_attempts: u32,
}

/// Property that carries the land-cover product version
pub const PRODUCT_VERSION_PROPERTY: &str = "esa_worldcover:product_version";

impl Default for LandCoverConfig {
    fn default() -> Self {
        LandCoverConfig {
            collection: "esa-worldcover".to_string(),
            product_version: "2.0.0".to_string(),
            asset: "map".to_string(),
            water_class: 80,
            max_attempts: 2,
        }
    }
}

/// Retry and deadline settings
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub backoff_base: f64,
    /// Overall deadline for one invocation; none by default
    pub deadline_secs: Option<u64>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        RetryConfig { max_attempts: 3, backoff_base: 2.0, deadline_secs: None }
    }
}

impl RetryConfig {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts, self.backoff_base)
    }

    pub fn deadline(&self) -> Option<Duration> {
        self.deadline_secs.map(Duration::from_secs)
    }
}

/// Output image settings
#[derive(Debug, Clone, PartialEq)]
pub struct RenderConfig {
    pub upscale: u32,
    pub jpeg_quality: u8,
    pub output_dir: PathBuf,
    pub overlay: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        RenderConfig {
            upscale: 4,
            jpeg_quality: 85,
            output_dir: PathBuf::from("thermal_output"),
            overlay: true,
        }
    }
}

/// Linear calibration from thermal digital numbers to temperature
///
/// `kelvin = dn * scale + offset`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationConfig {
    pub scale: f64,
    pub offset: f64,
}

/// Kelvin to Celsius offset
pub const KELVIN_OFFSET: f64 = 273.15;

impl Default for CalibrationConfig {
    fn default() -> Self {
        CalibrationConfig { scale: 0.00341802, offset: 149.0 }
    }
}

impl CalibrationConfig {
    pub fn to_kelvin(&self, dn: f64) -> f64 {
        dn * self.scale + self.offset
    }

    pub fn to_celsius(&self, dn: f64) -> f64 {
        self.to_kelvin(dn) - KELVIN_OFFSET
    }

    /// Converts all four stretch bounds to degrees Celsius
    pub fn stretch_to_celsius(&self, info: &StretchInfo) -> StretchInfo {
        StretchInfo {
            land_low: self.to_celsius(info.land_low),
            land_high: self.to_celsius(info.land_high),
            water_low: self.to_celsius(info.water_low),
            water_high: self.to_celsius(info.water_high),
        }
    }
}

/// Complete pipeline configuration
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineConfig {
    pub search: SearchConfig,
    pub land_cover: LandCoverConfig,
    pub retry: RetryConfig,
    pub render: RenderConfig,
    pub calibration: CalibrationConfig,
}

impl PipelineConfig {
    /// Parses a TOML document on top of the defaults
    pub fn from_toml_str(content: &str) -> PipelineResult<Self> {
        let value: toml::Value = content.parse()
            .map_err(|e| PipelineError::Config(format!("Failed to parse TOML: {}", e)))?;

        let mut config = PipelineConfig::default();

        if let Some(table) = section(&value, "search")? {
            let search = &mut config.search;
            set_string(table, "search", "collection", &mut search.collection)?;
            set_f64(table, "search", "max_cloud_cover", &mut search.max_cloud_cover)?;
            set_usize(table, "search", "candidates", &mut search.candidates)?;
            set_f64(table, "search", "min_local_clear", &mut search.min_local_clear)?;
            set_f64(table, "search", "area_size_km", &mut search.area_size_km)?;
            set_string_list(table, "search", "thermal_assets", &mut search.thermal_assets)?;
            set_string(table, "search", "quality_asset", &mut search.quality_asset)?;
            set_bool(table, "search", "show_progress", &mut search.show_progress)?;
        }

        if let Some(table) = section(&value, "land_cover")? {
            let land_cover = &mut config.land_cover;
            set_string(table, "land_cover", "collection", &mut land_cover.collection)?;
            set_string(table, "land_cover", "product_version", &mut land_cover.product_version)?;
            set_string(table, "land_cover", "asset", &mut land_cover.asset)?;
            set_u32(table, "land_cover", "water_class", &mut land_cover.water_class)?;
            set_u32(table, "land_cover", "max_attempts", &mut land_cover.max_attempts)?;
        }

        if let Some(table) = section(&value, "retry")? {
            let retry = &mut config.retry;
            set_u32(table, "retry", "max_attempts", &mut retry.max_attempts)?;
            set_f64(table, "retry", "backoff_base", &mut retry.backoff_base)?;
            if table.contains_key("deadline_secs") {
                let mut secs = 0u32;
                set_u32(table, "retry", "deadline_secs", &mut secs)?;
                retry.deadline_secs = Some(secs as u64);
            }
        }

        if let Some(table) = section(&value, "render")? {
            let render = &mut config.render;
            set_u32(table, "render", "upscale", &mut render.upscale)?;
            let mut quality = render.jpeg_quality as u32;
            set_u32(table, "render", "jpeg_quality", &mut quality)?;
            render.jpeg_quality = u8::try_from(quality)
                .map_err(|_| PipelineError::Config(format!("render.jpeg_quality out of range: {}", quality)))?;
            let mut output_dir = render.output_dir.to_string_lossy().to_string();
            set_string(table, "render", "output_dir", &mut output_dir)?;
            render.output_dir = PathBuf::from(output_dir);
            set_bool(table, "render", "overlay", &mut render.overlay)?;
        }

        if let Some(table) = section(&value, "calibration")? {
            let calibration = &mut config.calibration;
            set_f64(table, "calibration", "scale", &mut calibration.scale)?;
            set_f64(table, "calibration", "offset", &mut calibration.offset)?;
        }

        config.validate()?;
        debug!("Loaded configuration: {:?}", config);
        Ok(config)
    }

    /// Loads a TOML configuration file
    pub fn from_file<P: AsRef<Path>>(path: P) -> PipelineResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| PipelineError::Config(format!("Cannot read {}: {}", path.display(), e)))?;
        Self::from_toml_str(&content)
    }

    /// Rejects settings the pipeline cannot run with
    pub fn validate(&self) -> PipelineResult<()> {
        if self.search.thermal_assets.is_empty() {
            return Err(PipelineError::Config("search.thermal_assets must not be empty".to_string()));
        }
        if self.search.candidates == 0 {
            return Err(PipelineError::Config("search.candidates must be at least 1".to_string()));
        }
        if !(self.search.area_size_km > 0.0) {
            return Err(PipelineError::Config("search.area_size_km must be positive".to_string()));
        }
        if self.retry.max_attempts == 0 || self.land_cover.max_attempts == 0 {
            return Err(PipelineError::Config("max_attempts must be at least 1".to_string()));
        }
        if !self.retry.backoff_base.is_finite() || self.retry.backoff_base < 1.0 {
            return Err(PipelineError::Config("retry.backoff_base must be a finite number of at least 1".to_string()));
        }
        if self.render.upscale == 0 {
            return Err(PipelineError::Config("render.upscale must be at least 1".to_string()));
        }
        if self.render.jpeg_quality == 0 || self.render.jpeg_quality > 100 {
            return Err(PipelineError::Config("render.jpeg_quality must be within 1-100".to_string()));
        }
        Ok(())
    }
}

type Table = toml::map::Map<String, toml::Value>;

fn section<'v>(value: &'v toml::Value, name: &str) -> PipelineResult<Option<&'v Table>> {
    match value.get(name) {
        None => Ok(None),
        Some(toml::Value::Table(table)) => Ok(Some(table)),
        Some(_) => Err(PipelineError::Config(format!("[{}] must be a table", name))),
    }
}

fn wrong_type(section: &str, key: &str, expected: &str) -> PipelineError {
    PipelineError::Config(format!("{}.{} must be {}", section, key, expected))
}

fn set_string(table: &Table, section: &str, key: &str, target: &mut String) -> PipelineResult<()> {
    if let Some(value) = table.get(key) {
        *target = value.as_str().ok_or_else(|| wrong_type(section, key, "a string"))?.to_string();
    }
    Ok(())
}

fn set_f64(table: &Table, section: &str, key: &str, target: &mut f64) -> PipelineResult<()> {
    match table.get(key) {
        None => {},
        Some(toml::Value::Float(f)) => *target = *f,
        Some(toml::Value::Integer(i)) => *target = *i as f64,
        Some(_) => return Err(wrong_type(section, key, "a number")),
    }
    Ok(())
}

fn set_u32(table: &Table, section: &str, key: &str, target: &mut u32) -> PipelineResult<()> {
    if let Some(value) = table.get(key) {
        let int = value.as_integer().ok_or_else(|| wrong_type(section, key, "an integer"))?;
        *target = u32::try_from(int).map_err(|_| wrong_type(section, key, "a non-negative integer"))?;
    }
    Ok(())
}

fn set_usize(table: &Table, section: &str, key: &str, target: &mut usize) -> PipelineResult<()> {
    let mut value = *target as u32;
    set_u32(table, section, key, &mut value)?;
    *target = value as usize;
    Ok(())
}

fn set_bool(table: &Table, section: &str, key: &str, target: &mut bool) -> PipelineResult<()> {
    if let Some(value) = table.get(key) {
        *target = value.as_bool().ok_or_else(|| wrong_type(section, key, "a boolean"))?;
    }
    Ok(())
}

fn set_string_list(table: &Table, section: &str, key: &str, target: &mut Vec<String>) -> PipelineResult<()> {
    if let Some(value) = table.get(key) {
        let array = value.as_array().ok_or_else(|| wrong_type(section, key, "an array of strings"))?;
        *target = array.iter()
            .map(|item| item.as_str().map(str::to_string).ok_or_else(|| wrong_type(section, key, "an array of strings")))
            .collect::<PipelineResult<Vec<String>>>()?;
    }
    Ok(())
}
