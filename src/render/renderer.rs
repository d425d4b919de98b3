//! Thermal image rendering
//!
//! Colorizes a normalized grid, upscales it with bilinear filtering, burns
//! in the overlay and writes the JPEG.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};
use image::RgbImage;

use super::colormap::apply_colormap;
use super::overlay::{draw_overlay, OverlayContent};
use crate::config::RenderConfig;
use crate::errors::{PipelineError, PipelineResult};
use crate::raster::grid::Grid;
use crate::utils::logger::Logger;

/// Colorized image before and after the overlay
#[derive(Debug, Clone)]
pub struct RenderedImage {
    /// Upscaled color-mapped raster
    pub base: RgbImage,
    /// `base` with the overlay burned in, or an identical copy when disabled
    pub composite: RgbImage,
}

/// Output file name for a point and a Unix timestamp
///
/// # Example
/// `thermal_44.43_-110.59_1721000000.jpg`
pub fn output_file_name(lat: f64, lon: f64, unix_seconds: i64) -> String {
    format!("thermal_{:.2}_{:.2}_{}.jpg", lat, lon, unix_seconds)
}

/// Renders normalized grids to images
pub struct ThermalRenderer<'a> {
    config: RenderConfig,
    logger: &'a Logger,
}

impl<'a> ThermalRenderer<'a> {
    pub fn new(config: RenderConfig, logger: &'a Logger) -> Self {
        ThermalRenderer { config, logger }
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Scales an image by the configured integer factor
    pub fn upscale(&self, img: &RgbImage) -> RgbImage {
        let factor = self.config.upscale.max(1);
        if factor == 1 {
            return img.clone();
        }
        imageops::resize(img, img.width() * factor, img.height() * factor, FilterType::Triangle)
    }

    /// Colorizes, upscales and optionally overlays a normalized grid
    ///
    /// # Arguments
    /// * `normalized` - 8-bit stretched thermal values
    /// * `overlay` - Overlay text; ignored when the overlay is disabled
    ///
    /// # Returns
    /// The rendered image, or an error for an empty grid
    pub fn render(&self, normalized: &Grid<u8>, overlay: Option<&OverlayContent>) -> PipelineResult<RenderedImage> {
        if normalized.is_empty() {
            return Err(PipelineError::Image("Cannot render an empty grid".to_string()));
        }

        let colored = apply_colormap(normalized);
        let base = self.upscale(&colored);
        self.logger.info(&format!(
            "  Upscaled {}x: {}x{}",
            self.config.upscale, base.width(), base.height()
        ));

        let mut composite = base.clone();
        match overlay {
            Some(content) if self.config.overlay => draw_overlay(&mut composite, content)?,
            _ => {},
        }

        Ok(RenderedImage { base, composite })
    }

    /// Writes an image as JPEG, creating the parent directory if needed
    ///
    /// # Returns
    /// The size of the written file in bytes
    pub fn save_jpeg(&self, img: &RgbImage, path: &Path) -> PipelineResult<u64> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        {
            let mut encoder = JpegEncoder::new_with_quality(&mut writer, self.config.jpeg_quality);
            encoder.encode_image(img)?;
        }
        writer.flush()?;

        let size = fs::metadata(path)?.len();
        self.logger.info(&format!("  Saved: {} ({:.1} KB)", path.display(), size as f64 / 1024.0));
        Ok(size)
    }

    /// Path of the output file for a point inside the configured directory
    pub fn output_path(&self, lat: f64, lon: f64, unix_seconds: i64) -> PathBuf {
        self.config.output_dir.join(output_file_name(lat, lon, unix_seconds))
    }
}
