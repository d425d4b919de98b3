//! Burn-in overlay
//!
//! Draws a block in the bottom-left corner of the rendered image:
//!
//! ```text
//!   ^
//!   N
//!   lat lon
//!   YYYY-MM-DD HH:MM:SS UTC
//!   Land   <min>°C  [====== ramp ======]  <max>°C
//!   Water  <min>°C                        <max>°C
//! ```
//!
//! Sizes scale with the image width.

use ab_glyph::{FontRef, PxScale};
use chrono::{DateTime, Utc};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_polygon_mut, draw_text_mut, text_size};
use imageproc::point::Point;
use imageproc::rect::Rect;

use super::colormap::sample_ramp;
use crate::errors::{PipelineError, PipelineResult};
use crate::stretch::StretchInfo;

/// Embedded font data - DejaVu Sans Mono
const FONT_DATA: &[u8] = include_bytes!("../../assets/DejaVuSansMono.ttf");

const TEXT_COLOR: Rgb<u8> = Rgb([255, 255, 255]);

/// Parses the embedded overlay font
pub fn overlay_font() -> PipelineResult<FontRef<'static>> {
    FontRef::try_from_slice(FONT_DATA)
        .map_err(|e| PipelineError::Image(format!("Failed to load overlay font: {}", e)))
}

/// Everything printed on the overlay
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayContent {
    pub lat: f64,
    pub lon: f64,
    pub captured: DateTime<Utc>,
    /// Stretch bounds already converted to degrees Celsius
    pub celsius: StretchInfo,
}

impl OverlayContent {
    pub fn coordinates_line(&self) -> String {
        format!("{:.2} {:.2}", self.lat, self.lon)
    }

    pub fn timestamp_line(&self) -> String {
        self.captured.format("%Y-%m-%d %H:%M:%S UTC").to_string()
    }

    pub fn land_labels(&self) -> (String, String) {
        (
            format!("Land   {:.0}\u{b0}C", self.celsius.land_low),
            format!("{:.0}\u{b0}C", self.celsius.land_high),
        )
    }

    pub fn water_labels(&self) -> (String, String) {
        (
            format!("Water  {:.0}\u{b0}C", self.celsius.water_low),
            format!("{:.0}\u{b0}C", self.celsius.water_high),
        )
    }
}

/// Pixel geometry of the overlay for a given image width
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverlayLayout {
    pub font_size: u32,
    pub small_size: u32,
    pub margin: u32,
    pub line_height: u32,
    pub ramp_height: u32,
    pub ramp_width: u32,
    pub gap: u32,
}

impl OverlayLayout {
    pub fn for_width(width: u32) -> Self {
        let font_size = (width / 35).max(11);
        OverlayLayout {
            font_size,
            small_size: font_size.saturating_sub(2).max(9),
            margin: (width / 50).max(8),
            line_height: font_size + 3,
            ramp_height: (font_size * 2 / 3).max(10),
            ramp_width: (width / 4).max(80),
            gap: (font_size / 4).max(4),
        }
    }

    /// Height of the whole block, bottom margin included
    pub fn block_height(&self) -> u32 {
        let arrow_height = self.font_size + self.line_height;
        arrow_height + 4 * self.line_height + self.ramp_height + 4 + self.line_height + self.margin
    }
}

/// Burns the overlay into `img`
pub fn draw_overlay(img: &mut RgbImage, content: &OverlayContent) -> PipelineResult<()> {
    let font = overlay_font()?;
    let layout = OverlayLayout::for_width(img.width());
    let scale = PxScale::from(layout.font_size as f32);
    let small = PxScale::from(layout.small_size as f32);

    let (land_min, land_max) = content.land_labels();
    let (water_min, water_max) = content.water_labels();

    let label_width = text_size(small, &font, &land_min).0.max(text_size(small, &font, &water_min).0) as i32;
    let margin = layout.margin as i32;
    let line_height = layout.line_height as i32;
    let gap = layout.gap as i32;
    let ramp_x = margin + label_width + gap;
    let max_x = ramp_x + layout.ramp_width as i32 + gap;

    let x = margin;
    let mut y = img.height() as i32 - layout.block_height() as i32 - margin / 2;

    // North arrow
    let size = layout.font_size as i32;
    let centre = x + size / 2;
    let arrow = [
        Point::new(centre, y),
        Point::new(centre - size / 3, y + size),
        Point::new(centre + size / 3, y + size),
    ];
    draw_polygon_mut(img, &arrow, TEXT_COLOR);
    y += size + 2;
    draw_text_mut(img, TEXT_COLOR, x, y, scale, &font, "N");
    y += line_height;

    draw_text_mut(img, TEXT_COLOR, x, y, small, &font, &content.coordinates_line());
    y += line_height;

    draw_text_mut(img, TEXT_COLOR, x, y, small, &font, &content.timestamp_line());
    y += line_height;

    draw_text_mut(img, TEXT_COLOR, x, y, small, &font, &land_min);
    draw_text_mut(img, TEXT_COLOR, max_x, y, small, &font, &land_max);
    y += line_height;

    for (i, color) in sample_ramp(layout.ramp_width as usize).into_iter().enumerate() {
        let column = Rect::at(ramp_x + i as i32, y).of_size(1, layout.ramp_height);
        draw_filled_rect_mut(img, column, color);
    }
    y += layout.ramp_height as i32 + 4;

    draw_text_mut(img, TEXT_COLOR, x, y, small, &font, &water_min);
    draw_text_mut(img, TEXT_COLOR, max_x, y, small, &font, &water_max);
    Ok(())
}
