//! Thermal color ramp
//!
//! Normalized values run through a hot-end gamma expansion and are then
//! interpolated across five fixed stops: mid gray (coldest), light gray,
//! pink, orange and gold (hottest).

use image::{Rgb, RgbImage};

use crate::raster::grid::Grid;

/// One stop of the ramp: normalized position and RGB channels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorStop {
    pub position: f64,
    pub rgb: [f64; 3],
}

/// Stops of the thermal ramp, ordered by position
pub const THERMAL_STOPS: [ColorStop; 5] = [
    ColorStop { position: 0.00, rgb: [80.0, 80.0, 85.0] },
    ColorStop { position: 0.70, rgb: [180.0, 180.0, 185.0] },
    ColorStop { position: 0.82, rgb: [205.0, 180.0, 185.0] },
    ColorStop { position: 0.91, rgb: [240.0, 160.0, 60.0] },
    ColorStop { position: 1.00, rgb: [255.0, 210.0, 80.0] },
];

/// Values above this normalized level get the gamma expansion
pub const HOT_THRESHOLD: f64 = 0.70;
/// Exponent of the hot-end expansion
pub const HOT_GAMMA: f64 = 0.6;

/// Expands contrast above `HOT_THRESHOLD`, leaves lower values untouched
pub fn hot_gamma(norm: f64) -> f64 {
    if norm > HOT_THRESHOLD {
        let hot = ((norm - HOT_THRESHOLD) / (1.0 - HOT_THRESHOLD)).clamp(0.0, 1.0);
        HOT_THRESHOLD + hot.powf(HOT_GAMMA) * (1.0 - HOT_THRESHOLD)
    } else {
        norm
    }
}

/// Piecewise-linear interpolation of one channel, clamped at the end stops
fn interpolate(position: f64, channel: usize) -> f64 {
    let first = THERMAL_STOPS[0];
    let last = THERMAL_STOPS[THERMAL_STOPS.len() - 1];
    if position <= first.position {
        return first.rgb[channel];
    }
    if position >= last.position {
        return last.rgb[channel];
    }

    for pair in THERMAL_STOPS.windows(2) {
        let (lo, hi) = (pair[0], pair[1]);
        if position <= hi.position {
            let t = (position - lo.position) / (hi.position - lo.position);
            return lo.rgb[channel] + t * (hi.rgb[channel] - lo.rgb[channel]);
        }
    }
    last.rgb[channel]
}

/// Color of one 8-bit normalized value
pub fn color_for(value: u8) -> Rgb<u8> {
    let position = hot_gamma(value as f64 / 255.0);
    let mut rgb = [0u8; 3];
    for (channel, out) in rgb.iter_mut().enumerate() {
        // Truncating cast, channel values are already inside 0..=255
        *out = interpolate(position, channel).clamp(0.0, 255.0) as u8;
    }
    Rgb(rgb)
}

/// Applies the ramp to a normalized grid
///
/// # Arguments
/// * `normalized` - 8-bit stretched thermal values
///
/// # Returns
/// An RGB image with one pixel per grid cell
pub fn apply_colormap(normalized: &Grid<u8>) -> RgbImage {
    // A 256-entry table makes the mapping a lookup
    let table: Vec<Rgb<u8>> = (0..=255u8).map(color_for).collect();
    let (rows, cols) = normalized.shape();

    RgbImage::from_fn(cols as u32, rows as u32, |x, y| {
        table[normalized[(y as usize, x as usize)] as usize]
    })
}

/// Samples the ramp at `steps` evenly spaced levels from 0 to 255
///
/// Used for the legend bar; levels are truncated to whole values before
/// lookup, as for image pixels.
pub fn sample_ramp(steps: usize) -> Vec<Rgb<u8>> {
    match steps {
        0 => Vec::new(),
        1 => vec![color_for(0)],
        _ => (0..steps)
            .map(|i| {
                let level = 255.0 * i as f64 / (steps - 1) as f64;
                color_for(level as u8)
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_end_stops() {
        assert_eq!(color_for(0), Rgb([80, 80, 85]));
        assert_eq!(color_for(255), Rgb([255, 210, 80]));
    }

    #[test]
    fn test_gamma_only_touches_hot_end() {
        assert_eq!(hot_gamma(0.5), 0.5);
        assert_eq!(hot_gamma(0.7), 0.7);
        assert!(hot_gamma(0.75) > 0.75);
        assert!((hot_gamma(1.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_cold_range_is_gray() {
        let Rgb([r, g, b]) = color_for(100);
        assert_eq!(r, g);
        assert_eq!(b, r + 5);
    }

    #[test]
    fn test_apply_colormap_dimensions() {
        let grid = Grid::from_fn(3, 5, |r, c| (r * 50 + c * 10) as u8);
        let img = apply_colormap(&grid);
        assert_eq!(img.dimensions(), (5, 3));
        assert_eq!(*img.get_pixel(4, 2), color_for(grid[(2, 4)]));
    }

    #[test]
    fn test_apply_colormap_is_deterministic() {
        let grid = Grid::from_fn(16, 16, |r, c| ((r * 16 + c) % 256) as u8);
        let first = apply_colormap(&grid);
        let second = apply_colormap(&grid);
        assert_eq!(first.as_raw(), second.as_raw());
    }

    #[test]
    fn test_sample_ramp_spans_ramp() {
        let ramp = sample_ramp(80);
        assert_eq!(ramp.len(), 80);
        assert_eq!(ramp[0], color_for(0));
        assert_eq!(ramp[79], color_for(255));
        assert!(sample_ramp(0).is_empty());
    }
}
