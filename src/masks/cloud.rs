//! Quality-band decoding
//!
//! Landsat Collection 2 QA_PIXEL codes carry one flag per bit. A pixel is
//! clear when none of the fill, dilated-cloud, cloud and cloud-shadow
//! flags are set.

use crate::raster::grid::Grid;

/// Fill / no-data flag
pub const FILL_BIT: u32 = 0;
/// Dilated cloud flag
pub const DILATED_CLOUD_BIT: u32 = 1;
/// Cloud flag
pub const CLOUD_BIT: u32 = 3;
/// Cloud shadow flag
pub const CLOUD_SHADOW_BIT: u32 = 4;

/// Union of the flags that make a pixel unusable
pub const NOT_CLEAR_MASK: u64 =
    (1 << FILL_BIT) | (1 << DILATED_CLOUD_BIT) | (1 << CLOUD_BIT) | (1 << CLOUD_SHADOW_BIT);

/// Whether a quality code describes a clear pixel
pub fn is_clear(code: u64) -> bool {
    code & NOT_CLEAR_MASK == 0
}

/// Decodes a quality band into a clear/cloudy grid
///
/// Samples are read as unsigned codes; negative or non-finite samples
/// cannot be valid codes and are treated as fill.
pub fn clear_mask(qa: &Grid<f64>) -> Grid<bool> {
    qa.map(|value| {
        if value.is_finite() && *value >= 0.0 {
            is_clear(*value as u64)
        } else {
            false
        }
    })
}

/// Percentage of clear pixels in a quality band, 0 for an empty band
pub fn clear_percentage(qa: &Grid<f64>) -> f64 {
    clear_mask(qa).percent_true()
}
