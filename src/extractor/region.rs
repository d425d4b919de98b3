//! Pixel window structure for windowed reads
//!
//! A window is a rectangle in pixel coordinates where (0,0) is the
//! top-left corner of the image.

/// Rectangular pixel window (offsets and sizes in pixels)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelWindow {
    /// Column of the top-left corner
    pub col_off: usize,
    /// Row of the top-left corner
    pub row_off: usize,
    /// Width in pixels
    pub width: usize,
    /// Height in pixels
    pub height: usize,
}

impl PixelWindow {
    /// Create a new window
    pub fn new(col_off: usize, row_off: usize, width: usize, height: usize) -> Self {
        PixelWindow { col_off, row_off, width, height }
    }

    /// Builds a window from fractional pixel bounds and clips it to an image
    ///
    /// Offsets are floored and lengths rounded (at least one pixel). The
    /// result is clipped to `image_width` x `image_height`; `None` means the
    /// bounds do not overlap the image at all.
    ///
    /// # Arguments
    /// * `col_min`, `row_min` - Fractional top-left corner
    /// * `col_max`, `row_max` - Fractional bottom-right corner
    /// * `image_width`, `image_height` - Raster extent in pixels
    pub fn from_fractional(
        col_min: f64,
        row_min: f64,
        col_max: f64,
        row_max: f64,
        image_width: usize,
        image_height: usize,
    ) -> Option<Self> {
        if !(col_min.is_finite() && row_min.is_finite() && col_max.is_finite() && row_max.is_finite()) {
            return None;
        }

        let col_start = col_min.floor();
        let row_start = row_min.floor();
        let width = (col_max - col_min).round().max(1.0);
        let height = (row_max - row_min).round().max(1.0);

        clip_span(col_start, width, image_width).and_then(|(col_off, width)| {
            clip_span(row_start, height, image_height)
                .map(|(row_off, height)| PixelWindow { col_off, row_off, width, height })
        })
    }

    /// Column immediately right of the window
    pub fn end_col(&self) -> usize {
        self.col_off + self.width
    }

    /// Row immediately below the window
    pub fn end_row(&self) -> usize {
        self.row_off + self.height
    }

    /// `(rows, cols)` of the window
    pub fn shape(&self) -> (usize, usize) {
        (self.height, self.width)
    }

    /// Whether the window lies completely inside an image of the given size
    pub fn fits_within(&self, image_width: usize, image_height: usize) -> bool {
        self.end_col() <= image_width && self.end_row() <= image_height
    }
}

/// Intersects `[start, start + len)` with `[0, limit)`
fn clip_span(start: f64, len: f64, limit: usize) -> Option<(usize, usize)> {
    let lo = start.max(0.0);
    let hi = (start + len).min(limit as f64);
    if hi <= lo {
        return None;
    }
    let lo = lo as usize;
    let hi = hi as usize;
    if hi <= lo {
        return None;
    }
    Some((lo, hi - lo))
}
