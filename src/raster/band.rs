//! Band windows and the shared square crop

use std::fmt;

use crate::errors::{PipelineError, PipelineResult};
use super::grid::Grid;

/// What a band is used for in the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BandRole {
    Thermal,
    Quality,
    LandCover,
}

impl fmt::Display for BandRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BandRole::Thermal => write!(f, "thermal"),
            BandRole::Quality => write!(f, "quality"),
            BandRole::LandCover => write!(f, "land cover"),
        }
    }
}

/// Samples read for one band over the area of interest
#[derive(Debug, Clone, PartialEq)]
pub struct RasterWindow {
    pub role: BandRole,
    pub data: Grid<f64>,
}

impl RasterWindow {
    pub fn new(role: BandRole, data: Grid<f64>) -> Self {
        RasterWindow { role, data }
    }

    pub fn shape(&self) -> (usize, usize) {
        self.data.shape()
    }
}

/// Square crop recorded on the thermal read and reused for every band
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropInfo {
    pub row_off: usize,
    pub col_off: usize,
    pub size: usize,
    /// `(rows, cols)` of the thermal window before cropping
    pub orig_shape: (usize, usize),
}

impl CropInfo {
    /// Centred square crop of the smaller dimension of `shape`
    pub fn centered(shape: (usize, usize)) -> Self {
        let (rows, cols) = shape;
        let size = rows.min(cols);
        CropInfo {
            row_off: (rows - size) / 2,
            col_off: (cols - size) / 2,
            size,
            orig_shape: shape,
        }
    }

    /// Shape every aligned band must have
    pub fn target_shape(&self) -> (usize, usize) {
        (self.size, self.size)
    }

    /// Whether the thermal window needed cropping at all
    pub fn is_identity(&self) -> bool {
        self.orig_shape == self.target_shape()
    }

    /// Brings a band to the crop's square shape
    ///
    /// A band already at the target shape is returned unchanged. Otherwise
    /// the recorded offsets are applied; a band those offsets do not fit is
    /// centre-cropped instead. A band smaller than the crop in either
    /// dimension cannot be aligned.
    ///
    /// # Returns
    /// The aligned grid, or `ShapeMismatch`
    pub fn apply<T: Clone>(&self, grid: &Grid<T>) -> PipelineResult<Grid<T>> {
        let shape = grid.shape();
        if shape == self.target_shape() {
            return Ok(grid.clone());
        }

        if let Some(cropped) = grid.crop(self.row_off, self.col_off, self.size, self.size) {
            return Ok(cropped);
        }

        let (rows, cols) = shape;
        if rows >= self.size && cols >= self.size {
            if let Some(cropped) = grid.crop((rows - self.size) / 2, (cols - self.size) / 2, self.size, self.size) {
                return Ok(cropped);
            }
        }

        Err(PipelineError::ShapeMismatch { expected: self.target_shape(), actual: shape })
    }
}
