//! Land / water / shoreline zoning
//!
//! The raw water mask is dilated and eroded with the cross kernel. Pixels
//! that stay water after erosion are pure water, pixels outside the
//! dilated mask are pure land, and the band in between is the shoreline.

use crate::errors::{PipelineError, PipelineResult};
use crate::raster::grid::Grid;

use super::morphology::{dilate, erode};

/// Default number of morphology iterations (zone margin in pixels)
pub const DEFAULT_ITERATIONS: usize = 2;

/// Disjoint zone masks over one thermal window
#[derive(Debug, Clone, PartialEq)]
pub struct ZoneMasks {
    /// Usable pixels far enough from any water
    pub pure_land: Grid<bool>,
    /// Usable pixels well inside water bodies
    pub pure_water: Grid<bool>,
    /// Valid pixels in the transition band, cloudy or not
    pub mixed_shoreline: Grid<bool>,
}

/// Classifies pixels into zones from a raw water mask
#[derive(Debug, Clone, Copy)]
pub struct WaterZoneClassifier {
    iterations: usize,
}

impl Default for WaterZoneClassifier {
    fn default() -> Self {
        WaterZoneClassifier { iterations: DEFAULT_ITERATIONS }
    }
}

impl WaterZoneClassifier {
    pub fn new(iterations: usize) -> Self {
        WaterZoneClassifier { iterations }
    }

    /// Builds the three zone masks
    ///
    /// # Arguments
    /// * `water` - Raw water mask (true = water)
    /// * `usable` - Valid and clear pixels
    /// * `valid` - Pixels with data, regardless of cloud
    ///
    /// # Returns
    /// The zones, or `ShapeMismatch` when the grids disagree
    pub fn classify(&self, water: &Grid<bool>, usable: &Grid<bool>, valid: &Grid<bool>) -> PipelineResult<ZoneMasks> {
        for other in [usable, valid] {
            if other.shape() != water.shape() {
                return Err(PipelineError::ShapeMismatch { expected: water.shape(), actual: other.shape() });
            }
        }

        let dilated = dilate(water, self.iterations);
        let eroded = erode(water, self.iterations);

        let pure_water = Grid::from_fn(water.rows(), water.cols(), |r, c| eroded[(r, c)] && usable[(r, c)]);
        let pure_land = Grid::from_fn(water.rows(), water.cols(), |r, c| !dilated[(r, c)] && usable[(r, c)]);
        let mixed_shoreline = Grid::from_fn(water.rows(), water.cols(), |r, c| {
            dilated[(r, c)] && !eroded[(r, c)] && valid[(r, c)]
        });

        Ok(ZoneMasks { pure_land, pure_water, mixed_shoreline })
    }
}
