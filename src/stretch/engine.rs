//! Zone-aware brightness stretch
//!
//! With a water mask, land and water pixels get independent percentile
//! stretches and the shoreline band is blended between the two. Without
//! one, a single stretch is taken from the centre of the window.

use crate::errors::{PipelineError, PipelineResult};
use crate::masks::{MaskLayer, WaterZoneClassifier, ZoneMasks};
use crate::raster::grid::Grid;
use crate::utils::logger::Logger;

use super::percentile::percentile_pair;

/// Lower percentile for every stretch
pub const LOW_PERCENTILE: f64 = 0.5;
/// Upper percentile for a pure land or water zone
pub const ZONE_HIGH_PERCENTILE: f64 = 99.9;
/// Upper percentile for whole-window and centre stretches
pub const WINDOW_HIGH_PERCENTILE: f64 = 99.5;
/// Fill value when a single stretch has zero range
pub const FLAT_FILL: u8 = 128;
/// Smallest half-span of the centre sampling window, in pixels
pub const MIN_CENTRE_MARGIN: usize = 10;

/// Raw-DN bounds used for normalization
///
/// When no water distinction exists the water bounds equal the land bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StretchInfo {
    pub land_low: f64,
    pub land_high: f64,
    pub water_low: f64,
    pub water_high: f64,
}

impl StretchInfo {
    /// Same bounds for land and water
    pub fn single(low: f64, high: f64) -> Self {
        StretchInfo { land_low: low, land_high: high, water_low: low, water_high: high }
    }

    pub fn land_range(&self) -> f64 {
        self.land_high - self.land_low
    }

    pub fn water_range(&self) -> f64 {
        self.water_high - self.water_low
    }
}

/// Which stretch was applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StretchMode {
    Zonal,
    Single,
}

/// Normalized 8-bit grid with the bounds that produced it
#[derive(Debug, Clone)]
pub struct StretchResult {
    pub normalized: Grid<u8>,
    pub info: StretchInfo,
    pub mode: StretchMode,
}

/// Maps `value` from `[low, low + range]` onto 0-255, clipped
fn scale(value: f64, low: f64, range: f64) -> f64 {
    ((value - low) / range * 255.0).clamp(0.0, 255.0)
}

/// Values of `data` where `mask` is set
fn select(data: &Grid<f64>, mask: &Grid<bool>) -> Vec<f64> {
    data.iter().zip(mask.iter()).filter(|(_, m)| **m).map(|(v, _)| *v).collect()
}

fn ratio_percent(part: usize, whole: usize) -> f64 {
    if whole == 0 { 0.0 } else { 100.0 * part as f64 / whole as f64 }
}

/// Computes zone-aware stretches
pub struct ZonalStretchEngine<'a> {
    classifier: WaterZoneClassifier,
    logger: &'a Logger,
}

impl<'a> ZonalStretchEngine<'a> {
    pub fn new(logger: &'a Logger) -> Self {
        ZonalStretchEngine { classifier: WaterZoneClassifier::default(), logger }
    }

    pub fn with_classifier(classifier: WaterZoneClassifier, logger: &'a Logger) -> Self {
        ZonalStretchEngine { classifier, logger }
    }

    /// Normalizes a thermal window to 8 bits
    ///
    /// Pixels with a value of 0 or below are treated as no-data. Masks
    /// whose shape differs from `thermal` are treated as absent.
    ///
    /// # Arguments
    /// * `thermal` - Raw thermal digital numbers
    /// * `clear` - Clear-sky mask; absent means every valid pixel is usable
    /// * `water` - Raw water mask; absent selects the single stretch
    ///
    /// # Returns
    /// The normalized grid and bounds, or `NoValidThermalData`
    pub fn stretch(&self, thermal: &Grid<f64>, clear: &MaskLayer, water: &MaskLayer) -> PipelineResult<StretchResult> {
        let shape = thermal.shape();
        let valid = thermal.map(|v| *v > 0.0);

        let usable = match clear.clone().matching_shape(shape) {
            MaskLayer::Present(clear) => {
                if clear.count_true() < clear.len() {
                    let cloudy = valid.iter().zip(clear.iter()).filter(|(v, c)| **v && !**c).count();
                    self.logger.info(&format!(
                        "Excluding {:.1}% cloudy pixels from stretch",
                        ratio_percent(cloudy, valid.count_true())
                    ));
                }
                Grid::from_fn(shape.0, shape.1, |r, c| valid[(r, c)] && clear[(r, c)])
            },
            MaskLayer::Absent => valid.clone(),
        };

        match water.clone().matching_shape(shape) {
            MaskLayer::Present(water) => self.zonal(thermal, &water, &usable, &valid),
            MaskLayer::Absent => {
                if water.is_present() {
                    self.logger.warn("Water mask shape differs from thermal window, using single stretch");
                }
                self.single(thermal, &usable)
            },
        }
    }

    fn zonal(&self, thermal: &Grid<f64>, water: &Grid<bool>, usable: &Grid<bool>, valid: &Grid<bool>) -> PipelineResult<StretchResult> {
        let ZoneMasks { pure_land, pure_water, mixed_shoreline } = self.classifier.classify(water, usable, valid)?;

        self.logger.info(&format!(
            "Mixed shoreline pixels: {:.1}%",
            ratio_percent(mixed_shoreline.count_true(), valid.count_true())
        ));

        let (land_low, land_high) = if pure_land.any() {
            let bounds = percentile_pair(&select(thermal, &pure_land), LOW_PERCENTILE, ZONE_HIGH_PERCENTILE)
                .ok_or(PipelineError::NoValidThermalData)?;
            self.logger.info(&format!("Land stretch: {:.0} - {:.0}", bounds.0, bounds.1));
            bounds
        } else {
            percentile_pair(&select(thermal, usable), LOW_PERCENTILE, WINDOW_HIGH_PERCENTILE)
                .ok_or(PipelineError::NoValidThermalData)?
        };

        let (water_low, water_high) = if pure_water.any() {
            let bounds = percentile_pair(&select(thermal, &pure_water), LOW_PERCENTILE, ZONE_HIGH_PERCENTILE)
                .ok_or(PipelineError::NoValidThermalData)?;
            self.logger.info(&format!("Water stretch: {:.0} - {:.0}", bounds.0, bounds.1));
            bounds
        } else {
            (land_low, land_high)
        };

        let info = StretchInfo { land_low, land_high, water_low, water_high };
        let land_range = info.land_range();
        let water_range = info.water_range();
        let blend = mixed_shoreline.any() && land_range > 0.0 && water_range > 0.0;

        let normalized = Grid::from_fn(thermal.rows(), thermal.cols(), |r, c| {
            let value = thermal[(r, c)];
            let out = if pure_land[(r, c)] && land_range > 0.0 {
                scale(value, land_low, land_range)
            } else if pure_water[(r, c)] && water_range > 0.0 {
                scale(value, water_low, water_range)
            } else if blend && mixed_shoreline[(r, c)] {
                // Weighted by the raw mask, not the morphed one
                let weight = if water[(r, c)] { 1.0 } else { 0.0 };
                let land_norm = (value - land_low) / land_range * 255.0;
                let water_norm = (value - water_low) / water_range * 255.0;
                (water_norm * weight + land_norm * (1.0 - weight)).clamp(0.0, 255.0)
            } else {
                0.0
            };
            out as u8
        });

        Ok(StretchResult { normalized, info, mode: StretchMode::Zonal })
    }

    fn single(&self, thermal: &Grid<f64>, usable: &Grid<bool>) -> PipelineResult<StretchResult> {
        let (rows, cols) = thermal.shape();
        let margin = (rows.max(cols) / 4).max(MIN_CENTRE_MARGIN);
        let (cy, cx) = (rows / 2, cols / 2);
        let row_range = cy.saturating_sub(margin)..(cy + margin).min(rows);
        let col_range = cx.saturating_sub(margin)..(cx + margin).min(cols);

        let mut sample = Vec::new();
        for r in row_range {
            for c in col_range.clone() {
                if usable[(r, c)] {
                    sample.push(thermal[(r, c)]);
                }
            }
        }
        if sample.is_empty() {
            self.logger.debug("Centre of window has no usable pixels, sampling the whole window");
            sample = select(thermal, usable);
        }

        let (low, high) = percentile_pair(&sample, LOW_PERCENTILE, WINDOW_HIGH_PERCENTILE)
            .ok_or(PipelineError::NoValidThermalData)?;
        self.logger.info(&format!("Stretch: {:.0} - {:.0}", low, high));

        let range = high - low;
        let normalized = if range > 0.0 {
            thermal.map(|v| scale(*v, low, range) as u8)
        } else {
            Grid::filled(rows, cols, FLAT_FILL)
        };

        Ok(StretchResult { normalized, info: StretchInfo::single(low, high), mode: StretchMode::Single })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine_with(logger: &Logger) -> ZonalStretchEngine<'_> {
        ZonalStretchEngine::new(logger)
    }

    #[test]
    fn test_single_stretch_spans_full_range() {
        let logger = Logger::capturing();
        let thermal = Grid::from_fn(40, 40, |r, c| 1000.0 + (r * 40 + c) as f64);
        let result = engine_with(&logger).stretch(&thermal, &MaskLayer::Absent, &MaskLayer::Absent).unwrap();

        assert_eq!(result.mode, StretchMode::Single);
        assert_eq!(result.info.land_low, result.info.water_low);
        assert_eq!(result.info.land_high, result.info.water_high);
        assert_eq!(result.normalized[(0, 0)], 0);
        assert_eq!(result.normalized[(39, 39)], 255);
    }

    #[test]
    fn test_single_stretch_flat_window_fills_mid_grey() {
        let logger = Logger::capturing();
        let thermal = Grid::filled(30, 30, 25000.0);
        let result = engine_with(&logger).stretch(&thermal, &MaskLayer::Absent, &MaskLayer::Absent).unwrap();
        assert!(result.normalized.iter().all(|v| *v == FLAT_FILL));
    }

    #[test]
    fn test_no_valid_data_fails() {
        let logger = Logger::capturing();
        let thermal = Grid::filled(30, 30, 0.0);
        let result = engine_with(&logger).stretch(&thermal, &MaskLayer::Absent, &MaskLayer::Absent);
        assert!(matches!(result, Err(PipelineError::NoValidThermalData)));

        let thermal = Grid::filled(30, 30, 30000.0);
        let cloudy = MaskLayer::Present(Grid::filled(30, 30, false));
        let result = engine_with(&logger).stretch(&thermal, &cloudy, &MaskLayer::Absent);
        assert!(matches!(result, Err(PipelineError::NoValidThermalData)));
    }

    #[test]
    fn test_cloudy_centre_falls_back_to_whole_window() {
        let logger = Logger::capturing();
        let thermal = Grid::from_fn(60, 60, |r, _| 20000.0 + r as f64 * 10.0);
        // only the outer frame is clear
        let clear = Grid::from_fn(60, 60, |r, c| r < 3 || c < 3 || r >= 57 || c >= 57);
        let result = engine_with(&logger)
            .stretch(&thermal, &MaskLayer::Present(clear), &MaskLayer::Absent)
            .unwrap();
        assert!(result.info.land_low < 20030.0);
        assert!(result.info.land_high > 20560.0);
    }

    #[test]
    fn test_zonal_stretch_normalizes_each_zone() {
        let logger = Logger::capturing();
        // left half land (warm gradient), right half water (cool gradient)
        let water = Grid::from_fn(40, 40, |_, c| c >= 20);
        let thermal = Grid::from_fn(40, 40, |r, c| {
            if c >= 20 { 10000.0 + r as f64 } else { 30000.0 + (r * 20 + c) as f64 }
        });
        let result = engine_with(&logger)
            .stretch(&thermal, &MaskLayer::Absent, &MaskLayer::Present(water))
            .unwrap();

        assert_eq!(result.mode, StretchMode::Zonal);
        assert!(result.info.land_low >= 30000.0);
        assert!(result.info.water_high <= 10040.0);
        // both zones reach the top of the range
        let land_max = (0..40).map(|r| result.normalized[(r, 10)]).max().unwrap();
        let water_max = (0..40).map(|r| result.normalized[(r, 35)]).max().unwrap();
        assert!(land_max >= 250);
        assert!(water_max >= 250);
    }

    #[test]
    fn test_zero_land_range_leaves_land_at_zero() {
        let logger = Logger::capturing();
        let water = Grid::from_fn(30, 30, |_, c| c >= 15);
        let thermal = Grid::from_fn(30, 30, |r, c| if c >= 15 { 10000.0 + r as f64 } else { 31000.0 });
        let result = engine_with(&logger)
            .stretch(&thermal, &MaskLayer::Absent, &MaskLayer::Present(water))
            .unwrap();

        assert_eq!(result.info.land_low, result.info.land_high);
        for r in 0..30 {
            for c in 0..12 {
                assert_eq!(result.normalized[(r, c)], 0, "land pixel ({}, {})", r, c);
            }
        }
    }

    fn shoreline_of(water: &Grid<bool>, thermal: &Grid<f64>) -> Grid<bool> {
        let valid = thermal.map(|v| *v > 0.0);
        WaterZoneClassifier::default().classify(water, &valid, &valid).unwrap().mixed_shoreline
    }

    #[test]
    fn test_shoreline_follows_raw_water_mask() {
        let logger = Logger::capturing();
        let water = Grid::from_fn(40, 40, |_, c| c >= 20);
        let thermal = Grid::from_fn(40, 40, |r, c| {
            if c >= 20 { 10000.0 + r as f64 } else { 30000.0 + (r * 20 + c) as f64 }
        });
        let result = engine_with(&logger)
            .stretch(&thermal, &MaskLayer::Absent, &MaskLayer::Present(water.clone()))
            .unwrap();
        let info = result.info;
        let shoreline = shoreline_of(&water, &thermal);

        let (mut land_side, mut water_side) = (0, 0);
        for r in 0..40 {
            for c in 0..40 {
                if !shoreline[(r, c)] {
                    continue;
                }
                let value = thermal[(r, c)];
                let expected = if water[(r, c)] {
                    water_side += 1;
                    scale(value, info.water_low, info.water_range())
                } else {
                    land_side += 1;
                    scale(value, info.land_low, info.land_range())
                };
                assert_eq!(result.normalized[(r, c)], expected as u8, "shoreline pixel ({}, {})", r, c);
            }
        }
        assert!(land_side > 0 && water_side > 0);

        // mid-range on both sides of the shore, not clipped by the other zone's bounds
        let land_mid = result.normalized[(20, 18)];
        let water_mid = result.normalized[(20, 20)];
        assert!(land_mid > 100 && land_mid < 160, "land side {}", land_mid);
        assert!(water_mid > 100 && water_mid < 160, "water side {}", water_mid);
    }

    #[test]
    fn test_shoreline_not_blended_when_a_zone_is_flat() {
        let logger = Logger::capturing();
        let water = Grid::from_fn(40, 40, |_, c| c >= 20);
        let thermal = Grid::from_fn(40, 40, |r, c| if c >= 20 { 10000.0 + r as f64 } else { 31000.0 });
        let result = engine_with(&logger)
            .stretch(&thermal, &MaskLayer::Absent, &MaskLayer::Present(water.clone()))
            .unwrap();
        assert_eq!(result.info.land_range(), 0.0);
        assert!(result.info.water_range() > 0.0);

        let shoreline = shoreline_of(&water, &thermal);
        assert!(shoreline.any());
        for r in 0..40 {
            for c in 0..40 {
                if shoreline[(r, c)] {
                    assert_eq!(result.normalized[(r, c)], 0, "shoreline pixel ({}, {})", r, c);
                }
            }
        }
        // pure water is still stretched
        assert!(result.normalized[(39, 35)] > 200);
    }

    #[test]
    fn test_mismatched_water_mask_is_ignored() {
        let logger = Logger::capturing();
        let thermal = Grid::from_fn(30, 30, |r, c| 1000.0 + (r + c) as f64);
        let water = MaskLayer::Present(Grid::filled(10, 10, true));
        let result = engine_with(&logger).stretch(&thermal, &MaskLayer::Absent, &water).unwrap();
        assert_eq!(result.mode, StretchMode::Single);
        assert_eq!(logger.messages_at(log::Level::Warn).len(), 1);
    }
}
