//! Locally cloud-free scene selection
//!
//! The catalog is asked for recent scenes with a relaxed scene-level cloud
//! filter. Candidates are then checked newest first against the quality
//! band over the exact area of interest; the first one clear enough wins.

use std::time::Instant;

use chrono::{DateTime, Utc};

use crate::catalog::{CatalogQuery, SceneCandidate, SceneCatalog};
use crate::config::SearchConfig;
use crate::coordinate::{area_bbox, BoundingBox};
use crate::errors::{PipelineError, PipelineResult};
use crate::masks::clear_percentage;
use crate::raster::{read_bounds, RasterSource};
use crate::retry::RetryExecutor;
use crate::utils::logger::Logger;
use crate::utils::progress::ProgressTracker;

/// A candidate accepted for processing
#[derive(Debug, Clone, PartialEq)]
pub struct SelectedScene {
    pub candidate: SceneCandidate,
    /// Clear percentage measured over `bbox`
    pub local_clear: f64,
    /// WGS 84 area of interest used for every band read
    pub bbox: BoundingBox,
}

impl SelectedScene {
    pub fn id(&self) -> &str {
        &self.candidate.id
    }

    pub fn datetime(&self) -> DateTime<Utc> {
        self.candidate.datetime
    }
}

/// Finds the most recent locally clear scene
pub struct SceneLocator<'a> {
    config: SearchConfig,
    catalog: &'a dyn SceneCatalog,
    source: &'a dyn RasterSource,
    retry: &'a RetryExecutor<'a>,
    logger: &'a Logger,
}

impl<'a> SceneLocator<'a> {
    /// Create a new locator
    ///
    /// # Arguments
    /// * `config` - Search settings
    /// * `catalog` - Scene catalog to query
    /// * `source` - Raster access for quality bands
    /// * `retry` - Retry policy for every external call
    /// * `logger` - Logger for candidate diagnostics
    pub fn new(
        config: SearchConfig,
        catalog: &'a dyn SceneCatalog,
        source: &'a dyn RasterSource,
        retry: &'a RetryExecutor<'a>,
        logger: &'a Logger,
    ) -> Self {
        SceneLocator { config, catalog, source, retry, logger }
    }

    /// Selects a scene for a point
    ///
    /// # Arguments
    /// * `lat`, `lon` - Point of interest in degrees
    /// * `before` - Only consider scenes captured at or before this instant
    ///
    /// # Returns
    /// The selected scene, `NoScenesFound` when the catalog has nothing for
    /// the area, or `NoClearSceneFound` when no candidate is clear enough
    pub fn locate(&self, lat: f64, lon: f64, before: Option<DateTime<Utc>>) -> PipelineResult<SelectedScene> {
        let start = Instant::now();
        let bbox = area_bbox(lat, lon, self.config.area_size_km);
        let location = format!("{}, {}", lat, lon);

        let query = CatalogQuery::new(&self.config.collection, bbox)
            .cloud_cover_below(self.config.max_cloud_cover)
            .until(before)
            .limit(self.config.candidates);
        let items = self.retry.run("Catalog search", || self.catalog.search(&query))?;

        if items.is_empty() {
            return Err(PipelineError::NoScenesFound(location));
        }
        let total = items.len();
        self.logger.info(&format!(
            "  Catalog returned {} candidates ({:.2}s)", total, start.elapsed().as_secs_f64()
        ));

        let progress = if self.config.show_progress {
            ProgressTracker::new(total as u64, "Checking local cloud cover")
        } else {
            ProgressTracker::hidden(total as u64)
        };

        for (i, item) in items.iter().enumerate() {
            self.retry.cancel_token().check()?;
            progress.increment(1);

            let candidate = match SceneCandidate::from_item(item, &self.config.thermal_assets, &self.config.quality_asset) {
                Ok(candidate) => candidate,
                Err(e) => {
                    self.logger.warn(&format!("  [{}/{}] Skipping: {}", i + 1, total, e));
                    continue;
                },
            };

            let local_clear = match self.local_clear(&candidate, &bbox) {
                Ok(pct) => pct,
                Err(e) if e.is_terminal() => return Err(e),
                Err(e) => {
                    self.logger.warn(&format!(
                        "  [{}/{}] {}  Failed to check cloud cover: {}",
                        i + 1, total, candidate.date_label(), e
                    ));
                    continue;
                },
            };

            let accepted = local_clear >= self.config.min_local_clear;
            self.logger.info(&format!(
                "  [{}/{}] {}  scene={}%  local={:.0}% clear  {}",
                i + 1, total, candidate.date_label(), candidate.cloud_label(), local_clear,
                if accepted { "CLEAR" } else { "cloudy" }
            ));

            if accepted {
                progress.finish(&format!("Selected {}", candidate.id));
                self.logger.info(&format!(
                    "  Selected: {} ({:.2}s total)", candidate.id, start.elapsed().as_secs_f64()
                ));
                return Ok(SelectedScene { candidate, local_clear, bbox });
            }
        }

        progress.finish("No clear scene");
        Err(PipelineError::NoClearSceneFound {
            location,
            checked: total,
            threshold: self.config.min_local_clear,
        })
    }

    /// Percentage of clear pixels of a candidate inside `bbox`
    ///
    /// Candidates without a quality band count as fully clear, since the
    /// catalog already filtered on scene-level cloud cover.
    pub fn local_clear(&self, candidate: &SceneCandidate, bbox: &BoundingBox) -> PipelineResult<f64> {
        let href = match &candidate.quality_href {
            Some(href) => href,
            None => {
                self.logger.info("  No quality asset, assuming clear");
                return Ok(100.0);
            },
        };

        let cancel = self.retry.cancel_token();
        let qa = self.retry.run("Quality band read", || {
            let mut dataset = self.source.open(href)?;
            read_bounds(dataset.as_mut(), bbox, None, cancel)
        })?;
        Ok(clear_percentage(&qa))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retry::{CancelToken, RecordingSleeper, RetryPolicy};
    use crate::test_support::{item, qa_grid, MemoryCatalog, MemorySource};
    use log::Level;

    const LANDSAT: &str = "landsat-c2-l2";

    fn scene(id: &str, date: &str, qa: Option<&str>) -> crate::catalog::StacItem {
        let thermal = format!("{}_b10", id);
        let mut assets = vec![("lwir11", thermal.as_str())];
        if let Some(qa) = qa {
            assets.push(("qa_pixel", qa));
        }
        item(id, LANDSAT, date, Some(20.0), &assets)
    }

    struct Fixture {
        logger: Logger,
        sleeper: RecordingSleeper,
    }

    impl Fixture {
        fn new() -> Self {
            Fixture { logger: Logger::capturing(), sleeper: RecordingSleeper::new() }
        }

        fn locate(&self, catalog: &MemoryCatalog, source: &MemorySource) -> PipelineResult<SelectedScene> {
            let retry = RetryExecutor::new(RetryPolicy::default(), &self.sleeper, CancelToken::new(), &self.logger);
            let locator = SceneLocator::new(SearchConfig::default(), catalog, source, &retry, &self.logger);
            locator.locate(44.43, -110.59, None)
        }
    }

    #[test]
    fn test_recency_beats_clarity() {
        let catalog = MemoryCatalog::new(vec![
            scene("s1", "2024-07-20T18:00:00Z", Some("qa1")),
            scene("s2", "2024-07-12T18:00:00Z", Some("qa2")),
            scene("s3", "2024-07-04T18:00:00Z", Some("qa3")),
        ]);
        let source = MemorySource::new()
            .with("qa1", qa_grid(30))
            .with("qa2", qa_grid(80))
            .with("qa3", qa_grid(95));

        let fixture = Fixture::new();
        let selected = fixture.locate(&catalog, &source).unwrap();
        assert_eq!(selected.id(), "s2");
        assert_eq!(selected.local_clear, 80.0);
        assert_eq!(source.opened.get(), 2);

        let info = fixture.logger.messages_at(Level::Info);
        assert!(info.iter().any(|m| m.contains("[1/3] 2024-07-20  scene=20%  local=30% clear  cloudy")));
        assert!(info.iter().any(|m| m.contains("[2/3] 2024-07-12  scene=20%  local=80% clear  CLEAR")));
    }

    #[test]
    fn test_missing_quality_band_counts_as_clear() {
        let catalog = MemoryCatalog::new(vec![scene("s1", "2024-07-20T18:00:00Z", None)]);
        let selected = Fixture::new().locate(&catalog, &MemorySource::new()).unwrap();
        assert_eq!(selected.local_clear, 100.0);
        assert!(selected.candidate.quality_href.is_none());
    }

    #[test]
    fn test_no_scenes_found() {
        let catalog = MemoryCatalog::new(Vec::new());
        let err = Fixture::new().locate(&catalog, &MemorySource::new()).unwrap_err();
        assert!(matches!(err, PipelineError::NoScenesFound(_)));
    }

    #[test]
    fn test_no_clear_scene_reports_count() {
        let catalog = MemoryCatalog::new(vec![
            scene("s1", "2024-07-20T18:00:00Z", Some("qa1")),
            scene("s2", "2024-07-12T18:00:00Z", Some("qa2")),
        ]);
        let source = MemorySource::new().with("qa1", qa_grid(10)).with("qa2", qa_grid(49));
        match Fixture::new().locate(&catalog, &source) {
            Err(PipelineError::NoClearSceneFound { checked, threshold, .. }) => {
                assert_eq!(checked, 2);
                assert_eq!(threshold, 50.0);
            },
            other => panic!("expected NoClearSceneFound, got {:?}", other),
        }
    }

    #[test]
    fn test_failed_quality_read_skips_candidate() {
        let catalog = MemoryCatalog::new(vec![
            scene("s1", "2024-07-20T18:00:00Z", Some("missing")),
            scene("s2", "2024-07-12T18:00:00Z", Some("qa2")),
        ]);
        let source = MemorySource::new().with("qa2", qa_grid(60));
        let fixture = Fixture::new();
        let selected = fixture.locate(&catalog, &source).unwrap();
        assert_eq!(selected.id(), "s2");
        // Three attempts on the broken band, then one on the good one
        assert_eq!(source.opened.get(), 4);
        assert_eq!(fixture.sleeper.requested().len(), 2);
        assert!(fixture.logger.messages_at(Level::Warn).iter().any(|m| m.contains("Failed to check cloud cover")));
    }

    #[test]
    fn test_candidate_without_thermal_band_is_skipped() {
        let catalog = MemoryCatalog::new(vec![
            item("bare", LANDSAT, "2024-07-20T18:00:00Z", Some(5.0), &[("qa_pixel", "qa1")]),
            scene("s2", "2024-07-12T18:00:00Z", None),
        ]);
        let source = MemorySource::new().with("qa1", qa_grid(100));
        let selected = Fixture::new().locate(&catalog, &source).unwrap();
        assert_eq!(selected.id(), "s2");
        assert_eq!(source.opened.get(), 0);
    }

    #[test]
    fn test_catalog_search_is_retried() {
        let catalog = MemoryCatalog::failing(vec![scene("s1", "2024-07-20T18:00:00Z", None)], 2);
        let fixture = Fixture::new();
        assert!(fixture.locate(&catalog, &MemorySource::new()).is_ok());
        assert_eq!(catalog.calls.get(), 3);
        assert_eq!(fixture.logger.messages_at(Level::Warn).len(), 2);
    }

    #[test]
    fn test_cancelled_locator_stops() {
        let catalog = MemoryCatalog::new(vec![scene("s1", "2024-07-20T18:00:00Z", None)]);
        let logger = Logger::capturing();
        let sleeper = RecordingSleeper::new();
        let cancel = CancelToken::new();
        cancel.cancel();
        let retry = RetryExecutor::new(RetryPolicy::default(), &sleeper, cancel, &logger);
        let source = MemorySource::new();
        let locator = SceneLocator::new(SearchConfig::default(), &catalog, &source, &retry, &logger);
        assert!(matches!(locator.locate(1.0, 2.0, None), Err(PipelineError::Cancelled)));
        assert_eq!(catalog.calls.get(), 0);
    }
}
