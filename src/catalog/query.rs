//! Catalog search requests and the catalog capability

use chrono::{DateTime, Utc};

use crate::coordinate::BoundingBox;
use crate::errors::PipelineResult;
use super::stac::StacItem;

/// Item search parameters
///
/// Results are always ordered newest first.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogQuery {
    pub collections: Vec<String>,
    pub bbox: BoundingBox,
    /// Keep items whose `eo:cloud_cover` is strictly below this value
    pub cloud_cover_lt: Option<f64>,
    /// Keep items captured at or before this instant
    pub datetime_end: Option<DateTime<Utc>>,
    /// Property equality filters, `(name, value)`
    pub filters: Vec<(String, String)>,
    pub limit: usize,
}

impl CatalogQuery {
    pub fn new(collection: &str, bbox: BoundingBox) -> Self {
        CatalogQuery {
            collections: vec![collection.to_string()],
            bbox,
            cloud_cover_lt: None,
            datetime_end: None,
            filters: Vec::new(),
            limit: 10,
        }
    }

    pub fn cloud_cover_below(mut self, ceiling: f64) -> Self {
        self.cloud_cover_lt = Some(ceiling);
        self
    }

    pub fn until(mut self, end: Option<DateTime<Utc>>) -> Self {
        self.datetime_end = end;
        self
    }

    pub fn property_eq(mut self, name: &str, value: &str) -> Self {
        self.filters.push((name.to_string(), value.to_string()));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }
}

/// Catalog query capability
pub trait SceneCatalog {
    /// Runs a search; an empty result is not an error
    fn search(&self, query: &CatalogQuery) -> PipelineResult<Vec<StacItem>>;
}
