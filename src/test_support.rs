//! In-memory collaborators for unit tests

use std::cell::Cell;
use std::collections::HashMap;

use crate::catalog::{CatalogQuery, SceneCatalog, StacAsset, StacItem, StacItemProperties};
use crate::errors::{PipelineError, PipelineResult};
use crate::extractor::{resample, PixelWindow};
use crate::raster::grid::Grid;
use crate::raster::{RasterDataset, RasterProfile, RasterSource};
use crate::retry::CancelToken;
use crate::tiff::geo_keys::GeoReference;

/// Builds a catalog item with the given assets
pub fn item(id: &str, collection: &str, datetime: &str, cloud: Option<f64>, assets: &[(&str, &str)]) -> StacItem {
    StacItem {
        type_: "Feature".to_string(),
        id: id.to_string(),
        bbox: None,
        collection: Some(collection.to_string()),
        properties: StacItemProperties {
            datetime: Some(datetime.to_string()),
            eo_cloud_cover: cloud,
            platform: Some("landsat-9".to_string()),
            extra: HashMap::new(),
        },
        assets: assets.iter()
            .map(|(key, href)| (key.to_string(), StacAsset { href: href.to_string(), type_: None, roles: None }))
            .collect(),
    }
}

/// 10x10 quality grid with `clear_percent` clear pixels, the rest cloudy
pub fn qa_grid(clear_percent: usize) -> Grid<f64> {
    Grid::from_fn(10, 10, |r, c| if r * 10 + c < clear_percent { 21824.0 } else { 22280.0 })
}

/// Catalog that filters by collection only and can fail a number of times
pub struct MemoryCatalog {
    items: Vec<StacItem>,
    failures_left: Cell<u32>,
    pub calls: Cell<u32>,
}

impl MemoryCatalog {
    pub fn new(items: Vec<StacItem>) -> Self {
        MemoryCatalog { items, failures_left: Cell::new(0), calls: Cell::new(0) }
    }

    pub fn failing(items: Vec<StacItem>, failures: u32) -> Self {
        MemoryCatalog { items, failures_left: Cell::new(failures), calls: Cell::new(0) }
    }
}

impl SceneCatalog for MemoryCatalog {
    fn search(&self, query: &CatalogQuery) -> PipelineResult<Vec<StacItem>> {
        self.calls.set(self.calls.get() + 1);
        if self.failures_left.get() > 0 {
            self.failures_left.set(self.failures_left.get() - 1);
            return Err(PipelineError::ExternalRead("catalog unavailable".to_string()));
        }
        Ok(self.items.iter()
            .filter(|item| item.collection.as_ref().map_or(false, |c| query.collections.contains(c)))
            .take(query.limit)
            .cloned()
            .collect())
    }
}

/// Raster source serving fixed grids by href
///
/// Every dataset claims a global geographic grid so any window resolves;
/// reads return the stored grid, resampled when an output shape is given.
pub struct MemorySource {
    grids: HashMap<String, Grid<f64>>,
    pub opened: Cell<u32>,
}

impl MemorySource {
    pub fn new() -> Self {
        MemorySource { grids: HashMap::new(), opened: Cell::new(0) }
    }

    pub fn with(mut self, href: &str, grid: Grid<f64>) -> Self {
        self.grids.insert(href.to_string(), grid);
        self
    }
}

impl RasterSource for MemorySource {
    fn open(&self, href: &str) -> PipelineResult<Box<dyn RasterDataset>> {
        self.opened.set(self.opened.get() + 1);
        let grid = self.grids.get(href)
            .cloned()
            .ok_or_else(|| PipelineError::ExternalRead(format!("{}: not found", href)))?;
        Ok(Box::new(MemoryDataset { grid, profile: global_profile() }))
    }
}

fn global_profile() -> RasterProfile {
    let geo = GeoReference { epsg: Some(4326), geotransform: [-180.0, 0.01, 0.0, 90.0, 0.0, -0.01] };
    RasterProfile { epsg: Some(4326), geo, width: 36000, height: 18000 }
}

struct MemoryDataset {
    grid: Grid<f64>,
    profile: RasterProfile,
}

impl RasterDataset for MemoryDataset {
    fn profile(&self) -> &RasterProfile {
        &self.profile
    }

    fn read(&mut self, _window: PixelWindow, out_shape: Option<(usize, usize)>, cancel: &CancelToken) -> PipelineResult<Grid<f64>> {
        cancel.check()?;
        match out_shape {
            Some((rows, cols)) => resample::nearest(&self.grid, rows, cols)
                .ok_or_else(|| PipelineError::ExternalRead("empty grid".to_string())),
            None => Ok(self.grid.clone()),
        }
    }
}
