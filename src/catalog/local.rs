//! Catalog over STAC ItemCollection documents on disk

use std::cmp::Ordering;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::errors::{PipelineError, PipelineResult};
use super::candidate::parse_datetime;
use super::query::{CatalogQuery, SceneCatalog};
use super::stac::{StacItem, StacItemCollection};

/// `SceneCatalog` backed by one or more ItemCollection JSON files
#[derive(Debug, Clone, Default)]
pub struct LocalCatalog {
    items: Vec<StacItem>,
}

impl LocalCatalog {
    pub fn new() -> Self {
        LocalCatalog { items: Vec::new() }
    }

    /// Loads ItemCollection documents
    ///
    /// Relative asset hrefs are resolved against the directory of the
    /// document that contains them.
    pub fn from_files<P: AsRef<Path>>(paths: &[P]) -> PipelineResult<Self> {
        let mut catalog = LocalCatalog::new();
        for path in paths {
            catalog.load_file(path.as_ref())?;
        }
        Ok(catalog)
    }

    /// Loads one ItemCollection document
    pub fn load_file(&mut self, path: &Path) -> PipelineResult<()> {
        let content = fs::read_to_string(path)
            .map_err(|e| PipelineError::Catalog(format!("Cannot read {}: {}", path.display(), e)))?;
        let collection: StacItemCollection = serde_json::from_str(&content)
            .map_err(|e| PipelineError::Catalog(format!("{}: {}", path.display(), e)))?;

        let base = path.parent().map(Path::to_path_buf).unwrap_or_default();
        info!("Loaded {} catalog items from {}", collection.features.len(), path.display());
        self.add_collection(collection, &base);
        Ok(())
    }

    /// Adds the items of a parsed collection
    pub fn add_collection(&mut self, collection: StacItemCollection, base_dir: &Path) {
        for mut item in collection.features {
            for asset in item.assets.values_mut() {
                asset.href = resolve_href(&asset.href, base_dir);
            }
            self.items.push(item);
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn matches(item: &StacItem, query: &CatalogQuery) -> bool {
        if !query.collections.is_empty() {
            match &item.collection {
                Some(collection) if query.collections.contains(collection) => {},
                _ => return false,
            }
        }

        if let Some(bounds) = item.bounds() {
            if !bounds.intersects(&query.bbox) {
                return false;
            }
        }

        if let (Some(ceiling), Some(cloud)) = (query.cloud_cover_lt, item.properties.eo_cloud_cover) {
            if cloud >= ceiling {
                return false;
            }
        }

        if let Some(end) = query.datetime_end {
            let captured = item.properties.datetime.as_deref().and_then(parse_datetime);
            if let Some(captured) = captured {
                if captured > end {
                    return false;
                }
            }
        }

        query.filters.iter().all(|(name, value)| item.property_str(name).as_deref() == Some(value.as_str()))
    }
}

impl SceneCatalog for LocalCatalog {
    fn search(&self, query: &CatalogQuery) -> PipelineResult<Vec<StacItem>> {
        let mut found: Vec<StacItem> = self.items.iter()
            .filter(|item| Self::matches(item, query))
            .cloned()
            .collect();

        // Newest first; items without a parseable datetime go last
        found.sort_by(|a, b| {
            let a_time = a.properties.datetime.as_deref().and_then(parse_datetime);
            let b_time = b.properties.datetime.as_deref().and_then(parse_datetime);
            match (a_time, b_time) {
                (Some(a), Some(b)) => b.cmp(&a),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            }
        });
        found.truncate(query.limit);

        debug!("Catalog search {:?} matched {} item(s)", query.collections, found.len());
        Ok(found)
    }
}

/// Joins a relative href onto `base_dir`, leaving URLs and absolute paths alone
fn resolve_href(href: &str, base_dir: &Path) -> String {
    if href.contains("://") || Path::new(href).is_absolute() || base_dir.as_os_str().is_empty() {
        return href.to_string();
    }
    let joined: PathBuf = base_dir.join(href);
    joined.to_string_lossy().to_string()
}
