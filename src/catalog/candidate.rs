//! Validated scene records
//!
//! Catalog items are loosely structured. A `SceneCandidate` is built only
//! from items with a parseable capture time and a thermal asset.

use chrono::{DateTime, Utc};

use crate::errors::{PipelineError, PipelineResult};
use super::stac::StacItem;

/// A scene that can be checked and processed
#[derive(Debug, Clone, PartialEq)]
pub struct SceneCandidate {
    pub id: String,
    pub datetime: DateTime<Utc>,
    /// Scene-level cloud cover, when the catalog reports it
    pub cloud_cover: Option<f64>,
    pub platform: String,
    /// Asset key the thermal band was found under
    pub thermal_key: String,
    pub thermal_href: String,
    pub quality_href: Option<String>,
}

impl SceneCandidate {
    /// Validates a catalog item
    ///
    /// # Arguments
    /// * `item` - The raw catalog record
    /// * `thermal_aliases` - Accepted thermal asset keys in priority order
    /// * `quality_key` - Asset key of the quality bitmask
    ///
    /// # Returns
    /// The candidate, or a `Catalog` error naming the missing field
    pub fn from_item(item: &StacItem, thermal_aliases: &[String], quality_key: &str) -> PipelineResult<Self> {
        let raw_datetime = item.properties.datetime.as_deref()
            .ok_or_else(|| PipelineError::Catalog(format!("{}: missing datetime", item.id)))?;
        let datetime = parse_datetime(raw_datetime)
            .ok_or_else(|| PipelineError::Catalog(format!("{}: invalid datetime '{}'", item.id, raw_datetime)))?;

        let (thermal_key, thermal) = thermal_aliases.iter()
            .find_map(|key| item.asset(key).map(|asset| (key.clone(), asset)))
            .ok_or_else(|| PipelineError::Catalog(format!("{}: no thermal band", item.id)))?;

        Ok(SceneCandidate {
            id: item.id.clone(),
            datetime,
            cloud_cover: item.properties.eo_cloud_cover,
            platform: item.properties.platform.clone().unwrap_or_else(|| "unknown".to_string()),
            thermal_key,
            thermal_href: thermal.href.clone(),
            quality_href: item.asset(quality_key).map(|asset| asset.href.clone()),
        })
    }

    /// Capture date as `YYYY-MM-DD`
    pub fn date_label(&self) -> String {
        self.datetime.format("%Y-%m-%d").to_string()
    }

    /// Scene cloud cover for display, `?` when unknown
    pub fn cloud_label(&self) -> String {
        self.cloud_cover.map_or("?".to_string(), |cc| format!("{:.0}", cc))
    }
}

/// Parses an RFC 3339 timestamp into UTC
pub fn parse_datetime(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value).ok().map(|dt| dt.with_timezone(&Utc))
}
