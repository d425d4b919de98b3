//! STAC ItemCollection models
//!
//! Only the fields scene selection needs are modelled; everything else in
//! `properties` is kept in `extra` so equality filters can reach it.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::coordinate::BoundingBox;

/// A GeoJSON FeatureCollection of STAC items
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StacItemCollection {
    #[serde(rename = "type", default = "feature_collection")]
    pub type_: String,
    #[serde(default)]
    pub features: Vec<StacItem>,
}

fn feature_collection() -> String {
    "FeatureCollection".to_string()
}

fn feature() -> String {
    "Feature".to_string()
}

/// One scene record
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StacItem {
    #[serde(rename = "type", default = "feature")]
    pub type_: String,
    pub id: String,
    /// `[west, south, east, north]`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bbox: Option<Vec<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collection: Option<String>,
    pub properties: StacItemProperties,
    #[serde(default)]
    pub assets: HashMap<String, StacAsset>,
}

impl StacItem {
    pub fn asset(&self, key: &str) -> Option<&StacAsset> {
        self.assets.get(key)
    }

    /// Footprint of the item, when it declares a usable bbox
    pub fn bounds(&self) -> Option<BoundingBox> {
        match self.bbox.as_deref() {
            Some([west, south, east, north]) => Some(BoundingBox::new(*west, *south, *east, *north)),
            // 3-D bboxes carry min/max elevation after each corner
            Some([west, south, _, east, north, _]) => Some(BoundingBox::new(*west, *south, *east, *north)),
            _ => None,
        }
    }

    /// A property as a string, looking at modelled fields first
    pub fn property_str(&self, key: &str) -> Option<String> {
        match key {
            "datetime" => self.properties.datetime.clone(),
            "platform" => self.properties.platform.clone(),
            _ => self.properties.extra.get(key).map(|value| match value {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            }),
        }
    }
}

/// Item properties
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct StacItemProperties {
    /// RFC 3339 capture time
    #[serde(skip_serializing_if = "Option::is_none")]
    pub datetime: Option<String>,
    /// Scene-level cloud cover percentage
    #[serde(rename = "eo:cloud_cover", skip_serializing_if = "Option::is_none")]
    pub eo_cloud_cover: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

/// A downloadable band or file
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StacAsset {
    pub href: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roles: Option<Vec<String>>,
}
