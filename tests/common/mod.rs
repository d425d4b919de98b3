//! Shared fixtures for integration tests

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use byteorder::{LittleEndian, WriteBytesExt};
use serde_json::{json, Value};

/// Pixel size of every fixture raster, exact in binary
pub const PIXEL_DEG: f64 = 1.0 / 256.0;

/// Writes a single-strip, uncompressed, little-endian u16 GeoTIFF in EPSG:4326
///
/// `west`/`north` give the upper-left corner; pixels are `PIXEL_DEG` square.
pub fn write_geotiff<F: Fn(u32, u32) -> u16>(path: &Path, width: u32, height: u32, west: f64, north: f64, value: F) {
    let mut out: Vec<u8> = Vec::new();
    out.extend_from_slice(b"II");
    out.write_u16::<LittleEndian>(42).unwrap();
    out.write_u32::<LittleEndian>(0).unwrap();

    let strip_offset = out.len() as u32;
    for row in 0..height {
        for col in 0..width {
            out.write_u16::<LittleEndian>(value(row, col)).unwrap();
        }
    }
    let strip_bytes = width * height * 2;

    let scale_offset = out.len() as u32;
    for v in [PIXEL_DEG, PIXEL_DEG, 0.0] {
        out.write_f64::<LittleEndian>(v).unwrap();
    }
    let tiepoint_offset = out.len() as u32;
    for v in [0.0, 0.0, 0.0, west, north, 0.0] {
        out.write_f64::<LittleEndian>(v).unwrap();
    }
    let geokeys_offset = out.len() as u32;
    for v in [1u16, 1, 0, 2, 1024, 0, 1, 2, 2048, 0, 1, 4326] {
        out.write_u16::<LittleEndian>(v).unwrap();
    }

    // (tag, type, count, value or offset); SHORT values sit in the low bytes
    let entries: [(u16, u16, u32, u32); 12] = [
        (256, 4, 1, width),
        (257, 4, 1, height),
        (258, 3, 1, 16),
        (259, 3, 1, 1),
        (262, 3, 1, 1),
        (273, 4, 1, strip_offset),
        (277, 3, 1, 1),
        (278, 4, 1, height),
        (279, 4, 1, strip_bytes),
        (33550, 12, 3, scale_offset),
        (33922, 12, 6, tiepoint_offset),
        (34735, 3, 12, geokeys_offset),
    ];

    let ifd_offset = out.len() as u32;
    out.write_u16::<LittleEndian>(entries.len() as u16).unwrap();
    for (tag, field_type, count, value) in entries {
        out.write_u16::<LittleEndian>(tag).unwrap();
        out.write_u16::<LittleEndian>(field_type).unwrap();
        out.write_u32::<LittleEndian>(count).unwrap();
        out.write_u32::<LittleEndian>(value).unwrap();
    }
    out.write_u32::<LittleEndian>(0).unwrap();
    out[4..8].copy_from_slice(&ifd_offset.to_le_bytes());

    fs::write(path, out).unwrap();
}

/// A catalog feature with relative asset hrefs
pub fn feature(id: &str, collection: &str, datetime: &str, properties: Value, assets: &[(&str, &str)]) -> Value {
    let mut props = json!({ "datetime": datetime });
    if let (Some(target), Some(extra)) = (props.as_object_mut(), properties.as_object()) {
        for (key, value) in extra {
            target.insert(key.clone(), value.clone());
        }
    }
    let assets: serde_json::Map<String, Value> = assets.iter()
        .map(|(key, href)| (key.to_string(), json!({ "href": href, "type": "image/tiff" })))
        .collect();

    json!({
        "type": "Feature",
        "id": id,
        "collection": collection,
        "bbox": [9.5, 44.5, 10.5, 45.5],
        "properties": props,
        "assets": assets,
    })
}

/// Writes an ItemCollection document and returns its path
pub fn write_catalog(dir: &Path, features: Vec<Value>) -> PathBuf {
    let path = dir.join("catalog.json");
    let doc = json!({ "type": "FeatureCollection", "features": features });
    fs::write(&path, serde_json::to_string_pretty(&doc).unwrap()).unwrap();
    path
}
