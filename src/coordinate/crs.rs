//! Coordinate Reference System handling

use crate::tiff::errors::{TiffError, TiffResult};

/// Coordinate systems a raster may be stored in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinateSystem {
    /// WGS 84 (EPSG:4326)
    WGS84,
    /// Web Mercator (EPSG:3857)
    WebMercator,
    /// UTM zone on WGS 84 (EPSG:326xx north, 327xx south)
    UTM { zone: u8, north: bool },
}

impl CoordinateSystem {
    /// Resolves an EPSG code
    ///
    /// # Returns
    /// The coordinate system, or an error for codes without a built-in projection
    pub fn from_epsg(epsg: u32) -> TiffResult<Self> {
        match epsg {
            4326 => Ok(CoordinateSystem::WGS84),
            3857 | 900913 => Ok(CoordinateSystem::WebMercator),
            32601..=32660 => Ok(CoordinateSystem::UTM { zone: (epsg - 32600) as u8, north: true }),
            32701..=32760 => Ok(CoordinateSystem::UTM { zone: (epsg - 32700) as u8, north: false }),
            _ => Err(TiffError::GenericError(format!("Unsupported coordinate system EPSG:{}", epsg))),
        }
    }

    /// Get the EPSG code for this coordinate system
    pub fn epsg_code(&self) -> u32 {
        match self {
            CoordinateSystem::WGS84 => 4326,
            CoordinateSystem::WebMercator => 3857,
            CoordinateSystem::UTM { zone, north: true } => 32600 + *zone as u32,
            CoordinateSystem::UTM { zone, north: false } => 32700 + *zone as u32,
        }
    }

    /// Get a description of this coordinate system
    pub fn description(&self) -> String {
        match self {
            CoordinateSystem::WGS84 => "WGS 84 (EPSG:4326)".to_string(),
            CoordinateSystem::WebMercator => "Web Mercator (EPSG:3857)".to_string(),
            CoordinateSystem::UTM { zone, north } => {
                format!("UTM Zone {}{} (EPSG:{})", zone, if *north { "N" } else { "S" }, self.epsg_code())
            },
        }
    }
}
