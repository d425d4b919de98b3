//! GeoTIFF georeferencing
//!
//! Reads the GeoKey directory and the model tags of an IFD and reduces
//! them to what a windowed reader needs: an EPSG code and an affine
//! pixel-to-world transform.

use log::{debug, warn};

use crate::io::seekable::SeekableReader;
use crate::tiff::constants::{geo_keys, tags};
use crate::tiff::errors::{TiffError, TiffResult};
use crate::tiff::ifd::IFD;
use crate::tiff::reader::TiffReader;

/// One entry of the GeoKey directory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeoKeyEntry {
    pub key_id: u16,
    pub tiff_tag_location: u16,
    pub count: u16,
    pub value_offset: u16,
}

/// Affine georeferencing of a raster plus its coordinate reference system
///
/// `geotransform` follows the GDAL convention:
/// `x = gt[0] + col * gt[1] + row * gt[2]`, `y = gt[3] + col * gt[4] + row * gt[5]`.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoReference {
    pub epsg: Option<u32>,
    pub geotransform: [f64; 6],
}

impl GeoReference {
    /// Reads georeferencing from an IFD
    ///
    /// ModelTransformation takes precedence; otherwise the first tiepoint is
    /// combined with ModelPixelScale.
    ///
    /// # Arguments
    /// * `tiff_reader` - Reader that already parsed the file structure
    /// * `reader` - The underlying seekable stream
    /// * `ifd` - The image directory to georeference
    ///
    /// # Returns
    /// The georeference, or `MissingGeoreference` if neither tag set is present
    pub fn read(tiff_reader: &TiffReader, reader: &mut dyn SeekableReader, ifd: &IFD) -> TiffResult<Self> {
        let geotransform = if ifd.has_tag(tags::MODEL_TRANSFORMATION_TAG) {
            let m = tiff_reader.read_tag_doubles(reader, ifd, tags::MODEL_TRANSFORMATION_TAG)?;
            if m.len() < 8 {
                return Err(TiffError::GenericError(format!(
                    "ModelTransformation has {} values, expected 16", m.len()
                )));
            }
            [m[3], m[0], m[1], m[7], m[4], m[5]]
        } else if ifd.has_tag(tags::MODEL_TIEPOINT_TAG) && ifd.has_tag(tags::MODEL_PIXEL_SCALE_TAG) {
            let tie = tiff_reader.read_tag_doubles(reader, ifd, tags::MODEL_TIEPOINT_TAG)?;
            let scale = tiff_reader.read_tag_doubles(reader, ifd, tags::MODEL_PIXEL_SCALE_TAG)?;
            if tie.len() < 6 || scale.len() < 2 {
                return Err(TiffError::MissingGeoreference);
            }
            let (i, j, x, y) = (tie[0], tie[1], tie[3], tie[4]);
            let (sx, sy) = (scale[0], scale[1]);
            [x - i * sx, sx, 0.0, y + j * sy, 0.0, -sy]
        } else {
            return Err(TiffError::MissingGeoreference);
        };

        let keys = read_geo_key_directory(tiff_reader, reader, ifd)?;
        let epsg = epsg_from_keys(&keys);
        debug!("Georeference: epsg={:?}, geotransform={:?}", epsg, geotransform);

        Ok(GeoReference { epsg, geotransform })
    }

    /// World coordinate of a (fractional) pixel position
    pub fn pixel_to_world(&self, col: f64, row: f64) -> (f64, f64) {
        let gt = &self.geotransform;
        (gt[0] + col * gt[1] + row * gt[2], gt[3] + col * gt[4] + row * gt[5])
    }

    /// Fractional pixel position of a world coordinate
    ///
    /// Returns `None` for a degenerate (non-invertible) transform.
    pub fn world_to_pixel(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        let gt = &self.geotransform;
        let det = gt[1] * gt[5] - gt[2] * gt[4];
        if det.abs() < 1e-12 {
            return None;
        }
        let dx = x - gt[0];
        let dy = y - gt[3];
        let col = (gt[5] * dx - gt[2] * dy) / det;
        let row = (gt[1] * dy - gt[4] * dx) / det;
        Some((col, row))
    }
}

/// Parses the GeoKey directory (header plus 4-short entries)
pub fn read_geo_key_directory(tiff_reader: &TiffReader, reader: &mut dyn SeekableReader, ifd: &IFD) -> TiffResult<Vec<GeoKeyEntry>> {
    if !ifd.has_tag(tags::GEO_KEY_DIRECTORY_TAG) {
        return Ok(Vec::new());
    }

    let values = tiff_reader.read_tag_values(reader, ifd, tags::GEO_KEY_DIRECTORY_TAG)?;
    if values.len() < 4 {
        return Err(TiffError::GenericError("Invalid GeoKey directory header".to_string()));
    }

    let num_keys = values[3] as usize;
    let available = (values.len() - 4) / 4;
    if num_keys > available {
        warn!("GeoKey directory declares {} keys but holds {}", num_keys, available);
    }

    Ok(values[4..]
        .chunks_exact(4)
        .take(num_keys.min(available))
        .map(|chunk| GeoKeyEntry {
            key_id: chunk[0] as u16,
            tiff_tag_location: chunk[1] as u16,
            count: chunk[2] as u16,
            value_offset: chunk[3] as u16,
        })
        .collect())
}

/// Picks the EPSG code from ProjectedCSType, falling back to GeographicType
fn epsg_from_keys(keys: &[GeoKeyEntry]) -> Option<u32> {
    let lookup = |key_id: u16| {
        keys.iter()
            .find(|k| k.key_id == key_id && k.tiff_tag_location == 0)
            .map(|k| k.value_offset)
            .filter(|code| *code != 0 && *code != geo_keys::USER_DEFINED)
            .map(u32::from)
    };
    lookup(geo_keys::PROJECTED_CS_TYPE).or_else(|| lookup(geo_keys::GEOGRAPHIC_TYPE))
}
