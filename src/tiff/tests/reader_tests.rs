//! Tests for TIFF structure parsing and georeferencing

use std::io::Cursor;

use super::test_utils::GeoTiffFixture;
use crate::tiff::constants::{compression, tags};
use crate::tiff::errors::TiffError;
use crate::tiff::geo_keys::GeoReference;
use crate::tiff::reader::TiffReader;

#[test]
fn test_classic_little_endian_strips() {
    let fixture = GeoTiffFixture::indexed(12, 10).strips(4);
    let mut cursor = fixture.to_cursor();

    let mut reader = TiffReader::new();
    let tiff = reader.read(&mut cursor).unwrap();
    assert!(!reader.is_big_tiff());
    assert_eq!(tiff.ifd_count(), 1);

    let ifd = tiff.main_ifd().unwrap();
    assert_eq!(ifd.get_dimensions(), Some((12, 10)));
    assert!(!ifd.is_tiled());
    assert_eq!(ifd.get_tag_value(tags::BITS_PER_SAMPLE), Some(16));
    assert_eq!(ifd.get_tag_value(tags::COMPRESSION), Some(compression::NONE as u64));

    // Three strips of 4, 4 and 2 rows
    let counts = reader.read_tag_values(&mut cursor, ifd, tags::STRIP_BYTE_COUNTS).unwrap();
    assert_eq!(counts, vec![96, 96, 48]);
}

#[test]
fn test_big_tiff_big_endian_tiles() {
    let fixture = GeoTiffFixture::indexed(40, 24).tiled(16, 16).big_endian().big_tiff();
    let mut cursor = fixture.to_cursor();

    let mut reader = TiffReader::new();
    let tiff = reader.read(&mut cursor).unwrap();
    assert!(reader.is_big_tiff());
    assert!(tiff.is_big_tiff);

    let ifd = tiff.main_ifd().unwrap();
    assert!(ifd.is_tiled());
    assert_eq!(ifd.get_tag_value(tags::TILE_WIDTH), Some(16));

    let offsets = reader.read_tag_values(&mut cursor, ifd, tags::TILE_OFFSETS).unwrap();
    assert_eq!(offsets.len(), 6);
    assert_eq!(offsets[0], 16);
    let counts = reader.read_tag_values(&mut cursor, ifd, tags::TILE_BYTE_COUNTS).unwrap();
    assert!(counts.iter().all(|count| *count == 16 * 16 * 2));
}

#[test]
fn test_georeference_from_tiepoint_and_scale() {
    let fixture = GeoTiffFixture::indexed(8, 8).georeferenced(32612, 500000.0, 4_920_000.0, 30.0);
    let mut cursor = fixture.to_cursor();

    let mut reader = TiffReader::new();
    let tiff = reader.read(&mut cursor).unwrap();
    let geo = GeoReference::read(&reader, &mut cursor, tiff.main_ifd().unwrap()).unwrap();

    assert_eq!(geo.epsg, Some(32612));
    assert_eq!(geo.geotransform, [500000.0, 30.0, 0.0, 4_920_000.0, 0.0, -30.0]);
    assert_eq!(geo.pixel_to_world(2.0, 1.0), (500060.0, 4_919_970.0));
    assert_eq!(geo.world_to_pixel(500060.0, 4_919_970.0), Some((2.0, 1.0)));
}

#[test]
fn test_geographic_epsg_key() {
    let fixture = GeoTiffFixture::indexed(4, 4).big_endian().georeferenced(4326, -111.0, 45.0, 0.25);
    let mut cursor = fixture.to_cursor();

    let mut reader = TiffReader::new();
    let tiff = reader.read(&mut cursor).unwrap();
    let geo = GeoReference::read(&reader, &mut cursor, tiff.main_ifd().unwrap()).unwrap();
    assert_eq!(geo.epsg, Some(4326));
    assert_eq!(geo.geotransform[0], -111.0);
}

#[test]
fn test_missing_georeference() {
    let mut cursor = GeoTiffFixture::indexed(4, 4).to_cursor();
    let mut reader = TiffReader::new();
    let tiff = reader.read(&mut cursor).unwrap();
    let result = GeoReference::read(&reader, &mut cursor, tiff.main_ifd().unwrap());
    assert!(matches!(result, Err(TiffError::MissingGeoreference)));
}

#[test]
fn test_invalid_headers() {
    let mut reader = TiffReader::new();

    let mut wrong_version = Cursor::new(vec![b'I', b'I', 41, 0, 8, 0, 0, 0]);
    assert!(matches!(reader.read(&mut wrong_version), Err(TiffError::UnsupportedVersion(41))));

    let mut bad_big_tiff = Cursor::new(vec![b'I', b'I', 43, 0, 4, 0, 0, 0, 16, 0, 0, 0, 0, 0, 0, 0]);
    assert!(matches!(reader.read(&mut bad_big_tiff), Err(TiffError::InvalidBigTIFFHeader)));

    let mut dangling = Cursor::new(vec![b'I', b'I', 42, 0, 0, 1, 0, 0]);
    assert!(matches!(reader.read(&mut dangling), Err(TiffError::GenericError(_))));
}
