//! Tests for windowed sample decoding

use tempfile::tempdir;

use super::test_utils::GeoTiffFixture;
use crate::coordinate::BoundingBox;
use crate::extractor::{PixelWindow, WindowReader};
use crate::raster::{read_bounds, RasterSource, GeoTiffSource};
use crate::retry::CancelToken;
use crate::tiff::constants::compression;
use crate::tiff::errors::TiffError;
use crate::tiff::reader::TiffReader;

/// Reads a window from an in-memory fixture and checks every sample
fn assert_window(fixture: &GeoTiffFixture, window: PixelWindow) {
    let mut cursor = fixture.to_cursor();
    let mut reader = TiffReader::new();
    let tiff = reader.read(&mut cursor).unwrap();
    let ifd = tiff.main_ifd().unwrap();

    let grid = WindowReader::new(&reader, ifd)
        .read(&mut cursor, window, &mut || true)
        .unwrap();

    assert_eq!(grid.shape(), window.shape());
    for row in 0..window.height {
        for col in 0..window.width {
            let expected = fixture.value((window.row_off + row) as u32, (window.col_off + col) as u32);
            assert_eq!(grid[(row, col)], expected as f64, "sample at ({}, {})", row, col);
        }
    }
}

#[test]
fn test_window_across_strips() {
    let fixture = GeoTiffFixture::indexed(20, 15).strips(4);
    assert_window(&fixture, PixelWindow::new(3, 2, 10, 9));
}

#[test]
fn test_deflate_predictor_tiles() {
    let fixture = GeoTiffFixture::from_fn(50, 40, |row, col| 27000 + (row * 37 + col * 11) as u16 % 900)
        .tiled(16, 16)
        .compressed(compression::DEFLATE, true);
    // Crosses tile boundaries in both directions and touches the padded edge
    assert_window(&fixture, PixelWindow::new(10, 12, 40, 28));
}

#[test]
fn test_zstd_big_endian_big_tiff() {
    let fixture = GeoTiffFixture::indexed(33, 17)
        .tiled(16, 16)
        .compressed(compression::ZSTD, false)
        .big_endian()
        .big_tiff();
    assert_window(&fixture, PixelWindow::new(0, 0, 33, 17));
}

#[test]
fn test_predictor_wraps_around() {
    let fixture = GeoTiffFixture::from_fn(6, 2, |_, col| if col % 2 == 0 { 65000 } else { 3 })
        .compressed(compression::DEFLATE_LEGACY, true);
    assert_window(&fixture, PixelWindow::new(0, 0, 6, 2));
}

#[test]
fn test_window_outside_image_is_rejected() {
    let fixture = GeoTiffFixture::indexed(10, 10);
    let mut cursor = fixture.to_cursor();
    let mut reader = TiffReader::new();
    let tiff = reader.read(&mut cursor).unwrap();

    let result = WindowReader::new(&reader, tiff.main_ifd().unwrap())
        .read(&mut cursor, PixelWindow::new(5, 5, 6, 2), &mut || true);
    assert!(matches!(result, Err(TiffError::GenericError(_))));
}

#[test]
fn test_read_stops_when_asked() {
    let fixture = GeoTiffFixture::indexed(32, 32).tiled(16, 16);
    let mut cursor = fixture.to_cursor();
    let mut reader = TiffReader::new();
    let tiff = reader.read(&mut cursor).unwrap();

    let mut blocks_allowed = 2;
    let mut keep_going = || {
        blocks_allowed -= 1;
        blocks_allowed >= 0
    };
    let result = WindowReader::new(&reader, tiff.main_ifd().unwrap())
        .read(&mut cursor, PixelWindow::new(0, 0, 32, 32), &mut keep_going);
    assert!(matches!(result, Err(TiffError::Interrupted)));
}

#[test]
fn test_geotiff_source_reads_bounds() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("b10.tif");
    GeoTiffFixture::indexed(40, 40)
        .tiled(16, 16)
        .compressed(compression::DEFLATE, true)
        .georeferenced(4326, 10.0, 50.0, 0.25)
        .write_to(&path);

    let source = GeoTiffSource::new();
    let mut dataset = source.open(&format!("file://{}", path.display())).unwrap();
    assert_eq!(dataset.profile().width, 40);
    assert_eq!(dataset.profile().epsg, Some(4326));

    // Columns 8..16 and rows 12..20
    let bounds = BoundingBox::new(12.0, 45.0, 14.0, 47.0);
    let grid = read_bounds(dataset.as_mut(), &bounds, None, &CancelToken::new()).unwrap();
    assert_eq!(grid.shape(), (8, 8));
    assert_eq!(grid[(0, 0)], 1208.0);
    assert_eq!(grid[(7, 7)], 1915.0);

    let upscaled = read_bounds(dataset.as_mut(), &bounds, Some((16, 16)), &CancelToken::new()).unwrap();
    assert_eq!(upscaled.shape(), (16, 16));
    assert_eq!(upscaled[(15, 15)], 1915.0);
}

#[test]
fn test_cancelled_dataset_read() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("qa.tif");
    GeoTiffFixture::indexed(20, 20).georeferenced(4326, 0.0, 20.0, 1.0).write_to(&path);

    let mut dataset = GeoTiffSource::new().open(path.to_str().unwrap()).unwrap();
    let cancel = CancelToken::new();
    cancel.cancel();
    let result = read_bounds(dataset.as_mut(), &BoundingBox::new(2.0, 2.0, 8.0, 8.0), None, &cancel);
    assert!(matches!(result, Err(crate::errors::PipelineError::Cancelled)));
}
