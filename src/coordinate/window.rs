//! Geographic windows around a point of interest
//!
//! `area_bbox` turns a kilometre half-width into a latitude-corrected
//! degree box; `pixel_window` maps native-CRS bounds onto a raster grid.

use super::bbox::BoundingBox;
use crate::extractor::PixelWindow;
use crate::tiff::geo_keys::GeoReference;

/// Kilometres per degree of latitude used for box sizing
pub const KM_PER_DEGREE: f64 = 111.0;

/// Square box of `size_km` half-width around a point
///
/// The longitude span is divided by `cos(lat)` so the box has the same
/// ground width at every latitude. At `lat = ±90` the cosine is zero and the
/// longitude span is infinite or NaN; callers are expected to reject polar
/// latitudes before calling.
///
/// # Arguments
/// * `lat` - Latitude in degrees
/// * `lon` - Longitude in degrees
/// * `size_km` - Half-width of the box in kilometres
///
/// # Returns
/// The box as west, south, east, north
pub fn area_bbox(lat: f64, lon: f64, size_km: f64) -> BoundingBox {
    let lat_deg = size_km / KM_PER_DEGREE;
    let lon_deg = size_km / (KM_PER_DEGREE * lat.to_radians().cos());
    BoundingBox::new(lon - lon_deg, lat - lat_deg, lon + lon_deg, lat + lat_deg)
}

/// Pixel window covering native-CRS bounds on a georeferenced raster
///
/// All four corners are mapped through the inverse geotransform so that
/// north-up, south-up and rotated grids are all handled. The window is
/// clipped to the raster; `None` means no overlap.
pub fn pixel_window(bounds: &BoundingBox, geo: &GeoReference, width: usize, height: usize) -> Option<PixelWindow> {
    let corners = [
        (bounds.min_x, bounds.min_y),
        (bounds.min_x, bounds.max_y),
        (bounds.max_x, bounds.min_y),
        (bounds.max_x, bounds.max_y),
    ];

    let mut col_min = f64::INFINITY;
    let mut col_max = f64::NEG_INFINITY;
    let mut row_min = f64::INFINITY;
    let mut row_max = f64::NEG_INFINITY;
    for (x, y) in corners {
        let (col, row) = geo.world_to_pixel(x, y)?;
        col_min = col_min.min(col);
        col_max = col_max.max(col);
        row_min = row_min.min(row);
        row_max = row_max.max(row);
    }

    PixelWindow::from_fractional(col_min, row_min, col_max, row_max, width, height)
}
