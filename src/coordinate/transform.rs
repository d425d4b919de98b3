//! Coordinate transformation from WGS 84 into raster coordinate systems
//!
//! UTM uses the Snyder (1987) transverse Mercator series on the WGS 84
//! ellipsoid, accurate to well under a metre inside a zone.

use super::bbox::BoundingBox;
use super::crs::CoordinateSystem;
use super::point::Point;
use std::f64::consts::PI;

/// WGS 84 semi-major axis in metres
const A: f64 = 6_378_137.0;
/// WGS 84 flattening
const F: f64 = 1.0 / 298.257_223_563;
const E2: f64 = 2.0 * F - F * F;
const E_PRIME2: f64 = E2 / (1.0 - E2);
/// UTM central scale factor
const K0: f64 = 0.9996;
const FALSE_EASTING: f64 = 500_000.0;
const FALSE_NORTHING_SOUTH: f64 = 10_000_000.0;
/// Web Mercator latitude limit
const MERCATOR_MAX_LAT: f64 = 85.05;

/// Points sampled along each edge when transforming bounds
pub const DENSIFY_POINTS: usize = 21;

/// Transformer for converting geographic coordinates into projected ones
pub struct CoordinateTransformer;

impl CoordinateTransformer {
    /// Convert from WGS84 (EPSG:4326) to Web Mercator (EPSG:3857)
    pub fn wgs84_to_web_mercator(lon: f64, lat: f64) -> Point {
        let lat = lat.clamp(-MERCATOR_MAX_LAT, MERCATOR_MAX_LAT);
        let x = lon * A * PI / 180.0;
        let y = f64::ln(f64::tan((90.0 + lat) * PI / 360.0)) * A;
        Point::new(x, y)
    }

    /// Convert WGS84 longitude/latitude in degrees to UTM easting/northing in metres
    pub fn wgs84_to_utm(lon: f64, lat: f64, zone: u8, north: bool) -> Point {
        let phi = lat.to_radians();
        let lambda = lon.to_radians();
        let lambda0 = ((zone as f64 - 1.0) * 6.0 - 180.0 + 3.0).to_radians();

        let sin_phi = phi.sin();
        let cos_phi = phi.cos();
        let tan_phi = phi.tan();

        let n = A / (1.0 - E2 * sin_phi * sin_phi).sqrt();
        let t = tan_phi * tan_phi;
        let c = E_PRIME2 * cos_phi * cos_phi;
        let a1 = cos_phi * (lambda - lambda0);
        let a2 = a1 * a1;
        let a4 = a2 * a2;

        let easting = K0 * n
            * (a1
                + (1.0 - t + c) * a2 * a1 / 6.0
                + (5.0 - 18.0 * t + t * t + 72.0 * c - 58.0 * E_PRIME2) * a4 * a1 / 120.0)
            + FALSE_EASTING;

        let northing = K0
            * (meridional_arc(phi)
                + n * tan_phi
                    * (a2 / 2.0
                        + (5.0 - t + 9.0 * c + 4.0 * c * c) * a4 / 24.0
                        + (61.0 - 58.0 * t + t * t + 600.0 * c - 330.0 * E_PRIME2) * a4 * a2 / 720.0));

        Point::new(easting, if north { northing } else { northing + FALSE_NORTHING_SOUTH })
    }

    /// Projects a WGS84 point into the target coordinate system
    pub fn from_wgs84(point: Point, target: &CoordinateSystem) -> Point {
        match target {
            CoordinateSystem::WGS84 => point,
            CoordinateSystem::WebMercator => Self::wgs84_to_web_mercator(point.x, point.y),
            CoordinateSystem::UTM { zone, north } => Self::wgs84_to_utm(point.x, point.y, *zone, *north),
        }
    }

    /// Transforms WGS84 bounds into the target system
    ///
    /// Each edge is densified with `DENSIFY_POINTS` points and the envelope
    /// of all projected points is returned, so curved edges are covered.
    pub fn transform_bounds(bbox: &BoundingBox, target: &CoordinateSystem) -> BoundingBox {
        if *target == CoordinateSystem::WGS84 {
            return *bbox;
        }

        let steps = DENSIFY_POINTS - 1;
        let mut points = Vec::with_capacity(DENSIFY_POINTS * 4);
        for i in 0..=steps {
            let f = i as f64 / steps as f64;
            let x = bbox.min_x + f * bbox.width();
            let y = bbox.min_y + f * bbox.height();
            points.push(Point::new(x, bbox.min_y));
            points.push(Point::new(x, bbox.max_y));
            points.push(Point::new(bbox.min_x, y));
            points.push(Point::new(bbox.max_x, y));
        }

        let projected = points.into_iter().map(|p| Self::from_wgs84(p, target));
        BoundingBox::envelope(projected).unwrap_or(*bbox)
    }
}

/// Meridional arc length from the equator to latitude `phi` (radians)
fn meridional_arc(phi: f64) -> f64 {
    let e4 = E2 * E2;
    let e6 = e4 * E2;

    A * ((1.0 - E2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0) * phi
        - (3.0 * E2 / 8.0 + 3.0 * e4 / 32.0 + 45.0 * e6 / 1024.0) * (2.0 * phi).sin()
        + (15.0 * e4 / 256.0 + 45.0 * e6 / 1024.0) * (4.0 * phi).sin()
        - (35.0 * e6 / 3072.0) * (6.0 * phi).sin())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: f64, b: f64, tol: f64, msg: &str) {
        let diff = (a - b).abs();
        assert!(diff < tol, "{msg}: expected {b}, got {a}, diff {diff} exceeds tolerance {tol}");
    }

    #[test]
    fn test_madrid_utm30n() {
        let p = CoordinateTransformer::wgs84_to_utm(-3.7037, 40.4168, 30, true);
        assert_close(p.x, 440_298.94, 1.0, "easting");
        assert_close(p.y, 4_474_257.31, 1.0, "northing");
    }

    #[test]
    fn test_buenos_aires_utm21s() {
        let p = CoordinateTransformer::wgs84_to_utm(-58.3816, -34.6037, 21, false);
        assert_close(p.x, 373_317.50, 1.0, "easting");
        assert_close(p.y, 6_170_036.17, 1.0, "northing");
    }

    #[test]
    fn test_web_mercator_origin_and_edge() {
        let origin = CoordinateTransformer::wgs84_to_web_mercator(0.0, 0.0);
        assert_close(origin.x, 0.0, 1e-6, "x");
        assert_close(origin.y, 0.0, 1e-6, "y");
        let edge = CoordinateTransformer::wgs84_to_web_mercator(180.0, 0.0);
        assert_close(edge.x, 20_037_508.34, 0.01, "x at antimeridian");
    }

    #[test]
    fn test_densified_bounds_cover_corners() {
        let bbox = BoundingBox::new(-3.75, 40.40, -3.70, 40.45);
        let utm = CoordinateSystem::UTM { zone: 30, north: true };
        let out = CoordinateTransformer::transform_bounds(&bbox, &utm);
        for (lon, lat) in [(-3.75, 40.40), (-3.75, 40.45), (-3.70, 40.40), (-3.70, 40.45)] {
            let p = CoordinateTransformer::wgs84_to_utm(lon, lat, 30, true);
            assert!(p.x >= out.min_x && p.x <= out.max_x);
            assert!(p.y >= out.min_y && p.y <= out.max_y);
        }
        // roughly 4.2 km by 5.6 km
        assert!(out.width() > 4_000.0 && out.width() < 4_500.0);
        assert!(out.height() > 5_400.0 && out.height() < 5_700.0);
    }

    #[test]
    fn test_wgs84_bounds_unchanged() {
        let bbox = BoundingBox::new(1.0, 2.0, 3.0, 4.0);
        assert_eq!(CoordinateTransformer::transform_bounds(&bbox, &CoordinateSystem::WGS84), bbox);
    }
}
