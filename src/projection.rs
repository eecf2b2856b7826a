//! Coordinate reference systems used by the earthmaps API.
//!
//! Boundaries are served in WGS84 (EPSG:4326). Centroids and areas are taken in
//! Alaska Albers Equal Area (EPSG:3338), which is implemented here directly on
//! the GRS80 ellipsoid following Snyder, "Map Projections: A Working Manual",
//! pp. 101-102. The NAD83/WGS84 datum difference is ignored.

use std::f64::consts::FRAC_PI_2;
use std::fmt;

use geo::{Coord, Geometry, MapCoords};

use crate::error::{Error, Result};

/// GRS80 semi-major axis (meters).
const GRS80_A: f64 = 6_378_137.0;
/// GRS80 inverse flattening.
const GRS80_RF: f64 = 298.257_222_101;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Crs {
    /// Geographic lon/lat degrees.
    Wgs84,
    /// NAD83 / Alaska Albers, meters.
    AlaskaAlbers,
}

impl Crs {
    pub fn from_epsg(code: u32) -> Result<Self> {
        match code {
            4326 => Ok(Crs::Wgs84),
            3338 => Ok(Crs::AlaskaAlbers),
            other => Err(Error::UnsupportedCrs(other)),
        }
    }

    pub fn epsg(&self) -> u32 {
        match self {
            Crs::Wgs84 => 4326,
            Crs::AlaskaAlbers => 3338,
        }
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.epsg())
    }
}

/// Albers Equal-Area Conic projection on an ellipsoid.
#[derive(Debug, Clone)]
pub struct AlbersEqualArea {
    /// Semi-major axis (meters)
    a: f64,
    /// First eccentricity
    e: f64,
    /// Central meridian in radians
    lon0: f64,
    /// Cone constant
    n: f64,
    c: f64,
    rho0: f64,
}

impl AlbersEqualArea {
    /// Build the projection; all angles in degrees.
    pub fn new(lat0_deg: f64, lon0_deg: f64, lat1_deg: f64, lat2_deg: f64, a: f64, rf: f64) -> Self {
        let f = 1.0 / rf;
        let e = (2.0 * f - f * f).sqrt();

        let lat0 = lat0_deg.to_radians();
        let lat1 = lat1_deg.to_radians();
        let lat2 = lat2_deg.to_radians();

        let m1 = m(e, lat1);
        let m2 = m(e, lat2);
        let q0 = q(e, lat0);
        let q1 = q(e, lat1);
        let q2 = q(e, lat2);

        let n = if (lat1 - lat2).abs() < 1e-10 {
            lat1.sin()
        } else {
            (m1 * m1 - m2 * m2) / (q2 - q1)
        };
        let c = m1 * m1 + n * q1;
        let rho0 = a * (c - n * q0).sqrt() / n;

        Self {
            a,
            e,
            lon0: lon0_deg.to_radians(),
            n,
            c,
            rho0,
        }
    }

    /// EPSG:3338: standard parallels 55N and 65N, origin 50N 154W.
    pub fn alaska() -> Self {
        Self::new(50.0, -154.0, 55.0, 65.0, GRS80_A, GRS80_RF)
    }

    /// Geographic (lon, lat) degrees to projected (x, y) meters.
    pub fn forward(&self, lon_deg: f64, lat_deg: f64) -> (f64, f64) {
        let lat = lat_deg.to_radians();
        let dlon = normalize_lon(lon_deg.to_radians() - self.lon0);

        let rho = self.a * (self.c - self.n * q(self.e, lat)).max(0.0).sqrt() / self.n;
        let theta = self.n * dlon;

        (rho * theta.sin(), self.rho0 - rho * theta.cos())
    }

    /// Projected (x, y) meters to geographic (lon, lat) degrees.
    pub fn inverse(&self, x: f64, y: f64) -> (f64, f64) {
        let dy = self.rho0 - y;
        let rho = x.hypot(dy);
        let theta = if self.n >= 0.0 {
            x.atan2(dy)
        } else {
            (-x).atan2(-dy)
        };

        let qv = (self.c - (rho * self.n / self.a).powi(2)) / self.n;
        let lat = self.latitude_from_q(qv);
        let lon = normalize_lon(self.lon0 + theta / self.n);

        (lon.to_degrees(), lat.to_degrees())
    }

    fn latitude_from_q(&self, qv: f64) -> f64 {
        let e = self.e;
        let e2 = e * e;
        // q at the poles; beyond it the iteration does not converge.
        let q_pole = 1.0 - (1.0 - e2) / (2.0 * e) * ((1.0 - e) / (1.0 + e)).ln();
        if (qv.abs() - q_pole).abs() < 1e-12 || qv.abs() > q_pole {
            return FRAC_PI_2.copysign(qv);
        }

        let mut phi = (qv / 2.0).clamp(-1.0, 1.0).asin();
        for _ in 0..25 {
            let sin = phi.sin();
            let es = e * sin;
            let one = 1.0 - es * es;
            let dphi = one * one / (2.0 * phi.cos())
                * (qv / (1.0 - e2) - sin / one + 1.0 / (2.0 * e) * ((1.0 - es) / (1.0 + es)).ln());
            phi += dphi;
            if dphi.abs() < 1e-12 {
                break;
            }
        }
        phi
    }
}

fn m(e: f64, phi: f64) -> f64 {
    let es = e * phi.sin();
    phi.cos() / (1.0 - es * es).sqrt()
}

fn q(e: f64, phi: f64) -> f64 {
    let sin = phi.sin();
    let es = e * sin;
    (1.0 - e * e) * (sin / (1.0 - es * es) - 1.0 / (2.0 * e) * ((1.0 - es) / (1.0 + es)).ln())
}

fn normalize_lon(mut lon: f64) -> f64 {
    use std::f64::consts::PI;
    while lon > PI {
        lon -= 2.0 * PI;
    }
    while lon < -PI {
        lon += 2.0 * PI;
    }
    lon
}

/// Reproject a geometry between the supported CRSs.
pub fn reproject(geometry: &Geometry<f64>, from: Crs, to: Crs) -> Geometry<f64> {
    match (from, to) {
        (Crs::Wgs84, Crs::AlaskaAlbers) => {
            let albers = AlbersEqualArea::alaska();
            geometry.map_coords(|c| {
                let (x, y) = albers.forward(c.x, c.y);
                Coord { x, y }
            })
        }
        (Crs::AlaskaAlbers, Crs::Wgs84) => {
            let albers = AlbersEqualArea::alaska();
            geometry.map_coords(|c| {
                let (x, y) = albers.inverse(c.x, c.y);
                Coord { x, y }
            })
        }
        _ => geometry.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{Point, point};

    #[test]
    fn origin_maps_to_zero() {
        let p = AlbersEqualArea::alaska();
        let (x, y) = p.forward(-154.0, 50.0);
        assert!(x.abs() < 1e-6 && y.abs() < 1e-6, "({x}, {y})");
    }

    #[test]
    fn central_meridian_is_vertical() {
        let p = AlbersEqualArea::alaska();
        let (x, y) = p.forward(-154.0, 61.0);
        assert!(x.abs() < 1e-6);
        // About 11 degrees of latitude north of the origin.
        assert!(y > 1_180_000.0 && y < 1_260_000.0, "{y}");
    }

    #[test]
    fn east_of_meridian_is_positive_x() {
        let p = AlbersEqualArea::alaska();
        let (x, _) = p.forward(-147.7, 64.8);
        assert!(x > 0.0);
        let (x, _) = p.forward(-165.4, 64.5);
        assert!(x < 0.0);
    }

    #[test]
    fn inverse_recovers_geographic_coordinates() {
        let p = AlbersEqualArea::alaska();
        for (lon, lat) in [(-149.9, 61.2), (-147.7, 64.8), (-134.4, 58.3), (176.6, 51.9), (-156.8, 71.3)] {
            let (x, y) = p.forward(lon, lat);
            let (lon2, lat2) = p.inverse(x, y);
            assert!((lon - lon2).abs() < 1e-8, "lon {lon} -> {lon2}");
            assert!((lat - lat2).abs() < 1e-8, "lat {lat} -> {lat2}");
        }
    }

    #[test]
    fn reprojects_geometries_both_ways() {
        let g: Geometry<f64> = point!(x: -149.9, y: 61.2).into();
        let projected = reproject(&g, Crs::Wgs84, Crs::AlaskaAlbers);
        let back = reproject(&projected, Crs::AlaskaAlbers, Crs::Wgs84);
        let Geometry::Point(p) = back else {
            panic!("expected a point");
        };
        assert!((p.x() - -149.9).abs() < 1e-8);
        assert!((p.y() - 61.2).abs() < 1e-8);
        assert_eq!(reproject(&g, Crs::Wgs84, Crs::Wgs84), Geometry::Point(Point::new(-149.9, 61.2)));
    }

    #[test]
    fn epsg_codes() {
        assert_eq!(Crs::from_epsg(3338).unwrap(), Crs::AlaskaAlbers);
        assert_eq!(Crs::Wgs84.to_string(), "EPSG:4326");
        assert!(matches!(Crs::from_epsg(32606), Err(Error::UnsupportedCrs(32606))));
    }
}
