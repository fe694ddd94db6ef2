//! Geographic ⇄ planar reprojection.

use geo::{Coord, LineString};

use tn_core::GeoPoint;

const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Equirectangular projection tangent at `origin`.
///
/// Planar coordinates are metres east (`x`) and north (`y`) of the origin.
/// Distortion stays below 0.1 % within a few kilometres of the origin, which
/// covers a walkable playing field.  The inverse is exact up to floating
/// point, so a geographic point survives a round trip bit-for-bit in most
/// cases and within nanometres otherwise.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LocalProjection {
    origin:  GeoPoint,
    cos_lat: f64,
}

impl LocalProjection {
    pub fn new(origin: GeoPoint) -> Self {
        Self { origin, cos_lat: origin.lat.to_radians().cos() }
    }

    pub fn origin(&self) -> GeoPoint {
        self.origin
    }

    pub fn to_planar(&self, p: GeoPoint) -> Coord<f64> {
        Coord {
            x: EARTH_RADIUS_M * (p.lon - self.origin.lon).to_radians() * self.cos_lat,
            y: EARTH_RADIUS_M * (p.lat - self.origin.lat).to_radians(),
        }
    }

    pub fn to_geo(&self, c: Coord<f64>) -> GeoPoint {
        GeoPoint {
            lat: self.origin.lat + (c.y / EARTH_RADIUS_M).to_degrees(),
            lon: self.origin.lon + (c.x / (EARTH_RADIUS_M * self.cos_lat)).to_degrees(),
        }
    }

    pub fn line_to_geo(&self, line: &LineString<f64>) -> Vec<GeoPoint> {
        line.coords().map(|c| self.to_geo(*c)).collect()
    }

    pub fn line_to_planar(&self, points: &[GeoPoint]) -> LineString<f64> {
        LineString::new(points.iter().map(|p| self.to_planar(*p)).collect())
    }
}

impl Default for LocalProjection {
    fn default() -> Self {
        Self::new(GeoPoint::new(0.0, 0.0))
    }
}
