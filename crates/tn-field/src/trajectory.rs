//! Append-only geographic trail of one player.

use geo::LineString;

use tn_core::{GeoPoint, TnError, TnResult};
use tn_spatial::LocalProjection;

/// How [`Trajectory::update`] decides that a sub-path continues exactly
/// where the trajectory ends.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BoundaryMatch {
    /// Coordinates must be equal.
    #[default]
    Exact,
    /// Both components may differ by up to this many degrees.
    Within(f64),
}

impl BoundaryMatch {
    pub fn matches(self, a: GeoPoint, b: GeoPoint) -> bool {
        match self {
            BoundaryMatch::Exact => a == b,
            BoundaryMatch::Within(eps_deg) => a.approx_eq(b, eps_deg),
        }
    }

    pub fn validate(self) -> TnResult<()> {
        match self {
            BoundaryMatch::Within(eps) if !(eps.is_finite() && eps >= 0.0) => Err(
                TnError::Config(format!("boundary tolerance must be a non-negative number, got {eps}")),
            ),
            _ => Ok(()),
        }
    }
}

/// Ordered geographic coordinates forming a single polyline, or nothing.
///
/// Coordinates are only ever appended, never reordered or removed.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Trajectory {
    coords:   Vec<GeoPoint>,
    boundary: BoundaryMatch,
}

impl Trajectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_boundary_match(boundary: BoundaryMatch) -> Self {
        Self { coords: Vec::new(), boundary }
    }

    pub fn from_coords(coords: Vec<GeoPoint>) -> Self {
        Self { coords, boundary: BoundaryMatch::Exact }
    }

    pub fn coords(&self) -> &[GeoPoint] {
        &self.coords
    }

    pub fn len(&self) -> usize {
        self.coords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }

    pub fn boundary_match(&self) -> BoundaryMatch {
        self.boundary
    }

    #[inline]
    pub fn start_point(&self) -> Option<GeoPoint> {
        self.coords.first().copied()
    }

    #[inline]
    pub fn last_known_point(&self) -> Option<GeoPoint> {
        self.coords.last().copied()
    }

    /// Merge `sub_path` onto the end of the trajectory.
    ///
    /// If the current last point matches the sub-path's first point the
    /// shared point is written once; otherwise the sub-path is appended as
    /// is.  An empty sub-path changes nothing.
    pub fn update(&mut self, sub_path: &[GeoPoint]) {
        let Some(&first) = sub_path.first() else {
            return;
        };
        let skip = match self.last_known_point() {
            Some(last) if self.boundary.matches(last, first) => 1,
            _ => 0,
        };
        self.coords.extend_from_slice(&sub_path[skip..]);
    }

    /// Haversine length in metres.
    pub fn length_m(&self) -> f64 {
        self.coords.windows(2).map(|w| w[0].distance_m(w[1])).sum()
    }

    /// The trajectory in `projection`'s planar CRS, for intersection tests.
    pub fn to_planar(&self, projection: &LocalProjection) -> LineString<f64> {
        projection.line_to_planar(&self.coords)
    }
}
