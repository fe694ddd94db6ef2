//! Snapping arbitrary points onto the network.

use geo::Coord;

use tn_core::{EdgeId, GeoPoint};

use crate::{linework, EdgeEnds, SpatialError, SpatialResult, StreetNetwork};

/// A point projected onto the linework of its nearest edge.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Snap {
    /// Planar position, guaranteed to lie on the edge's linework.
    pub point: Coord<f64>,
    pub edge: EdgeId,
    pub ends: EdgeEnds,
    /// Arc-length offset of `point` along [`StreetNetwork::edge_line`].
    pub offset_m: f64,
}

impl Snap {
    /// `true` if both snaps sit on edges joining the same ordered node pair.
    #[inline]
    pub fn same_pair(&self, other: &Snap) -> bool {
        self.ends.same_pair(&other.ends)
    }
}

/// Project a planar `point` onto the nearest edge.
///
/// The returned point is recomputed from the arc offset of the orthogonal
/// projection, so it lies on the edge linework rather than at the raw input.
///
/// # Errors
///
/// [`SpatialError::NoNearestEdge`] if the network has no edges.
pub fn snap(network: &StreetNetwork, point: Coord<f64>) -> SpatialResult<Snap> {
    let edge = network.nearest_edge(point).ok_or(SpatialError::NoNearestEdge)?;
    let line = network.edge_line(edge);
    let offset_m = linework::locate(&line, point);
    Ok(Snap {
        point: linework::point_at(&line, offset_m),
        edge,
        ends: network.ends(edge),
        offset_m,
    })
}

/// Project a geographic point to the network CRS, then [`snap`] it.
pub fn snap_geo(network: &StreetNetwork, point: GeoPoint) -> SpatialResult<Snap> {
    snap(network, network.to_planar(point))
}
