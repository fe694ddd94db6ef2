//! Connecting two snapped points with one continuous on-network polyline.
//!
//! Two cases:
//!
//! - **Within an edge**: both points lie on the same street; the result is
//!   the piece of that street's linework between them.
//! - **Across nodes**: the points lie on different streets.  Streets that
//!   meet are joined at their shared node; otherwise a shortest path links
//!   the two streets and the result follows it.
//!
//! In both cases the first coordinate is exactly the start snap point and the
//! last is exactly the end snap point, and no two consecutive coordinates are
//! duplicates.

use geo::{Coord, LineString};

use tn_core::{EdgeId, NodeId};

use crate::linework::{self, COORD_EPS_M};
use crate::{EdgeEnds, Router, Snap, SpatialResult, StreetNetwork};

/// Polyline from `from` to `to` along the network, choosing the within-edge
/// or across-nodes strategy.
///
/// # Errors
///
/// [`SpatialError::NoRoute`][crate::SpatialError::NoRoute] if the two
/// streets are not connected.
pub fn stitch<R: Router>(
    network: &StreetNetwork,
    router:  &R,
    from:    &Snap,
    to:      &Snap,
) -> SpatialResult<LineString<f64>> {
    if from.ends.same_street(&to.ends) {
        Ok(stitch_within_edge(network, from, to))
    } else {
        stitch_across_nodes(network, router, from, to)
    }
}

/// Piece of `to`'s edge linework between the two snap points, walked in
/// whichever direction leads from `from` to `to`.
///
/// `from` is re-located on `to`'s linework when it sits on the opposite
/// direction (or a parallel edge) with the same geometry.  A parallel edge
/// with its own geometry is followed to the shared node nearer along both
/// lines, and the walk continues on `to`'s edge from there.
pub fn stitch_within_edge(network: &StreetNetwork, from: &Snap, to: &Snap) -> LineString<f64> {
    let line = network.edge_line(to.edge);
    let mut coords = vec![from.point];

    if from.edge == to.edge {
        linework::extend_distinct(&mut coords, linework::substring(&line, from.offset_m, to.offset_m));
    } else if same_linework(network, from.edge, to.edge) {
        let start = linework::locate(&line, from.point);
        linework::extend_distinct(&mut coords, linework::substring(&line, start, to.offset_m));
    } else {
        let detour = |n: NodeId| {
            (network.node_offset(from.edge, n) - from.offset_m).abs()
                + (to.offset_m - network.node_offset(to.edge, n)).abs()
        };
        let via = if detour(to.ends.to) < detour(to.ends.from) { to.ends.to } else { to.ends.from };
        via_node(network, &mut coords, from, to, via);
    }

    close_at(&mut coords, to.point);
    LineString::new(coords)
}

/// Polyline between snap points on two different streets.
///
/// Streets that share a node are joined there without a search.  Otherwise
/// the search runs between the *far* endpoints: the end of `from`'s edge
/// farther from `to`, and the end of `to`'s edge farther from `from`.  A
/// shortest path between them normally runs along both partial edges, so the
/// walker leaves its own street at the near end instead of backtracking.
/// When the path does not start (or finish) along the partial edge, the
/// walker covers its own street up to the far node first (or from it last).
pub fn stitch_across_nodes<R: Router>(
    network: &StreetNetwork,
    router:  &R,
    from:    &Snap,
    to:      &Snap,
) -> SpatialResult<LineString<f64>> {
    // Adjacent streets meet at a node; no search needed.
    if let Some(joint) = [from.ends.from, from.ends.to].into_iter().find(|&n| to.ends.touches(n)) {
        let mut coords = vec![from.point];
        via_node(network, &mut coords, from, to, joint);
        close_at(&mut coords, to.point);
        return Ok(LineString::new(coords));
    }

    let start_node = far_endpoint(network, &from.ends, to.point);
    let end_node   = far_endpoint(network, &to.ends, from.point);

    let route = router.route(network, start_node, end_node)?;
    let nodes = route.nodes(network);
    let edges = &route.edges;

    let mut coords = vec![from.point];

    // Leave the start street where the route does.
    let head_on_start = edges.first().is_some_and(|&e| runs_along(network, e, &from.ends));
    let first = usize::from(head_on_start);
    let exit_node = nodes[first];
    let start_line = network.edge_line(from.edge);
    linework::extend_distinct(
        &mut coords,
        linework::substring(&start_line, from.offset_m, network.node_offset(from.edge, exit_node)),
    );

    // Enter the end street where the route does.
    let tail_on_end = edges.len() > first
        && edges.last().is_some_and(|&e| runs_along(network, e, &to.ends));
    let last = if tail_on_end { edges.len() - 1 } else { edges.len() };

    for (i, &edge) in edges[first..last].iter().enumerate() {
        let line = network.oriented_line(edge, nodes[first + i]);
        linework::extend_distinct(&mut coords, line.0.iter().copied());
    }

    let entry_node = nodes[last];
    let end_line = network.edge_line(to.edge);
    linework::extend_distinct(
        &mut coords,
        linework::substring(&end_line, network.node_offset(to.edge, entry_node), to.offset_m),
    );
    close_at(&mut coords, to.point);

    Ok(LineString::new(coords))
}

/// Append `from`'s edge up to `node`, then `to`'s edge from `node` on.
fn via_node(
    network: &StreetNetwork,
    coords:  &mut Vec<Coord<f64>>,
    from:    &Snap,
    to:      &Snap,
    node:    NodeId,
) {
    let start_line = network.edge_line(from.edge);
    linework::extend_distinct(
        coords,
        linework::substring(&start_line, from.offset_m, network.node_offset(from.edge, node)),
    );
    let end_line = network.edge_line(to.edge);
    linework::extend_distinct(
        coords,
        linework::substring(&end_line, network.node_offset(to.edge, node), to.offset_m),
    );
}

/// `true` if edge `a`, read from `b`'s start node, has the same coordinates
/// as edge `b`.
fn same_linework(network: &StreetNetwork, a: EdgeId, b: EdgeId) -> bool {
    let target = network.edge_line(b);
    let candidate = network.oriented_line(a, network.ends(b).from);
    candidate.0.len() == target.0.len()
        && candidate
            .0
            .iter()
            .zip(target.0.iter())
            .all(|(p, q)| linework::distance(*p, *q) <= COORD_EPS_M)
}

/// The endpoint of `ends` farther (planar) from `other`.
fn far_endpoint(network: &StreetNetwork, ends: &EdgeEnds, other: Coord<f64>) -> NodeId {
    let d_from = linework::distance(network.node_coord(ends.from), other);
    let d_to   = linework::distance(network.node_coord(ends.to), other);
    if d_to > d_from { ends.to } else { ends.from }
}

#[inline]
fn runs_along(network: &StreetNetwork, edge: EdgeId, street: &EdgeEnds) -> bool {
    network.ends(edge).same_street(street)
}

/// Make `end` the exact last coordinate, replacing a near-duplicate tail.
///
/// A lone start coordinate is kept as is so the line still begins exactly at
/// its start point.
fn close_at(coords: &mut Vec<Coord<f64>>, end: Coord<f64>) {
    let n = coords.len();
    match coords.last_mut() {
        Some(last) if linework::distance(*last, end) <= COORD_EPS_M => {
            if n > 1 {
                *last = end;
            }
        }
        _ => coords.push(end),
    }
}
