//! Routing trait and default Dijkstra implementation.
//!
//! # Pluggability
//!
//! Stitching and movement policies call routing via the [`Router`] trait, so
//! applications can swap in A* or a contraction hierarchy without touching
//! the rest of the engine.  Routers search any [`GraphView`], which is how
//! filtered searches avoid copying the network.
//!
//! # Cost units
//!
//! Edge weights are lengths in metres.  Internally they are rounded to whole
//! millimetres (u64) so heap ordering is exact and ties break
//! deterministically on `NodeId`.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use tn_core::{EdgeId, NodeId};

use crate::{GraphView, SpatialError, StreetNetwork};

// ── Route ─────────────────────────────────────────────────────────────────────

/// The result of a routing query: the origin node, the ordered `EdgeId`s to
/// traverse, and their total length.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    pub origin: NodeId,
    /// Edges to traverse in order, from source to destination.
    pub edges: Vec<EdgeId>,
    pub total_length_m: f64,
}

impl Route {
    /// `true` if the source and destination are the same node.
    pub fn is_trivial(&self) -> bool {
        self.edges.is_empty()
    }

    /// The node sequence visited by this route, origin first.
    pub fn nodes(&self, network: &StreetNetwork) -> Vec<NodeId> {
        let mut nodes = Vec::with_capacity(self.edges.len() + 1);
        nodes.push(self.origin);
        nodes.extend(self.edges.iter().map(|e| network.edge_to[e.index()]));
        nodes
    }
}

// ── Router trait ──────────────────────────────────────────────────────────────

/// Pluggable shortest-path engine.
///
/// Implementations must be `Send + Sync` so a playing field can be shared
/// read-only between threads that serialize their writes.
pub trait Router: Send + Sync {
    /// Shortest route by length from `from` to `to` using only the edges
    /// `view` exposes.
    ///
    /// `from == to` yields an empty route.  Returns
    /// [`SpatialError::NoRoute`] if `to` is unreachable.
    fn route<V: GraphView + ?Sized>(
        &self,
        view: &V,
        from: NodeId,
        to:   NodeId,
    ) -> Result<Route, SpatialError>;
}

// ── DijkstraRouter ────────────────────────────────────────────────────────────

/// Standard Dijkstra's algorithm over the CSR street graph, weighted by edge
/// length.
#[derive(Copy, Clone, Debug, Default)]
pub struct DijkstraRouter;

impl Router for DijkstraRouter {
    fn route<V: GraphView + ?Sized>(
        &self,
        view: &V,
        from: NodeId,
        to:   NodeId,
    ) -> Result<Route, SpatialError> {
        dijkstra(view, from, to)
    }
}

// ── Dijkstra internals ────────────────────────────────────────────────────────

#[inline]
fn edge_cost_mm(network: &StreetNetwork, edge: EdgeId) -> u64 {
    (network.edge_length_m[edge.index()].max(0.0) * 1000.0).round() as u64
}

fn dijkstra<V: GraphView + ?Sized>(view: &V, from: NodeId, to: NodeId) -> Result<Route, SpatialError> {
    let network = view.network();
    let n = network.node_count();
    if from.index() >= n {
        return Err(SpatialError::NodeNotFound(from));
    }
    if to.index() >= n {
        return Err(SpatialError::NodeNotFound(to));
    }
    if from == to {
        return Ok(Route { origin: from, edges: vec![], total_length_m: 0.0 });
    }

    // dist[v] = best known cost (mm) to reach v.
    let mut dist      = vec![u64::MAX; n];
    // prev_edge[v] = EdgeId that reached v; EdgeId::INVALID for unreached nodes.
    let mut prev_edge = vec![EdgeId::INVALID; n];

    dist[from.index()] = 0;

    // Min-heap: (cost, node). Reverse makes BinaryHeap (max) behave as min-heap.
    // Secondary key NodeId ensures deterministic tie-breaking.
    let mut heap: BinaryHeap<Reverse<(u64, NodeId)>> = BinaryHeap::new();
    heap.push(Reverse((0, from)));

    while let Some(Reverse((cost, node))) = heap.pop() {
        if node == to {
            return Ok(reconstruct(network, &prev_edge, from, to));
        }

        // Skip stale heap entries.
        if cost > dist[node.index()] {
            continue;
        }

        for edge in network.out_edges(node) {
            if !view.is_visible(edge) {
                continue;
            }
            let neighbor = network.edge_to[edge.index()];
            let new_cost = cost.saturating_add(edge_cost_mm(network, edge));

            if new_cost < dist[neighbor.index()] {
                dist[neighbor.index()] = new_cost;
                prev_edge[neighbor.index()] = edge;
                heap.push(Reverse((new_cost, neighbor)));
            }
        }
    }

    Err(SpatialError::NoRoute { from, to })
}

fn reconstruct(network: &StreetNetwork, prev_edge: &[EdgeId], from: NodeId, to: NodeId) -> Route {
    let mut edges = Vec::new();
    let mut cur = to;
    while cur != from {
        let e = prev_edge[cur.index()];
        if e == EdgeId::INVALID {
            break;
        }
        edges.push(e);
        cur = network.edge_from[e.index()];
    }
    edges.reverse();
    let total_length_m = edges.iter().map(|e| network.edge_length_m[e.index()]).sum();
    Route { origin: from, edges, total_length_m }
}
