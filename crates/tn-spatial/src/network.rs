//! Street network representation and builder.
//!
//! # Data layout
//!
//! The graph is a directed multigraph stored in **Compressed Sparse Row
//! (CSR)** format.  Given a `NodeId n`, its outgoing edges are the EdgeIds
//!
//! ```text
//! node_out_start[n] .. node_out_start[n+1]
//! ```
//!
//! All edge arrays are sorted by source node and indexed by `EdgeId`.  Edges
//! between the same ordered node pair are told apart by a parallel-edge
//! `key`, assigned in insertion order starting at 0.
//!
//! # Spatial indices
//!
//! Two R-trees (via `rstar`) live next to the graph:
//!
//! - node points, for nearest-node queries;
//! - every straight segment of every edge's linework, tagged with its
//!   `EdgeId`, for nearest-edge queries.

use std::borrow::Cow;
use std::collections::HashMap;

use geo::{Coord, LineString};
use rstar::primitives::{GeomWithData, Line as SegmentGeom};
use rstar::{PointDistance, RTree, RTreeObject, AABB};

use tn_core::{EdgeId, GeoPoint, NodeId};

use crate::LocalProjection;

/// Maximum gap, in metres, between an edge geometry's end coordinate and the
/// node it is supposed to touch before the geometry is considered misaligned.
pub const ORIENTATION_TOLERANCE_M: f64 = 0.5;

/// Two nearest-edge candidates whose distances differ by no more than this
/// are treated as tied, and the lower `EdgeId` wins.
const TIE_TOLERANCE_M: f64 = 1e-9;

// ── R-tree entries ────────────────────────────────────────────────────────────

/// Entry stored in the node index: a planar `[x, y]` point with its `NodeId`.
#[derive(Clone)]
struct NodeEntry {
    point: [f64; 2],
    id:    NodeId,
}

impl RTreeObject for NodeEntry {
    type Envelope = AABB<[f64; 2]>;
    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.point)
    }
}

impl PointDistance for NodeEntry {
    /// Squared Euclidean distance in the planar CRS.
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.point[0] - point[0];
        let dy = self.point[1] - point[1];
        dx * dx + dy * dy
    }
}

/// One straight piece of an edge's linework.
type SegmentEntry = GeomWithData<SegmentGeom<[f64; 2]>, EdgeId>;

// ── EdgeEnds ──────────────────────────────────────────────────────────────────

/// The identity of a directed edge as the outside world sees it: endpoint
/// pair plus parallel-edge key.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EdgeEnds {
    pub from: NodeId,
    pub to:   NodeId,
    pub key:  u16,
}

impl EdgeEnds {
    /// `true` if both edges join the same ordered node pair (any key).
    #[inline]
    pub fn same_pair(&self, other: &EdgeEnds) -> bool {
        self.from == other.from && self.to == other.to
    }

    /// `true` if both edges join the same two nodes in either direction.
    #[inline]
    pub fn same_street(&self, other: &EdgeEnds) -> bool {
        self.same_pair(other) || (self.from == other.to && self.to == other.from)
    }

    /// `true` if this edge has `node` as one of its endpoints.
    #[inline]
    pub fn touches(&self, node: NodeId) -> bool {
        self.from == node || self.to == node
    }
}

// ── StreetNetwork ─────────────────────────────────────────────────────────────

/// Directed, weighted street multigraph in a planar CRS, plus spatial indices
/// for snapping.
///
/// The network is static: once built it is only ever read.  Construct it with
/// [`StreetNetworkBuilder`].
pub struct StreetNetwork {
    // ── Node data ─────────────────────────────────────────────────────────
    /// Planar position of each node in metres.  Indexed by `NodeId`.
    pub node_pos: Vec<Coord<f64>>,

    // ── CSR edge adjacency ────────────────────────────────────────────────
    /// CSR row pointer.  Outgoing edges of node `n` are at EdgeIds
    /// `node_out_start[n] .. node_out_start[n+1]`.
    /// Length = `node_count + 1`.
    pub node_out_start: Vec<u32>,

    // ── Edge data (indexed by EdgeId = position in sorted order) ──────────
    pub edge_from: Vec<NodeId>,
    pub edge_to: Vec<NodeId>,

    /// Parallel-edge key, unique per ordered `(from, to)` pair.
    pub edge_key: Vec<u16>,

    /// Length of each edge in metres.  Used as the routing weight.
    pub edge_length_m: Vec<f64>,

    /// Explicit polyline geometry; `None` means a straight segment between
    /// the endpoint nodes.
    edge_geometry: Vec<Option<LineString<f64>>>,

    projection: LocalProjection,

    node_idx:    RTree<NodeEntry>,
    segment_idx: RTree<SegmentEntry>,
}

impl StreetNetwork {
    /// Construct an empty network with no nodes or edges.
    ///
    /// Snapping against an empty network fails with
    /// [`SpatialError::NoNearestEdge`][crate::SpatialError::NoNearestEdge].
    pub fn empty() -> Self {
        StreetNetworkBuilder::new(LocalProjection::default()).build()
    }

    // ── Graph dimensions ──────────────────────────────────────────────────

    pub fn node_count(&self) -> usize {
        self.node_pos.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_to.len()
    }

    pub fn is_empty(&self) -> bool {
        self.node_pos.is_empty()
    }

    pub fn projection(&self) -> &LocalProjection {
        &self.projection
    }

    // ── Graph traversal ───────────────────────────────────────────────────

    /// Iterator over the `EdgeId`s of all outgoing edges from `node`.
    ///
    /// A contiguous index range, no heap allocation.
    #[inline]
    pub fn out_edges(&self, node: NodeId) -> impl Iterator<Item = EdgeId> + '_ {
        let start = self.node_out_start[node.index()] as usize;
        let end   = self.node_out_start[node.index() + 1] as usize;
        (start..end).map(|i| EdgeId(i as u32))
    }

    /// Out-degree of `node` (number of outgoing edges).
    #[inline]
    pub fn out_degree(&self, node: NodeId) -> usize {
        let start = self.node_out_start[node.index()] as usize;
        let end   = self.node_out_start[node.index() + 1] as usize;
        end - start
    }

    /// Targets of the outgoing edges of `node`, in adjacency order.  A
    /// neighbour reachable over parallel edges appears once per edge.
    pub fn successors(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.out_edges(node).map(|e| self.edge_to[e.index()])
    }

    #[inline]
    pub fn ends(&self, edge: EdgeId) -> EdgeEnds {
        EdgeEnds {
            from: self.edge_from[edge.index()],
            to:   self.edge_to[edge.index()],
            key:  self.edge_key[edge.index()],
        }
    }

    /// Look up the edge `from → to` with parallel-edge `key`.
    pub fn find_edge(&self, from: NodeId, to: NodeId, key: u16) -> Option<EdgeId> {
        if from.index() >= self.node_count() {
            return None;
        }
        self.out_edges(from)
            .find(|e| self.edge_to[e.index()] == to && self.edge_key[e.index()] == key)
    }

    #[inline]
    pub fn node_coord(&self, node: NodeId) -> Coord<f64> {
        self.node_pos[node.index()]
    }

    #[inline]
    pub fn edge_length(&self, edge: EdgeId) -> f64 {
        self.edge_length_m[edge.index()]
    }

    /// The explicit geometry of `edge`, if it has one.
    pub fn geometry(&self, edge: EdgeId) -> Option<&LineString<f64>> {
        self.edge_geometry[edge.index()].as_ref()
    }

    /// Linework of `edge` as stored: the explicit geometry, or a straight
    /// segment `from → to`.  Always at least two coordinates.
    pub fn edge_line(&self, edge: EdgeId) -> Cow<'_, LineString<f64>> {
        match &self.edge_geometry[edge.index()] {
            Some(line) => Cow::Borrowed(line),
            None => {
                let ends = self.ends(edge);
                Cow::Owned(LineString::new(vec![
                    self.node_coord(ends.from),
                    self.node_coord(ends.to),
                ]))
            }
        }
    }

    /// Linework of `edge` oriented so that it starts at `start`.
    ///
    /// The stored geometry may run in either direction.  It is reversed when
    /// its last coordinate lies closer to `start` than its first.  If neither
    /// end is within [`ORIENTATION_TOLERANCE_M`] of `start` the geometry is
    /// returned in its stored orientation and a warning is logged.
    pub fn oriented_line(&self, edge: EdgeId, start: NodeId) -> Cow<'_, LineString<f64>> {
        let line = self.edge_line(edge);
        let anchor = self.node_coord(start);
        let (Some(first), Some(last)) = (line.0.first().copied(), line.0.last().copied()) else {
            return line;
        };
        let d_first = crate::linework::distance(first, anchor);
        let d_last  = crate::linework::distance(last, anchor);

        if d_first.min(d_last) > ORIENTATION_TOLERANCE_M {
            log::warn!(
                "geometry of {edge} does not touch {start} (gap {:.3} m); using stored orientation",
                d_first.min(d_last)
            );
            return line;
        }
        if d_last < d_first {
            let mut coords = line.into_owned().0;
            coords.reverse();
            Cow::Owned(LineString::new(coords))
        } else {
            line
        }
    }

    /// Arc offset along [`edge_line`](Self::edge_line) at which `node` sits:
    /// `0.0` for the end nearer the line's first coordinate, the full length
    /// otherwise.
    pub fn node_offset(&self, edge: EdgeId, node: NodeId) -> f64 {
        let line = self.edge_line(edge);
        let anchor = self.node_coord(node);
        match (line.0.first(), line.0.last()) {
            (Some(&first), Some(&last))
                if crate::linework::distance(last, anchor)
                    < crate::linework::distance(first, anchor) =>
            {
                crate::linework::length(&line)
            }
            _ => 0.0,
        }
    }

    // ── Spatial queries ───────────────────────────────────────────────────

    /// The edge whose linework passes closest to `point`.
    ///
    /// Exact ties (the two directed edges of a two-way street, or every edge
    /// meeting at a node) resolve to the lowest `EdgeId`, so repeated queries
    /// are deterministic.  Returns `None` only if the network has no edges.
    pub fn nearest_edge(&self, point: Coord<f64>) -> Option<EdgeId> {
        let query = [point.x, point.y];
        let mut candidates = self.segment_idx.nearest_neighbor_iter_with_distance_2(&query);
        let (first, best_d2) = candidates.next()?;
        let best = best_d2.sqrt();
        let mut winner = first.data;
        for (entry, d2) in candidates {
            if d2.sqrt() - best > TIE_TOLERANCE_M {
                break;
            }
            winner = winner.min(entry.data);
        }
        Some(winner)
    }

    /// Return the `NodeId` of the nearest node to `point`.
    ///
    /// Returns `None` only if the network has no nodes.
    pub fn nearest_node(&self, point: Coord<f64>) -> Option<NodeId> {
        self.node_idx
            .nearest_neighbor(&[point.x, point.y])
            .map(|e| e.id)
    }

    /// Shortcut for `projection().to_planar(p)`.
    #[inline]
    pub fn to_planar(&self, p: GeoPoint) -> Coord<f64> {
        self.projection.to_planar(p)
    }

    /// Shortcut for `projection().to_geo(c)`.
    #[inline]
    pub fn to_geo(&self, c: Coord<f64>) -> GeoPoint {
        self.projection.to_geo(c)
    }
}

// ── StreetNetworkBuilder ──────────────────────────────────────────────────────

/// Construct a [`StreetNetwork`] incrementally, then call [`build`](Self::build).
///
/// This is the hand-off point for whatever loads the street data: it
/// supplies projected node coordinates (or geographic ones through
/// [`add_node_geo`](Self::add_node_geo)), directed edges with their lengths,
/// and optional polyline geometry.
///
/// # Example
///
/// ```
/// use geo::Coord;
/// use tn_core::GeoPoint;
/// use tn_spatial::{LocalProjection, StreetNetworkBuilder};
///
/// let mut b = StreetNetworkBuilder::new(LocalProjection::new(GeoPoint::new(50.88, 4.70)));
/// let a = b.add_node(Coord { x: 0.0, y: 0.0 });
/// let c = b.add_node(Coord { x: 120.0, y: 0.0 });
/// b.add_street(a, c, 120.0, None);
/// let net = b.build();
/// assert_eq!(net.node_count(), 2);
/// assert_eq!(net.edge_count(), 2); // both directions
/// ```
pub struct StreetNetworkBuilder {
    projection: LocalProjection,
    nodes:      Vec<Coord<f64>>,
    raw_edges:  Vec<RawEdge>,
    pair_count: HashMap<(NodeId, NodeId), u16>,
}

struct RawEdge {
    from:     NodeId,
    to:       NodeId,
    key:      u16,
    length_m: f64,
    geometry: Option<LineString<f64>>,
}

impl StreetNetworkBuilder {
    pub fn new(projection: LocalProjection) -> Self {
        Self {
            projection,
            nodes:      Vec::new(),
            raw_edges:  Vec::new(),
            pair_count: HashMap::new(),
        }
    }

    /// Pre-allocate for the expected number of nodes and edges.
    pub fn with_capacity(projection: LocalProjection, nodes: usize, edges: usize) -> Self {
        Self {
            projection,
            nodes:      Vec::with_capacity(nodes),
            raw_edges:  Vec::with_capacity(edges),
            pair_count: HashMap::with_capacity(edges),
        }
    }

    /// Add a node at a planar position and return its `NodeId` (sequential
    /// from 0).
    pub fn add_node(&mut self, pos: Coord<f64>) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(pos);
        id
    }

    /// Add a node at a geographic position, projecting it first.
    pub fn add_node_geo(&mut self, pos: GeoPoint) -> NodeId {
        let planar = self.projection.to_planar(pos);
        self.add_node(planar)
    }

    /// Add a **directed** edge from `from` to `to` and return its identity.
    ///
    /// - `length_m`: routing weight in metres.
    /// - `geometry`: planar polyline; `None` (or fewer than two coordinates)
    ///   means a straight segment between the nodes.
    pub fn add_directed_edge(
        &mut self,
        from:     NodeId,
        to:       NodeId,
        length_m: f64,
        geometry: Option<LineString<f64>>,
    ) -> EdgeEnds {
        let counter = self.pair_count.entry((from, to)).or_insert(0);
        let key = *counter;
        *counter += 1;

        let geometry = geometry.filter(|g| g.0.len() >= 2);
        self.raw_edges.push(RawEdge { from, to, key, length_m, geometry });
        EdgeEnds { from, to, key }
    }

    /// Convenience: add edges in **both directions** for a two-way street.
    /// The reverse edge gets the reversed geometry.
    pub fn add_street(
        &mut self,
        a:        NodeId,
        b:        NodeId,
        length_m: f64,
        geometry: Option<LineString<f64>>,
    ) -> (EdgeEnds, EdgeEnds) {
        let reversed = geometry.as_ref().map(|g| {
            let mut coords = g.0.clone();
            coords.reverse();
            LineString::new(coords)
        });
        let forward = self.add_directed_edge(a, b, length_m, geometry);
        let back    = self.add_directed_edge(b, a, length_m, reversed);
        (forward, back)
    }

    /// Two-way straight street whose length is the planar distance between
    /// the nodes.
    pub fn add_straight_street(&mut self, a: NodeId, b: NodeId) -> (EdgeEnds, EdgeEnds) {
        let length_m = crate::linework::distance(self.node_pos(a), self.node_pos(b));
        self.add_street(a, b, length_m, None)
    }

    /// Look up the position of a node added earlier.
    pub fn node_pos(&self, id: NodeId) -> Coord<f64> {
        self.nodes[id.index()]
    }

    pub fn projection(&self) -> &LocalProjection { &self.projection }
    pub fn node_count(&self) -> usize { self.nodes.len() }
    pub fn edge_count(&self) -> usize { self.raw_edges.len() }

    /// Consume the builder and produce a [`StreetNetwork`].
    ///
    /// Time complexity: O(E log E) for the edge sort + O(S log S) for the
    /// R-tree bulk loads, where S is the total number of edge segments.
    pub fn build(self) -> StreetNetwork {
        let node_count = self.nodes.len();
        let edge_count = self.raw_edges.len();

        // Stable sort keeps parallel edges in key order.
        let mut raw = self.raw_edges;
        raw.sort_by_key(|e| e.from.0);

        let edge_from:     Vec<NodeId> = raw.iter().map(|e| e.from).collect();
        let edge_to:       Vec<NodeId> = raw.iter().map(|e| e.to).collect();
        let edge_key:      Vec<u16>    = raw.iter().map(|e| e.key).collect();
        let edge_length_m: Vec<f64>    = raw.iter().map(|e| e.length_m).collect();

        let mut node_out_start = vec![0u32; node_count + 1];
        for e in &raw {
            node_out_start[e.from.index() + 1] += 1;
        }
        for i in 1..=node_count {
            node_out_start[i] += node_out_start[i - 1];
        }
        debug_assert_eq!(node_out_start[node_count] as usize, edge_count);

        let mut segments = Vec::with_capacity(edge_count);
        for (i, e) in raw.iter().enumerate() {
            let id = EdgeId(i as u32);
            let coords: Vec<Coord<f64>> = match &e.geometry {
                Some(g) => g.0.clone(),
                None => vec![self.nodes[e.from.index()], self.nodes[e.to.index()]],
            };
            for pair in coords.windows(2) {
                let seg = SegmentGeom::new([pair[0].x, pair[0].y], [pair[1].x, pair[1].y]);
                segments.push(GeomWithData::new(seg, id));
            }
        }
        let segment_idx = RTree::bulk_load(segments);

        let entries: Vec<NodeEntry> = self
            .nodes
            .iter()
            .enumerate()
            .map(|(i, pos)| NodeEntry { point: [pos.x, pos.y], id: NodeId(i as u32) })
            .collect();
        let node_idx = RTree::bulk_load(entries);

        let edge_geometry = raw.into_iter().map(|e| e.geometry).collect();

        StreetNetwork {
            node_pos: self.nodes,
            node_out_start,
            edge_from,
            edge_to,
            edge_key,
            edge_length_m,
            edge_geometry,
            projection: self.projection,
            node_idx,
            segment_idx,
        }
    }
}

impl Default for StreetNetworkBuilder {
    fn default() -> Self {
        Self::new(LocalProjection::default())
    }
}
