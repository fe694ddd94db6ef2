//! Speed-bounded exploration that returns to the start without crossing the
//! player's own trail.
//!
//! # Phases
//!
//! ```text
//! Exploring ──(loop long enough, or no legal edge)──▶ Returning ──(target reached)──▶ Closed
//! ```
//!
//! Each call spends a distance budget of `max_speed × elapsed` metres:
//!
//! 1. Finish the current edge: walk to the node the player was heading to
//!    (or, with no heading, the nearer endpoint).  A budget too small for
//!    that stops part-way along the edge.
//! 2. **Exploring**: repeatedly take the first outgoing edge that leads to an
//!    unvisited node without crossing the trail.  Edges that fit the budget
//!    are walked in full; the first one that does not is walked part-way and
//!    the call ends.
//! 3. **Returning**: find a shortest path back to a node near the trail's
//!    start, over a view of the network without the edges that cut or run
//!    along the trail, and walk it the same way.  Without such a path the
//!    walk ends where exploring left it.  Reaching the end closes the loop;
//!    from then on the strategy proposes nothing.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use geo::{Coord, LineString};

use tn_core::{EdgeId, Location, NodeId, PlayerId, TnError, TnResult};
use tn_field::PlayingField;
use tn_spatial::{linework, snap_geo, FilteredView, Router, Snap, SpatialError, StreetNetwork};

// ── LoopConfig ────────────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LoopConfig {
    /// Distance to explore before heading back.  Default: 500 m.
    pub min_loop_length_m: f64,

    /// Radius around an allowed touch point (the node the player stands on,
    /// or an edge's own endpoints) within which meeting the trail does not
    /// count as crossing it.  Default: 1 mm.
    pub intersection_tolerance_m: f64,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            min_loop_length_m:        500.0,
            intersection_tolerance_m: 1e-3,
        }
    }
}

impl LoopConfig {
    pub fn validate(&self) -> TnResult<()> {
        if !(self.min_loop_length_m.is_finite() && self.min_loop_length_m >= 0.0) {
            return Err(TnError::Config(format!(
                "min_loop_length_m must be a non-negative number, got {}",
                self.min_loop_length_m
            )));
        }
        if !(self.intersection_tolerance_m.is_finite() && self.intersection_tolerance_m >= 0.0) {
            return Err(TnError::Config(format!(
                "intersection_tolerance_m must be a non-negative number, got {}",
                self.intersection_tolerance_m
            )));
        }
        Ok(())
    }
}

// ── LoopClosingStrategy ───────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum LoopPhase {
    #[default]
    Exploring,
    Returning,
    Closed,
}

/// Loop-exploring movement policy.  Holds per-player state; use one value
/// per player.
#[derive(Clone, Debug, Default)]
pub struct LoopClosingStrategy {
    config:        LoopConfig,
    visited:       HashSet<NodeId>,
    loop_length_m: f64,
    phase:         LoopPhase,
    /// Node the player was walking toward when the last call ran out of
    /// budget mid-edge.
    heading:       Option<NodeId>,
}

impl LoopClosingStrategy {
    pub fn new(config: LoopConfig) -> TnResult<Self> {
        config.validate()?;
        Ok(Self { config, ..Self::default() })
    }

    pub fn config(&self) -> &LoopConfig {
        &self.config
    }

    pub fn phase(&self) -> LoopPhase {
        self.phase
    }

    /// Distance walked while exploring, in metres.
    pub fn loop_length_m(&self) -> f64 {
        self.loop_length_m
    }

    pub fn is_visited(&self, node: NodeId) -> bool {
        self.visited.contains(&node)
    }

    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    /// Walk toward `node` by `distance` metres along the current edge, or all
    /// the way when `distance` is at least the gap.
    fn walk_to_node(&mut self, walk: &mut Walk<'_>, here: &Snap, node: NodeId, distance: f64) {
        let network = walk.network;
        let line = network.edge_line(here.edge);
        let target = network.node_offset(here.edge, node);
        let end = if target >= here.offset_m {
            (here.offset_m + distance).min(target)
        } else {
            (here.offset_m - distance).max(target)
        };
        let walked = walk.along(&line, here.offset_m, end);
        if self.phase == LoopPhase::Exploring {
            self.loop_length_m += walked;
        }
    }

    /// Exploring phase.  Returns the node to head back from once it is time
    /// to return, `None` if the budget ran out first.
    fn explore(
        &mut self,
        walk:        &mut Walk<'_>,
        trail:       &LineString<f64>,
        mut current: NodeId,
    ) -> Option<NodeId> {
        let network = walk.network;
        let tolerance = self.config.intersection_tolerance_m;
        loop {
            if self.loop_length_m >= self.config.min_loop_length_m {
                log::debug!("loop length {:.1} m reached; returning", self.loop_length_m);
                return Some(current);
            }
            if walk.remaining <= 0.0 {
                return None;
            }

            let here = [network.node_coord(current)];
            let walked = LineString::new(walk.path.clone());
            let next = network.out_edges(current).find(|&e| {
                let to = network.edge_to[e.index()];
                if self.visited.contains(&to) {
                    return false;
                }
                let line = network.oriented_line(e, current);
                !linework::crosses(&line, trail, &here, tolerance)
                    && !linework::crosses(&line, &walked, &here, tolerance)
            });
            let Some(edge) = next else {
                log::debug!("no legal edge out of {current}; returning");
                return Some(current);
            };

            let to = network.edge_to[edge.index()];
            let line = network.oriented_line(edge, current);
            let length = linework::length(&line);
            if length <= walk.remaining {
                log::trace!("explore {edge}: {current} -> {to} ({length:.1} m)");
                self.loop_length_m += walk.along(&line, 0.0, length);
                self.visited.insert(to);
                current = to;
            } else {
                let step = walk.remaining;
                log::trace!("explore {edge}: {step:.1} of {length:.1} m toward {to}");
                self.loop_length_m += walk.along(&line, 0.0, step);
                self.heading = Some(to);
                return None;
            }
        }
    }

    /// Returning phase: walk back toward the trail's start.
    fn head_home<R: Router>(
        &mut self,
        walk:    &mut Walk<'_>,
        field:   &PlayingField<R>,
        player:  &PlayerId,
        trail:   &LineString<f64>,
        current: NodeId,
    ) {
        let network = walk.network;
        let Some(origin) = field.origin_point(player) else {
            return;
        };
        let home = match snap_geo(network, origin) {
            Ok(s) => s,
            Err(e) => {
                log::debug!("player {player}: cannot snap trail start: {e}");
                return;
            }
        };
        let target = self.return_target(network, &home);
        if current == target {
            self.close(player);
            return;
        }

        // The trail plus what this call has walked so far.
        let mut fence = trail.0.clone();
        linework::extend_distinct(&mut fence, walk.path.iter().copied());
        let fence = LineString::new(fence);
        let tolerance = self.config.intersection_tolerance_m;
        // Edges that cut or retrace the fence are hidden; touching it at their
        // own endpoints is fine.
        let view = FilteredView::new(network, |e: EdgeId| {
            let ends = network.ends(e);
            let allowed = [network.node_coord(ends.from), network.node_coord(ends.to)];
            let line = network.edge_line(e);
            !linework::crosses(&line, &fence, &allowed, tolerance)
                && !linework::overlaps(&line, &fence, tolerance)
        });

        let route = match field.router().route(&view, current, target) {
            Ok(route) => route,
            Err(SpatialError::NoRoute { .. }) => {
                log::debug!("player {player}: no way back from {current} to {target}");
                return;
            }
            Err(e) => {
                log::debug!("player {player}: return search failed: {e}");
                return;
            }
        };

        let mut node = current;
        for &edge in &route.edges {
            let to = network.edge_to[edge.index()];
            let line = network.oriented_line(edge, node);
            let length = linework::length(&line);
            if length <= walk.remaining {
                walk.along(&line, 0.0, length);
                self.visited.insert(to);
                node = to;
            } else {
                let step = walk.remaining;
                walk.along(&line, 0.0, step);
                self.heading = Some(to);
                return;
            }
        }
        self.close(player);
    }

    /// Endpoint of the home edge nearest the trail start that is already
    /// visited, or simply the nearer one.
    fn return_target(&self, network: &StreetNetwork, home: &Snap) -> NodeId {
        let gap = |n: NodeId| (network.node_offset(home.edge, n) - home.offset_m).abs();
        let (near, far) = if gap(home.ends.to) < gap(home.ends.from) {
            (home.ends.to, home.ends.from)
        } else {
            (home.ends.from, home.ends.to)
        };
        [near, far]
            .into_iter()
            .find(|n| self.visited.contains(n))
            .unwrap_or(near)
    }

    fn close(&mut self, player: &PlayerId) {
        log::debug!("player {player}: loop closed after {:.1} m", self.loop_length_m);
        self.phase = LoopPhase::Closed;
        self.heading = None;
    }
}

impl crate::MovementStrategy for LoopClosingStrategy {
    fn next_move<R: Router>(
        &mut self,
        last:          &Location,
        field:         &PlayingField<R>,
        max_speed_mps: f64,
        player:        &PlayerId,
        now:           DateTime<Utc>,
    ) -> Option<Location> {
        if self.phase == LoopPhase::Closed {
            return None;
        }
        let network = field.network();
        let budget = (max_speed_mps * last.elapsed_secs(now)).max(0.0);

        let here = match snap_geo(network, last.point) {
            Ok(s) => s,
            Err(e) => {
                log::debug!("player {player}: cannot snap last location: {e}");
                return None;
            }
        };
        let mut walk = Walk::new(network, here.point, budget);

        // Finish the current edge first.
        let node = self
            .heading
            .filter(|n| here.ends.touches(*n))
            .unwrap_or_else(|| nearer_end(network, &here));
        let gap = (network.node_offset(here.edge, node) - here.offset_m).abs();
        if walk.remaining < gap {
            let step = walk.remaining;
            self.walk_to_node(&mut walk, &here, node, step);
            self.heading = Some(node);
            return Some(walk.finish(now));
        }
        self.walk_to_node(&mut walk, &here, node, gap);
        self.heading = None;
        self.visited.insert(node);

        let trail = field
            .trajectory(player)
            .map(|t| t.to_planar(network.projection()))
            .unwrap_or_else(|| LineString::new(Vec::new()));

        let mut current = node;
        if self.phase == LoopPhase::Exploring {
            match self.explore(&mut walk, &trail, node) {
                Some(stop) => current = stop,
                None => return Some(walk.finish(now)),
            }
            self.phase = LoopPhase::Returning;
        }
        self.head_home(&mut walk, field, player, &trail, current);
        Some(walk.finish(now))
    }
}

/// The endpoint of the snapped edge closer along the edge.
fn nearer_end(network: &StreetNetwork, here: &Snap) -> NodeId {
    let gap = |n: NodeId| (network.node_offset(here.edge, n) - here.offset_m).abs();
    if gap(here.ends.to) < gap(here.ends.from) { here.ends.to } else { here.ends.from }
}

// ── Walk ──────────────────────────────────────────────────────────────────────

/// The distance budget and path of a single `next_move` call.
struct Walk<'n> {
    network:   &'n StreetNetwork,
    position:  Coord<f64>,
    remaining: f64,
    path:      Vec<Coord<f64>>,
}

impl<'n> Walk<'n> {
    fn new(network: &'n StreetNetwork, start: Coord<f64>, budget: f64) -> Self {
        Self { network, position: start, remaining: budget, path: vec![start] }
    }

    /// Follow `line` from offset `start` to `end`; returns the distance
    /// walked.
    fn along(&mut self, line: &LineString<f64>, start: f64, end: f64) -> f64 {
        let coords = linework::substring(line, start, end);
        linework::extend_distinct(&mut self.path, coords);
        if let Some(&last) = self.path.last() {
            self.position = last;
        }
        let walked = (end - start).abs();
        self.remaining = (self.remaining - walked).max(0.0);
        walked
    }

    fn finish(&self, now: DateTime<Utc>) -> Location {
        Location::from_point(self.network.to_geo(self.position), now)
    }
}
