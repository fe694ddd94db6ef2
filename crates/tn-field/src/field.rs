//! The playing field: a street network plus every registered player's state.

use std::collections::HashMap;

use tn_core::{GeoPoint, Location, PlayerId, TnResult};
use tn_spatial::{
    linework, snap_geo, stitch, DijkstraRouter, Router, SpatialError, StreetNetwork,
};

use crate::{BoundaryMatch, FieldResult, Trajectory};

/// A snapped point this close (metres) to the trajectory end is the trajectory
/// end.
const ANCHOR_TOLERANCE_M: f64 = 1e-6;

// ── Configuration ─────────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FieldConfig {
    /// Matching rule applied when new sub-paths are merged into a
    /// trajectory.  Default: exact.
    pub boundary_match: BoundaryMatch,
}

impl FieldConfig {
    pub fn validate(&self) -> TnResult<()> {
        self.boundary_match.validate()
    }
}

// ── UpdateOutcome ─────────────────────────────────────────────────────────────

/// What happened to a requested position update.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum UpdateOutcome {
    /// The player moved; carries the snapped location now stored as last
    /// known.
    Moved(Location),
    /// No path connects the previous and requested positions.  Nothing
    /// changed.
    NoPath,
    /// The id is not registered.  Nothing changed.
    UnknownPlayer,
}

impl UpdateOutcome {
    pub fn is_moved(&self) -> bool {
        matches!(self, UpdateOutcome::Moved(_))
    }

    pub fn location(&self) -> Option<Location> {
        match self {
            UpdateOutcome::Moved(loc) => Some(*loc),
            _ => None,
        }
    }
}

// ── PlayingField ──────────────────────────────────────────────────────────────

#[derive(Clone, Debug)]
struct PlayerState {
    start:      Location,
    last_known: Location,
    trajectory: Trajectory,
}

/// Orchestrates snapping, stitching and trajectory merging for a set of
/// players sharing one street network.
///
/// All per-player state lives in one owned table keyed by [`PlayerId`].  The
/// field never modifies the network.
///
/// # Type parameter
///
/// `R` is the shortest-path engine used for stitching and by movement
/// strategies; it defaults to [`DijkstraRouter`].
pub struct PlayingField<R: Router = DijkstraRouter> {
    network: StreetNetwork,
    router:  R,
    config:  FieldConfig,
    players: HashMap<PlayerId, PlayerState>,
}

impl PlayingField<DijkstraRouter> {
    pub fn new(network: StreetNetwork) -> Self {
        Self::with_router(network, DijkstraRouter)
    }
}

impl<R: Router> PlayingField<R> {
    pub fn with_router(network: StreetNetwork, router: R) -> Self {
        Self {
            network,
            router,
            config:  FieldConfig::default(),
            players: HashMap::new(),
        }
    }

    /// Replace the configuration after validating it.  Applies to players
    /// registered afterwards.
    pub fn with_config(mut self, config: FieldConfig) -> FieldResult<Self> {
        config.validate()?;
        self.config = config;
        Ok(self)
    }

    // ── Registration ──────────────────────────────────────────────────────

    /// Register `id` at `start`.
    ///
    /// The start is snapped onto the network; the snapped point (keeping the
    /// caller's timestamp) becomes both start and last known location, and
    /// the player gets an empty trajectory.  Registering an existing id
    /// replaces its state.
    ///
    /// # Errors
    ///
    /// Propagates snapping failures (e.g. an empty network).
    pub fn add_player(&mut self, id: impl Into<PlayerId>, start: Location) -> FieldResult<Location> {
        let id = id.into();
        let snapped = snap_geo(&self.network, start.point)?;
        let location = Location::from_point(self.network.to_geo(snapped.point), start.timestamp);

        let state = PlayerState {
            start:      location,
            last_known: location,
            trajectory: Trajectory::with_boundary_match(self.config.boundary_match),
        };
        if self.players.insert(id.clone(), state).is_some() {
            log::debug!("player {id} re-registered at {location}");
        } else {
            log::debug!("player {id} registered at {location}");
        }
        Ok(location)
    }

    // ── Movement ──────────────────────────────────────────────────────────

    /// Move `id` to `new`, extending its trajectory along the network.
    ///
    /// The previous position is the trajectory's last point, or the start
    /// location while the trajectory is empty.  Both positions are snapped
    /// and stitched; the stitched path is merged into the trajectory and the
    /// snapped `new` (with `new`'s timestamp) becomes the last known
    /// location.
    ///
    /// # Errors
    ///
    /// Snapping failures propagate.  A missing path and an unknown id are
    /// reported through [`UpdateOutcome`] instead.
    pub fn update_current_location(
        &mut self,
        id:  &PlayerId,
        new: Location,
    ) -> FieldResult<UpdateOutcome> {
        let network = &self.network;
        let Some(state) = self.players.get_mut(id) else {
            log::debug!("ignoring update for unknown player {id}");
            return Ok(UpdateOutcome::UnknownPlayer);
        };

        let previous = state.trajectory.last_known_point().unwrap_or(state.start.point);
        let from = snap_geo(network, previous)?;
        let to   = snap_geo(network, new.point)?;

        let planar = match stitch(network, &self.router, &from, &to) {
            Ok(line) => line,
            Err(SpatialError::NoRoute { from: a, to: b }) => {
                log::debug!("player {id}: no path from {a} to {b}; move rejected");
                return Ok(UpdateOutcome::NoPath);
            }
            Err(e) => return Err(e.into()),
        };

        let mut sub_path = network.projection().line_to_geo(&planar);
        // Re-projection can perturb the last bits; pin the shared point to
        // the stored one so the merge recognizes it.
        if let Some(first) = sub_path.first_mut() {
            if linework::distance(network.to_planar(previous), from.point) <= ANCHOR_TOLERANCE_M {
                *first = previous;
            }
        }

        let location = Location::from_point(network.to_geo(to.point), new.timestamp);
        state.trajectory.update(&sub_path);
        state.last_known = location;
        Ok(UpdateOutcome::Moved(location))
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    pub fn contains(&self, id: &PlayerId) -> bool {
        self.players.contains_key(id)
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    /// Snapped registration location of `id`.
    pub fn start_location(&self, id: &PlayerId) -> Option<Location> {
        self.players.get(id).map(|s| s.start)
    }

    /// Snapped location of the last accepted move (or the start location).
    pub fn last_known_location(&self, id: &PlayerId) -> Option<Location> {
        self.players.get(id).map(|s| s.last_known)
    }

    pub fn trajectory(&self, id: &PlayerId) -> Option<&Trajectory> {
        self.players.get(id).map(|s| &s.trajectory)
    }

    /// Every player's trajectory, in no particular order.
    pub fn trajectories(&self) -> impl Iterator<Item = (&PlayerId, &Trajectory)> + '_ {
        self.players.iter().map(|(id, s)| (id, &s.trajectory))
    }

    /// Where the trajectory of `id` begins: its first point, or the start
    /// location while nothing has been recorded.
    pub fn origin_point(&self, id: &PlayerId) -> Option<GeoPoint> {
        self.players
            .get(id)
            .map(|s| s.trajectory.start_point().unwrap_or(s.start.point))
    }

    pub fn network(&self) -> &StreetNetwork {
        &self.network
    }

    pub fn router(&self) -> &R {
        &self.router
    }

    pub fn config(&self) -> &FieldConfig {
        &self.config
    }
}
