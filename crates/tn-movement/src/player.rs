//! A player on a playing field.

use chrono::{DateTime, Utc};

use tn_core::{Location, PlayerId};
use tn_field::{FieldResult, PlayingField, Trajectory, UpdateOutcome};
use tn_spatial::Router;

use crate::{MovementStrategy, Strategy};

/// A participant that moves along the network under a speed cap.
///
/// The player owns its [`Strategy`] but not its position: location and
/// trajectory live in the [`PlayingField`], which every call receives
/// explicitly.
#[derive(Clone, Debug)]
pub struct Player {
    id:            PlayerId,
    name:          String,
    strategy:      Strategy,
    max_speed_mps: f64,
}

impl Player {
    /// Walking pace.
    pub const DEFAULT_MAX_SPEED_MPS: f64 = 1.4;

    /// Register a new player on `field` at `start` (snapped onto the
    /// network), with the stationary strategy and walking speed.
    pub fn join<R: Router>(
        field: &mut PlayingField<R>,
        id:    impl Into<PlayerId>,
        name:  impl Into<String>,
        start: Location,
    ) -> FieldResult<Self> {
        let id = id.into();
        field.add_player(id.clone(), start)?;
        Ok(Self {
            id,
            name:          name.into(),
            strategy:      Strategy::default(),
            max_speed_mps: Self::DEFAULT_MAX_SPEED_MPS,
        })
    }

    pub fn with_strategy(mut self, strategy: impl Into<Strategy>) -> Self {
        self.strategy = strategy.into();
        self
    }

    pub fn with_max_speed(mut self, max_speed_mps: f64) -> Self {
        self.max_speed_mps = max_speed_mps;
        self
    }

    pub fn id(&self) -> &PlayerId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn strategy(&self) -> &Strategy {
        &self.strategy
    }

    pub fn max_speed_mps(&self) -> f64 {
        self.max_speed_mps
    }

    /// Last known location on `field`, or `None` if not registered there.
    pub fn current_location<R: Router>(&self, field: &PlayingField<R>) -> Option<Location> {
        field.last_known_location(&self.id)
    }

    pub fn trajectory<'f, R: Router>(&self, field: &'f PlayingField<R>) -> Option<&'f Trajectory> {
        field.trajectory(&self.id)
    }

    /// Report an externally observed position (e.g. from GPS).
    pub fn update_current_location<R: Router>(
        &self,
        field:    &mut PlayingField<R>,
        location: Location,
    ) -> FieldResult<UpdateOutcome> {
        field.update_current_location(&self.id, location)
    }

    /// Ask the strategy for the next location at `now` and apply it.
    ///
    /// Returns `true` only if the player actually moved.  Errors are logged,
    /// never returned.
    pub fn move_on<R: Router>(&mut self, field: &mut PlayingField<R>, now: DateTime<Utc>) -> bool {
        let Some(last) = self.current_location(field) else {
            log::debug!("player {} is not on this field", self.id);
            return false;
        };
        let Some(next) = self.strategy.next_move(&last, field, self.max_speed_mps, &self.id, now)
        else {
            log::debug!("player {}: {} strategy proposes no move", self.id, self.strategy.name());
            return false;
        };

        match field.update_current_location(&self.id, next) {
            Ok(UpdateOutcome::Moved(_)) => true,
            Ok(outcome) => {
                log::debug!("player {}: move to {next} rejected ({outcome:?})", self.id);
                false
            }
            Err(e) => {
                log::warn!("player {}: move to {next} failed: {e}", self.id);
                false
            }
        }
    }

    /// [`move_on`](Self::move_on) at the current wall-clock time.
    pub fn move_now<R: Router>(&mut self, field: &mut PlayingField<R>) -> bool {
        self.move_on(field, Utc::now())
    }
}
