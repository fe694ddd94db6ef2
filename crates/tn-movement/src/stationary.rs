//! A strategy that never moves.

use chrono::{DateTime, Utc};

use tn_core::{Location, PlayerId};
use tn_field::PlayingField;
use tn_spatial::Router;

use crate::MovementStrategy;

/// A [`MovementStrategy`] that always proposes the last location, ignoring
/// speed and time.
///
/// Useful as a placeholder or for players driven entirely by external
/// position updates.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct StationaryStrategy;

impl MovementStrategy for StationaryStrategy {
    fn next_move<R: Router>(
        &mut self,
        last:           &Location,
        _field:         &PlayingField<R>,
        _max_speed_mps: f64,
        _player:        &PlayerId,
        _now:           DateTime<Utc>,
    ) -> Option<Location> {
        Some(*last)
    }
}
