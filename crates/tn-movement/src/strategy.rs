//! The `MovementStrategy` trait and the closed set of built-in strategies.

use chrono::{DateTime, Utc};

use tn_core::{Location, PlayerId, TnResult};
use tn_field::PlayingField;
use tn_spatial::Router;

use crate::{LoopClosingStrategy, LoopConfig, StationaryStrategy};

/// Decides where a player goes next.
///
/// Implementations read the field but never write to it; the proposed
/// location is applied by the caller through
/// [`PlayingField::update_current_location`].
///
/// `&mut self` lets a strategy carry state across calls for one player (the
/// loop-closing strategy remembers visited nodes).  Give every player its
/// own strategy value.
pub trait MovementStrategy {
    /// Propose the player's next location.
    ///
    /// - `last`: the player's last known location; its timestamp marks the
    ///   start of the elapsed interval.
    /// - `max_speed_mps`: speed cap; the proposal must lie within
    ///   `max_speed_mps × (now − last.timestamp)` metres along the network.
    /// - `now`: end of the elapsed interval; strategies that move stamp the
    ///   result with it.
    ///
    /// Returns `None` when no movement is possible.
    fn next_move<R: Router>(
        &mut self,
        last:          &Location,
        field:         &PlayingField<R>,
        max_speed_mps: f64,
        player:        &PlayerId,
        now:           DateTime<Utc>,
    ) -> Option<Location>;
}

/// Every strategy a [`Player`][crate::Player] can own.
///
/// New policies are added as variants; callers only see
/// [`MovementStrategy::next_move`].
#[derive(Clone, Debug)]
pub enum Strategy {
    Stationary(StationaryStrategy),
    LoopClosing(LoopClosingStrategy),
}

impl Strategy {
    pub fn stationary() -> Self {
        Strategy::Stationary(StationaryStrategy)
    }

    /// A fresh loop-closing strategy.
    ///
    /// # Errors
    ///
    /// [`TnError::Config`][tn_core::TnError::Config] if `config` is invalid.
    pub fn loop_closing(config: LoopConfig) -> TnResult<Self> {
        LoopClosingStrategy::new(config).map(Strategy::LoopClosing)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Strategy::Stationary(_) => "stationary",
            Strategy::LoopClosing(_) => "loop-closing",
        }
    }
}

impl Default for Strategy {
    fn default() -> Self {
        Self::stationary()
    }
}

impl From<StationaryStrategy> for Strategy {
    fn from(s: StationaryStrategy) -> Self {
        Strategy::Stationary(s)
    }
}

impl From<LoopClosingStrategy> for Strategy {
    fn from(s: LoopClosingStrategy) -> Self {
        Strategy::LoopClosing(s)
    }
}

impl MovementStrategy for Strategy {
    fn next_move<R: Router>(
        &mut self,
        last:          &Location,
        field:         &PlayingField<R>,
        max_speed_mps: f64,
        player:        &PlayerId,
        now:           DateTime<Utc>,
    ) -> Option<Location> {
        match self {
            Strategy::Stationary(s) => s.next_move(last, field, max_speed_mps, player, now),
            Strategy::LoopClosing(s) => s.next_move(last, field, max_speed_mps, player, now),
        }
    }
}
