//! `tn-movement`: movement strategies and the players that use them.
//!
//! # Crate layout
//!
//! | Module           | Contents                                                   |
//! |------------------|------------------------------------------------------------|
//! | [`strategy`]     | `MovementStrategy` trait, `Strategy` enum                  |
//! | [`stationary`]   | `StationaryStrategy`: never moves                         |
//! | [`loop_closing`] | `LoopClosingStrategy`, `LoopConfig`, `LoopPhase`           |
//! | [`player`]       | `Player`: id, name, speed cap, owned strategy             |
//!
//! # Decision / apply split
//!
//! A move happens in two steps:
//!
//! 1. **Decide**: [`MovementStrategy::next_move`] reads the
//!    [`PlayingField`][tn_field::PlayingField] and proposes a location, or
//!    `None` when no movement is possible.
//! 2. **Apply**: [`Player::move_on`] hands the proposal to
//!    [`PlayingField::update_current_location`][tn_field::PlayingField::update_current_location],
//!    which snaps, stitches and records it.
//!
//! Strategies never write to the field; all writes go through step 2.

pub mod loop_closing;
pub mod player;
pub mod stationary;
pub mod strategy;

#[cfg(test)]
mod tests;

pub use loop_closing::{LoopClosingStrategy, LoopConfig, LoopPhase};
pub use player::Player;
pub use stationary::StationaryStrategy;
pub use strategy::{MovementStrategy, Strategy};
