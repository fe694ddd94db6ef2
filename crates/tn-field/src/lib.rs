//! `tn-field`: the playing field: registered players, their positions, and
//! the trajectories they leave behind.
//!
//! # Crate layout
//!
//! | Module         | Contents                                                      |
//! |----------------|---------------------------------------------------------------|
//! | [`trajectory`] | `Trajectory`: append-only geographic polyline, `BoundaryMatch` |
//! | [`field`]      | `PlayingField<R>`, `FieldConfig`, `UpdateOutcome`             |
//! | [`error`]      | `FieldError`, `FieldResult<T>`                                |
//!
//! # Update pipeline
//!
//! Every accepted move goes through the same steps:
//!
//! 1. The previous position (trajectory end, else start location) and the
//!    requested position are snapped onto the street network.
//! 2. The two snaps are stitched into one on-network polyline
//!    ([`tn_spatial::stitch`]).
//! 3. The polyline is converted back to geographic coordinates and merged
//!    into the player's [`Trajectory`].
//!
//! A move with no connecting path leaves all state untouched and reports
//! [`UpdateOutcome::NoPath`].

pub mod error;
pub mod field;
pub mod trajectory;


pub use error::{FieldError, FieldResult};
pub use field::{FieldConfig, PlayingField, UpdateOutcome};
pub use trajectory::{BoundaryMatch, Trajectory};
