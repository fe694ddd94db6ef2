//! `tn-core`: foundational types for the `trailnet` movement engine.
//!
//! This crate is a dependency of every other `tn-*` crate.  It has no `tn-*`
//! dependencies and minimal external ones (`chrono` and `thiserror`, plus
//! optional `serde`).
//!
//! # What lives here
//!
//! | Module          | Contents                                              |
//! |-----------------|-------------------------------------------------------|
//! | [`ids`]         | `NodeId`, `EdgeId`, `PlayerId`                        |
//! | [`geo`]         | `GeoPoint`, haversine distance                        |
//! | [`location`]    | `Location`: a `GeoPoint` stamped with a UTC instant  |
//! | [`error`]       | `TnError`, `TnResult`                                 |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public types.        |

pub mod error;
pub mod geo;
pub mod ids;
pub mod location;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use error::{TnError, TnResult};
pub use geo::GeoPoint;
pub use ids::{EdgeId, NodeId, PlayerId};
pub use location::Location;
