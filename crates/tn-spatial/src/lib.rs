//! `tn-spatial`: street network, spatial indexing, routing, and stitching.
//!
//! # Crate layout
//!
//! | Module         | Contents                                                      |
//! |----------------|---------------------------------------------------------------|
//! | [`projection`] | `LocalProjection`: geographic ⇄ planar metres                |
//! | [`network`]    | `StreetNetwork` (CSR + R-trees), `StreetNetworkBuilder`       |
//! | [`linework`]   | Arc-length helpers over planar polylines                      |
//! | [`view`]       | `GraphView` trait, `FilteredView` predicate view              |
//! | [`router`]     | `Router` trait, `Route`, `DijkstraRouter`                     |
//! | [`snap`]       | `snap` / `snap_geo`: project a point onto the nearest edge   |
//! | [`stitch`]     | `stitch`: connect two snapped points along the network       |
//! | [`error`]      | `SpatialError`, `SpatialResult<T>`                            |
//!
//! # Coordinates
//!
//! Everything in this crate works in the network's planar CRS (metres).
//! Geographic points enter and leave through [`LocalProjection`].
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                       |
//! |---------|--------------------------------------------------------------|
//! | `serde` | Derives `Serialize`/`Deserialize` on public data types.      |

pub mod error;
pub mod linework;
pub mod network;
pub mod projection;
pub mod router;
pub mod snap;
pub mod stitch;
pub mod view;


pub use error::{SpatialError, SpatialResult};
pub use network::{EdgeEnds, ORIENTATION_TOLERANCE_M, StreetNetwork, StreetNetworkBuilder};
pub use projection::LocalProjection;
pub use router::{DijkstraRouter, Route, Router};
pub use snap::{Snap, snap, snap_geo};
pub use stitch::{stitch, stitch_across_nodes, stitch_within_edge};
pub use view::{FilteredView, GraphView};
