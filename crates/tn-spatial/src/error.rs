//! Spatial-subsystem error type.

use thiserror::Error;

use tn_core::{EdgeId, NodeId, TnError};

/// Errors produced by `tn-spatial`.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SpatialError {
    #[error("no edge near the query point (network has no edges)")]
    NoNearestEdge,

    #[error("no route from {from} to {to}")]
    NoRoute { from: NodeId, to: NodeId },

    #[error("node {0} not found in network")]
    NodeNotFound(NodeId),

    #[error("edge {0} not found in network")]
    EdgeNotFound(EdgeId),

    #[error(transparent)]
    Core(#[from] TnError),
}

pub type SpatialResult<T> = Result<T, SpatialError>;
