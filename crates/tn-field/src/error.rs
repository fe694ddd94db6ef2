use thiserror::Error;

use tn_core::TnError;
use tn_spatial::SpatialError;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum FieldError {
    #[error("spatial query failed: {0}")]
    Spatial(#[from] SpatialError),

    #[error(transparent)]
    Core(#[from] TnError),
}

pub type FieldResult<T> = Result<T, FieldError>;
