//! Framework error type.
//!
//! Sub-crates define their own error enums and wrap `TnError` as one variant
//! via `#[from]`.

use thiserror::Error;

/// The base error type shared by the `tn-*` crates.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TnError {
    #[error("invalid coordinate ({lat}, {lon})")]
    InvalidCoordinate { lat: f64, lon: f64 },

    #[error("configuration error: {0}")]
    Config(String),
}

/// Shorthand result type for all `tn-*` crates.
pub type TnResult<T> = Result<T, TnError>;
