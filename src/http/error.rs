//! Request construction errors.

use thiserror::Error;

/// Errors that can occur while building or normalizing a request.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RequestError {
    /// The address could not be parsed into a location.
    #[error("invalid location {addr:?}: {reason}")]
    InvalidLocation { addr: String, reason: String },

    /// The scheme has no passthrough form.
    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    /// A URL had to be assembled from parts but none were given.
    #[error("no url parts to assemble")]
    EmptyUrlParts,

    /// The pre-sized scratch buffer was too small (a sizing bug, not bad input).
    #[error("scratch buffer overflow: need {needed} bytes, capacity {capacity}")]
    ScratchOverflow { needed: usize, capacity: usize },
}
