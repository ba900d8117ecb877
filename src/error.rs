//! Error types for fracture generation

use std::fmt;

/// Errors that can occur during fracture generation or backend calls
#[derive(Debug, Clone)]
pub enum FractureError {
    /// No enabled point source yielded any point.
    ///
    /// Recoverable: the caller may enable another source or report the
    /// condition to the user. Per-seed degenerate cells are NOT errors,
    /// they are silently omitted from the result.
    NoSourcePoints,
    /// Configuration validation failed (bad bounding box, margin below the
    /// positive minimum, empty seed list, degenerate wall face, ...)
    InvalidConfig(String),
    /// The external container backend rejected the input
    BackendFailure(String),
    /// Generation was abandoned through a cancel token
    Cancelled,
}

impl fmt::Display for FractureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FractureError::NoSourcePoints => write!(f, "no points found in any enabled source"),
            FractureError::InvalidConfig(msg) => write!(f, "invalid configuration: {}", msg),
            FractureError::BackendFailure(msg) => write!(f, "container backend failed: {}", msg),
            FractureError::Cancelled => write!(f, "generation cancelled"),
        }
    }
}

impl std::error::Error for FractureError {}

/// Result type alias for fracture operations
pub type Result<T> = std::result::Result<T, FractureError>;
