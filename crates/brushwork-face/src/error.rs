//! Error types for face construction.

use thiserror::Error;

/// Errors that can occur when building or editing a face.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FaceError {
    /// The three defining points do not span a plane.
    #[error("face points are collinear")]
    CollinearPoints,

    /// A coordinate or plane component is NaN or infinite.
    #[error("non-finite face input: {0}")]
    NonFinite(String),
}

/// Result type for face operations.
pub type Result<T> = std::result::Result<T, FaceError>;
