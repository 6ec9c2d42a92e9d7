//! Error types for kernel operations.

use brushwork_face::FaceError;
use thiserror::Error;

use crate::{EdgeId, FaceId, SideId, VertexId};

/// Errors that can occur when operating on a polyhedron.
///
/// Degenerate outcomes (redundant or nullifying cuts, blocked moves) are
/// not errors; they are reported in the outcome types.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum KernelError {
    /// The vertex handle does not belong to this polyhedron.
    #[error("stale vertex handle {0:?}")]
    StaleVertex(VertexId),

    /// The edge handle does not belong to this polyhedron.
    #[error("stale edge handle {0:?}")]
    StaleEdge(EdgeId),

    /// The side handle does not belong to this polyhedron.
    #[error("stale side handle {0:?}")]
    StaleSide(SideId),

    /// The face handle does not belong to this polyhedron.
    #[error("stale face handle {0:?}")]
    StaleFace(FaceId),

    /// The polyhedron was nullified by a cut and has no geometry left.
    #[error("polyhedron is empty")]
    Empty,

    /// A face could not be rebuilt after a transform.
    #[error("invalid face: {0}")]
    Face(#[from] FaceError),
}

/// Result type for kernel operations.
pub type Result<T> = std::result::Result<T, KernelError>;
