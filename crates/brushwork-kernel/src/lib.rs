#![warn(missing_docs)]

//! Convex polyhedron boundary representation for brush editing.
//!
//! A [`Polyhedron`] starts as an axis-aligned seed box and is shaped by
//! intersecting it with [faces](brushwork_face::Face), one half-space at a
//! time. Once built, its vertices, edges and sides can be dragged while
//! the solid stays closed and convex, and the whole polyhedron can be
//! translated, rotated, mirrored and snapped to the integer grid.
//!
//! Operations follow a few rules:
//! 1. **Tolerance**: every classification goes through one
//!    [`Tolerance`](brushwork_math::Tolerance); a point within `linear` of
//!    a plane is on it.
//! 2. **Outcomes**: redundant cuts, nullifying cuts and blocked moves are
//!    reported in the returned outcome, never as errors.
//! 3. **Rollback**: a move that would break convexity or closure leaves
//!    the polyhedron untouched.
//! 4. **Face bookkeeping**: every structural edit reports the faces it
//!    added and dropped through [`FaceChanges`].

mod cut;
mod error;
pub mod marks;
mod merge;
mod mesh;
mod moves;
mod polyhedron;
mod query;
mod result;
mod transform;

pub use error::{KernelError, Result};
pub use mesh::{Edge, EdgeId, FaceId, MeshElement, Side, SideId, Vertex, VertexId};
pub use polyhedron::Polyhedron;
pub use result::{
    CutOutcome, CutResult, FaceBatchOutcome, FaceChanges, GroupMoveOutcome, MoveOutcome,
    MoveResult, RebuildOutcome,
};
