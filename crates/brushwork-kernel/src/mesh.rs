//! Mesh elements and their arena handles.

use brushwork_math::Point3;
use slotmap::new_key_type;

new_key_type! {
    /// Handle to a vertex in a polyhedron's vertex arena.
    pub struct VertexId;
    /// Handle to an edge in a polyhedron's edge arena.
    pub struct EdgeId;
    /// Handle to a side (polygonal boundary loop).
    pub struct SideId;
    /// Handle to a face (half-space). Stable across mesh edits.
    pub struct FaceId;
}

/// A mesh vertex.
#[derive(Debug, Clone, PartialEq)]
pub struct Vertex {
    /// Position in world space.
    pub position: Point3,
}

/// A mesh edge between two vertices.
///
/// `left` traverses `start -> end`; `right` traverses `end -> start`.
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    /// Start vertex.
    pub start: VertexId,
    /// End vertex.
    pub end: VertexId,
    /// The side whose loop runs from `start` to `end`.
    pub left: Option<SideId>,
    /// The side whose loop runs from `end` to `start`.
    pub right: Option<SideId>,
}

impl Edge {
    /// Whether the edge joins `a` and `b` in either direction.
    pub fn connects(&self, a: VertexId, b: VertexId) -> bool {
        (self.start == a && self.end == b) || (self.start == b && self.end == a)
    }
}

/// A planar convex polygon on the boundary of the polyhedron.
///
/// `edges[i]` joins `vertices[i]` and `vertices[(i + 1) % n]`. The loop is
/// counter-clockwise seen from outside.
#[derive(Debug, Clone, PartialEq)]
pub struct Side {
    /// Vertex loop.
    pub vertices: Vec<VertexId>,
    /// Edge loop, parallel to `vertices`.
    pub edges: Vec<EdgeId>,
    /// The face this side lies on; `None` only for sides of the seed box.
    pub face: Option<FaceId>,
}

impl Side {
    /// Position of `v` in the loop.
    pub fn index_of(&self, v: VertexId) -> Option<usize> {
        self.vertices.iter().position(|&x| x == v)
    }

    /// Whether the loop runs directly from `a` to `b`.
    pub fn has_directed(&self, a: VertexId, b: VertexId) -> bool {
        let n = self.vertices.len();
        (0..n).any(|i| self.vertices[i] == a && self.vertices[(i + 1) % n] == b)
    }

    /// The loop rotated so that `v` comes first.
    pub fn rotated_to(&self, v: VertexId) -> Option<Vec<VertexId>> {
        let i = self.index_of(v)?;
        let mut out = self.vertices[i..].to_vec();
        out.extend_from_slice(&self.vertices[..i]);
        Some(out)
    }
}

/// A reference to one mesh element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MeshElement {
    /// A vertex.
    Vertex(VertexId),
    /// An edge.
    Edge(EdgeId),
    /// A side.
    Side(SideId),
}
