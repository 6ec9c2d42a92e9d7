//! Per-operation classification marks.
//!
//! Marks never live on the elements themselves; each operation builds
//! `SecondaryMap` side tables and drops them when it returns.

/// Classification of a vertex against a cutting plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VertexMark {
    /// Above the plane: removed by the cut.
    Drop,
    /// Below the plane: survives the cut.
    Keep,
    /// On the plane.
    Undecided,
    /// Created by the cut at a split edge.
    New,
    /// Not in the side table.
    #[default]
    Unknown,
}

impl VertexMark {
    /// Whether the vertex lies on the cutting plane after the cut.
    pub fn on_plane(self) -> bool {
        matches!(self, VertexMark::Undecided | VertexMark::New)
    }
}

/// Classification of an edge derived from its endpoint marks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EdgeMark {
    /// Entirely kept (possibly touching the plane).
    Keep,
    /// Entirely dropped (possibly touching the plane).
    Drop,
    /// Crosses the plane.
    Split,
    /// Both endpoints on the plane.
    Undecided,
    /// Runs along the plane through a vertex created by the cut.
    New,
    /// An endpoint is unclassified.
    #[default]
    Unknown,
}

impl EdgeMark {
    /// Combine the marks of an edge's endpoints.
    pub fn from_endpoints(start: VertexMark, end: VertexMark) -> Self {
        use VertexMark as V;
        match (start, end) {
            (V::Unknown, _) | (_, V::Unknown) => EdgeMark::Unknown,
            (V::Keep, V::Drop) | (V::Drop, V::Keep) => EdgeMark::Split,
            (V::Keep, _) | (_, V::Keep) => EdgeMark::Keep,
            (V::Drop, _) | (_, V::Drop) => EdgeMark::Drop,
            (V::Undecided, V::Undecided) => EdgeMark::Undecided,
            _ => EdgeMark::New,
        }
    }
}

/// Classification of a side during a cut.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SideMark {
    /// Unchanged by the cut.
    Keep,
    /// Removed by the cut.
    Drop,
    /// Re-looped through new vertices.
    Split,
    /// The closing side created on the cutting plane.
    New,
    /// Bounded by a split edge and not yet re-looped.
    Undecided,
    /// Not in the side table.
    #[default]
    Unknown,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edge_mark_from_endpoints() {
        use VertexMark as V;
        assert_eq!(EdgeMark::from_endpoints(V::Keep, V::Drop), EdgeMark::Split);
        assert_eq!(EdgeMark::from_endpoints(V::Undecided, V::Keep), EdgeMark::Keep);
        assert_eq!(EdgeMark::from_endpoints(V::Drop, V::Undecided), EdgeMark::Drop);
        assert_eq!(
            EdgeMark::from_endpoints(V::Undecided, V::Undecided),
            EdgeMark::Undecided
        );
        assert_eq!(EdgeMark::from_endpoints(V::New, V::Undecided), EdgeMark::New);
        assert_eq!(EdgeMark::from_endpoints(V::New, V::Keep), EdgeMark::Keep);
        assert_eq!(EdgeMark::from_endpoints(V::Drop, V::New), EdgeMark::Drop);
        assert_eq!(EdgeMark::from_endpoints(V::Unknown, V::Keep), EdgeMark::Unknown);
        assert_eq!(EdgeMark::default(), EdgeMark::Unknown);
    }

    #[test]
    fn test_on_plane() {
        assert!(VertexMark::Undecided.on_plane());
        assert!(VertexMark::New.on_plane());
        assert!(!VertexMark::Keep.on_plane());
        assert!(!VertexMark::Drop.on_plane());
        assert!(!VertexMark::default().on_plane());
    }
}
