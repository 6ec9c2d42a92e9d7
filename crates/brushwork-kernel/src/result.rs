//! Outcome types returned by cuts and moves.

use crate::{FaceId, MeshElement, VertexId};

/// How a cut affected the polyhedron.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CutResult {
    /// No vertex lay outside the half-space; nothing changed.
    Redundant,
    /// No vertex lay inside the half-space; the polyhedron is now empty.
    Null,
    /// The polyhedron was split and its outside part removed.
    Split,
}

/// Faces gained and lost by one operation.
///
/// The two lists are net of each other: a face created and removed within
/// the same operation appears in neither.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FaceChanges {
    /// Faces created by the operation.
    pub added: Vec<FaceId>,
    /// Faces removed by the operation.
    pub dropped: Vec<FaceId>,
}

impl FaceChanges {
    /// Whether the operation left the face set unchanged.
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.dropped.is_empty()
    }

    /// Record a newly created face.
    pub fn add_face(&mut self, id: FaceId) {
        if !self.added.contains(&id) {
            self.added.push(id);
        }
    }

    /// Record a removed face, cancelling it out if it was added earlier.
    pub fn drop_face(&mut self, id: FaceId) {
        if let Some(pos) = self.added.iter().position(|&f| f == id) {
            self.added.remove(pos);
        } else if !self.dropped.contains(&id) {
            self.dropped.push(id);
        }
    }

    /// Whether `id` was created by this operation.
    pub fn was_added(&self, id: FaceId) -> bool {
        self.added.contains(&id)
    }

    /// Fold a later operation's changes into these.
    pub fn extend(&mut self, later: FaceChanges) {
        for id in later.added {
            self.add_face(id);
        }
        for id in later.dropped {
            self.drop_face(id);
        }
    }
}

/// Outcome of adding one face.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CutOutcome {
    /// What the cut did.
    pub result: CutResult,
    /// The new face's handle, if its side survived the cut.
    pub face: Option<FaceId>,
    /// Faces whose sides were cut away.
    pub dropped: Vec<FaceId>,
}

/// Outcome of adding a batch of faces.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FaceBatchOutcome {
    /// Net faces added and dropped over the whole batch.
    pub changes: FaceChanges,
    /// Input positions of faces that were redundant and discarded.
    pub redundant: Vec<usize>,
    /// Whether a face nullified the polyhedron (the batch stopped there).
    pub nullified: bool,
}

/// Outcome of re-cutting a polyhedron against new bounds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RebuildOutcome {
    /// Faces that no longer bound the solid and were discarded.
    pub redundant: Vec<FaceId>,
    /// Faces cut away by later faces.
    pub dropped: Vec<FaceId>,
    /// Whether a face nullified the polyhedron.
    pub nullified: bool,
}

/// Where a moved element ended up, and whether it moved at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveResult {
    /// Handle of the surviving element after merges.
    pub index: MeshElement,
    /// Whether the polyhedron changed.
    pub moved: bool,
}

/// Outcome of a vertex, edge or side move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveOutcome {
    /// The moved element.
    pub result: MoveResult,
    /// Faces created and removed by the move.
    pub changes: FaceChanges,
}

impl MoveOutcome {
    pub(crate) fn unmoved(index: MeshElement) -> Self {
        Self {
            result: MoveResult {
                index,
                moved: false,
            },
            changes: FaceChanges::default(),
        }
    }
}

/// Outcome of a lock-step group move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupMoveOutcome {
    /// Whether the group moved at all.
    pub moved: bool,
    /// The surviving handle of each moved vertex, in input order.
    pub vertices: Vec<VertexId>,
    /// Faces created and removed by the move.
    pub changes: FaceChanges,
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    #[test]
    fn test_face_changes_net_out() {
        let mut arena: SlotMap<FaceId, ()> = SlotMap::with_key();
        let a = arena.insert(());
        let b = arena.insert(());
        let mut changes = FaceChanges::default();
        changes.add_face(a);
        changes.drop_face(b);
        changes.drop_face(a);
        assert!(changes.added.is_empty());
        assert_eq!(changes.dropped, vec![b]);
    }
}
