//! Incremental construction: intersecting the polyhedron with half-spaces.

use std::collections::HashMap;

use brushwork_face::Face;
use brushwork_math::{centroid, Aabb3, PointStatus, Point3};
use slotmap::SecondaryMap;
use tracing::{debug, warn};

use crate::marks::{EdgeMark, SideMark, VertexMark};
use crate::{
    CutOutcome, CutResult, EdgeId, FaceBatchOutcome, FaceChanges, FaceId, Polyhedron,
    RebuildOutcome, Result, Side, SideId, Vertex, VertexId,
};

impl Polyhedron {
    /// Intersect the polyhedron with the half-space below `face`.
    ///
    /// A redundant face is not kept. A nullifying face empties the
    /// polyhedron and reports every previous face as dropped.
    pub fn add_face(&mut self, face: Face) -> Result<CutOutcome> {
        self.ensure_not_empty()?;
        let id = self.faces.insert(face);
        Ok(self.cut(id))
    }

    /// Add faces in order, stopping at the first one that nullifies.
    pub fn add_faces(&mut self, faces: impl IntoIterator<Item = Face>) -> Result<FaceBatchOutcome> {
        self.ensure_not_empty()?;
        let mut outcome = FaceBatchOutcome::default();
        for (i, face) in faces.into_iter().enumerate() {
            let cut = self.add_face(face)?;
            let mut changes = FaceChanges::default();
            if let Some(id) = cut.face {
                changes.add_face(id);
            }
            changes.dropped = cut.dropped;
            outcome.changes.extend(changes);
            match cut.result {
                CutResult::Redundant => outcome.redundant.push(i),
                CutResult::Null => {
                    outcome.nullified = true;
                    break;
                }
                CutResult::Split => {}
            }
        }
        Ok(outcome)
    }

    /// Re-seed from `bounds` and re-cut by every face already owned.
    ///
    /// Face handles persist. Faces that no longer bound the solid are
    /// discarded and reported.
    pub fn rebuild(&mut self, bounds: &Aabb3) -> RebuildOutcome {
        let face_ids: Vec<FaceId> = self.faces.keys().collect();
        self.seed(bounds);
        let mut outcome = RebuildOutcome::default();
        for id in face_ids {
            if !self.faces.contains_key(id) {
                continue;
            }
            let cut = self.cut(id);
            outcome.dropped.extend(cut.dropped);
            match cut.result {
                CutResult::Redundant => outcome.redundant.push(id),
                CutResult::Null => {
                    outcome.nullified = true;
                    break;
                }
                CutResult::Split => {}
            }
        }
        if outcome.nullified {
            self.faces.clear();
        }
        debug!(
            redundant = outcome.redundant.len(),
            dropped = outcome.dropped.len(),
            nullified = outcome.nullified,
            "rebuilt polyhedron"
        );
        outcome
    }

    /// Cut by a face already present in the face table.
    pub(crate) fn cut(&mut self, face_id: FaceId) -> CutOutcome {
        let plane = *self.faces[face_id].boundary();
        let tol = self.tolerance;

        let mut vertex_marks: SecondaryMap<VertexId, VertexMark> = SecondaryMap::new();
        let mut distances: SecondaryMap<VertexId, f64> = SecondaryMap::new();
        let (mut keep, mut drop) = (0usize, 0usize);
        for (id, v) in &self.vertices {
            let d = plane.signed_distance(&v.position);
            let mark = match tol.classify(d) {
                PointStatus::Above => {
                    drop += 1;
                    VertexMark::Drop
                }
                PointStatus::Below => {
                    keep += 1;
                    VertexMark::Keep
                }
                PointStatus::Inside => VertexMark::Undecided,
            };
            vertex_marks.insert(id, mark);
            distances.insert(id, d);
        }

        if drop == 0 {
            self.faces.remove(face_id);
            debug!(?face_id, "redundant cut");
            return CutOutcome {
                result: CutResult::Redundant,
                face: None,
                dropped: Vec::new(),
            };
        }

        if keep == 0 {
            let dropped: Vec<FaceId> = self
                .sides
                .values()
                .filter_map(|s| s.face)
                .filter(|&f| f != face_id)
                .collect();
            self.vertices.clear();
            self.edges.clear();
            self.sides.clear();
            self.faces.clear();
            self.face_sides.clear();
            self.bounds = Aabb3::empty();
            debug!(?face_id, dropped = dropped.len(), "cut nullified polyhedron");
            return CutOutcome {
                result: CutResult::Null,
                face: None,
                dropped,
            };
        }

        // Edges: classify and split.
        let mut side_marks: SecondaryMap<SideId, SideMark> = SecondaryMap::new();
        let mut edge_marks: SecondaryMap<EdgeId, EdgeMark> = SecondaryMap::new();
        let mut split_vertices: SecondaryMap<EdgeId, VertexId> = SecondaryMap::new();
        let edge_ids: Vec<EdgeId> = self.edges.keys().collect();
        for eid in edge_ids {
            let (start, end) = (self.edges[eid].start, self.edges[eid].end);
            let mark = EdgeMark::from_endpoints(
                vertex_marks.get(start).copied().unwrap_or_default(),
                vertex_marks.get(end).copied().unwrap_or_default(),
            );
            if mark == EdgeMark::Split {
                let (a, b) = (self.vertices[start].position, self.vertices[end].position);
                let (da, db) = (distances[start], distances[end]);
                let position = a + (b - a) * (da / (da - db));
                let nv = self.vertices.insert(Vertex { position });
                vertex_marks.insert(nv, VertexMark::New);
                split_vertices.insert(eid, nv);
                let edge = &self.edges[eid];
                for sid in [edge.left, edge.right].into_iter().flatten() {
                    side_marks.insert(sid, SideMark::Undecided);
                }
            }
            edge_marks.insert(eid, mark);
        }

        // Sides: re-loop through the split vertices.
        let mut changes = FaceChanges::default();
        let side_ids: Vec<SideId> = self.sides.keys().collect();
        for &sid in &side_ids {
            let side = &self.sides[sid];
            let mut new_loop = Vec::with_capacity(side.vertices.len() + 2);
            let mut has_keep = false;
            let mut touched = side_marks.get(sid) == Some(&SideMark::Undecided);
            for (i, &v) in side.vertices.iter().enumerate() {
                match vertex_marks.get(v).copied().unwrap_or_default() {
                    VertexMark::Drop => touched = true,
                    mark => {
                        has_keep |= mark == VertexMark::Keep;
                        new_loop.push(v);
                    }
                }
                let e = side.edges[i];
                if edge_marks[e] == EdgeMark::Split {
                    new_loop.push(split_vertices[e]);
                    touched = true;
                }
            }
            if new_loop.len() < 3 || !has_keep {
                side_marks.insert(sid, SideMark::Drop);
            } else {
                side_marks.insert(sid, if touched { SideMark::Split } else { SideMark::Keep });
                self.sides[sid].vertices = new_loop;
            }
        }
        for &sid in &side_ids {
            if side_marks.get(sid).copied().unwrap_or_default() == SideMark::Drop {
                self.remove_side(sid, &mut changes);
            }
        }

        // Closing side from the on-plane boundary segments, reversed.
        let mut segments: Vec<(VertexId, VertexId)> = Vec::new();
        for side in self.sides.values() {
            let n = side.vertices.len();
            for i in 0..n {
                let a = side.vertices[i];
                let b = side.vertices[(i + 1) % n];
                if vertex_marks[a].on_plane() && vertex_marks[b].on_plane() {
                    segments.push((a, b));
                }
            }
        }
        let open: Vec<(VertexId, VertexId)> = segments
            .iter()
            .copied()
            .filter(|&(a, b)| !segments.contains(&(b, a)))
            .collect();
        let cap = self
            .chain_cap(&open)
            .unwrap_or_else(|| self.sort_cap(&open, &plane.normal));

        if cap.len() >= 3 {
            let cap_side = self.sides.insert(Side {
                vertices: cap,
                edges: Vec::new(),
                face: Some(face_id),
            });
            side_marks.insert(cap_side, SideMark::New);
        }

        self.merge_coincident(&mut changes, true);
        self.rebuild_edges();
        self.restore_face_sides();
        self.update_bounds();

        let face = if self.face_sides.contains_key(face_id) {
            Some(face_id)
        } else {
            self.faces.remove(face_id);
            changes.dropped.retain(|&f| f != face_id);
            None
        };
        debug!(
            ?face_id,
            kept = face.is_some(),
            dropped = changes.dropped.len(),
            "split polyhedron"
        );
        CutOutcome {
            result: CutResult::Split,
            face,
            dropped: changes.dropped,
        }
    }

    /// Chain directed boundary segments `a -> b` into a loop running
    /// `b -> a`. `None` if they do not form exactly one cycle.
    fn chain_cap(&self, segments: &[(VertexId, VertexId)]) -> Option<Vec<VertexId>> {
        let mut next: HashMap<VertexId, VertexId> = HashMap::new();
        for &(a, b) in segments {
            if next.insert(b, a).is_some() {
                return None;
            }
        }
        let &(_, start) = segments.first()?;
        let mut cap = vec![start];
        let mut current = start;
        loop {
            let following = *next.get(&current)?;
            if following == start {
                break;
            }
            if cap.len() > segments.len() {
                return None;
            }
            cap.push(following);
            current = following;
        }
        (cap.len() == segments.len()).then_some(cap)
    }

    /// Fallback: order the on-plane vertices by angle around their centroid,
    /// counter-clockwise about `normal`.
    fn sort_cap(
        &self,
        segments: &[(VertexId, VertexId)],
        normal: &brushwork_math::Vec3,
    ) -> Vec<VertexId> {
        let mut ids: Vec<VertexId> = segments.iter().flat_map(|&(a, b)| [a, b]).collect();
        ids.sort();
        ids.dedup();
        if ids.len() < 3 {
            return Vec::new();
        }
        warn!(vertices = ids.len(), "cap loop did not chain, sorting by angle");
        let pts: Vec<Point3> = ids.iter().map(|&v| self.vertices[v].position).collect();
        let c = centroid(pts.iter());
        let frame = brushwork_math::Plane::from_normal_and_point(*normal, &c);
        let (u, v) = frame.tangent_frame();
        let mut keyed: Vec<(f64, VertexId)> = ids
            .iter()
            .zip(&pts)
            .map(|(&id, p)| {
                let d = p - c;
                (d.dot(&v).atan2(d.dot(&u)), id)
            })
            .collect();
        keyed.sort_by(|a, b| a.0.total_cmp(&b.0));
        keyed.into_iter().map(|(_, id)| id).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use brushwork_face::FaceAttributes;
    use brushwork_math::{Plane, Tolerance, Vec3};

    fn world() -> Polyhedron {
        Polyhedron::new(Aabb3::cube(16384.0), Tolerance::DEFAULT)
    }

    fn face(normal: Vec3, distance: f64) -> Face {
        Face::from_plane(Plane::new(normal, distance), FaceAttributes::default()).unwrap()
    }

    fn unit_cube_faces() -> Vec<Face> {
        vec![
            face(Vec3::x(), 1.0),
            face(-Vec3::x(), 0.0),
            face(Vec3::y(), 1.0),
            face(-Vec3::y(), 0.0),
            face(Vec3::z(), 1.0),
            face(-Vec3::z(), 0.0),
        ]
    }

    #[test]
    fn test_single_cut_splits_box() {
        let mut poly = world();
        let outcome = poly.add_face(face(Vec3::x(), 1.0)).unwrap();
        assert_eq!(outcome.result, CutResult::Split);
        assert!(outcome.face.is_some());
        assert!(outcome.dropped.is_empty());
        assert_eq!(poly.vertex_count(), 8);
        assert_eq!(poly.side_count(), 6);
        assert!(poly.closed());
        assert_relative_eq!(poly.bounds().max.x, 1.0);
    }

    #[test]
    fn test_cube_construction() {
        let mut poly = world();
        let outcome = poly.add_faces(unit_cube_faces()).unwrap();
        assert!(!outcome.nullified);
        assert!(outcome.redundant.is_empty());
        assert_eq!(outcome.changes.added.len(), 6);
        assert_eq!(poly.vertex_count(), 8);
        assert_eq!(poly.edge_count(), 12);
        assert_eq!(poly.side_count(), 6);
        assert!(poly.sides().all(|(_, s)| s.vertices.len() == 4 && s.face.is_some()));
        assert!(poly.validate().is_ok());
        assert_relative_eq!(poly.bounds().min, Point3::origin());
        assert_relative_eq!(poly.bounds().max, Point3::new(1.0, 1.0, 1.0));
    }

    #[test]
    fn test_cube_construction_any_order() {
        let mut faces = unit_cube_faces();
        faces.reverse();
        faces.swap(1, 4);
        let mut poly = world();
        poly.add_faces(faces).unwrap();
        assert_eq!(poly.vertex_count(), 8);
        assert_eq!(poly.edge_count(), 12);
        assert_eq!(poly.side_count(), 6);
        assert!(poly.closed());
    }

    #[test]
    fn test_redundant_cut_is_idempotent() {
        let mut poly = world();
        poly.add_faces(unit_cube_faces()).unwrap();
        let before: Vec<Point3> = poly.vertices().map(|(_, v)| v.position).collect();
        let outcome = poly.add_face(face(Vec3::x(), 1.0)).unwrap();
        assert_eq!(outcome.result, CutResult::Redundant);
        assert!(outcome.face.is_none());
        assert_eq!(poly.face_count(), 6);
        let after: Vec<Point3> = poly.vertices().map(|(_, v)| v.position).collect();
        assert_eq!(before, after);

        let outer = poly.add_face(face(Vec3::new(1.0, 1.0, 1.0), 10.0)).unwrap();
        assert_eq!(outer.result, CutResult::Redundant);
    }

    #[test]
    fn test_nullifying_cut() {
        let mut poly = world();
        poly.add_faces(unit_cube_faces()).unwrap();
        // keep x >= 2 only
        let outcome = poly.add_face(face(-Vec3::x(), -2.0)).unwrap();
        assert_eq!(outcome.result, CutResult::Null);
        assert_eq!(outcome.dropped.len(), 6);
        assert!(poly.is_empty());
        assert_eq!(poly.face_count(), 0);
        assert!(poly.add_face(face(Vec3::x(), 1.0)).is_err());
    }

    #[test]
    fn test_batch_stops_at_null() {
        let mut poly = world();
        let mut faces = unit_cube_faces();
        faces.push(face(-Vec3::x(), -2.0));
        faces.push(face(Vec3::y(), 0.5));
        let outcome = poly.add_faces(faces).unwrap();
        assert!(outcome.nullified);
        assert!(outcome.changes.added.is_empty());
        assert!(poly.is_empty());
    }

    #[test]
    fn test_cut_through_vertices() {
        let mut poly = world();
        poly.add_faces(unit_cube_faces()).unwrap();
        // plane through three cube corners removes the (1,1,1) corner
        let f = Face::from_points(
            Point3::new(1.0, 0.0, 1.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 1.0),
            FaceAttributes::default(),
        )
        .unwrap();
        let outcome = poly.add_face(f).unwrap();
        assert_eq!(outcome.result, CutResult::Split);
        assert!(outcome.dropped.is_empty());
        assert_eq!(poly.vertex_count(), 7);
        assert_eq!(poly.side_count(), 7);
        assert_eq!(poly.edge_count(), 12);
        assert!(poly.validate().is_ok());
    }

    #[test]
    fn test_cut_drops_face() {
        let mut poly = world();
        poly.add_faces(unit_cube_faces()).unwrap();
        let top = poly
            .faces()
            .find(|(_, f)| f.normal() == Vec3::z())
            .map(|(id, _)| id)
            .unwrap();
        // a lower ceiling replaces the old one
        let outcome = poly.add_face(face(Vec3::z(), 0.5)).unwrap();
        assert_eq!(outcome.result, CutResult::Split);
        assert_eq!(outcome.dropped, vec![top]);
        assert_eq!(poly.face_count(), 6);
        assert_relative_eq!(poly.bounds().max.z, 0.5);
    }

    #[test]
    fn test_rebuild_keeps_face_ids() {
        let mut poly = world();
        poly.add_faces(unit_cube_faces()).unwrap();
        let before: Vec<FaceId> = poly.faces().map(|(id, _)| id).collect();
        let outcome = poly.rebuild(&Aabb3::cube(4096.0));
        assert!(outcome.redundant.is_empty());
        assert!(!outcome.nullified);
        let after: Vec<FaceId> = poly.faces().map(|(id, _)| id).collect();
        assert_eq!(before, after);
        assert!(poly.validate().is_ok());
        for id in after {
            assert!(poly.face_side(id).is_some());
        }
    }

    #[test]
    fn test_broken_cap_chain_falls_back_to_angle_sort() {
        let mut poly = world();
        poly.add_faces(unit_cube_faces()).unwrap();
        let top = [
            Point3::new(0.0, 0.0, 1.0),
            Point3::new(1.0, 0.0, 1.0),
            Point3::new(1.0, 1.0, 1.0),
            Point3::new(0.0, 1.0, 1.0),
        ]
        .map(|p| poly.find_vertex(&p).unwrap());
        let segments = [(top[0], top[1]), (top[2], top[3])];
        assert!(poly.chain_cap(&segments).is_none());

        let cap = poly.sort_cap(&segments, &Vec3::z());
        assert_eq!(cap.len(), 4);
        for v in top {
            assert!(cap.contains(&v));
        }
        let plane = poly.loop_plane(&cap).unwrap();
        assert!(plane.normal.z > 0.99);
    }

    #[test]
    fn test_sort_cap_needs_three_vertices() {
        let mut poly = world();
        poly.add_faces(unit_cube_faces()).unwrap();
        let a = poly.find_vertex(&Point3::new(0.0, 0.0, 1.0)).unwrap();
        let b = poly.find_vertex(&Point3::new(1.0, 0.0, 1.0)).unwrap();
        assert!(poly.sort_cap(&[(a, b)], &Vec3::z()).is_empty());
    }
}
