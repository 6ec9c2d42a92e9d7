//! Merging coincident vertices, coplanar sides and collinear edges.
//!
//! These passes restore a minimal mesh after cuts, moves and snapping:
//! no two vertices coincide, no two adjacent sides are coplanar and no
//! vertex sits in the middle of a straight edge.

use std::collections::HashMap;

use brushwork_math::Point3;
use tracing::debug;

use crate::{FaceChanges, Polyhedron, SideId, VertexId};

impl Polyhedron {
    /// Merge `drop` into `keep`: every loop through `drop` now runs through
    /// `keep`. Sides that collapse below three vertices are removed.
    pub(crate) fn merge_vertices(
        &mut self,
        keep: VertexId,
        drop: VertexId,
        changes: &mut FaceChanges,
    ) {
        debug!(?keep, ?drop, "merging vertices");
        self.substitute_vertex(drop, keep, changes);
        self.vertices.remove(drop);
    }

    /// Merge vertices that coincide within tolerance; the lower handle
    /// survives. With `adjacent_only` only loop neighbours are compared.
    pub(crate) fn merge_coincident(&mut self, changes: &mut FaceChanges, adjacent_only: bool) {
        while let Some((keep, drop)) = self.find_coincident_pair(adjacent_only) {
            self.merge_vertices(keep, drop, changes);
        }
    }

    fn find_coincident_pair(&self, adjacent_only: bool) -> Option<(VertexId, VertexId)> {
        let tol = &self.tolerance;
        let ordered = |a: VertexId, b: VertexId| if a < b { (a, b) } else { (b, a) };
        if adjacent_only {
            for side in self.sides.values() {
                let n = side.vertices.len();
                for i in 0..n {
                    let a = side.vertices[i];
                    let b = side.vertices[(i + 1) % n];
                    if a != b
                        && tol.points_equal(&self.vertices[a].position, &self.vertices[b].position)
                    {
                        return Some(ordered(a, b));
                    }
                }
            }
            return None;
        }
        let verts: Vec<(VertexId, Point3)> =
            self.vertices.iter().map(|(id, v)| (id, v.position)).collect();
        for (i, (a, pa)) in verts.iter().enumerate() {
            for (b, pb) in &verts[i + 1..] {
                if tol.points_equal(pa, pb) {
                    return Some(ordered(*a, *b));
                }
            }
        }
        None
    }

    /// Run every merge pass until the mesh stops changing, then rebuild
    /// the edges.
    pub(crate) fn normalize(&mut self, changes: &mut FaceChanges) {
        loop {
            let mut changed = self.collapse_slivers(changes);
            self.rebuild_edges();
            changed |= self.merge_sides(changes);
            changed |= self.merge_edges();
            self.rebuild_edges();
            if !changed {
                break;
            }
        }
    }

    /// Remove zero-area sides.
    ///
    /// A sliver whose loop consists of one long edge and a chain of
    /// vertices lying on it is removed, and the chain's interior vertices
    /// are inserted into the neighbour across the long edge.
    pub(crate) fn collapse_slivers(&mut self, changes: &mut FaceChanges) -> bool {
        let mut changed = false;
        while let Some(sid) = self.find_sliver() {
            changed = true;
            let loop_ids = self.sides[sid].vertices.clone();
            let n = loop_ids.len();
            let (i, j) = self.farthest_pair(&loop_ids);
            // chain_a runs i -> j, chain_b runs j -> i, both inclusive
            let chain_a: Vec<VertexId> = (0..=((j + n - i) % n))
                .map(|k| loop_ids[(i + k) % n])
                .collect();
            let chain_b: Vec<VertexId> = (0..=((i + n - j) % n))
                .map(|k| loop_ids[(j + k) % n])
                .collect();

            // The long edge a -> b is traversed b -> a by the neighbour,
            // which receives the other chain (b -> ... -> a) in between.
            let (a, b, insert) = if chain_a.len() == 2 {
                (loop_ids[i], loop_ids[j], chain_b[1..chain_b.len() - 1].to_vec())
            } else if chain_b.len() == 2 {
                (loop_ids[j], loop_ids[i], chain_a[1..chain_a.len() - 1].to_vec())
            } else {
                // no single long edge; drop the sliver and let validation decide
                self.remove_side(sid, changes);
                continue;
            };

            let neighbour = self
                .sides
                .iter()
                .find(|(other, s)| *other != sid && s.has_directed(b, a))
                .map(|(other, _)| other);
            if let Some(nid) = neighbour {
                let side = &mut self.sides[nid];
                if let Some(pos) = side.index_of(b) {
                    for (k, &v) in insert.iter().enumerate() {
                        side.vertices.insert(pos + 1 + k, v);
                    }
                }
            }
            self.remove_side(sid, changes);
        }
        if changed {
            self.simplify_loops(changes);
        }
        changed
    }

    fn find_sliver(&self) -> Option<SideId> {
        self.sides.iter().find_map(|(sid, side)| {
            let (i, j) = self.farthest_pair(&side.vertices);
            let a = self.vertices[side.vertices[i]].position;
            let b = self.vertices[side.vertices[j]].position;
            let axis = (b - a).try_normalize(f64::EPSILON)?;
            side.vertices
                .iter()
                .all(|&v| {
                    let d = self.vertices[v].position - a;
                    (d - axis * d.dot(&axis)).norm() <= self.tolerance.linear
                })
                .then_some(sid)
        })
    }

    fn farthest_pair(&self, ids: &[VertexId]) -> (usize, usize) {
        let mut best = (0, 0, -1.0);
        for i in 0..ids.len() {
            for j in i + 1..ids.len() {
                let d = (self.vertices[ids[i]].position - self.vertices[ids[j]].position)
                    .norm_squared();
                if d > best.2 {
                    best = (i, j, d);
                }
            }
        }
        (best.0, best.1)
    }

    /// Merge adjacent coplanar sides whose normals agree.
    ///
    /// A face that existed before the current operation survives over a
    /// newly created one; otherwise the lower face handle survives.
    pub(crate) fn merge_sides(&mut self, changes: &mut FaceChanges) -> bool {
        let mut changed = false;
        while let Some((sa, sb, a, b)) = self.find_coplanar_pair() {
            changed = true;
            let la = self.sides[sa].vertices.clone();
            let lb = self.sides[sb].vertices.clone();
            // A runs a -> b; take A from b around to a, then B's interior
            // from a around to b.
            let ia = la.iter().position(|&v| v == b).unwrap_or(0);
            let mut merged: Vec<VertexId> = (0..la.len()).map(|k| la[(ia + k) % la.len()]).collect();
            let ib = lb.iter().position(|&v| v == a).unwrap_or(0);
            merged.extend((1..lb.len() - 1).map(|k| lb[(ib + k) % lb.len()]));
            crate::polyhedron::simplify_loop(&mut merged);

            let (fa, fb) = (self.sides[sa].face, self.sides[sb].face);
            let (survivor, loser) = match (fa, fb) {
                (Some(x), Some(y)) => {
                    let x_old = !changes.was_added(x);
                    let y_old = !changes.was_added(y);
                    if x_old != y_old {
                        if x_old {
                            (Some(x), Some(y))
                        } else {
                            (Some(y), Some(x))
                        }
                    } else if x < y {
                        (Some(x), Some(y))
                    } else {
                        (Some(y), Some(x))
                    }
                }
                (Some(x), None) => (Some(x), None),
                (None, y) => (y, None),
            };
            debug!(?sa, ?sb, ?survivor, "merging coplanar sides");

            self.sides[sa].vertices = merged;
            self.sides[sa].face = survivor;
            self.sides[sb].face = None;
            self.sides.remove(sb);
            if let Some(f) = loser {
                self.remove_face(f, changes);
            }
            self.rebuild_edges();
        }
        changed
    }

    /// Find adjacent sides `(A, B)` sharing an edge that `A` runs `a -> b`,
    /// lying in one plane with agreeing normals.
    fn find_coplanar_pair(&self) -> Option<(SideId, SideId, VertexId, VertexId)> {
        let tol = &self.tolerance;
        for edge in self.edges.values() {
            let (Some(sa), Some(sb)) = (edge.left, edge.right) else {
                continue;
            };
            if sa == sb {
                continue;
            }
            let (Some(pa), Some(pb)) = (
                self.loop_plane(&self.sides[sa].vertices),
                self.loop_plane(&self.sides[sb].vertices),
            ) else {
                continue;
            };
            if pa.normal.dot(&pb.normal) <= 0.0 {
                continue;
            }
            let flat = |plane: &brushwork_math::Plane, ids: &[VertexId]| {
                ids.iter()
                    .all(|&v| tol.is_zero(plane.signed_distance(&self.vertices[v].position)))
            };
            if flat(&pa, &self.sides[sb].vertices) && flat(&pb, &self.sides[sa].vertices) {
                return Some((sa, sb, edge.start, edge.end));
            }
        }
        None
    }

    /// Remove vertices shared by exactly two sides that lie on the straight
    /// line between their loop neighbours.
    pub(crate) fn merge_edges(&mut self) -> bool {
        let mut changed = false;
        loop {
            let mut degree: HashMap<VertexId, usize> = HashMap::new();
            for side in self.sides.values() {
                for &v in &side.vertices {
                    *degree.entry(v).or_insert(0) += 1;
                }
            }
            let target = degree
                .iter()
                .filter(|&(_, &d)| d == 2)
                .map(|(&v, _)| v)
                .filter(|&v| self.is_collinear_in_loops(v))
                .min();
            let Some(v) = target else {
                break;
            };
            debug!(vertex = ?v, "removing collinear vertex");
            for side in self.sides.values_mut() {
                side.vertices.retain(|&x| x != v);
            }
            self.vertices.remove(v);
            changed = true;
        }
        changed
    }

    fn is_collinear_in_loops(&self, v: VertexId) -> bool {
        self.sides.values().all(|side| {
            let Some(i) = side.index_of(v) else {
                return true;
            };
            let n = side.vertices.len();
            if n <= 3 {
                return false;
            }
            let prev = self.vertices[side.vertices[(i + n - 1) % n]].position;
            let next = self.vertices[side.vertices[(i + 1) % n]].position;
            self.is_between(&prev, &self.vertices[v].position, &next)
        })
    }

    /// Whether `p` lies on the segment `a..b` within tolerance.
    pub(crate) fn is_between(&self, a: &Point3, p: &Point3, b: &Point3) -> bool {
        let ab = b - a;
        let len = ab.norm();
        if len <= self.tolerance.linear {
            return false;
        }
        let axis = ab / len;
        let t = (p - a).dot(&axis);
        let off = (p - a) - axis * t;
        off.norm() <= self.tolerance.linear && t > 0.0 && t < len
    }

    /// Re-fit the plane of every face whose side no longer lies on it,
    /// using the loop's largest-area vertex triple.
    pub(crate) fn refresh_faces(&mut self) -> crate::Result<()> {
        let tol = self.tolerance;
        let side_ids: Vec<SideId> = self.sides.keys().collect();
        for sid in side_ids {
            let Some(face_id) = self.sides[sid].face else {
                continue;
            };
            let pts: Vec<Point3> = self.sides[sid]
                .vertices
                .iter()
                .map(|&v| self.vertices[v].position)
                .collect();
            let Some(face) = self.faces.get_mut(face_id) else {
                continue;
            };
            let plane = *face.boundary();
            if pts.iter().all(|p| tol.is_zero(plane.signed_distance(p))) {
                continue;
            }
            if let Some((p1, p2, p3)) = largest_triangle(&pts) {
                face.set_points(p1, p2, p3)?;
            }
        }
        Ok(())
    }
}

/// The vertex triple (in loop order) spanning the largest triangle.
fn largest_triangle(pts: &[Point3]) -> Option<(Point3, Point3, Point3)> {
    let n = pts.len();
    let mut best = None;
    let mut best_area = 0.0;
    for i in 0..n {
        for j in i + 1..n {
            for k in j + 1..n {
                let area = (pts[j] - pts[i]).cross(&(pts[k] - pts[i])).norm();
                if area > best_area {
                    best_area = area;
                    best = Some((pts[i], pts[j], pts[k]));
                }
            }
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use brushwork_math::{Aabb3, Tolerance, Vec3};

    fn unit_box() -> Polyhedron {
        Polyhedron::new(
            Aabb3::new(Point3::origin(), Point3::new(1.0, 1.0, 1.0)),
            Tolerance::DEFAULT,
        )
    }

    #[test]
    fn test_merge_sides_restores_quad() {
        let mut poly = unit_box();
        // split the top side along a diagonal
        let top = poly
            .sides()
            .find(|(id, _)| poly.side_plane(*id).unwrap().normal == Vec3::z())
            .map(|(id, _)| id)
            .unwrap();
        let quad = poly.sides[top].vertices.clone();
        poly.sides[top].vertices = vec![quad[0], quad[1], quad[2]];
        poly.sides.insert(crate::Side {
            vertices: vec![quad[0], quad[2], quad[3]],
            edges: Vec::new(),
            face: None,
        });
        poly.rebuild_edges();
        assert_eq!(poly.side_count(), 7);
        assert!(poly.closed());

        let mut changes = FaceChanges::default();
        assert!(poly.merge_sides(&mut changes));
        assert_eq!(poly.side_count(), 6);
        assert_eq!(poly.edge_count(), 12);
        assert!(poly.closed());
    }

    #[test]
    fn test_merge_edges_removes_midpoint() {
        let mut poly = unit_box();
        // insert the midpoint of one edge into both adjacent loops
        let edge = poly.edges().next().map(|(_, e)| e.clone()).unwrap();
        let mid = Point3::from(
            (poly.vertices[edge.start].position.coords + poly.vertices[edge.end].position.coords)
                * 0.5,
        );
        let m = poly.vertices.insert(crate::Vertex { position: mid });
        for side in poly.sides.values_mut() {
            let n = side.vertices.len();
            if let Some(i) = (0..n).find(|&i| {
                let (a, b) = (side.vertices[i], side.vertices[(i + 1) % n]);
                (a == edge.start && b == edge.end) || (a == edge.end && b == edge.start)
            }) {
                side.vertices.insert(i + 1, m);
            }
        }
        poly.rebuild_edges();
        assert_eq!(poly.edge_count(), 13);
        assert_eq!(poly.vertex_count(), 9);

        assert!(poly.merge_edges());
        poly.rebuild_edges();
        assert_eq!(poly.vertex_count(), 8);
        assert_eq!(poly.edge_count(), 12);
        assert!(poly.closed());
    }

    #[test]
    fn test_merge_coincident_keeps_lower_handle() {
        let mut poly = unit_box();
        let ids: Vec<VertexId> = poly.vertices().map(|(id, _)| id).collect();
        let (a, b) = (ids[0], ids[1]);
        let target = poly.vertices[a].position;
        poly.vertices[b].position = target;
        let mut changes = FaceChanges::default();
        poly.merge_coincident(&mut changes, false);
        poly.rebuild_edges();
        assert!(poly.vertices.contains_key(a.min(b)));
        assert_eq!(poly.vertex_count(), 7);
    }
}
