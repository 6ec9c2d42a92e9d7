//! The polyhedron container: arenas, construction and structural upkeep.

use std::collections::{HashMap, HashSet};

use brushwork_face::Face;
use brushwork_math::{centroid, newell_normal, Aabb3, Plane, Point3, Tolerance};
use slotmap::{SecondaryMap, SlotMap};

use crate::{
    Edge, EdgeId, FaceChanges, FaceId, KernelError, Result, Side, SideId, Vertex, VertexId,
};

// Seed box loops over corners indexed x | y << 1 | z << 2, counter-clockwise
// seen from outside: -X, +X, -Y, +Y, -Z, +Z.
const SEED_LOOPS: [[usize; 4]; 6] = [
    [0, 4, 6, 2],
    [1, 3, 7, 5],
    [0, 1, 5, 4],
    [2, 6, 7, 3],
    [0, 2, 3, 1],
    [4, 5, 7, 6],
];

/// A convex polyhedron in boundary representation.
///
/// Starts as an axis-aligned seed box and is shaped by cutting it with
/// faces. Every public operation leaves it either a closed convex
/// 2-manifold or empty (after a nullifying cut).
#[derive(Debug, Clone)]
pub struct Polyhedron {
    pub(crate) vertices: SlotMap<VertexId, Vertex>,
    pub(crate) edges: SlotMap<EdgeId, Edge>,
    pub(crate) sides: SlotMap<SideId, Side>,
    pub(crate) faces: SlotMap<FaceId, Face>,
    pub(crate) face_sides: SecondaryMap<FaceId, SideId>,
    pub(crate) bounds: Aabb3,
    pub(crate) tolerance: Tolerance,
}

fn unordered(a: VertexId, b: VertexId) -> (VertexId, VertexId) {
    if a < b {
        (a, b)
    } else {
        (b, a)
    }
}

impl Polyhedron {
    /// Create the seed box spanning `bounds`.
    pub fn new(bounds: Aabb3, tolerance: Tolerance) -> Self {
        let mut poly = Self {
            vertices: SlotMap::with_key(),
            edges: SlotMap::with_key(),
            sides: SlotMap::with_key(),
            faces: SlotMap::with_key(),
            face_sides: SecondaryMap::new(),
            bounds,
            tolerance,
        };
        poly.seed(&bounds);
        poly
    }

    /// Replace all geometry with the box spanning `bounds`. Faces are kept.
    pub(crate) fn seed(&mut self, bounds: &Aabb3) {
        self.vertices.clear();
        self.edges.clear();
        self.sides.clear();
        self.face_sides.clear();
        let corners: Vec<VertexId> = bounds
            .corners()
            .iter()
            .map(|&position| self.vertices.insert(Vertex { position }))
            .collect();
        for seed_loop in SEED_LOOPS {
            self.sides.insert(Side {
                vertices: seed_loop.iter().map(|&i| corners[i]).collect(),
                edges: Vec::new(),
                face: None,
            });
        }
        self.rebuild_edges();
        self.update_bounds();
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// The tolerance policy used by every classification.
    pub fn tolerance(&self) -> &Tolerance {
        &self.tolerance
    }

    /// Tight bounds over all vertices.
    pub fn bounds(&self) -> &Aabb3 {
        &self.bounds
    }

    /// Whether a cut nullified the polyhedron.
    pub fn is_empty(&self) -> bool {
        self.sides.is_empty()
    }

    /// Number of vertices.
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of edges.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Number of sides.
    pub fn side_count(&self) -> usize {
        self.sides.len()
    }

    /// Number of faces.
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// All vertices.
    pub fn vertices(&self) -> impl Iterator<Item = (VertexId, &Vertex)> {
        self.vertices.iter()
    }

    /// All edges.
    pub fn edges(&self) -> impl Iterator<Item = (EdgeId, &Edge)> {
        self.edges.iter()
    }

    /// All sides.
    pub fn sides(&self) -> impl Iterator<Item = (SideId, &Side)> {
        self.sides.iter()
    }

    /// All faces.
    pub fn faces(&self) -> impl Iterator<Item = (FaceId, &Face)> {
        self.faces.iter()
    }

    /// Look up a vertex.
    pub fn vertex(&self, id: VertexId) -> Result<&Vertex> {
        self.vertices.get(id).ok_or(KernelError::StaleVertex(id))
    }

    /// Look up an edge.
    pub fn edge(&self, id: EdgeId) -> Result<&Edge> {
        self.edges.get(id).ok_or(KernelError::StaleEdge(id))
    }

    /// Look up a side.
    pub fn side(&self, id: SideId) -> Result<&Side> {
        self.sides.get(id).ok_or(KernelError::StaleSide(id))
    }

    /// Look up a face.
    pub fn face(&self, id: FaceId) -> Result<&Face> {
        self.faces.get(id).ok_or(KernelError::StaleFace(id))
    }

    /// Mutable access to a face's texture attributes.
    pub fn face_attributes_mut(
        &mut self,
        id: FaceId,
    ) -> Result<&mut brushwork_face::FaceAttributes> {
        self.faces
            .get_mut(id)
            .map(Face::attributes_mut)
            .ok_or(KernelError::StaleFace(id))
    }

    /// Position of a vertex.
    pub fn position(&self, id: VertexId) -> Result<Point3> {
        Ok(self.vertex(id)?.position)
    }

    /// The side lying on `face`.
    pub fn face_side(&self, face: FaceId) -> Option<SideId> {
        self.face_sides.get(face).copied()
    }

    /// Positions of a side's loop.
    pub fn side_points(&self, id: SideId) -> Result<Vec<Point3>> {
        let side = self.side(id)?;
        Ok(side
            .vertices
            .iter()
            .map(|&v| self.vertices[v].position)
            .collect())
    }

    /// The plane a side lies on: its face's boundary, or the best-fit plane
    /// of its loop for faceless seed sides.
    pub fn side_plane(&self, id: SideId) -> Result<Plane> {
        let side = self.side(id)?;
        if let Some(face) = side.face.and_then(|f| self.faces.get(f)) {
            return Ok(*face.boundary());
        }
        self.loop_plane(&side.vertices)
            .ok_or(KernelError::StaleSide(id))
    }

    /// Best-fit plane of a vertex loop: Newell normal through the centroid.
    pub(crate) fn loop_plane(&self, ids: &[VertexId]) -> Option<Plane> {
        let pts: Vec<Point3> = ids.iter().map(|&v| self.vertices[v].position).collect();
        let n = newell_normal(pts.iter()).try_normalize(f64::EPSILON)?;
        Some(Plane::from_normal_and_point(n, &centroid(pts.iter())))
    }

    pub(crate) fn ensure_not_empty(&self) -> Result<()> {
        if self.is_empty() {
            Err(KernelError::Empty)
        } else {
            Ok(())
        }
    }

    // =========================================================================
    // Structural upkeep
    // =========================================================================

    /// Re-derive edges from side loops.
    ///
    /// Existing edge handles are reused for vertex pairs that still exist.
    /// The first side to traverse a pair becomes the edge's `left`, the
    /// second its `right`. Unused edges and unreferenced vertices are freed.
    pub(crate) fn rebuild_edges(&mut self) {
        let mut by_pair: HashMap<(VertexId, VertexId), EdgeId> = self
            .edges
            .iter()
            .map(|(id, e)| (unordered(e.start, e.end), id))
            .collect();
        let mut used: SecondaryMap<EdgeId, ()> = SecondaryMap::new();

        let side_ids: Vec<SideId> = self.sides.keys().collect();
        for sid in side_ids {
            let loop_ids = self.sides[sid].vertices.clone();
            let n = loop_ids.len();
            let mut side_edges = Vec::with_capacity(n);
            for i in 0..n {
                let a = loop_ids[i];
                let b = loop_ids[(i + 1) % n];
                let key = unordered(a, b);
                let eid = match by_pair.get(&key) {
                    Some(&e) => e,
                    None => {
                        let e = self.edges.insert(Edge {
                            start: a,
                            end: b,
                            left: None,
                            right: None,
                        });
                        by_pair.insert(key, e);
                        e
                    }
                };
                let edge = &mut self.edges[eid];
                if used.insert(eid, ()).is_none() {
                    edge.start = a;
                    edge.end = b;
                    edge.left = Some(sid);
                    edge.right = None;
                } else {
                    edge.right = Some(sid);
                }
                side_edges.push(eid);
            }
            self.sides[sid].edges = side_edges;
        }

        self.edges.retain(|id, _| used.contains_key(id));
        self.collect_garbage();
    }

    /// Free vertices no side references.
    pub(crate) fn collect_garbage(&mut self) {
        let referenced: HashSet<VertexId> = self
            .sides
            .values()
            .flat_map(|s| s.vertices.iter().copied())
            .collect();
        self.vertices.retain(|id, _| referenced.contains(&id));
    }

    /// Rebuild the face -> side map from the sides.
    pub fn restore_face_sides(&mut self) {
        self.face_sides.clear();
        for (sid, side) in &self.sides {
            if let Some(face) = side.face {
                self.face_sides.insert(face, sid);
            }
        }
    }

    /// Recompute the tight bounds over all vertices.
    pub(crate) fn update_bounds(&mut self) {
        self.bounds = Aabb3::from_points(self.vertices.values().map(|v| &v.position));
    }

    /// Remove a side, dropping its face.
    pub(crate) fn remove_side(&mut self, sid: SideId, changes: &mut FaceChanges) {
        if let Some(side) = self.sides.remove(sid) {
            if let Some(face) = side.face {
                self.remove_face(face, changes);
            }
        }
    }

    /// Remove a face from the table and record it as dropped.
    pub(crate) fn remove_face(&mut self, face: FaceId, changes: &mut FaceChanges) {
        if self.faces.remove(face).is_some() {
            self.face_sides.remove(face);
            changes.drop_face(face);
        }
    }

    /// Insert a copy of `face` and record it as added.
    pub(crate) fn clone_face(
        &mut self,
        face: Option<FaceId>,
        changes: &mut FaceChanges,
    ) -> Option<FaceId> {
        let copy = self.faces.get(face?)?.clone();
        let id = self.faces.insert(copy);
        changes.add_face(id);
        Some(id)
    }

    /// Replace every occurrence of `from` with `to` in all loops, then
    /// clean the loops up and drop sides that collapsed.
    pub(crate) fn substitute_vertex(
        &mut self,
        from: VertexId,
        to: VertexId,
        changes: &mut FaceChanges,
    ) {
        for side in self.sides.values_mut() {
            for v in side.vertices.iter_mut() {
                if *v == from {
                    *v = to;
                }
            }
        }
        self.simplify_loops(changes);
    }

    /// Remove repeated vertices and spikes from every loop and drop sides
    /// left with fewer than three vertices.
    pub(crate) fn simplify_loops(&mut self, changes: &mut FaceChanges) {
        let mut collapsed = Vec::new();
        for (sid, side) in self.sides.iter_mut() {
            simplify_loop(&mut side.vertices);
            if side.vertices.len() < 3 {
                collapsed.push(sid);
            }
        }
        for sid in collapsed {
            self.remove_side(sid, changes);
        }
    }

    // =========================================================================
    // Validity
    // =========================================================================

    /// Whether the mesh is a closed 2-manifold.
    ///
    /// Every loop has at least three distinct vertices, every directed vertex
    /// pair occurs exactly once and has its reverse, and every edge has both
    /// incident sides consistent with the loops.
    pub fn closed(&self) -> bool {
        if self.sides.is_empty() {
            return false;
        }
        let mut directed: HashSet<(VertexId, VertexId)> = HashSet::new();
        for side in self.sides.values() {
            let n = side.vertices.len();
            if n < 3 || side.edges.len() != n {
                return false;
            }
            for i in 0..n {
                let a = side.vertices[i];
                let b = side.vertices[(i + 1) % n];
                if a == b || !self.vertices.contains_key(a) || !directed.insert((a, b)) {
                    return false;
                }
                match self.edges.get(side.edges[i]) {
                    Some(e) if e.connects(a, b) => {}
                    _ => return false,
                }
            }
        }
        if directed.iter().any(|&(a, b)| !directed.contains(&(b, a))) {
            return false;
        }
        if self.edges.len() * 2 != directed.len() {
            return false;
        }
        self.edges.values().all(|e| {
            let left = e.left.and_then(|s| self.sides.get(s));
            let right = e.right.and_then(|s| self.sides.get(s));
            match (left, right) {
                (Some(l), Some(r)) => l.has_directed(e.start, e.end) && r.has_directed(e.end, e.start),
                _ => false,
            }
        })
    }

    /// Whether every vertex lies on or behind every side's plane.
    pub fn is_convex(&self) -> bool {
        self.sides.values().all(|side| match self.loop_plane(&side.vertices) {
            Some(plane) => self.vertices.values().all(|v| {
                plane.signed_distance(&v.position) <= self.tolerance.linear
            }),
            None => false,
        })
    }

    /// Full structural and geometric validation.
    ///
    /// Returns a description of the first violated property.
    pub fn validate(&self) -> std::result::Result<(), String> {
        let tol = &self.tolerance;
        if !self.closed() {
            return Err("mesh is not closed".into());
        }
        if self.sides.len() < 4 {
            return Err(format!("only {} sides", self.sides.len()));
        }

        let mut degree: HashMap<VertexId, usize> = HashMap::new();
        for side in self.sides.values() {
            for &v in &side.vertices {
                *degree.entry(v).or_insert(0) += 1;
            }
        }
        if let Some((v, d)) = degree.iter().find(|(_, &d)| d < 3) {
            return Err(format!("vertex {:?} has degree {}", v, d));
        }

        let verts: Vec<(VertexId, Point3)> =
            self.vertices.iter().map(|(id, v)| (id, v.position)).collect();
        for (i, (a, pa)) in verts.iter().enumerate() {
            for (b, pb) in &verts[i + 1..] {
                if tol.points_equal(pa, pb) {
                    return Err(format!("vertices {:?} and {:?} coincide", a, b));
                }
            }
        }

        for (sid, side) in &self.sides {
            let plane = self
                .loop_plane(&side.vertices)
                .ok_or_else(|| format!("side {:?} has no area", sid))?;
            for &v in &side.vertices {
                if !tol.is_zero(plane.signed_distance(&self.vertices[v].position)) {
                    return Err(format!("side {:?} is not planar", sid));
                }
            }
            for (_, p) in &verts {
                if plane.signed_distance(p) > tol.linear {
                    return Err(format!("side {:?} is not convex", sid));
                }
            }
        }

        let mut seen: HashSet<FaceId> = HashSet::new();
        for side in self.sides.values() {
            if let Some(face) = side.face {
                if !self.faces.contains_key(face) || !seen.insert(face) {
                    return Err(format!("face {:?} is missing or shared", face));
                }
            }
        }
        if seen.len() != self.faces.len() {
            return Err("face table holds faces without sides".into());
        }
        Ok(())
    }
}

/// Drop consecutive duplicates and `a, b, a` spikes from a cyclic loop.
pub(crate) fn simplify_loop(ids: &mut Vec<VertexId>) {
    loop {
        let n = ids.len();
        if n < 3 {
            ids.dedup();
            if ids.len() > 1 && ids.first() == ids.last() {
                ids.pop();
            }
            return;
        }
        if let Some(i) = (0..n).find(|&i| ids[i] == ids[(i + 1) % n]) {
            ids.remove(i);
            continue;
        }
        if let Some(i) = (0..n).find(|&i| ids[i] == ids[(i + 2) % n]) {
            // a, b, a: remove b and the second a
            let b = (i + 1) % n;
            let a2 = (i + 2) % n;
            let (first, second) = if b > a2 { (b, a2) } else { (a2, b) };
            ids.remove(first);
            ids.remove(second);
            continue;
        }
        return;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_box() -> Polyhedron {
        Polyhedron::new(
            Aabb3::new(Point3::origin(), Point3::new(1.0, 1.0, 1.0)),
            Tolerance::DEFAULT,
        )
    }

    #[test]
    fn test_seed_box_is_closed() {
        let poly = unit_box();
        assert_eq!(poly.vertex_count(), 8);
        assert_eq!(poly.edge_count(), 12);
        assert_eq!(poly.side_count(), 6);
        assert_eq!(poly.face_count(), 0);
        assert!(poly.closed());
        assert!(poly.is_convex());
    }

    #[test]
    fn test_seed_loops_face_outward() {
        let poly = unit_box();
        let center = Point3::new(0.5, 0.5, 0.5);
        for (sid, _) in poly.sides() {
            let plane = poly.side_plane(sid).unwrap();
            assert!(plane.signed_distance(&center) < 0.0);
        }
    }

    #[test]
    fn test_rebuild_edges_reuses_handles() {
        let mut poly = unit_box();
        let before: HashSet<EdgeId> = poly.edges().map(|(id, _)| id).collect();
        poly.rebuild_edges();
        let after: HashSet<EdgeId> = poly.edges().map(|(id, _)| id).collect();
        assert_eq!(before, after);
        assert!(poly.closed());
    }

    #[test]
    fn test_simplify_loop() {
        let mut arena: SlotMap<VertexId, ()> = SlotMap::with_key();
        let a = arena.insert(());
        let b = arena.insert(());
        let c = arena.insert(());
        let d = arena.insert(());

        let mut ids = vec![a, b, b, c, a];
        simplify_loop(&mut ids);
        assert_eq!(ids, vec![a, b, c]);

        let mut spike = vec![a, b, c, d, c];
        simplify_loop(&mut spike);
        assert_eq!(spike, vec![a, b, c]);
    }
}
