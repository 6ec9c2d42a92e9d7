//! Dragging vertices, edges and sides.
//!
//! A vertex drag first splits every incident side into triangles around
//! the vertex, then clamps the drag so that no triangle flips and no other
//! vertex ends up outside the solid, moves the vertex, merges what became
//! coincident or coplanar and validates the result. Any failure restores
//! the polyhedron exactly as it was.

use brushwork_math::{centroid, Point3, Vec3};
use tracing::{debug, trace, warn};

use crate::{
    FaceChanges, GroupMoveOutcome, MeshElement, MoveOutcome, MoveResult, Polyhedron, Result,
    Side, SideId, Vertex, VertexId,
};

/// Why a drag was abandoned.
#[derive(Debug)]
enum Rejection {
    /// Another element blocks the way.
    Blocked,
    /// The vertex landed on another vertex and merging is disabled.
    Coincident,
    /// The moved vertex disappeared into an edge or side.
    Absorbed,
    /// The resulting mesh failed validation.
    Invalid(String),
}

/// One successful vertex drag.
struct Step {
    vertex: VertexId,
    distance: f64,
}

/// How far one lock-step pass got.
enum GroupStep {
    /// Every vertex travelled the full distance; pairs of starting and
    /// surviving handles.
    Reached(Vec<(VertexId, VertexId)>),
    /// A vertex was stopped after this distance.
    Short(f64),
}

fn log_rejection(element: MeshElement, rejection: &Rejection) {
    match rejection {
        Rejection::Invalid(reason) => {
            warn!(?element, %reason, "move produced an invalid polyhedron, rolled back")
        }
        other => debug!(?element, reason = ?other, "move rejected"),
    }
}

impl Polyhedron {
    /// Move a vertex by `delta`, merging it with a vertex it lands on.
    pub fn move_vertex(&mut self, v: VertexId, delta: Vec3) -> Result<MoveOutcome> {
        self.move_vertex_with(v, delta, true)
    }

    /// Move a vertex by at most `delta`.
    ///
    /// The drag stops early where the solid would stop being convex. If the
    /// vertex lands on another vertex it is merged into it when
    /// `merge_incident` is set; otherwise the move is rejected.
    pub fn move_vertex_with(
        &mut self,
        v: VertexId,
        delta: Vec3,
        merge_incident: bool,
    ) -> Result<MoveOutcome> {
        self.ensure_not_empty()?;
        self.vertex(v)?;
        let element = MeshElement::Vertex(v);
        if self.tolerance.is_zero(delta.norm()) {
            return Ok(MoveOutcome::unmoved(element));
        }

        let snapshot = self.clone();
        let mut changes = FaceChanges::default();
        match self.drag_vertex(v, &delta, merge_incident, &mut changes) {
            Ok(step) => {
                debug!(?v, survivor = ?step.vertex, distance = step.distance, "moved vertex");
                Ok(MoveOutcome {
                    result: MoveResult {
                        index: MeshElement::Vertex(step.vertex),
                        moved: true,
                    },
                    changes,
                })
            }
            Err(rejection) => {
                log_rejection(element, &rejection);
                *self = snapshot;
                Ok(MoveOutcome::unmoved(element))
            }
        }
    }

    /// Move several vertices by `delta` in lock-step.
    ///
    /// The group travels as far as its most constrained vertex can, and a
    /// vertex landing on another vertex is merged into it. The outcome lists
    /// the surviving handle of each input vertex.
    pub fn move_vertices(&mut self, ids: &[VertexId], delta: Vec3) -> Result<GroupMoveOutcome> {
        self.ensure_not_empty()?;
        for &v in ids {
            self.vertex(v)?;
        }
        let unmoved = GroupMoveOutcome {
            moved: false,
            vertices: ids.to_vec(),
            changes: FaceChanges::default(),
        };
        if ids.is_empty() || self.tolerance.is_zero(delta.norm()) {
            return Ok(unmoved);
        }

        let snapshot = self.clone();
        let mut changes = FaceChanges::default();
        match self.drag_group(ids, &delta, &mut changes) {
            Ok(survivors) => {
                debug!(count = ids.len(), "moved vertex group");
                Ok(GroupMoveOutcome {
                    moved: true,
                    vertices: survivors,
                    changes,
                })
            }
            Err(rejection) => {
                if let Some(&first) = ids.first() {
                    log_rejection(MeshElement::Vertex(first), &rejection);
                }
                *self = snapshot;
                Ok(unmoved)
            }
        }
    }

    /// Move an edge by `delta`.
    ///
    /// Both endpoints travel in lock-step, clamped and merged like a group
    /// of vertices. If the edge cannot move as a whole and `delta` points
    /// out of one of
    /// its sides, its midpoint is inserted and dragged instead; the result
    /// then names that vertex.
    pub fn move_edge(&mut self, e: crate::EdgeId, delta: Vec3) -> Result<MoveOutcome> {
        self.ensure_not_empty()?;
        let edge = self.edge(e)?.clone();
        let element = MeshElement::Edge(e);
        if self.tolerance.is_zero(delta.norm()) {
            return Ok(MoveOutcome::unmoved(element));
        }

        let snapshot = self.clone();
        let mut changes = FaceChanges::default();
        let whole = self
            .drag_group(&[edge.start, edge.end], &delta, &mut changes)
            .and_then(|ends| match ends[..] {
                [a, b] => self.find_edge_between(a, b).ok_or(Rejection::Absorbed),
                _ => Err(Rejection::Absorbed),
            });
        if let Ok(moved_edge) = whole {
            debug!(?e, "moved edge");
            return Ok(MoveOutcome {
                result: MoveResult {
                    index: MeshElement::Edge(moved_edge),
                    moved: true,
                },
                changes,
            });
        }

        *self = snapshot.clone();
        let mut changes = FaceChanges::default();
        match self.split_and_move_edge(e, &delta, &mut changes) {
            Ok(step) => {
                debug!(?e, vertex = ?step.vertex, "split and moved edge");
                Ok(MoveOutcome {
                    result: MoveResult {
                        index: MeshElement::Vertex(step.vertex),
                        moved: true,
                    },
                    changes,
                })
            }
            Err(rejection) => {
                log_rejection(element, &rejection);
                *self = snapshot;
                Ok(MoveOutcome::unmoved(element))
            }
        }
    }

    /// Move a side by `delta`.
    ///
    /// The side's vertices travel in lock-step, clamped and merged like a
    /// group of vertices; the result names the side they still bound. If the
    /// side cannot move as a whole and `delta` points outward, a
    /// vertex is added at its centre and dragged, growing a pyramid; the
    /// result then names that vertex.
    pub fn move_side(&mut self, s: SideId, delta: Vec3) -> Result<MoveOutcome> {
        self.ensure_not_empty()?;
        let ids = self.side(s)?.vertices.clone();
        let element = MeshElement::Side(s);
        if self.tolerance.is_zero(delta.norm()) {
            return Ok(MoveOutcome::unmoved(element));
        }

        let snapshot = self.clone();
        let mut changes = FaceChanges::default();
        let whole = self
            .drag_group(&ids, &delta, &mut changes)
            .and_then(|ring| self.side_bounded_by(&ring).ok_or(Rejection::Absorbed));
        if let Ok(moved_side) = whole {
            debug!(?s, "moved side");
            return Ok(MoveOutcome {
                result: MoveResult {
                    index: MeshElement::Side(moved_side),
                    moved: true,
                },
                changes,
            });
        }

        *self = snapshot.clone();
        let mut changes = FaceChanges::default();
        match self.split_and_move_side(s, &delta, &mut changes) {
            Ok(step) => {
                debug!(?s, vertex = ?step.vertex, "split and moved side");
                Ok(MoveOutcome {
                    result: MoveResult {
                        index: MeshElement::Vertex(step.vertex),
                        moved: true,
                    },
                    changes,
                })
            }
            Err(rejection) => {
                log_rejection(element, &rejection);
                *self = snapshot;
                Ok(MoveOutcome::unmoved(element))
            }
        }
    }

    /// Whether [`move_vertices`](Self::move_vertices) would succeed.
    pub fn can_move_vertices(&self, ids: &[VertexId], delta: Vec3) -> Result<bool> {
        Ok(self.clone().move_vertices(ids, delta)?.moved)
    }

    /// Whether [`move_edge`](Self::move_edge) would change the polyhedron.
    pub fn can_move_edge(&self, e: crate::EdgeId, delta: Vec3) -> Result<bool> {
        Ok(self.clone().move_edge(e, delta)?.result.moved)
    }

    /// Whether [`move_side`](Self::move_side) would change the polyhedron.
    pub fn can_move_side(&self, s: SideId, delta: Vec3) -> Result<bool> {
        Ok(self.clone().move_side(s, delta)?.result.moved)
    }

    // =========================================================================
    // Drag steps
    // =========================================================================

    fn drag_vertex(
        &mut self,
        v: VertexId,
        delta: &Vec3,
        merge_incident: bool,
        changes: &mut FaceChanges,
    ) -> std::result::Result<Step, Rejection> {
        let tol = self.tolerance;
        let length = delta.norm();
        let dir = delta / length;

        self.split_sides(v, &dir, changes);
        self.rebuild_edges();

        let distance = self.min_vertex_move_dist(v, &dir, length);
        if distance <= tol.linear {
            return Err(Rejection::Blocked);
        }
        let target = self.vertices[v].position + dir * distance;
        self.vertices[v].position = target;

        let mut survivor = v;
        if let Some(other) = self.nearest_coincident(v) {
            if !merge_incident {
                return Err(Rejection::Coincident);
            }
            self.merge_vertices(other, v, changes);
            survivor = other;
        }
        self.rebuild_edges();
        self.normalize(changes);

        if !self.vertices.contains_key(survivor) {
            return Err(Rejection::Absorbed);
        }
        self.validate().map_err(Rejection::Invalid)?;
        self.refresh_faces()
            .map_err(|e| Rejection::Invalid(e.to_string()))?;
        self.update_bounds();
        self.restore_face_sides();
        Ok(Step {
            vertex: survivor,
            distance,
        })
    }

    /// Drag `ids` along `delta` in lock-step, front-most vertex first.
    ///
    /// When one vertex is stopped short, the whole group starts over with
    /// that shorter distance. Returns the surviving handle of each vertex in
    /// input order.
    fn drag_group(
        &mut self,
        ids: &[VertexId],
        delta: &Vec3,
        changes: &mut FaceChanges,
    ) -> std::result::Result<Vec<VertexId>, Rejection> {
        let dir = delta.normalize();
        let mut order: Vec<VertexId> = ids.to_vec();
        order.sort();
        order.dedup();
        order.sort_by(|&a, &b| {
            let da = self.vertices[a].position.coords.dot(&dir);
            let db = self.vertices[b].position.coords.dot(&dir);
            db.total_cmp(&da).then(a.cmp(&b))
        });

        let start = self.clone();
        let mut length = delta.norm();
        for _ in 0..=order.len() {
            let mut attempt = FaceChanges::default();
            match self.drag_group_by(&order, &(dir * length), &mut attempt)? {
                GroupStep::Reached(moved) => {
                    let mut survivors = Vec::with_capacity(ids.len());
                    for v in ids {
                        let survivor = moved
                            .iter()
                            .find(|(from, _)| from == v)
                            .map(|&(_, to)| to)
                            .filter(|&to| self.vertices.contains_key(to))
                            .ok_or(Rejection::Absorbed)?;
                        survivors.push(survivor);
                    }
                    changes.extend(attempt);
                    return Ok(survivors);
                }
                GroupStep::Short(reached) => {
                    trace!(from = length, to = reached, "group move clamped");
                    *self = start.clone();
                    length = reached;
                }
            }
        }
        Err(Rejection::Blocked)
    }

    /// One lock-step pass over `order` by exactly `delta`.
    fn drag_group_by(
        &mut self,
        order: &[VertexId],
        delta: &Vec3,
        changes: &mut FaceChanges,
    ) -> std::result::Result<GroupStep, Rejection> {
        let length = delta.norm();
        let mut moved = Vec::with_capacity(order.len());
        for &v in order {
            if !self.vertices.contains_key(v) {
                return Err(Rejection::Absorbed);
            }
            let step = self.drag_vertex(v, delta, true, changes)?;
            if step.distance < length - self.tolerance.linear {
                return Ok(GroupStep::Short(step.distance));
            }
            moved.push((v, step.vertex));
        }
        Ok(GroupStep::Reached(moved))
    }

    /// The side whose loop visits every vertex in `ring`.
    fn side_bounded_by(&self, ring: &[VertexId]) -> Option<SideId> {
        self.find_side_by_vertices(ring).or_else(|| {
            self.sides
                .iter()
                .find(|(_, s)| ring.iter().all(|v| s.vertices.contains(v)))
                .map(|(id, _)| id)
        })
    }

    fn split_and_move_edge(
        &mut self,
        e: crate::EdgeId,
        delta: &Vec3,
        changes: &mut FaceChanges,
    ) -> std::result::Result<Step, Rejection> {
        let tol = self.tolerance;
        let edge = self.edges[e].clone();
        let (Some(left), Some(right)) = (edge.left, edge.right) else {
            return Err(Rejection::Invalid("edge without two sides".into()));
        };
        let outward = [left, right].iter().any(|&s| {
            self.loop_plane(&self.sides[s].vertices)
                .is_some_and(|p| p.normal.dot(delta) > tol.angular)
        });
        if !outward {
            return Err(Rejection::Blocked);
        }

        let a = self.vertices[edge.start].position;
        let b = self.vertices[edge.end].position;
        let mid = self.vertices.insert(Vertex {
            position: Point3::from((a.coords + b.coords) * 0.5),
        });
        for (side, after) in [(left, edge.start), (right, edge.end)] {
            let side = &mut self.sides[side];
            if let Some(i) = side.index_of(after) {
                side.vertices.insert(i + 1, mid);
            }
        }
        self.rebuild_edges();
        self.drag_vertex(mid, delta, true, changes)
    }

    fn split_and_move_side(
        &mut self,
        s: SideId,
        delta: &Vec3,
        changes: &mut FaceChanges,
    ) -> std::result::Result<Step, Rejection> {
        let tol = self.tolerance;
        let ring = self.sides[s].vertices.clone();
        let outward = self
            .loop_plane(&ring)
            .is_some_and(|p| p.normal.dot(delta) > tol.angular);
        if !outward {
            return Err(Rejection::Blocked);
        }

        let center = centroid(ring.iter().map(|&v| &self.vertices[v].position));
        let apex = self.vertices.insert(Vertex { position: center });
        let face = self.sides[s].face;
        let n = ring.len();
        for k in 0..n {
            let tri = vec![apex, ring[k], ring[(k + 1) % n]];
            if k == 0 {
                self.sides[s].vertices = tri;
            } else {
                let face = self.clone_face(face, changes);
                self.sides.insert(Side {
                    vertices: tri,
                    edges: Vec::new(),
                    face,
                });
            }
        }
        self.rebuild_edges();
        self.drag_vertex(apex, delta, true, changes)
    }

    /// Split every side around `v` with more than three vertices into
    /// triangles incident to `v`.
    ///
    /// A side the drag leaves inward or in-plane loses an ear `(prev, v,
    /// next)`; a side the drag leaves outward, or in which `v` is collinear
    /// with its neighbours, is fanned from `v`. New triangles get copies of
    /// the split side's face.
    pub(crate) fn split_sides(&mut self, v: VertexId, dir: &Vec3, changes: &mut FaceChanges) {
        let tol = self.tolerance;
        let incident: Vec<SideId> = self
            .sides
            .iter()
            .filter(|(_, s)| s.vertices.len() > 3 && s.index_of(v).is_some())
            .map(|(id, _)| id)
            .collect();

        for sid in incident {
            let Some(ring) = self.sides[sid].rotated_to(v) else {
                continue;
            };
            let n = ring.len();
            let (next, prev) = (ring[1], ring[n - 1]);
            let collinear = self.is_between(
                &self.vertices[prev].position,
                &self.vertices[v].position,
                &self.vertices[next].position,
            );
            let outward = self
                .loop_plane(&ring)
                .is_some_and(|p| p.normal.dot(dir) > tol.angular);
            let face = self.sides[sid].face;

            if collinear || outward {
                for k in 1..n - 1 {
                    let tri = vec![v, ring[k], ring[k + 1]];
                    if k == 1 {
                        self.sides[sid].vertices = tri;
                    } else {
                        let face = self.clone_face(face, changes);
                        self.sides.insert(Side {
                            vertices: tri,
                            edges: Vec::new(),
                            face,
                        });
                    }
                }
            } else {
                self.sides[sid].vertices = ring[1..].to_vec();
                let face = self.clone_face(face, changes);
                self.sides.insert(Side {
                    vertices: vec![prev, v, next],
                    edges: Vec::new(),
                    face,
                });
            }
        }
    }

    /// The farthest `v` can travel along `dir`, up to `max`, with the solid
    /// staying convex.
    ///
    /// Every side incident to `v` must already be a triangle. Barriers:
    /// every other vertex must stay behind each incident triangle; `v` must
    /// stay behind every non-incident side; a triangle dragged within its
    /// own plane must not fold over its opposite edge.
    pub(crate) fn min_vertex_move_dist(&self, v: VertexId, dir: &Vec3, max: f64) -> f64 {
        let tol = self.tolerance;
        let p0 = self.vertices[v].position;
        let mut limit = max;
        let mut clamp = |normal: Vec3, signed_distance: f64, barrier: &str| {
            let dn = dir.dot(&normal);
            if dn <= tol.angular {
                return;
            }
            let t = (-signed_distance / dn).max(0.0);
            if t < limit {
                trace!(barrier, distance = t, "move clamped");
                limit = t;
            }
        };

        let mut triangles: Vec<(VertexId, VertexId)> = Vec::new();
        for side in self.sides.values() {
            match side.rotated_to(v) {
                Some(ring) if ring.len() == 3 => triangles.push((ring[1], ring[2])),
                Some(_) => {}
                None => {
                    if let Some(plane) = self.loop_plane(&side.vertices) {
                        clamp(plane.normal, plane.signed_distance(&p0), "side");
                    }
                }
            }
        }

        for &(x, y) in &triangles {
            let px = self.vertices[x].position;
            let py = self.vertices[y].position;
            let span = (px - py).norm();
            for (q, vertex) in &self.vertices {
                if q == v || q == x || q == y {
                    continue;
                }
                let pq = vertex.position;
                let m = (px - pq).cross(&(py - pq));
                let m_len = m.norm();
                if m_len <= tol.linear * span {
                    continue;
                }
                let normal = -m / m_len;
                clamp(normal, (p0 - pq).dot(&normal), "vertex");
            }

            let n0 = (px - p0).cross(&(py - p0));
            let Some(n0) = n0.try_normalize(f64::EPSILON) else {
                continue;
            };
            if tol.is_parallel(dir, &n0) {
                if let Some(normal) = n0.cross(&(px - py)).try_normalize(f64::EPSILON) {
                    clamp(normal, (p0 - px).dot(&normal), "fold");
                }
            }
        }
        limit
    }

    /// The vertex other than `v` coinciding with it: nearest first, then
    /// lowest handle.
    fn nearest_coincident(&self, v: VertexId) -> Option<VertexId> {
        let p = self.vertices[v].position;
        self.vertices
            .iter()
            .filter(|&(id, other)| id != v && self.tolerance.points_equal(&p, &other.position))
            .map(|(id, other)| ((other.position - p).norm(), id))
            .min_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)))
            .map(|(_, id)| id)
    }
}
