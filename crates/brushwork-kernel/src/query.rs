//! Lookups by position, adjacency queries and ray picking.

use std::collections::HashSet;

use brushwork_math::{centroid, Point3, PointStatus, Ray};

use crate::{EdgeId, Polyhedron, Result, SideId, VertexId};

impl Polyhedron {
    /// The vertex at `point`, within tolerance.
    pub fn find_vertex(&self, point: &Point3) -> Option<VertexId> {
        self.vertices
            .iter()
            .find(|(_, v)| self.tolerance.points_equal(&v.position, point))
            .map(|(id, _)| id)
    }

    /// The edge joining the vertices at `p1` and `p2`, in either direction.
    pub fn find_edge(&self, p1: &Point3, p2: &Point3) -> Option<EdgeId> {
        let a = self.find_vertex(p1)?;
        let b = self.find_vertex(p2)?;
        self.find_edge_between(a, b)
    }

    /// The edge joining two vertices, in either direction.
    pub fn find_edge_between(&self, a: VertexId, b: VertexId) -> Option<EdgeId> {
        self.edges
            .iter()
            .find(|(_, e)| e.connects(a, b))
            .map(|(id, _)| id)
    }

    /// The side whose loop visits exactly the vertices at `points`.
    pub fn find_side(&self, points: &[Point3]) -> Option<SideId> {
        let ids = points
            .iter()
            .map(|p| self.find_vertex(p))
            .collect::<Option<Vec<_>>>()?;
        self.find_side_by_vertices(&ids)
    }

    /// The side whose loop holds exactly the given vertices.
    pub fn find_side_by_vertices(&self, ids: &[VertexId]) -> Option<SideId> {
        let wanted: HashSet<VertexId> = ids.iter().copied().collect();
        self.sides
            .iter()
            .find(|(_, s)| {
                s.vertices.len() == wanted.len() && s.vertices.iter().all(|v| wanted.contains(v))
            })
            .map(|(id, _)| id)
    }

    /// Sides whose loop passes through `v`.
    pub fn incident_sides(&self, v: VertexId) -> Result<Vec<SideId>> {
        self.vertex(v)?;
        Ok(self
            .sides
            .iter()
            .filter(|(_, s)| s.vertices.contains(&v))
            .map(|(id, _)| id)
            .collect())
    }

    /// Average of all vertex positions.
    pub fn center(&self) -> Point3 {
        centroid(self.vertices.values().map(|v| &v.position))
    }

    /// Whether `point` lies inside or on the polyhedron.
    pub fn contains_point(&self, point: &Point3) -> bool {
        if self.is_empty() || !self.bounds.contains_point(point) {
            return false;
        }
        self.sides.keys().all(|sid| {
            self.side_plane(sid)
                .map(|plane| plane.point_status(point, &self.tolerance) != PointStatus::Above)
                .unwrap_or(false)
        })
    }

    /// The nearest side hit by `ray` from outside, with the distance along
    /// the ray.
    pub fn intersect_with_ray(&self, ray: &Ray) -> Option<(SideId, f64)> {
        let mut best: Option<(SideId, f64)> = None;
        for (sid, side) in &self.sides {
            let Ok(plane) = self.side_plane(sid) else {
                continue;
            };
            if ray.direction.dot(&plane.normal) >= 0.0 {
                continue;
            }
            let Some(t) = plane.intersect_with_ray(ray) else {
                continue;
            };
            if best.is_some_and(|(_, d)| d <= t) {
                continue;
            }
            let hit = ray.point_at(t);
            let n = side.vertices.len();
            let inside = (0..n).all(|i| {
                let a = self.vertices[side.vertices[i]].position;
                let b = self.vertices[side.vertices[(i + 1) % n]].position;
                (b - a).cross(&(hit - a)).dot(&plane.normal) >= -self.tolerance.linear
            });
            if inside {
                best = Some((sid, t));
            }
        }
        best
    }
}
