//! Rigid transforms, mirroring and grid snapping.

use brushwork_face::Face;
use brushwork_math::{Axis, Point3, Quat, Transform, Vec3};
use tracing::debug;

use crate::{FaceChanges, FaceId, Polyhedron, Result};

impl Polyhedron {
    /// Apply an affine transform to vertices, faces and bounds.
    ///
    /// Faces are transformed first; if one of them fails nothing changes.
    fn apply_transform(&mut self, t: &Transform) -> Result<()> {
        let faces = self.mapped_faces(|face| face.transform(t))?;
        for vertex in self.vertices.values_mut() {
            vertex.position = t.apply_point(&vertex.position);
        }
        self.commit_faces(faces);
        if t.is_mirroring() {
            for side in self.sides.values_mut() {
                side.vertices.reverse();
            }
            self.rebuild_edges();
        }
        self.update_bounds();
        Ok(())
    }

    /// Copies of every face with `edit` applied.
    fn mapped_faces(
        &self,
        edit: impl Fn(&mut Face) -> brushwork_face::Result<()>,
    ) -> Result<Vec<(FaceId, Face)>> {
        self.faces
            .iter()
            .map(|(id, face)| {
                let mut face = face.clone();
                edit(&mut face)?;
                Ok((id, face))
            })
            .collect()
    }

    fn commit_faces(&mut self, faces: Vec<(FaceId, Face)>) {
        for (id, face) in faces {
            self.faces[id] = face;
        }
    }

    /// Move everything by `delta`.
    pub fn translate(&mut self, delta: &Vec3) -> Result<()> {
        self.apply_transform(&Transform::translation(delta))
    }

    /// Rotate about `center`.
    pub fn rotate(&mut self, rotation: &Quat, center: &Point3) -> Result<()> {
        self.apply_transform(&Transform::rotation_about(center, rotation))
    }

    /// Rotate by exactly 90 degrees about `axis` through `center`.
    ///
    /// Coordinates are permuted rather than multiplied, so a brush on an
    /// integer grid stays on it.
    pub fn rotate90(&mut self, axis: Axis, center: &Point3, clockwise: bool) -> Result<()> {
        let turn = |p: &Point3| center + axis.rotate90(&(p - center), clockwise);
        let faces = self.mapped_faces(|face| {
            let [p1, p2, p3] = face.points().map(|p| turn(&p));
            face.set_points(p1, p2, p3)
        })?;
        for vertex in self.vertices.values_mut() {
            vertex.position = turn(&vertex.position);
        }
        self.commit_faces(faces);
        self.update_bounds();
        Ok(())
    }

    /// Mirror across the plane perpendicular to `axis` through `center`.
    ///
    /// Loops are reversed so every side stays counter-clockwise seen from
    /// outside.
    pub fn flip(&mut self, axis: Axis, center: &Point3) -> Result<()> {
        self.apply_transform(&Transform::mirror(axis, center))
    }

    /// Round every vertex to the integer grid.
    ///
    /// Vertices that land on each other are merged (lower handle survives)
    /// and face planes are re-fitted. The result may no longer be closed or
    /// convex; check [`closed`](Self::closed) and
    /// [`is_convex`](Self::is_convex) afterwards. If a face cannot be
    /// re-fitted the polyhedron is restored and the error returned.
    pub fn snap(&mut self) -> Result<FaceChanges> {
        let mut changes = FaceChanges::default();
        if self.is_empty() {
            return Ok(changes);
        }
        let snapshot = self.clone();
        for vertex in self.vertices.values_mut() {
            vertex.position = vertex.position.map(f64::round);
        }
        self.merge_coincident(&mut changes, false);
        self.rebuild_edges();
        if let Err(e) = self.refresh_faces() {
            *self = snapshot;
            return Err(e);
        }
        self.update_bounds();
        self.restore_face_sides();
        debug!(
            added = changes.added.len(),
            dropped = changes.dropped.len(),
            "snapped polyhedron"
        );
        Ok(changes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use brushwork_face::{Face, FaceAttributes};
    use brushwork_math::{Aabb3, Plane, Tolerance};
    use std::f64::consts::FRAC_PI_2;

    fn block(min: Point3, max: Point3) -> Polyhedron {
        let mut poly = Polyhedron::new(Aabb3::cube(16384.0), Tolerance::DEFAULT);
        let faces = [
            Plane::from_normal_and_point(Vec3::x(), &max),
            Plane::from_normal_and_point(-Vec3::x(), &min),
            Plane::from_normal_and_point(Vec3::y(), &max),
            Plane::from_normal_and_point(-Vec3::y(), &min),
            Plane::from_normal_and_point(Vec3::z(), &max),
            Plane::from_normal_and_point(-Vec3::z(), &min),
        ]
        .map(|p| Face::from_plane(p, FaceAttributes::default()).unwrap());
        poly.add_faces(faces).unwrap();
        poly
    }

    #[test]
    fn test_translate() {
        let mut poly = block(Point3::origin(), Point3::new(1.0, 2.0, 3.0));
        poly.translate(&Vec3::new(10.0, 0.0, -1.0)).unwrap();
        assert_relative_eq!(poly.bounds().min, Point3::new(10.0, 0.0, -1.0));
        assert_relative_eq!(poly.bounds().max, Point3::new(11.0, 2.0, 2.0));
        for (sid, side) in poly.sides() {
            let plane = poly.side_plane(sid).unwrap();
            for &v in &side.vertices {
                assert_relative_eq!(
                    plane.signed_distance(&poly.position(v).unwrap()),
                    0.0,
                    epsilon = 1e-9
                );
            }
        }
    }

    #[test]
    fn test_rotate90_is_exact() {
        let mut poly = block(Point3::origin(), Point3::new(4.0, 2.0, 1.0));
        poly.rotate90(Axis::Z, &Point3::origin(), false).unwrap();
        assert_eq!(poly.bounds().min, Point3::new(-2.0, 0.0, 0.0));
        assert_eq!(poly.bounds().max, Point3::new(0.0, 4.0, 1.0));
        assert!(poly.validate().is_ok());
        for (_, face) in poly.faces() {
            let n = face.normal();
            assert!(n.iter().all(|c| c.abs() == 0.0 || c.abs() == 1.0));
        }
    }

    #[test]
    fn test_rotate_quarter_turn() {
        let mut poly = block(Point3::origin(), Point3::new(2.0, 2.0, 2.0));
        let q = Quat::from_axis_angle(&Vec3::x_axis(), FRAC_PI_2);
        poly.rotate(&q, &Point3::new(1.0, 1.0, 1.0)).unwrap();
        assert_relative_eq!(poly.bounds().min, Point3::origin(), epsilon = 1e-9);
        assert_relative_eq!(poly.bounds().max, Point3::new(2.0, 2.0, 2.0), epsilon = 1e-9);
        assert!(poly.validate().is_ok());
    }

    #[test]
    fn test_flip_keeps_outward_winding() {
        let mut poly = block(Point3::origin(), Point3::new(1.0, 1.0, 1.0));
        let v = poly.find_vertex(&Point3::new(1.0, 1.0, 1.0)).unwrap();
        poly.move_vertex(v, Vec3::new(0.0, 0.0, -1.0)).unwrap();
        poly.flip(Axis::X, &Point3::origin()).unwrap();
        assert_relative_eq!(poly.bounds().min.x, -1.0);
        assert!(poly.closed());
        assert!(poly.validate().is_ok());
        for (sid, _) in poly.sides() {
            let plane = poly.side_plane(sid).unwrap();
            let geometric = poly.loop_plane(&poly.side(sid).unwrap().vertices).unwrap();
            assert!(plane.normal.dot(&geometric.normal) > 0.99);
        }
    }

    #[test]
    fn test_snap_integer_cube_is_noop() {
        let mut poly = block(Point3::new(-2.0, 0.0, 3.0), Point3::new(2.0, 5.0, 4.0));
        let before: Vec<Point3> = poly.vertices().map(|(_, v)| v.position).collect();
        let changes = poly.snap().unwrap();
        assert!(changes.is_empty());
        let after: Vec<Point3> = poly.vertices().map(|(_, v)| v.position).collect();
        assert_eq!(before, after);
        assert!(poly.closed());
        assert!(poly.is_convex());
    }

    #[test]
    fn test_snap_rounds_near_grid() {
        let mut poly = block(Point3::new(0.0, 0.0, 0.0), Point3::new(2.0, 2.0, 2.0));
        poly.translate(&Vec3::new(0.2, -0.3, 0.1)).unwrap();
        poly.snap().unwrap();
        assert_eq!(poly.bounds().min, Point3::origin());
        assert_eq!(poly.bounds().max, Point3::new(2.0, 2.0, 2.0));
        assert!(poly.closed());
        assert!(poly.is_convex());
    }

    #[test]
    fn test_failed_translate_leaves_polyhedron_untouched() {
        let mut poly = block(Point3::origin(), Point3::new(1.0, 1.0, 1.0));
        let before: Vec<Point3> = poly.vertices().map(|(_, v)| v.position).collect();
        let planes: Vec<_> = poly.faces().map(|(_, f)| *f.boundary()).collect();
        assert!(poly.translate(&Vec3::new(f64::NAN, 0.0, 0.0)).is_err());
        let after: Vec<Point3> = poly.vertices().map(|(_, v)| v.position).collect();
        assert_eq!(before, after);
        let planes_after: Vec<_> = poly.faces().map(|(_, f)| *f.boundary()).collect();
        assert_eq!(planes, planes_after);
        assert_eq!(poly.bounds().max, Point3::new(1.0, 1.0, 1.0));
        assert!(poly.validate().is_ok());
    }

    #[test]
    fn test_failed_rotate90_leaves_polyhedron_untouched() {
        let mut poly = block(Point3::origin(), Point3::new(2.0, 1.0, 1.0));
        let center = Point3::new(f64::INFINITY, 0.0, 0.0);
        assert!(poly.rotate90(Axis::Y, &center, true).is_err());
        assert_eq!(poly.bounds().min, Point3::origin());
        assert_eq!(poly.bounds().max, Point3::new(2.0, 1.0, 1.0));
        assert!(poly.vertices().all(|(_, v)| v.position.coords.iter().all(|c| c.is_finite())));
        assert!(poly.validate().is_ok());
    }
}
