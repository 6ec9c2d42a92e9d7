#![warn(missing_docs)]

//! Math types for the brushwork polyhedron kernel.
//!
//! Thin wrappers around nalgebra providing the domain types a brush
//! editor needs: points, vectors, quaternions, planes, rays, bounding
//! boxes, axis-aligned quarter turns and the tolerance policy used by
//! every geometric classification.

use nalgebra::{Matrix4, UnitQuaternion, Vector3, Vector4};

mod aabb;
mod axis;
mod plane;
mod ray;
mod tolerance;

pub use aabb::Aabb3;
pub use axis::Axis;
pub use plane::Plane;
pub use ray::Ray;
pub use tolerance::{PointStatus, Tolerance};

/// A point in 3D space.
pub type Point3 = nalgebra::Point3<f64>;

/// A vector in 3D space.
pub type Vec3 = Vector3<f64>;

/// A point in 2D (texture) space.
pub type Point2 = nalgebra::Point2<f64>;

/// A unit quaternion describing a rotation.
pub type Quat = UnitQuaternion<f64>;

/// A 4x4 affine transformation matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    /// The underlying 4x4 matrix.
    pub matrix: Matrix4<f64>,
}

impl Transform {
    /// Identity transform.
    pub fn identity() -> Self {
        Self {
            matrix: Matrix4::identity(),
        }
    }

    /// Translation by `delta`.
    pub fn translation(delta: &Vec3) -> Self {
        let mut m = Matrix4::identity();
        m[(0, 3)] = delta.x;
        m[(1, 3)] = delta.y;
        m[(2, 3)] = delta.z;
        Self { matrix: m }
    }

    /// Rotation by `rotation` about the point `center`.
    pub fn rotation_about(center: &Point3, rotation: &Quat) -> Self {
        let to_origin = Self::translation(&-center.coords);
        let back = Self::translation(&center.coords);
        let rotate = Self {
            matrix: rotation.to_homogeneous(),
        };
        back.then(&rotate).then(&to_origin)
    }

    /// Mirror across the plane perpendicular to `axis` through `center`.
    pub fn mirror(axis: Axis, center: &Point3) -> Self {
        let i = axis.index();
        let mut m = Matrix4::identity();
        m[(i, i)] = -1.0;
        m[(i, 3)] = 2.0 * center[i];
        Self { matrix: m }
    }

    /// Compose: `self` then `other` (self * other).
    pub fn then(&self, other: &Transform) -> Self {
        Self {
            matrix: self.matrix * other.matrix,
        }
    }

    /// Transform a point.
    pub fn apply_point(&self, p: &Point3) -> Point3 {
        let v = self.matrix * Vector4::new(p.x, p.y, p.z, 1.0);
        Point3::new(v.x, v.y, v.z)
    }

    /// Whether this transform reverses handedness (negative determinant).
    pub fn is_mirroring(&self) -> bool {
        self.matrix.fixed_view::<3, 3>(0, 0).determinant() < 0.0
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

/// Arithmetic mean of a set of points, or the origin for an empty set.
pub fn centroid<'a>(points: impl IntoIterator<Item = &'a Point3>) -> Point3 {
    let mut sum = Vec3::zeros();
    let mut count = 0usize;
    for p in points {
        sum += p.coords;
        count += 1;
    }
    if count == 0 {
        return Point3::origin();
    }
    Point3::from(sum / count as f64)
}

/// Newell normal of a closed polygon: twice its vector area.
///
/// Unnormalized; its length is twice the polygon area and its direction
/// follows the right-hand rule over the loop order.
pub fn newell_normal<'a>(points: impl IntoIterator<Item = &'a Point3>) -> Vec3 {
    let pts: Vec<&Point3> = points.into_iter().collect();
    let mut n = Vec3::zeros();
    for i in 0..pts.len() {
        let a = pts[i];
        let b = pts[(i + 1) % pts.len()];
        n.x += (a.y - b.y) * (a.z + b.z);
        n.y += (a.z - b.z) * (a.x + b.x);
        n.z += (a.x - b.x) * (a.y + b.y);
    }
    n
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_identity_transform() {
        let t = Transform::identity();
        let p = Point3::new(1.0, 2.0, 3.0);
        let result = t.apply_point(&p);
        assert!((result - p).norm() < 1e-12);
    }

    #[test]
    fn test_translation() {
        let t = Transform::translation(&Vec3::new(10.0, 20.0, 30.0));
        let p = Point3::new(1.0, 2.0, 3.0);
        let result = t.apply_point(&p);
        assert!((result.x - 11.0).abs() < 1e-12);
        assert!((result.y - 22.0).abs() < 1e-12);
        assert!((result.z - 33.0).abs() < 1e-12);
    }

    #[test]
    fn test_rotation_about_center() {
        let q = Quat::from_axis_angle(&Vec3::z_axis(), PI / 2.0);
        let t = Transform::rotation_about(&Point3::new(1.0, 1.0, 0.0), &q);
        let result = t.apply_point(&Point3::new(2.0, 1.0, 5.0));
        assert!((result - Point3::new(1.0, 2.0, 5.0)).norm() < 1e-12);
    }

    #[test]
    fn test_mirror() {
        let t = Transform::mirror(Axis::X, &Point3::new(2.0, 0.0, 0.0));
        let result = t.apply_point(&Point3::new(3.0, 4.0, 5.0));
        assert!((result - Point3::new(1.0, 4.0, 5.0)).norm() < 1e-12);
        assert!(t.is_mirroring());
        assert!(!Transform::translation(&Vec3::x()).is_mirroring());
    }

    #[test]
    fn test_compose_applies_right_first() {
        let translate = Transform::translation(&Vec3::new(1.0, 0.0, 0.0));
        let mirror = Transform::mirror(Axis::X, &Point3::origin());
        // (mirror * translate) * p = mirror(translate(p))
        let composed = mirror.then(&translate);
        let result = composed.apply_point(&Point3::origin());
        assert!((result.x + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_newell_normal_of_unit_square() {
        let square = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let n = newell_normal(square.iter());
        assert!((n - Vec3::new(0.0, 0.0, 2.0)).norm() < 1e-12);
        let c = centroid(square.iter());
        assert!((c - Point3::new(0.5, 0.5, 0.0)).norm() < 1e-12);
    }
}
