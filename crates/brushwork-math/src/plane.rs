//! Oriented planes in Hessian normal form.

use serde::{Deserialize, Serialize};

use crate::{PointStatus, Point3, Ray, Tolerance, Vec3};

/// An oriented plane `normal · p = distance`.
///
/// The normal is unit length and points to the "above" side. For the planes
/// of a brush, above is outside the solid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Plane {
    /// Unit normal.
    pub normal: Vec3,
    /// Signed distance of the plane from the origin along `normal`.
    pub distance: f64,
}

impl Plane {
    /// Create a plane from a normal (normalized here) and its distance.
    pub fn new(normal: Vec3, distance: f64) -> Self {
        let len = normal.norm();
        Self {
            normal: normal / len,
            distance: distance / len,
        }
    }

    /// Plane through `point` with the given normal (normalized here).
    pub fn from_normal_and_point(normal: Vec3, point: &Point3) -> Self {
        let n = normal.normalize();
        Self {
            normal: n,
            distance: n.dot(&point.coords),
        }
    }

    /// Plane through three points with normal `(p2 - p1) × (p3 - p1)`.
    ///
    /// Returns `None` if the points are collinear.
    pub fn from_points(p1: &Point3, p2: &Point3, p3: &Point3) -> Option<Self> {
        let n = (p2 - p1).cross(&(p3 - p1)).try_normalize(f64::EPSILON)?;
        Some(Self {
            normal: n,
            distance: n.dot(&p1.coords),
        })
    }

    /// The point of the plane closest to the origin.
    pub fn anchor(&self) -> Point3 {
        Point3::from(self.normal * self.distance)
    }

    /// Signed distance from `p` to the plane (positive above).
    pub fn signed_distance(&self, p: &Point3) -> f64 {
        self.normal.dot(&p.coords) - self.distance
    }

    /// Classify `p` against the plane under `tol`.
    pub fn point_status(&self, p: &Point3, tol: &Tolerance) -> PointStatus {
        tol.classify(self.signed_distance(p))
    }

    /// Distance along `ray` to the plane.
    ///
    /// `None` if the ray is parallel to the plane or the plane is behind
    /// the ray origin.
    pub fn intersect_with_ray(&self, ray: &Ray) -> Option<f64> {
        let denom = self.normal.dot(&ray.direction);
        if denom.abs() < f64::EPSILON {
            return None;
        }
        let t = (self.distance - self.normal.dot(&ray.origin.coords)) / denom;
        if t < 0.0 {
            None
        } else {
            Some(t)
        }
    }

    /// Two orthonormal in-plane directions `(u, v)` with `u × v = normal`.
    pub fn tangent_frame(&self) -> (Vec3, Vec3) {
        let n = self.normal;
        // Pick an arbitrary perpendicular vector
        let arbitrary = if n.x.abs() < 0.9 { Vec3::x() } else { Vec3::y() };
        let u = arbitrary.cross(&n).normalize();
        let v = n.cross(&u).normalize();
        (u, v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_from_points_orientation() {
        let plane = Plane::from_points(
            &Point3::new(0.0, 0.0, 1.0),
            &Point3::new(1.0, 0.0, 1.0),
            &Point3::new(0.0, 1.0, 1.0),
        )
        .unwrap();
        assert_relative_eq!(plane.normal, Vec3::z());
        assert_relative_eq!(plane.distance, 1.0);
    }

    #[test]
    fn test_from_points_collinear() {
        let p = Plane::from_points(
            &Point3::origin(),
            &Point3::new(1.0, 1.0, 1.0),
            &Point3::new(2.0, 2.0, 2.0),
        );
        assert!(p.is_none());
    }

    #[test]
    fn test_ray_intersection() {
        let plane = Plane::new(Vec3::z(), 2.0);
        let ray = Ray::new(Point3::origin(), Vec3::z());
        assert_relative_eq!(plane.intersect_with_ray(&ray).unwrap(), 2.0);

        let behind = Ray::new(Point3::new(0.0, 0.0, 3.0), Vec3::z());
        assert!(plane.intersect_with_ray(&behind).is_none());

        let parallel = Ray::new(Point3::origin(), Vec3::x());
        assert!(plane.intersect_with_ray(&parallel).is_none());
    }

    #[test]
    fn test_tangent_frame_is_right_handed() {
        let plane = Plane::new(Vec3::new(1.0, 2.0, 3.0), 0.0);
        let (u, v) = plane.tangent_frame();
        assert_relative_eq!(u.cross(&v), plane.normal, epsilon = 1e-12);
        assert_relative_eq!(u.dot(&plane.normal), 0.0, epsilon = 1e-12);
    }
}
