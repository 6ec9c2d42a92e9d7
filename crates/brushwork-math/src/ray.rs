//! Half-infinite rays used for picking.

use crate::{Point3, Vec3};

/// A ray with an origin and a unit direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    /// Start point.
    pub origin: Point3,
    /// Unit direction.
    pub direction: Vec3,
}

impl Ray {
    /// Create a ray; `direction` is normalized.
    pub fn new(origin: Point3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize(),
        }
    }

    /// The point at distance `t` along the ray.
    pub fn point_at(&self, t: f64) -> Point3 {
        self.origin + self.direction * t
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_at() {
        let ray = Ray::new(Point3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 3.0, 0.0));
        let p = ray.point_at(2.0);
        assert!((p - Point3::new(1.0, 2.0, 0.0)).norm() < 1e-12);
    }
}
