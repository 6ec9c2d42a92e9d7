//! Axis-aligned bounding boxes.
//!
//! Brushes cache the tight box over their vertices; the world bounds that
//! seed construction are an `Aabb3` too.

use crate::{Point3, Ray};

/// Axis-aligned bounding box in 3D.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb3 {
    /// Minimum corner.
    pub min: Point3,
    /// Maximum corner.
    pub max: Point3,
}

impl Aabb3 {
    /// Create an AABB from min and max corners.
    pub fn new(min: Point3, max: Point3) -> Self {
        Self { min, max }
    }

    /// A cube centred on the origin with the given half extent.
    pub fn cube(half_extent: f64) -> Self {
        let h = half_extent.abs();
        Self::new(Point3::new(-h, -h, -h), Point3::new(h, h, h))
    }

    /// Create an empty (inverted) AABB suitable for expansion.
    pub fn empty() -> Self {
        Self {
            min: Point3::new(f64::INFINITY, f64::INFINITY, f64::INFINITY),
            max: Point3::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
        }
    }

    /// Tight box around a set of points (empty for no points).
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point3>) -> Self {
        let mut aabb = Self::empty();
        for p in points {
            aabb.include_point(p);
        }
        aabb
    }

    /// Whether no point has been included yet.
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    /// Expand this AABB to include a point.
    pub fn include_point(&mut self, p: &Point3) {
        self.min.x = self.min.x.min(p.x);
        self.min.y = self.min.y.min(p.y);
        self.min.z = self.min.z.min(p.z);
        self.max.x = self.max.x.max(p.x);
        self.max.y = self.max.y.max(p.y);
        self.max.z = self.max.z.max(p.z);
    }

    /// Whether `p` lies inside or on the box.
    pub fn contains_point(&self, p: &Point3) -> bool {
        (0..3).all(|i| p[i] >= self.min[i] && p[i] <= self.max[i])
    }

    /// Whether `other` lies entirely inside or on the box.
    pub fn contains(&self, other: &Aabb3) -> bool {
        self.contains_point(&other.min) && self.contains_point(&other.max)
    }

    /// Centre point.
    pub fn center(&self) -> Point3 {
        Point3::from((self.min.coords + self.max.coords) * 0.5)
    }

    /// The eight corners, indexed by `x | y << 1 | z << 2` bits.
    pub fn corners(&self) -> [Point3; 8] {
        let mut out = [Point3::origin(); 8];
        for (i, c) in out.iter_mut().enumerate() {
            *c = Point3::new(
                if i & 1 == 0 { self.min.x } else { self.max.x },
                if i & 2 == 0 { self.min.y } else { self.max.y },
                if i & 4 == 0 { self.min.z } else { self.max.z },
            );
        }
        out
    }

    /// Distance along `ray` to the entry point of the box (slab test).
    ///
    /// Returns `Some(0.0)` when the origin is inside, `None` on a miss.
    pub fn intersect_with_ray(&self, ray: &Ray) -> Option<f64> {
        let mut t_min = 0.0_f64;
        let mut t_max = f64::INFINITY;
        for i in 0..3 {
            let o = ray.origin[i];
            let d = ray.direction[i];
            if d.abs() < f64::EPSILON {
                if o < self.min[i] || o > self.max[i] {
                    return None;
                }
                continue;
            }
            let mut t0 = (self.min[i] - o) / d;
            let mut t1 = (self.max[i] - o) / d;
            if t0 > t1 {
                std::mem::swap(&mut t0, &mut t1);
            }
            t_min = t_min.max(t0);
            t_max = t_max.min(t1);
            if t_min > t_max {
                return None;
            }
        }
        Some(t_min)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Vec3;
    use approx::assert_relative_eq;

    #[test]
    fn test_empty_and_include() {
        let mut aabb = Aabb3::empty();
        assert!(aabb.is_empty());
        aabb.include_point(&Point3::new(1.0, -2.0, 3.0));
        aabb.include_point(&Point3::new(-1.0, 2.0, 0.0));
        assert!(!aabb.is_empty());
        assert_relative_eq!(aabb.min, Point3::new(-1.0, -2.0, 0.0));
        assert_relative_eq!(aabb.max, Point3::new(1.0, 2.0, 3.0));
        assert_relative_eq!(aabb.center(), Point3::new(0.0, 0.0, 1.5));
    }

    #[test]
    fn test_contains() {
        let a = Aabb3::cube(2.0);
        let b = Aabb3::new(Point3::new(1.0, 1.0, 1.0), Point3::new(2.0, 2.0, 2.0));
        let c = Aabb3::new(Point3::new(1.0, 1.0, 1.0), Point3::new(2.5, 2.0, 2.0));
        assert!(a.contains(&b));
        assert!(!a.contains(&c));
        assert!(!a.contains_point(&Point3::new(2.5, 0.0, 0.0)));
    }

    #[test]
    fn test_corners() {
        let corners = Aabb3::new(Point3::origin(), Point3::new(1.0, 2.0, 3.0)).corners();
        assert_relative_eq!(corners[0], Point3::origin());
        assert_relative_eq!(corners[3], Point3::new(1.0, 2.0, 0.0));
        assert_relative_eq!(corners[7], Point3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_ray_slab() {
        let aabb = Aabb3::cube(1.0);
        let hit = Ray::new(Point3::new(-5.0, 0.0, 0.0), Vec3::x());
        assert_relative_eq!(aabb.intersect_with_ray(&hit).unwrap(), 4.0);
        let miss = Ray::new(Point3::new(-5.0, 3.0, 0.0), Vec3::x());
        assert!(aabb.intersect_with_ray(&miss).is_none());
        let inside = Ray::new(Point3::origin(), Vec3::y());
        assert_relative_eq!(aabb.intersect_with_ray(&inside).unwrap(), 0.0);
    }
}
