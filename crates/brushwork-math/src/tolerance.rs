//! The tolerance policy shared by every geometric classification.

use serde::{Deserialize, Serialize};

use crate::{Point3, Vec3};

/// Position of a point relative to an oriented plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointStatus {
    /// Strictly on the normal side, farther than the linear tolerance.
    Above,
    /// Strictly behind the plane, farther than the linear tolerance.
    Below,
    /// Within the linear tolerance of the plane (inclusive).
    Inside,
}

/// Tolerance constants for geometric comparisons.
///
/// All comparisons are inclusive: a distance of exactly `linear` counts as
/// zero, so a point at exactly `linear` from a plane lies on it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tolerance {
    /// Linear distance tolerance in world units.
    pub linear: f64,
    /// Angular tolerance: the largest dot product between a direction and a
    /// normal for which the two are still considered perpendicular.
    pub angular: f64,
}

impl Tolerance {
    /// Default tolerances (1e-6 linear, 1e-9 angular).
    pub const DEFAULT: Self = Self {
        linear: 1e-6,
        angular: 1e-9,
    };

    /// Check if two points are coincident within tolerance.
    pub fn points_equal(&self, a: &Point3, b: &Point3) -> bool {
        (a - b).norm() <= self.linear
    }

    /// Check if a scalar distance is effectively zero.
    pub fn is_zero(&self, d: f64) -> bool {
        d.abs() <= self.linear
    }

    /// Classify a signed distance.
    pub fn classify(&self, distance: f64) -> PointStatus {
        if distance > self.linear {
            PointStatus::Above
        } else if distance < -self.linear {
            PointStatus::Below
        } else {
            PointStatus::Inside
        }
    }

    /// Whether a direction runs parallel to a plane with the given unit normal.
    pub fn is_parallel(&self, direction: &Vec3, normal: &Vec3) -> bool {
        let len = direction.norm();
        len <= self.linear || (direction.dot(normal) / len).abs() <= self.angular
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self::DEFAULT
    }
}
