//! Coordinate axes and exact quarter turns about them.

use serde::{Deserialize, Serialize};

use crate::Vec3;

/// One of the three coordinate axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    /// The x axis.
    X,
    /// The y axis.
    Y,
    /// The z axis.
    Z,
}

impl Axis {
    /// Component index (0, 1, 2).
    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }

    /// Unit vector along the axis.
    pub fn unit(self) -> Vec3 {
        let mut v = Vec3::zeros();
        v[self.index()] = 1.0;
        v
    }

    /// Rotate `v` by exactly 90 degrees about this axis.
    ///
    /// Counter-clockwise follows the right-hand rule. Components are only
    /// permuted and negated, so integer coordinates stay integral.
    pub fn rotate90(self, v: &Vec3, clockwise: bool) -> Vec3 {
        match (self, clockwise) {
            (Axis::X, false) => Vec3::new(v.x, -v.z, v.y),
            (Axis::X, true) => Vec3::new(v.x, v.z, -v.y),
            (Axis::Y, false) => Vec3::new(v.z, v.y, -v.x),
            (Axis::Y, true) => Vec3::new(-v.z, v.y, v.x),
            (Axis::Z, false) => Vec3::new(-v.y, v.x, v.z),
            (Axis::Z, true) => Vec3::new(v.y, -v.x, v.z),
        }
    }
}
