//! Quake-style planar texture projection.
//!
//! A face picks the base axis pair of the world plane its normal is closest
//! to, rotates that pair within its dominant components and divides by the
//! scale. Texture coordinates are then plain dot products plus offsets.

use brushwork_math::{Point2, Vec3};

use crate::FaceAttributes;

// normal, s axis, t axis: floor, ceiling, west, east, south, north
const BASE_AXES: [[[f64; 3]; 3]; 6] = [
    [[0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, -1.0, 0.0]],
    [[0.0, 0.0, -1.0], [1.0, 0.0, 0.0], [0.0, -1.0, 0.0]],
    [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, -1.0]],
    [[-1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, -1.0]],
    [[0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, -1.0]],
    [[0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, -1.0]],
];

fn vec(a: [f64; 3]) -> Vec3 {
    Vec3::new(a[0], a[1], a[2])
}

/// Projection axes of a face, already rotated and scaled.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TexAxes {
    /// Horizontal texture axis divided by the x scale.
    pub s: Vec3,
    /// Vertical texture axis divided by the y scale.
    pub t: Vec3,
    /// Normal of the base plane the axes were taken from.
    pub base_normal: Vec3,
}

/// Unscaled, unrotated base axes `(normal, s, t)` for a face normal.
pub fn base_axes(normal: &Vec3) -> (Vec3, Vec3, Vec3) {
    let mut best = 0;
    let mut best_dot = f64::NEG_INFINITY;
    for (i, axes) in BASE_AXES.iter().enumerate() {
        let d = normal.dot(&vec(axes[0]));
        if d > best_dot {
            best_dot = d;
            best = i;
        }
    }
    let axes = BASE_AXES[best];
    (vec(axes[0]), vec(axes[1]), vec(axes[2]))
}

fn nonzero_index(v: &Vec3) -> usize {
    if v.x != 0.0 {
        0
    } else if v.y != 0.0 {
        1
    } else {
        2
    }
}

/// Texture axes for a face with `normal` and `attributes`.
pub fn tex_axes(normal: &Vec3, attributes: &FaceAttributes) -> TexAxes {
    let (base_normal, mut s, mut t) = base_axes(normal);

    let (sin, cos) = attributes.rotation.to_radians().sin_cos();
    let si = nonzero_index(&s);
    let ti = nonzero_index(&t);
    for axis in [&mut s, &mut t] {
        let a = axis[si];
        let b = axis[ti];
        axis[si] = cos * a - sin * b;
        axis[ti] = sin * a + cos * b;
    }

    let sx = if attributes.x_scale == 0.0 { 1.0 } else { attributes.x_scale };
    let sy = if attributes.y_scale == 0.0 { 1.0 } else { attributes.y_scale };
    TexAxes {
        s: s / sx,
        t: t / sy,
        base_normal,
    }
}

/// Texture coordinates of `point` under the given axes and offsets.
pub fn tex_coords(axes: &TexAxes, attributes: &FaceAttributes, point: &Vec3) -> Point2 {
    Point2::new(
        point.dot(&axes.s) + attributes.x_offset,
        point.dot(&axes.t) + attributes.y_offset,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_base_axes_by_dominant_normal() {
        let (n, s, t) = base_axes(&Vec3::new(0.1, 0.2, 0.9));
        assert_eq!(n, Vec3::z());
        assert_eq!(s, Vec3::x());
        assert_eq!(t, -Vec3::y());

        let (n, s, t) = base_axes(&Vec3::new(-0.9, 0.1, 0.0));
        assert_eq!(n, -Vec3::x());
        assert_eq!(s, Vec3::y());
        assert_eq!(t, -Vec3::z());
    }

    #[test]
    fn test_rotation_and_scale() {
        let attrs = FaceAttributes {
            rotation: 90.0,
            x_scale: 2.0,
            y_scale: 0.5,
            ..FaceAttributes::default()
        };
        let axes = tex_axes(&Vec3::z(), &attrs);
        // x axis rotated by 90 degrees in the xy plane becomes +y
        assert_relative_eq!(axes.s, Vec3::new(0.0, 0.5, 0.0), epsilon = 1e-12);
        assert_relative_eq!(axes.t, Vec3::new(2.0, 0.0, 0.0), epsilon = 1e-12);
    }
}
