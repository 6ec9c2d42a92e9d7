#![warn(missing_docs)]

//! Brush faces for the brushwork kernel.
//!
//! A [`Face`] is a half-space: an oriented plane whose normal points out of
//! the solid, the three points that define that plane (counter-clockwise
//! when seen from outside) and the texture attributes used to project a
//! material onto the side it bounds.

use brushwork_math::{Plane, Point2, Point3, Transform, Vec3};
use serde::{Deserialize, Serialize};

mod error;
mod texture;

pub use error::{FaceError, Result};
pub use texture::{base_axes, TexAxes};

/// Texture and surface attributes carried by a face.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FaceAttributes {
    /// Texture (material) name.
    pub name: String,
    /// Horizontal texture offset.
    pub x_offset: f64,
    /// Vertical texture offset.
    pub y_offset: f64,
    /// Texture rotation in degrees.
    pub rotation: f64,
    /// Horizontal texture scale.
    pub x_scale: f64,
    /// Vertical texture scale.
    pub y_scale: f64,
    /// Engine surface flags.
    pub surface_flags: u32,
    /// Engine content flags.
    pub contents: u32,
}

impl Default for FaceAttributes {
    fn default() -> Self {
        Self {
            name: String::new(),
            x_offset: 0.0,
            y_offset: 0.0,
            rotation: 0.0,
            x_scale: 1.0,
            y_scale: 1.0,
            surface_flags: 0,
            contents: 0,
        }
    }
}

impl FaceAttributes {
    /// Default attributes with the given texture name.
    pub fn with_texture(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// A half-space bounding a brush.
#[derive(Debug, Clone, PartialEq)]
pub struct Face {
    plane: Plane,
    points: [Point3; 3],
    attributes: FaceAttributes,
}

fn check_finite(points: &[Point3]) -> Result<()> {
    for p in points {
        if !p.coords.iter().all(|c| c.is_finite()) {
            return Err(FaceError::NonFinite(format!("{:?}", p)));
        }
    }
    Ok(())
}

impl Face {
    /// Create a face from three points.
    ///
    /// The normal is `(p2 - p1) × (p3 - p1)`, so the points must be
    /// counter-clockwise when viewed from outside the solid.
    pub fn from_points(
        p1: Point3,
        p2: Point3,
        p3: Point3,
        attributes: FaceAttributes,
    ) -> Result<Self> {
        check_finite(&[p1, p2, p3])?;
        let plane = Plane::from_points(&p1, &p2, &p3).ok_or(FaceError::CollinearPoints)?;
        Ok(Self {
            plane,
            points: [p1, p2, p3],
            attributes,
        })
    }

    /// Create a face from a plane, deriving three defining points on it.
    pub fn from_plane(plane: Plane, attributes: FaceAttributes) -> Result<Self> {
        if !plane.normal.iter().all(|c| c.is_finite()) || !plane.distance.is_finite() {
            return Err(FaceError::NonFinite(format!("{:?}", plane)));
        }
        if plane.normal.norm() < f64::EPSILON {
            return Err(FaceError::CollinearPoints);
        }
        let plane = Plane::new(plane.normal, plane.distance);
        let anchor = plane.anchor();
        let (u, v) = plane.tangent_frame();
        Ok(Self {
            plane,
            points: [anchor, anchor + u, anchor + v],
            attributes,
        })
    }

    /// The bounding plane (normal points outward).
    pub fn boundary(&self) -> &Plane {
        &self.plane
    }

    /// The three defining points.
    pub fn points(&self) -> &[Point3; 3] {
        &self.points
    }

    /// Texture and surface attributes.
    pub fn attributes(&self) -> &FaceAttributes {
        &self.attributes
    }

    /// Mutable access to the attributes.
    pub fn attributes_mut(&mut self) -> &mut FaceAttributes {
        &mut self.attributes
    }

    /// Texture name.
    pub fn texture_name(&self) -> &str {
        &self.attributes.name
    }

    /// Replace the defining points and recompute the plane.
    ///
    /// On error the face is left unchanged.
    pub fn set_points(&mut self, p1: Point3, p2: Point3, p3: Point3) -> Result<()> {
        check_finite(&[p1, p2, p3])?;
        let plane = Plane::from_points(&p1, &p2, &p3).ok_or(FaceError::CollinearPoints)?;
        self.plane = plane;
        self.points = [p1, p2, p3];
        Ok(())
    }

    /// Apply an affine transform to the face.
    ///
    /// Mirroring transforms also invert the winding of the defining points
    /// so the normal keeps pointing out of the (mirrored) solid.
    pub fn transform(&mut self, t: &Transform) -> Result<()> {
        let [p1, p2, p3] = self.points.map(|p| t.apply_point(&p));
        if t.is_mirroring() {
            self.set_points(p1, p3, p2)
        } else {
            self.set_points(p1, p2, p3)
        }
    }

    /// Rotated and scaled texture projection axes.
    pub fn tex_axes(&self) -> TexAxes {
        texture::tex_axes(&self.plane.normal, &self.attributes)
    }

    /// Texture coordinates of a point on the face.
    pub fn tex_coords(&self, point: &Point3) -> Point2 {
        texture::tex_coords(&self.tex_axes(), &self.attributes, &point.coords)
    }

    /// Outward unit normal.
    pub fn normal(&self) -> Vec3 {
        self.plane.normal
    }
}
