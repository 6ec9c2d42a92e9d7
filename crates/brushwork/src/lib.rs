#![warn(missing_docs)]

//! Convex brushes for level editing.
//!
//! A [`Brush`] is the intersection of half-spaces ([faces](Face)) inside a
//! world-sized seed cube, kept as a closed convex polyhedron that can be
//! picked, dragged and transformed.
//!
//! # Example
//!
//! ```
//! use brushwork::{Brush, BrushConfig};
//! use brushwork::brushwork_face::{Face, FaceAttributes};
//! use brushwork::brushwork_math::{Plane, Vec3};
//!
//! let faces = [Vec3::x(), -Vec3::x(), Vec3::y(), -Vec3::y(), Vec3::z(), -Vec3::z()]
//!     .map(|n| Face::from_plane(Plane::new(n, 32.0), FaceAttributes::default()).unwrap());
//! let brush = Brush::new(BrushConfig::default(), faces).unwrap();
//! assert_eq!(brush.geometry().vertex_count(), 8);
//! ```

pub use brushwork_face;
pub use brushwork_kernel;
pub use brushwork_math;

mod config;
mod error;

pub use config::BrushConfig;
pub use error::{BrushError, Result};

use brushwork_face::{Face, FaceAttributes};
use brushwork_kernel::{
    CutOutcome, CutResult, EdgeId, FaceChanges, FaceId, GroupMoveOutcome, KernelError,
    MeshElement, MoveOutcome, MoveResult, Polyhedron, RebuildOutcome, SideId, VertexId,
};
use brushwork_math::{Aabb3, Axis, Plane, Point3, Quat, Ray, Vec3};
use tracing::{debug, warn};

/// Where a ray hit a brush.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BrushHit {
    /// The face that was hit.
    pub face: FaceId,
    /// Distance along the ray.
    pub distance: f64,
    /// The hit point.
    pub point: Point3,
}

/// A closed convex brush.
///
/// Every operation either leaves the brush closed, convex and inside its
/// world bounds, or returns an error and leaves it unchanged.
#[derive(Debug, Clone)]
pub struct Brush {
    geometry: Polyhedron,
    config: BrushConfig,
}

impl Brush {
    // =========================================================================
    // Construction
    // =========================================================================

    /// Build a brush by cutting the world cube with `faces`.
    ///
    /// Redundant faces are discarded. Fails on an invalid `config`, if a
    /// face removes the whole volume or if the faces leave part of the
    /// world cube's boundary in place.
    pub fn new(config: BrushConfig, faces: impl IntoIterator<Item = Face>) -> Result<Self> {
        config.validate()?;
        let mut geometry = Polyhedron::new(config.world_bounds(), config.tolerance);
        let outcome = geometry.add_faces(faces)?;
        if outcome.nullified {
            return Err(BrushError::Nullified);
        }
        if !outcome.redundant.is_empty() {
            debug!(faces = ?outcome.redundant, "discarded redundant faces");
        }
        let brush = Self { geometry, config };
        brush.ensure_bounded()?;
        Ok(brush)
    }

    /// Axis-aligned box brush between `min` and `max`, every face carrying
    /// `attributes`.
    pub fn cuboid(
        config: BrushConfig,
        min: &Point3,
        max: &Point3,
        attributes: FaceAttributes,
    ) -> Result<Self> {
        let mut faces = Vec::with_capacity(6);
        for axis in [Axis::X, Axis::Y, Axis::Z] {
            let n = axis.unit();
            for (normal, point) in [(n, max), (-n, min)] {
                let plane = Plane::from_normal_and_point(normal, point);
                faces.push(Face::from_plane(plane, attributes.clone()).map_err(KernelError::from)?);
            }
        }
        Self::new(config, faces)
    }

    fn ensure_bounded(&self) -> Result<()> {
        if self.geometry.sides().any(|(_, s)| s.face.is_none()) {
            return Err(BrushError::Unbounded);
        }
        Ok(())
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// The configuration this brush was built with.
    pub fn config(&self) -> &BrushConfig {
        &self.config
    }

    /// Every face bounding the brush.
    pub fn faces(&self) -> impl Iterator<Item = (FaceId, &Face)> {
        self.geometry.faces()
    }

    /// One face.
    pub fn face(&self, id: FaceId) -> Result<&Face> {
        Ok(self.geometry.face(id)?)
    }

    /// Mutable texture attributes of one face.
    pub fn face_attributes_mut(&mut self, id: FaceId) -> Result<&mut FaceAttributes> {
        Ok(self.geometry.face_attributes_mut(id)?)
    }

    /// The underlying polyhedron.
    pub fn geometry(&self) -> &Polyhedron {
        &self.geometry
    }

    /// Tight bounds of the brush.
    pub fn bounds(&self) -> &Aabb3 {
        self.geometry.bounds()
    }

    /// Bounds of the world the brush lives in.
    pub fn world_bounds(&self) -> Aabb3 {
        self.config.world_bounds()
    }

    /// The face whose outward normal matches `normal`.
    pub fn find_face_by_normal(&self, normal: &Vec3) -> Option<FaceId> {
        let n = normal.try_normalize(f64::EPSILON)?;
        let tol = self.config.tolerance;
        self.faces()
            .find(|(_, f)| f.normal().dot(&n) >= 1.0 - tol.angular)
            .map(|(id, _)| id)
    }

    /// The face hit first by `ray`, seen from outside.
    pub fn pick(&self, ray: &Ray) -> Option<BrushHit> {
        if self.bounds().intersect_with_ray(ray).is_none() {
            return None;
        }
        let (sid, distance) = self.geometry.intersect_with_ray(ray)?;
        let face = self.geometry.side(sid).ok()?.face?;
        Some(BrushHit {
            face,
            distance,
            point: ray.point_at(distance),
        })
    }

    // =========================================================================
    // Faces
    // =========================================================================

    /// Cut the brush by one more face.
    ///
    /// A face that would remove the whole brush is refused with
    /// [`BrushError::Nullified`] and the brush is left as it was.
    pub fn add_face(&mut self, face: Face) -> Result<CutOutcome> {
        let mut work = self.geometry.clone();
        let outcome = work.add_face(face)?;
        if outcome.result == CutResult::Null {
            return Err(BrushError::Nullified);
        }
        self.geometry = work;
        Ok(outcome)
    }

    /// Re-cut the brush from a new world cube, keeping its face handles.
    pub fn rebuild(&mut self, world_half_extent: f64) -> Result<RebuildOutcome> {
        let mut config = self.config;
        config.world_half_extent = world_half_extent;
        config.validate()?;
        let mut work = self.geometry.clone();
        let outcome = work.rebuild(&config.world_bounds());
        if outcome.nullified {
            return Err(BrushError::Nullified);
        }
        let rebuilt = Self {
            geometry: work,
            config,
        };
        rebuilt.ensure_bounded()?;
        *self = rebuilt;
        Ok(outcome)
    }

    // =========================================================================
    // Moves
    // =========================================================================

    /// Drag a vertex, merging it into a vertex it lands on.
    pub fn move_vertex(&mut self, v: VertexId, delta: Vec3) -> Result<MoveOutcome> {
        self.move_vertex_with(v, delta, true)
    }

    /// Drag a vertex, optionally refusing to merge it.
    pub fn move_vertex_with(
        &mut self,
        v: VertexId,
        delta: Vec3,
        merge_incident: bool,
    ) -> Result<MoveOutcome> {
        self.guarded(
            |g| g.move_vertex_with(v, delta, merge_incident),
            |o| o.result.moved,
            || unmoved(MeshElement::Vertex(v)),
        )
    }

    /// Drag several vertices in lock-step, as far as all of them can go.
    pub fn move_vertices(&mut self, ids: &[VertexId], delta: Vec3) -> Result<GroupMoveOutcome> {
        self.guarded(
            |g| g.move_vertices(ids, delta),
            |o| o.moved,
            || GroupMoveOutcome {
                moved: false,
                vertices: ids.to_vec(),
                changes: FaceChanges::default(),
            },
        )
    }

    /// Drag an edge.
    pub fn move_edge(&mut self, e: EdgeId, delta: Vec3) -> Result<MoveOutcome> {
        self.guarded(
            |g| g.move_edge(e, delta),
            |o| o.result.moved,
            || unmoved(MeshElement::Edge(e)),
        )
    }

    /// Drag a side.
    pub fn move_side(&mut self, s: SideId, delta: Vec3) -> Result<MoveOutcome> {
        self.guarded(
            |g| g.move_side(s, delta),
            |o| o.result.moved,
            || unmoved(MeshElement::Side(s)),
        )
    }

    /// Whether [`move_vertices`](Self::move_vertices) would succeed.
    pub fn can_move_vertices(&self, ids: &[VertexId], delta: Vec3) -> Result<bool> {
        Ok(self.clone().move_vertices(ids, delta)?.moved)
    }

    /// Whether [`move_edge`](Self::move_edge) would change the brush.
    pub fn can_move_edge(&self, e: EdgeId, delta: Vec3) -> Result<bool> {
        Ok(self.clone().move_edge(e, delta)?.result.moved)
    }

    /// Whether [`move_side`](Self::move_side) would change the brush.
    pub fn can_move_side(&self, s: SideId, delta: Vec3) -> Result<bool> {
        Ok(self.clone().move_side(s, delta)?.result.moved)
    }

    /// Run a kernel move on a copy and keep it only if the brush stays
    /// inside the world.
    fn guarded<T>(
        &mut self,
        op: impl FnOnce(&mut Polyhedron) -> brushwork_kernel::Result<T>,
        moved: impl FnOnce(&T) -> bool,
        discarded: impl FnOnce() -> T,
    ) -> Result<T> {
        let mut work = self.geometry.clone();
        let outcome = op(&mut work)?;
        if moved(&outcome) && !self.world_bounds().contains(work.bounds()) {
            debug!("move would leave the world bounds, discarded");
            return Ok(discarded());
        }
        self.geometry = work;
        Ok(outcome)
    }

    // =========================================================================
    // Transforms
    // =========================================================================

    /// Translate the brush.
    pub fn translate(&mut self, delta: &Vec3) -> Result<()> {
        self.transformed(|g| g.translate(delta))
    }

    /// Rotate the brush about `center`.
    pub fn rotate(&mut self, rotation: &Quat, center: &Point3) -> Result<()> {
        self.transformed(|g| g.rotate(rotation, center))
    }

    /// Rotate the brush by a quarter turn about `axis` through `center`.
    pub fn rotate90(&mut self, axis: Axis, center: &Point3, clockwise: bool) -> Result<()> {
        self.transformed(|g| g.rotate90(axis, center, clockwise))
    }

    /// Mirror the brush across the plane perpendicular to `axis` through
    /// `center`.
    pub fn flip(&mut self, axis: Axis, center: &Point3) -> Result<()> {
        self.transformed(|g| g.flip(axis, center))
    }

    fn transformed(
        &mut self,
        op: impl FnOnce(&mut Polyhedron) -> brushwork_kernel::Result<()>,
    ) -> Result<()> {
        let mut work = self.geometry.clone();
        op(&mut work)?;
        if !self.world_bounds().contains(work.bounds()) {
            return Err(BrushError::OutsideWorld);
        }
        self.geometry = work;
        Ok(())
    }

    /// Round every vertex to the integer grid.
    ///
    /// Returns the face changes of the snap, or `None` when the snapped
    /// brush would no longer be closed and convex; the brush is then left
    /// as it was.
    pub fn snap(&mut self) -> Result<Option<FaceChanges>> {
        let mut work = self.geometry.clone();
        let changes: FaceChanges = work.snap()?;
        if !(work.closed() && work.is_convex()) {
            warn!("snapping would break the brush, discarded");
            return Ok(None);
        }
        debug!(
            added = changes.added.len(),
            dropped = changes.dropped.len(),
            "snapped brush"
        );
        self.geometry = work;
        Ok(Some(changes))
    }
}

fn unmoved(index: MeshElement) -> MoveOutcome {
    MoveOutcome {
        result: MoveResult {
            index,
            moved: false,
        },
        changes: FaceChanges::default(),
    }
}
