//! Half-space planes and convex plane sets
//!
//! A [`Plane`] is a half-space boundary `(normal, offset)` with the fixed sign
//! convention that a point `p` is inside iff `normal.dot(p) + offset <= 0`.
//! A [`PlaneSet`] is an ordered sequence of planes whose intersection defines
//! a convex region: the global bounding region (box planes plus optional wall
//! faces) or the per-seed cutting set grown during cell construction.

use glam::{Vec3, Vec4};
use parry3d::math::Point;
use parry3d::transformation;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::config::MIN_MARGIN;
use crate::error::{FractureError, Result};

/// A half-space boundary: unit normal plus signed distance offset
///
/// Immutable once constructed. Points with `normal.dot(p) + offset <= 0`
/// are inside the half-space.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    /// Unit-length outward normal
    pub normal: Vec3,
    /// Signed distance offset
    pub offset: f32,
}

impl Plane {
    /// Create a plane from an already-normalized normal and an offset
    #[inline]
    pub fn new(normal: Vec3, offset: f32) -> Self {
        Self { normal, offset }
    }

    /// Create a plane from a (not necessarily unit) normal and a point on it
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the normal has zero length.
    pub fn from_point(normal: Vec3, point: Vec3) -> Result<Self> {
        let normal = normal.try_normalize().ok_or_else(|| {
            FractureError::InvalidConfig("wall face with zero-length normal".into())
        })?;
        Ok(Self {
            normal,
            offset: -normal.dot(point),
        })
    }

    /// Signed distance of a point to the plane (negative = inside)
    #[inline]
    pub fn signed_distance(&self, p: Vec3) -> f32 {
        self.normal.dot(p) + self.offset
    }

    /// Half-space membership test within a tolerance
    #[inline]
    pub fn contains(&self, p: Vec3, eps: f32) -> bool {
        self.signed_distance(p) <= eps
    }

    /// The plane as a 4-vector `(nx, ny, nz, offset)`
    #[inline]
    pub fn to_vec4(&self) -> Vec4 {
        self.normal.extend(self.offset)
    }
}

/// An ordered, immutable set of half-space planes defining a convex region
///
/// Order carries no geometric meaning, only deterministic iteration for
/// reproducible output. Combining sets is plain concatenation.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlaneSet {
    planes: Vec<Plane>,
}

impl PlaneSet {
    /// Build the six axis-aligned planes of a bounding box, each displaced
    /// outward by `margin`
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` when `min >= max` on some axis or when
    /// `margin` is below [`MIN_MARGIN`].
    pub fn from_bounding_box(min: Vec3, max: Vec3, margin: f32) -> Result<Self> {
        if min.x >= max.x || min.y >= max.y || min.z >= max.z {
            return Err(FractureError::InvalidConfig(format!(
                "bounding box min {} must be strictly below max {} on every axis",
                min, max
            )));
        }
        if margin < MIN_MARGIN {
            return Err(FractureError::InvalidConfig(format!(
                "bounds margin must be >= {} (got {})",
                MIN_MARGIN, margin
            )));
        }

        let min = min - Vec3::splat(margin);
        let max = max + Vec3::splat(margin);
        let planes = vec![
            Plane::new(Vec3::X, -max.x),
            Plane::new(-Vec3::X, min.x),
            Plane::new(Vec3::Y, -max.y),
            Plane::new(-Vec3::Y, min.y),
            Plane::new(Vec3::Z, -max.z),
            Plane::new(-Vec3::Z, min.z),
        ];
        Ok(Self { planes })
    }

    /// Build one plane per `(normal, point_on_face)` pair, displaced outward
    /// by `margin`
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` for a zero-length face normal or a margin
    /// below [`MIN_MARGIN`].
    pub fn from_faces(faces: &[(Vec3, Vec3)], margin: f32) -> Result<Self> {
        if margin < MIN_MARGIN {
            return Err(FractureError::InvalidConfig(format!(
                "face margin must be >= {} (got {})",
                MIN_MARGIN, margin
            )));
        }

        let mut planes = Vec::with_capacity(faces.len());
        for &(normal, point) in faces {
            let mut plane = Plane::from_point(normal, point)?;
            plane.offset -= margin;
            planes.push(plane);
        }
        Ok(Self { planes })
    }

    /// Build wall planes from the convex hull of a point cloud
    ///
    /// One plane per hull triangle, displaced outward by `margin`. Tighter
    /// than the bounding box when the solid is far from box-shaped.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` when fewer than 4 points are given or the
    /// hull is degenerate.
    pub fn from_convex_hull(points: &[Vec3], margin: f32) -> Result<Self> {
        if points.len() < 4 {
            return Err(FractureError::InvalidConfig(format!(
                "convex hull walls need at least 4 points (got {})",
                points.len()
            )));
        }

        let hull_input: Vec<Point<f32>> = points.iter().map(|p| Point::new(p.x, p.y, p.z)).collect();
        let (vertices, triangles) = transformation::convex_hull(&hull_input);

        let mut faces = Vec::with_capacity(triangles.len());
        for tri in &triangles {
            let a = Vec3::new(vertices[tri[0] as usize].x, vertices[tri[0] as usize].y, vertices[tri[0] as usize].z);
            let b = Vec3::new(vertices[tri[1] as usize].x, vertices[tri[1] as usize].y, vertices[tri[1] as usize].z);
            let c = Vec3::new(vertices[tri[2] as usize].x, vertices[tri[2] as usize].y, vertices[tri[2] as usize].z);

            // parry emits counter-clockwise triangles, so the cross product
            // points outward. Degenerate slivers are skipped.
            let normal = (b - a).cross(c - a);
            if normal.length_squared() > 0.0 {
                faces.push((normal, a));
            }
        }
        if faces.is_empty() {
            return Err(FractureError::InvalidConfig(
                "convex hull of the point cloud is degenerate".into(),
            ));
        }
        Self::from_faces(&faces, margin)
    }

    /// Return a copy with every plane's offset recentred on `point`
    ///
    /// After recentring, the half-space test of a coordinate relative to
    /// `point` is equivalent to testing the absolute coordinate against the
    /// original set. The core algorithm evaluates all planes in this
    /// seed-relative frame.
    pub fn translated_to(&self, point: Vec3) -> Self {
        let planes = self
            .planes
            .iter()
            .map(|p| Plane::new(p.normal, p.offset + p.normal.dot(point)))
            .collect();
        Self { planes }
    }

    /// Concatenate two sets (order preserved: `self` first)
    pub fn concat(mut self, other: PlaneSet) -> Self {
        self.planes.extend(other.planes);
        self
    }

    /// The planes as 4-vectors, for the container backend boundary
    pub fn as_vec4s(&self) -> Vec<Vec4> {
        self.planes.iter().map(Plane::to_vec4).collect()
    }

    /// Planes as a slice
    #[inline]
    pub fn planes(&self) -> &[Plane] {
        &self.planes
    }

    /// Number of planes in the set
    #[inline]
    pub fn len(&self) -> usize {
        self.planes.len()
    }

    /// Whether the set is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.planes.is_empty()
    }

    /// Iterate over the planes
    pub fn iter(&self) -> impl Iterator<Item = &Plane> {
        self.planes.iter()
    }
}

impl std::ops::Index<usize> for PlaneSet {
    type Output = Plane;

    #[inline]
    fn index(&self, index: usize) -> &Plane {
        &self.planes[index]
    }
}
