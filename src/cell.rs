//! Fracture cell structure
//!
//! The result for one seed: the convex shard geometry plus the provenance of
//! each bounding face, which is what makes the decomposition adjacency-capable
//! for the downstream link/simulation graph.

use glam::Vec3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// What produced one face of a cell
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaceSource {
    /// A plane of the global bounding set (index into that set)
    Bound(usize),
    /// The bisector against another seed (original seed index)
    Neighbor(usize),
}

/// The convex cell assigned to one seed
///
/// Emitted by the builder, immutable afterwards. A seed whose cell collapses
/// during clipping yields no `FractureCell` at all; an emitted cell always
/// has a non-empty vertex set.
///
/// `faces` holds one entry per plane that actually bounds the final
/// polyhedron, in working-set order. Faces tagged [`FaceSource::Neighbor`]
/// are the contact surfaces the link graph is built from.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct FractureCell {
    /// Seed index this cell belongs to (0 to seed_count-1)
    pub id: usize,
    /// The seed point, in the solid's local space
    pub seed: Vec3,
    /// Vertices of the convex polyhedron, in the solid's local space
    pub vertices: Vec<Vec3>,
    /// Provenance of each active bounding plane
    pub faces: Vec<FaceSource>,
}

impl FractureCell {
    /// Number of polyhedron vertices
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Seed indices whose bisectors bound this cell
    pub fn neighbor_ids(&self) -> impl Iterator<Item = usize> + '_ {
        self.faces.iter().filter_map(|f| match f {
            FaceSource::Neighbor(j) => Some(*j),
            FaceSource::Bound(_) => None,
        })
    }

    /// Whether any face of this cell lies on the global bounding region
    pub fn touches_bounds(&self) -> bool {
        self.faces
            .iter()
            .any(|f| matches!(f, FaceSource::Bound(_)))
    }

    /// Mean of the vertex set
    ///
    /// Close to the volumetric centroid for the well-shaped shards this
    /// decomposition produces; good enough as a mass point for the link graph.
    pub fn centroid(&self) -> Vec3 {
        if self.vertices.is_empty() {
            return self.seed;
        }
        self.vertices.iter().sum::<Vec3>() / self.vertices.len() as f32
    }

    /// Distance from the seed to the farthest vertex
    pub fn bounding_radius(&self) -> f32 {
        self.vertices
            .iter()
            .map(|v| v.distance_squared(self.seed))
            .fold(0.0, f32::max)
            .sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_cell() -> FractureCell {
        FractureCell {
            id: 3,
            seed: Vec3::ZERO,
            vertices: vec![
                Vec3::new(-1.0, -1.0, 0.0),
                Vec3::new(1.0, -1.0, 0.0),
                Vec3::new(1.0, 1.0, 0.0),
                Vec3::new(-1.0, 1.0, 0.0),
            ],
            faces: vec![
                FaceSource::Bound(0),
                FaceSource::Neighbor(7),
                FaceSource::Neighbor(2),
            ],
        }
    }

    #[test]
    fn test_neighbor_ids() {
        let cell = unit_cell();
        let neighbors: Vec<usize> = cell.neighbor_ids().collect();
        assert_eq!(neighbors, vec![7, 2]);
        assert!(cell.touches_bounds());
    }

    #[test]
    fn test_centroid_and_radius() {
        let cell = unit_cell();
        assert!(cell.centroid().distance(Vec3::ZERO) < 1e-6);
        assert!((cell.bounding_radius() - 2.0f32.sqrt()).abs() < 1e-6);
    }

    #[test]
    fn test_interior_cell_has_no_bound_faces() {
        let mut cell = unit_cell();
        cell.faces = vec![FaceSource::Neighbor(1)];
        assert!(!cell.touches_bounds());
    }
}
