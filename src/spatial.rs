//! Position-to-cell lookups
//!
//! Only available with the `spatial-index` feature. In a Voronoi
//! decomposition the owning cell of any position is the cell of the nearest
//! seed, so a KD-tree over the seed points answers "which shard is this point
//! in" in O(log n).

use glam::Vec3;
use kiddo::immutable::float::kdtree::ImmutableKdTree;
use kiddo::SquaredEuclidean;

/// KD-tree over the seed points of a fracture result
///
/// Built once per generation; queries are read-only and cheap. Used by the
/// host for raycast hits, debris spawning and link-graph probes.
#[derive(Clone)]
pub struct SpatialIndex {
    tree: ImmutableKdTree<f32, usize, 3, 32>,
}

impl SpatialIndex {
    /// Build the index from the seed list
    ///
    /// `seeds` must be non-empty (a fracture result always carries at least
    /// one seed); the underlying tree does not accept an empty point set.
    pub fn new(seeds: &[Vec3]) -> Self {
        debug_assert!(!seeds.is_empty(), "spatial index needs at least one seed");
        let entries: Vec<[f32; 3]> = seeds.iter().map(|s| [s.x, s.y, s.z]).collect();
        Self {
            tree: ImmutableKdTree::new_from_slice(&entries),
        }
    }

    /// Seed index nearest to `position`
    ///
    /// For positions inside the bounding region this is the index of the
    /// owning cell (which may still have been omitted as degenerate; check
    /// the result's cell slot).
    pub fn nearest_seed(&self, position: Vec3) -> usize {
        let query = [position.x, position.y, position.z];
        self.tree.nearest_one::<SquaredEuclidean>(&query).item
    }
}
