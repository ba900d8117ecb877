//! Fracture result: the full decomposition of one generation request
//!
//! Owns the per-seed cells, the bounding plane set and the derived adjacency.
//! Built once per request and replaced wholesale on regeneration; there is no
//! incremental update.

use glam::Vec3;

use crate::builder::{bisector_plane, build_cells, build_cells_cancellable, CancelToken};
use crate::cell::{FaceSource, FractureCell};
use crate::config::FractureConfig;
use crate::error::{FractureError, Result};
use crate::plane::{Plane, PlaneSet};

#[cfg(feature = "spatial-index")]
use crate::spatial::SpatialIndex;

/// The complete fracture decomposition for one set of seeds
///
/// Cells are keyed by seed index; a `None` slot is a seed whose cell
/// collapsed during clipping (expected, not an error). Adjacency is derived
/// from the bisector-face provenance and symmetrized, ready for an external
/// link-graph/simulation builder.
///
/// # Example
///
/// ```rust
/// use cell_fracture::*;
/// use glam::Vec3;
///
/// let config = FractureConfigBuilder::new().seed(42).build().unwrap();
/// let seeds = vec![Vec3::new(-0.5, 0.0, 0.0), Vec3::new(0.5, 0.0, 0.0)];
/// let result = FractureResult::generate(
///     seeds,
///     Vec3::splat(-1.0),
///     Vec3::splat(1.0),
///     &[],
///     &config,
/// )
/// .unwrap();
/// assert_eq!(result.emitted_count(), 2);
/// ```
#[derive(Clone)]
pub struct FractureResult {
    config: FractureConfig,
    bounds: PlaneSet,
    bounds_min: Vec3,
    bounds_max: Vec3,
    seeds: Vec<Vec3>,
    cells: Vec<Option<FractureCell>>,
    neighbors: Vec<Vec<usize>>,
    #[cfg(feature = "spatial-index")]
    spatial_index: SpatialIndex,
}

impl FractureResult {
    /// Run a whole generation request
    ///
    /// `seeds` is the preprocessed seed list (see
    /// [`crate::preprocess_points`]); `wall_faces` are optional extra wall
    /// planes as `(normal, point_on_face)` pairs.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` when the seed list is empty, the box is malformed or a
    /// wall face is degenerate. Whole-run validation happens before any
    /// per-seed work; no partial result is ever produced.
    pub fn generate(
        seeds: Vec<Vec3>,
        bounds_min: Vec3,
        bounds_max: Vec3,
        wall_faces: &[(Vec3, Vec3)],
        config: &FractureConfig,
    ) -> Result<Self> {
        let bounds = Self::validate(&seeds, bounds_min, bounds_max, wall_faces, config)?;
        let cells = build_cells(&seeds, &bounds, config);
        Ok(Self::assemble(seeds, bounds, bounds_min, bounds_max, cells, config))
    }

    /// Like [`FractureResult::generate`], abandoning the run when `cancel`
    /// fires (checked between seeds)
    pub fn generate_cancellable(
        seeds: Vec<Vec3>,
        bounds_min: Vec3,
        bounds_max: Vec3,
        wall_faces: &[(Vec3, Vec3)],
        config: &FractureConfig,
        cancel: &CancelToken,
    ) -> Result<Self> {
        let bounds = Self::validate(&seeds, bounds_min, bounds_max, wall_faces, config)?;
        let cells = build_cells_cancellable(&seeds, &bounds, config, cancel)?;
        Ok(Self::assemble(seeds, bounds, bounds_min, bounds_max, cells, config))
    }

    fn validate(
        seeds: &[Vec3],
        bounds_min: Vec3,
        bounds_max: Vec3,
        wall_faces: &[(Vec3, Vec3)],
        config: &FractureConfig,
    ) -> Result<PlaneSet> {
        if seeds.is_empty() {
            return Err(FractureError::InvalidConfig(
                "cannot fracture with an empty seed list".into(),
            ));
        }
        let box_planes =
            PlaneSet::from_bounding_box(bounds_min, bounds_max, config.margin_box_bounds)?;
        let wall_planes = PlaneSet::from_faces(wall_faces, config.margin_face_bounds)?;
        Ok(box_planes.concat(wall_planes))
    }

    fn assemble(
        seeds: Vec<Vec3>,
        bounds: PlaneSet,
        bounds_min: Vec3,
        bounds_max: Vec3,
        cells: Vec<Option<FractureCell>>,
        config: &FractureConfig,
    ) -> Self {
        let neighbors = derive_neighbors(&cells);

        #[cfg(feature = "spatial-index")]
        let spatial_index = SpatialIndex::new(&seeds);

        Self {
            config: *config,
            bounds,
            bounds_min,
            bounds_max,
            seeds,
            cells,
            neighbors,
            #[cfg(feature = "spatial-index")]
            spatial_index,
        }
    }

    /// The configuration this result was generated with
    #[inline]
    pub fn config(&self) -> &FractureConfig {
        &self.config
    }

    /// The global bounding plane set (box planes first, then wall planes)
    #[inline]
    pub fn bounds(&self) -> &PlaneSet {
        &self.bounds
    }

    /// The bounding box corners the request was made with (margins not
    /// applied)
    #[inline]
    pub fn bounding_box(&self) -> (Vec3, Vec3) {
        (self.bounds_min, self.bounds_max)
    }

    /// The seed list, in builder order
    #[inline]
    pub fn seeds(&self) -> &[Vec3] {
        &self.seeds
    }

    /// Number of seeds (cell slots, emitted or not)
    #[inline]
    pub fn seed_count(&self) -> usize {
        self.seeds.len()
    }

    /// Number of seeds that actually produced a cell
    pub fn emitted_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }

    /// The cell of a seed, `None` when degenerate or out of range
    #[inline]
    pub fn cell(&self, id: usize) -> Option<&FractureCell> {
        self.cells.get(id).and_then(|c| c.as_ref())
    }

    /// All cell slots, indexed by seed
    #[inline]
    pub fn cells(&self) -> &[Option<FractureCell>] {
        &self.cells
    }

    /// Iterate over the emitted cells only
    pub fn emitted_cells(&self) -> impl Iterator<Item = &FractureCell> {
        self.cells.iter().flatten()
    }

    /// Neighbor seed indices of a cell (sorted, symmetric)
    ///
    /// Only seeds whose own cell was emitted appear. Empty for unknown ids.
    pub fn neighbors(&self, id: usize) -> &[usize] {
        self.neighbors.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Reconstruct the local-space face planes of an emitted cell
    ///
    /// One plane per `faces` entry, in the same order: bounding planes come
    /// straight from the global set, bisector planes are rebuilt from the
    /// seed pair (including cell margin and seed scale) and shifted out of
    /// the seed-relative frame. Every cell vertex satisfies every returned
    /// plane within tolerance; the downstream link graph uses these as
    /// contact planes.
    ///
    /// `None` for an unknown or degenerate id. An emitted cell never has a
    /// coincident neighbor, so its planes always reconstruct.
    pub fn face_planes(&self, id: usize) -> Option<Vec<Plane>> {
        let cell = self.cell(id)?;
        cell.faces
            .iter()
            .map(|face| match face {
                FaceSource::Bound(i) => Some(self.bounds[*i]),
                FaceSource::Neighbor(j) => {
                    let (rel, _) = bisector_plane(
                        cell.seed,
                        self.seeds[*j],
                        self.config.seed_scale,
                        self.config.cell_margin,
                    )?;
                    // Relative-frame plane to local space
                    Some(Plane::new(rel.normal, rel.offset - rel.normal.dot(cell.seed)))
                }
            })
            .collect()
    }

    /// The cell owning a position (requires the `spatial-index` feature)
    ///
    /// Nearest-seed lookup; `None` when that seed's cell was degenerate.
    #[cfg(feature = "spatial-index")]
    pub fn find_cell_at(&self, position: Vec3) -> Option<&FractureCell> {
        self.cell(self.spatial_index.nearest_seed(position))
    }
}

/// Symmetrized neighbor lists from the bisector-face provenance
///
/// A neighbor is kept only when its own cell was emitted; lists are sorted
/// and deduplicated for deterministic output.
fn derive_neighbors(cells: &[Option<FractureCell>]) -> Vec<Vec<usize>> {
    let mut neighbors: Vec<Vec<usize>> = vec![Vec::new(); cells.len()];
    for cell in cells.iter().flatten() {
        for j in cell.neighbor_ids() {
            if cells[j].is_some() {
                neighbors[cell.id].push(j);
                neighbors[j].push(cell.id);
            }
        }
    }
    for list in &mut neighbors {
        list.sort_unstable();
        list.dedup();
    }
    neighbors
}
