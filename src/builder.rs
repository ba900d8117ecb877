//! Incremental convex-cell construction
//!
//! The numerical core of the fracture decomposition. Each seed's cell starts
//! as the bounding region recentred on the seed and is clipped by the bisector
//! plane against each other seed in order of increasing distance, until the
//! remaining candidates are provably too far to touch the hull.
//!
//! Cell construction is embarrassingly parallel: each seed reads only the
//! immutable seed list and bounding planes and writes its own output slot, so
//! [`build_cells`] fans out across threads (with the `parallel` feature) while
//! staying bit-for-bit identical to the serial path.

use glam::Vec3;
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::cell::{FaceSource, FractureCell};
use crate::config::FractureConfig;
use crate::error::{FractureError, Result};
use crate::plane::{Plane, PlaneSet};

/// Fixed tolerance for half-space membership and for skipping near-parallel
/// plane triples. Contractual constant, do not tune per call site.
pub(crate) const GEOM_EPS: f32 = 1e-4;

/// Rounding scale of the coincident-corner key (4 decimal places, matching
/// the seed-point dedup precision)
const CORNER_SCALE: f32 = 1e4;

/// A working plane together with what produced it
#[derive(Debug, Clone, Copy)]
struct CutPlane {
    plane: Plane,
    source: FaceSource,
}

/// Cooperative cancellation flag, checked between seeds (never mid-seed)
///
/// Clones share the flag, so a host can keep one handle and pass the other
/// into a generation running on a worker thread.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// A fresh, uncancelled token
    pub fn new() -> Self {
        Self::default()
    }

    /// Request abandonment of the generation
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// Enumerate the vertices of the convex polytope defined by a plane set
///
/// Exact vertex enumeration: every triple of planes is intersected (triples
/// with a near-zero scalar triple product are skipped as parallel) and the
/// intersection point kept when it lies inside all half-spaces within
/// [`GEOM_EPS`]. Coincident corners produced by more than three planes
/// meeting at a point are collapsed.
///
/// Returns the vertices plus the sorted indices of the planes that bound at
/// least one vertex (the active set). An empty vertex list means the
/// half-spaces have no common volume.
pub(crate) fn half_space_vertices(planes: &[Plane]) -> (Vec<Vec3>, Vec<usize>) {
    let n = planes.len();
    let mut vertices = Vec::new();
    let mut active = vec![false; n];
    let mut seen = HashSet::new();

    for i in 0..n {
        for j in (i + 1)..n {
            let nij = planes[i].normal.cross(planes[j].normal);
            for k in (j + 1)..n {
                let denom = nij.dot(planes[k].normal);
                if denom.abs() < GEOM_EPS {
                    continue;
                }

                let p = (-planes[i].offset * planes[j].normal.cross(planes[k].normal)
                    - planes[j].offset * planes[k].normal.cross(planes[i].normal)
                    - planes[k].offset * nij)
                    / denom;

                if planes.iter().any(|pl| pl.signed_distance(p) > GEOM_EPS) {
                    continue;
                }

                active[i] = true;
                active[j] = true;
                active[k] = true;

                let key = (
                    (p.x * CORNER_SCALE).round() as i64,
                    (p.y * CORNER_SCALE).round() as i64,
                    (p.z * CORNER_SCALE).round() as i64,
                );
                if seen.insert(key) {
                    vertices.push(p);
                }
            }
        }
    }

    let active_indices = (0..n).filter(|&i| active[i]).collect();
    (vertices, active_indices)
}

/// The bisector plane between `seed` and `other` in the seed-relative frame
///
/// Offset is `-distance/2 + cell_margin`; a non-identity `scale` rotates the
/// plane and shortens the effective distance by the projection of the scaled
/// normal onto the original direction. Returns the plane together with that
/// effective distance, or `None` when the seeds coincide.
pub(crate) fn bisector_plane(
    seed: Vec3,
    other: Vec3,
    scale: Option<Vec3>,
    cell_margin: f32,
) -> Option<(Plane, f32)> {
    let direction = other - seed;
    let unit = direction.try_normalize()?;
    let mut nlength = direction.length();
    let mut normal = unit;

    if let Some(scale) = scale {
        let alt = direction * scale;
        let alt_unit = alt.try_normalize()?;
        nlength *= alt_unit.dot(unit);
        normal = alt_unit;
    }

    Some((Plane::new(normal, -nlength / 2.0 + cell_margin), nlength))
}

/// Twice the farthest vertex distance from the seed
///
/// The bound beyond which no future bisector can cut the hull: a bisector
/// sits at half the seed-to-candidate distance, so a candidate farther than
/// twice the farthest current vertex cannot reach any vertex. Squared
/// distances are compared and only the final maximum takes the square root.
/// The factor is kept exactly as 2; do not tighten it.
fn max_relevant_distance(vertices: &[Vec3]) -> f32 {
    let max_sq = vertices
        .iter()
        .map(|v| v.length_squared())
        .fold(0.0, f32::max);
    max_sq.sqrt() * 2.0
}

/// Drop working planes that no longer bound any vertex
///
/// The polytope only ever shrinks, so an inactive plane can never become
/// active again.
fn prune_to_active(working: &mut Vec<CutPlane>, active: &[usize]) {
    if active.len() != working.len() {
        *working = active.iter().map(|&k| working[k]).collect();
    }
}

/// Build the convex cell of one seed, or `None` when it collapses
///
/// All vertices are computed in the seed-relative frame and shifted back to
/// local space on emission.
pub(crate) fn build_cell(
    index: usize,
    seeds: &[Vec3],
    bounds: &PlaneSet,
    config: &FractureConfig,
) -> Option<FractureCell> {
    let seed = seeds[index];

    // Bounding planes recentred on the seed form the initial working set
    let mut working: Vec<CutPlane> = bounds
        .translated_to(seed)
        .iter()
        .enumerate()
        .map(|(i, &plane)| CutPlane {
            plane,
            source: FaceSource::Bound(i),
        })
        .collect();

    // All other seeds by squared distance, ties broken by input index so
    // identical input always clips in the same order
    let mut candidates: Vec<(f32, usize)> = seeds
        .iter()
        .enumerate()
        .filter(|&(j, _)| j != index)
        .map(|(j, &p)| (p.distance_squared(seed), j))
        .collect();
    candidates.sort_unstable_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

    // Initial hull from the bounding region alone; with no candidates at all
    // this is already the finished cell
    let planes: Vec<Plane> = working.iter().map(|c| c.plane).collect();
    let (mut vertices, active) = half_space_vertices(&planes);
    if vertices.is_empty() {
        return None;
    }
    prune_to_active(&mut working, &active);
    let mut distance_max = max_relevant_distance(&vertices);

    for (_, j) in candidates {
        let (plane, nlength) =
            bisector_plane(seed, seeds[j], config.seed_scale, config.cell_margin)?;

        // Monotonic ordering makes this cutoff exact: every later candidate
        // is at least as far
        if nlength > distance_max {
            break;
        }

        working.push(CutPlane {
            plane,
            source: FaceSource::Neighbor(j),
        });

        let planes: Vec<Plane> = working.iter().map(|c| c.plane).collect();
        let (new_vertices, active) = half_space_vertices(&planes);
        if new_vertices.is_empty() {
            // The cell collapsed to nothing: expected for crowded seeds
            return None;
        }
        vertices = new_vertices;
        prune_to_active(&mut working, &active);
        distance_max = max_relevant_distance(&vertices);
    }

    Some(FractureCell {
        id: index,
        seed,
        vertices: vertices.into_iter().map(|v| v + seed).collect(),
        faces: working.iter().map(|c| c.source).collect(),
    })
}

/// Build one cell per seed, indexed by seed
///
/// The output slot for a degenerate seed is `None`. With the `parallel`
/// feature the seeds are distributed across threads; the output is identical
/// to the serial path since each slot is self-contained.
pub fn build_cells(
    seeds: &[Vec3],
    bounds: &PlaneSet,
    config: &FractureConfig,
) -> Vec<Option<FractureCell>> {
    #[cfg(feature = "parallel")]
    {
        (0..seeds.len())
            .into_par_iter()
            .map(|i| build_cell(i, seeds, bounds, config))
            .collect()
    }
    #[cfg(not(feature = "parallel"))]
    {
        (0..seeds.len())
            .map(|i| build_cell(i, seeds, bounds, config))
            .collect()
    }
}

/// Like [`build_cells`], abandoning the run when the token is cancelled
///
/// The token is polled between seeds, so no partially clipped cell is ever
/// observable; a cancelled run yields `Err(Cancelled)` and no result.
pub fn build_cells_cancellable(
    seeds: &[Vec3],
    bounds: &PlaneSet,
    config: &FractureConfig,
    cancel: &CancelToken,
) -> Result<Vec<Option<FractureCell>>> {
    #[cfg(feature = "parallel")]
    let cells: Vec<Option<FractureCell>> = (0..seeds.len())
        .into_par_iter()
        .map(|i| {
            if cancel.is_cancelled() {
                None
            } else {
                build_cell(i, seeds, bounds, config)
            }
        })
        .collect();

    #[cfg(not(feature = "parallel"))]
    let cells: Vec<Option<FractureCell>> = {
        let mut out = Vec::with_capacity(seeds.len());
        for i in 0..seeds.len() {
            if cancel.is_cancelled() {
                return Err(FractureError::Cancelled);
            }
            out.push(build_cell(i, seeds, bounds, config));
        }
        out
    };

    if cancel.is_cancelled() {
        return Err(FractureError::Cancelled);
    }
    Ok(cells)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FractureConfigBuilder;

    fn config() -> FractureConfig {
        FractureConfigBuilder::new().seed(42).build().unwrap()
    }

    fn unit_cube_planes() -> Vec<Plane> {
        vec![
            Plane::new(Vec3::X, -1.0),
            Plane::new(-Vec3::X, -1.0),
            Plane::new(Vec3::Y, -1.0),
            Plane::new(-Vec3::Y, -1.0),
            Plane::new(Vec3::Z, -1.0),
            Plane::new(-Vec3::Z, -1.0),
        ]
    }

    fn contains_vertex(vertices: &[Vec3], target: Vec3) -> bool {
        vertices.iter().any(|v| v.distance(target) < 1e-3)
    }

    #[test]
    fn test_cube_vertex_enumeration() {
        let planes = unit_cube_planes();
        let (vertices, active) = half_space_vertices(&planes);

        assert_eq!(vertices.len(), 8);
        assert_eq!(active, vec![0, 1, 2, 3, 4, 5]);
        for sx in [-1.0, 1.0] {
            for sy in [-1.0, 1.0] {
                for sz in [-1.0, 1.0] {
                    assert!(contains_vertex(&vertices, Vec3::new(sx, sy, sz)));
                }
            }
        }
    }

    #[test]
    fn test_redundant_plane_is_inactive() {
        let mut planes = unit_cube_planes();
        // x <= 5 never touches the unit cube
        planes.push(Plane::new(Vec3::X, -5.0));

        let (vertices, active) = half_space_vertices(&planes);
        assert_eq!(vertices.len(), 8);
        assert_eq!(active, vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_contradictory_planes_yield_nothing() {
        // x <= -1 and x >= 1 cannot both hold
        let planes = vec![
            Plane::new(Vec3::X, 1.0),
            Plane::new(-Vec3::X, 1.0),
            Plane::new(Vec3::Y, -1.0),
            Plane::new(-Vec3::Y, -1.0),
            Plane::new(Vec3::Z, -1.0),
            Plane::new(-Vec3::Z, -1.0),
        ];
        let (vertices, _) = half_space_vertices(&planes);
        assert!(vertices.is_empty());
    }

    #[test]
    fn test_bisector_plane_midpoint() {
        let (plane, nlength) =
            bisector_plane(Vec3::ZERO, Vec3::new(2.0, 0.0, 0.0), None, 0.0).unwrap();
        assert_eq!(nlength, 2.0);
        assert_eq!(plane.normal, Vec3::X);
        // Midpoint (relative x = 1) lies exactly on the plane
        assert!(plane.signed_distance(Vec3::X).abs() < 1e-6);
        // The seed side is inside
        assert!(plane.contains(Vec3::ZERO, 0.0));
    }

    #[test]
    fn test_bisector_plane_margin_shrinks() {
        let (plane, _) =
            bisector_plane(Vec3::ZERO, Vec3::new(2.0, 0.0, 0.0), None, -0.25).unwrap();
        // Negative margin pulls the plane toward the seed
        assert!(plane.signed_distance(Vec3::new(0.75, 0.0, 0.0)).abs() < 1e-6);
    }

    #[test]
    fn test_bisector_plane_coincident_seeds() {
        assert!(bisector_plane(Vec3::ONE, Vec3::ONE, None, 0.0).is_none());
    }

    #[test]
    fn test_single_seed_fills_bounds() {
        let bounds =
            PlaneSet::from_bounding_box(Vec3::splat(-1.0), Vec3::splat(1.0), 0.001).unwrap();
        let seeds = vec![Vec3::ZERO];
        let cells = build_cells(&seeds, &bounds, &config());

        let cell = cells[0].as_ref().expect("single seed must yield a cell");
        assert_eq!(cell.vertex_count(), 8);
        // The cell is the full bounding region (box corners at +-1.001)
        for v in &cell.vertices {
            assert!((v.x.abs() - 1.001).abs() < 1e-3);
            assert!((v.y.abs() - 1.001).abs() < 1e-3);
            assert!((v.z.abs() - 1.001).abs() < 1e-3);
        }
        assert_eq!(cell.neighbor_ids().count(), 0);
    }

    #[test]
    fn test_two_seeds_split_box() {
        let bounds =
            PlaneSet::from_bounding_box(Vec3::splat(-1.0), Vec3::splat(1.0), 0.001).unwrap();
        let seeds = vec![Vec3::new(-0.5, 0.0, 0.0), Vec3::new(0.5, 0.0, 0.0)];
        let cells = build_cells(&seeds, &bounds, &config());

        let left = cells[0].as_ref().unwrap();
        let right = cells[1].as_ref().unwrap();

        // Each half is a box: 8 vertices, one neighbor face
        assert_eq!(left.vertex_count(), 8);
        assert_eq!(right.vertex_count(), 8);
        assert_eq!(left.neighbor_ids().collect::<Vec<_>>(), vec![1]);
        assert_eq!(right.neighbor_ids().collect::<Vec<_>>(), vec![0]);

        // The bisector sits at x = 0
        for v in &left.vertices {
            assert!(v.x <= 1e-3);
        }
        for v in &right.vertices {
            assert!(v.x >= -1e-3);
        }
    }

    #[test]
    fn test_coincident_seed_yields_no_cell() {
        let bounds =
            PlaneSet::from_bounding_box(Vec3::splat(-1.0), Vec3::splat(1.0), 0.001).unwrap();
        let seeds = vec![
            Vec3::new(-0.5, 0.0, 0.0),
            Vec3::new(0.5, 0.0, 0.0),
            Vec3::new(0.5, 0.0, 0.0),
        ];
        let cells = build_cells(&seeds, &bounds, &config());

        // The distinct seed survives; the coincident pair collapses
        assert!(cells[0].is_some());
        assert!(cells[1].is_none());
        assert!(cells[2].is_none());
    }

    #[test]
    fn test_vertices_satisfy_all_planes() {
        let bounds =
            PlaneSet::from_bounding_box(Vec3::splat(-2.0), Vec3::splat(2.0), 0.05).unwrap();
        let seeds = vec![
            Vec3::new(-1.0, -1.0, -1.0),
            Vec3::new(1.0, -0.5, 0.0),
            Vec3::new(0.0, 1.0, 0.5),
            Vec3::new(0.5, 0.5, -1.0),
            Vec3::new(-0.5, 1.0, 1.0),
        ];
        let cfg = config();
        let cells = build_cells(&seeds, &bounds, &cfg);

        for cell in cells.iter().flatten() {
            assert!(!cell.vertices.is_empty());
            let local_bounds = bounds.translated_to(cell.seed);
            for v in &cell.vertices {
                let rel = *v - cell.seed;
                for face in &cell.faces {
                    let plane = match face {
                        FaceSource::Bound(i) => local_bounds[*i],
                        FaceSource::Neighbor(j) => {
                            bisector_plane(cell.seed, seeds[*j], None, cfg.cell_margin)
                                .unwrap()
                                .0
                        }
                    };
                    assert!(
                        plane.contains(rel, 1e-3),
                        "vertex {} violates a cell plane by {}",
                        v,
                        plane.signed_distance(rel)
                    );
                }
            }
        }
    }

    #[test]
    fn test_seed_scale_rotates_bisector() {
        // Off-axis separation: anisotropic scale rotates the bisector plane
        // and shortens the effective distance by the projection factor
        let seed = Vec3::new(-0.5, -0.5, 0.0);
        let other = Vec3::new(0.5, 0.5, 0.0);

        let (plain, plain_len) = bisector_plane(seed, other, None, 0.0).unwrap();
        let (scaled, scaled_len) =
            bisector_plane(seed, other, Some(Vec3::new(4.0, 1.0, 1.0)), 0.0).unwrap();

        assert!(scaled_len < plain_len);
        assert!(scaled.normal.dot(plain.normal) < 0.999);
        // Both keep the seed on the inside
        assert!(plain.contains(Vec3::ZERO, 0.0));
        assert!(scaled.contains(Vec3::ZERO, 0.0));
    }

    #[test]
    fn test_seed_scale_changes_cells() {
        let bounds =
            PlaneSet::from_bounding_box(Vec3::splat(-1.0), Vec3::splat(1.0), 0.001).unwrap();
        let seeds = vec![Vec3::new(-0.5, -0.5, 0.0), Vec3::new(0.5, 0.5, 0.0)];
        let plain_cfg = config();
        let scaled_cfg = FractureConfigBuilder::new()
            .seed(42)
            .seed_scale(Vec3::new(4.0, 1.0, 1.0))
            .unwrap()
            .build()
            .unwrap();

        let plain = build_cells(&seeds, &bounds, &plain_cfg);
        let scaled = build_cells(&seeds, &bounds, &scaled_cfg);
        assert!(plain[0].is_some() && scaled[0].is_some());
        assert_ne!(plain[0], scaled[0]);
    }

    #[test]
    fn test_determinism_identical_runs() {
        let bounds =
            PlaneSet::from_bounding_box(Vec3::splat(-2.0), Vec3::splat(2.0), 0.05).unwrap();
        let seeds: Vec<Vec3> = (0..20)
            .map(|i| {
                let f = i as f32;
                Vec3::new((f * 0.37).sin(), (f * 0.71).cos(), (f * 0.13).sin()) * 1.5
            })
            .collect();
        let cfg = config();

        let a = build_cells(&seeds, &bounds, &cfg);
        let b = build_cells(&seeds, &bounds, &cfg);
        assert_eq!(a, b);
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_parallel_matches_serial() {
        let bounds =
            PlaneSet::from_bounding_box(Vec3::splat(-2.0), Vec3::splat(2.0), 0.05).unwrap();
        let seeds: Vec<Vec3> = (0..40)
            .map(|i| {
                let f = i as f32;
                Vec3::new((f * 0.37).sin(), (f * 0.71).cos(), (f * 0.13).sin()) * 1.5
            })
            .collect();
        let cfg = config();

        // The threaded path must be bit-identical to a plain serial map
        let parallel = build_cells(&seeds, &bounds, &cfg);
        let serial: Vec<Option<FractureCell>> = (0..seeds.len())
            .map(|i| build_cell(i, &seeds, &bounds, &cfg))
            .collect();
        assert_eq!(parallel, serial);
    }

    #[test]
    fn test_cancel_before_start() {
        let bounds =
            PlaneSet::from_bounding_box(Vec3::splat(-1.0), Vec3::splat(1.0), 0.05).unwrap();
        let seeds = vec![Vec3::ZERO];
        let cancel = CancelToken::new();
        cancel.cancel();

        let result = build_cells_cancellable(&seeds, &bounds, &config(), &cancel);
        assert!(matches!(result, Err(FractureError::Cancelled)));
    }

    #[test]
    fn test_uncancelled_token_passes_through() {
        let bounds =
            PlaneSet::from_bounding_box(Vec3::splat(-1.0), Vec3::splat(1.0), 0.05).unwrap();
        let seeds = vec![Vec3::ZERO];
        let cancel = CancelToken::new();

        let cells = build_cells_cancellable(&seeds, &bounds, &config(), &cancel).unwrap();
        assert_eq!(cells.len(), 1);
        assert!(cells[0].is_some());
    }
}
