//! Seed point acquisition and filtering
//!
//! Produces the final seed list fed to the cell builder: collect raw points
//! from the enabled sources, subsample to the configured limit, collapse
//! duplicates, then jitter. The steps run in that fixed order; all randomness
//! comes from a single `ChaCha8Rng` seeded from the configuration, so a seeded
//! run is fully reproducible.

use glam::{Affine3A, Vec3};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::HashSet;
use std::f32::consts::TAU;

use crate::config::FractureConfig;
use crate::error::{FractureError, Result};

/// Decimal precision of the duplicate-point key (4 decimal places)
const DEDUP_SCALE: f32 = 1e4;

/// Kind of host geometry a point source was sampled from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    /// Vertices of the fractured object's own mesh
    OwnVerts,
    /// Vertices of child meshes (transformed into the parent's local space)
    ChildVerts,
    /// Particle positions on the object itself
    OwnParticles,
    /// Particle positions on child objects
    ChildParticles,
    /// Stroke/annotation sample points
    Strokes,
}

/// Whether a source can contribute points
///
/// An explicit capability query: the host reports up front whether a source
/// evaluated to points, evaluated to nothing, or could not be evaluated at
/// all, instead of signalling through a failed computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceAvailability {
    /// The source evaluated to at least one point
    Available,
    /// The source evaluated but yielded no points
    Empty,
    /// The host cannot evaluate this source (unsupported object type)
    Unsupported,
}

/// Raw candidate points handed over by the host geometry layer
///
/// Child sources carry the transform into the fractured object's local
/// space; own-geometry sources are already local.
#[derive(Debug, Clone)]
pub struct PointSource {
    /// What the points were sampled from
    pub kind: SourceKind,
    /// The sampled points, or `None` when the host cannot evaluate the source
    pub points: Option<Vec<Vec3>>,
    /// Transform applied to every point at collection time
    pub to_local: Option<Affine3A>,
}

impl PointSource {
    /// A source with points already in local space
    pub fn new(kind: SourceKind, points: Vec<Vec3>) -> Self {
        Self {
            kind,
            points: Some(points),
            to_local: None,
        }
    }

    /// A source whose points must be transformed into local space
    pub fn with_transform(kind: SourceKind, points: Vec<Vec3>, to_local: Affine3A) -> Self {
        Self {
            kind,
            points: Some(points),
            to_local: Some(to_local),
        }
    }

    /// A source the host could not evaluate
    pub fn unsupported(kind: SourceKind) -> Self {
        Self {
            kind,
            points: None,
            to_local: None,
        }
    }

    /// Capability of this source
    pub fn availability(&self) -> SourceAvailability {
        match &self.points {
            None => SourceAvailability::Unsupported,
            Some(points) if points.is_empty() => SourceAvailability::Empty,
            Some(_) => SourceAvailability::Available,
        }
    }
}

/// The source kinds that would actually contribute points
///
/// Used by hosts to enable/disable options before asking for a generation.
/// Order follows first appearance in `sources`; duplicates are collapsed.
pub fn detect_enabled(sources: &[PointSource]) -> Vec<SourceKind> {
    let mut seen = HashSet::new();
    sources
        .iter()
        .filter(|s| s.availability() == SourceAvailability::Available)
        .filter(|s| seen.insert(s.kind))
        .map(|s| s.kind)
        .collect()
}

/// Gather raw points from every source whose kind is enabled
///
/// Points are appended in source order, transformed into local space where
/// the source carries a transform.
pub fn collect_points(sources: &[PointSource], enabled: &[SourceKind]) -> Vec<Vec3> {
    let mut points = Vec::new();
    for source in sources {
        if !enabled.contains(&source.kind) {
            continue;
        }
        let Some(raw) = &source.points else { continue };
        match source.to_local {
            Some(m) => points.extend(raw.iter().map(|&p| m.transform_point3(p))),
            None => points.extend_from_slice(raw),
        }
    }
    points
}

/// Uniformly subsample down to `limit` points (0 = unlimited)
///
/// Shuffle then truncate, matching uniform unweighted sampling.
pub fn limit_points(points: &mut Vec<Vec3>, limit: usize, rng: &mut ChaCha8Rng) {
    if limit > 0 && limit < points.len() {
        points.shuffle(rng);
        points.truncate(limit);
    }
}

/// Collapse points equal up to 4 decimal places
///
/// Each point maps to a rounded-tuple key; the first point per key survives.
pub fn dedup_points(points: &mut Vec<Vec3>) {
    let mut seen = HashSet::with_capacity(points.len());
    points.retain(|p| {
        let key = (
            (p.x * DEDUP_SCALE).round() as i64,
            (p.y * DEDUP_SCALE).round() as i64,
            (p.z * DEDUP_SCALE).round() as i64,
        );
        seen.insert(key)
    });
}

/// Displace each point by a random vector of length `[0, noise * bb_radius)`
///
/// Direction is uniform on the unit sphere. A zero `noise` is a no-op.
pub fn add_noise(points: &mut [Vec3], noise: f32, bb_radius: f32, rng: &mut ChaCha8Rng) {
    if noise <= 0.0 {
        return;
    }
    let scalar = noise * bb_radius;
    for p in points.iter_mut() {
        *p += random_unit_vector(rng) * scalar * rng.gen::<f32>();
    }
}

/// Bounding radius of a box: half its diagonal
///
/// The scale reference for noise displacement.
pub fn bounding_radius(min: Vec3, max: Vec3) -> f32 {
    (max - min).length() * 0.5
}

/// Uniformly distributed direction on the unit sphere
fn random_unit_vector(rng: &mut ChaCha8Rng) -> Vec3 {
    let z: f32 = rng.gen_range(-1.0..=1.0);
    let theta: f32 = rng.gen_range(0.0..TAU);
    let r = (1.0 - z * z).max(0.0).sqrt();
    Vec3::new(r * theta.cos(), r * theta.sin(), z)
}

/// Run the full pipeline: collect, limit, dedup, noise
///
/// `bb_radius` is the bounding radius of the solid, used to scale the noise
/// displacement.
///
/// # Errors
///
/// Returns `NoSourcePoints` when no enabled source yields any point. This is
/// the recoverable "no points found" condition, not a crash: the caller may
/// enable another source or surface it to the user.
pub fn preprocess_points(
    sources: &[PointSource],
    enabled: &[SourceKind],
    config: &FractureConfig,
    bb_radius: f32,
) -> Result<Vec<Vec3>> {
    let mut points = collect_points(sources, enabled);
    if points.is_empty() {
        return Err(FractureError::NoSourcePoints);
    }

    let mut rng = ChaCha8Rng::seed_from_u64(config.seed as u64);
    limit_points(&mut points, config.source_limit, &mut rng);
    dedup_points(&mut points);
    add_noise(&mut points, config.source_noise, bb_radius, &mut rng);
    Ok(points)
}
