//! Fracture configuration and builder
//!
//! This module provides the configuration type for deterministic fracture
//! generation. The same configuration (with an explicit seed) will always
//! produce the identical decomposition.

use glam::Vec3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{FractureError, Result};

/// Smallest accepted bounding/face margin.
///
/// A zero margin risks seed points lying exactly on a boundary plane, which
/// makes the half-space membership test degenerate.
pub const MIN_MARGIN: f32 = 0.001;

/// Configuration for a fracture generation request
///
/// Defaults match the interactive tool this library was extracted from:
/// 100-point limit, no noise, 0.05 box margin, 0.025 face margin, no cell
/// margin. Only the configuration is cheap to store and serialize; the
/// generated cells are rebuilt from it on demand.
///
/// # Example
///
/// ```rust
/// use cell_fracture::*;
///
/// let config = FractureConfigBuilder::new()
///     .seed(42)
///     .source_limit(200)
///     .source_noise(0.1)
///     .unwrap()
///     .cell_margin(-0.01)
///     .build()
///     .unwrap();
/// assert_eq!(config.seed, 42);
/// ```
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FractureConfig {
    /// Random seed driving point subsampling and noise jitter
    ///
    /// The same seed (with identical input points and scalars) always
    /// produces the exact same seed list and therefore the same cells.
    pub seed: u32,

    /// Maximum number of seed points kept after collection (0 = unlimited)
    ///
    /// When the collected count exceeds the limit, the list is shuffled with
    /// the seeded RNG and truncated (uniform, unweighted subsampling).
    pub source_limit: usize,

    /// Point jitter amount in [0, 1], as a fraction of the bounding radius
    ///
    /// 0.0 disables noise. Applied after deduplication so jittered points
    /// are no longer exact duplicates.
    pub source_noise: f32,

    /// Signed bias added to every bisector plane offset
    ///
    /// Negative values shrink each cell away from its neighbors, visually
    /// and physically separating adjacent shards. Default 0.0.
    pub cell_margin: f32,

    /// Outward displacement of the six bounding-box planes
    pub margin_box_bounds: f32,

    /// Outward displacement of wall-face planes
    pub margin_face_bounds: f32,

    /// Anisotropic shard scaling applied to bisector normals
    ///
    /// `None` (or the identity scale) keeps cells isotropic. Non-uniform
    /// values stretch the decomposition along the given axes.
    pub seed_scale: Option<Vec3>,

    /// Numerical precision override for the container backend
    ///
    /// `None` means the backend's own default. Ignored by the built-in
    /// incremental builder.
    pub walls_precision: Option<u32>,
}

impl Default for FractureConfig {
    fn default() -> Self {
        FractureConfigBuilder::new().build().unwrap()
    }
}

/// Builder for [`FractureConfig`] with validation
///
/// Checked setters return `Result<Self>` so invalid scalars are rejected at
/// configuration time rather than mid-generation.
#[derive(Debug, Clone)]
pub struct FractureConfigBuilder {
    seed: Option<u32>,
    source_limit: usize,
    source_noise: f32,
    cell_margin: f32,
    margin_box_bounds: f32,
    margin_face_bounds: f32,
    seed_scale: Option<Vec3>,
    walls_precision: Option<u32>,
}

impl FractureConfigBuilder {
    /// Create a new builder with default values
    ///
    /// Defaults:
    /// - seed: random (generated at `build()` time)
    /// - source_limit: 100
    /// - source_noise: 0.0
    /// - cell_margin: 0.0
    /// - margin_box_bounds: 0.05
    /// - margin_face_bounds: 0.025
    /// - seed_scale: None
    /// - walls_precision: None
    pub fn new() -> Self {
        Self {
            seed: None,
            source_limit: 100,
            source_noise: 0.0,
            cell_margin: 0.0,
            margin_box_bounds: 0.05,
            margin_face_bounds: 0.025,
            seed_scale: None,
            walls_precision: None,
        }
    }

    /// Set the random seed
    ///
    /// Required for reproducible output; otherwise a random seed is drawn.
    pub fn seed(mut self, seed: u32) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Limit the number of seed points (0 = unlimited)
    pub fn source_limit(mut self, limit: usize) -> Self {
        self.source_limit = limit;
        self
    }

    /// Set the point jitter amount
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if `noise` is outside [0, 1].
    pub fn source_noise(mut self, noise: f32) -> Result<Self> {
        if !(0.0..=1.0).contains(&noise) {
            return Err(FractureError::InvalidConfig(format!(
                "source noise must be in [0, 1] (got {})",
                noise
            )));
        }
        self.source_noise = noise;
        Ok(self)
    }

    /// Set the signed bisector-plane bias
    ///
    /// Accepts negative values (shrinks shards). No range check: the value
    /// is a geometric offset in local-space units.
    pub fn cell_margin(mut self, margin: f32) -> Self {
        self.cell_margin = margin;
        self
    }

    /// Set the bounding-box plane margin
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if `margin < MIN_MARGIN`.
    pub fn margin_box_bounds(mut self, margin: f32) -> Result<Self> {
        if margin < MIN_MARGIN {
            return Err(FractureError::InvalidConfig(format!(
                "box margin must be >= {} (got {})",
                MIN_MARGIN, margin
            )));
        }
        self.margin_box_bounds = margin;
        Ok(self)
    }

    /// Set the wall-face plane margin
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if `margin < MIN_MARGIN`.
    pub fn margin_face_bounds(mut self, margin: f32) -> Result<Self> {
        if margin < MIN_MARGIN {
            return Err(FractureError::InvalidConfig(format!(
                "face margin must be >= {} (got {})",
                MIN_MARGIN, margin
            )));
        }
        self.margin_face_bounds = margin;
        Ok(self)
    }

    /// Set anisotropic shard scaling
    ///
    /// The identity scale is stored as `None`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if any component is not strictly positive.
    pub fn seed_scale(mut self, scale: Vec3) -> Result<Self> {
        if scale.min_element() <= 0.0 {
            return Err(FractureError::InvalidConfig(format!(
                "seed scale components must be positive (got {})",
                scale
            )));
        }
        self.seed_scale = if scale == Vec3::ONE { None } else { Some(scale) };
        Ok(self)
    }

    /// Override the container backend precision
    pub fn walls_precision(mut self, precision: u32) -> Self {
        self.walls_precision = Some(precision);
        self
    }

    /// Build the configuration
    ///
    /// If no seed was provided, generates a random one.
    pub fn build(self) -> Result<FractureConfig> {
        let seed = self.seed.unwrap_or_else(rand::random);

        Ok(FractureConfig {
            seed,
            source_limit: self.source_limit,
            source_noise: self.source_noise,
            cell_margin: self.cell_margin,
            margin_box_bounds: self.margin_box_bounds,
            margin_face_bounds: self.margin_face_bounds,
            seed_scale: self.seed_scale,
            walls_precision: self.walls_precision,
        })
    }
}

impl Default for FractureConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
