//! Cellular (Voronoi) fracture decomposition of 3D solids
//!
//! Given a convex bounding region (half-space planes) and a set of seed
//! points inside it, computes for each seed the convex polyhedral cell of
//! space closer to that seed than to any other, clipped against the bounding
//! planes. This is the computational core of a mechanical-weathering fracture
//! simulation; host integration (scene objects, UI, materials) stays outside.
//!
//! # Quick Start
//!
//! ```rust
//! use cell_fracture::*;
//! use glam::Vec3;
//!
//! // Configure a deterministic generation
//! let config = FractureConfigBuilder::new()
//!     .seed(42)
//!     .source_limit(100)
//!     .build()
//!     .unwrap();
//!
//! // Seed points straight from host geometry
//! let sources = vec![PointSource::new(
//!     SourceKind::OwnVerts,
//!     vec![
//!         Vec3::new(-0.5, -0.5, 0.0),
//!         Vec3::new(0.5, -0.5, 0.0),
//!         Vec3::new(0.0, 0.5, 0.0),
//!     ],
//! )];
//! let seeds = preprocess_points(&sources, &[SourceKind::OwnVerts], &config, 1.0).unwrap();
//!
//! // Fracture the bounding box into one shard per seed
//! let result = FractureResult::generate(
//!     seeds,
//!     Vec3::splat(-1.0),
//!     Vec3::splat(1.0),
//!     &[],
//!     &config,
//! )
//! .unwrap();
//! println!("emitted {} of {} cells", result.emitted_count(), result.seed_count());
//! ```
//!
//! # Features
//!
//! - `parallel` (default): per-seed cell construction on a rayon thread pool
//! - `spatial-index` (default): O(log n) position-to-cell lookups via KD-tree
//! - `serde`: serialization support for configuration, planes and cells

// Modules
pub mod error;
pub mod config;
pub mod plane;
pub mod points;
pub mod cell;
pub mod builder;
pub mod container;
pub mod result;
pub mod store;

#[cfg(feature = "spatial-index")]
pub mod spatial;

// Re-export core types for convenience
pub use error::{FractureError, Result};
pub use config::{FractureConfig, FractureConfigBuilder, MIN_MARGIN};
pub use plane::{Plane, PlaneSet};
pub use points::{
    bounding_radius, collect_points, detect_enabled, preprocess_points, PointSource,
    SourceAvailability, SourceKind,
};
pub use cell::{FaceSource, FractureCell};
pub use builder::{build_cells, build_cells_cancellable, CancelToken};
pub use container::{ContainerBackend, ContainerCell, ContainerRequest, DEFAULT_WALLS_PRECISION};
pub use result::FractureResult;
pub use store::{FractureHierarchy, FractureId, FractureRole, FractureStore, RootLookup};

#[cfg(feature = "spatial-index")]
pub use spatial::SpatialIndex;

// Re-export glam::Vec3 for convenience
pub use glam::Vec3;
