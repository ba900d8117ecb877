//! External container backend boundary
//!
//! Alternative/validation backend: an already-correct external computational
//! geometry library (a voro++-style container) computes the same decomposition
//! from the same seed points, box limits and wall planes. Only the contract is
//! specified here; implementations live outside the core and are trusted.

use glam::{Vec3, Vec4};

use crate::error::Result;

/// Wall-plane precision used when a request carries no override
///
/// Matches the container adaptor's own default; treat as a fixed constant.
pub const DEFAULT_WALLS_PRECISION: u32 = 4;

/// One invocation of the external backend
///
/// Wall planes are 4-vectors `(nx, ny, nz, offset)` under the same sign
/// convention as [`crate::Plane`] (see [`crate::PlaneSet::as_vec4s`]).
#[derive(Debug, Clone)]
pub struct ContainerRequest<'a> {
    /// Seed points in the solid's local space
    pub points: &'a [Vec3],
    /// Bounding box limits (min corner, max corner), margins already applied
    pub limits: (Vec3, Vec3),
    /// Additional wall planes beyond the box
    pub walls: &'a [Vec4],
    /// Numerical precision tuning; `None` = backend default
    pub precision: Option<u32>,
}

impl<'a> ContainerRequest<'a> {
    /// The precision the backend should run at
    #[inline]
    pub fn effective_precision(&self) -> u32 {
        self.precision.unwrap_or(DEFAULT_WALLS_PRECISION)
    }
}

/// One cell as reported by the backend
///
/// Opaque beyond the seed association and the bounding face planes; callers
/// that need full geometry run the built-in builder instead.
#[derive(Debug, Clone)]
pub struct ContainerCell {
    /// Index of the seed this cell belongs to
    pub seed_index: usize,
    /// Face planes of the cell as 4-vectors
    pub face_planes: Vec<Vec4>,
}

/// Contract for an external half-space/Voronoi computation library
///
/// `compute` returns one cell per surviving seed, or `BackendFailure` when
/// the library rejects the configuration (degenerate input, precision issues).
/// Callers may retry with the default precision or fall back to the built-in
/// builder; no retry is performed here.
pub trait ContainerBackend {
    /// Compute the decomposition for one request
    fn compute(&self, request: &ContainerRequest<'_>) -> Result<Vec<ContainerCell>>;

    /// The precision this backend runs at when none is requested
    fn default_precision(&self) -> u32 {
        DEFAULT_WALLS_PRECISION
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FractureError;

    /// Minimal stand-in backend: one cell per point, box faces only
    struct StubBackend {
        fail: bool,
    }

    impl ContainerBackend for StubBackend {
        fn compute(&self, request: &ContainerRequest<'_>) -> Result<Vec<ContainerCell>> {
            if self.fail {
                return Err(FractureError::BackendFailure(
                    "container rejected degenerate input".into(),
                ));
            }
            Ok(request
                .points
                .iter()
                .enumerate()
                .map(|(i, _)| ContainerCell {
                    seed_index: i,
                    face_planes: request.walls.to_vec(),
                })
                .collect())
        }
    }

    #[test]
    fn test_stub_backend_cell_per_seed() {
        let points = vec![Vec3::ZERO, Vec3::X, Vec3::Y];
        let walls = vec![Vec4::new(1.0, 0.0, 0.0, -2.0)];
        let request = ContainerRequest {
            points: &points,
            limits: (Vec3::splat(-2.0), Vec3::splat(2.0)),
            walls: &walls,
            precision: None,
        };

        let backend = StubBackend { fail: false };
        let cells = backend.compute(&request).unwrap();
        assert_eq!(cells.len(), 3);
        assert_eq!(cells[1].seed_index, 1);
        assert_eq!(cells[0].face_planes, walls);
    }

    #[test]
    fn test_backend_failure_surfaces() {
        let points = vec![Vec3::ZERO];
        let request = ContainerRequest {
            points: &points,
            limits: (Vec3::splat(-1.0), Vec3::splat(1.0)),
            walls: &[],
            precision: Some(8),
        };
        assert_eq!(request.effective_precision(), 8);

        let backend = StubBackend { fail: true };
        let result = backend.compute(&request);
        assert!(matches!(result, Err(FractureError::BackendFailure(_))));
    }

    #[test]
    fn test_default_precision() {
        let request = ContainerRequest {
            points: &[],
            limits: (Vec3::ZERO, Vec3::ONE),
            walls: &[],
            precision: None,
        };
        assert_eq!(request.effective_precision(), DEFAULT_WALLS_PRECISION);
    }
}
