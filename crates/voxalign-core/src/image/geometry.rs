//! Image geometry: grid size plus physical metadata.
//!
//! The geometry describes how voxel indices map to physical coordinates:
//! `point = origin + Direction * (index * spacing)`.

use nalgebra::Matrix3;
use crate::error::{RegistrationError, Result};
use crate::spatial::{self, Direction3, Point3, Spacing3, Vector3, GEOMETRY_TOLERANCE};

/// Size, origin, spacing and direction of a 3D voxel grid.
///
/// Sizes are ordered `[x, y, z]`, with `x` the fastest-varying axis of the
/// voxel buffer. The geometry is validated once at construction and never
/// changes afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageGeometry {
    size: [usize; 3],
    origin: Point3,
    spacing: Spacing3,
    direction: Direction3,
    /// `Direction * diag(spacing)`
    physical_from_index: Matrix3<f64>,
    /// `diag(1 / spacing) * Direction^-1`
    index_from_physical: Matrix3<f64>,
}

impl ImageGeometry {
    /// Create a new geometry.
    ///
    /// # Errors
    /// `InvalidConfiguration` when a spacing is not strictly positive, when the
    /// origin is not finite, or when the direction matrix is singular.
    pub fn new(
        size: [usize; 3],
        origin: Point3,
        spacing: Spacing3,
        direction: Direction3,
    ) -> Result<Self> {
        if let Some(axis) = (0..3).find(|&i| !(spacing[i].is_finite() && spacing[i] > 0.0)) {
            return Err(RegistrationError::invalid_configuration(format!(
                "spacing must be positive and finite, got {} on axis {}",
                spacing[axis], axis
            )));
        }
        if !origin.coords.iter().all(|v| v.is_finite()) {
            return Err(RegistrationError::invalid_configuration(format!(
                "origin must be finite, got {:?}",
                origin.coords.as_slice()
            )));
        }
        let inverse_direction = direction
            .try_inverse()
            .filter(|m| m.iter().all(|v| v.is_finite()))
            .ok_or_else(|| {
                RegistrationError::invalid_configuration("direction matrix must be invertible")
            })?;
        if !spatial::is_orthonormal(&direction) {
            tracing::warn!("Direction matrix is not orthonormal: {}", direction);
        }

        let scale = Matrix3::from_diagonal(&spacing);
        let inverse_scale = Matrix3::from_diagonal(&spacing.map(|s| 1.0 / s));

        Ok(Self {
            size,
            origin,
            spacing,
            direction,
            physical_from_index: direction * scale,
            index_from_physical: inverse_scale * inverse_direction,
        })
    }

    /// Geometry with unit spacing, zero origin and identity direction.
    pub fn from_size(size: [usize; 3]) -> Self {
        Self {
            size,
            origin: Point3::origin(),
            spacing: Spacing3::repeat(1.0),
            direction: Direction3::identity(),
            physical_from_index: Matrix3::identity(),
            index_from_physical: Matrix3::identity(),
        }
    }

    /// Get the grid size `[x, y, z]`.
    pub fn size(&self) -> [usize; 3] {
        self.size
    }

    /// Get the origin (physical coordinate of voxel (0, 0, 0)).
    pub fn origin(&self) -> &Point3 {
        &self.origin
    }

    /// Get the spacing.
    pub fn spacing(&self) -> &Spacing3 {
        &self.spacing
    }

    /// Get the direction.
    pub fn direction(&self) -> &Direction3 {
        &self.direction
    }

    /// Matrix mapping a physical offset to a continuous index offset.
    ///
    /// Its transpose converts an index-space gradient into a physical-space
    /// gradient.
    pub fn index_from_physical(&self) -> &Matrix3<f64> {
        &self.index_from_physical
    }

    /// Total number of voxels.
    pub fn number_of_voxels(&self) -> usize {
        self.size.iter().product()
    }

    /// True when any axis has zero length.
    pub fn is_empty(&self) -> bool {
        self.number_of_voxels() == 0
    }

    /// Offset of voxel `[x, y, z]` in the voxel buffer.
    #[inline]
    pub fn linear_index(&self, index: [usize; 3]) -> usize {
        index[0] + self.size[0] * (index[1] + self.size[1] * index[2])
    }

    /// Voxel index of a buffer offset.
    #[inline]
    pub fn voxel_index(&self, linear: usize) -> [usize; 3] {
        let plane = self.size[0] * self.size[1];
        let z = linear / plane;
        let rem = linear % plane;
        [rem % self.size[0], rem / self.size[0], z]
    }

    /// Convert a continuous index to a physical point.
    #[inline]
    pub fn index_to_physical(&self, index: &Point3) -> Point3 {
        self.origin + self.physical_from_index * index.coords
    }

    /// Physical point of a discrete voxel.
    #[inline]
    pub fn voxel_to_physical(&self, index: [usize; 3]) -> Point3 {
        let continuous = Vector3::new(index[0] as f64, index[1] as f64, index[2] as f64);
        self.origin + self.physical_from_index * continuous
    }

    /// Convert a physical point to a continuous index.
    #[inline]
    pub fn physical_to_index(&self, point: &Point3) -> Point3 {
        Point3::from(self.index_from_physical * (point - self.origin))
    }

    /// Physical point at the middle of the grid.
    pub fn physical_center(&self) -> Point3 {
        let half = Point3::new(
            self.size[0].saturating_sub(1) as f64 / 2.0,
            self.size[1].saturating_sub(1) as f64 / 2.0,
            self.size[2].saturating_sub(1) as f64 / 2.0,
        );
        self.index_to_physical(&half)
    }

    /// True when size matches exactly and origin, spacing and direction agree
    /// within the geometry tolerance.
    pub fn is_compatible_with(&self, other: &ImageGeometry) -> bool {
        self.size == other.size
            && spatial::vectors_close(&self.origin.coords, &other.origin.coords, GEOMETRY_TOLERANCE)
            && spatial::vectors_close(&self.spacing, &other.spacing, GEOMETRY_TOLERANCE)
            && (0..3).all(|c| {
                spatial::vectors_close(
                    &self.direction.column(c).into_owned(),
                    &other.direction.column(c).into_owned(),
                    GEOMETRY_TOLERANCE,
                )
            })
    }

    /// Fail with `GeometryMismatch` unless `other` is compatible.
    pub fn ensure_compatible(&self, other: &ImageGeometry) -> Result<()> {
        if self.is_compatible_with(other) {
            Ok(())
        } else {
            Err(RegistrationError::geometry_mismatch(format!(
                "size {:?} / origin {:?} / spacing {:?} differ from size {:?} / origin {:?} / spacing {:?}",
                self.size,
                self.origin.coords.as_slice(),
                self.spacing.as_slice(),
                other.size,
                other.origin.coords.as_slice(),
                other.spacing.as_slice(),
            )))
        }
    }
}
