//! Affine transform implementation.
//!
//! This module provides an affine transform (linear transformation + translation)
//! about a fixed center, with its flat 12-element parameter vector and the
//! derivative of a mapped point with respect to those parameters.

use nalgebra::{Matrix3, SMatrix, SVector};
use crate::spatial::{Point3, Vector3};
use super::trait_::Transform;

/// Number of optimizable parameters of a 3D affine transform.
pub const AFFINE_PARAMETER_COUNT: usize = 12;

/// Flat parameter vector: the 9 matrix entries row-major, then the translation.
pub type AffineParameters = SVector<f64, AFFINE_PARAMETER_COUNT>;

/// Derivative of a mapped point with respect to the 12 parameters.
pub type AffineJacobian = SMatrix<f64, 3, AFFINE_PARAMETER_COUNT>;

/// Affine Transform (Linear transformation + Translation).
///
/// Represents a general affine transformation with a fixed center:
/// T(x) = A(x - c) + c + t
///
/// where:
/// * A is a 3×3 matrix (linear transformation: rotation, scale, shear)
/// * t is a 3D translation vector
/// * c is the fixed center of rotation/scaling, not optimized
#[derive(Debug, Clone, PartialEq)]
pub struct AffineTransform {
    matrix: Matrix3<f64>,
    translation: Vector3,
    center: Point3,
}

impl AffineTransform {
    /// Create a new affine transform.
    pub fn new(matrix: Matrix3<f64>, translation: Vector3, center: Point3) -> Self {
        Self { matrix, translation, center }
    }

    /// Create an identity affine transform about `center`.
    pub fn identity(center: Point3) -> Self {
        Self::new(Matrix3::identity(), Vector3::zeros(), center)
    }

    /// Create a transform from a flat parameter vector and a center.
    pub fn from_parameters(parameters: &AffineParameters, center: Point3) -> Self {
        let mut transform = Self::identity(center);
        transform.set_parameters(parameters);
        transform
    }

    /// Get the flat parameter vector.
    pub fn parameters(&self) -> AffineParameters {
        let mut parameters = AffineParameters::zeros();
        for i in 0..3 {
            for j in 0..3 {
                parameters[3 * i + j] = self.matrix[(i, j)];
            }
            parameters[9 + i] = self.translation[i];
        }
        parameters
    }

    /// Replace the matrix and translation from a flat parameter vector.
    pub fn set_parameters(&mut self, parameters: &AffineParameters) {
        for i in 0..3 {
            for j in 0..3 {
                self.matrix[(i, j)] = parameters[3 * i + j];
            }
            self.translation[i] = parameters[9 + i];
        }
    }

    /// Get the fixed parameters (the center).
    pub fn fixed_parameters(&self) -> Point3 {
        self.center
    }

    /// Replace the center, keeping matrix and translation.
    pub fn set_fixed_parameters(&mut self, center: Point3) {
        self.center = center;
    }

    /// Get the transformation matrix.
    pub fn matrix(&self) -> &Matrix3<f64> {
        &self.matrix
    }

    /// Get the translation vector.
    pub fn translation(&self) -> &Vector3 {
        &self.translation
    }

    /// Get the center of rotation.
    pub fn center(&self) -> &Point3 {
        &self.center
    }

    /// Offset of the equivalent `A·x + offset` form: `c + t - A·c`.
    pub fn offset(&self) -> Vector3 {
        self.center.coords + self.translation - self.matrix * self.center.coords
    }

    /// Derivative of `T(point)` with respect to the parameters.
    ///
    /// `dT_i/dA_ij = p_j - c_j` and `dT_i/dt_i = 1`; every other entry is zero.
    pub fn jacobian(&self, point: &Point3) -> AffineJacobian {
        let centered = point - self.center;
        let mut jacobian = AffineJacobian::zeros();
        for i in 0..3 {
            for j in 0..3 {
                jacobian[(i, 3 * i + j)] = centered[j];
            }
            jacobian[(i, 9 + i)] = 1.0;
        }
        jacobian
    }

    /// Inverse transform about the same center, if the matrix is invertible.
    pub fn inverse(&self) -> Option<Self> {
        let inverse = self.matrix.try_inverse()?;
        Some(Self::new(inverse, -(inverse * self.translation), self.center))
    }
}

impl Transform for AffineTransform {
    #[inline]
    fn transform_point(&self, point: &Point3) -> Point3 {
        self.center + self.matrix * (point - self.center) + self.translation
    }
}
