//! Spatial types for points, vectors, spacing and direction matrices.
//!
//! All types are nalgebra aliases over `f64`. Images in voxalign are always
//! three dimensional, so only the 3D forms are provided.

use nalgebra::{Matrix3, Point3 as NaPoint3, Vector3 as NaVector3};

pub type Point3 = NaPoint3<f64>;
pub type Vector3 = NaVector3<f64>;
pub type Spacing3 = NaVector3<f64>;
pub type Direction3 = Matrix3<f64>;

/// Tolerance used when comparing direction cosines and spacings.
pub const GEOMETRY_TOLERANCE: f64 = 1e-6;

/// Check if a direction matrix is orthonormal (`D * D^T = I`).
pub fn is_orthonormal(direction: &Direction3) -> bool {
    let product = direction * direction.transpose();
    let identity = Direction3::identity();
    (0..3).all(|i| (0..3).all(|j| (product[(i, j)] - identity[(i, j)]).abs() < GEOMETRY_TOLERANCE))
}

/// Component-wise closeness of two vectors.
pub(crate) fn vectors_close(a: &Vector3, b: &Vector3, tolerance: f64) -> bool {
    (0..3).all(|i| (a[i] - b[i]).abs() <= tolerance * (1.0 + a[i].abs().max(b[i].abs())))
}
