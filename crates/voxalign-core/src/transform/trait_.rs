//! Transform trait for spatial coordinate transformations.
//!
//! This module defines the core Transform trait that all spatial transforms must implement.

use crate::spatial::Point3;

/// Transform trait for spatial coordinate transformations.
///
/// Maps points from one physical space to another. During registration the
/// transform maps fixed-image points into moving-image space, which is also
/// the direction a resampler needs (output space to input space).
pub trait Transform: Send + Sync {
    /// Apply the transform to a single point.
    fn transform_point(&self, point: &Point3) -> Point3;
}

impl<T: Transform + ?Sized> Transform for &T {
    fn transform_point(&self, point: &Point3) -> Point3 {
        (**self).transform_point(point)
    }
}
