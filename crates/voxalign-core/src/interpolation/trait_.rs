//! Interpolator trait for sampling values at continuous coordinates.
//!
//! This module defines the core Interpolator trait that all interpolation methods must implement.

use crate::image::Image;
use crate::spatial::{Point3, Vector3};

/// Interpolator trait for sampling values at continuous coordinates.
///
/// Interpolators are used to sample image values at non-integer coordinates,
/// which is essential for image registration and resampling. A sample that
/// falls outside the image grid is reported as `None`; callers decide what an
/// outside sample means (skip it, or substitute a default value).
pub trait Interpolator: Send + Sync {
    /// Interpolate the image at a continuous index.
    fn sample_at_index(&self, image: &Image, index: &Point3) -> Option<f64>;

    /// Interpolate the image at a continuous index and return the gradient
    /// of the interpolant with respect to the index.
    fn sample_with_gradient_at_index(&self, image: &Image, index: &Point3) -> Option<(f64, Vector3)>;

    /// Interpolate the image at a physical point.
    fn sample(&self, image: &Image, point: &Point3) -> Option<f64> {
        let index = image.transform_physical_point_to_continuous_index(point);
        self.sample_at_index(image, &index)
    }

    /// Interpolate the image at a physical point and return the gradient of
    /// the interpolant with respect to the physical point.
    ///
    /// `dI/dp = (S^-1 D^-1)^T * dI/dindex`
    fn sample_with_gradient(&self, image: &Image, point: &Point3) -> Option<(f64, Vector3)> {
        let index = image.transform_physical_point_to_continuous_index(point);
        let (value, index_gradient) = self.sample_with_gradient_at_index(image, &index)?;
        let gradient = image.geometry().index_from_physical().tr_mul(&index_gradient);
        Some((value, gradient))
    }
}

impl<I: Interpolator + ?Sized> Interpolator for &I {
    fn sample_at_index(&self, image: &Image, index: &Point3) -> Option<f64> {
        (**self).sample_at_index(image, index)
    }

    fn sample_with_gradient_at_index(&self, image: &Image, index: &Point3) -> Option<(f64, Vector3)> {
        (**self).sample_with_gradient_at_index(image, index)
    }
}
