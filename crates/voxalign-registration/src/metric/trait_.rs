//! Metric trait for image similarity measurement.
//!
//! This module defines the core Metric trait that all similarity metrics
//! must implement for image registration.

use voxalign_core::error::Result;
use voxalign_core::image::Image;
use voxalign_core::interpolation::Interpolator;
use voxalign_core::transform::{AffineParameters, AffineTransform};

/// Value and derivative of a metric for one transform.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricValue {
    /// Dissimilarity; lower is better.
    pub value: f64,
    /// Derivative of `value` with respect to the transform parameters.
    pub derivative: AffineParameters,
    /// Fixed-image samples that mapped inside the moving image.
    pub number_of_valid_samples: usize,
}

/// Metric trait for measuring similarity between images.
///
/// Metrics compute a value that represents the dissimilarity between
/// a fixed (reference) image and a moving image seen through a transform.
/// Lower values indicate better alignment. A metric holds no state between
/// evaluations.
pub trait Metric: Send + Sync {
    /// Evaluate value and parameter derivative.
    ///
    /// # Arguments
    /// * `fixed` - The fixed (reference) image
    /// * `moving` - The moving image
    /// * `transform` - Maps fixed-image physical points into moving-image space
    /// * `interpolator` - Samples the moving image
    fn evaluate(
        &self,
        fixed: &Image,
        moving: &Image,
        transform: &AffineTransform,
        interpolator: &impl Interpolator,
    ) -> Result<MetricValue>;

    /// Get the name of this metric.
    fn name(&self) -> &'static str;
}
