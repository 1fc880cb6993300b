//! Difference image filter.
//!
//! Subtracts two images voxel by voxel and rescales the result linearly into
//! a display range, the same way an intensity rescale filter maps the input
//! minimum and maximum onto the output range.

use burn::tensor::backend::Backend;
use burn::tensor::ElementConversion;
use crate::error::Result;
use crate::image::Image;

/// Linear rescale coefficients `(scale, shift)` mapping `[input_min, input_max]`
/// onto `[output_min, output_max]`.
///
/// A degenerate input range falls back to `(output_max - output_min) / input_max`
/// when `input_max` is non-zero and to a zero scale otherwise, so a constant
/// zero input maps to `output_min`.
pub fn rescale_coefficients(input_min: f64, input_max: f64, output_min: f64, output_max: f64) -> (f64, f64) {
    let scale = if input_min != input_max {
        (output_max - output_min) / (input_max - input_min)
    } else if input_max != 0.0 {
        (output_max - output_min) / input_max
    } else {
        0.0
    };
    (scale, output_min - input_min * scale)
}

/// Voxel-wise `a - b`, rescaled into `[output_minimum, output_maximum]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DifferenceImageFilter {
    output_minimum: f64,
    output_maximum: f64,
}

impl Default for DifferenceImageFilter {
    fn default() -> Self {
        Self {
            output_minimum: 0.0,
            output_maximum: 255.0,
        }
    }
}

impl DifferenceImageFilter {
    /// Create a filter with the default `[0, 255]` output range.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the output range.
    pub fn with_output_range(mut self, minimum: f64, maximum: f64) -> Self {
        self.output_minimum = minimum;
        self.output_maximum = maximum;
        self
    }

    /// Get the output minimum.
    pub fn output_minimum(&self) -> f64 {
        self.output_minimum
    }

    /// Get the output maximum.
    pub fn output_maximum(&self) -> f64 {
        self.output_maximum
    }

    /// Compute the rescaled difference `a - b` on backend `B`.
    ///
    /// # Errors
    /// `GeometryMismatch` unless both images share the same geometry.
    pub fn apply<B: Backend>(&self, a: &Image, b: &Image, device: &B::Device) -> Result<Image> {
        a.geometry().ensure_compatible(b.geometry())?;
        if a.is_empty() {
            return Image::new(a.geometry().clone(), Vec::new());
        }

        let difference = a.to_tensor::<B>(device) - b.to_tensor::<B>(device);
        let input_min = difference.clone().min().into_scalar().elem::<f64>();
        let input_max = difference.clone().max().into_scalar().elem::<f64>();
        let (scale, shift) =
            rescale_coefficients(input_min, input_max, self.output_minimum, self.output_maximum);
        tracing::debug!(
            "Difference range [{}, {}] rescaled with scale {} and shift {}",
            input_min,
            input_max,
            scale,
            shift
        );

        let rescaled = difference.mul_scalar(scale).add_scalar(shift);
        Image::from_tensor(rescaled, a.geometry().clone())
    }
}
