//! Mean Squared Error metric implementation.
//!
//! Computes `Σ (m(T(x)) - f(x))² / N` over the fixed-image samples whose
//! mapped point falls inside the moving image, together with its analytic
//! derivative with respect to the affine parameters:
//! `Σ 2 (m(T(x)) - f(x)) · J(x)ᵀ ∇m(T(x)) / N`.

use serde::{Deserialize, Serialize};
use voxalign_core::error::{RegistrationError, Result};
use voxalign_core::image::Image;
use voxalign_core::interpolation::Interpolator;
use voxalign_core::transform::{AffineParameters, AffineTransform, Transform};
use super::reduction::{chunked_map_reduce, SAMPLE_CHUNK_SIZE};
use super::trait_::{Metric, MetricValue};

/// Which fixed-image voxels are used as metric samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SamplingStrategy {
    /// Every voxel of the fixed image.
    #[default]
    Full,
    /// Every `step`-th voxel in linear (x-fastest) order.
    Regular {
        /// Distance between consecutive samples in the voxel buffer.
        step: usize,
    },
}

impl SamplingStrategy {
    /// Linear distance between consecutive samples.
    pub fn step(&self) -> usize {
        match self {
            Self::Full => 1,
            Self::Regular { step } => *step,
        }
    }

    /// Number of samples drawn from `number_of_voxels` voxels.
    pub fn sample_count(&self, number_of_voxels: usize) -> usize {
        number_of_voxels.div_ceil(self.step().max(1))
    }
}

/// Partial sums of one chunk of samples.
#[derive(Debug, Clone)]
struct Accumulator {
    sum_of_squares: f64,
    derivative: AffineParameters,
    count: usize,
}

impl Accumulator {
    fn zero() -> Self {
        Self {
            sum_of_squares: 0.0,
            derivative: AffineParameters::zeros(),
            count: 0,
        }
    }

    fn merge(self, other: Self) -> Self {
        Self {
            sum_of_squares: self.sum_of_squares + other.sum_of_squares,
            derivative: self.derivative + other.derivative,
            count: self.count + other.count,
        }
    }
}

/// Mean Squared Error metric.
///
/// Suited to images of the same modality whose intensities match once the
/// images are aligned.
#[derive(Debug, Clone, Copy, Default)]
pub struct MeanSquaresMetric {
    sampling: SamplingStrategy,
}

impl MeanSquaresMetric {
    /// Create a new MSE metric that samples every fixed voxel.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the sampling strategy.
    pub fn with_sampling(mut self, sampling: SamplingStrategy) -> Self {
        self.sampling = sampling;
        self
    }

    /// Get the sampling strategy.
    pub fn sampling(&self) -> SamplingStrategy {
        self.sampling
    }
}

impl Metric for MeanSquaresMetric {
    fn evaluate(
        &self,
        fixed: &Image,
        moving: &Image,
        transform: &AffineTransform,
        interpolator: &impl Interpolator,
    ) -> Result<MetricValue> {
        let step = self.sampling.step();
        if step == 0 {
            return Err(RegistrationError::invalid_configuration("sampling step must be positive"));
        }
        let geometry = fixed.geometry();
        let fixed_data = fixed.data();
        let samples = self.sampling.sample_count(fixed_data.len());

        let total = chunked_map_reduce(
            samples,
            SAMPLE_CHUNK_SIZE,
            |range| {
                let mut acc = Accumulator::zero();
                for sample in range {
                    let linear = sample * step;
                    let point = geometry.voxel_to_physical(geometry.voxel_index(linear));
                    let mapped = transform.transform_point(&point);
                    let Some((moving_value, gradient)) = interpolator.sample_with_gradient(moving, &mapped) else {
                        continue;
                    };
                    let diff = moving_value - fixed_data[linear] as f64;
                    acc.sum_of_squares += diff * diff;
                    acc.derivative += transform.jacobian(&point).tr_mul(&gradient) * (2.0 * diff);
                    acc.count += 1;
                }
                acc
            },
            Accumulator::merge,
        )
        .unwrap_or_else(Accumulator::zero);

        if total.count == 0 {
            return Err(RegistrationError::insufficient_overlap(samples));
        }

        let n = total.count as f64;
        Ok(MetricValue {
            value: total.sum_of_squares / n,
            derivative: total.derivative / n,
            number_of_valid_samples: total.count,
        })
    }

    fn name(&self) -> &'static str {
        "MeanSquares"
    }
}
