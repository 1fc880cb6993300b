//! Affine registration driver.
//!
//! Validates the inputs, initializes the transform, then alternates metric
//! evaluations and optimizer steps until the optimizer stops or the time
//! budget runs out.

use std::sync::Arc;
use std::time::{Duration, Instant};
use serde::{Deserialize, Serialize};
use voxalign_core::error::Result;
use voxalign_core::image::Image;
use voxalign_core::interpolation::{Interpolator, LinearInterpolator};
use voxalign_core::spatial::Point3;
use voxalign_core::transform::{AffineParameters, AffineTransform, AFFINE_PARAMETER_COUNT};
use crate::config::RegistrationConfig;
use crate::initializer::TransformInitializer;
use crate::metric::{MeanSquaresMetric, Metric};
use crate::optimizer::{CostFunction, ParameterScales, RegularStepGradientDescent, StopReason};
use crate::progress::{ConsoleProgressCallback, ProgressCallback, ProgressInfo, ProgressTracker};
use crate::validation;

/// Outcome of a registration run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistrationResult {
    /// Final transform parameters: 9 matrix entries row-major, then translation.
    pub parameters: [f64; AFFINE_PARAMETER_COUNT],
    /// Fixed center of the transform.
    pub center: [f64; 3],
    /// Number of metric evaluations performed by the optimizer.
    pub iterations: usize,
    /// Metric value at the last evaluation.
    pub final_value: f64,
    /// Smallest metric value seen.
    pub best_value: f64,
    /// Fixed-image samples inside the moving image at the last evaluation.
    pub number_of_valid_samples: usize,
    pub stop_reason: StopReason,
    /// Human-readable stop condition.
    pub stop_description: String,
    /// Wall-clock time spent in the run.
    pub elapsed: Duration,
}

impl RegistrationResult {
    /// The registered transform (fixed to moving).
    pub fn transform(&self) -> AffineTransform {
        AffineTransform::from_parameters(
            &AffineParameters::from_column_slice(&self.parameters),
            Point3::from(self.center),
        )
    }

    /// True when the optimizer settled on a minimum.
    pub fn is_converged(&self) -> bool {
        self.stop_reason.is_converged()
    }
}

/// Mean-squares cost over the affine parameters for a fixed center.
struct MeanSquaresCost<'a, I: Interpolator> {
    metric: &'a MeanSquaresMetric,
    fixed: &'a Image,
    moving: &'a Image,
    interpolator: &'a I,
    center: Point3,
    number_of_valid_samples: usize,
}

impl<I: Interpolator> CostFunction<AFFINE_PARAMETER_COUNT> for MeanSquaresCost<'_, I> {
    fn evaluate(&mut self, parameters: &AffineParameters) -> Result<(f64, AffineParameters)> {
        let transform = AffineTransform::from_parameters(parameters, self.center);
        let value = self.metric.evaluate(self.fixed, self.moving, &transform, self.interpolator)?;
        self.number_of_valid_samples = value.number_of_valid_samples;
        Ok((value.value, value.derivative))
    }
}

/// Single-resolution affine registration with a mean-squares metric and a
/// regular-step gradient descent optimizer.
///
/// # Examples
///
/// ```rust,no_run
/// use voxalign_core::image::{Image, ImageGeometry};
/// use voxalign_registration::{AffineRegistration, RegistrationConfig};
///
/// let fixed = Image::filled(ImageGeometry::from_size([32, 32, 32]), 1.0);
/// let moving = fixed.clone();
/// let result = AffineRegistration::new(RegistrationConfig::default())
///     .execute(&fixed, &moving)
///     .unwrap();
/// println!("{} after {} iterations", result.stop_description, result.iterations);
/// ```
pub struct AffineRegistration<I: Interpolator = LinearInterpolator> {
    config: RegistrationConfig,
    interpolator: I,
    tracker: ProgressTracker,
}

impl AffineRegistration<LinearInterpolator> {
    /// Create a registration with trilinear interpolation.
    pub fn new(config: RegistrationConfig) -> Self {
        Self::with_interpolator(config, LinearInterpolator::new())
    }
}

impl<I: Interpolator> AffineRegistration<I> {
    /// Create a registration with a custom interpolator.
    ///
    /// Progress is logged every `config.log_interval` iterations.
    pub fn with_interpolator(config: RegistrationConfig, interpolator: I) -> Self {
        let mut tracker = ProgressTracker::new();
        tracker.add_callback(Arc::new(ConsoleProgressCallback::new(config.log_interval)));
        Self {
            config,
            interpolator,
            tracker,
        }
    }

    /// Get the configuration.
    pub fn config(&self) -> &RegistrationConfig {
        &self.config
    }

    /// Add a progress callback.
    pub fn add_callback(&mut self, callback: Arc<dyn ProgressCallback>) {
        self.tracker.add_callback(callback);
    }

    /// Register `moving` onto `fixed`, starting from the identity about the
    /// center chosen by the configured initializer.
    pub fn execute(&self, fixed: &Image, moving: &Image) -> Result<RegistrationResult> {
        self.validate(fixed, moving)?;
        let initial = TransformInitializer::new(self.config.center_initialization)
            .with_translation(self.config.initialize_translation)
            .initialize(fixed, moving);
        self.run(fixed, moving, initial)
    }

    /// Register `moving` onto `fixed`, starting from `initial` (parameters and center).
    pub fn execute_with_initial(
        &self,
        fixed: &Image,
        moving: &Image,
        initial: AffineTransform,
    ) -> Result<RegistrationResult> {
        self.validate(fixed, moving)?;
        self.run(fixed, moving, initial)
    }

    fn validate(&self, fixed: &Image, moving: &Image) -> Result<()> {
        validation::validate_config(&self.config)?;
        validation::validate_image(fixed, "Fixed")?;
        validation::validate_image(moving, "Moving")?;
        Ok(())
    }

    fn run(&self, fixed: &Image, moving: &Image, initial: AffineTransform) -> Result<RegistrationResult> {
        let config = &self.config;
        let scales = ParameterScales::affine(config.translation_scale)?;
        let mut optimizer = RegularStepGradientDescent::new(scales)
            .with_maximum_step_length(config.maximum_step_length)
            .with_minimum_step_length(config.minimum_step_length)
            .with_maximum_iterations(config.maximum_iterations)
            .with_relaxation_factor(config.relaxation_factor)
            .with_gradient_magnitude_tolerance(config.gradient_magnitude_tolerance);
        optimizer.initialize(initial.parameters())?;

        let metric = MeanSquaresMetric::new().with_sampling(config.sampling);
        let center = initial.fixed_parameters();
        let mut cost = MeanSquaresCost {
            metric: &metric,
            fixed,
            moving,
            interpolator: &self.interpolator,
            center,
            number_of_valid_samples: 0,
        };

        tracing::info!(
            "Starting affine registration: fixed {:?}, moving {:?}, {} max iterations, step {} -> {}, center {:?}",
            fixed.size(),
            moving.size(),
            config.maximum_iterations,
            config.maximum_step_length,
            config.minimum_step_length,
            center.coords.as_slice()
        );

        let start = Instant::now();
        self.tracker.start();
        let mut last_info: Option<ProgressInfo> = None;

        let reason = loop {
            if let Some(limit) = config.time_limit {
                if start.elapsed() >= limit {
                    let description = format!(
                        "Time limit ({:.3}s) reached after {} iterations.",
                        limit.as_secs_f64(),
                        optimizer.state().iteration
                    );
                    optimizer.stop(StopReason::TimeLimitReached, description);
                }
            }

            match optimizer.step(&mut cost) {
                Ok(Some(record)) => {
                    tracing::debug!(
                        "Iteration {}: metric {:.6e}, |g| {:.3e}, step {:.3e}, samples {}",
                        record.iteration,
                        record.value,
                        record.gradient_magnitude,
                        record.step_length,
                        cost.number_of_valid_samples
                    );
                    last_info = Some(self.tracker.update(&record, Some(config.maximum_iterations)));
                }
                Ok(None) => {}
                Err(e) => {
                    self.tracker.error(&e.to_string());
                    return Err(e);
                }
            }

            if let Some(reason) = optimizer.state().stop_reason() {
                break reason;
            }
        };

        let state = optimizer.state();
        let (final_value, best_value) = match (state.value, state.best_value) {
            (Some(value), Some(best)) => (value, best),
            // Stopped before the first evaluation.
            _ => {
                let (value, _) = cost.evaluate(&state.position)?;
                (value, value)
            }
        };

        let mut parameters = [0.0; AFFINE_PARAMETER_COUNT];
        parameters.copy_from_slice(state.position.as_slice());
        let result = RegistrationResult {
            parameters,
            center: [center.x, center.y, center.z],
            iterations: state.iteration,
            final_value,
            best_value,
            number_of_valid_samples: cost.number_of_valid_samples,
            stop_reason: reason,
            stop_description: state.stop_description.clone().unwrap_or_else(|| reason.to_string()),
            elapsed: start.elapsed(),
        };

        self.tracker.complete(reason, last_info.as_ref());
        tracing::info!(
            "Registration finished: {} iterations, metric {:.6e}, {}",
            result.iterations,
            result.final_value,
            result.stop_description
        );
        Ok(result)
    }
}
