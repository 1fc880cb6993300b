//! Regular-step gradient descent.
//!
//! Each iteration moves the parameters a fixed distance (the current step
//! length) against the scaled gradient. Whenever the scaled gradient turns by
//! more than 90 degrees between iterations, or the value rises above the
//! previous evaluation, the step length is multiplied by the relaxation
//! factor. A step length is therefore only kept while the value goes down.

use std::fmt;
use nalgebra::SVector;
use serde::{Deserialize, Serialize};
use voxalign_core::error::Result;
use crate::validation;
use super::scales::ParameterScales;
use super::trait_::CostFunction;

/// Why the optimizer stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The scaled gradient magnitude fell below the tolerance.
    Converged,
    /// The step length fell below the minimum step length.
    StepTooSmall,
    /// The iteration budget was used up.
    MaxIterationsReached,
    /// The wall-clock budget was used up.
    TimeLimitReached,
}

impl StopReason {
    /// True for the two ways the search can settle on a minimum.
    pub fn is_converged(&self) -> bool {
        matches!(self, Self::Converged | Self::StepTooSmall)
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Converged => "Converged",
            Self::StepTooSmall => "StepTooSmall",
            Self::MaxIterationsReached => "MaxIterationsReached",
            Self::TimeLimitReached => "TimeLimitReached",
        };
        f.write_str(name)
    }
}

/// Lifecycle of an optimization run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptimizerPhase {
    /// Reset by `initialize`, nothing evaluated yet.
    Initialized,
    /// At least one `step` has run.
    Iterating,
    /// Terminal.
    Stopped(StopReason),
}

/// Everything the optimizer carries from one iteration to the next.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizerState<const N: usize> {
    /// Current parameters.
    pub position: SVector<f64, N>,
    /// Current step length.
    pub step_length: f64,
    /// Number of cost evaluations performed.
    pub iteration: usize,
    /// Value at the most recent evaluation.
    pub value: Option<f64>,
    /// Smallest value seen so far.
    pub best_value: Option<f64>,
    /// Gradient at the most recent evaluation.
    pub gradient: SVector<f64, N>,
    /// Gradient at the evaluation before that.
    pub previous_gradient: SVector<f64, N>,
    pub phase: OptimizerPhase,
    /// Human-readable stop condition, set once stopped.
    pub stop_description: Option<String>,
}

impl<const N: usize> OptimizerState<N> {
    fn new(position: SVector<f64, N>, step_length: f64) -> Self {
        Self {
            position,
            step_length,
            iteration: 0,
            value: None,
            best_value: None,
            gradient: SVector::zeros(),
            previous_gradient: SVector::zeros(),
            phase: OptimizerPhase::Initialized,
            stop_description: None,
        }
    }

    /// Stop reason, if stopped.
    pub fn stop_reason(&self) -> Option<StopReason> {
        match self.phase {
            OptimizerPhase::Stopped(reason) => Some(reason),
            _ => None,
        }
    }
}

/// Summary of one evaluated iteration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IterationRecord {
    /// Evaluations performed so far, including this one.
    pub iteration: usize,
    /// Value at the evaluated position.
    pub value: f64,
    /// Magnitude of the scaled gradient.
    pub gradient_magnitude: f64,
    /// Step length used (or rejected) in this iteration.
    pub step_length: f64,
    /// Set when this iteration stopped the run.
    pub stop_reason: Option<StopReason>,
}

/// Regular-step gradient descent minimizer.
#[derive(Debug, Clone)]
pub struct RegularStepGradientDescent<const N: usize> {
    maximum_step_length: f64,
    minimum_step_length: f64,
    maximum_iterations: usize,
    relaxation_factor: f64,
    gradient_magnitude_tolerance: f64,
    scales: ParameterScales<N>,
    state: OptimizerState<N>,
}

impl<const N: usize> RegularStepGradientDescent<N> {
    /// Create an optimizer with the default settings and the given scales.
    pub fn new(scales: ParameterScales<N>) -> Self {
        Self {
            maximum_step_length: 0.1,
            minimum_step_length: 1e-4,
            maximum_iterations: 300,
            relaxation_factor: 0.5,
            gradient_magnitude_tolerance: 1e-4,
            scales,
            state: OptimizerState::new(SVector::zeros(), 0.1),
        }
    }

    /// Set the initial step length.
    pub fn with_maximum_step_length(mut self, length: f64) -> Self {
        self.maximum_step_length = length;
        self
    }

    /// Set the step length below which the run stops.
    pub fn with_minimum_step_length(mut self, length: f64) -> Self {
        self.minimum_step_length = length;
        self
    }

    /// Set the iteration budget.
    pub fn with_maximum_iterations(mut self, iterations: usize) -> Self {
        self.maximum_iterations = iterations;
        self
    }

    /// Set the factor applied to the step length on a direction reversal or
    /// a rising value.
    pub fn with_relaxation_factor(mut self, factor: f64) -> Self {
        self.relaxation_factor = factor;
        self
    }

    /// Set the scaled gradient magnitude below which the run has converged.
    pub fn with_gradient_magnitude_tolerance(mut self, tolerance: f64) -> Self {
        self.gradient_magnitude_tolerance = tolerance;
        self
    }

    /// Get the scales.
    pub fn scales(&self) -> &ParameterScales<N> {
        &self.scales
    }

    /// Get the iteration budget.
    pub fn maximum_iterations(&self) -> usize {
        self.maximum_iterations
    }

    /// Get the current state.
    pub fn state(&self) -> &OptimizerState<N> {
        &self.state
    }

    /// Validate the settings and reset the state to start from `position`.
    pub fn initialize(&mut self, position: SVector<f64, N>) -> Result<()> {
        validation::validate_step_lengths(self.maximum_step_length, self.minimum_step_length)?;
        validation::validate_relaxation_factor(self.relaxation_factor)?;
        validation::validate_tolerance(self.gradient_magnitude_tolerance)?;
        if !position.iter().all(|p| p.is_finite()) {
            return Err(voxalign_core::RegistrationError::invalid_configuration(
                "initial parameters must be finite",
            ));
        }
        self.state = OptimizerState::new(position, self.maximum_step_length);
        Ok(())
    }

    /// Stop the run from outside, e.g. when a time budget runs out.
    pub fn stop(&mut self, reason: StopReason, description: impl Into<String>) {
        self.state.phase = OptimizerPhase::Stopped(reason);
        self.state.stop_description = Some(description.into());
    }

    /// Run one iteration.
    ///
    /// Returns the record of the evaluation, or `None` when no evaluation
    /// happened (already stopped, or the iteration budget is exhausted).
    /// Evaluation errors are returned unchanged and leave the position as it was.
    pub fn step(&mut self, cost: &mut impl CostFunction<N>) -> Result<Option<IterationRecord>> {
        if self.state.stop_reason().is_some() {
            return Ok(None);
        }
        self.state.phase = OptimizerPhase::Iterating;

        if self.state.iteration >= self.maximum_iterations {
            let description = format!(
                "Maximum number of iterations ({}) exceeded.",
                self.maximum_iterations
            );
            self.stop(StopReason::MaxIterationsReached, description);
            return Ok(None);
        }

        self.state.previous_gradient = self.state.gradient;
        let (value, gradient) = cost.evaluate(&self.state.position)?;
        validation::validate_finite(value, gradient.as_slice())?;
        let increased = self.state.value.is_some_and(|previous| value > previous);

        self.state.value = Some(value);
        self.state.best_value = Some(self.state.best_value.map_or(value, |best| best.min(value)));
        self.state.gradient = gradient;

        let scaled = self.scales.apply(&gradient);
        let previous_scaled = self.scales.apply(&self.state.previous_gradient);
        let magnitude = scaled.norm();

        let mut stop_reason = None;
        if magnitude == 0.0 || magnitude < self.gradient_magnitude_tolerance {
            stop_reason = Some(StopReason::Converged);
        } else {
            if increased || scaled.dot(&previous_scaled) < 0.0 {
                self.state.step_length *= self.relaxation_factor;
            }
            if self.state.step_length < self.minimum_step_length {
                stop_reason = Some(StopReason::StepTooSmall);
            } else {
                self.state.position -= scaled * (self.state.step_length / magnitude);
            }
        }
        self.state.iteration += 1;

        let record = IterationRecord {
            iteration: self.state.iteration,
            value,
            gradient_magnitude: magnitude,
            step_length: self.state.step_length,
            stop_reason,
        };

        match stop_reason {
            Some(StopReason::Converged) => {
                let description = format!(
                    "Gradient magnitude tolerance met after {} iterations. Gradient magnitude ({}) is less than gradient magnitude tolerance ({}).",
                    self.state.iteration, magnitude, self.gradient_magnitude_tolerance
                );
                self.stop(StopReason::Converged, description);
            }
            Some(StopReason::StepTooSmall) => {
                let description = format!(
                    "Step too small after {} iterations. Current step ({}) is less than minimum step ({}).",
                    self.state.iteration, self.state.step_length, self.minimum_step_length
                );
                self.stop(StopReason::StepTooSmall, description);
            }
            _ => {}
        }

        Ok(Some(record))
    }

    /// Iterate until a stop condition is met.
    pub fn run(&mut self, cost: &mut impl CostFunction<N>) -> Result<StopReason> {
        loop {
            self.step(cost)?;
            if let Some(reason) = self.state.stop_reason() {
                return Ok(reason);
            }
        }
    }
}
