//! Registration configuration.

use std::time::Duration;
use serde::{Deserialize, Serialize};
use crate::initializer::CenterInitialization;
use crate::metric::SamplingStrategy;
use crate::optimizer::scales::DEFAULT_TRANSLATION_SCALE;

/// Settings of one registration run.
///
/// Every field has a default, so a partial JSON document such as
/// `{"maximum_iterations": 50}` deserializes into a complete configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistrationConfig {
    /// Initial step length of the optimizer.
    pub maximum_step_length: f64,
    /// Step length below which the optimizer stops.
    pub minimum_step_length: f64,
    /// Maximum number of metric evaluations.
    pub maximum_iterations: usize,
    /// Scale of the translation parameters relative to the matrix entries.
    pub translation_scale: f64,
    /// Factor applied to the step length when the gradient reverses.
    pub relaxation_factor: f64,
    /// Scaled gradient magnitude below which the run has converged.
    pub gradient_magnitude_tolerance: f64,
    /// Fixed-image sampling.
    pub sampling: SamplingStrategy,
    /// How the transform center is chosen.
    pub center_initialization: CenterInitialization,
    /// Start from the translation that aligns the two image centers.
    pub initialize_translation: bool,
    /// Wall-clock budget, checked between iterations. Serialized in seconds.
    #[serde(with = "optional_seconds")]
    pub time_limit: Option<Duration>,
    /// Iterations between progress log lines.
    pub log_interval: usize,
}

impl Default for RegistrationConfig {
    fn default() -> Self {
        Self {
            maximum_step_length: 0.1,
            minimum_step_length: 1e-4,
            maximum_iterations: 300,
            translation_scale: DEFAULT_TRANSLATION_SCALE,
            relaxation_factor: 0.5,
            gradient_magnitude_tolerance: 1e-4,
            sampling: SamplingStrategy::Full,
            center_initialization: CenterInitialization::CenterOfMass,
            initialize_translation: false,
            time_limit: None,
            log_interval: 10,
        }
    }
}

impl RegistrationConfig {
    /// Create a configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set initial step length.
    pub fn with_maximum_step_length(mut self, length: f64) -> Self {
        self.maximum_step_length = length;
        self
    }

    /// Set minimum step length.
    pub fn with_minimum_step_length(mut self, length: f64) -> Self {
        self.minimum_step_length = length;
        self
    }

    /// Set maximum iterations.
    pub fn with_maximum_iterations(mut self, iterations: usize) -> Self {
        self.maximum_iterations = iterations;
        self
    }

    /// Set translation scale.
    pub fn with_translation_scale(mut self, scale: f64) -> Self {
        self.translation_scale = scale;
        self
    }

    /// Set relaxation factor.
    pub fn with_relaxation_factor(mut self, factor: f64) -> Self {
        self.relaxation_factor = factor;
        self
    }

    /// Set gradient magnitude tolerance.
    pub fn with_gradient_magnitude_tolerance(mut self, tolerance: f64) -> Self {
        self.gradient_magnitude_tolerance = tolerance;
        self
    }

    /// Set sampling strategy.
    pub fn with_sampling(mut self, sampling: SamplingStrategy) -> Self {
        self.sampling = sampling;
        self
    }

    /// Set center initialization mode.
    pub fn with_center_initialization(mut self, mode: CenterInitialization) -> Self {
        self.center_initialization = mode;
        self
    }

    /// Enable or disable moment-based translation initialization.
    pub fn with_initialize_translation(mut self, enabled: bool) -> Self {
        self.initialize_translation = enabled;
        self
    }

    /// Set time limit.
    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = Some(limit);
        self
    }

    /// Set log interval.
    pub fn with_log_interval(mut self, interval: usize) -> Self {
        self.log_interval = interval;
        self
    }
}

mod optional_seconds {
    use std::time::Duration;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error> {
        value.map(|d| d.as_secs_f64()).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Duration>, D::Error> {
        let seconds = Option::<f64>::deserialize(deserializer)?;
        seconds
            .map(|s| Duration::try_from_secs_f64(s).map_err(serde::de::Error::custom))
            .transpose()
    }
}
