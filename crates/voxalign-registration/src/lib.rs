//! Single-resolution affine registration.
//!
//! A mean-squares metric with analytic gradient, a regular-step gradient
//! descent optimizer and the driver that runs the two until a stop condition.

pub mod metric;
pub mod optimizer;
pub mod config;
pub mod initializer;
pub mod registration;
pub mod validation;
pub mod progress;

pub use voxalign_core::error::{RegistrationError, Result};
pub use config::RegistrationConfig;
pub use initializer::{CenterInitialization, TransformInitializer};
pub use metric::{MeanSquaresMetric, Metric, MetricValue, SamplingStrategy};
pub use optimizer::{CostFunction, IterationRecord, OptimizerPhase, OptimizerState, ParameterScales, RegularStepGradientDescent, StopReason};
pub use progress::{ConsoleProgressCallback, HistoryCallback, ProgressCallback, ProgressInfo, ProgressTracker};
pub use registration::{AffineRegistration, RegistrationResult};
