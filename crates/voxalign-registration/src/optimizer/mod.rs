//! Optimization algorithms for registration.
//!
//! This module provides the cost function contract and the regular-step
//! gradient descent optimizer that drives affine registration.

pub mod trait_;
pub mod scales;
pub mod regular_step;

pub use trait_::CostFunction;
pub use scales::ParameterScales;
pub use regular_step::{IterationRecord, OptimizerPhase, OptimizerState, RegularStepGradientDescent, StopReason};
