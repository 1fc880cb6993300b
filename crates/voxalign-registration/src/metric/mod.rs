//! Similarity metrics.
//!
//! This module provides the Metric trait and the mean-squares metric used for
//! intra-modality affine registration.

pub mod trait_;
pub mod mse;
pub mod reduction;

pub use trait_::{Metric, MetricValue};
pub use mse::{MeanSquaresMetric, SamplingStrategy};
