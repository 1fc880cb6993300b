//! Image filters.
//!
//! This module provides filters that produce new images from existing ones.

pub mod resample;
pub mod difference;

pub use resample::ResampleImageFilter;
pub use difference::{rescale_coefficients, DifferenceImageFilter};
