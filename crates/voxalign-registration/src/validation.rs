//! Validation utilities for registration operations.
//!
//! This module provides validation functions for configuration values, input
//! images and the numerical health of metric evaluations.

use voxalign_core::error::{RegistrationError, Result};
use voxalign_core::image::Image;
use crate::config::RegistrationConfig;

/// Validate the initial and minimum step lengths.
pub fn validate_step_lengths(maximum: f64, minimum: f64) -> Result<()> {
    if !(maximum.is_finite() && maximum > 0.0) {
        return Err(RegistrationError::invalid_configuration(format!(
            "Maximum step length must be positive, got {}",
            maximum
        )));
    }
    if !(minimum.is_finite() && minimum > 0.0) {
        return Err(RegistrationError::invalid_configuration(format!(
            "Minimum step length must be positive, got {}",
            minimum
        )));
    }
    if minimum > maximum {
        return Err(RegistrationError::invalid_configuration(format!(
            "Minimum step length ({}) must not exceed maximum step length ({})",
            minimum, maximum
        )));
    }
    Ok(())
}

/// Validate the step relaxation factor, which must lie strictly inside (0, 1).
pub fn validate_relaxation_factor(factor: f64) -> Result<()> {
    if !(factor > 0.0 && factor < 1.0) {
        return Err(RegistrationError::invalid_configuration(format!(
            "Relaxation factor must be in (0, 1), got {}",
            factor
        )));
    }
    Ok(())
}

/// Validate the gradient magnitude tolerance.
pub fn validate_tolerance(tolerance: f64) -> Result<()> {
    if !(tolerance.is_finite() && tolerance >= 0.0) {
        return Err(RegistrationError::invalid_configuration(format!(
            "Gradient magnitude tolerance must be non-negative, got {}",
            tolerance
        )));
    }
    Ok(())
}

/// Validate the translation scale.
pub fn validate_translation_scale(scale: f64) -> Result<()> {
    if !(scale.is_finite() && scale > 0.0) {
        return Err(RegistrationError::invalid_configuration(format!(
            "Translation scale must be positive, got {}",
            scale
        )));
    }
    Ok(())
}

/// Validate a complete registration configuration.
pub fn validate_config(config: &RegistrationConfig) -> Result<()> {
    validate_step_lengths(config.maximum_step_length, config.minimum_step_length)?;
    validate_translation_scale(config.translation_scale)?;
    validate_relaxation_factor(config.relaxation_factor)?;
    validate_tolerance(config.gradient_magnitude_tolerance)?;
    if config.sampling.step() == 0 {
        return Err(RegistrationError::invalid_configuration(
            "Sampling step must be positive",
        ));
    }
    if config.log_interval == 0 {
        return Err(RegistrationError::invalid_configuration(
            "Log interval must be positive",
        ));
    }
    Ok(())
}

/// Validate that an input image has voxels.
pub fn validate_image(image: &Image, role: &str) -> Result<()> {
    if image.is_empty() {
        return Err(RegistrationError::image_validation(format!(
            "{} image is empty (size {:?})",
            role,
            image.size()
        )));
    }
    Ok(())
}

/// Validate that a metric value and its derivative are finite.
pub fn validate_finite(value: f64, derivative: &[f64]) -> Result<()> {
    if !value.is_finite() {
        return Err(RegistrationError::numerical_instability(format!(
            "Metric value is not finite: {}",
            value
        )));
    }
    if let Some(index) = derivative.iter().position(|d| !d.is_finite()) {
        return Err(RegistrationError::numerical_instability(format!(
            "Metric derivative component {} is not finite: {}",
            index, derivative[index]
        )));
    }
    Ok(())
}
