//! Error types for registration operations.
//!
//! A single error enum covers every failure the core can produce, so callers
//! can match on the failure kind instead of inspecting messages.

use thiserror::Error;

/// Main error type for voxalign operations.
#[derive(Error, Debug)]
pub enum RegistrationError {
    /// No sampled fixed-image point mapped inside the moving image.
    #[error("Insufficient overlap: none of the {samples} sampled fixed image points map inside the moving image")]
    InsufficientOverlap {
        /// Number of fixed-image samples that were tried.
        samples: usize,
    },

    /// Two images (or an image and a geometry) that must match do not.
    #[error("Geometry mismatch: {0}")]
    GeometryMismatch(String),

    /// Invalid configuration value (step length, scale, spacing, ...).
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Error in image validation.
    #[error("Image validation error: {0}")]
    ImageValidation(String),

    /// Numerical instability detected.
    #[error("Numerical instability: {0}")]
    NumericalInstability(String),

    /// Tensor data could not be converted.
    #[error("Tensor error: {0}")]
    Tensor(String),
}

/// Result type for voxalign operations.
pub type Result<T> = std::result::Result<T, RegistrationError>;

impl RegistrationError {
    /// Create an insufficient overlap error.
    pub fn insufficient_overlap(samples: usize) -> Self {
        Self::InsufficientOverlap { samples }
    }

    /// Create a geometry mismatch error.
    pub fn geometry_mismatch(msg: impl Into<String>) -> Self {
        Self::GeometryMismatch(msg.into())
    }

    /// Create an invalid configuration error.
    pub fn invalid_configuration(msg: impl Into<String>) -> Self {
        Self::InvalidConfiguration(msg.into())
    }

    /// Create an image validation error.
    pub fn image_validation(msg: impl Into<String>) -> Self {
        Self::ImageValidation(msg.into())
    }

    /// Create a numerical instability error.
    pub fn numerical_instability(msg: impl Into<String>) -> Self {
        Self::NumericalInstability(msg.into())
    }

    /// Create a tensor conversion error.
    pub fn tensor(msg: impl Into<String>) -> Self {
        Self::Tensor(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = RegistrationError::geometry_mismatch("sizes differ");
        assert!(matches!(err, RegistrationError::GeometryMismatch(_)));
    }

    #[test]
    fn test_error_display() {
        let err = RegistrationError::invalid_configuration("step length must be positive");
        assert_eq!(err.to_string(), "Invalid configuration: step length must be positive");
    }

    #[test]
    fn test_insufficient_overlap_display() {
        let err = RegistrationError::insufficient_overlap(125);
        let msg = err.to_string();
        assert!(msg.contains("125"));
        assert!(matches!(err, RegistrationError::InsufficientOverlap { samples: 125 }));
    }
}
