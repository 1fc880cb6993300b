//! Per-parameter scales.
//!
//! Parameters of different physical units (dimensionless matrix entries and
//! translations in millimetres) are made comparable by dividing each gradient
//! component by its scale before the step direction is computed.

use nalgebra::SVector;
use voxalign_core::error::{RegistrationError, Result};
use voxalign_core::transform::AFFINE_PARAMETER_COUNT;

/// Default scale of the translation parameters of an affine transform.
pub const DEFAULT_TRANSLATION_SCALE: f64 = 1.0 / 1000.0;

/// Strictly positive scale for every optimized parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterScales<const N: usize> {
    scales: SVector<f64, N>,
}

impl<const N: usize> ParameterScales<N> {
    /// Create scales from a vector.
    ///
    /// # Errors
    /// `InvalidConfiguration` when any scale is not strictly positive and finite.
    pub fn new(scales: SVector<f64, N>) -> Result<Self> {
        if let Some((index, value)) = scales.iter().enumerate().find(|(_, s)| !(s.is_finite() && **s > 0.0)) {
            return Err(RegistrationError::invalid_configuration(format!(
                "parameter scale {} must be positive and finite, got {}",
                index, value
            )));
        }
        Ok(Self { scales })
    }

    /// Unit scale for every parameter.
    pub fn uniform() -> Self {
        Self { scales: SVector::repeat(1.0) }
    }

    /// Get the scale vector.
    pub fn as_vector(&self) -> &SVector<f64, N> {
        &self.scales
    }

    /// Divide `gradient` component-wise by the scales.
    pub fn apply(&self, gradient: &SVector<f64, N>) -> SVector<f64, N> {
        gradient.component_div(&self.scales)
    }
}

impl ParameterScales<AFFINE_PARAMETER_COUNT> {
    /// Scales for an affine transform: 1.0 for the nine matrix entries and
    /// `translation_scale` for the three translation components.
    pub fn affine(translation_scale: f64) -> Result<Self> {
        let mut scales = SVector::<f64, AFFINE_PARAMETER_COUNT>::repeat(1.0);
        for i in 9..AFFINE_PARAMETER_COUNT {
            scales[i] = translation_scale;
        }
        Self::new(scales)
    }
}
