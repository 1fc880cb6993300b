//! Cost function contract seen by optimizers.

use nalgebra::SVector;
use voxalign_core::error::Result;

/// Something an optimizer can minimize.
///
/// The optimizer only ever asks for the value and gradient at a parameter
/// vector; it knows nothing about images or transforms.
///
/// # Examples
///
/// ```rust
/// use nalgebra::SVector;
/// use voxalign_registration::optimizer::CostFunction;
///
/// let mut parabola = |p: &SVector<f64, 1>| -> voxalign_registration::Result<(f64, SVector<f64, 1>)> {
///     Ok((p[0] * p[0], p * 2.0))
/// };
/// let (value, gradient) = parabola.evaluate(&SVector::from([3.0])).unwrap();
/// assert_eq!(value, 9.0);
/// assert_eq!(gradient[0], 6.0);
/// ```
pub trait CostFunction<const N: usize> {
    /// Value and gradient at `parameters`.
    fn evaluate(&mut self, parameters: &SVector<f64, N>) -> Result<(f64, SVector<f64, N>)>;
}

impl<F, const N: usize> CostFunction<N> for F
where
    F: FnMut(&SVector<f64, N>) -> Result<(f64, SVector<f64, N>)>,
{
    fn evaluate(&mut self, parameters: &SVector<f64, N>) -> Result<(f64, SVector<f64, N>)> {
        self(parameters)
    }
}
