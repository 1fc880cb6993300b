//! Core data structures for voxalign.
//!
//! Images with physical metadata, trilinear interpolation, affine transforms
//! and the resample / difference filters used around a registration run.

pub mod error;
pub mod spatial;
pub mod image;
pub mod interpolation;
pub mod transform;
pub mod filter;

pub use error::{RegistrationError, Result};
pub use image::{Image, ImageGeometry};
pub use spatial::{Direction3, Point3, Spacing3, Vector3};
