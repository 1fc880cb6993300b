//! Transform types and operations.
//!
//! This module provides transform traits and implementations
//! for spatial coordinate transformations.

pub mod trait_;
pub mod affine;
pub mod identity;

pub use trait_::Transform;
pub use affine::{AffineJacobian, AffineParameters, AffineTransform, AFFINE_PARAMETER_COUNT};
pub use identity::IdentityTransform;
