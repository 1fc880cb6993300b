//! Image types and operations.
//!
//! This module provides the Image type and related functionality
//! for representing 3D voxel grids with physical metadata.

pub mod geometry;
pub mod image;
pub mod moments;
pub mod tensor;

pub use geometry::ImageGeometry;
pub use image::Image;
pub use moments::ImageMoments;
