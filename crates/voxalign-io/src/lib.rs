//! Image file I/O for voxalign.

pub mod cast;
pub mod nifti_io;

pub use cast::PixelType;
pub use nifti_io::{read_nifti, write_nifti};
