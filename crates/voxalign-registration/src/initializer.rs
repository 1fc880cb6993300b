//! Transform initialization.
//!
//! Chooses the fixed center of the affine transform and, optionally, a
//! starting translation that superimposes the centers of the two images.

use serde::{Deserialize, Serialize};
use voxalign_core::image::{Image, ImageMoments};
use voxalign_core::spatial::Point3;
use voxalign_core::transform::AffineTransform;

/// How an image center is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CenterInitialization {
    /// Intensity-weighted centroid.
    #[default]
    CenterOfMass,
    /// Physical center of the voxel grid.
    Geometry,
}

/// Builds the starting transform of a registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TransformInitializer {
    mode: CenterInitialization,
    initialize_translation: bool,
}

impl TransformInitializer {
    /// Create an initializer that leaves the translation at zero.
    pub fn new(mode: CenterInitialization) -> Self {
        Self {
            mode,
            initialize_translation: false,
        }
    }

    /// Also set the translation to `moving_center - fixed_center`.
    pub fn with_translation(mut self, enabled: bool) -> Self {
        self.initialize_translation = enabled;
        self
    }

    /// Center of `image` according to the configured mode.
    ///
    /// The centroid falls back to the grid center when the total intensity is
    /// not positive.
    pub fn image_center(&self, image: &Image) -> Point3 {
        match self.mode {
            CenterInitialization::Geometry => image.geometry().physical_center(),
            CenterInitialization::CenterOfMass => {
                let moments = ImageMoments::compute(image);
                moments.center_of_mass().unwrap_or_else(|| {
                    tracing::warn!(
                        "Total intensity {} is not positive, using the geometric center instead of the centroid",
                        moments.total_mass
                    );
                    image.geometry().physical_center()
                })
            }
        }
    }

    /// Identity transform about the fixed-image center, optionally translated
    /// onto the moving-image center.
    pub fn initialize(&self, fixed: &Image, moving: &Image) -> AffineTransform {
        let fixed_center = self.image_center(fixed);
        let mut transform = AffineTransform::identity(fixed_center);
        if self.initialize_translation {
            let moving_center = self.image_center(moving);
            let mut parameters = transform.parameters();
            let offset = moving_center - fixed_center;
            for i in 0..3 {
                parameters[9 + i] = offset[i];
            }
            transform.set_parameters(&parameters);
        }
        tracing::debug!(
            "Initialized transform center {:?} translation {:?}",
            transform.center().coords.as_slice(),
            transform.translation().as_slice()
        );
        transform
    }
}
