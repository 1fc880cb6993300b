//! Intensity moments of an image.

use rayon::prelude::*;
use crate::spatial::{Point3, Vector3};
use super::image::Image;

const MOMENT_CHUNK: usize = 4096;

/// Zeroth and first order intensity moments in physical space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageMoments {
    /// Sum of all voxel intensities.
    pub total_mass: f64,
    /// Sum of `intensity * physical_point` over all voxels.
    pub first_moment: Vector3,
}

impl ImageMoments {
    /// Compute the moments of `image`.
    ///
    /// The voxel buffer is split into fixed-size chunks which are summed in
    /// parallel; the partial sums are then combined in chunk order, so the
    /// result does not depend on the number of threads.
    pub fn compute(image: &Image) -> Self {
        let geometry = image.geometry();
        let data = image.data();
        let chunk_count = data.len().div_ceil(MOMENT_CHUNK);

        let partials: Vec<(f64, Vector3)> = (0..chunk_count)
            .into_par_iter()
            .map(|chunk| {
                let start = chunk * MOMENT_CHUNK;
                let end = (start + MOMENT_CHUNK).min(data.len());
                let mut mass = 0.0;
                let mut moment = Vector3::zeros();
                for (linear, &value) in data[start..end].iter().enumerate() {
                    let value = value as f64;
                    let point = geometry.voxel_to_physical(geometry.voxel_index(start + linear));
                    mass += value;
                    moment += point.coords * value;
                }
                (mass, moment)
            })
            .collect();

        let (total_mass, first_moment) = partials
            .into_iter()
            .fold((0.0, Vector3::zeros()), |(m, v), (pm, pv)| (m + pm, v + pv));

        Self { total_mass, first_moment }
    }

    /// Intensity-weighted centroid, or `None` when the total mass is not positive.
    pub fn center_of_mass(&self) -> Option<Point3> {
        if self.total_mass > 0.0 && self.total_mass.is_finite() {
            Some(Point3::from(self.first_moment / self.total_mass))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::ImageGeometry;
    use crate::spatial::{Direction3, Spacing3};

    #[test]
    fn test_single_bright_voxel() {
        let geometry = ImageGeometry::new(
            [5, 5, 5],
            Point3::new(10.0, 0.0, 0.0),
            Spacing3::new(2.0, 1.0, 1.0),
            Direction3::identity(),
        )
        .unwrap();
        let image = Image::from_fn(geometry, |idx| if idx == [1, 2, 3] { 4.0 } else { 0.0 });
        let moments = ImageMoments::compute(&image);
        assert_eq!(moments.total_mass, 4.0);
        let center = moments.center_of_mass().unwrap();
        assert!((center - Point3::new(12.0, 2.0, 3.0)).norm() < 1e-12);
    }

    #[test]
    fn test_uniform_image_centroid_is_grid_center() {
        let geometry = ImageGeometry::from_size([20, 30, 12]);
        let image = Image::filled(geometry.clone(), 1.0);
        let center = ImageMoments::compute(&image).center_of_mass().unwrap();
        assert!((center - geometry.physical_center()).norm() < 1e-9);
    }

    #[test]
    fn test_zero_mass_has_no_centroid() {
        let image = Image::filled(ImageGeometry::from_size([3, 3, 3]), 0.0);
        assert!(ImageMoments::compute(&image).center_of_mass().is_none());
    }
}
