//! Image type with physical metadata and coordinate transformations.

use crate::error::{RegistrationError, Result};
use crate::spatial::{Direction3, Point3, Spacing3};
use super::geometry::ImageGeometry;

/// 3D scalar image with physical metadata.
///
/// Voxel values are stored as `f32` in x-fastest order. Both the voxel data and
/// the geometry are immutable once the image is constructed; filters produce
/// new images instead of editing existing ones.
///
/// # Coordinate Systems
/// * **Index Space**: Discrete voxel indices `[x, y, z]`
/// * **Physical Space**: Continuous coordinates in mm or other units
///
/// # Examples
/// ```rust
/// use voxalign_core::{Image, ImageGeometry, Point3};
///
/// let geometry = ImageGeometry::from_size([10, 10, 10]);
/// let image = Image::filled(geometry, 0.0);
/// let index = image.transform_physical_point_to_continuous_index(&Point3::new(5.0, 5.0, 5.0));
/// assert!((index.x - 5.0).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    geometry: ImageGeometry,
    data: Vec<f32>,
}

impl Image {
    /// Create a new image from a geometry and voxel data in x-fastest order.
    ///
    /// # Errors
    /// `GeometryMismatch` when `data.len()` differs from the voxel count.
    pub fn new(geometry: ImageGeometry, data: Vec<f32>) -> Result<Self> {
        if data.len() != geometry.number_of_voxels() {
            return Err(RegistrationError::geometry_mismatch(format!(
                "image of size {:?} needs {} voxels, got {}",
                geometry.size(),
                geometry.number_of_voxels(),
                data.len()
            )));
        }
        Ok(Self { geometry, data })
    }

    /// Create an image where every voxel has the same value.
    pub fn filled(geometry: ImageGeometry, value: f32) -> Self {
        let data = vec![value; geometry.number_of_voxels()];
        Self { geometry, data }
    }

    /// Create an image by evaluating `f` at every voxel index.
    pub fn from_fn(geometry: ImageGeometry, f: impl Fn([usize; 3]) -> f32) -> Self {
        let data = (0..geometry.number_of_voxels())
            .map(|linear| f(geometry.voxel_index(linear)))
            .collect();
        Self { geometry, data }
    }

    /// Construct from parts whose lengths are already known to agree.
    pub(crate) fn from_parts(geometry: ImageGeometry, data: Vec<f32>) -> Self {
        debug_assert_eq!(data.len(), geometry.number_of_voxels());
        Self { geometry, data }
    }

    /// Get the geometry.
    pub fn geometry(&self) -> &ImageGeometry {
        &self.geometry
    }

    /// Get the voxel buffer.
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Consume the image and return the voxel buffer.
    pub fn into_data(self) -> Vec<f32> {
        self.data
    }

    /// Get the image size `[x, y, z]`.
    pub fn size(&self) -> [usize; 3] {
        self.geometry.size()
    }

    /// Get the origin (physical coordinate of the first voxel).
    pub fn origin(&self) -> &Point3 {
        self.geometry.origin()
    }

    /// Get the spacing.
    pub fn spacing(&self) -> &Spacing3 {
        self.geometry.spacing()
    }

    /// Get the direction.
    pub fn direction(&self) -> &Direction3 {
        self.geometry.direction()
    }

    /// Total number of voxels.
    pub fn number_of_voxels(&self) -> usize {
        self.data.len()
    }

    /// True when the image has no voxels.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Value of voxel `[x, y, z]`, or `None` outside the grid.
    pub fn pixel(&self, index: [usize; 3]) -> Option<f32> {
        let size = self.size();
        if (0..3).all(|i| index[i] < size[i]) {
            Some(self.data[self.geometry.linear_index(index)])
        } else {
            None
        }
    }

    /// Smallest and largest voxel value.
    pub fn min_max(&self) -> Option<(f32, f32)> {
        let mut values = self.data.iter().copied();
        let first = values.next()?;
        Some(values.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v))))
    }

    /// Convert a physical point to a continuous index.
    ///
    /// `index = (Direction^-1 * (point - origin)) / spacing`
    pub fn transform_physical_point_to_continuous_index(&self, point: &Point3) -> Point3 {
        self.geometry.physical_to_index(point)
    }

    /// Convert a continuous index to a physical point.
    ///
    /// `point = origin + Direction * (index * spacing)`
    pub fn transform_continuous_index_to_physical_point(&self, index: &Point3) -> Point3 {
        self.geometry.index_to_physical(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_creation() {
        let geometry = ImageGeometry::from_size([2, 3, 4]);
        let image = Image::new(geometry, (0..24).map(|v| v as f32).collect()).unwrap();
        assert_eq!(image.size(), [2, 3, 4]);
        assert_eq!(image.number_of_voxels(), 24);
        assert_eq!(image.pixel([1, 2, 3]), Some(23.0));
        assert_eq!(image.pixel([1, 0, 0]), Some(1.0));
        assert_eq!(image.pixel([0, 1, 0]), Some(2.0));
        assert_eq!(image.pixel([2, 0, 0]), None);
    }

    #[test]
    fn test_data_length_mismatch() {
        let geometry = ImageGeometry::from_size([2, 2, 2]);
        let result = Image::new(geometry, vec![0.0; 7]);
        assert!(matches!(result, Err(RegistrationError::GeometryMismatch(_))));
    }

    #[test]
    fn test_from_fn_order() {
        let image = Image::from_fn(ImageGeometry::from_size([3, 2, 2]), |[x, y, z]| {
            (x + 10 * y + 100 * z) as f32
        });
        assert_eq!(image.data()[..4], [0.0, 1.0, 2.0, 10.0]);
        assert_eq!(image.pixel([2, 1, 1]), Some(112.0));
    }

    #[test]
    fn test_min_max() {
        let image = Image::new(ImageGeometry::from_size([3, 1, 1]), vec![2.0, -1.0, 5.0]).unwrap();
        assert_eq!(image.min_max(), Some((-1.0, 5.0)));
        let empty = Image::filled(ImageGeometry::from_size([0, 4, 4]), 1.0);
        assert!(empty.is_empty());
        assert_eq!(empty.min_max(), None);
    }

    #[test]
    fn test_transform_roundtrip() {
        let image = Image::filled(ImageGeometry::from_size([10, 10, 10]), 0.0);
        let original = Point3::new(3.5, 4.5, 5.5);
        let index = image.transform_physical_point_to_continuous_index(&original);
        let back = image.transform_continuous_index_to_physical_point(&index);
        assert!((original - back).norm() < 1e-12);
    }
}
