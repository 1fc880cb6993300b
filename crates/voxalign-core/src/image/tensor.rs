//! Conversion between images and burn tensors.
//!
//! Tensors use the `[z, y, x]` shape, which matches the x-fastest voxel buffer
//! without any reordering.

use burn::tensor::backend::Backend;
use burn::tensor::{Tensor, TensorData};
use crate::error::{RegistrationError, Result};
use super::geometry::ImageGeometry;
use super::image::Image;

impl Image {
    /// Copy the voxel data into a `[z, y, x]` float tensor on `device`.
    pub fn to_tensor<B: Backend>(&self, device: &B::Device) -> Tensor<B, 3> {
        let [nx, ny, nz] = self.size();
        let data = TensorData::new(self.data().to_vec(), [nz, ny, nx]).convert::<B::FloatElem>();
        Tensor::from_data(data, device)
    }

    /// Build an image from a `[z, y, x]` tensor and a geometry.
    ///
    /// # Errors
    /// `GeometryMismatch` when the tensor shape disagrees with the geometry
    /// size, `Tensor` when the tensor data cannot be read back as `f32`.
    pub fn from_tensor<B: Backend>(tensor: Tensor<B, 3>, geometry: ImageGeometry) -> Result<Self> {
        let [nz, ny, nx] = tensor.dims();
        if [nx, ny, nz] != geometry.size() {
            return Err(RegistrationError::geometry_mismatch(format!(
                "tensor shape [{}, {}, {}] (z, y, x) does not match image size {:?}",
                nz,
                ny,
                nx,
                geometry.size()
            )));
        }
        let data = tensor
            .into_data()
            .convert::<f32>()
            .into_vec::<f32>()
            .map_err(|e| RegistrationError::tensor(format!("{:?}", e)))?;
        Image::new(geometry, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn_ndarray::NdArray;

    type TestBackend = NdArray<f32>;

    #[test]
    fn test_tensor_roundtrip() {
        let device = Default::default();
        let geometry = ImageGeometry::from_size([4, 3, 2]);
        let image = Image::from_fn(geometry.clone(), |[x, y, z]| (x + 4 * y + 12 * z) as f32);

        let tensor = image.to_tensor::<TestBackend>(&device);
        assert_eq!(tensor.dims(), [2, 3, 4]);

        let back = Image::from_tensor(tensor, geometry).unwrap();
        assert_eq!(back, image);
    }

    #[test]
    fn test_from_tensor_shape_mismatch() {
        let device = Default::default();
        let tensor = Tensor::<TestBackend, 3>::zeros([2, 3, 4], &device);
        let result = Image::from_tensor(tensor, ImageGeometry::from_size([2, 3, 4]));
        assert!(matches!(result, Err(RegistrationError::GeometryMismatch(_))));
    }
}
