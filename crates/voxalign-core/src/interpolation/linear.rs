//! Linear interpolation implementation.
//!
//! This module provides trilinear interpolation of 3D images together with
//! the analytic gradient of the interpolant.

use serde::{Deserialize, Serialize};
use crate::image::Image;
use crate::spatial::{Point3, Vector3};
use super::trait_::Interpolator;

/// Continuous indices this close outside the grid are clamped onto it.
const BOUNDARY_TOLERANCE: f64 = 1e-6;

/// Continuous indices this close to an integer lie on a grid plane.
const NODE_TOLERANCE: f64 = 1e-9;

/// Linear Interpolator.
///
/// Performs trilinear interpolation. A continuous index is inside when it
/// lies in `[0, size - 1]` on every axis. On the upper face of an axis the
/// `+1` neighbor gets weight zero, so no voxel beyond the grid is ever read.
///
/// The gradient is the exact derivative of the interpolant inside a cell.
/// On a grid plane, where the interpolant has a kink, it is the central
/// difference of the two neighboring planes (one-sided on the grid faces).
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct LinearInterpolator;

/// The eight voxels around a continuous index and the fractional weights.
struct Cell {
    lower: [usize; 3],
    upper: [usize; 3],
    weights: [f64; 3],
    /// Grid plane the index lies on, per axis.
    planes: [Option<usize>; 3],
}

impl LinearInterpolator {
    /// Create a new linear interpolator.
    pub fn new() -> Self {
        Self
    }

    /// Lower and upper neighbor, upper weight and grid plane along one axis.
    fn locate_axis(size: usize, coordinate: f64) -> Option<(usize, usize, f64, Option<usize>)> {
        if size == 0 || !coordinate.is_finite() {
            return None;
        }
        let last = (size - 1) as f64;
        if coordinate < -BOUNDARY_TOLERANCE || coordinate > last + BOUNDARY_TOLERANCE {
            return None;
        }
        let coordinate = coordinate.clamp(0.0, last);
        let nearest = coordinate.round();
        let plane = ((coordinate - nearest).abs() <= NODE_TOLERANCE).then_some(nearest as usize);
        let base = coordinate.floor();
        let lower = base as usize;
        if lower + 1 >= size {
            return Some((lower.min(size - 1), size - 1, 0.0, plane));
        }
        Some((lower, lower + 1, coordinate - base, plane))
    }

    fn locate(image: &Image, index: &Point3) -> Option<Cell> {
        let size = image.size();
        let (x0, x1, wx, px) = Self::locate_axis(size[0], index.x)?;
        let (y0, y1, wy, py) = Self::locate_axis(size[1], index.y)?;
        let (z0, z1, wz, pz) = Self::locate_axis(size[2], index.z)?;
        Some(Cell {
            lower: [x0, y0, z0],
            upper: [x1, y1, z1],
            weights: [wx, wy, wz],
            planes: [px, py, pz],
        })
    }

    /// Corner values ordered by bit pattern: bit 0 selects the upper x
    /// neighbor, bit 1 upper y, bit 2 upper z.
    fn corners(image: &Image, cell: &Cell) -> [f64; 8] {
        let geometry = image.geometry();
        let data = image.data();
        let mut values = [0.0; 8];
        for (corner, value) in values.iter_mut().enumerate() {
            let pick = |axis: usize| {
                if corner & (1 << axis) != 0 {
                    cell.upper[axis]
                } else {
                    cell.lower[axis]
                }
            };
            *value = data[geometry.linear_index([pick(0), pick(1), pick(2)])] as f64;
        }
        values
    }

    /// Difference quotient along `axis` for an index lying on a grid plane.
    fn node_derivative(&self, image: &Image, index: &Point3, plane: usize, axis: usize) -> Option<f64> {
        let size = image.size()[axis];
        if size < 2 {
            return Some(0.0);
        }
        let below = plane.saturating_sub(1);
        let above = (plane + 1).min(size - 1);
        let mut lower = *index;
        let mut upper = *index;
        lower[axis] = below as f64;
        upper[axis] = above as f64;
        let lower = self.sample_at_index(image, &lower)?;
        let upper = self.sample_at_index(image, &upper)?;
        Some((upper - lower) / (above - below) as f64)
    }

    #[inline]
    fn axis_weight(cell: &Cell, corner: usize, axis: usize) -> f64 {
        if corner & (1 << axis) != 0 {
            cell.weights[axis]
        } else {
            1.0 - cell.weights[axis]
        }
    }
}

impl Interpolator for LinearInterpolator {
    fn sample_at_index(&self, image: &Image, index: &Point3) -> Option<f64> {
        let cell = Self::locate(image, index)?;
        let corners = Self::corners(image, &cell);
        let value = corners
            .iter()
            .enumerate()
            .map(|(corner, v)| {
                v * Self::axis_weight(&cell, corner, 0)
                    * Self::axis_weight(&cell, corner, 1)
                    * Self::axis_weight(&cell, corner, 2)
            })
            .sum();
        Some(value)
    }

    fn sample_with_gradient_at_index(&self, image: &Image, index: &Point3) -> Option<(f64, Vector3)> {
        let cell = Self::locate(image, index)?;
        let corners = Self::corners(image, &cell);

        let mut value = 0.0;
        let mut gradient = Vector3::zeros();
        for (corner, v) in corners.iter().enumerate() {
            let w = [
                Self::axis_weight(&cell, corner, 0),
                Self::axis_weight(&cell, corner, 1),
                Self::axis_weight(&cell, corner, 2),
            ];
            value += v * w[0] * w[1] * w[2];
            for axis in 0..3 {
                // d/dw of w or (1 - w)
                let sign = if corner & (1 << axis) != 0 { 1.0 } else { -1.0 };
                let others: f64 = (0..3).filter(|&a| a != axis).map(|a| w[a]).product();
                gradient[axis] += sign * v * others;
            }
        }
        for axis in 0..3 {
            if let Some(plane) = cell.planes[axis] {
                gradient[axis] = self.node_derivative(image, index, plane, axis)?;
            }
        }
        Some((value, gradient))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::ImageGeometry;
    use crate::spatial::{Direction3, Spacing3};

    fn ramp() -> Image {
        // f = 2x + 3y - z + 1
        Image::from_fn(ImageGeometry::from_size([5, 4, 3]), |[x, y, z]| {
            2.0 * x as f32 + 3.0 * y as f32 - z as f32 + 1.0
        })
    }

    #[test]
    fn test_exact_at_voxel_centers() {
        let image = ramp();
        let interp = LinearInterpolator::new();
        let v = interp.sample_at_index(&image, &Point3::new(2.0, 1.0, 2.0)).unwrap();
        assert_eq!(v, 2.0 * 2.0 + 3.0 - 2.0 + 1.0);
    }

    #[test]
    fn test_linear_function_is_reproduced() {
        let image = ramp();
        let interp = LinearInterpolator::new();
        let (v, g) = interp
            .sample_with_gradient_at_index(&image, &Point3::new(1.25, 2.5, 0.75))
            .unwrap();
        assert!((v - (2.5 + 7.5 - 0.75 + 1.0)).abs() < 1e-12);
        assert!((g - Vector3::new(2.0, 3.0, -1.0)).norm() < 1e-12);
    }

    #[test]
    fn test_upper_edge_is_inside() {
        let image = ramp();
        let interp = LinearInterpolator::new();
        let v = interp.sample_at_index(&image, &Point3::new(4.0, 3.0, 2.0)).unwrap();
        assert_eq!(v, 8.0 + 9.0 - 2.0 + 1.0);
        // Within tolerance of the face.
        assert!(interp.sample_at_index(&image, &Point3::new(4.0 + 1e-9, 0.0, 0.0)).is_some());
    }

    #[test]
    fn test_outside_is_none() {
        let image = ramp();
        let interp = LinearInterpolator::new();
        assert!(interp.sample_at_index(&image, &Point3::new(-0.5, 0.0, 0.0)).is_none());
        assert!(interp.sample_at_index(&image, &Point3::new(0.0, 3.01, 0.0)).is_none());
        assert!(interp.sample_at_index(&image, &Point3::new(0.0, 0.0, f64::NAN)).is_none());
    }

    #[test]
    fn test_gradient_on_grid_planes_is_central() {
        // f = x^2 along x, linear along y.
        let image = Image::from_fn(ImageGeometry::from_size([6, 4, 3]), |[x, y, _]| {
            (x * x) as f32 + y as f32
        });
        let interp = LinearInterpolator::new();

        let (v, g) = interp.sample_with_gradient_at_index(&image, &Point3::new(2.0, 1.0, 1.0)).unwrap();
        assert_eq!(v, 5.0);
        // (9 - 1) / 2, not the forward difference 5.
        assert!((g - Vector3::new(4.0, 1.0, 0.0)).norm() < 1e-12, "{}", g);

        // Backward difference on the upper face, forward on the lower one.
        let (_, g) = interp.sample_with_gradient_at_index(&image, &Point3::new(5.0, 3.0, 2.0)).unwrap();
        assert!((g - Vector3::new(9.0, 1.0, 0.0)).norm() < 1e-12, "{}", g);
        let (_, g) = interp.sample_with_gradient_at_index(&image, &Point3::new(0.0, 0.0, 0.0)).unwrap();
        assert!((g - Vector3::new(1.0, 1.0, 0.0)).norm() < 1e-12, "{}", g);

        // Rounding noise off a plane still counts as on it.
        let (_, g) = interp
            .sample_with_gradient_at_index(&image, &Point3::new(2.0 - 1e-12, 1.0, 1.0))
            .unwrap();
        assert!((g.x - 4.0).abs() < 1e-9, "{}", g);

        // Off the plane in x the cell derivative is used.
        let (_, g) = interp.sample_with_gradient_at_index(&image, &Point3::new(2.5, 1.0, 1.0)).unwrap();
        assert!((g.x - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_gradient_on_plane_is_symmetric_finite_difference() {
        let image = Image::from_fn(ImageGeometry::from_size([6, 6, 6]), |[x, y, z]| {
            ((x * x) as f32) * 0.5 + (y * z) as f32
        });
        let interp = LinearInterpolator::new();
        let p = Point3::new(3.0, 2.0, 4.0);
        let (_, g) = interp.sample_with_gradient_at_index(&image, &p).unwrap();
        for axis in 0..3 {
            let mut plus = p;
            let mut minus = p;
            plus[axis] += 1e-3;
            minus[axis] -= 1e-3;
            let fd = (interp.sample_at_index(&image, &plus).unwrap()
                - interp.sample_at_index(&image, &minus).unwrap())
                / 2e-3;
            assert!((fd - g[axis]).abs() < 1e-9, "axis {}: {} vs {}", axis, fd, g[axis]);
        }
    }

    #[test]
    fn test_physical_gradient_accounts_for_spacing() {
        let geometry = ImageGeometry::new(
            [6, 6, 6],
            Point3::new(-3.0, 0.0, 0.0),
            Spacing3::new(2.0, 0.5, 1.0),
            Direction3::identity(),
        )
        .unwrap();
        // Index-space gradient (1, 1, 1).
        let image = Image::from_fn(geometry, |[x, y, z]| (x + y + z) as f32);
        let interp = LinearInterpolator::new();
        let (_, g) = interp.sample_with_gradient(&image, &Point3::new(1.0, 1.0, 1.0)).unwrap();
        assert!((g - Vector3::new(0.5, 2.0, 1.0)).norm() < 1e-12);
    }

    #[test]
    fn test_gradient_matches_finite_difference() {
        let image = Image::from_fn(ImageGeometry::from_size([6, 6, 6]), |[x, y, z]| {
            ((x * x) as f32) * 0.5 + (y * z) as f32
        });
        let interp = LinearInterpolator::new();
        let p = Point3::new(2.3, 3.6, 1.2);
        let (_, g) = interp.sample_with_gradient(&image, &p).unwrap();
        let h = 1e-6;
        for axis in 0..3 {
            let mut plus = p;
            let mut minus = p;
            plus[axis] += h;
            minus[axis] -= h;
            let fd = (interp.sample(&image, &plus).unwrap() - interp.sample(&image, &minus).unwrap())
                / (2.0 * h);
            assert!((fd - g[axis]).abs() < 1e-6, "axis {}: {} vs {}", axis, fd, g[axis]);
        }
    }
}
