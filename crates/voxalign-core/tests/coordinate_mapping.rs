use voxalign_core::image::{Image, ImageGeometry};
use voxalign_core::spatial::{Direction3, Point3, Spacing3};
use proptest::prelude::*;

fn make_rotation(angle_x: f64, angle_y: f64, angle_z: f64) -> Direction3 {
    let cx = angle_x.cos(); let sx = angle_x.sin();
    let cy = angle_y.cos(); let sy = angle_y.sin();
    let cz = angle_z.cos(); let sz = angle_z.sin();

    let rz = Direction3::new(
        cz, -sz, 0.0,
        sz, cz, 0.0,
        0.0, 0.0, 1.0,
    );
    let ry = Direction3::new(
        cy, 0.0, sy,
        0.0, 1.0, 0.0,
        -sy, 0.0, cy,
    );
    let rx = Direction3::new(
        1.0, 0.0, 0.0,
        0.0, cx, -sx,
        0.0, sx, cx,
    );

    // Rx * Ry * Rz
    rx * ry * rz
}

proptest! {
    #[test]
    fn test_coordinate_roundtrip(
        ox in -100.0f64..100.0, oy in -100.0f64..100.0, oz in -100.0f64..100.0,
        sx in 0.1f64..5.0, sy in 0.1f64..5.0, sz in 0.1f64..5.0,
        ax in -3.14f64..3.14, ay in -3.14f64..3.14, az in -3.14f64..3.14,
        px in -50.0f64..50.0, py in -50.0f64..50.0, pz in -50.0f64..50.0
    ) {
        let geometry = ImageGeometry::new(
            [2, 2, 2],
            Point3::new(ox, oy, oz),
            Spacing3::new(sx, sy, sz),
            make_rotation(ax, ay, az),
        ).unwrap();
        let image = Image::filled(geometry, 0.0);
        let point = Point3::new(px, py, pz);

        let index = image.transform_physical_point_to_continuous_index(&point);
        let recovered = image.transform_continuous_index_to_physical_point(&index);

        prop_assert!((point.x - recovered.x).abs() < 1e-8, "X mismatch: {} vs {}", point.x, recovered.x);
        prop_assert!((point.y - recovered.y).abs() < 1e-8, "Y mismatch: {} vs {}", point.y, recovered.y);
        prop_assert!((point.z - recovered.z).abs() < 1e-8, "Z mismatch: {} vs {}", point.z, recovered.z);
    }

    #[test]
    fn test_voxel_centers_map_to_integer_indices(
        ox in -10.0f64..10.0,
        sx in 0.5f64..2.0,
        az in -3.14f64..3.14,
        x in 0usize..6, y in 0usize..6, z in 0usize..6
    ) {
        let geometry = ImageGeometry::new(
            [6, 6, 6],
            Point3::new(ox, -ox, 0.5 * ox),
            Spacing3::new(sx, 1.0, 2.0 * sx),
            make_rotation(0.0, 0.0, az),
        ).unwrap();
        let point = geometry.voxel_to_physical([x, y, z]);
        let index = geometry.physical_to_index(&point);

        prop_assert!((index.x - x as f64).abs() < 1e-9);
        prop_assert!((index.y - y as f64).abs() < 1e-9);
        prop_assert!((index.z - z as f64).abs() < 1e-9);
    }
}
