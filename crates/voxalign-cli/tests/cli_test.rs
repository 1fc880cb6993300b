use std::path::Path;
use std::process::Command;

use tempfile::tempdir;
use voxalign_core::image::{Image, ImageGeometry};
use voxalign_core::spatial::{Direction3, Point3, Spacing3};
use voxalign_io::{read_nifti, write_nifti, PixelType};

fn blob(origin: Point3, shift_x: f64) -> Image {
    let geometry =
        ImageGeometry::new([16, 14, 14], origin, Spacing3::repeat(1.0), Direction3::identity()).unwrap();
    Image::from_fn(geometry, |[x, y, z]| {
        let dx = x as f64 - 7.5 - shift_x;
        let dy = y as f64 - 6.5;
        let dz = z as f64 - 6.5;
        (200.0 * (-(dx * dx + dy * dy + dz * dz) / 18.0).exp()) as f32
    })
}

fn write(path: &Path, image: &Image) {
    write_nifti(path, image, PixelType::F32).unwrap();
}

fn voxalign() -> Command {
    Command::new(env!("CARGO_BIN_EXE_voxalign"))
}

#[test]
fn test_registers_and_writes_all_outputs() {
    let dir = tempdir().unwrap();
    let fixed = dir.path().join("fixed.nii");
    let moving = dir.path().join("moving.nii.gz");
    let output = dir.path().join("aligned.nii");
    let before = dir.path().join("before.nii");
    let after = dir.path().join("after.nii");
    let report = dir.path().join("report.json");
    write(&fixed, &blob(Point3::origin(), 0.0));
    write(&moving, &blob(Point3::origin(), 2.0));

    let out = voxalign()
        .args([&fixed, &moving, &output, &before, &after])
        .args(["0.1", "5"])
        .arg("--report")
        .arg(&report)
        .output()
        .unwrap();

    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("Result: iterations=5 metric="), "{}", stdout);

    let aligned = read_nifti(&output).unwrap();
    assert_eq!(aligned.size(), [16, 14, 14]);
    for path in [&before, &after] {
        let diff = read_nifti(path).unwrap();
        let (lo, hi) = diff.min_max().unwrap();
        assert!(lo.abs() < 1e-2 && (hi - 255.0).abs() < 1e-2, "range [{}, {}]", lo, hi);
    }
    let json = std::fs::read_to_string(&report).unwrap();
    assert!(json.contains("\"stop_reason\": \"max_iterations_reached\""), "{}", json);
}

#[test]
fn test_no_overlap_fails_without_writing() {
    let dir = tempdir().unwrap();
    let fixed = dir.path().join("fixed.nii");
    let moving = dir.path().join("moving.nii");
    let output = dir.path().join("aligned.nii");
    write(&fixed, &blob(Point3::origin(), 0.0));
    write(&moving, &blob(Point3::new(1000.0, 0.0, 0.0), 0.0));

    let out = voxalign().args([&fixed, &moving, &output]).output().unwrap();

    assert!(!out.status.success());
    assert!(!output.exists());
}

#[test]
fn test_missing_input_fails() {
    let dir = tempdir().unwrap();
    let out = voxalign()
        .arg(dir.path().join("nope.nii"))
        .arg(dir.path().join("nope.nii"))
        .arg(dir.path().join("out.nii"))
        .output()
        .unwrap();
    assert!(!out.status.success());
}
