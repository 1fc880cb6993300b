//! NIfTI-1 reading and writing.
//!
//! Geometry is taken from the sform when present, then from the qform, and
//! finally from the pixel dimensions alone. Written files carry the geometry
//! as an sform. Writes go to a hidden sibling file that is renamed into place
//! once complete, so a failed write never leaves a truncated image behind.

use std::fs;
use std::path::{Path, PathBuf};
use anyhow::{bail, Context, Result};
use nalgebra::{Matrix3, Vector3};
use ndarray::{Array3, Axis, Ix3};
use nifti::writer::WriterOptions;
use nifti::{IntoNdArray, NiftiHeader, NiftiObject, ReaderOptions};
use voxalign_core::image::{Image, ImageGeometry};
use voxalign_core::spatial::Point3;
use crate::cast::PixelType;

/// `NIFTI_XFORM_SCANNER_ANAT`
const XFORM_SCANNER_ANAT: i16 = 1;
/// `NIFTI_UNITS_MM`
const UNITS_MM: u8 = 2;

/// Voxel-to-physical affine stored in a header, as rows `[r0, r1, r2]`.
fn header_affine(header: &NiftiHeader) -> [[f64; 4]; 3] {
    let widen = |row: [f32; 4]| row.map(|v| v as f64);

    if header.sform_code > 0 {
        [widen(header.srow_x), widen(header.srow_y), widen(header.srow_z)]
    } else if header.qform_code > 0 {
        // Quaternion form, see the NIfTI-1 standard.
        let b = header.quatern_b as f64;
        let c = header.quatern_c as f64;
        let d = header.quatern_d as f64;
        let a = (1.0 - (b * b + c * c + d * d).min(1.0)).sqrt();
        let qfac = if header.pixdim[0] < 0.0 { -1.0 } else { 1.0 };

        let r = Matrix3::new(
            a * a + b * b - c * c - d * d, 2.0 * (b * c - a * d), 2.0 * (b * d + a * c),
            2.0 * (b * c + a * d), a * a + c * c - b * b - d * d, 2.0 * (c * d - a * b),
            2.0 * (b * d - a * c), 2.0 * (c * d + a * b), a * a + d * d - c * c - b * b,
        );
        let dx = header.pixdim[1] as f64;
        let dy = header.pixdim[2] as f64;
        let dz = header.pixdim[3] as f64 * qfac;
        let offset = [header.quatern_x as f64, header.quatern_y as f64, header.quatern_z as f64];

        let mut rows = [[0.0; 4]; 3];
        for (i, row) in rows.iter_mut().enumerate() {
            *row = [r[(i, 0)] * dx, r[(i, 1)] * dy, r[(i, 2)] * dz, offset[i]];
        }
        rows
    } else {
        // Fallback: use pixdim scaling only
        [
            [header.pixdim[1] as f64, 0.0, 0.0, 0.0],
            [0.0, header.pixdim[2] as f64, 0.0, 0.0],
            [0.0, 0.0, header.pixdim[3] as f64, 0.0],
        ]
    }
}

/// Geometry described by a header for a grid of `size` voxels.
pub fn geometry_from_header(header: &NiftiHeader, size: [usize; 3]) -> Result<ImageGeometry> {
    let affine = header_affine(header);
    let origin = Point3::new(affine[0][3], affine[1][3], affine[2][3]);

    let mut spacing = Vector3::zeros();
    let mut direction = Matrix3::identity();
    for axis in 0..3 {
        let column = Vector3::new(affine[0][axis], affine[1][axis], affine[2][axis]);
        let length = column.norm();
        if length > 1e-9 {
            spacing[axis] = length;
            direction.set_column(axis, &(column / length));
        } else {
            tracing::warn!("Axis {} has zero length in the NIfTI header, assuming unit spacing", axis);
            spacing[axis] = 1.0;
        }
    }

    ImageGeometry::new(size, origin, spacing, direction).context("Invalid geometry in NIfTI header")
}

/// Header describing `geometry`, with the geometry stored as an sform.
pub fn header_for_geometry(geometry: &ImageGeometry) -> NiftiHeader {
    let spacing = geometry.spacing();
    let direction = geometry.direction();
    let origin = geometry.origin();
    let row = |i: usize| {
        [
            (direction[(i, 0)] * spacing[0]) as f32,
            (direction[(i, 1)] * spacing[1]) as f32,
            (direction[(i, 2)] * spacing[2]) as f32,
            origin[i] as f32,
        ]
    };

    let mut header = NiftiHeader::default();
    header.pixdim = [1.0, spacing[0] as f32, spacing[1] as f32, spacing[2] as f32, 1.0, 1.0, 1.0, 1.0];
    header.sform_code = XFORM_SCANNER_ANAT;
    header.qform_code = 0;
    header.scl_slope = 1.0;
    header.scl_inter = 0.0;
    header.srow_x = row(0);
    header.srow_y = row(1);
    header.srow_z = row(2);
    header.xyzt_units = UNITS_MM;
    header
}

/// Read a NIfTI image.
///
/// Accepts 3D volumes, 2D slices (read as a single z plane) and 4D series
/// with exactly one time point. Voxel values are converted to `f32` with the
/// header's intensity scaling applied.
pub fn read_nifti<P: AsRef<Path>>(path: P) -> Result<Image> {
    let path = path.as_ref();
    let obj = ReaderOptions::new()
        .read_file(path)
        .with_context(|| format!("Failed to read NIfTI file {}", path.display()))?;
    let header = obj.header().clone();

    let volume = obj
        .into_volume()
        .into_ndarray::<f32>()
        .context("Failed to convert volume to ndarray")?;
    let volume = match volume.ndim() {
        2 => volume.insert_axis(Axis(2)),
        3 => volume,
        4 if volume.shape()[3] == 1 => volume.index_axis_move(Axis(3), 0),
        _ => bail!(
            "Expected a 3D NIfTI volume, found shape {:?} in {}",
            volume.shape(),
            path.display()
        ),
    };
    let volume = volume
        .into_dimensionality::<Ix3>()
        .context("Failed to view volume as 3D")?;

    let (nx, ny, nz) = volume.dim();
    let geometry = geometry_from_header(&header, [nx, ny, nz])?;

    // Index explicitly so the voxel buffer is x-fastest whatever the array layout.
    let mut data = Vec::with_capacity(nx * ny * nz);
    for z in 0..nz {
        for y in 0..ny {
            for x in 0..nx {
                data.push(volume[[x, y, z]]);
            }
        }
    }

    tracing::info!(
        "Read {} ({}x{}x{}, spacing {:?})",
        path.display(),
        nx,
        ny,
        nz,
        geometry.spacing().as_slice()
    );
    Ok(Image::new(geometry, data)?)
}

/// Sibling path the image is written to before being renamed into place.
///
/// Only single-file outputs can be moved atomically, so `.hdr`/`.img` pairs
/// are rejected.
fn partial_path(path: &Path) -> Result<PathBuf> {
    let name = path
        .file_name()
        .with_context(|| format!("Output path {} has no file name", path.display()))?
        .to_string_lossy();
    let lower = name.to_ascii_lowercase();
    let stem = lower.strip_suffix(".gz").unwrap_or(lower.as_str());
    if stem.ends_with(".hdr") || stem.ends_with(".img") {
        bail!(
            "Output {} is a two-file NIfTI pair; write a single .nii or .nii.gz file instead",
            path.display()
        );
    }
    Ok(path.with_file_name(format!(".partial-{}", name)))
}

fn to_array<A>(image: &Image, convert: impl Fn(f32) -> A) -> Array3<A> {
    let [nx, ny, nz] = image.size();
    let geometry = image.geometry();
    let data = image.data();
    Array3::from_shape_fn((nx, ny, nz), |(x, y, z)| convert(data[geometry.linear_index([x, y, z])]))
}

/// Write an image to a NIfTI file, casting voxels to `pixel_type`.
///
/// A `.gz` extension produces a compressed file.
pub fn write_nifti<P: AsRef<Path>>(path: P, image: &Image, pixel_type: PixelType) -> Result<()> {
    let path = path.as_ref();
    let temporary = partial_path(path)?;
    let header = header_for_geometry(image.geometry());
    let writer = WriterOptions::new(&temporary).reference_header(&header);

    let written = match pixel_type {
        PixelType::U8 => writer.write_nifti(&to_array(image, |v| PixelType::U8.cast(v) as u8)),
        PixelType::I16 => writer.write_nifti(&to_array(image, |v| PixelType::I16.cast(v) as i16)),
        PixelType::U16 => writer.write_nifti(&to_array(image, |v| PixelType::U16.cast(v) as u16)),
        PixelType::F32 => writer.write_nifti(&to_array(image, |v| v)),
    }
    .with_context(|| format!("Failed to write NIfTI file {}", temporary.display()))
    .and_then(|()| {
        fs::rename(&temporary, path)
            .with_context(|| format!("Failed to move {} into place", temporary.display()))
    });

    if written.is_err() {
        // The partial file may not exist; nothing else to clean up.
        let _ = fs::remove_file(&temporary);
    }
    written?;

    tracing::info!("Wrote {} as {}", path.display(), pixel_type);
    Ok(())
}
