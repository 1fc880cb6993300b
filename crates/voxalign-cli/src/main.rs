use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use burn_ndarray::{NdArray, NdArrayDevice};
use clap::Parser;
use tracing::info;
use voxalign_core::filter::{DifferenceImageFilter, ResampleImageFilter};
use voxalign_core::image::Image;
use voxalign_core::interpolation::LinearInterpolator;
use voxalign_core::transform::{IdentityTransform, Transform};
use voxalign_io::{read_nifti, write_nifti};
use voxalign_registration::{AffineRegistration, RegistrationResult};

mod args;

use args::Cli;

type Backend = NdArray<f32>;

/// Fill value for aligned-image voxels that map outside the moving image.
const ALIGNED_DEFAULT_PIXEL_VALUE: f64 = 100.0;
/// Fill value for the resamples feeding the difference images.
const DIFFERENCE_DEFAULT_PIXEL_VALUE: f64 = 1.0;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    if let Some(threads) = cli.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("Failed to configure thread pool")?;
    }

    let result = run(&cli);
    if let Err(e) = &result {
        tracing::error!("voxalign failed: {:#}", e);
    }
    result
}

fn run(cli: &Cli) -> Result<()> {
    let config = cli.registration_config()?;
    let fixed = read_nifti(&cli.fixed)?;
    let moving = read_nifti(&cli.moving)?;

    let result = AffineRegistration::new(config).execute(&fixed, &moving)?;
    let transform = result.transform();

    // Everything is computed before the first file is written.
    let aligned = ResampleImageFilter::new_from_reference(&fixed, &transform, LinearInterpolator::new())
        .with_default_pixel_value(ALIGNED_DEFAULT_PIXEL_VALUE)
        .apply(&moving);
    let before = cli
        .diff_before
        .as_ref()
        .map(|_| difference(&fixed, &moving, IdentityTransform))
        .transpose()?;
    let after = cli
        .diff_after
        .as_ref()
        .map(|_| difference(&fixed, &moving, &transform))
        .transpose()?;

    write_nifti(&cli.output, &aligned, cli.output_type)?;
    if let (Some(path), Some(image)) = (&cli.diff_before, &before) {
        write_nifti(path, image, cli.output_type)?;
    }
    if let (Some(path), Some(image)) = (&cli.diff_after, &after) {
        write_nifti(path, image, cli.output_type)?;
    }
    if let Some(path) = &cli.report {
        write_report(path, &result)?;
    }

    println!(
        "Result: iterations={} metric={} stopReason={}",
        result.iterations, result.final_value, result.stop_description
    );
    info!("Final parameters: {:?}", result.parameters);
    Ok(())
}

/// Rescaled `fixed - resampled moving` on the fixed grid.
fn difference<T: Transform>(
    fixed: &Image,
    moving: &Image,
    transform: T,
) -> Result<Image> {
    let resampled = ResampleImageFilter::new_from_reference(fixed, transform, LinearInterpolator::new())
        .with_default_pixel_value(DIFFERENCE_DEFAULT_PIXEL_VALUE)
        .apply(moving);
    let device = NdArrayDevice::default();
    Ok(DifferenceImageFilter::new().apply::<Backend>(fixed, &resampled, &device)?)
}

fn write_report(path: &Path, result: &RegistrationResult) -> Result<()> {
    let json = serde_json::to_string_pretty(result).context("Failed to serialize result")?;
    fs::write(path, json).with_context(|| format!("Failed to write report {}", path.display()))?;
    info!("Wrote report to {}", path.display());
    Ok(())
}
