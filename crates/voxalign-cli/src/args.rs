use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use voxalign_io::PixelType;
use voxalign_registration::{CenterInitialization, RegistrationConfig};

#[derive(Parser, Debug)]
#[command(name = "voxalign")]
#[command(about = "Affine registration of a moving 3D image onto a fixed image")]
pub struct Cli {
    /// Fixed (reference) image
    pub fixed: PathBuf,

    /// Moving image, resampled onto the fixed grid
    pub moving: PathBuf,

    /// Registered moving image
    pub output: PathBuf,

    /// Rescaled difference between fixed and moving before registration
    pub diff_before: Option<PathBuf>,

    /// Rescaled difference between fixed and registered moving
    pub diff_after: Option<PathBuf>,

    /// Initial optimizer step length
    pub step_length: Option<f64>,

    /// Maximum number of optimizer iterations
    pub max_iterations: Option<usize>,

    /// Scale of translation parameters relative to matrix entries
    pub translation_scale: Option<f64>,

    /// JSON registration configuration; positional values take precedence
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Write the registration result as JSON
    #[arg(short, long)]
    pub report: Option<PathBuf>,

    /// Pixel type of written images (u8, i16, u16, f32)
    #[arg(short = 't', long, default_value_t = PixelType::U8)]
    pub output_type: PixelType,

    /// Worker threads for metric evaluation (defaults to all cores)
    #[arg(short = 'j', long)]
    pub threads: Option<usize>,

    /// Wall-clock limit in seconds, checked between iterations
    #[arg(long)]
    pub time_limit: Option<f64>,

    /// How the rotation center is chosen
    #[arg(long, value_enum)]
    pub center: Option<CenterArg>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CenterArg {
    /// Intensity centroid of the fixed image
    Mass,
    /// Physical center of the fixed grid
    Geometry,
}

impl From<CenterArg> for CenterInitialization {
    fn from(arg: CenterArg) -> Self {
        match arg {
            CenterArg::Mass => CenterInitialization::CenterOfMass,
            CenterArg::Geometry => CenterInitialization::Geometry,
        }
    }
}

impl Cli {
    /// Configuration from `--config` (or defaults) with command-line overrides applied.
    pub fn registration_config(&self) -> Result<RegistrationConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let text = fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config {}", path.display()))?;
                serde_json::from_str(&text)
                    .with_context(|| format!("Failed to parse config {}", path.display()))?
            }
            None => RegistrationConfig::default(),
        };

        if let Some(step) = self.step_length {
            config.maximum_step_length = step;
        }
        if let Some(iterations) = self.max_iterations {
            config.maximum_iterations = iterations;
        }
        if let Some(scale) = self.translation_scale {
            config.translation_scale = scale;
        }
        if let Some(center) = self.center {
            config.center_initialization = center.into();
        }
        if let Some(seconds) = self.time_limit {
            let limit = Duration::try_from_secs_f64(seconds)
                .with_context(|| format!("Invalid time limit: {}", seconds))?;
            config.time_limit = Some(limit);
        }
        Ok(config)
    }
}
