//! Output pixel types and voxel casting.

use std::fmt;
use std::str::FromStr;
use serde::{Deserialize, Serialize};

/// Pixel type of a written image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PixelType {
    /// Unsigned 8-bit.
    #[default]
    U8,
    /// Signed 16-bit.
    I16,
    /// Unsigned 16-bit.
    U16,
    /// 32-bit float, written unchanged.
    F32,
}

impl PixelType {
    /// Representable range, or `None` for floating point.
    pub fn range(&self) -> Option<(f64, f64)> {
        match self {
            Self::U8 => Some((u8::MIN as f64, u8::MAX as f64)),
            Self::I16 => Some((i16::MIN as f64, i16::MAX as f64)),
            Self::U16 => Some((u16::MIN as f64, u16::MAX as f64)),
            Self::F32 => None,
        }
    }

    /// Round to nearest and clamp into the pixel type range.
    ///
    /// Integer types map NaN to zero.
    pub fn cast(&self, value: f32) -> f64 {
        match self.range() {
            None => value as f64,
            Some(_) if value.is_nan() => 0.0,
            Some((lo, hi)) => (value as f64).round().clamp(lo, hi),
        }
    }
}

impl fmt::Display for PixelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::U8 => "u8",
            Self::I16 => "i16",
            Self::U16 => "u16",
            Self::F32 => "f32",
        };
        f.write_str(name)
    }
}

impl FromStr for PixelType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "u8" | "uchar" | "uint8" => Ok(Self::U8),
            "i16" | "short" | "int16" => Ok(Self::I16),
            "u16" | "ushort" | "uint16" => Ok(Self::U16),
            "f32" | "float" | "float32" => Ok(Self::F32),
            other => Err(format!("unknown pixel type '{}', expected one of u8, i16, u16, f32", other)),
        }
    }
}
