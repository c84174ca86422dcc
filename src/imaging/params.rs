//! Parameter types for the encoder.
//!
//! These structs describe *what* to produce, not *how*. They are the interface
//! between callers (which decide the target resolution, budget and codec) and
//! the [`budget`](super::budget) search (which decides quality, palette and
//! scale).
//!
//! ## Types
//!
//! - [`Quality`]: lossy encoding quality (1–100, default 95). Clamped on construction.
//! - [`Codec`]: the two output codecs, parsed from `"jpg"`, `"jpeg"` or `"png"`.
//! - [`PngCompression`]: lossless compression effort, derived from a 0–9 level.
//! - [`EncodeRequest`]: target dimensions, byte budget and codec for one request.

use super::codec::ImagingError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }

    /// The value as the `u8` the JPEG encoder takes.
    pub(crate) fn as_u8(self) -> u8 {
        self.0.clamp(1, 100) as u8
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(95)
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Output codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Codec {
    Jpeg,
    Png,
}

impl Codec {
    /// File extension for encoded output.
    pub fn extension(self) -> &'static str {
        match self {
            Codec::Jpeg => "jpg",
            Codec::Png => "png",
        }
    }
}

impl FromStr for Codec {
    type Err = ImagingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Ok(Codec::Jpeg),
            "png" => Ok(Codec::Png),
            other => Err(ImagingError::UnsupportedCodec(other.to_string())),
        }
    }
}

impl fmt::Display for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Codec::Jpeg => f.write_str("JPEG"),
            Codec::Png => f.write_str("PNG"),
        }
    }
}

/// Lossless compression effort for PNG output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PngCompression {
    Fast,
    Default,
    Best,
}

impl PngCompression {
    /// Map a zlib-style 0–9 level onto the three efforts the encoders expose.
    pub fn from_level(level: u32) -> Self {
        match level {
            0..=3 => PngCompression::Fast,
            4..=6 => PngCompression::Default,
            _ => PngCompression::Best,
        }
    }
}

/// One size-constrained encode: target resolution, byte budget, codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeRequest {
    pub target_width: u32,
    pub target_height: u32,
    pub max_bytes: u64,
    pub codec: Codec,
}

impl EncodeRequest {
    /// Check the request invariants: positive dimensions and a non-zero budget.
    pub fn validate(&self) -> Result<(), ImagingError> {
        if self.target_width == 0 || self.target_height == 0 {
            return Err(ImagingError::InvalidDimensions {
                width: self.target_width,
                height: self.target_height,
            });
        }
        if self.max_bytes == 0 {
            return Err(ImagingError::InvalidBudget);
        }
        Ok(())
    }
}
