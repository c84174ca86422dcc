//! Request handling: decode a source, crop and resample it, encode it within
//! budget.
//!
//! A [`ProcessRequest`] carries the user-facing units (inches, DPI, MiB).
//! This module converts them to pixels and bytes and hands the rest to
//! [`imaging`](crate::imaging):
//!
//! ```text
//! bytes ─decode─▶ Bitmap ─crop_and_resample─▶ W×H ─encode_within_budget─▶ result
//!
//! crop_pixels = ⌊inches × dpi⌋
//! max_bytes   = ⌊MiB × 1024²⌋
//! ```
//!
//! Decoding guesses the format from content, so any format the `image`
//! crate was built with is accepted as a source.

use crate::config::{CompressionConfig, OutputConfig, limits};
use crate::imaging::calculations::{crop_pixels, max_bytes};
use crate::imaging::{
    Bitmap, Codec, EncodeRequest, EncodeResult, Encoder, ImagingError, RustEncoder,
    crop_and_resample, encode_within_budget_with,
};
use image::ImageReader;
use std::io::Cursor;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image processing failed: {0}")]
    Imaging(#[from] ImagingError),
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

/// One processing request in user-facing units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProcessRequest {
    /// Side of the intermediate square, in inches.
    pub crop_inches: f64,
    pub dpi: u32,
    /// Final width in pixels.
    pub width: u32,
    /// Final height in pixels.
    pub height: u32,
    /// Byte budget in MiB.
    pub max_file_size_mb: f64,
    pub codec: Codec,
}

impl ProcessRequest {
    /// Build a request from the `[output]` config section.
    pub fn from_output_config(output: &OutputConfig) -> Result<Self, ProcessError> {
        let codec = output
            .codec()
            .map_err(|e| ProcessError::InvalidRequest(e.to_string()))?;
        Ok(Self {
            crop_inches: output.crop_inches,
            dpi: output.dpi,
            width: output.width,
            height: output.height,
            max_file_size_mb: output.max_file_size_mb,
            codec,
        })
    }

    /// Check every value is inside its accepted range.
    pub fn validate(&self) -> Result<(), ProcessError> {
        use limits::*;
        if !(MIN_CROP_INCHES..=MAX_CROP_INCHES).contains(&self.crop_inches) {
            return Err(ProcessError::InvalidRequest(format!(
                "crop size must be {MIN_CROP_INCHES}-{MAX_CROP_INCHES} inches, got {}",
                self.crop_inches
            )));
        }
        if !(MIN_DPI..=MAX_DPI).contains(&self.dpi) {
            return Err(ProcessError::InvalidRequest(format!(
                "dpi must be {MIN_DPI}-{MAX_DPI}, got {}",
                self.dpi
            )));
        }
        if self.width == 0 || self.height == 0 {
            return Err(ProcessError::InvalidRequest(format!(
                "target size must be non-zero, got {}x{}",
                self.width, self.height
            )));
        }
        if !(MIN_FILE_SIZE_MB..=MAX_FILE_SIZE_MB).contains(&self.max_file_size_mb) {
            return Err(ProcessError::InvalidRequest(format!(
                "max file size must be {MIN_FILE_SIZE_MB}-{MAX_FILE_SIZE_MB} MB, got {}",
                self.max_file_size_mb
            )));
        }
        Ok(())
    }

    /// Side of the intermediate square, in pixels.
    pub fn crop_pixels(&self) -> u32 {
        crop_pixels(self.crop_inches, self.dpi)
    }

    /// The byte budget.
    pub fn max_bytes(&self) -> u64 {
        max_bytes(self.max_file_size_mb)
    }

    /// The encoder-facing half of the request.
    pub fn encode_request(&self) -> EncodeRequest {
        EncodeRequest {
            target_width: self.width,
            target_height: self.height,
            max_bytes: self.max_bytes(),
            codec: self.codec,
        }
    }
}

/// Read, decode and process the image at `path`.
pub fn process_file(
    path: &Path,
    req: &ProcessRequest,
    config: &CompressionConfig,
) -> Result<EncodeResult, ProcessError> {
    let bytes = std::fs::read(path)?;
    process_bytes(&bytes, req, config)
}

/// Decode an in-memory image and process it.
pub fn process_bytes(
    bytes: &[u8],
    req: &ProcessRequest,
    config: &CompressionConfig,
) -> Result<EncodeResult, ProcessError> {
    let bitmap = decode(bytes)?;
    process_bitmap(&bitmap, req, config)
}

/// Process an already-decoded bitmap with the pure Rust encoder.
pub fn process_bitmap(
    bitmap: &Bitmap,
    req: &ProcessRequest,
    config: &CompressionConfig,
) -> Result<EncodeResult, ProcessError> {
    process_bitmap_with(&RustEncoder::new(), bitmap, req, config)
}

/// Process using a specific encoder (allows testing with mock).
pub fn process_bitmap_with(
    encoder: &impl Encoder,
    bitmap: &Bitmap,
    req: &ProcessRequest,
    config: &CompressionConfig,
) -> Result<EncodeResult, ProcessError> {
    req.validate()?;
    let crop = req.crop_pixels();
    tracing::debug!(
        source_width = bitmap.width(),
        source_height = bitmap.height(),
        crop,
        width = req.width,
        height = req.height,
        "geometry"
    );
    let target = crop_and_resample(bitmap, crop, req.width, req.height)?;
    Ok(encode_within_budget_with(
        encoder,
        &target,
        &req.encode_request(),
        config,
    )?)
}

/// Decode with the format guessed from content.
fn decode(bytes: &[u8]) -> Result<Bitmap, ImagingError> {
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| ImagingError::DecodeFailure(e.to_string()))?;
    let image = reader
        .decode()
        .map_err(|e| ImagingError::DecodeFailure(e.to_string()))?;
    Ok(Bitmap::from(image))
}
