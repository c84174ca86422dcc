//! Size-constrained encoding: find the highest-fidelity encode that fits a
//! byte budget.
//!
//! Both policies walk a fixed, descending search space and return on the
//! first candidate whose length is at or under `max_bytes`. Every attempt is
//! an independent encode of an immutable bitmap, so the same input always
//! produces the same bytes.
//!
//! ## JPEG (quality first)
//!
//! ```text
//! phase A: q = 95, 90, …, 15                at full size
//! phase B: q = 95, 90, …, 15
//!            s = 0.9, 0.85, …, 0.5         (scale varies fastest)
//! fallback: q = 10 at the last scale       → CouldNotFit
//! ```
//!
//! ## PNG (palette, then scale)
//!
//! ```text
//! 1. lossless as-is                        → FitAtQuality (no quality)
//! 2. adaptive palette (skipped if indexed)  → FitAtReducedSizeWithPalette
//! 3. s = 0.9, 0.85, …, 0.5 in current mode  → FitAtReducedSize
//!    otherwise the last attempt            → CouldNotFit
//! ```
//!
//! Missing the budget is not an error: it is the [`FitStatus::CouldNotFit`]
//! outcome, carrying the smallest candidate tried.

use super::bitmap::{Bitmap, ColorMode};
use super::calculations::{quality_levels, scale_factors, scaled_dimensions};
use super::codec::{Encoder, ImagingError};
use super::params::{Codec, EncodeRequest, PngCompression, Quality};
use super::rust_codec::RustEncoder;
use crate::config::CompressionConfig;
use serde::Serialize;

/// How the final encode relates to the budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FitStatus {
    /// Fit at full size. JPEG reports the quality; PNG has none.
    FitAtQuality { quality: Option<Quality> },
    /// Fit after downscaling to `width`×`height`.
    FitAtReducedSize {
        width: u32,
        height: u32,
        quality: Option<Quality>,
    },
    /// PNG fit at full size after palette conversion.
    FitAtReducedSizeWithPalette,
    /// Nothing fit; the buffer is the last (smallest) candidate.
    CouldNotFit,
}

/// Outcome of [`encode_within_budget`].
///
/// `encoded_bytes`, the achieved dimensions and `color_mode` always describe
/// the same encode, including for [`FitStatus::CouldNotFit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeResult {
    pub encoded_bytes: Vec<u8>,
    pub achieved_width: u32,
    pub achieved_height: u32,
    pub color_mode: ColorMode,
    pub status: FitStatus,
    /// Number of encoder calls the search made.
    pub attempts: usize,
}

impl EncodeResult {
    pub fn byte_len(&self) -> usize {
        self.encoded_bytes.len()
    }

    pub fn fits(&self) -> bool {
        self.status != FitStatus::CouldNotFit
    }

    /// Everything but the payload, for logs and machine-readable output.
    pub fn report(&self, codec: Codec, max_bytes: u64) -> EncodeReport {
        EncodeReport {
            codec,
            max_bytes,
            bytes: self.byte_len(),
            width: self.achieved_width,
            height: self.achieved_height,
            color_mode: self.color_mode,
            status: self.status,
            attempts: self.attempts,
        }
    }
}

/// Serializable summary of an [`EncodeResult`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EncodeReport {
    pub codec: Codec,
    pub max_bytes: u64,
    pub bytes: usize,
    pub width: u32,
    pub height: u32,
    pub color_mode: ColorMode,
    pub status: FitStatus,
    pub attempts: usize,
}

/// Worst-case number of encoder calls for a codec under `config`.
///
/// JPEG: every quality at full size, every quality × scale, one fallback.
/// PNG: as-is, palette, every scale.
pub fn max_attempts(config: &CompressionConfig, codec: Codec) -> usize {
    let scales = scale_factors(
        config.initial_scale_factor,
        config.min_scale_factor,
        config.scale_factor_step,
    )
    .len();
    match codec {
        Codec::Jpeg => {
            let levels = quality_levels(
                config.jpeg_initial_quality,
                config.jpeg_min_quality,
                config.jpeg_quality_step,
            )
            .len();
            levels + levels * scales + 1
        }
        Codec::Png => 2 + scales,
    }
}

/// Encode `bitmap` for `req.codec` at or under `req.max_bytes`, using the
/// pure Rust encoder.
pub fn encode_within_budget(
    bitmap: &Bitmap,
    req: &EncodeRequest,
    config: &CompressionConfig,
) -> Result<EncodeResult, ImagingError> {
    encode_within_budget_with(&RustEncoder::new(), bitmap, req, config)
}

/// Encode within budget using a specific encoder (allows testing with mock).
pub fn encode_within_budget_with(
    encoder: &impl Encoder,
    bitmap: &Bitmap,
    req: &EncodeRequest,
    config: &CompressionConfig,
) -> Result<EncodeResult, ImagingError> {
    req.validate()?;
    let mut search = Search {
        encoder,
        max_bytes: req.max_bytes,
        attempts: 0,
    };
    let result = match req.codec {
        Codec::Jpeg => search.jpeg(bitmap, req, config)?,
        Codec::Png => search.png(bitmap, req, config)?,
    };

    if result.fits() {
        tracing::info!(
            codec = %req.codec,
            bytes = result.byte_len(),
            width = result.achieved_width,
            height = result.achieved_height,
            attempts = result.attempts,
            status = ?result.status,
            "fit within budget"
        );
    } else {
        tracing::warn!(
            codec = %req.codec,
            bytes = result.byte_len(),
            max_bytes = req.max_bytes,
            attempts = result.attempts,
            "could not fit within budget"
        );
    }
    Ok(result)
}

/// One encode attempt: its bytes and the raster they describe.
struct Candidate {
    bytes: Vec<u8>,
    width: u32,
    height: u32,
    color_mode: ColorMode,
}

impl Candidate {
    fn into_result(self, status: FitStatus, attempts: usize) -> EncodeResult {
        EncodeResult {
            encoded_bytes: self.bytes,
            achieved_width: self.width,
            achieved_height: self.height,
            color_mode: self.color_mode,
            status,
            attempts,
        }
    }
}

/// Per-call search driver. Holds only the attempt counter; nothing outlives
/// the call.
struct Search<'a, E: Encoder> {
    encoder: &'a E,
    max_bytes: u64,
    attempts: usize,
}

impl<E: Encoder> Search<'_, E> {
    fn fits(&self, candidate: &Candidate) -> bool {
        candidate.bytes.len() as u64 <= self.max_bytes
    }

    fn jpeg_attempt(
        &mut self,
        bitmap: &Bitmap,
        quality: Quality,
    ) -> Result<Candidate, ImagingError> {
        self.attempts += 1;
        let candidate = Candidate {
            bytes: self.encoder.encode_jpeg(bitmap, quality)?,
            width: bitmap.width(),
            height: bitmap.height(),
            color_mode: ColorMode::Rgb,
        };
        tracing::debug!(
            codec = "jpeg",
            width = candidate.width,
            height = candidate.height,
            quality = quality.value(),
            bytes = candidate.bytes.len(),
            fit = self.fits(&candidate),
            "encode attempt"
        );
        Ok(candidate)
    }

    fn png_attempt(
        &mut self,
        bitmap: &Bitmap,
        compression: PngCompression,
    ) -> Result<Candidate, ImagingError> {
        self.attempts += 1;
        let candidate = Candidate {
            bytes: self.encoder.encode_png(bitmap, compression)?,
            width: bitmap.width(),
            height: bitmap.height(),
            color_mode: bitmap.color_mode(),
        };
        tracing::debug!(
            codec = "png",
            width = candidate.width,
            height = candidate.height,
            mode = ?candidate.color_mode,
            bytes = candidate.bytes.len(),
            fit = self.fits(&candidate),
            "encode attempt"
        );
        Ok(candidate)
    }

    fn jpeg(
        &mut self,
        bitmap: &Bitmap,
        req: &EncodeRequest,
        config: &CompressionConfig,
    ) -> Result<EncodeResult, ImagingError> {
        let levels = quality_levels(
            config.jpeg_initial_quality,
            config.jpeg_min_quality,
            config.jpeg_quality_step,
        );

        // Phase A: quality only, full size.
        for &quality in &levels {
            let candidate = self.jpeg_attempt(bitmap, quality)?;
            if self.fits(&candidate) {
                let status = FitStatus::FitAtQuality {
                    quality: Some(quality),
                };
                return Ok(candidate.into_result(status, self.attempts));
            }
        }

        // Phase B: quality outer, scale inner. The downscaled bitmaps do not
        // depend on quality; each is resampled on first use and reused.
        let targets = scaled_targets(req, config);
        let mut scaled: Vec<Bitmap> = Vec::with_capacity(targets.len());
        for &quality in &levels {
            for (i, &(width, height)) in targets.iter().enumerate() {
                if i == scaled.len() {
                    scaled.push(bitmap.resample(width, height));
                }
                let candidate = self.jpeg_attempt(&scaled[i], quality)?;
                if self.fits(&candidate) {
                    let status = FitStatus::FitAtReducedSize {
                        width: candidate.width,
                        height: candidate.height,
                        quality: Some(quality),
                    };
                    return Ok(candidate.into_result(status, self.attempts));
                }
            }
        }

        // Fallback: floor quality at the last scale phase B reached.
        let floor = Quality::new(config.jpeg_min_quality);
        let candidate = self.jpeg_attempt(scaled.last().unwrap_or(bitmap), floor)?;
        Ok(candidate.into_result(FitStatus::CouldNotFit, self.attempts))
    }

    fn png(
        &mut self,
        bitmap: &Bitmap,
        req: &EncodeRequest,
        config: &CompressionConfig,
    ) -> Result<EncodeResult, ImagingError> {
        let compression = PngCompression::from_level(config.png_compression_level);

        // Step 1: lossless, unmodified.
        let mut last = self.png_attempt(bitmap, compression)?;
        if self.fits(&last) {
            let status = FitStatus::FitAtQuality { quality: None };
            return Ok(last.into_result(status, self.attempts));
        }

        // Step 2: one-shot palette conversion.
        let palette;
        let working = if bitmap.is_indexed() {
            bitmap
        } else {
            palette = bitmap.to_palette(config.palette_colors as usize);
            last = self.png_attempt(&palette, compression)?;
            if self.fits(&last) {
                let status = FitStatus::FitAtReducedSizeWithPalette;
                return Ok(last.into_result(status, self.attempts));
            }
            &palette
        };

        // Step 3: downscale in the current colour mode.
        for (width, height) in scaled_targets(req, config) {
            let scaled_bitmap = working.resample(width, height);
            last = self.png_attempt(&scaled_bitmap, compression)?;
            if self.fits(&last) {
                let status = FitStatus::FitAtReducedSize {
                    width: last.width,
                    height: last.height,
                    quality: None,
                };
                return Ok(last.into_result(status, self.attempts));
            }
        }

        Ok(last.into_result(FitStatus::CouldNotFit, self.attempts))
    }
}

/// The request's target scaled by each search factor, in search order.
fn scaled_targets(req: &EncodeRequest, config: &CompressionConfig) -> Vec<(u32, u32)> {
    scale_factors(
        config.initial_scale_factor,
        config.min_scale_factor,
        config.scale_factor_step,
    )
    .into_iter()
    .map(|scale| scaled_dimensions((req.target_width, req.target_height), scale))
    .collect()
}
