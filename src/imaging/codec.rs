//! Codec seam and error type.
//!
//! The [`Encoder`] trait defines the two primitive encodes the budget search
//! needs: JPEG at a given quality and PNG at a given compression effort. Each
//! call returns a fresh byte buffer; the search only ever looks at its length.
//!
//! The production implementation is
//! [`RustEncoder`](super::rust_codec::RustEncoder). Tests swap in a mock that
//! reports synthetic sizes so the search order can be pinned exactly.

use super::bitmap::Bitmap;
use super::params::{PngCompression, Quality};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImagingError {
    #[error("Invalid dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },
    #[error("Byte budget must be greater than zero")]
    InvalidBudget,
    #[error("Unsupported codec: {0} (expected jpg, jpeg or png)")]
    UnsupportedCodec(String),
    #[error("Encode failed: {0}")]
    EncodeFailure(String),
    #[error("Decode failed: {0}")]
    DecodeFailure(String),
}

/// Trait for encoders.
///
/// Implementations hold no mutable state, so one encoder can serve any number
/// of concurrent searches.
pub trait Encoder: Sync {
    /// Encode as baseline JPEG. Bitmaps with alpha or a palette are flattened to RGB.
    fn encode_jpeg(&self, bitmap: &Bitmap, quality: Quality) -> Result<Vec<u8>, ImagingError>;

    /// Encode as PNG, keeping the bitmap's colour mode (RGB, RGBA or indexed).
    fn encode_png(
        &self,
        bitmap: &Bitmap,
        compression: PngCompression,
    ) -> Result<Vec<u8>, ImagingError>;
}
