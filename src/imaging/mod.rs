//! Image processing in pure Rust.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Crop** | `image::imageops::crop_imm` (centred square) |
//! | **Resample** | Lanczos3 (truecolor), nearest-neighbour (indexed) |
//! | **Palette** | `color_quant::NeuQuant`, up to 256 colours |
//! | **Encode → JPEG** | `image::codecs::jpeg::JpegEncoder` |
//! | **Encode → PNG** | `image::codecs::png::PngEncoder`, `png` for indexed |
//!
//! The module is split into:
//! - **Bitmap**: [`Bitmap`] in RGB, RGBA or indexed mode
//! - **Calculations**: Pure functions for crop geometry and search sequences (unit testable)
//! - **Parameters**: Data structures describing an encode request
//! - **Codec**: [`Encoder`] trait + [`RustEncoder`]
//! - **Geometry**: [`crop_and_resample`], source to exact target dimensions
//! - **Budget**: [`encode_within_budget`], the size-constrained search

pub mod bitmap;
pub mod budget;
pub mod calculations;
pub mod codec;
pub mod geometry;
mod params;
pub mod rust_codec;

pub use bitmap::{Bitmap, ColorMode, IndexedImage};
pub use budget::{
    EncodeReport, EncodeResult, FitStatus, encode_within_budget, encode_within_budget_with,
    max_attempts,
};
pub use codec::{Encoder, ImagingError};
pub use geometry::crop_and_resample;
pub use params::{Codec, EncodeRequest, PngCompression, Quality};
pub use rust_codec::RustEncoder;
