//! # Photofit
//!
//! Turn an arbitrary photo into a fixed-resolution file that fits a byte
//! budget. Typical use is an ID or profile photo that an upload form limits
//! to exact pixel dimensions and a maximum size.
//!
//! # Architecture: Two Stages
//!
//! ```text
//! 1. Geometry  source  →  centred square  →  crop²  →  W×H     (exact dimensions)
//! 2. Budget    W×H     →  encoded bytes ≤ max_bytes             (best fidelity that fits)
//! ```
//!
//! The geometry stage is deterministic and lossy only in resampling. The
//! budget stage is a bounded, ordered search over encoder settings and
//! downscale factors; it returns the first candidate that fits, or the
//! smallest one it tried.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`imaging`] | Bitmaps, the codec seam, the geometry stage and the budget search |
//! | [`process`] | Request handling: unit conversion, decoding, both stages |
//! | [`config`] | `config.toml` loading, validation and merging over stock defaults |
//! | [`output`] | CLI output formatting of a result |
//!
//! # Design Decisions
//!
//! ## Quality Before Size
//!
//! For JPEG every quality level is tried at full resolution before any
//! downscale. Viewers notice lost pixels sooner than a lower quality setting,
//! so resolution is the last thing given up.
//!
//! ## Palette Before Size
//!
//! PNG has no quality knob. The one lossy lever short of downscaling is an
//! adaptive palette, so that is tried once before the scale search.
//!
//! ## Pure-Rust Codecs
//!
//! Decoding and encoding use the `image` and `png` crates, palette
//! quantization uses `color_quant`. No system libraries, so the binary is
//! self-contained.
//!
//! ## Encoder Seam
//!
//! The search talks to an [`imaging::Encoder`] trait, not to a codec crate.
//! Tests substitute a recording mock with synthetic sizes to pin the exact
//! search order without encoding anything.

pub mod config;
pub mod imaging;
pub mod output;
pub mod process;
