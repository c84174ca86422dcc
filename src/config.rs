//! Configuration module.
//!
//! Handles loading and validating `config.toml`. A config file is sparse:
//! user values are merged on top of the stock defaults, so a file only needs
//! the keys it wants to change.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [output]
//! crop_inches = 2.0         # Side of the centred square crop, in inches
//! dpi = 300                 # Dots per inch used to turn inches into pixels
//! width = 461               # Final width in pixels
//! height = 579              # Final height in pixels
//! max_file_size_mb = 1.0    # Byte budget, in MiB
//! format = "jpg"            # "jpg" or "png"
//!
//! [compression]
//! jpeg_initial_quality = 95
//! jpeg_min_quality = 10     # Exclusive floor of the quality search
//! jpeg_quality_step = 5
//! png_compression_level = 9 # 0-9, higher = smaller and slower
//! palette_colors = 256      # Palette size for the PNG palette step
//! initial_scale_factor = 0.9
//! min_scale_factor = 0.5    # Inclusive floor of the scale search
//! scale_factor_step = 0.05
//! ```
//!
//! Unknown keys are rejected to catch typos early.
//!
//! [`CompressionConfig`] is the immutable value the budget search reads. It
//! is passed by shared reference, so concurrent requests never share mutable
//! settings.

use crate::imaging::{Codec, ImagingError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Accepted ranges for the `[output]` values.
pub mod limits {
    pub const MIN_CROP_INCHES: f64 = 0.5;
    pub const MAX_CROP_INCHES: f64 = 10.0;
    pub const MIN_DPI: u32 = 72;
    pub const MAX_DPI: u32 = 600;
    pub const MIN_FILE_SIZE_MB: f64 = 0.1;
    pub const MAX_FILE_SIZE_MB: f64 = 10.0;
}

/// Top-level configuration loaded from `config.toml`.
///
/// All fields have defaults. Unknown keys are rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Default request values, overridable per run from the command line.
    pub output: OutputConfig,
    /// Search parameters for the size-constrained encoder.
    pub compression: CompressionConfig,
}

impl Config {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.output.validate()?;
        self.compression.validate()
    }
}

/// Default request values in user-facing units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// Side of the centred square crop, in inches.
    pub crop_inches: f64,
    /// Dots per inch for inch-to-pixel conversion.
    pub dpi: u32,
    /// Final width in pixels.
    pub width: u32,
    /// Final height in pixels.
    pub height: u32,
    /// Maximum encoded size, in MiB.
    pub max_file_size_mb: f64,
    /// Output codec: `"jpg"`, `"jpeg"` or `"png"`.
    pub format: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            crop_inches: 2.0,
            dpi: 300,
            width: 461,
            height: 579,
            max_file_size_mb: 1.0,
            format: "jpg".to_string(),
        }
    }
}

impl OutputConfig {
    /// The configured format as a [`Codec`].
    pub fn codec(&self) -> Result<Codec, ConfigError> {
        self.format
            .parse()
            .map_err(|e: ImagingError| ConfigError::Validation(format!("output.format: {e}")))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        use limits::*;
        if !(MIN_CROP_INCHES..=MAX_CROP_INCHES).contains(&self.crop_inches) {
            return Err(ConfigError::Validation(format!(
                "output.crop_inches must be {MIN_CROP_INCHES}-{MAX_CROP_INCHES}"
            )));
        }
        if !(MIN_DPI..=MAX_DPI).contains(&self.dpi) {
            return Err(ConfigError::Validation(format!(
                "output.dpi must be {MIN_DPI}-{MAX_DPI}"
            )));
        }
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::Validation(
                "output.width and output.height must be non-zero".into(),
            ));
        }
        if !(MIN_FILE_SIZE_MB..=MAX_FILE_SIZE_MB).contains(&self.max_file_size_mb) {
            return Err(ConfigError::Validation(format!(
                "output.max_file_size_mb must be {MIN_FILE_SIZE_MB}-{MAX_FILE_SIZE_MB}"
            )));
        }
        self.codec().map(|_| ())
    }
}

/// Search parameters for the size-constrained encoder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompressionConfig {
    /// First JPEG quality tried.
    pub jpeg_initial_quality: u32,
    /// Exclusive lower bound of the JPEG quality search; also the quality of
    /// the over-budget fallback encode.
    pub jpeg_min_quality: u32,
    /// Quality decrement between attempts.
    pub jpeg_quality_step: u32,
    /// PNG compression effort, 0-9.
    pub png_compression_level: u32,
    /// Palette size for the PNG palette step (2-256).
    pub palette_colors: u32,
    /// First scale factor tried once downscaling starts.
    pub initial_scale_factor: f64,
    /// Inclusive lower bound of the scale search.
    pub min_scale_factor: f64,
    /// Scale decrement between attempts.
    pub scale_factor_step: f64,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            jpeg_initial_quality: 95,
            jpeg_min_quality: 10,
            jpeg_quality_step: 5,
            png_compression_level: 9,
            palette_colors: 256,
            initial_scale_factor: 0.9,
            min_scale_factor: 0.5,
            scale_factor_step: 0.05,
        }
    }
}

impl CompressionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=100).contains(&self.jpeg_initial_quality) {
            return Err(ConfigError::Validation(
                "compression.jpeg_initial_quality must be 1-100".into(),
            ));
        }
        if self.jpeg_min_quality == 0 || self.jpeg_min_quality >= self.jpeg_initial_quality {
            return Err(ConfigError::Validation(
                "compression.jpeg_min_quality must be at least 1 and below jpeg_initial_quality"
                    .into(),
            ));
        }
        if self.jpeg_quality_step == 0 {
            return Err(ConfigError::Validation(
                "compression.jpeg_quality_step must be non-zero".into(),
            ));
        }
        if self.png_compression_level > 9 {
            return Err(ConfigError::Validation(
                "compression.png_compression_level must be 0-9".into(),
            ));
        }
        if !(2..=256).contains(&self.palette_colors) {
            return Err(ConfigError::Validation(
                "compression.palette_colors must be 2-256".into(),
            ));
        }
        if !(self.min_scale_factor > 0.0 && self.min_scale_factor <= self.initial_scale_factor) {
            return Err(ConfigError::Validation(
                "compression.min_scale_factor must be above 0 and at most initial_scale_factor"
                    .into(),
            ));
        }
        if self.initial_scale_factor > 1.0 {
            return Err(ConfigError::Validation(
                "compression.initial_scale_factor must be at most 1.0".into(),
            ));
        }
        if !(self.scale_factor_step > 0.0) {
            return Err(ConfigError::Validation(
                "compression.scale_factor_step must be positive".into(),
            ));
        }
        Ok(())
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the base layer user overrides are merged onto.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(Config::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Merge an optional overlay onto the stock defaults, then deserialize and validate.
pub fn resolve_config(overlay: Option<toml::Value>) -> Result<Config, ConfigError> {
    let base = stock_defaults_value();
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: Config = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from a TOML file.
///
/// `None` yields the validated stock defaults. A path that does not exist
/// is an IO error: an explicitly named config file must be present.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let overlay = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            Some(toml::from_str::<toml::Value>(&content)?)
        }
        None => None,
    };
    resolve_config(overlay)
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# photofit configuration
# ======================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Output defaults (each can be overridden on the command line)
# ---------------------------------------------------------------------------
[output]
# Side of the centred square crop, in inches (0.5 - 10.0).
crop_inches = 2.0

# Dots per inch used to turn crop_inches into pixels (72 - 600).
dpi = 300

# Final resolution in pixels. The square crop is stretched to fit.
width = 461
height = 579

# Maximum encoded file size in MiB (0.1 - 10.0).
max_file_size_mb = 1.0

# Output format: "jpg" or "png".
format = "jpg"

# ---------------------------------------------------------------------------
# Size-constrained search
# ---------------------------------------------------------------------------
[compression]
# JPEG quality search: start, exclusive floor, step.
jpeg_initial_quality = 95
jpeg_min_quality = 10
jpeg_quality_step = 5

# PNG compression effort (0 = fastest, 9 = smallest).
png_compression_level = 9

# Number of palette colours when PNG output falls back to indexed colour.
palette_colors = 256

# Downscale search: start, inclusive floor, step.
initial_scale_factor = 0.9
min_scale_factor = 0.5
scale_factor_step = 0.05
"##
}
