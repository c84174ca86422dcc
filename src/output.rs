//! CLI output formatting for processing results.
//!
//! # Output Format
//!
//! ```text
//! Processed successfully! Final size: 842.30 KB, Quality: 65
//!     Source: portrait.heic
//!     Output: portrait-processed.jpg (461x579, rgb)
//!     Attempts: 7
//! ```
//!
//! The first line states the outcome; the indented lines are context.
//! A result that missed its budget leads with a `Warning:` line instead.
//!
//! # Architecture
//!
//! [`format_result`] returns `Vec<String>` for testability and
//! [`print_result`] writes it to stdout. Format functions are pure: no I/O,
//! no side effects.

use crate::imaging::{ColorMode, EncodeResult, FitStatus};
use std::path::Path;

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Format a byte count as kibibytes with two decimals.
///
/// ```text
/// 862515 → "842.30 KB"
/// ```
fn format_kb(bytes: usize) -> String {
    format!("{:.2} KB", bytes as f64 / 1024.0)
}

fn color_mode_name(mode: ColorMode) -> &'static str {
    match mode {
        ColorMode::Rgb => "rgb",
        ColorMode::Rgba => "rgba",
        ColorMode::Indexed => "palette",
    }
}

/// One-line summary of how the result relates to its budget.
pub fn status_line(result: &EncodeResult) -> String {
    let size = format_kb(result.byte_len());
    match result.status {
        FitStatus::FitAtQuality { quality: Some(q) } => {
            format!("Processed successfully! Final size: {size}, Quality: {q}")
        }
        FitStatus::FitAtQuality { quality: None } => {
            format!("Processed successfully! Final size: {size}")
        }
        FitStatus::FitAtReducedSize {
            width,
            height,
            quality,
        } => {
            let mut line =
                format!("Processed with reduced size ({width}x{height})! Final size: {size}");
            if let Some(q) = quality {
                line.push_str(&format!(", Quality: {q}"));
            }
            line
        }
        FitStatus::FitAtReducedSizeWithPalette => {
            format!("Processed with palette reduction! Final size: {size}")
        }
        FitStatus::CouldNotFit => {
            format!("Warning: Could not compress below target size. Final size: {size}")
        }
    }
}

/// Format a processing result with its source and output paths.
pub fn format_result(result: &EncodeResult, source: &Path, output: &Path) -> Vec<String> {
    vec![
        status_line(result),
        format!("{}Source: {}", indent(1), source.display()),
        format!(
            "{}Output: {} ({}x{}, {})",
            indent(1),
            output.display(),
            result.achieved_width,
            result.achieved_height,
            color_mode_name(result.color_mode)
        ),
        format!("{}Attempts: {}", indent(1), result.attempts),
    ]
}

pub fn print_result(result: &EncodeResult, source: &Path, output: &Path) {
    for line in format_result(result, source, output) {
        println!("{}", line);
    }
}
