//! Pure calculation functions for crop geometry, unit conversion and the
//! search sequences.
//!
//! All functions here are pure and testable without any I/O or images.

use super::params::Quality;

/// Tolerance when comparing accumulated scale factors against their floor.
const SCALE_EPSILON: f64 = 1e-9;

/// Tolerance when flooring scaled pixel dimensions.
const DIMENSION_EPSILON: f64 = 1e-6;

/// A square crop region inside a source image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropBox {
    pub left: u32,
    pub top: u32,
    pub size: u32,
}

impl CropBox {
    pub fn right(&self) -> u32 {
        self.left + self.size
    }

    pub fn bottom(&self) -> u32 {
        self.top + self.size
    }
}

/// Calculate the centred square crop for a source of the given dimensions.
///
/// The square's side is the shorter source edge; odd leftovers put the
/// extra pixel on the right/bottom.
///
/// # Examples
/// ```
/// # use photofit::imaging::calculations::centered_square;
/// let crop = centered_square(1000, 1500);
/// assert_eq!((crop.left, crop.top, crop.size), (0, 250, 1000));
/// ```
pub fn centered_square(width: u32, height: u32) -> CropBox {
    let size = width.min(height);
    CropBox {
        left: (width - size) / 2,
        top: (height - size) / 2,
        size,
    }
}

/// Convert a physical crop size to pixels: `floor(inches * dpi)`.
pub fn crop_pixels(crop_inches: f64, dpi: u32) -> u32 {
    (crop_inches * dpi as f64).floor().max(0.0) as u32
}

/// Convert a megabyte budget to bytes: `floor(mb * 1024 * 1024)`.
pub fn max_bytes(max_mb: f64) -> u64 {
    (max_mb * 1024.0 * 1024.0).floor().max(0.0) as u64
}

/// Dimensions of a target scaled by `scale`, floored and never below 1×1.
///
/// A product that lands a hair under an integer through float error (e.g.
/// 69.99999999 for 100 × 0.7) floors to that integer, not the one below.
pub fn scaled_dimensions(target: (u32, u32), scale: f64) -> (u32, u32) {
    let (w, h) = target;
    let sw = (w as f64 * scale + DIMENSION_EPSILON).floor() as u32;
    let sh = (h as f64 * scale + DIMENSION_EPSILON).floor() as u32;
    (sw.max(1), sh.max(1))
}

/// Descending JPEG quality levels: `initial, initial - step, …` while
/// strictly above `floor`.
///
/// # Examples
/// ```
/// # use photofit::imaging::calculations::quality_levels;
/// let levels: Vec<u32> = quality_levels(95, 10, 5).iter().map(|q| q.value()).collect();
/// assert_eq!(levels.first(), Some(&95));
/// assert_eq!(levels.last(), Some(&15));
/// ```
pub fn quality_levels(initial: u32, floor: u32, step: u32) -> Vec<Quality> {
    if step == 0 {
        return if initial > floor {
            vec![Quality::new(initial)]
        } else {
            Vec::new()
        };
    }
    (0..)
        .map(|i| initial.checked_sub(i * step))
        .take_while(|q| q.is_some_and(|q| q > floor))
        .flatten()
        .map(Quality::new)
        .collect()
}

/// Descending scale factors: `initial, initial - step, …` while at or
/// above `floor`.
///
/// Each factor is computed from its index rather than by repeated
/// subtraction, so the sequence does not drift.
pub fn scale_factors(initial: f64, floor: f64, step: f64) -> Vec<f64> {
    if step <= 0.0 {
        return if initial + SCALE_EPSILON >= floor {
            vec![initial]
        } else {
            Vec::new()
        };
    }
    (0u32..)
        .map(|i| initial - i as f64 * step)
        .take_while(|s| *s + SCALE_EPSILON >= floor)
        .collect()
}
