//! Geometry stage: centred square crop, intermediate resize, final resample.
//!
//! ```text
//! source (W×H) → centred min(W,H)² crop → crop_pixels² → target_w × target_h
//! ```
//!
//! The last resample is unconditional and may change the aspect ratio.

use super::bitmap::Bitmap;
use super::calculations::centered_square;
use super::codec::ImagingError;

/// Crop the centred square of `source`, resize it to `crop_pixels`², then
/// resample to exactly `target_w`×`target_h`.
///
/// `crop_pixels` only sets the intermediate square size; the intermediate
/// resize is skipped when it equals the square's side.
pub fn crop_and_resample(
    source: &Bitmap,
    crop_pixels: u32,
    target_w: u32,
    target_h: u32,
) -> Result<Bitmap, ImagingError> {
    if target_w == 0 || target_h == 0 {
        return Err(ImagingError::InvalidDimensions {
            width: target_w,
            height: target_h,
        });
    }
    if crop_pixels == 0 {
        return Err(ImagingError::InvalidDimensions {
            width: crop_pixels,
            height: crop_pixels,
        });
    }
    let (width, height) = source.dimensions();
    if width == 0 || height == 0 {
        return Err(ImagingError::InvalidDimensions { width, height });
    }

    let crop = centered_square(width, height);
    let square = source.crop(crop.left, crop.top, crop.size, crop.size);
    let square = if crop.size != crop_pixels {
        square.resample(crop_pixels, crop_pixels)
    } else {
        square
    };

    Ok(square.resample(target_w, target_h))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    /// Left half red, right half blue, with a green band across the vertical centre.
    fn marked(width: u32, height: u32) -> Bitmap {
        Bitmap::Rgb(RgbImage::from_fn(width, height, |x, y| {
            if y.abs_diff(height / 2) < 4 {
                Rgb([0, 255, 0])
            } else if x < width / 2 {
                Rgb([255, 0, 0])
            } else {
                Rgb([0, 0, 255])
            }
        }))
    }

    #[test]
    fn output_has_exact_target_dimensions() {
        let out = crop_and_resample(&marked(1000, 1500), 600, 461, 579).unwrap();
        assert_eq!(out.dimensions(), (461, 579));
    }

    #[test]
    fn output_dimensions_for_landscape_source() {
        let out = crop_and_resample(&marked(300, 200), 150, 120, 80).unwrap();
        assert_eq!(out.dimensions(), (120, 80));
    }

    #[test]
    fn crop_pixels_equal_to_min_dim_skips_intermediate_resize() {
        // 100x100 square source, crop 100, target 100: nothing to do
        let src = marked(100, 100);
        let out = crop_and_resample(&src, 100, 100, 100).unwrap();
        assert_eq!(out, src);
    }

    #[test]
    fn crop_keeps_the_vertical_centre() {
        // Portrait 40x80: the kept square spans rows 20..60, so the green band
        // at row 40 lands in the middle of the output.
        let out = crop_and_resample(&marked(40, 80), 40, 40, 40).unwrap();
        let Bitmap::Rgb(img) = out else {
            panic!("expected RGB output");
        };
        assert_eq!(img.get_pixel(5, 20), &Rgb([0, 255, 0]));
        assert_eq!(img.get_pixel(5, 2), &Rgb([255, 0, 0]));
        assert_eq!(img.get_pixel(35, 38), &Rgb([0, 0, 255]));
    }

    #[test]
    fn zero_target_is_invalid() {
        let result = crop_and_resample(&marked(10, 10), 10, 0, 5);
        assert!(matches!(
            result,
            Err(ImagingError::InvalidDimensions { width: 0, height: 5 })
        ));
    }

    #[test]
    fn zero_crop_is_invalid() {
        let result = crop_and_resample(&marked(10, 10), 0, 5, 5);
        assert!(matches!(result, Err(ImagingError::InvalidDimensions { .. })));
    }

    #[test]
    fn empty_source_is_invalid() {
        let empty = Bitmap::Rgb(RgbImage::new(0, 10));
        let result = crop_and_resample(&empty, 5, 5, 5);
        assert!(matches!(result, Err(ImagingError::InvalidDimensions { .. })));
    }
}
