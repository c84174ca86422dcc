//! Pure Rust encoder, no system libraries.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` |
//! | Encode → PNG (RGB / RGBA) | `image::codecs::png::PngEncoder`, adaptive filtering |
//! | Encode → PNG (indexed) | `png::Encoder` with `PLTE` + optional `tRNS` |
//!
//! `image`'s PNG encoder only writes truecolor and grayscale, so palette
//! output goes straight through the `png` crate.

use super::bitmap::{Bitmap, IndexedImage};
use super::codec::{Encoder, ImagingError};
use super::params::{PngCompression, Quality};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType as PngFilter, PngEncoder};
use image::{ExtendedColorType, ImageEncoder};

/// Pure Rust encoder using the `image` and `png` crates.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustEncoder;

impl RustEncoder {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustEncoder {
    fn default() -> Self {
        Self::new()
    }
}

fn image_compression(compression: PngCompression) -> CompressionType {
    match compression {
        PngCompression::Fast => CompressionType::Fast,
        PngCompression::Default => CompressionType::Default,
        PngCompression::Best => CompressionType::Best,
    }
}

fn png_compression(compression: PngCompression) -> png::Compression {
    match compression {
        PngCompression::Fast => png::Compression::Fast,
        PngCompression::Default => png::Compression::Default,
        PngCompression::Best => png::Compression::Best,
    }
}

fn png_failure(e: impl std::fmt::Display) -> ImagingError {
    ImagingError::EncodeFailure(format!("PNG encode failed: {e}"))
}

/// Write an indexed PNG with an 8-bit palette.
///
/// The `tRNS` chunk is trimmed to the last non-opaque entry; the PNG format
/// treats the remaining entries as opaque.
fn encode_indexed_png(
    img: &IndexedImage,
    compression: PngCompression,
) -> Result<Vec<u8>, ImagingError> {
    let rgb_palette: Vec<u8> = img
        .palette()
        .iter()
        .flat_map(|c| [c[0], c[1], c[2]])
        .collect();
    let trns: Option<Vec<u8>> = img
        .palette()
        .iter()
        .rposition(|c| c[3] < 255)
        .map(|last| img.palette()[..=last].iter().map(|c| c[3]).collect());

    let mut buf = Vec::new();
    let mut encoder = png::Encoder::new(&mut buf, img.width(), img.height());
    encoder.set_color(png::ColorType::Indexed);
    encoder.set_depth(png::BitDepth::Eight);
    encoder.set_palette(rgb_palette);
    if let Some(trns) = trns {
        encoder.set_trns(trns);
    }
    encoder.set_compression(png_compression(compression));
    encoder.set_filter(png::FilterType::NoFilter);

    let mut writer = encoder.write_header().map_err(png_failure)?;
    writer.write_image_data(img.indices()).map_err(png_failure)?;
    writer.finish().map_err(png_failure)?;
    Ok(buf)
}

impl Encoder for RustEncoder {
    fn encode_jpeg(&self, bitmap: &Bitmap, quality: Quality) -> Result<Vec<u8>, ImagingError> {
        let flattened;
        let rgb = match bitmap {
            Bitmap::Rgb(img) => img,
            _ => {
                flattened = bitmap.to_rgb8();
                &flattened
            }
        };

        let mut buf = Vec::new();
        JpegEncoder::new_with_quality(&mut buf, quality.as_u8())
            .write_image(rgb.as_raw(), rgb.width(), rgb.height(), ExtendedColorType::Rgb8)
            .map_err(|e| ImagingError::EncodeFailure(format!("JPEG encode failed: {e}")))?;
        Ok(buf)
    }

    fn encode_png(
        &self,
        bitmap: &Bitmap,
        compression: PngCompression,
    ) -> Result<Vec<u8>, ImagingError> {
        let (raw, width, height, color) = match bitmap {
            Bitmap::Indexed(img) => return encode_indexed_png(img, compression),
            Bitmap::Rgb(img) => (img.as_raw(), img.width(), img.height(), ExtendedColorType::Rgb8),
            Bitmap::Rgba(img) => (
                img.as_raw(),
                img.width(),
                img.height(),
                ExtendedColorType::Rgba8,
            ),
        };

        let mut buf = Vec::new();
        PngEncoder::new_with_quality(&mut buf, image_compression(compression), PngFilter::Adaptive)
            .write_image(raw, width, height, color)
            .map_err(png_failure)?;
        Ok(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};

    /// A gradient with some high-frequency texture so JPEG size tracks quality.
    fn textured(width: u32, height: u32) -> Bitmap {
        Bitmap::Rgb(RgbImage::from_fn(width, height, |x, y| {
            Rgb([
                (x % 256) as u8,
                (y % 256) as u8,
                ((x * 7 + y * 13) % 256) as u8,
            ])
        }))
    }

    #[test]
    fn jpeg_decodes_back_to_same_dimensions() {
        let bytes = RustEncoder::new()
            .encode_jpeg(&textured(200, 150), Quality::new(85))
            .unwrap();
        assert_eq!(image::guess_format(&bytes).unwrap(), ImageFormat::Jpeg);
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (200, 150));
    }

    #[test]
    fn jpeg_size_grows_with_quality() {
        let encoder = RustEncoder::new();
        let bmp = textured(160, 120);
        let low = encoder.encode_jpeg(&bmp, Quality::new(20)).unwrap();
        let high = encoder.encode_jpeg(&bmp, Quality::new(95)).unwrap();
        assert!(high.len() > low.len(), "{} <= {}", high.len(), low.len());
    }

    #[test]
    fn jpeg_flattens_rgba() {
        let bmp = Bitmap::Rgba(RgbaImage::from_pixel(32, 16, Rgba([200, 10, 10, 0])));
        let bytes = RustEncoder::new()
            .encode_jpeg(&bmp, Quality::default())
            .unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (32, 16));
    }

    #[test]
    fn jpeg_is_deterministic() {
        let encoder = RustEncoder::new();
        let bmp = textured(64, 48);
        assert_eq!(
            encoder.encode_jpeg(&bmp, Quality::new(70)).unwrap(),
            encoder.encode_jpeg(&bmp, Quality::new(70)).unwrap()
        );
    }

    #[test]
    fn png_truecolor_roundtrips_pixels() {
        let bmp = textured(40, 30);
        let bytes = RustEncoder::new()
            .encode_png(&bmp, PngCompression::Best)
            .unwrap();
        assert_eq!(image::guess_format(&bytes).unwrap(), ImageFormat::Png);
        let decoded = image::load_from_memory(&bytes).unwrap().into_rgb8();
        assert_eq!(Bitmap::Rgb(decoded), bmp);
    }

    #[test]
    fn png_indexed_decodes_to_palette_colours() {
        let img = IndexedImage::new(
            2,
            1,
            vec![[10, 20, 30, 255], [40, 50, 60, 128]],
            vec![0, 1],
        )
        .unwrap();
        let bytes = RustEncoder::new()
            .encode_png(&Bitmap::Indexed(img), PngCompression::Best)
            .unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap().into_rgba8();
        assert_eq!(decoded.get_pixel(0, 0), &Rgba([10, 20, 30, 255]));
        assert_eq!(decoded.get_pixel(1, 0), &Rgba([40, 50, 60, 128]));
    }

    /// Hash-based noise: incompressible as truecolor, at most 256 colours once indexed.
    fn noise(width: u32, height: u32) -> Bitmap {
        Bitmap::Rgb(RgbImage::from_fn(width, height, |x, y| {
            let h = x.wrapping_mul(2_654_435_761) ^ y.wrapping_mul(40_503).rotate_left(16);
            let h = h.wrapping_mul(2_246_822_519);
            Rgb([(h >> 24) as u8, (h >> 16) as u8, (h >> 8) as u8])
        }))
    }

    #[test]
    fn png_palette_of_two_colour_image_is_smaller_than_truecolor() {
        let encoder = RustEncoder::new();
        let bmp = Bitmap::Rgb(RgbImage::from_fn(64, 64, |x, y| {
            let h = x.wrapping_mul(2_654_435_761) ^ y.wrapping_mul(40_503).rotate_left(16);
            if h.wrapping_mul(2_246_822_519) >> 31 == 0 {
                Rgb([230, 40, 40])
            } else {
                Rgb([30, 30, 200])
            }
        }));
        let indexed_bmp = bmp.to_palette(256);
        let Bitmap::Indexed(img) = &indexed_bmp else {
            panic!("expected indexed output");
        };
        assert!(img.palette().len() <= 2);

        let truecolor = encoder.encode_png(&bmp, PngCompression::Best).unwrap();
        let indexed = encoder
            .encode_png(&indexed_bmp, PngCompression::Best)
            .unwrap();
        assert!(
            indexed.len() < truecolor.len(),
            "indexed={} truecolor={}",
            indexed.len(),
            truecolor.len()
        );
    }

    #[test]
    fn png_palette_is_smaller_than_truecolor_for_noisy_images() {
        let encoder = RustEncoder::new();
        let bmp = noise(128, 128);
        let truecolor = encoder.encode_png(&bmp, PngCompression::Best).unwrap();
        let indexed = encoder
            .encode_png(&bmp.to_palette(256), PngCompression::Best)
            .unwrap();
        assert!(indexed.len() < truecolor.len());
    }
}
