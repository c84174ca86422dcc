//! In-memory rasters in the three colour modes the encoder works with.
//!
//! A [`Bitmap`] is never mutated after construction: crop, resample and
//! palette conversion each return a new value.
//!
//! | Mode | Storage | Resample filter |
//! |---|---|---|
//! | RGB | `image::RgbImage` | Lanczos3 |
//! | RGBA | `image::RgbaImage` | Lanczos3 |
//! | Indexed | [`IndexedImage`] (palette + one index byte per pixel) | nearest-neighbour |
//!
//! Indexed bitmaps resample with nearest-neighbour so the palette survives
//! a downscale unchanged; interpolating indices would produce colours that
//! are not in the palette.

use color_quant::NeuQuant;
use image::imageops::{self, FilterType};
use image::{DynamicImage, RgbImage, RgbaImage};
use serde::Serialize;

/// NeuQuant sampling factor: 1 examines every pixel, 30 is fastest.
const NEUQUANT_SAMPLE_FACTOR: i32 = 10;

/// Colour mode of a [`Bitmap`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    Rgb,
    Rgba,
    Indexed,
}

/// A palette-indexed raster with up to 256 RGBA palette entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedImage {
    width: u32,
    height: u32,
    palette: Vec<[u8; 4]>,
    indices: Vec<u8>,
}

impl IndexedImage {
    /// Build an indexed image. Returns `None` if the index buffer does not
    /// match the dimensions, the palette is empty or larger than 256 entries,
    /// or any index points past the end of the palette.
    pub fn new(width: u32, height: u32, palette: Vec<[u8; 4]>, indices: Vec<u8>) -> Option<Self> {
        let expected = width as usize * height as usize;
        if indices.len() != expected || palette.is_empty() || palette.len() > 256 {
            return None;
        }
        if indices.iter().any(|&i| i as usize >= palette.len()) {
            return None;
        }
        Some(Self {
            width,
            height,
            palette,
            indices,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn palette(&self) -> &[[u8; 4]] {
        &self.palette
    }

    pub fn indices(&self) -> &[u8] {
        &self.indices
    }

    /// True if any palette entry is not fully opaque.
    pub fn has_transparency(&self) -> bool {
        self.palette.iter().any(|c| c[3] < 255)
    }

    /// Expand to a truecolor RGBA buffer.
    pub fn to_rgba8(&self) -> RgbaImage {
        let raw: Vec<u8> = self
            .indices
            .iter()
            .flat_map(|&i| self.palette[i as usize])
            .collect();
        // Length is width * height * 4 by construction.
        RgbaImage::from_raw(self.width, self.height, raw)
            .unwrap_or_else(|| RgbaImage::new(self.width, self.height))
    }

    fn crop(&self, x: u32, y: u32, width: u32, height: u32) -> Self {
        let mut indices = Vec::with_capacity(width as usize * height as usize);
        for row in y..y + height {
            let start = (row * self.width + x) as usize;
            indices.extend_from_slice(&self.indices[start..start + width as usize]);
        }
        Self {
            width,
            height,
            palette: self.palette.clone(),
            indices,
        }
    }

    fn resize_nearest(&self, width: u32, height: u32) -> Self {
        let src_w = self.width as u64;
        let src_h = self.height as u64;
        let mut indices = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height as u64 {
            // Sample at the centre of each destination pixel.
            let sy = ((2 * y + 1) * src_h / (2 * height as u64)).min(src_h - 1);
            for x in 0..width as u64 {
                let sx = ((2 * x + 1) * src_w / (2 * width as u64)).min(src_w - 1);
                indices.push(self.indices[(sy * src_w + sx) as usize]);
            }
        }
        Self {
            width,
            height,
            palette: self.palette.clone(),
            indices,
        }
    }
}

/// A decoded in-memory raster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Bitmap {
    Rgb(RgbImage),
    Rgba(RgbaImage),
    Indexed(IndexedImage),
}

impl From<DynamicImage> for Bitmap {
    /// Sources with an alpha channel become RGBA, everything else RGB.
    fn from(img: DynamicImage) -> Self {
        if img.color().has_alpha() {
            Bitmap::Rgba(img.into_rgba8())
        } else {
            Bitmap::Rgb(img.into_rgb8())
        }
    }
}

impl Bitmap {
    pub fn width(&self) -> u32 {
        match self {
            Bitmap::Rgb(img) => img.width(),
            Bitmap::Rgba(img) => img.width(),
            Bitmap::Indexed(img) => img.width(),
        }
    }

    pub fn height(&self) -> u32 {
        match self {
            Bitmap::Rgb(img) => img.height(),
            Bitmap::Rgba(img) => img.height(),
            Bitmap::Indexed(img) => img.height(),
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width(), self.height())
    }

    pub fn color_mode(&self) -> ColorMode {
        match self {
            Bitmap::Rgb(_) => ColorMode::Rgb,
            Bitmap::Rgba(_) => ColorMode::Rgba,
            Bitmap::Indexed(_) => ColorMode::Indexed,
        }
    }

    pub fn is_indexed(&self) -> bool {
        matches!(self, Bitmap::Indexed(_))
    }

    /// Extract a rectangle. The caller guarantees it lies inside the bitmap.
    pub fn crop(&self, x: u32, y: u32, width: u32, height: u32) -> Bitmap {
        match self {
            Bitmap::Rgb(img) => {
                Bitmap::Rgb(imageops::crop_imm(img, x, y, width, height).to_image())
            }
            Bitmap::Rgba(img) => {
                Bitmap::Rgba(imageops::crop_imm(img, x, y, width, height).to_image())
            }
            Bitmap::Indexed(img) => Bitmap::Indexed(img.crop(x, y, width, height)),
        }
    }

    /// Resample to exactly `width`×`height`, ignoring aspect ratio.
    pub fn resample(&self, width: u32, height: u32) -> Bitmap {
        if self.dimensions() == (width, height) {
            return self.clone();
        }
        match self {
            Bitmap::Rgb(img) => {
                Bitmap::Rgb(imageops::resize(img, width, height, FilterType::Lanczos3))
            }
            Bitmap::Rgba(img) => {
                Bitmap::Rgba(imageops::resize(img, width, height, FilterType::Lanczos3))
            }
            Bitmap::Indexed(img) => Bitmap::Indexed(img.resize_nearest(width, height)),
        }
    }

    /// Flatten to RGB8, dropping alpha. Used for codecs without an alpha channel.
    pub fn to_rgb8(&self) -> RgbImage {
        match self {
            Bitmap::Rgb(img) => img.clone(),
            Bitmap::Rgba(img) => DynamicImage::ImageRgba8(img.clone()).into_rgb8(),
            Bitmap::Indexed(img) => DynamicImage::ImageRgba8(img.to_rgba8()).into_rgb8(),
        }
    }

    /// Convert to an adaptive palette of at most `max_colors` entries.
    ///
    /// Already-indexed bitmaps are returned unchanged.
    pub fn to_palette(&self, max_colors: usize) -> Bitmap {
        match self {
            Bitmap::Indexed(_) => self.clone(),
            Bitmap::Rgb(img) => {
                let rgba = DynamicImage::ImageRgb8(img.clone()).into_rgba8();
                Bitmap::Indexed(quantize(&rgba, max_colors, true))
            }
            Bitmap::Rgba(img) => Bitmap::Indexed(quantize(img, max_colors, false)),
        }
    }
}

/// NeuQuant quantization with nearest-colour mapping (no dithering).
///
/// `opaque` pins every palette alpha to 255 so an RGB source never gains a
/// `tRNS` chunk from the network's alpha drift. Entries no pixel maps to are
/// dropped, so a low-colour image carries a short `PLTE`.
fn quantize(rgba: &RgbaImage, max_colors: usize, opaque: bool) -> IndexedImage {
    let colors = max_colors.clamp(2, 256);
    let nq = NeuQuant::new(NEUQUANT_SAMPLE_FACTOR, colors, rgba.as_raw());

    let network: Vec<[u8; 4]> = nq
        .color_map_rgba()
        .chunks_exact(4)
        .map(|c| [c[0], c[1], c[2], if opaque { 255 } else { c[3] }])
        .collect();
    let indices: Vec<u8> = rgba.pixels().map(|p| nq.index_of(&p.0) as u8).collect();
    let (palette, indices) = compact_palette(&network, indices);

    IndexedImage {
        width: rgba.width(),
        height: rgba.height(),
        palette,
        indices,
    }
}

/// Keep only the palette entries `indices` refers to, in their original
/// order, and renumber the indices to match.
fn compact_palette(palette: &[[u8; 4]], mut indices: Vec<u8>) -> (Vec<[u8; 4]>, Vec<u8>) {
    let mut used = [false; 256];
    for &i in &indices {
        used[i as usize] = true;
    }

    let mut remap = [0u8; 256];
    let mut kept = Vec::new();
    for (old, colour) in palette.iter().enumerate() {
        if used[old] {
            remap[old] = kept.len() as u8;
            kept.push(*colour);
        }
    }
    // An empty raster still needs one entry to be a valid palette image.
    if kept.is_empty() {
        kept.extend(palette.first().copied());
    }

    for i in &mut indices {
        *i = remap[*i as usize];
    }
    (kept, indices)
}
