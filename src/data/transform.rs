// ============================================================
// Layer 4: Image Transform
// ============================================================
// Raw object bytes → fixed-size normalised RGB matrix.
//
// Steps (same for every output format and for prediction):
//   1. Decode whatever format the bytes are in (JPEG, PNG, ...)
//   2. Convert to 8-bit RGB, dropping alpha / expanding greyscale
//   3. Resize to exactly size × size with a bicubic filter
//      (aspect ratio is NOT preserved)
//   4. Divide every channel by 255 → f32 in [0, 1]
//
// The matrix layout is (height, width, channel), row-major,
// which is the same order the RGB8 buffer is stored in.

use anyhow::{ensure, Context, Result};
use image::{imageops::FilterType, RgbImage};
use ndarray::Array3;

pub const DEFAULT_IMAGE_SIZE: u32 = 224;

/// Output of the transform: the resized image (for formats that
/// re-encode it) and its normalised matrix.
#[derive(Debug, Clone)]
pub struct TransformedImage {
    pub resized: RgbImage,
    pub matrix:  Array3<f32>,
}

impl TransformedImage {
    /// Pixels flattened in (h, w, c) order.
    pub fn flat_pixels(&self) -> &[f32] {
        // The matrix is always built in standard layout
        self.matrix.as_slice().unwrap_or(&[])
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ImageTransform {
    size:   u32,
    filter: FilterType,
}

impl ImageTransform {
    pub fn new(size: u32) -> Self {
        Self { size, filter: FilterType::CatmullRom }
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    /// Decode, resize and normalise one encoded image.
    pub fn apply(&self, bytes: &[u8]) -> Result<TransformedImage> {
        ensure!(self.size > 0, "Image size must be positive");

        let decoded = image::load_from_memory(bytes).context("Cannot decode image bytes")?;
        let rgb     = decoded.to_rgb8();
        let resized = image::imageops::resize(&rgb, self.size, self.size, self.filter);

        let side   = self.size as usize;
        let values = resized.as_raw().iter().map(|&v| f32::from(v) / 255.0).collect();
        let matrix = Array3::from_shape_vec((side, side, 3), values)
            .context("Resized buffer does not match the requested shape")?;

        Ok(TransformedImage { resized, matrix })
    }
}

impl Default for ImageTransform {
    fn default() -> Self {
        Self::new(DEFAULT_IMAGE_SIZE)
    }
}

// ─── Test helpers ─────────────────────────────────────────────────────────────
/// Encode a synthetic gradient image, used by tests across the crate.
#[cfg(test)]
pub fn encoded_test_image(width: u32, height: u32, format: image::ImageFormat) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x * 7 % 256) as u8, (y * 11 % 256) as u8, ((x + y) % 256) as u8])
    });
    let mut buf = std::io::Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut buf, format)
        .expect("encoding an in-memory test image");
    buf.into_inner()
}
