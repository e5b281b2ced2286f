//! # Image Rasterization
//!
//! Thermal printers only print black dots. Encoded images (PNG, JPEG, BMP,
//! ...) are decoded, scaled to fit the paper, flattened onto white and
//! converted to 1-bit using Bayer 8×8 ordered dithering.
//!
//! ## Ordered Dithering
//!
//! Each pixel's darkness is compared against a position-dependent threshold
//! from a repeating 8×8 matrix:
//!
//! ```text
//! threshold = (BAYER8[y mod 8][x mod 8] + 0.5) / 64
//! print dot = darkness > threshold
//! ```
//!
//! Flat areas come out as a regular halftone screen instead of the noise an
//! error-diffusion ditherer produces, which survives cheap print heads better.

use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView};
use rayon::prelude::*;

use crate::error::BlueposError;

/// 8×8 Bayer threshold matrix (values 0–63).
pub const BAYER8: [[u8; 8]; 8] = [
    [0, 32, 8, 40, 2, 34, 10, 42],
    [48, 16, 56, 24, 50, 18, 58, 26],
    [12, 44, 4, 36, 14, 46, 6, 38],
    [60, 28, 52, 20, 62, 30, 54, 22],
    [3, 35, 11, 43, 1, 33, 9, 41],
    [51, 19, 59, 27, 49, 17, 57, 25],
    [15, 47, 7, 39, 13, 45, 5, 37],
    [63, 31, 55, 23, 61, 29, 53, 21],
];

/// A packed 1-bit image ready for `GS v 0`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raster {
    pub width: u16,
    pub height: u16,
    /// `ceil(width / 8) * height` bytes, MSB = leftmost pixel.
    pub data: Vec<u8>,
}

/// Dithering threshold for a pixel position, in (0, 1).
#[inline]
pub fn threshold(x: usize, y: usize) -> f32 {
    let matrix_value = BAYER8[y & 7][x & 7];
    (matrix_value as f32 + 0.5) / 64.0
}

/// `intensity`: 0.0 = white, 1.0 = black.
#[inline]
pub fn should_print(x: usize, y: usize, intensity: f32) -> bool {
    intensity > threshold(x, y)
}

/// Pack a row of pixels (true = black) into bytes, MSB first, zero padded.
///
/// ```
/// use bluepos::render::dither::pack_row;
///
/// assert_eq!(pack_row(&[true, true, true, true, false, false, false, false]), vec![0xF0]);
/// assert_eq!(pack_row(&[true; 12]), vec![0xFF, 0xF0]);
/// ```
pub fn pack_row(pixels: &[bool]) -> Vec<u8> {
    let mut bytes = vec![0u8; pixels.len().div_ceil(8)];
    for (i, &pixel) in pixels.iter().enumerate() {
        if pixel {
            bytes[i / 8] |= 1 << (7 - (i % 8));
        }
    }
    bytes
}

/// Dither an intensity field into packed rows. Rows are computed in parallel.
pub fn generate_raster<F>(width: usize, height: usize, intensity_fn: F) -> Vec<u8>
where
    F: Fn(usize, usize) -> f32 + Sync,
{
    let rows: Vec<Vec<u8>> = (0..height)
        .into_par_iter()
        .map(|y| {
            let pixels: Vec<bool> = (0..width)
                .map(|x| should_print(x, y, intensity_fn(x, y)))
                .collect();
            pack_row(&pixels)
        })
        .collect();
    rows.concat()
}

/// Decode `encoded` and produce a raster no wider than `max_width` dots.
///
/// Transparent pixels are treated as paper (white).
pub fn rasterize(encoded: &[u8], max_width: u16) -> Result<Raster, BlueposError> {
    let img = image::load_from_memory(encoded)
        .map_err(|e| BlueposError::Image(format!("cannot decode image: {}", e)))?;
    let img = fit_width(img, max_width as u32);

    let (width, height) = img.dimensions();
    let height = u16::try_from(height).map_err(|_| {
        BlueposError::Image(format!("image is {} rows tall after scaling", height))
    })?;
    // fit_width guarantees width <= max_width
    let width = width as u16;

    let rgba = img.to_rgba8();
    let data = generate_raster(width as usize, height as usize, |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x as u32, y as u32).0;
        let luma = (0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32) / 255.0;
        let alpha = a as f32 / 255.0;
        (1.0 - luma) * alpha
    });

    Ok(Raster {
        width,
        height,
        data,
    })
}

fn fit_width(img: DynamicImage, max_width: u32) -> DynamicImage {
    let (width, height) = img.dimensions();
    if width <= max_width {
        return img;
    }
    let scaled_height = ((height as u64 * max_width as u64) / width as u64).max(1) as u32;
    img.resize_exact(max_width, scaled_height, FilterType::Triangle)
}

// ============================================================================
// TESTS
// ============================================================================
