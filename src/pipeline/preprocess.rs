//! Preprocessing variants fed to the detector by the decode cascade.
//!
//! Each function is pure (`&image → new image`) and deterministic, so the
//! cascade steps stay independent of each other:
//!
//! - [`to_grayscale`]: BT.601 luma, `Y = 0.299 R + 0.587 G + 0.114 B`
//! - [`gaussian_blur_5x5`]: separable `[1 4 6 4 1] / 16` kernel, which is the
//!   Gaussian a 5-tap window gets when sigma is derived from the kernel size
//! - [`otsu_binarize`]: global threshold picked by Otsu's method, binary output

use image::{GrayImage, Luma, RgbImage};
use imageproc::contrast::{otsu_level, threshold, ThresholdType};

// Fixed-point BT.601 weights scaled by 2^14; they sum to exactly 1 << 14.
const LUMA_R: u32 = 4899;
const LUMA_G: u32 = 9617;
const LUMA_B: u32 = 1868;
const LUMA_SHIFT: u32 = 14;

const BLUR_KERNEL: [u32; 5] = [1, 4, 6, 4, 1];

/// Convert an RGB buffer to 8-bit luma.
pub fn to_grayscale(rgb: &RgbImage) -> GrayImage {
    GrayImage::from_fn(rgb.width(), rgb.height(), |x, y| {
        let [r, g, b] = rgb.get_pixel(x, y).0;
        Luma([luma(r, g, b)])
    })
}

/// BT.601 luma of one pixel, rounded to nearest.
#[inline]
pub fn luma(r: u8, g: u8, b: u8) -> u8 {
    let y = LUMA_R * r as u32 + LUMA_G * g as u32 + LUMA_B * b as u32;
    ((y + (1 << (LUMA_SHIFT - 1))) >> LUMA_SHIFT) as u8
}

/// Blur with a 5×5 Gaussian kernel.
///
/// Borders are handled by reflecting around the edge pixel without repeating
/// it (`dcb|abcd|cba`). Images narrower than three pixels fall back to edge
/// clamping where reflection would step outside the image.
pub fn gaussian_blur_5x5(gray: &GrayImage) -> GrayImage {
    let (w, h) = (gray.width() as usize, gray.height() as usize);
    if w == 0 || h == 0 {
        return gray.clone();
    }
    let src = gray.as_raw();

    // Horizontal pass keeps the un-normalised sums (max 255 * 16).
    let mut horiz = vec![0u32; w * h];
    for y in 0..h {
        let row = &src[y * w..(y + 1) * w];
        for x in 0..w {
            let mut sum = 0u32;
            for (k, weight) in BLUR_KERNEL.iter().enumerate() {
                let sx = reflect_101(x as isize + k as isize - 2, w);
                sum += weight * row[sx] as u32;
            }
            horiz[y * w + x] = sum;
        }
    }

    // Vertical pass; total weight is 16 * 16 = 256.
    let mut out = vec![0u8; w * h];
    for y in 0..h {
        for x in 0..w {
            let mut sum = 0u32;
            for (k, weight) in BLUR_KERNEL.iter().enumerate() {
                let sy = reflect_101(y as isize + k as isize - 2, h);
                sum += weight * horiz[sy * w + x];
            }
            out[y * w + x] = ((sum + 128) >> 8) as u8;
        }
    }

    GrayImage::from_raw(gray.width(), gray.height(), out).unwrap_or_else(|| gray.clone())
}

/// Map an out-of-range index back into `0..len` using reflect-101.
fn reflect_101(i: isize, len: usize) -> usize {
    let last = len as isize - 1;
    if last == 0 {
        return 0;
    }
    let mut i = i;
    while i < 0 || i > last {
        if i < 0 {
            i = -i;
        }
        if i > last {
            i = 2 * last - i;
        }
    }
    i as usize
}

/// Binarise with Otsu's threshold: pixels above it become 255, the rest 0.
pub fn otsu_binarize(gray: &GrayImage) -> GrayImage {
    threshold(gray, otsu_level(gray), ThresholdType::Binary)
}

/// True if every pixel is either 0 or 255.
pub fn is_binary(gray: &GrayImage) -> bool {
    gray.pixels().all(|p| p.0[0] == 0 || p.0[0] == 255)
}
