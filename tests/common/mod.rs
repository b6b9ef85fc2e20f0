//! Fixture helpers shared by the integration tests.

#![allow(dead_code)]

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{GrayImage, Luma, Rgb, RgbImage};
use qrcode::{Color, QrCode};
use std::path::{Path, PathBuf};

/// Pixels per QR module.
pub const SCALE: u32 = 8;
/// Quiet-zone width in modules.
pub const QUIET: u32 = 4;

/// Render `payload` as a QR symbol with the given module intensities.
pub fn render_qr(payload: &str, dark: u8, light: u8) -> GrayImage {
    let code = QrCode::new(payload.as_bytes()).expect("payload fits in a QR code");
    let modules = code.width() as u32;
    let colors = code.to_colors();
    let size = (modules + 2 * QUIET) * SCALE;

    GrayImage::from_fn(size, size, |x, y| {
        let (mx, my) = (x / SCALE, y / SCALE);
        let inside = (QUIET..QUIET + modules).contains(&mx) && (QUIET..QUIET + modules).contains(&my);
        let is_dark = inside
            && colors[((my - QUIET) * modules + (mx - QUIET)) as usize] == Color::Dark;
        Luma([if is_dark { dark } else { light }])
    })
}

/// Black-on-white QR symbol.
pub fn qr_image(payload: &str) -> GrayImage {
    render_qr(payload, 0, 255)
}

/// Same symbol as an RGB image: dark modules navy, light modules cream.
pub fn qr_image_rgb(payload: &str) -> RgbImage {
    let gray = qr_image(payload);
    RgbImage::from_fn(gray.width(), gray.height(), |x, y| {
        if gray.get_pixel(x, y).0[0] == 0 {
            Rgb([10, 20, 90])
        } else {
            Rgb([250, 245, 225])
        }
    })
}

/// Two symbols side by side on one canvas.
pub fn two_qr_image(left: &str, right: &str) -> GrayImage {
    let a = qr_image(left);
    let b = qr_image(right);
    let mut canvas = GrayImage::from_pixel(a.width() + b.width(), a.height().max(b.height()), Luma([255]));
    image::imageops::replace(&mut canvas, &a, 0, 0);
    image::imageops::replace(&mut canvas, &b, a.width() as i64, 0);
    canvas
}

/// A textured image that contains no QR code.
pub fn noise_image() -> RgbImage {
    RgbImage::from_fn(160, 120, |x, y| {
        let v = ((x * 7 + y * 13) % 97) as u8;
        Rgb([v.wrapping_mul(2), 120, 255 - v])
    })
}

pub fn save(dir: &Path, name: &str, img: &GrayImage) -> PathBuf {
    let path = dir.join(name);
    img.save(&path).expect("write fixture");
    path
}

pub fn file_base64(path: &Path) -> String {
    STANDARD.encode(std::fs::read(path).expect("read fixture"))
}
