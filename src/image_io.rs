//! Image container glue.
//!
//! The codec only sees [`PixelBuffer`]s. This module converts between those
//! and image files via the `image` crate, and enforces the one rule the
//! codec cannot: stego images must travel through a lossless format.

use image::{DynamicImage, ImageFormat, ImageOutputFormat, RgbImage, RgbaImage};
use log::{debug, warn};
use std::io::Cursor;
use std::path::Path;

use crate::error::{Result, StegoError};
use crate::pixels::PixelBuffer;

/// Load an image as RGB, or RGBA if the source carries alpha.
pub fn load_pixels(path: impl AsRef<Path>) -> Result<PixelBuffer> {
    let path = path.as_ref();
    let img = image::open(path)?;
    let (width, height) = (img.width(), img.height());
    debug!(
        "loaded {} ({}x{}, {:?})",
        path.display(),
        width,
        height,
        img.color()
    );

    if img.color().has_alpha() {
        PixelBuffer::new(width, height, 4, img.to_rgba8().into_raw())
    } else {
        PixelBuffer::new(width, height, 3, img.to_rgb8().into_raw())
    }
}

/// Wrap a pixel buffer as an `image` crate image.
pub fn to_dynamic_image(pixels: &PixelBuffer) -> Result<DynamicImage> {
    let (w, h) = (pixels.width(), pixels.height());
    let raw = pixels.as_bytes().to_vec();
    let img = match pixels.channels() {
        3 => RgbImage::from_raw(w, h, raw).map(DynamicImage::ImageRgb8),
        4 => RgbaImage::from_raw(w, h, raw).map(DynamicImage::ImageRgba8),
        n => {
            return Err(StegoError::InvalidInput(format!(
                "cannot write a {n}-channel buffer as PNG"
            )))
        }
    };
    img.ok_or_else(|| StegoError::Image("pixel buffer does not match its dimensions".into()))
}

/// Encode a pixel buffer as PNG bytes.
pub fn encode_png(pixels: &PixelBuffer) -> Result<Vec<u8>> {
    let img = to_dynamic_image(pixels)?;
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageOutputFormat::Png)?;
    Ok(out.into_inner())
}

/// Write a pixel buffer to `path` as PNG (atomically).
pub fn save_png(pixels: &PixelBuffer, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    ensure_png_output(path)?;
    let bytes = encode_png(pixels)?;
    crate::secure_fs::write_secure(path, &bytes, false)
}

/// Refuse output paths that would not be written as PNG.
pub fn ensure_png_output(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    match ImageFormat::from_path(path) {
        Ok(ImageFormat::Png) => Ok(()),
        _ => Err(StegoError::InvalidInput(format!(
            "output must be a .png file (lossless), got {}",
            path.display()
        ))),
    }
}

/// Refuse stego inputs stored in a lossy format: re-compression destroys the
/// LSB plane, so decoding them can only fail.
pub fn ensure_lossless_input(path: impl AsRef<Path>) -> Result<ImageFormat> {
    let path = path.as_ref();
    let format = ImageFormat::from_path(path)?;
    match format {
        ImageFormat::Jpeg => Err(StegoError::InvalidInput(format!(
            "{} is a JPEG; lossy formats cannot carry a hidden message",
            path.display()
        ))),
        ImageFormat::WebP => {
            warn!(
                "{} is WebP; only lossless WebP preserves a hidden message",
                path.display()
            );
            Ok(format)
        }
        other => Ok(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn png_extension_required_for_output() {
        ensure_png_output("out.png").unwrap();
        ensure_png_output("OUT.PNG").unwrap();
        assert!(matches!(
            ensure_png_output("out.jpg"),
            Err(StegoError::InvalidInput(_))
        ));
        assert!(matches!(
            ensure_png_output("out"),
            Err(StegoError::InvalidInput(_))
        ));
    }

    #[test]
    fn jpeg_input_rejected() {
        assert!(matches!(
            ensure_lossless_input("photo.jpeg"),
            Err(StegoError::InvalidInput(_))
        ));
        assert_eq!(ensure_lossless_input("scan.bmp").unwrap(), ImageFormat::Bmp);
    }

    #[test]
    fn rgba_buffer_converts() {
        let buf = PixelBuffer::new(2, 1, 4, vec![1, 2, 3, 4, 5, 6, 7, 8]).unwrap();
        let img = to_dynamic_image(&buf).unwrap();
        assert!(img.color().has_alpha());
        assert_eq!(img.to_rgba8().into_raw(), buf.as_bytes());
    }

    #[test]
    fn five_channel_buffer_rejected() {
        let buf = PixelBuffer::new(1, 1, 5, vec![0; 5]).unwrap();
        assert!(matches!(
            to_dynamic_image(&buf),
            Err(StegoError::InvalidInput(_))
        ));
    }
}
