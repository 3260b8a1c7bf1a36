//! Image decoding.
//!
//! Accepts raw image bytes (PNG, JPEG, BMP, WebP) and produces the packed
//! RGB raster the tracer samples. Alpha is dropped; every distinct RGB
//! triple is its own colour.

use crate::raster::Raster;
use crate::types::TraceError;

/// Decode raw image bytes into an RGB raster.
///
/// # Errors
///
/// Returns [`TraceError::EmptyInput`] if `bytes` is empty.
/// Returns [`TraceError::ImageDecode`] if the image format is
/// unrecognized or the data is corrupt.
pub fn decode_rgb(bytes: &[u8]) -> Result<Raster, TraceError> {
    if bytes.is_empty() {
        return Err(TraceError::EmptyInput);
    }

    let img = image::load_from_memory(bytes)?;
    Raster::from_image(img.to_rgb8())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::Color;

    /// Encode an RGBA image as PNG bytes.
    fn encode_png(img: &image::RgbaImage) -> Vec<u8> {
        let mut buf = Vec::new();
        let encoder = image::codecs::png::PngEncoder::new(&mut buf);
        image::ImageEncoder::write_image(
            encoder,
            img.as_raw(),
            img.width(),
            img.height(),
            image::ExtendedColorType::Rgba8,
        )
        .ok();
        buf
    }

    #[test]
    fn empty_input_returns_error() {
        assert!(matches!(decode_rgb(&[]), Err(TraceError::EmptyInput)));
    }

    #[test]
    fn corrupt_bytes_returns_image_decode_error() {
        let result = decode_rgb(&[0xFF, 0xFE, 0x00, 0x01]);
        assert!(matches!(result, Err(TraceError::ImageDecode(_))));
    }

    #[test]
    fn png_decodes_to_packed_colors() {
        let img = image::RgbaImage::from_fn(3, 2, |x, _| {
            if x == 0 {
                image::Rgba([255, 0, 0, 255])
            } else {
                image::Rgba([0, 128, 255, 255])
            }
        });
        let raster = decode_rgb(&encode_png(&img)).unwrap();
        assert_eq!(raster.width(), 3);
        assert_eq!(raster.height(), 2);
        assert_eq!(raster.color(0, 1), Color::from_rgb(255, 0, 0));
        assert_eq!(raster.color(2, 0), Color::from_rgb(0, 128, 255));
    }

    #[test]
    fn alpha_does_not_split_colours() {
        let img = image::RgbaImage::from_fn(2, 1, |x, _| {
            image::Rgba([10, 20, 30, if x == 0 { 255 } else { 40 }])
        });
        let raster = decode_rgb(&encode_png(&img)).unwrap();
        assert_eq!(raster.color(0, 0), raster.color(1, 0));
    }
}
