//! Raster image conversion: decode to a pixel buffer, re-encode to the target.
//!
//! The pixel buffer passes through untouched, with one exception: JPEG has
//! no alpha channel, so JPEG output is encoded from the RGB planes only. No
//! scaling, cropping or colour-space conversion happens anywhere else.

use crate::error::ConvertError;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat, ImageReader};
use std::io::Cursor;
use tracing::debug;

/// Encoding quality for JPEG output. Fixed; not user-configurable.
pub const JPEG_QUALITY: u8 = 90;

/// Map a target format identifier to its container. `jpg` is an alias of JPEG.
pub fn raster_format(target_format: &str) -> Option<ImageFormat> {
    match target_format.to_ascii_lowercase().as_str() {
        "png" => Some(ImageFormat::Png),
        "jpg" | "jpeg" => Some(ImageFormat::Jpeg),
        "webp" => Some(ImageFormat::WebP),
        "gif" => Some(ImageFormat::Gif),
        "bmp" => Some(ImageFormat::Bmp),
        _ => None,
    }
}

/// Re-encode raster image bytes into `target_format`.
///
/// # Errors
/// * [`ConvertError::Decode`] when the bytes are not a decodable image.
/// * [`ConvertError::Encode`] when the target is not a raster format (e.g.
///   `csv`) or its encoder rejects the pixel buffer.
pub fn convert_image(
    bytes: &[u8],
    source_media_type: &str,
    target_format: &str,
) -> Result<Vec<u8>, ConvertError> {
    let format = raster_format(target_format).ok_or_else(|| ConvertError::Encode {
        format: target_format.to_string(),
        detail: "not a raster image format".into(),
    })?;

    let img = decode(bytes, source_media_type)?;
    debug!(
        "Decoded {} → {}x{} {:?}",
        source_media_type,
        img.width(),
        img.height(),
        img.color()
    );

    let out = encode(&img, format).map_err(|e| ConvertError::Encode {
        format: target_format.to_string(),
        detail: e.to_string(),
    })?;
    debug!("Encoded {} → {} bytes", target_format, out.len());
    Ok(out)
}

/// Decode by content sniffing, falling back to the declared media type.
fn decode(bytes: &[u8], source_media_type: &str) -> Result<DynamicImage, ConvertError> {
    let mut reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| ConvertError::Decode {
            detail: e.to_string(),
        })?;

    if reader.format().is_none() {
        if let Some(declared) = ImageFormat::from_mime_type(source_media_type) {
            reader.set_format(declared);
        }
    }

    reader.decode().map_err(|e| ConvertError::Decode {
        detail: e.to_string(),
    })
}

fn encode(img: &DynamicImage, format: ImageFormat) -> Result<Vec<u8>, image::ImageError> {
    let mut buf = Vec::new();
    match format {
        ImageFormat::Jpeg => {
            let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
            let encoder = JpegEncoder::new_with_quality(&mut buf, JPEG_QUALITY);
            rgb.write_with_encoder(encoder)?;
        }
        // The GIF encoder only takes 8-bit RGB(A) buffers.
        ImageFormat::Gif => {
            DynamicImage::ImageRgba8(img.to_rgba8())
                .write_to(&mut Cursor::new(&mut buf), ImageFormat::Gif)?;
        }
        other => img.write_to(&mut Cursor::new(&mut buf), other)?,
    }
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Luma, Rgb, Rgba, RgbaImage};

    fn png_bytes(img: &DynamicImage) -> Vec<u8> {
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .expect("png encode");
        buf
    }

    fn checkerboard(w: u32, h: u32) -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_fn(w, h, |x, y| {
            if (x + y) % 2 == 0 {
                Rgba([255, 0, 0, 255])
            } else {
                Rgba([0, 0, 255, 128])
            }
        }))
    }

    #[test]
    fn every_target_preserves_dimensions() {
        let src = png_bytes(&checkerboard(13, 7));
        for target in ["jpg", "webp", "gif", "bmp", "png"] {
            let out = convert_image(&src, "image/png", target)
                .unwrap_or_else(|e| panic!("{target}: {e}"));
            let decoded = image::load_from_memory(&out).expect("output decodes");
            assert_eq!((decoded.width(), decoded.height()), (13, 7), "{target}");
            assert_eq!(
                image::guess_format(&out).unwrap(),
                raster_format(target).unwrap(),
                "{target}"
            );
        }
    }

    #[test]
    fn jpeg_output_drops_alpha() {
        let src = png_bytes(&checkerboard(4, 4));
        let out = convert_image(&src, "image/png", "jpg").unwrap();
        assert_eq!(&out[..2], &[0xFF, 0xD8]);
        let decoded = image::load_from_memory(&out).unwrap();
        assert!(!decoded.color().has_alpha());
    }

    #[test]
    fn lossless_target_keeps_pixels() {
        let opaque = DynamicImage::ImageRgb8(ImageBuffer::from_fn(5, 5, |x, y| {
            Rgb([(x * 40) as u8, (y * 40) as u8, 200])
        }));
        let src = png_bytes(&opaque);
        let out = convert_image(&src, "image/png", "bmp").unwrap();
        let decoded = image::load_from_memory(&out).unwrap().to_rgb8();
        assert_eq!(decoded, opaque.to_rgb8());
    }

    #[test]
    fn corrupt_bytes_fail_to_decode() {
        let err = convert_image(b"definitely not an image", "image/png", "jpg").unwrap_err();
        assert!(matches!(err, ConvertError::Decode { .. }), "got: {err:?}");

        let mut truncated = png_bytes(&checkerboard(8, 8));
        truncated.truncate(40);
        let err = convert_image(&truncated, "image/png", "bmp").unwrap_err();
        assert!(matches!(err, ConvertError::Decode { .. }), "got: {err:?}");
    }

    #[test]
    fn non_raster_target_fails_to_encode() {
        let src = png_bytes(&checkerboard(2, 2));
        let err = convert_image(&src, "image/png", "csv").unwrap_err();
        assert!(matches!(err, ConvertError::Encode { .. }), "got: {err:?}");
    }

    #[test]
    fn grey_and_deep_sources_reach_every_target() {
        let grey = DynamicImage::ImageLuma8(ImageBuffer::from_fn(6, 4, |x, y| {
            Luma([(x * 30 + y * 10) as u8])
        }));
        let deep = DynamicImage::ImageRgba16(ImageBuffer::from_pixel(
            6,
            4,
            Rgba([40_000u16, 1_000, 65_535, 30_000]),
        ));
        for (label, img) in [("luma8", grey), ("rgba16", deep)] {
            let src = png_bytes(&img);
            for target in ["jpg", "webp", "gif", "bmp"] {
                let out = convert_image(&src, "image/png", target)
                    .unwrap_or_else(|e| panic!("{label} → {target}: {e}"));
                let decoded = image::load_from_memory(&out).expect("output decodes");
                assert_eq!((decoded.width(), decoded.height()), (6, 4), "{label} → {target}");
            }
        }
    }

    #[test]
    fn grey_jpeg_into_gif() {
        let grey = DynamicImage::ImageLuma8(ImageBuffer::from_pixel(5, 3, Luma([90u8])));
        let mut jpeg = Vec::new();
        grey.write_to(&mut Cursor::new(&mut jpeg), ImageFormat::Jpeg).expect("jpeg encode");
        let out = convert_image(&jpeg, "image/jpeg", "gif").unwrap();
        let decoded = image::load_from_memory(&out).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (5, 3));
    }

    #[test]
    fn raster_format_aliases() {
        assert_eq!(raster_format("jpg"), Some(ImageFormat::Jpeg));
        assert_eq!(raster_format("JPEG"), Some(ImageFormat::Jpeg));
        assert_eq!(raster_format("txt"), None);
    }
}
