use crate::error::Result;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::metadata::Orientation;
use image::{DynamicImage, ImageDecoder, ImageReader};
use std::io::Cursor;

/// Decodes an uploaded payload and re-encodes it to the normalized form:
/// stored orientation applied, resized to fit within `max_dimension` square
/// (never upscaled), JPEG at the given quality.
///
/// CPU-bound; callers on the async runtime should run this on the blocking
/// pool. Any decode/encode failure surfaces as `ImageProcessing` and leaves
/// no partial output anywhere.
pub fn normalize(raw: &[u8], max_dimension: u32, quality: u8) -> Result<Vec<u8>> {
    let reader = ImageReader::new(Cursor::new(raw)).with_guessed_format()?;
    let mut decoder = reader.into_decoder()?;
    let orientation = decoder
        .orientation()
        .unwrap_or(Orientation::NoTransforms);

    let mut img = DynamicImage::from_decoder(decoder)?;
    img.apply_orientation(orientation);

    if img.width() > max_dimension || img.height() > max_dimension {
        img = img.resize(max_dimension, max_dimension, FilterType::Lanczos3);
    }

    // JPEG has no alpha channel
    let rgb = img.to_rgb8();
    let mut out = Vec::new();
    rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut out, quality))?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CatalogError;
    use image::RgbImage;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_pixel(width, height, image::Rgb([120, 30, 200]));
        let mut out = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img)
            .write_to(&mut out, image::ImageFormat::Png)
            .unwrap();
        out.into_inner()
    }

    fn dimensions(jpeg: &[u8]) -> (u32, u32) {
        let img = image::load_from_memory(jpeg).unwrap();
        (img.width(), img.height())
    }

    #[test]
    fn oversized_images_fit_the_bounding_box() {
        let out = normalize(&png_bytes(3000, 1500), 1200, 82).unwrap();
        assert_eq!(dimensions(&out), (1200, 600));
    }

    #[test]
    fn small_images_are_never_upscaled() {
        let out = normalize(&png_bytes(400, 300), 1200, 82).unwrap();
        assert_eq!(dimensions(&out), (400, 300));
    }

    #[test]
    fn garbage_input_is_an_image_processing_error() {
        let err = normalize(b"definitely not an image", 1200, 82).unwrap_err();
        assert!(matches!(
            err,
            CatalogError::ImageProcessing(_) | CatalogError::Io(_)
        ));
    }
}
