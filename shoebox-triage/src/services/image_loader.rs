//! Image normalization for the inference service
//!
//! The service bounds input dimensions, so anything over 2048 on the long
//! edge is downscaled preserving aspect ratio with a Lanczos filter, and
//! every source encoding (grayscale, paletted, alpha) is converted to
//! 8-bit RGB before JPEG re-encoding for transport.

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::DynamicImage;
use std::path::Path;
use thiserror::Error;

/// Longest edge accepted by the inference service
pub const MAX_DIMENSION: u32 = 2048;

/// JPEG quality for the transport encoding
const JPEG_QUALITY: u8 = 85;

/// Image preparation errors
#[derive(Debug, Error)]
pub enum ImageLoadError {
    /// File unreadable, corrupt, or in an unsupported format
    #[error("Failed to decode {path}: {source}")]
    Decode {
        path: String,
        source: image::ImageError,
    },

    /// Normalized image could not be re-encoded for transport
    #[error("Failed to encode image for transport: {0}")]
    Encode(image::ImageError),
}

/// Normalized image ready for submission
pub struct PreparedImage {
    /// JPEG-encoded bytes
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl PreparedImage {
    pub const MIME_TYPE: &'static str = "image/jpeg";
}

/// Decode, bound, and re-encode one image file
pub fn prepare_image(path: &Path) -> Result<PreparedImage, ImageLoadError> {
    let img = image::open(path).map_err(|source| ImageLoadError::Decode {
        path: path.display().to_string(),
        source,
    })?;

    let img = bound_dimensions(img);
    let rgb = img.to_rgb8();
    let (width, height) = rgb.dimensions();

    let mut data = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut data, JPEG_QUALITY);
    rgb.write_with_encoder(encoder)
        .map_err(ImageLoadError::Encode)?;

    tracing::debug!(
        path = %path.display(),
        width,
        height,
        bytes = data.len(),
        "Prepared image for submission"
    );

    Ok(PreparedImage { data, width, height })
}

fn bound_dimensions(img: DynamicImage) -> DynamicImage {
    if img.width().max(img.height()) <= MAX_DIMENSION {
        return img;
    }
    // resize() preserves aspect ratio within the given bounds
    img.resize(MAX_DIMENSION, MAX_DIMENSION, FilterType::Lanczos3)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Luma, Rgb};
    use std::fs;

    #[test]
    fn test_small_image_keeps_dimensions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("small.png");
        let img = ImageBuffer::from_pixel(120, 80, Rgb::<u8>([200, 30, 30]));
        img.save(&path).unwrap();

        let prepared = prepare_image(&path).unwrap();
        assert_eq!((prepared.width, prepared.height), (120, 80));
        assert!(!prepared.data.is_empty());
    }

    #[test]
    fn test_oversized_image_is_bounded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wide.png");
        let img = ImageBuffer::from_pixel(3000, 1000, Rgb::<u8>([10, 10, 10]));
        img.save(&path).unwrap();

        let prepared = prepare_image(&path).unwrap();
        assert_eq!(prepared.width.max(prepared.height), MAX_DIMENSION);
        // Aspect ratio survives the downscale (3:1, within rounding)
        let ratio = prepared.width as f64 / prepared.height as f64;
        assert!((ratio - 3.0).abs() < 0.02, "ratio was {}", ratio);
    }

    #[test]
    fn test_grayscale_source_is_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gray.png");
        let img = ImageBuffer::from_pixel(50, 50, Luma::<u8>([128]));
        img.save(&path).unwrap();

        // RGB conversion happens internally; JPEG output decodes as color
        let prepared = prepare_image(&path).unwrap();
        let decoded = image::load_from_memory(&prepared.data).unwrap();
        assert_eq!(decoded.width(), 50);
    }

    #[test]
    fn test_corrupt_file_is_a_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.jpg");
        fs::write(&path, b"definitely not a jpeg").unwrap();

        let result = prepare_image(&path);
        assert!(matches!(result, Err(ImageLoadError::Decode { .. })));
    }

    #[test]
    fn test_missing_file_is_a_decode_error() {
        let result = prepare_image(Path::new("/nonexistent/photo.jpg"));
        assert!(matches!(result, Err(ImageLoadError::Decode { .. })));
    }
}
