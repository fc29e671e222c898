use std::io::Cursor;

use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageReader, Limits};
use thiserror::Error;
use tracing::{debug, warn};

use crate::error::{AppError, ErrorKind};
use crate::{
    MAX_IMAGE_ALLOC, MAX_IMAGE_BYTES, MAX_IMAGE_DIMENSION, MAX_UPLOAD_DIMENSION,
    UPLOAD_WEBP_QUALITY,
};

pub const WEBP_MIME_TYPE: &str = "image/webp";

#[derive(Debug, Error)]
pub enum ImageProcessingError {
    #[error("failed to decode image: {source}")]
    Decode {
        #[from]
        source: image::ImageError,
    },

    #[error("webp encoding failed: width={width}, height={height}, reason={reason}")]
    WebpEncode {
        width: u32,
        height: u32,
        reason: String,
    },

    #[error("input too large: {size} bytes, max {max_size}")]
    InputTooLarge { size: usize, max_size: usize },

    #[error("input bytes empty")]
    EmptyInput,

    #[error("unsupported image format")]
    UnsupportedFormat,
}

impl From<ImageProcessingError> for AppError {
    fn from(e: ImageProcessingError) -> Self {
        let kind = match &e {
            ImageProcessingError::InputTooLarge { .. } => ErrorKind::ImageTooLarge,
            ImageProcessingError::Decode {
                source: image::ImageError::Limits(_),
            } => ErrorKind::ImageTooLarge,
            ImageProcessingError::UnsupportedFormat
            | ImageProcessingError::Decode {
                source: image::ImageError::Unsupported(_),
            } => ErrorKind::ImageFormatUnsupported,
            ImageProcessingError::EmptyInput
            | ImageProcessingError::Decode { .. }
            | ImageProcessingError::WebpEncode { .. } => ErrorKind::ImageProcessing,
        };
        AppError::new(kind, "Image could not be prepared for upload").with_internal(e.to_string())
    }
}

#[derive(Clone, Debug)]
pub struct ProcessingConfig {
    pub max_input_bytes: usize,
    pub max_dimension: u32,
    pub max_alloc_bytes: u64,
    pub output_max_edge: u32,
    /// Lossy WebP quality, 1 to 100.
    pub webp_quality: u8,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            max_input_bytes: MAX_IMAGE_BYTES,
            max_dimension: MAX_IMAGE_DIMENSION,
            max_alloc_bytes: MAX_IMAGE_ALLOC,
            output_max_edge: MAX_UPLOAD_DIMENSION,
            webp_quality: UPLOAD_WEBP_QUALITY,
        }
    }
}

/// An image ready to be sent as the `file` part of the upload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PreparedImage {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub mime_type: &'static str,
}

/// Decodes whatever the picker returned and re-encodes it as lossy WebP,
/// shrinking it first if either edge exceeds `output_max_edge`.
pub fn prepare_for_upload(
    raw_bytes: &[u8],
    config: &ProcessingConfig,
) -> Result<PreparedImage, ImageProcessingError> {
    let img = decode_image(config, raw_bytes)?;
    let (w, h) = img.dimensions();

    let img = if w > config.output_max_edge || h > config.output_max_edge {
        debug!(width = w, height = h, max = config.output_max_edge, "downscaling image");
        img.resize(
            config.output_max_edge,
            config.output_max_edge,
            FilterType::Triangle,
        )
    } else {
        img
    };

    let (width, height) = img.dimensions();
    let data = encode_webp(&img, config.webp_quality)?;
    debug!(
        input_bytes = raw_bytes.len(),
        output_bytes = data.len(),
        width,
        height,
        "image prepared"
    );

    Ok(PreparedImage {
        data,
        width,
        height,
        mime_type: WEBP_MIME_TYPE,
    })
}

fn decode_image(
    config: &ProcessingConfig,
    raw_bytes: &[u8],
) -> Result<DynamicImage, ImageProcessingError> {
    if raw_bytes.is_empty() {
        return Err(ImageProcessingError::EmptyInput);
    }

    if raw_bytes.len() > config.max_input_bytes {
        return Err(ImageProcessingError::InputTooLarge {
            size: raw_bytes.len(),
            max_size: config.max_input_bytes,
        });
    }

    let mut reader = ImageReader::new(Cursor::new(raw_bytes))
        .with_guessed_format()
        .map_err(|e| ImageProcessingError::Decode { source: e.into() })?;

    if reader.format().is_none() {
        warn!(input_bytes = raw_bytes.len(), "unrecognised image format");
        return Err(ImageProcessingError::UnsupportedFormat);
    }

    let mut limits = Limits::default();
    limits.max_image_width = Some(config.max_dimension);
    limits.max_image_height = Some(config.max_dimension);
    limits.max_alloc = Some(config.max_alloc_bytes);
    reader.limits(limits);

    Ok(reader.decode()?)
}

fn encode_webp(img: &DynamicImage, quality: u8) -> Result<Vec<u8>, ImageProcessingError> {
    let rgb = img.to_rgb8();
    let (width, height) = rgb.dimensions();

    if width == 0 || height == 0 {
        return Err(ImageProcessingError::WebpEncode {
            width,
            height,
            reason: "zero dimension".into(),
        });
    }

    let quality = f32::from(quality.clamp(1, 100));
    let buffer = webp::Encoder::from_rgb(rgb.as_raw(), width, height)
        .encode_simple(false, quality)
        .map_err(|e| ImageProcessingError::WebpEncode {
            width,
            height,
            reason: format!("{e:?}"),
        })?
        .to_vec();

    if buffer.len() < 12 || &buffer[0..4] != b"RIFF" || &buffer[8..12] != b"WEBP" {
        return Err(ImageProcessingError::WebpEncode {
            width,
            height,
            reason: "invalid webp magic bytes".into(),
        });
    }

    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::codecs::webp::WebPEncoder;
    use image::{ExtendedColorType, ImageEncoder};
    use proptest::prelude::*;

    fn create_test_png(width: u32, height: u32) -> Vec<u8> {
        use image::{ImageBuffer, Rgba};
        let img: ImageBuffer<Rgba<u8>, Vec<u8>> = ImageBuffer::from_fn(width, height, |x, y| {
            Rgba([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8, 255])
        });
        let mut buffer = Vec::new();
        image::codecs::png::PngEncoder::new(&mut buffer)
            .write_image(img.as_raw(), width, height, ExtendedColorType::Rgba8)
            .unwrap();
        buffer
    }

    #[test]
    fn decode_rejects_empty() {
        let config = ProcessingConfig::default();
        assert!(matches!(
            decode_image(&config, &[]),
            Err(ImageProcessingError::EmptyInput)
        ));
    }

    #[test]
    fn decode_rejects_garbage() {
        let config = ProcessingConfig::default();
        assert!(matches!(
            decode_image(&config, &[0x00, 0x01, 0x02, 0x03]),
            Err(ImageProcessingError::UnsupportedFormat)
        ));
    }

    #[test]
    fn decode_rejects_oversized_input() {
        let config = ProcessingConfig {
            max_input_bytes: 100,
            ..Default::default()
        };
        let result = decode_image(&config, &[0u8; 101]);
        assert!(matches!(result, Err(ImageProcessingError::InputTooLarge { .. })));
    }

    #[test]
    fn decode_enforces_dimension_limit() {
        let config = ProcessingConfig {
            max_dimension: 32,
            ..Default::default()
        };
        let png = create_test_png(64, 16);
        let err = decode_image(&config, &png).unwrap_err();
        assert_eq!(AppError::from(err).kind, ErrorKind::ImageTooLarge);
    }

    #[test]
    fn small_image_keeps_dimensions() {
        let png = create_test_png(200, 150);
        let prepared = prepare_for_upload(&png, &ProcessingConfig::default()).unwrap();

        assert_eq!((prepared.width, prepared.height), (200, 150));
        assert_eq!(prepared.mime_type, "image/webp");
        assert_eq!(&prepared.data[0..4], b"RIFF");
        assert_eq!(&prepared.data[8..12], b"WEBP");

        let decoded = image::load_from_memory(&prepared.data).unwrap();
        assert_eq!(decoded.dimensions(), (200, 150));
    }

    #[test]
    fn large_image_is_downscaled_preserving_aspect() {
        let config = ProcessingConfig {
            output_max_edge: 100,
            ..Default::default()
        };
        let png = create_test_png(400, 200);
        let prepared = prepare_for_upload(&png, &config).unwrap();

        assert_eq!((prepared.width, prepared.height), (100, 50));
    }

    #[test]
    fn default_output_edge_bounds_phone_photos() {
        let png = create_test_png(1600, 1200);
        let prepared = prepare_for_upload(&png, &ProcessingConfig::default()).unwrap();
        assert_eq!((prepared.width, prepared.height), (1280, 960));
    }

    #[test]
    fn output_is_lossy_and_smaller_than_lossless() {
        let (width, height) = (256u32, 256u32);
        let mut seed = 0x2545_f491_u32;
        let pixels: Vec<u8> = (0..width * height * 4)
            .map(|i| {
                if i % 4 == 3 {
                    return 255;
                }
                seed ^= seed << 13;
                seed ^= seed >> 17;
                seed ^= seed << 5;
                (seed >> 24) as u8
            })
            .collect();

        let mut png = Vec::new();
        image::codecs::png::PngEncoder::new(&mut png)
            .write_image(&pixels, width, height, ExtendedColorType::Rgba8)
            .unwrap();
        let mut lossless = Vec::new();
        WebPEncoder::new_lossless(&mut lossless)
            .write_image(&pixels, width, height, ExtendedColorType::Rgba8)
            .unwrap();

        let prepared = prepare_for_upload(&png, &ProcessingConfig::default()).unwrap();
        assert_eq!(&prepared.data[8..12], b"WEBP");
        assert_eq!(&prepared.data[12..16], b"VP8 ");
        assert!(prepared.data.len() < lossless.len());
    }

    #[test]
    fn processing_errors_map_to_app_error_kinds() {
        let err: AppError = ImageProcessingError::UnsupportedFormat.into();
        assert_eq!(err.kind, ErrorKind::ImageFormatUnsupported);

        let err: AppError = ImageProcessingError::InputTooLarge { size: 2, max_size: 1 }.into();
        assert_eq!(err.kind, ErrorKind::ImageTooLarge);

        let err: AppError = ImageProcessingError::EmptyInput.into();
        assert_eq!(err.kind, ErrorKind::ImageProcessing);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        #[test]
        fn output_never_exceeds_max_edge(width in 1u32..96, height in 1u32..96) {
            let config = ProcessingConfig {
                output_max_edge: 48,
                ..Default::default()
            };
            let png = create_test_png(width, height);
            let prepared = prepare_for_upload(&png, &config).unwrap();

            prop_assert!(prepared.width <= 48);
            prop_assert!(prepared.height <= 48);
            prop_assert!(prepared.width >= 1 && prepared.height >= 1);
        }
    }
}
