//! Image transform engine.
//!
//! Bounded resize plus re-encode, and square crop-to-cover thumbnails.
//! Operates on in-memory buffers; the orchestrator owns all file I/O.

use bytes::Bytes;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView};
use mediad_core::models::{ImageFormat, ImageOptions};
use std::io::Cursor;

/// Result of an image transform: encoded bytes plus final dimensions.
#[derive(Debug, Clone)]
pub struct ProcessedImage {
    pub data: Bytes,
    pub width: u32,
    pub height: u32,
}

pub struct ImageEngine;

impl ImageEngine {
    /// Resize an image to fit inside the target bounding box (aspect ratio
    /// preserved, never upscaled) and re-encode it at the requested quality
    /// and format.
    pub fn transform(data: &[u8], opts: &ImageOptions) -> Result<ProcessedImage, anyhow::Error> {
        let img = Self::decode(data)?;
        let (width, height) = img.dimensions();

        let img = if width > opts.target_width || height > opts.target_height {
            img.resize(opts.target_width, opts.target_height, FilterType::Lanczos3)
        } else {
            img
        };

        let (out_width, out_height) = img.dimensions();
        let encoded = Self::encode(&img, opts.output_format, opts.quality)?;

        tracing::debug!(
            input_bytes = data.len(),
            output_bytes = encoded.len(),
            width = out_width,
            height = out_height,
            format = ?opts.output_format,
            "Image transformed"
        );

        Ok(ProcessedImage {
            data: Bytes::from(encoded),
            width: out_width,
            height: out_height,
        })
    }

    /// Produce a `size`×`size` crop-to-cover thumbnail, always jpeg.
    pub fn thumbnail(data: &[u8], size: u32, quality: u8) -> Result<Bytes, anyhow::Error> {
        let img = Self::decode(data)?;
        let thumb = img.resize_to_fill(size, size, FilterType::Lanczos3);
        let encoded = Self::encode(&thumb, ImageFormat::Jpeg, quality)?;
        Ok(Bytes::from(encoded))
    }

    /// Source dimensions without a full transform.
    pub fn dimensions(data: &[u8]) -> Result<(u32, u32), anyhow::Error> {
        Ok(Self::decode(data)?.dimensions())
    }

    fn decode(data: &[u8]) -> Result<DynamicImage, anyhow::Error> {
        let img = image::ImageReader::new(Cursor::new(data))
            .with_guessed_format()?
            .decode()?;
        Ok(img)
    }

    fn encode(
        img: &DynamicImage,
        format: ImageFormat,
        quality: u8,
    ) -> Result<Vec<u8>, anyhow::Error> {
        let mut buffer = Vec::new();
        let mut cursor = Cursor::new(&mut buffer);

        match format {
            ImageFormat::Jpeg => {
                // jpeg has no alpha channel
                let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
                let encoder =
                    image::codecs::jpeg::JpegEncoder::new_with_quality(&mut cursor, quality);
                rgb.write_with_encoder(encoder)?;
            }
            ImageFormat::Png => {
                img.write_to(&mut cursor, image::ImageFormat::Png)?;
            }
            ImageFormat::Webp => {
                // the image crate only does lossless webp; encode lossily so
                // the requested quality actually applies
                let rgba = img.to_rgba8();
                let (width, height) = rgba.dimensions();
                let encoder = webp::Encoder::from_rgba(&rgba, width, height);
                return Ok(encoder.encode(f32::from(quality)).to_vec());
            }
        }

        Ok(buffer)
    }
}
