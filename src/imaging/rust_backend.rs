//! Pure Rust codec backend over the `image` crate.
//!
//! Everything is statically linked into the binary.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, GIF, WebP, BMP, TIFF) | `image::load_from_memory` |
//! | Identify | `image::ImageReader::into_dimensions` (header only) |
//! | Resize | `DynamicImage::resize` with `Lanczos3` |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` (quality) |
//! | Encode → AVIF | `image::codecs::avif::AvifEncoder` (rav1e, speed 6) |
//! | Encode → PNG, GIF, WebP, ICO | `DynamicImage::write_to` |
//!
//! WebP output is lossless: the `image` crate ships no lossy WebP encoder, so
//! quality has no effect there. A PDF target is encoded as JPEG, which is
//! what the document packer embeds.
//!
//! ## Size ceiling
//!
//! When an encode comes out larger than `max_bytes`, lossy formats first
//! retry with quality lowered in steps of 10, then every format shrinks the
//! image by 10% per attempt. After [`MAX_ATTEMPTS`] the call fails.

use super::backend::{BackendError, Dimensions, ImageCodec};
use super::calculations::{ICO_MAX_DIMENSION, fit_within};
use super::params::{CompressParams, Quality};
use crate::format::OutputFormat;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, ImageReader};
use std::io::Cursor;
use tracing::{debug, warn};

/// Upper bound on encode attempts when chasing the size ceiling.
pub const MAX_ATTEMPTS: usize = 10;

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn decode(bytes: &[u8]) -> Result<DynamicImage, BackendError> {
    image::load_from_memory(bytes)
        .map_err(|e| BackendError::ProcessingFailed(format!("Failed to decode image: {}", e)))
}

fn is_lossy(format: OutputFormat) -> bool {
    matches!(
        format,
        OutputFormat::Jpeg | OutputFormat::Avif | OutputFormat::Pdf
    )
}

/// Longer-edge bound for a format, folding in format-specific hard limits.
fn effective_bound(format: OutputFormat, requested: u32) -> u32 {
    match format {
        OutputFormat::Ico => requested.min(ICO_MAX_DIMENSION),
        _ => requested,
    }
}

/// Encode `img` to `format` at `quality` (1–100).
fn encode(img: &DynamicImage, format: OutputFormat, quality: Quality) -> Result<Vec<u8>, BackendError> {
    let mut buf = Cursor::new(Vec::new());
    let q = quality.value() as u8;
    let result = match format {
        OutputFormat::Jpeg | OutputFormat::Pdf => {
            let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buf, q);
            DynamicImage::ImageRgb8(img.to_rgb8()).write_with_encoder(encoder)
        }
        OutputFormat::Avif => {
            let encoder =
                image::codecs::avif::AvifEncoder::new_with_speed_quality(&mut buf, 6, q);
            DynamicImage::ImageRgba8(img.to_rgba8()).write_with_encoder(encoder)
        }
        OutputFormat::Png => img.write_to(&mut buf, ImageFormat::Png),
        OutputFormat::Gif => {
            DynamicImage::ImageRgba8(img.to_rgba8()).write_to(&mut buf, ImageFormat::Gif)
        }
        OutputFormat::WebP => {
            DynamicImage::ImageRgba8(img.to_rgba8()).write_to(&mut buf, ImageFormat::WebP)
        }
        OutputFormat::Ico => {
            DynamicImage::ImageRgba8(img.to_rgba8()).write_to(&mut buf, ImageFormat::Ico)
        }
    };
    result.map_err(|e| {
        BackendError::ProcessingFailed(format!("{} encode failed: {}", format.name(), e))
    })?;
    Ok(buf.into_inner())
}

impl ImageCodec for RustBackend {
    fn identify(&self, bytes: &[u8]) -> Result<Dimensions, BackendError> {
        let (width, height) = ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()?
            .into_dimensions()
            .map_err(|e| {
                BackendError::ProcessingFailed(format!("Failed to read dimensions: {}", e))
            })?;
        Ok(Dimensions { width, height })
    }

    fn compress(&self, bytes: &[u8], params: &CompressParams) -> Result<Vec<u8>, BackendError> {
        let source = decode(bytes)?;
        // Output never carries source metadata and `resize` keeps the aspect
        // ratio, whatever the flags say.
        debug!(
            maintain_aspect_ratio = params.maintain_aspect_ratio,
            strip_metadata = params.strip_metadata,
            "compress flags forwarded"
        );

        let bound = effective_bound(params.format, params.max_dimension);
        let (mut width, mut height) = fit_within((source.width(), source.height()), bound);
        let mut quality = Quality::from_fraction(params.quality);

        for attempt in 1..=MAX_ATTEMPTS {
            let resized = if (width, height) == (source.width(), source.height()) {
                source.clone()
            } else {
                source.resize(width, height, FilterType::Lanczos3)
            };
            let encoded = encode(&resized, params.format, quality)?;
            if encoded.len() as u64 <= params.max_bytes {
                debug!(
                    attempt,
                    width,
                    height,
                    quality = quality.value(),
                    bytes = encoded.len(),
                    "encoded {}",
                    params.format
                );
                return Ok(encoded);
            }

            warn!(
                attempt,
                bytes = encoded.len(),
                limit = params.max_bytes,
                "encode over size ceiling, retrying smaller"
            );
            if is_lossy(params.format) && quality.value() > 10 {
                quality = Quality::new(quality.value() - 10);
            } else {
                (width, height) = fit_within((width, height), (width.max(height) * 9 / 10).max(1));
            }
        }

        Err(BackendError::ProcessingFailed(format!(
            "could not get {} output under {} bytes",
            params.format, params.max_bytes
        )))
    }
}
