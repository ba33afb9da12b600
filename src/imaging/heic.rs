//! HEIC/HEIF → JPEG transcoding.
//!
//! Decoding goes through `libheif-rs` (bindings to the libheif C library)
//! and is only compiled with the `heic` cargo feature. Without it every call
//! fails, which fails that one batch item and nothing else.

use super::backend::{BackendError, HeicTranscoder};

/// Production [`HeicTranscoder`].
#[derive(Debug, Default)]
pub struct HeifTranscoder;

impl HeifTranscoder {
    pub fn new() -> Self {
        Self
    }

    /// Whether HEIC decoding was compiled in.
    pub fn available() -> bool {
        cfg!(feature = "heic")
    }
}

/// Copy `height` rows of `width` RGB pixels out of a plane whose rows are
/// `stride` bytes apart. libheif may pad rows past `width * 3`.
///
/// `None` when the plane is too short for the dimensions.
#[cfg(any(feature = "heic", test))]
fn packed_rows(data: &[u8], width: u32, height: u32, stride: usize) -> Option<Vec<u8>> {
    let row_bytes = width as usize * 3;
    let rows = height as usize;
    if rows == 0 {
        return Some(Vec::new());
    }
    let needed = stride.checked_mul(rows - 1)?.checked_add(row_bytes)?;
    if stride < row_bytes || data.len() < needed {
        return None;
    }
    let mut rgb = Vec::with_capacity(row_bytes * rows);
    for row in 0..rows {
        let start = row * stride;
        rgb.extend_from_slice(&data[start..start + row_bytes]);
    }
    Some(rgb)
}

#[cfg(feature = "heic")]
impl HeicTranscoder for HeifTranscoder {
    fn transcode_to_jpeg(&self, bytes: &[u8], quality: f32) -> Result<Vec<u8>, BackendError> {
        use super::params::Quality;
        use image::{DynamicImage, RgbImage};
        use libheif_rs::{ColorSpace, HeifContext, LibHeif, RgbChroma};

        let heif_err = |e: libheif_rs::HeifError| BackendError::ProcessingFailed(e.to_string());

        let lib = LibHeif::new();
        let ctx = HeifContext::read_from_bytes(bytes).map_err(heif_err)?;
        let handle = ctx.primary_image_handle().map_err(heif_err)?;
        let decoded = lib
            .decode(&handle, ColorSpace::Rgb(RgbChroma::Rgb), None)
            .map_err(heif_err)?;

        let planes = decoded.planes();
        let plane = planes.interleaved.ok_or_else(|| {
            BackendError::ProcessingFailed("HEIC decode produced no interleaved plane".into())
        })?;
        let (width, height, stride) = (plane.width, plane.height, plane.stride);

        let img = packed_rows(plane.data, width, height, stride)
            .and_then(|rgb| RgbImage::from_raw(width, height, rgb))
            .ok_or_else(|| {
                BackendError::ProcessingFailed("HEIC plane size does not match dimensions".into())
            })?;

        let mut out = Vec::new();
        let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(
            &mut out,
            Quality::from_fraction(quality).value() as u8,
        );
        DynamicImage::ImageRgb8(img)
            .write_with_encoder(encoder)
            .map_err(|e| BackendError::ProcessingFailed(format!("JPEG encode failed: {}", e)))?;
        tracing::debug!(width, height, bytes = out.len(), "transcoded HEIC to JPEG");
        Ok(out)
    }
}

#[cfg(not(feature = "heic"))]
impl HeicTranscoder for HeifTranscoder {
    fn transcode_to_jpeg(&self, _bytes: &[u8], _quality: f32) -> Result<Vec<u8>, BackendError> {
        Err(BackendError::Unsupported(
            "HEIC input needs simple-imgconv built with the `heic` feature".to_string(),
        ))
    }
}
