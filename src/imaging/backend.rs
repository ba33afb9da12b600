//! Collaborator traits for the image side of a conversion.
//!
//! The pipeline never touches pixels itself. It talks to three collaborators:
//!
//! | Trait | Job | Production implementation |
//! |---|---|---|
//! | [`ImageCodec`] | identify, resize + re-encode | [`RustBackend`](super::rust_backend::RustBackend) |
//! | [`HeicTranscoder`] | HEIC → JPEG | [`HeifTranscoder`](super::heic::HeifTranscoder) |
//! | [`DocumentPacker`] | image → single-page PDF | [`PdfPacker`](super::pdf::PdfPacker) |
//!
//! All of them work on in-memory bytes. Failures are reported as
//! [`BackendError`] and treated opaquely by the pipeline: the message is
//! carried to the user, nothing is retried.

use super::calculations::PageLayout;
use super::params::CompressParams;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
    #[error("Unsupported: {0}")]
    Unsupported(String),
}

/// Pixel dimensions of an encoded image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Resize and re-encode images.
///
/// `maintain_aspect_ratio` and `strip_metadata` in [`CompressParams`] are a
/// pass-through contract: implementations decide whether and how to honor
/// them, the pipeline never checks.
pub trait ImageCodec {
    /// Get the pixel dimensions of encoded image bytes.
    fn identify(&self, bytes: &[u8]) -> Result<Dimensions, BackendError>;

    /// Downscale to the longer-edge bound and re-encode to the target format,
    /// staying under the byte ceiling.
    fn compress(&self, bytes: &[u8], params: &CompressParams) -> Result<Vec<u8>, BackendError>;
}

/// Decode HEIC/HEIF and re-encode it as JPEG.
pub trait HeicTranscoder {
    /// `quality` is a 0.0–1.0 fraction.
    fn transcode_to_jpeg(&self, bytes: &[u8], quality: f32) -> Result<Vec<u8>, BackendError>;
}

/// Wrap one image in a single-page document.
pub trait DocumentPacker {
    /// Page width the layout is computed against, in document units.
    fn page_size(&self) -> (f32, f32);

    /// Embed `image` (JPEG bytes of `dimensions`) according to `layout`.
    fn pack(
        &self,
        image: &[u8],
        dimensions: Dimensions,
        layout: &PageLayout,
    ) -> Result<Vec<u8>, BackendError>;
}
