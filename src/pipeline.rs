//! Per-file conversion pipeline.
//!
//! Every file goes through the same fixed sequence:
//!
//! ```text
//! 1. HEIC pre-pass     heic → jpeg            (only for HEIC sources)
//! 2. Resize/compress   bytes → target format  (always, even same-format)
//! 3. Document pack     jpeg → single-page PDF (only for PDF targets)
//! ```
//!
//! The pipeline owns policy only: which collaborator runs, with what
//! parameters, and how failures are classified. Pixel and byte work is done
//! by the [`imaging`](crate::imaging) collaborators.
//!
//! ## Resize bound
//!
//! The request's `max_width` and `max_height` collapse into one longer-edge
//! bound, `max(max_width ?? 4096, max_height ?? 4096)`. A 100 × 50 request
//! therefore means "longer edge ≤ 100", not a 100 × 50 box.

use crate::format::{InputType, OutputFormat};
use crate::imaging::{
    BackendError, CompressParams, DocumentPacker, HeicTranscoder, ImageCodec, Quality,
    calculate_page_layout, resolve_max_dimension,
};
use thiserror::Error;
use tracing::debug;

/// Byte ceiling handed to the codec (25 MB). Not configurable.
pub const MAX_OUTPUT_BYTES: u64 = 25 * 1024 * 1024;

#[derive(Error, Debug)]
pub enum ConversionError {
    #[error("{name}: rejected: {reason}")]
    AcceptanceRejected { name: String, reason: String },
    #[error("HEIC transcode failed: {0}")]
    TranscodeFailed(BackendError),
    #[error("Conversion failed: {0}")]
    ConversionFailed(BackendError),
    #[error("Packing failed: {0}")]
    PackingFailed(BackendError),
}

/// Options applied uniformly to every file in a batch.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionRequest {
    pub format: OutputFormat,
    pub quality: Quality,
    pub max_width: Option<u32>,
    pub max_height: Option<u32>,
    pub maintain_aspect_ratio: bool,
    pub strip_metadata: bool,
}

impl Default for ConversionRequest {
    fn default() -> Self {
        Self {
            format: OutputFormat::Jpeg,
            quality: Quality::default(),
            max_width: None,
            max_height: None,
            maintain_aspect_ratio: true,
            strip_metadata: false,
        }
    }
}

impl ConversionRequest {
    /// The single longer-edge bound this request resolves to.
    pub fn max_dimension(&self) -> u32 {
        resolve_max_dimension(self.max_width, self.max_height)
    }

    /// Codec parameters for the resize/compress step.
    pub fn compress_params(&self) -> CompressParams {
        CompressParams {
            max_bytes: MAX_OUTPUT_BYTES,
            max_dimension: self.max_dimension(),
            format: self.format,
            quality: self.quality.fraction(),
            maintain_aspect_ratio: self.maintain_aspect_ratio,
            strip_metadata: self.strip_metadata,
        }
    }
}

/// Converted bytes and the format they are in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionOutput {
    pub bytes: Vec<u8>,
    pub format: OutputFormat,
}

impl ConversionOutput {
    pub fn media_type(&self) -> &'static str {
        self.format.media_type()
    }
}

/// The collaborators one conversion runs against.
pub struct Pipeline<'a> {
    codec: &'a dyn ImageCodec,
    heic: &'a dyn HeicTranscoder,
    packer: &'a dyn DocumentPacker,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        codec: &'a dyn ImageCodec,
        heic: &'a dyn HeicTranscoder,
        packer: &'a dyn DocumentPacker,
    ) -> Self {
        Self {
            codec,
            heic,
            packer,
        }
    }

    /// Convert one file. Never retries.
    pub fn convert(
        &self,
        bytes: &[u8],
        media_type: InputType,
        request: &ConversionRequest,
    ) -> Result<ConversionOutput, ConversionError> {
        let transcoded;
        let input = if media_type == InputType::Heic {
            transcoded = self
                .heic
                .transcode_to_jpeg(bytes, request.quality.fraction())
                .map_err(ConversionError::TranscodeFailed)?;
            debug!(bytes = transcoded.len(), "HEIC pre-pass done");
            transcoded.as_slice()
        } else {
            bytes
        };

        let params = request.compress_params();
        let compressed = self
            .codec
            .compress(input, &params)
            .map_err(ConversionError::ConversionFailed)?;
        debug!(
            format = %request.format,
            max_dimension = params.max_dimension,
            bytes = compressed.len(),
            "compressed"
        );

        if request.format != OutputFormat::Pdf {
            return Ok(ConversionOutput {
                bytes: compressed,
                format: request.format,
            });
        }

        let dimensions = self
            .codec
            .identify(&compressed)
            .map_err(ConversionError::PackingFailed)?;
        let layout =
            calculate_page_layout((dimensions.width, dimensions.height), self.packer.page_size());
        let document = self
            .packer
            .pack(&compressed, dimensions, &layout)
            .map_err(ConversionError::PackingFailed)?;
        Ok(ConversionOutput {
            bytes: document,
            format: OutputFormat::Pdf,
        })
    }
}
