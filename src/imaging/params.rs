//! Parameter types for collaborator calls.
//!
//! These structs describe *what* to do, not *how* to do it. They are the
//! interface between the [`pipeline`](crate::pipeline) (which decides the
//! policy) and the [`backend`](super::backend) traits (which do the pixel
//! and byte work). Keeping them plain data lets tests assert on exactly what
//! a mock collaborator was asked to do.
//!
//! ## Types
//!
//! - [`Quality`]: Lossy encoding quality (1–100, default 80). Clamped on construction.
//! - [`CompressParams`]: Full specification for one resize + re-encode call.

use crate::format::OutputFormat;

/// Quality setting for lossy image encoding (1-100).
///
/// Only built through [`Quality::new`] and friends, so the value is always
/// in range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }

    /// Quality as a 0.0–1.0 fraction, the unit collaborators take.
    pub fn fraction(self) -> f32 {
        self.0 as f32 / 100.0
    }

    /// Convert a 0.0–1.0 fraction back to a 1–100 quality.
    pub fn from_fraction(fraction: f32) -> Self {
        Self::new((fraction * 100.0).round() as u32)
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(80)
    }
}

/// Parameters for a single resize + re-encode call on the codec.
#[derive(Debug, Clone, PartialEq)]
pub struct CompressParams {
    /// Byte-size ceiling for the encoded result.
    pub max_bytes: u64,
    /// Bound on the longer edge, in pixels.
    pub max_dimension: u32,
    pub format: OutputFormat,
    /// Quality as a 0.0–1.0 fraction.
    pub quality: f32,
    /// Forwarded as-is; see [`ImageCodec`](super::ImageCodec).
    pub maintain_aspect_ratio: bool,
    /// Forwarded as-is; see [`ImageCodec`](super::ImageCodec).
    pub strip_metadata: bool,
}
