//! Image collaborators: codec, HEIC transcoder, PDF packer.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `image::ImageReader::into_dimensions` |
//! | **Resize + re-encode** | Lanczos3 + `image` encoders (rav1e for AVIF) |
//! | **HEIC → JPEG** | `libheif-rs` (optional `heic` feature) |
//! | **Image → PDF page** | `lopdf` |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension and page math (unit testable)
//! - **Parameters**: Data structures describing collaborator calls
//! - **Backend**: collaborator traits + shared types
//! - **Implementations**: [`RustBackend`], [`HeifTranscoder`], [`PdfPacker`]

pub mod backend;
mod calculations;
pub mod heic;
mod params;
pub mod pdf;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, DocumentPacker, HeicTranscoder, ImageCodec};
pub use calculations::{
    A4_PAGE_HEIGHT, A4_PAGE_WIDTH, DEFAULT_MAX_DIMENSION, PageLayout, calculate_page_layout,
    fit_within, resolve_max_dimension,
};
pub use heic::HeifTranscoder;
pub use params::{CompressParams, Quality};
pub use pdf::PdfPacker;
pub use rust_backend::RustBackend;
