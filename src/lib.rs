//! # Simple Imgconv
//!
//! A small batch image converter. Many files go in, each is converted with the
//! same options, and exactly one thing comes out: the converted file itself,
//! or a zip of all of them.
//!
//! # Architecture: Pipeline Inside a Batch
//!
//! ```text
//! accept   paths      →  SourceFile        (type by extension, 25 MB ceiling)
//! convert  SourceFile →  ConversionOutput  (HEIC pre-pass → compress → PDF pack)
//! batch    items      →  BatchResult       (nothing / single file / zip)
//! deliver  result     →  output dir
//! ```
//!
//! The pipeline decides *what* happens to a file; the collaborators behind
//! the traits in [`imaging`] and [`archive`] decide *how*. Everything above
//! those traits runs against mocks in unit tests without decoding a pixel.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`format`] | Input media types and output formats |
//! | [`source`] | Acceptance: extension and size checks, `SourceFile` |
//! | [`naming`] | `name_converted.ext` naming rule and the archive name |
//! | [`imaging`] | Codec, HEIC transcoder and PDF packer collaborators |
//! | [`pipeline`] | Per-file conversion sequence and error classification |
//! | [`batch`] | Item lifecycle, sequential run, result assembly, events |
//! | [`archive`] | Zip building for multi-file results |
//! | [`deliver`] | Writing the result into the output directory |
//! | [`config`] | `config.toml` loading, validation, merging |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## One Result per Batch
//!
//! A single success is handed back as-is, with no archive around one file.
//! Two or more are always zipped as `converted_images.zip`, in the order the
//! files were added.
//!
//! ## Sequential Items
//!
//! Items are converted one at a time in insertion order so progress reads in
//! order and memory holds one decoded image at a time. The rayon pool is used
//! only for deflating archive members.
//!
//! ## HEIC Behind a Feature
//!
//! Decoding HEIC needs libheif, a C library. The default build stays pure
//! Rust; `--features heic` enables the pre-pass. Without it HEIC items fail
//! individually and the rest of the batch is unaffected.

pub mod archive;
pub mod batch;
pub mod config;
pub mod deliver;
pub mod format;
pub mod imaging;
pub mod naming;
pub mod output;
pub mod pipeline;
pub mod source;
