//! Source files and the acceptance check in front of every batch.
//!
//! A file is accepted when its extension names a supported input type and it
//! is at most [`MAX_SOURCE_BYTES`] long. Anything else is rejected here and
//! never becomes a batch item.

use crate::format::InputType;
use crate::pipeline::ConversionError;
use std::path::Path;
use std::sync::Arc;

/// Per-file size ceiling on input (25 MB).
pub const MAX_SOURCE_BYTES: u64 = 25 * 1024 * 1024;

/// An accepted input file. Immutable once accepted.
///
/// Content is reference-counted so re-queued items and events share it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    name: String,
    media_type: InputType,
    bytes: Arc<[u8]>,
}

impl SourceFile {
    /// Build a source from in-memory content, checking the size ceiling.
    pub fn new(
        name: impl Into<String>,
        media_type: InputType,
        bytes: impl Into<Arc<[u8]>>,
    ) -> Result<Self, ConversionError> {
        let name = name.into();
        let bytes = bytes.into();
        if bytes.len() as u64 > MAX_SOURCE_BYTES {
            return Err(ConversionError::AcceptanceRejected {
                name,
                reason: format!(
                    "{} exceeds the {} MB limit",
                    format_size(bytes.len() as u64),
                    MAX_SOURCE_BYTES / (1024 * 1024)
                ),
            });
        }
        Ok(Self {
            name,
            media_type,
            bytes,
        })
    }

    /// Display name (file name without directories).
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn media_type(&self) -> InputType {
        self.media_type
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

fn rejected(path: &Path, reason: impl Into<String>) -> ConversionError {
    ConversionError::AcceptanceRejected {
        name: display_name(path),
        reason: reason.into(),
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Accept a file from disk into a [`SourceFile`].
///
/// The type is declared by the extension; the size is checked from metadata
/// before the file is read so oversized files are never loaded.
pub fn accept_path(path: &Path) -> Result<SourceFile, ConversionError> {
    let media_type = InputType::from_path(path)
        .ok_or_else(|| rejected(path, "unsupported file type"))?;

    let meta = std::fs::metadata(path).map_err(|e| rejected(path, e.to_string()))?;
    if !meta.is_file() {
        return Err(rejected(path, "not a regular file"));
    }
    if meta.len() > MAX_SOURCE_BYTES {
        return Err(rejected(
            path,
            format!(
                "{} exceeds the {} MB limit",
                format_size(meta.len()),
                MAX_SOURCE_BYTES / (1024 * 1024)
            ),
        ));
    }

    let bytes = std::fs::read(path).map_err(|e| rejected(path, e.to_string()))?;
    SourceFile::new(display_name(path), media_type, bytes)
}

/// Accept every path, splitting accepted files from rejections.
///
/// Order of accepted files follows the input order.
pub fn accept_all<P: AsRef<Path>>(paths: &[P]) -> (Vec<SourceFile>, Vec<ConversionError>) {
    let mut accepted = Vec::new();
    let mut rejections = Vec::new();
    for path in paths {
        match accept_path(path.as_ref()) {
            Ok(source) => accepted.push(source),
            Err(e) => rejections.push(e),
        }
    }
    (accepted, rejections)
}

/// Human-readable byte size (`1.5 MB`, `12 KB`, `512 B`).
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * KB;
    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{} KB", bytes / KB)
    } else {
        format!("{} B", bytes)
    }
}
