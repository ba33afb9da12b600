//! Writes a batch result to disk.
//!
//! A single converted file lands in the output directory under its converted
//! name; several land as one `converted_images.zip`. Nothing converted means
//! nothing is written (and the directory is not created).

use crate::batch::BatchResult;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum DeliverError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Where a result was written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Delivery {
    pub path: PathBuf,
    pub media_type: &'static str,
    pub bytes: usize,
}

/// Write `result` into `dir`, creating it if needed. Overwrites an existing
/// file of the same name.
pub fn deliver(result: &BatchResult, dir: &Path) -> Result<Option<Delivery>, DeliverError> {
    let (Some(name), Some(bytes), Some(media_type)) =
        (result.file_name(), result.bytes(), result.media_type())
    else {
        return Ok(None);
    };

    fs::create_dir_all(dir)?;
    let path = dir.join(name);
    fs::write(&path, bytes)?;
    info!(path = %path.display(), bytes = bytes.len(), "delivered");

    Ok(Some(Delivery {
        path,
        media_type,
        bytes: bytes.len(),
    }))
}
