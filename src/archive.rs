//! Zip packaging for multi-file results.
//!
//! Members are independent, so each one is deflated into its own one-entry
//! archive on the rayon pool, then the pieces are merged, in input order,
//! into the final archive. Merging copies the compressed data without
//! inflating it again.
//!
//! Zip refuses duplicate entry names, and the naming rule can produce them
//! (`photo.png` and `photo.gif` both become `photo_converted.jpg`). Repeats
//! are disambiguated with [`MemberNames`]: `photo_converted.jpg`,
//! `photo_converted-2.jpg`, … The batch runner claims names as items finish,
//! so the names it reports are the ones stored; [`ZipBuilder`] applies the
//! same rule again for callers that pass raw names.

use crate::naming::base_name;
use rayon::prelude::*;
use std::collections::HashSet;
use std::io::{Cursor, Write};
use thiserror::Error;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
}

/// Packs named byte blobs into one archive.
pub trait ArchiveBuilder {
    /// Build an archive from `(name, bytes)` pairs, preserving their order.
    fn build(&self, entries: &[(String, Vec<u8>)]) -> Result<Vec<u8>, ArchiveError>;
}

/// Production [`ArchiveBuilder`] writing deflate-compressed zip files.
#[derive(Debug, Default)]
pub struct ZipBuilder;

impl ZipBuilder {
    pub fn new() -> Self {
        Self
    }
}

fn options() -> SimpleFileOptions {
    SimpleFileOptions::default().compression_method(CompressionMethod::Deflated)
}

/// Deflate a single member into its own in-memory archive.
fn pack_member(name: &str, bytes: &[u8]) -> Result<Vec<u8>, ArchiveError> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    writer.start_file(name, options())?;
    writer.write_all(bytes)?;
    Ok(writer.finish()?.into_inner())
}

/// Hands out member names that are unique within one archive.
///
/// A repeated name gets `-2`, `-3`, … before its extension, skipping any
/// suffix already taken.
#[derive(Debug, Default)]
pub struct MemberNames {
    taken: HashSet<String>,
}

impl MemberNames {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve `name`, or the first free suffixed variant of it.
    pub fn claim(&mut self, name: &str) -> String {
        let mut candidate = name.to_string();
        let mut n = 2;
        while self.taken.contains(&candidate) {
            let base = base_name(name);
            candidate = format!("{}-{}{}", base, n, &name[base.len()..]);
            n += 1;
        }
        self.taken.insert(candidate.clone());
        candidate
    }
}

/// Make every name unique by suffixing `-2`, `-3`, … before the extension.
pub fn disambiguate_names<'a>(names: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut claimed = MemberNames::new();
    names.into_iter().map(|name| claimed.claim(name)).collect()
}

impl ArchiveBuilder for ZipBuilder {
    fn build(&self, entries: &[(String, Vec<u8>)]) -> Result<Vec<u8>, ArchiveError> {
        let names = disambiguate_names(entries.iter().map(|(name, _)| name.as_str()));

        let members: Vec<Vec<u8>> = names
            .par_iter()
            .zip(entries.par_iter())
            .map(|(name, (_, bytes))| pack_member(name, bytes))
            .collect::<Result<_, _>>()?;

        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        for member in members {
            writer.merge_archive(ZipArchive::new(Cursor::new(member))?)?;
        }
        let archive = writer.finish()?.into_inner();
        tracing::debug!(members = entries.len(), bytes = archive.len(), "archive built");
        Ok(archive)
    }
}
