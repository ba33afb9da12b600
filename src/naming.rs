//! Output file naming.
//!
//! Every converted file is named from its source by one fixed rule:
//! strip the last extension, append `_converted`, then the target format's
//! canonical extension.
//!
//! - `photo.png` → JPEG → `photo_converted.jpg`
//! - `a.b.c` → PNG → `a.b_converted.png` (only the last extension goes)
//! - `scan.TIFF` → PDF → `scan_converted.pdf`
//!
//! The rule does not de-duplicate: two sources named `photo.png` and
//! `photo.jpg` both map to `photo_converted.<ext>`. The archive layer is the
//! one that has to cope with that.

use crate::format::OutputFormat;

/// Suffix appended to every converted file's base name.
pub const CONVERTED_SUFFIX: &str = "_converted";

/// Fixed name of the archive delivered when more than one file converted.
pub const ARCHIVE_NAME: &str = "converted_images.zip";

/// Strip the last `.ext` from a file name.
///
/// A name without a dot, or whose only dot is the leading one (`.hidden`),
/// has no extension and is returned whole.
pub fn base_name(name: &str) -> &str {
    match name.rfind('.') {
        Some(0) | None => name,
        Some(pos) => &name[..pos],
    }
}

/// Apply the naming rule to a source file name.
pub fn generate_file_name(original_name: &str, format: OutputFormat) -> String {
    format!(
        "{}{}.{}",
        base_name(original_name),
        CONVERTED_SUFFIX,
        format.extension()
    )
}
