//! Media types accepted on input and produced on output.
//!
//! Input and output sets differ: HEIC, BMP and TIFF can be read but not
//! written, while AVIF, PDF and ICO can be written but not read.
//!
//! | Output | Media type | Extension |
//! |---|---|---|
//! | JPEG | `image/jpeg` | `jpg` |
//! | PNG | `image/png` | `png` |
//! | GIF | `image/gif` | `gif` |
//! | WebP | `image/webp` | `webp` |
//! | AVIF | `image/avif` | `avif` |
//! | PDF | `application/pdf` | `pdf` |
//! | ICO | `image/x-icon` | `ico` |

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown format '{0}'")]
pub struct UnknownFormat(pub String);

/// Declared media type of an accepted source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputType {
    Jpeg,
    Png,
    Gif,
    WebP,
    Heic,
    Bmp,
    Tiff,
}

/// Extension → input type. Matching is case-insensitive.
const INPUT_EXTENSIONS: &[(&str, InputType)] = &[
    ("jpg", InputType::Jpeg),
    ("jpeg", InputType::Jpeg),
    ("png", InputType::Png),
    ("gif", InputType::Gif),
    ("webp", InputType::WebP),
    ("heic", InputType::Heic),
    ("heif", InputType::Heic),
    ("bmp", InputType::Bmp),
    ("tif", InputType::Tiff),
    ("tiff", InputType::Tiff),
];

impl InputType {
    pub const ALL: [InputType; 7] = [
        InputType::Jpeg,
        InputType::Png,
        InputType::Gif,
        InputType::WebP,
        InputType::Heic,
        InputType::Bmp,
        InputType::Tiff,
    ];

    pub fn media_type(self) -> &'static str {
        match self {
            InputType::Jpeg => "image/jpeg",
            InputType::Png => "image/png",
            InputType::Gif => "image/gif",
            InputType::WebP => "image/webp",
            InputType::Heic => "image/heic",
            InputType::Bmp => "image/bmp",
            InputType::Tiff => "image/tiff",
        }
    }

    /// Look up the input type declared by a file name's extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?;
        INPUT_EXTENSIONS
            .iter()
            .find(|(candidate, _)| candidate.eq_ignore_ascii_case(ext))
            .map(|(_, kind)| *kind)
    }

    /// Extensions that declare this type.
    pub fn file_extensions(self) -> Vec<&'static str> {
        INPUT_EXTENSIONS
            .iter()
            .filter(|(_, kind)| *kind == self)
            .map(|(ext, _)| *ext)
            .collect()
    }
}

impl fmt::Display for InputType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.media_type())
    }
}

/// Target format of a conversion request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Jpeg,
    Png,
    Gif,
    WebP,
    Avif,
    Pdf,
    Ico,
}

impl OutputFormat {
    pub const ALL: [OutputFormat; 7] = [
        OutputFormat::Jpeg,
        OutputFormat::Png,
        OutputFormat::Gif,
        OutputFormat::WebP,
        OutputFormat::Avif,
        OutputFormat::Pdf,
        OutputFormat::Ico,
    ];

    pub fn media_type(self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "image/jpeg",
            OutputFormat::Png => "image/png",
            OutputFormat::Gif => "image/gif",
            OutputFormat::WebP => "image/webp",
            OutputFormat::Avif => "image/avif",
            OutputFormat::Pdf => "application/pdf",
            OutputFormat::Ico => "image/x-icon",
        }
    }

    /// Canonical file extension, used by the naming rule.
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "jpg",
            OutputFormat::Png => "png",
            OutputFormat::Gif => "gif",
            OutputFormat::WebP => "webp",
            OutputFormat::Avif => "avif",
            OutputFormat::Pdf => "pdf",
            OutputFormat::Ico => "ico",
        }
    }

    /// Lowercase short name, as written in `config.toml`.
    pub fn name(self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "jpeg",
            OutputFormat::Png => "png",
            OutputFormat::Gif => "gif",
            OutputFormat::WebP => "webp",
            OutputFormat::Avif => "avif",
            OutputFormat::Pdf => "pdf",
            OutputFormat::Ico => "ico",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = UnknownFormat;

    /// Accepts the short name, the canonical extension or the media type.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Self::ALL
            .into_iter()
            .find(|f| {
                f.name().eq_ignore_ascii_case(needle)
                    || f.extension().eq_ignore_ascii_case(needle)
                    || f.media_type().eq_ignore_ascii_case(needle)
            })
            .ok_or_else(|| UnknownFormat(s.to_string()))
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
