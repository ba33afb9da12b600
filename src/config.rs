//! Converter configuration.
//!
//! Handles loading, validating, and merging `config.toml`. Stock defaults are
//! the base layer; a user file overrides only the keys it names; command-line
//! flags override both.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [conversion]
//! format = "jpeg"               # jpeg, png, gif, webp, avif, pdf, ico
//! quality = 80                  # 1-100
//! # max_width = 1920            # longer-edge bound, see below
//! # max_height = 1080
//! maintain_aspect_ratio = true
//! strip_metadata = false
//!
//! [output]
//! dir = "converted"             # where results are written
//!
//! [processing]
//! max_processes = 4             # Max parallel workers (omit for auto = CPU cores)
//! ```
//!
//! `max_width` and `max_height` resolve to a single longer-edge bound: the
//! larger of the two, each defaulting to 4096.
//!
//! Unknown keys are rejected to catch typos early.

use crate::format::OutputFormat;
use crate::imaging::Quality;
use crate::pipeline::ConversionRequest;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// File name looked up in a directory when no explicit path is given.
pub const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    TomlSer(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Converter configuration loaded from `config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Options applied to every file in a batch.
    pub conversion: ConversionConfig,
    /// Delivery settings.
    pub output: OutputConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl Config {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.conversion.validate()?;
        if self.output.dir.trim().is_empty() {
            return Err(ConfigError::Validation("output.dir must not be empty".into()));
        }
        if self.processing.max_processes == Some(0) {
            return Err(ConfigError::Validation(
                "processing.max_processes must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Conversion options. Mirrors [`ConversionRequest`] with plain values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConversionConfig {
    pub format: OutputFormat,
    pub quality: u32,
    pub max_width: Option<u32>,
    pub max_height: Option<u32>,
    pub maintain_aspect_ratio: bool,
    pub strip_metadata: bool,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        let request = ConversionRequest::default();
        Self {
            format: request.format,
            quality: request.quality.value(),
            max_width: request.max_width,
            max_height: request.max_height,
            maintain_aspect_ratio: request.maintain_aspect_ratio,
            strip_metadata: request.strip_metadata,
        }
    }
}

impl ConversionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=100).contains(&self.quality) {
            return Err(ConfigError::Validation(
                "conversion.quality must be 1-100".into(),
            ));
        }
        if self.max_width == Some(0) || self.max_height == Some(0) {
            return Err(ConfigError::Validation(
                "conversion.max_width and max_height must be greater than 0".into(),
            ));
        }
        Ok(())
    }

    /// Apply command-line overrides, then validate the result.
    pub fn with_overrides(
        &self,
        overrides: &ConversionOverrides,
    ) -> Result<ConversionConfig, ConfigError> {
        let merged = ConversionConfig {
            format: overrides.format.unwrap_or(self.format),
            quality: overrides.quality.unwrap_or(self.quality),
            max_width: overrides.max_width.or(self.max_width),
            max_height: overrides.max_height.or(self.max_height),
            maintain_aspect_ratio: self.maintain_aspect_ratio && !overrides.no_aspect_ratio,
            strip_metadata: self.strip_metadata || overrides.strip_metadata,
        };
        merged.validate()?;
        Ok(merged)
    }

    pub fn to_request(&self) -> ConversionRequest {
        ConversionRequest {
            format: self.format,
            quality: Quality::new(self.quality),
            max_width: self.max_width,
            max_height: self.max_height,
            maintain_aspect_ratio: self.maintain_aspect_ratio,
            strip_metadata: self.strip_metadata,
        }
    }
}

/// Conversion values given on the command line. `None`/`false` keeps config.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConversionOverrides {
    pub format: Option<OutputFormat>,
    pub quality: Option<u32>,
    pub max_width: Option<u32>,
    pub max_height: Option<u32>,
    pub no_aspect_ratio: bool,
    pub strip_metadata: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// Directory results are written into. Created on demand.
    pub dir: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: "converted".to_string(),
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel workers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.max_processes.map(|n| n.min(cores)).unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(Config::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Read a config file as a raw TOML value. The file must exist.
pub fn read_raw_config(path: &Path) -> Result<toml::Value, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Load `config.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if the directory has no `config.toml`.
pub fn load_raw_config(dir: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = dir.join(CONFIG_FILE_NAME);
    if !config_path.exists() {
        return Ok(None);
    }
    read_raw_config(&config_path).map(Some)
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<Config, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: Config = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `config.toml` in `dir`, falling back to stock defaults.
pub fn load_config(dir: &Path) -> Result<Config, ConfigError> {
    resolve_config(stock_defaults_value()?, load_raw_config(dir)?)
}

/// Load config from an explicit file. A missing file is an error.
pub fn load_config_file(path: &Path) -> Result<Config, ConfigError> {
    resolve_config(stock_defaults_value()?, Some(read_raw_config(path)?))
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Simple Imgconv Configuration
# ============================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Command-line flags override anything set here.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Conversion (applied to every file in a batch)
# ---------------------------------------------------------------------------
[conversion]
# Target format: jpeg, png, gif, webp, avif, pdf or ico.
# pdf wraps a JPEG rendition of each image in a one-page A4 document.
format = "jpeg"

# Encoding quality for lossy formats (1 = worst, 100 = best).
quality = 80

# Longer-edge bound in pixels. The larger of the two values wins and each
# defaults to 4096 when unset. Images are never upscaled.
# max_width = 1920
# max_height = 1080

maintain_aspect_ratio = true
strip_metadata = false

# ---------------------------------------------------------------------------
# Output
# ---------------------------------------------------------------------------
[output]
# One converted file is written as-is; two or more go into
# converted_images.zip inside this directory.
dir = "converted"

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel workers (used while building archives).
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_matches_request_defaults() {
        let config = Config::default();
        assert_eq!(config.conversion.format, OutputFormat::Jpeg);
        assert_eq!(config.conversion.quality, 80);
        assert_eq!(config.conversion.max_width, None);
        assert!(config.conversion.maintain_aspect_ratio);
        assert!(!config.conversion.strip_metadata);
        assert_eq!(config.output.dir, "converted");
        assert_eq!(config.conversion.to_request(), ConversionRequest::default());
    }

    #[test]
    fn parse_partial_config() {
        let config: Config = toml::from_str(
            r#"
[conversion]
format = "webp"
max_width = 800
"#,
        )
        .unwrap();
        assert_eq!(config.conversion.format, OutputFormat::WebP);
        assert_eq!(config.conversion.max_width, Some(800));
        // Unspecified values keep defaults
        assert_eq!(config.conversion.quality, 80);
        assert_eq!(config.output.dir, "converted");
    }

    // =========================================================================
    // load_config tests
    // =========================================================================

    #[test]
    fn load_config_returns_default_when_no_file() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn load_config_reads_file() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("config.toml"),
            r#"
[conversion]
format = "pdf"
quality = 65

[output]
dir = "out"
"#,
        )
        .unwrap();

        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.conversion.format, OutputFormat::Pdf);
        assert_eq!(config.conversion.quality, 65);
        assert_eq!(config.output.dir, "out");
        assert_eq!(config.processing.max_processes, None);
    }

    #[test]
    fn load_config_invalid_toml_is_error() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("config.toml"), "this is not valid toml [[[").unwrap();

        let result = load_config(tmp.path());
        assert!(matches!(result, Err(ConfigError::Toml(_))));
    }

    #[test]
    fn load_config_file_requires_existing_file() {
        let tmp = TempDir::new().unwrap();
        let result = load_config_file(&tmp.path().join("missing.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn load_config_file_reads_any_name() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("batch.toml");
        fs::write(&path, "[conversion]\nformat = \"ico\"\n").unwrap();

        let config = load_config_file(&path).unwrap();
        assert_eq!(config.conversion.format, OutputFormat::Ico);
    }

    #[test]
    fn unknown_format_is_rejected() {
        let result: Result<Config, _> = toml::from_str("[conversion]\nformat = \"bmp\"\n");
        assert!(result.is_err());
    }

    // =========================================================================
    // merge_toml tests
    // =========================================================================

    #[test]
    fn merge_toml_scalar_override() {
        let base: toml::Value = toml::from_str(r#"quality = 80"#).unwrap();
        let overlay: toml::Value = toml::from_str(r#"quality = 60"#).unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged.get("quality").unwrap().as_integer(), Some(60));
    }

    #[test]
    fn merge_toml_table_merge() {
        let base: toml::Value = toml::from_str(
            r#"
[conversion]
format = "jpeg"
quality = 80
"#,
        )
        .unwrap();
        let overlay: toml::Value = toml::from_str(
            r#"
[conversion]
quality = 70
"#,
        )
        .unwrap();
        let merged = merge_toml(base, overlay);
        let conversion = merged.get("conversion").unwrap();
        assert_eq!(conversion.get("quality").unwrap().as_integer(), Some(70));
        // format preserved from base
        assert_eq!(conversion.get("format").unwrap().as_str(), Some("jpeg"));
    }

    #[test]
    fn merge_toml_preserves_base_keys() {
        let base: toml::Value = toml::from_str(
            r#"
a = 1
b = 2
"#,
        )
        .unwrap();
        let overlay: toml::Value = toml::from_str(r#"a = 10"#).unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged.get("a").unwrap().as_integer(), Some(10));
        assert_eq!(merged.get("b").unwrap().as_integer(), Some(2));
    }

    // =========================================================================
    // Unknown key rejection tests
    // =========================================================================

    #[test]
    fn unknown_key_rejected() {
        let result: Result<Config, _> = toml::from_str("[conversion]\nqualty = 90\n");
        let err = result.unwrap_err().to_string();
        assert!(err.contains("unknown field"));
    }

    #[test]
    fn unknown_section_rejected() {
        let result: Result<Config, _> = toml::from_str("[conversoin]\nquality = 90\n");
        assert!(result.is_err());
    }

    #[test]
    fn unknown_key_rejected_via_load_config() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("config.toml"), "[output]\ndirectory = \"x\"\n").unwrap();
        assert!(load_config(tmp.path()).is_err());
    }

    // =========================================================================
    // Validation tests
    // =========================================================================

    #[test]
    fn validate_quality_bounds() {
        let mut config = Config::default();
        config.conversion.quality = 1;
        assert!(config.validate().is_ok());
        config.conversion.quality = 100;
        assert!(config.validate().is_ok());

        config.conversion.quality = 0;
        assert!(config.validate().is_err());
        config.conversion.quality = 101;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("quality"));
    }

    #[test]
    fn validate_zero_dimensions() {
        let mut config = Config::default();
        config.conversion.max_width = Some(0);
        assert!(config.validate().is_err());

        config.conversion.max_width = None;
        config.conversion.max_height = Some(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_empty_output_dir() {
        let mut config = Config::default();
        config.output.dir = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_zero_processes() {
        let mut config = Config::default();
        config.processing.max_processes = Some(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn load_config_validates_values() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("config.toml"), "[conversion]\nquality = 200\n").unwrap();

        let result = load_config(tmp.path());
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    // =========================================================================
    // Overrides
    // =========================================================================

    #[test]
    fn overrides_replace_config_values() {
        let config = ConversionConfig {
            format: OutputFormat::Png,
            quality: 90,
            max_width: Some(1000),
            max_height: None,
            maintain_aspect_ratio: true,
            strip_metadata: false,
        };
        let overrides = ConversionOverrides {
            format: Some(OutputFormat::Avif),
            quality: Some(40),
            max_height: Some(500),
            no_aspect_ratio: true,
            strip_metadata: true,
            ..ConversionOverrides::default()
        };

        let merged = config.with_overrides(&overrides).unwrap();
        assert_eq!(merged.format, OutputFormat::Avif);
        assert_eq!(merged.quality, 40);
        // Unset override keeps the config value
        assert_eq!(merged.max_width, Some(1000));
        assert_eq!(merged.max_height, Some(500));
        assert!(!merged.maintain_aspect_ratio);
        assert!(merged.strip_metadata);
    }

    #[test]
    fn empty_overrides_keep_config() {
        let config = ConversionConfig::default();
        let merged = config.with_overrides(&ConversionOverrides::default()).unwrap();
        assert_eq!(merged, config);
    }

    #[test]
    fn invalid_override_is_rejected() {
        let overrides = ConversionOverrides {
            quality: Some(0),
            ..ConversionOverrides::default()
        };
        let result = ConversionConfig::default().with_overrides(&overrides);
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn to_request_carries_every_field() {
        let config = ConversionConfig {
            format: OutputFormat::Gif,
            quality: 33,
            max_width: Some(100),
            max_height: Some(50),
            maintain_aspect_ratio: false,
            strip_metadata: true,
        };
        let request = config.to_request();
        assert_eq!(request.format, OutputFormat::Gif);
        assert_eq!(request.quality, Quality::new(33));
        assert_eq!(request.max_dimension(), 100);
        assert!(!request.maintain_aspect_ratio);
        assert!(request.strip_metadata);
    }

    // =========================================================================
    // Processing
    // =========================================================================

    #[test]
    fn effective_threads_auto() {
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        assert_eq!(effective_threads(&ProcessingConfig::default()), cores);
    }

    #[test]
    fn effective_threads_clamped_to_cores() {
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        let config = ProcessingConfig {
            max_processes: Some(cores + 100),
        };
        assert_eq!(effective_threads(&config), cores);
    }

    #[test]
    fn effective_threads_user_constrains_down() {
        let config = ProcessingConfig {
            max_processes: Some(1),
        };
        assert_eq!(effective_threads(&config), 1);
    }

    // =========================================================================
    // resolve_config / stock config
    // =========================================================================

    #[test]
    fn resolve_config_with_overlay() {
        let overlay: toml::Value = toml::from_str("[processing]\nmax_processes = 2\n").unwrap();
        let config = resolve_config(stock_defaults_value().unwrap(), Some(overlay)).unwrap();
        assert_eq!(config.processing.max_processes, Some(2));
        assert_eq!(config.conversion, ConversionConfig::default());
    }

    #[test]
    fn stock_defaults_value_has_all_sections() {
        let val = stock_defaults_value().unwrap();
        assert!(val.get("conversion").is_some());
        assert!(val.get("output").is_some());
        assert!(val.get("processing").is_some());
    }

    #[test]
    fn stock_config_toml_roundtrips_to_defaults() {
        let config: Config = toml::from_str(stock_config_toml()).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn stock_config_toml_contains_all_sections() {
        let content = stock_config_toml();
        assert!(content.contains("[conversion]"));
        assert!(content.contains("[output]"));
        assert!(content.contains("[processing]"));
    }
}
