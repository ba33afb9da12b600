//! CLI output formatting for acceptance, batch progress and delivery.
//!
//! # Output Format
//!
//! ## Convert
//!
//! ```text
//! Rejected
//!     notes.txt: rejected: unsupported file type
//!
//! 001 beach.heic
//!     → beach_converted.jpg (412 KB)
//! 002 scan.png
//!     Error: Conversion failed: Processing failed: ...
//! 003 logo.gif
//!     → logo_converted.jpg (18 KB)
//!
//! Converted 2 of 3 files, 1 failed
//! Saved converted/converted_images.zip (2 files, 430 KB)
//!     beach_converted.jpg
//!     logo_converted.jpg
//! ```
//!
//! ## Check
//!
//! ```text
//! Accepted
//! 001 beach.heic (image/heic, 2.1 MB)
//!
//! Rejected
//!     notes.txt: rejected: unsupported file type
//! ```
//!
//! # Architecture
//!
//! Each display has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure: no I/O, no side effects.

use crate::batch::{BatchEvent, BatchResult, BatchSummary};
use crate::deliver::Delivery;
use crate::format::{InputType, OutputFormat};
use crate::imaging::HeifTranscoder;
use crate::pipeline::ConversionError;
use crate::source::{SourceFile, format_size};
use serde::Serialize;

// ============================================================================
// Shared helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{} {}", n, word)
    } else {
        format!("{} {}s", n, word)
    }
}

// ============================================================================
// Acceptance
// ============================================================================

/// Format rejected files as a titled block. Empty input gives no lines.
pub fn format_rejections(rejections: &[ConversionError]) -> Vec<String> {
    if rejections.is_empty() {
        return Vec::new();
    }
    let mut lines = vec!["Rejected".to_string()];
    lines.extend(rejections.iter().map(|e| format!("{}{}", indent(1), e)));
    lines
}

pub fn print_rejections(rejections: &[ConversionError]) {
    for line in format_rejections(rejections) {
        println!("{}", line);
    }
}

/// Format the `check` command result.
pub fn format_check(accepted: &[SourceFile], rejections: &[ConversionError]) -> Vec<String> {
    let mut lines = Vec::new();
    if !accepted.is_empty() {
        lines.push("Accepted".to_string());
        for (i, source) in accepted.iter().enumerate() {
            lines.push(format!(
                "{} {} ({}, {})",
                format_index(i + 1),
                source.name(),
                source.media_type(),
                format_size(source.len() as u64)
            ));
        }
    }
    let rejected = format_rejections(rejections);
    if !lines.is_empty() && !rejected.is_empty() {
        lines.push(String::new());
    }
    lines.extend(rejected);
    if lines.is_empty() {
        lines.push("No files given".to_string());
    }
    lines
}

pub fn print_check(accepted: &[SourceFile], rejections: &[ConversionError]) {
    for line in format_check(accepted, rejections) {
        println!("{}", line);
    }
}

// ============================================================================
// Batch progress
// ============================================================================

/// Format a single batch progress event as display lines.
///
/// Each item leads with its positional index and name; the outcome follows
/// as an indented context line.
pub fn format_batch_event(event: &BatchEvent) -> Vec<String> {
    match event {
        BatchEvent::ItemStarted { index, name, .. } => {
            vec![format!("{} {}", format_index(index + 1), name)]
        }
        BatchEvent::ItemCompleted {
            output_name, bytes, ..
        } => vec![format!(
            "{}\u{2192} {} ({})",
            indent(1),
            output_name,
            format_size(*bytes as u64)
        )],
        BatchEvent::ItemFailed { error, .. } => {
            vec![format!("{}Error: {}", indent(1), error)]
        }
        BatchEvent::ItemSkipped { index, name, .. } => vec![
            format!("{} {}", format_index(index + 1), name),
            format!("{}skipped (already processing)", indent(1)),
        ],
        BatchEvent::Cancelled { remaining } => vec![format!(
            "Cancelled: {} not converted",
            plural(*remaining, "file")
        )],
        BatchEvent::Finished { converted, failed } => {
            let attempted = converted + failed;
            let mut line = format!(
                "Converted {} of {}",
                converted,
                plural(attempted, "file")
            );
            if *failed > 0 {
                line.push_str(&format!(", {} failed", failed));
            }
            vec![String::new(), line]
        }
    }
}

// ============================================================================
// Delivery
// ============================================================================

/// Format the delivered result of a run.
pub fn format_delivery(result: &BatchResult, delivery: Option<&Delivery>) -> Vec<String> {
    let Some(delivery) = delivery else {
        return vec!["Nothing converted".to_string()];
    };
    let path = delivery.path.display();
    let size = format_size(delivery.bytes as u64);
    match result {
        BatchResult::NothingConverted => vec!["Nothing converted".to_string()],
        BatchResult::Single { .. } => {
            vec![format!("Saved {} ({}, {})", path, delivery.media_type, size)]
        }
        BatchResult::Archive { entries, .. } => {
            let mut lines = vec![format!(
                "Saved {} ({}, {})",
                path,
                plural(entries.len(), "file"),
                size
            )];
            lines.extend(entries.iter().map(|e| format!("{}{}", indent(1), e)));
            lines
        }
    }
}

pub fn print_delivery(result: &BatchResult, delivery: Option<&Delivery>) {
    for line in format_delivery(result, delivery) {
        println!("{}", line);
    }
}

// ============================================================================
// Formats
// ============================================================================

/// Format the supported input and output formats table.
pub fn format_formats() -> Vec<String> {
    let mut lines = vec!["Input".to_string()];
    for input in InputType::ALL {
        let mut line = format!(
            "{}{:<12} .{}",
            indent(1),
            input.media_type(),
            input.file_extensions().join(", .")
        );
        if input == InputType::Heic && !HeifTranscoder::available() {
            line.push_str(" (needs the heic feature)");
        }
        lines.push(line);
    }
    lines.push(String::new());
    lines.push("Output".to_string());
    for output in OutputFormat::ALL {
        lines.push(format!(
            "{}{:<6} .{:<5} {}",
            indent(1),
            output.name(),
            output.extension(),
            output.media_type()
        ));
    }
    lines
}

pub fn print_formats() {
    for line in format_formats() {
        println!("{}", line);
    }
}

// ============================================================================
// Machine-readable report
// ============================================================================

/// End-of-run report for `--json`.
#[derive(Debug, Serialize)]
pub struct RunReport<'a> {
    pub summary: BatchSummary,
    pub delivered: Option<&'a Delivery>,
    pub rejected: Vec<String>,
}

impl<'a> RunReport<'a> {
    pub fn new(
        summary: BatchSummary,
        delivered: Option<&'a Delivery>,
        rejections: &[ConversionError],
    ) -> Self {
        Self {
            summary,
            delivered,
            rejected: rejections.iter().map(|e| e.to_string()).collect(),
        }
    }
}

pub fn format_json_report(report: &RunReport) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(report)
}
