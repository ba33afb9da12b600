//! Batch controller: an ordered list of items and the run that converts them.
//!
//! ## Item lifecycle
//!
//! ```text
//! Pending ──▶ Processing ──▶ Complete(output)
//!                       └──▶ Error(message)
//! ```
//!
//! Transitions only move forward within a run. A terminal item is never put
//! back into `Processing`: starting a new run replaces each terminal item
//! with a fresh `Pending` one (new id, same source, same position).
//!
//! ## Run
//!
//! Items are converted strictly one after another, in insertion order. An
//! item already `Processing` is skipped. One failure never stops the run.
//! Afterwards the successes, still in insertion order, decide the result:
//!
//! | Successes | Result |
//! |---|---|
//! | 0 | [`BatchResult::NothingConverted`] |
//! | 1 | [`BatchResult::Single`], named by the naming rule |
//! | >1 | [`BatchResult::Archive`] named `converted_images.zip` |
//!
//! Only a failure while building the archive fails the run as a whole.
//!
//! ## Observers and cancellation
//!
//! Progress goes out as [`BatchEvent`]s on an optional channel. An optional
//! cancel flag is checked between items, never during one; items not yet
//! attempted stay `Pending`.

use crate::archive::{ArchiveBuilder, ArchiveError, MemberNames};
use crate::naming::{ARCHIVE_NAME, generate_file_name};
use crate::pipeline::{ConversionOutput, ConversionRequest, Pipeline};
use crate::source::SourceFile;
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum BatchError {
    #[error("Packing failed: {0}")]
    Packing(#[from] ArchiveError),
}

/// Stable identifier of a batch item.
pub type ItemId = u64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemStatus {
    Pending,
    Processing,
    Complete(ConversionOutput),
    Error(String),
}

impl ItemStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ItemStatus::Complete(_) | ItemStatus::Error(_))
    }

    pub fn label(&self) -> &'static str {
        match self {
            ItemStatus::Pending => "pending",
            ItemStatus::Processing => "processing",
            ItemStatus::Complete(_) => "complete",
            ItemStatus::Error(_) => "error",
        }
    }
}

#[derive(Debug, Clone)]
pub struct BatchItem {
    id: ItemId,
    source: SourceFile,
    status: ItemStatus,
}

impl BatchItem {
    fn new(id: ItemId, source: SourceFile) -> Self {
        Self {
            id,
            source,
            status: ItemStatus::Pending,
        }
    }

    pub fn id(&self) -> ItemId {
        self.id
    }

    pub fn source(&self) -> &SourceFile {
        &self.source
    }

    pub fn status(&self) -> &ItemStatus {
        &self.status
    }

    pub fn output(&self) -> Option<&ConversionOutput> {
        match &self.status {
            ItemStatus::Complete(output) => Some(output),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.status {
            ItemStatus::Error(message) => Some(message),
            _ => None,
        }
    }
}

/// Per-status item counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub pending: usize,
    pub processing: usize,
    pub complete: usize,
    pub error: usize,
}

/// Progress notifications emitted during a run.
#[derive(Debug, Clone, PartialEq)]
pub enum BatchEvent {
    /// The item is now `Processing`; its conversion is about to start.
    ItemStarted {
        index: usize,
        id: ItemId,
        name: String,
    },
    ItemCompleted {
        index: usize,
        id: ItemId,
        name: String,
        output_name: String,
        bytes: usize,
    },
    ItemFailed {
        index: usize,
        id: ItemId,
        name: String,
        error: String,
    },
    /// The item was already `Processing` when the run reached it.
    ItemSkipped {
        index: usize,
        id: ItemId,
        name: String,
    },
    Cancelled {
        remaining: usize,
    },
    Finished {
        converted: usize,
        failed: usize,
    },
}

/// What a run delivers.
#[derive(Debug, Clone, PartialEq)]
pub enum BatchResult {
    NothingConverted,
    Single {
        name: String,
        output: ConversionOutput,
    },
    Archive {
        name: String,
        bytes: Vec<u8>,
        /// Member names in archive order: the naming rule, with repeats
        /// suffixed `-2`, `-3`, …
        entries: Vec<String>,
    },
}

impl BatchResult {
    /// Delivery file name, if anything is delivered.
    pub fn file_name(&self) -> Option<&str> {
        match self {
            BatchResult::NothingConverted => None,
            BatchResult::Single { name, .. } | BatchResult::Archive { name, .. } => Some(name),
        }
    }

    pub fn bytes(&self) -> Option<&[u8]> {
        match self {
            BatchResult::NothingConverted => None,
            BatchResult::Single { output, .. } => Some(&output.bytes),
            BatchResult::Archive { bytes, .. } => Some(bytes),
        }
    }

    pub fn media_type(&self) -> Option<&'static str> {
        match self {
            BatchResult::NothingConverted => None,
            BatchResult::Single { output, .. } => Some(output.media_type()),
            BatchResult::Archive { .. } => Some("application/zip"),
        }
    }
}

/// Ordered collection of items, owned by the controller.
#[derive(Debug, Default)]
pub struct Batch {
    items: Vec<BatchItem>,
    next_id: ItemId,
}

impl Batch {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate_id(&mut self) -> ItemId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Append a source as a new `Pending` item.
    pub fn add(&mut self, source: SourceFile) -> ItemId {
        let id = self.allocate_id();
        self.items.push(BatchItem::new(id, source));
        id
    }

    pub fn extend(&mut self, sources: impl IntoIterator<Item = SourceFile>) -> Vec<ItemId> {
        sources.into_iter().map(|s| self.add(s)).collect()
    }

    /// Remove an item, keeping the order of the rest.
    pub fn remove(&mut self, id: ItemId) -> Option<BatchItem> {
        let pos = self.items.iter().position(|item| item.id == id)?;
        Some(self.items.remove(pos))
    }

    pub fn get(&self, id: ItemId) -> Option<&BatchItem> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn items(&self) -> &[BatchItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Mark a `Pending` item as in flight elsewhere; runs will skip it.
    ///
    /// Returns false if the item is unknown or not `Pending`.
    pub fn mark_processing(&mut self, id: ItemId) -> bool {
        match self.items.iter_mut().find(|item| item.id == id) {
            Some(item) if item.status == ItemStatus::Pending => {
                item.status = ItemStatus::Processing;
                true
            }
            _ => false,
        }
    }

    pub fn summary(&self) -> BatchSummary {
        let mut summary = BatchSummary::default();
        for item in &self.items {
            match item.status {
                ItemStatus::Pending => summary.pending += 1,
                ItemStatus::Processing => summary.processing += 1,
                ItemStatus::Complete(_) => summary.complete += 1,
                ItemStatus::Error(_) => summary.error += 1,
            }
        }
        summary
    }

    /// Replace every terminal item with a fresh `Pending` item in place.
    fn renew_terminal_items(&mut self) {
        for index in 0..self.items.len() {
            if self.items[index].status.is_terminal() {
                let id = self.allocate_id();
                let source = self.items[index].source.clone();
                self.items[index] = BatchItem::new(id, source);
            }
        }
    }
}

/// Runs batches against one pipeline and archive builder.
pub struct BatchRunner<'a> {
    pipeline: &'a Pipeline<'a>,
    archiver: &'a dyn ArchiveBuilder,
    events: Option<Sender<BatchEvent>>,
    cancel: Option<Arc<AtomicBool>>,
}

impl<'a> BatchRunner<'a> {
    pub fn new(pipeline: &'a Pipeline<'a>, archiver: &'a dyn ArchiveBuilder) -> Self {
        Self {
            pipeline,
            archiver,
            events: None,
            cancel: None,
        }
    }

    pub fn with_events(mut self, events: Sender<BatchEvent>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn with_cancel(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    fn emit(&self, event: BatchEvent) {
        if let Some(tx) = &self.events {
            // A gone receiver only means nobody is watching
            let _ = tx.send(event);
        }
    }

    fn cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::SeqCst))
    }

    /// Convert every eligible item in order and assemble the result.
    pub fn run(
        &self,
        batch: &mut Batch,
        request: &ConversionRequest,
    ) -> Result<BatchResult, BatchError> {
        batch.renew_terminal_items();
        info!(items = batch.len(), format = %request.format, "batch started");

        let mut successes: Vec<(usize, String)> = Vec::new();
        let mut names = MemberNames::new();
        let mut failed = 0;

        for index in 0..batch.items.len() {
            if self.cancelled() {
                let remaining = batch.items[index..]
                    .iter()
                    .filter(|item| item.status == ItemStatus::Pending)
                    .count();
                info!(remaining, "batch cancelled");
                self.emit(BatchEvent::Cancelled { remaining });
                break;
            }

            let item = &mut batch.items[index];
            let (id, name) = (item.id, item.source.name().to_string());
            if item.status == ItemStatus::Processing {
                self.emit(BatchEvent::ItemSkipped { index, id, name });
                continue;
            }

            item.status = ItemStatus::Processing;
            self.emit(BatchEvent::ItemStarted {
                index,
                id,
                name: name.clone(),
            });

            let source = &item.source;
            match self
                .pipeline
                .convert(source.bytes(), source.media_type(), request)
            {
                Ok(output) => {
                    let output_name = names.claim(&generate_file_name(&name, output.format));
                    self.emit(BatchEvent::ItemCompleted {
                        index,
                        id,
                        name,
                        output_name: output_name.clone(),
                        bytes: output.bytes.len(),
                    });
                    item.status = ItemStatus::Complete(output);
                    successes.push((index, output_name));
                }
                Err(e) => {
                    let error = e.to_string();
                    warn!(item = %name, %error, "conversion failed");
                    item.status = ItemStatus::Error(error.clone());
                    self.emit(BatchEvent::ItemFailed {
                        index,
                        id,
                        name,
                        error,
                    });
                    failed += 1;
                }
            }
        }

        self.emit(BatchEvent::Finished {
            converted: successes.len(),
            failed,
        });
        info!(converted = successes.len(), failed, "batch finished");

        let outputs: Vec<(String, &ConversionOutput)> = successes
            .iter()
            .filter_map(|(index, output_name)| {
                batch.items[*index]
                    .output()
                    .map(|output| (output_name.clone(), output))
            })
            .collect();

        match outputs.as_slice() {
            [] => Ok(BatchResult::NothingConverted),
            [(name, output)] => Ok(BatchResult::Single {
                name: name.clone(),
                output: (*output).clone(),
            }),
            many => {
                let entries: Vec<(String, Vec<u8>)> = many
                    .iter()
                    .map(|(name, output)| (name.clone(), output.bytes.clone()))
                    .collect();
                let bytes = self.archiver.build(&entries)?;
                Ok(BatchResult::Archive {
                    name: ARCHIVE_NAME.to_string(),
                    bytes,
                    entries: entries.into_iter().map(|(name, _)| name).collect(),
                })
            }
        }
    }
}
