//! Core data types and error definitions for the processing pipeline.

use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors produced while splitting raw text into fixed windows.
#[derive(Debug, Error)]
pub enum ChunkingError {
    /// Caller configured an impossible window size.
    #[error("chunk size must be greater than zero")]
    InvalidChunkSize,
}

/// Errors that cross the corpus pass boundary.
///
/// Per-file and per-chunk failures are absorbed inside the pass; only the
/// preconditions below surface to the caller.
#[derive(Debug, Error)]
pub enum PassError {
    /// Corpus root is missing or unreadable; the pass fails before any
    /// progress event is emitted.
    #[error("corpus root '{path}' is not readable: {source}")]
    RootUnreadable {
        /// Configured corpus root that failed the precondition check.
        path: String,
        /// Underlying filesystem error.
        #[source]
        source: std::io::Error,
    },
    /// A pass is already running; concurrent passes are rejected, not queued.
    #[error("a corpus pass is already running")]
    AlreadyRunning,
}

/// A contiguous, bounded-length slice of a document's extracted text.
///
/// Invariant: concatenating all chunks of a document in index order
/// reproduces the input exactly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// 0-based contiguous position within the parent document.
    pub index: usize,
    /// Chunk text content.
    pub text: String,
}

/// The kind of inference performed on a chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkKind {
    /// Summarization output.
    Summary,
    /// Extractive question-answering output.
    Answer,
}

/// Result of one inference call over one chunk.
///
/// Failed summary chunks carry the fixed sentinel text rather than being
/// absent, so aggregation never silently skips a failure.
#[derive(Debug, Clone)]
pub struct ChunkOutcome {
    /// Index of the chunk this outcome belongs to.
    pub index: usize,
    /// Which inference path produced the outcome.
    pub kind: ChunkKind,
    /// Output text, or the sentinel for failed summary chunks.
    pub text: String,
    /// Whether the backend call succeeded.
    pub succeeded: bool,
}

/// Aggregated summary for a single document.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentSummary {
    /// File name the summary was produced for.
    pub document_name: String,
    /// Space-joined, order-preserving concatenation of chunk outcomes.
    pub summary_text: String,
}

/// Progress record emitted once per file as a corpus pass advances.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressEvent {
    /// File the event refers to.
    #[serde(rename = "file")]
    pub file_name: String,
    /// 1-based position within the pass, strictly increasing.
    pub current: usize,
    /// Total number of files discovered for the pass.
    pub total: usize,
}

/// Immutable snapshot of the last completed corpus pass.
///
/// Replaced wholesale: reset to empty at pass start, installed in full at
/// pass completion. Readers never observe a partially updated snapshot.
#[derive(Debug, Default)]
pub struct CorpusSnapshot {
    /// Extracted text of every supported document, each followed by a newline.
    pub combined_text: String,
    /// Per-file summaries keyed by file name.
    pub file_summaries: BTreeMap<String, DocumentSummary>,
}

/// Summary of a completed corpus pass returned to the caller.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct PassOutcome {
    /// Number of files discovered under the corpus root.
    pub total_files: usize,
    /// Number of documents that produced a summary.
    pub documents_summarized: usize,
    /// Number of files skipped (unsupported, failed, or empty extraction).
    pub documents_skipped: usize,
}
