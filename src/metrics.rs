use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters describing corpus pass activity.
#[derive(Default)]
pub struct CorpusMetrics {
    passes_completed: AtomicU64,
    documents_summarized: AtomicU64,
    documents_skipped: AtomicU64,
    chunks_processed: AtomicU64,
    chunk_failures: AtomicU64,
    questions_answered: AtomicU64,
}

impl CorpusMetrics {
    /// Create an empty metrics accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a completed corpus pass.
    pub fn record_pass(&self) {
        self.passes_completed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a summarized document and its chunk counters.
    pub fn record_document(&self, chunk_count: u64, failed_chunks: u64) {
        self.documents_summarized.fetch_add(1, Ordering::Relaxed);
        self.chunks_processed
            .fetch_add(chunk_count, Ordering::Relaxed);
        self.chunk_failures
            .fetch_add(failed_chunks, Ordering::Relaxed);
    }

    /// Record a file skipped due to unsupported format or failed extraction.
    pub fn record_skipped(&self) {
        self.documents_skipped.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an answered question, with per-chunk counters from the QA path.
    pub fn record_question(&self, chunk_count: u64, failed_chunks: u64) {
        self.questions_answered.fetch_add(1, Ordering::Relaxed);
        self.chunks_processed
            .fetch_add(chunk_count, Ordering::Relaxed);
        self.chunk_failures
            .fetch_add(failed_chunks, Ordering::Relaxed);
    }

    /// Return a snapshot of the current counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            passes_completed: self.passes_completed.load(Ordering::Relaxed),
            documents_summarized: self.documents_summarized.load(Ordering::Relaxed),
            documents_skipped: self.documents_skipped.load(Ordering::Relaxed),
            chunks_processed: self.chunks_processed.load(Ordering::Relaxed),
            chunk_failures: self.chunk_failures.load(Ordering::Relaxed),
            questions_answered: self.questions_answered.load(Ordering::Relaxed),
        }
    }
}

/// Immutable view of pass counters used for reporting.
#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct MetricsSnapshot {
    /// Number of corpus passes completed since startup.
    pub passes_completed: u64,
    /// Number of documents that produced a summary.
    pub documents_summarized: u64,
    /// Number of files skipped (unsupported format, failed or empty extraction).
    pub documents_skipped: u64,
    /// Total chunk count sent to the inference backend.
    pub chunks_processed: u64,
    /// Chunk-level inference failures absorbed by the pipeline.
    pub chunk_failures: u64,
    /// Number of questions answered through the QA path.
    pub questions_answered: u64,
}
