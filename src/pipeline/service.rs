//! Pipeline service coordinating extraction, chunking, inference, progress,
//! and job state.
//!
//! The service owns the inference client, the job state handle, the progress
//! reporter, and the metrics registry so that the HTTP surface and the CLI
//! mode reuse the same components. Construct it once near process start and
//! share it through an `Arc`.
//!
//! Failure containment mirrors the error taxonomy: chunk-level inference
//! failures are absorbed per chunk (summaries substitute a sentinel, answers
//! drop the contribution), file-level extraction failures skip the file, and
//! only a missing corpus root or a concurrent pass surface as errors.

use crate::{
    config::{Config, get_config},
    extract::{DocumentFormat, ExtractionStatus},
    inference::{InferenceClient, InferenceClientError, build_inference_client},
    metrics::{CorpusMetrics, MetricsSnapshot},
    pipeline::{
        chunking::chunk_text,
        corpus,
        types::{
            Chunk, ChunkKind, ChunkOutcome, CorpusSnapshot, DocumentSummary, PassError,
            PassOutcome, ProgressEvent,
        },
    },
    progress::ProgressReporter,
    state::JobState,
};
use async_trait::async_trait;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, broadcast};

/// Fixed placeholder substituted for a chunk whose summarization failed.
///
/// Aggregation must mark failed chunks visibly instead of skipping them.
pub const SUMMARY_FAILURE_SENTINEL: &str = "Error summarizing this part of the document.";

const DEFAULT_CHUNK_SIZE: usize = 512;
const DEFAULT_SUMMARY_TARGET_WORDS: usize = 50;
const DEFAULT_SUMMARY_MIN_WORDS: usize = 20;
const DEFAULT_ANSWER_MAX_CHARS: usize = 50;
const DEFAULT_INFERENCE_TIMEOUT: Duration = Duration::from_secs(30);

/// Tunables for chunking and inference aggregation.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    /// Chunk window size in characters.
    pub chunk_size: usize,
    /// Upper word budget requested from the summarizer.
    pub summary_target_words: usize,
    /// Lower word budget requested from the summarizer.
    pub summary_min_words: usize,
    /// Per-chunk answer truncation in characters.
    pub answer_max_chars: usize,
    /// Budget for a single inference call.
    pub inference_timeout: Duration,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            summary_target_words: DEFAULT_SUMMARY_TARGET_WORDS,
            summary_min_words: DEFAULT_SUMMARY_MIN_WORDS,
            answer_max_chars: DEFAULT_ANSWER_MAX_CHARS,
            inference_timeout: DEFAULT_INFERENCE_TIMEOUT,
        }
    }
}

impl PipelineSettings {
    /// Build settings from configuration, applying defaults for unset values.
    pub fn from_config(config: &Config) -> Self {
        let defaults = Self::default();
        Self {
            chunk_size: config.chunk_size.unwrap_or(defaults.chunk_size),
            summary_target_words: config
                .summary_target_words
                .unwrap_or(defaults.summary_target_words),
            summary_min_words: config
                .summary_min_words
                .unwrap_or(defaults.summary_min_words),
            answer_max_chars: config.answer_max_chars.unwrap_or(defaults.answer_max_chars),
            inference_timeout: config
                .inference_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.inference_timeout),
        }
    }
}

/// Abstraction over the pipeline used by external surfaces (HTTP, CLI).
#[async_trait]
pub trait PipelineApi: Send + Sync {
    /// Run one full corpus pass, replacing the job state snapshot.
    async fn run_pass(&self) -> Result<PassOutcome, PassError>;

    /// Answer a question against the current combined text.
    ///
    /// Returns `None` without invoking the backend when no pass has produced
    /// any text yet.
    async fn ask(&self, question: &str) -> Option<String>;

    /// Current job state snapshot.
    fn snapshot(&self) -> Arc<CorpusSnapshot>;

    /// Register a progress observer for subsequent pass events.
    fn subscribe_progress(&self) -> broadcast::Receiver<ProgressEvent>;

    /// Retrieve the current metrics snapshot for diagnostics.
    fn metrics_snapshot(&self) -> MetricsSnapshot;
}

/// Coordinates the full pipeline: corpus walk, extraction, chunked inference,
/// progress, and job state replacement.
pub struct PipelineService {
    inference: Box<dyn InferenceClient>,
    settings: PipelineSettings,
    corpus_root: PathBuf,
    state: JobState,
    reporter: ProgressReporter,
    metrics: Arc<CorpusMetrics>,
    pass_guard: Mutex<()>,
}

impl PipelineService {
    /// Build a pipeline service from explicit parts.
    pub fn new(
        corpus_root: PathBuf,
        inference: Box<dyn InferenceClient>,
        mut settings: PipelineSettings,
    ) -> Self {
        // The chunk window is normalized here so chunking cannot fail later.
        settings.chunk_size = settings.chunk_size.max(1);
        Self {
            inference,
            settings,
            corpus_root,
            state: JobState::new(),
            reporter: ProgressReporter::new(),
            metrics: Arc::new(CorpusMetrics::new()),
            pass_guard: Mutex::new(()),
        }
    }

    /// Build a pipeline service from the process configuration.
    pub fn from_config() -> Self {
        let config = get_config();
        tracing::info!(root = %config.corpus_root, "Initializing pipeline service");
        Self::new(
            PathBuf::from(&config.corpus_root),
            build_inference_client(),
            PipelineSettings::from_config(config),
        )
    }

    /// Summarize a document chunk by chunk, never failing outright.
    ///
    /// Chunk order is preserved; failed chunks contribute the sentinel.
    pub async fn summarize_document(&self, text: &str) -> String {
        let outcomes = self.summarize_outcomes(text).await;
        join_contributions(outcomes.iter().map(|outcome| outcome.text.as_str()))
    }

    async fn summarize_outcomes(&self, text: &str) -> Vec<ChunkOutcome> {
        let Ok(chunks) = chunk_text(text, self.settings.chunk_size) else {
            // The window size is normalized to >= 1 at construction.
            return Vec::new();
        };

        let mut outcomes = Vec::with_capacity(chunks.len());
        for chunk in chunks {
            outcomes.push(self.summarize_chunk(chunk).await);
        }
        outcomes
    }

    async fn summarize_chunk(&self, chunk: Chunk) -> ChunkOutcome {
        // Cap the requested summary length by the input length so the
        // backend is never asked for more words than the chunk holds, and
        // keep the minimum below the adjusted maximum.
        let input_words = chunk.text.split_whitespace().count();
        let adjusted_max = self.settings.summary_target_words.min(input_words / 2);
        let adjusted_min = self.settings.summary_min_words.min(adjusted_max / 2);

        let call = self
            .inference
            .summarize(&chunk.text, adjusted_max, adjusted_min);
        match self.bounded(call).await {
            Ok(summary) => ChunkOutcome {
                index: chunk.index,
                kind: ChunkKind::Summary,
                text: summary,
                succeeded: true,
            },
            Err(error) => {
                tracing::warn!(
                    chunk = chunk.index,
                    %error,
                    "Chunk summarization failed; substituting sentinel"
                );
                ChunkOutcome {
                    index: chunk.index,
                    kind: ChunkKind::Summary,
                    text: SUMMARY_FAILURE_SENTINEL.to_string(),
                    succeeded: false,
                }
            }
        }
    }

    /// Answer a question against arbitrary context, chunk by chunk.
    ///
    /// Empty context returns an empty answer without invoking the backend.
    /// Failed chunks contribute nothing (unlike summarization, which inserts
    /// a sentinel); the asymmetry is deliberate and preserved from the
    /// reference behavior.
    pub async fn answer_question(&self, question: &str, context: &str) -> String {
        if context.trim().is_empty() {
            return String::new();
        }

        let Ok(chunks) = chunk_text(context, self.settings.chunk_size) else {
            // The window size is normalized to >= 1 at construction.
            return String::new();
        };

        let mut outcomes = Vec::with_capacity(chunks.len());
        for chunk in chunks {
            let call = self.inference.answer(question, &chunk.text);
            match self.bounded(call).await {
                Ok(answer) => {
                    let truncated: String =
                        answer.chars().take(self.settings.answer_max_chars).collect();
                    outcomes.push(ChunkOutcome {
                        index: chunk.index,
                        kind: ChunkKind::Answer,
                        text: truncated,
                        succeeded: true,
                    });
                }
                Err(error) => {
                    tracing::warn!(
                        chunk = chunk.index,
                        %error,
                        "Chunk answer failed; dropping contribution"
                    );
                    outcomes.push(ChunkOutcome {
                        index: chunk.index,
                        kind: ChunkKind::Answer,
                        text: String::new(),
                        succeeded: false,
                    });
                }
            }
        }

        let failed = outcomes.iter().filter(|outcome| !outcome.succeeded).count();
        self.metrics
            .record_question(outcomes.len() as u64, failed as u64);

        join_contributions(
            outcomes
                .iter()
                .filter(|outcome| outcome.succeeded)
                .map(|outcome| outcome.text.as_str()),
        )
    }

    async fn bounded<F>(&self, call: F) -> Result<String, InferenceClientError>
    where
        F: Future<Output = Result<String, InferenceClientError>>,
    {
        match tokio::time::timeout(self.settings.inference_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(InferenceClientError::TimedOut(
                self.settings.inference_timeout.as_secs(),
            )),
        }
    }
}

fn join_contributions<'a>(parts: impl Iterator<Item = &'a str>) -> String {
    parts.collect::<Vec<_>>().join(" ")
}

#[async_trait]
impl PipelineApi for PipelineService {
    async fn run_pass(&self) -> Result<PassOutcome, PassError> {
        let _guard = self
            .pass_guard
            .try_lock()
            .map_err(|_| PassError::AlreadyRunning)?;

        let files = corpus::discover_files(&self.corpus_root)?;
        let total = files.len();
        tracing::info!(root = %self.corpus_root.display(), total, "Starting corpus pass");

        // Stale data from a prior pass must never mix with the new one.
        self.state.reset();

        let mut snapshot = CorpusSnapshot::default();
        let mut summarized = 0usize;
        let mut skipped = 0usize;

        for (position, path) in files.iter().enumerate() {
            let current = position + 1;
            let document = corpus::load_document(path);

            match (document.format, document.status) {
                (DocumentFormat::Unsupported, _) => {
                    skipped += 1;
                    self.metrics.record_skipped();
                }
                (_, ExtractionStatus::Ok) => {
                    tracing::info!(
                        file = %document.display_name,
                        chars = document.raw_text.len(),
                        "Processing file"
                    );
                    snapshot.combined_text.push_str(&document.raw_text);
                    snapshot.combined_text.push('\n');

                    let outcomes = self.summarize_outcomes(&document.raw_text).await;
                    let failed = outcomes.iter().filter(|outcome| !outcome.succeeded).count();
                    self.metrics
                        .record_document(outcomes.len() as u64, failed as u64);

                    let summary_text =
                        join_contributions(outcomes.iter().map(|outcome| outcome.text.as_str()));
                    tracing::info!(
                        file = %document.display_name,
                        chunks = outcomes.len(),
                        failed,
                        "Summarized file"
                    );
                    snapshot.file_summaries.insert(
                        document.display_name.clone(),
                        DocumentSummary {
                            document_name: document.display_name.clone(),
                            summary_text,
                        },
                    );
                    summarized += 1;
                }
                (_, ExtractionStatus::Empty | ExtractionStatus::Failed) => {
                    skipped += 1;
                    self.metrics.record_skipped();
                    tracing::debug!(
                        file = %document.display_name,
                        status = ?document.status,
                        "No usable text; file skipped"
                    );
                }
            }

            self.reporter.emit(ProgressEvent {
                file_name: document.display_name,
                current,
                total,
            });
        }

        self.state.install(snapshot);
        self.metrics.record_pass();
        tracing::info!(total, summarized, skipped, "Corpus pass completed");

        Ok(PassOutcome {
            total_files: total,
            documents_summarized: summarized,
            documents_skipped: skipped,
        })
    }

    async fn ask(&self, question: &str) -> Option<String> {
        let snapshot = self.state.snapshot();
        if snapshot.combined_text.trim().is_empty() {
            tracing::debug!("Question received before any corpus text was loaded");
            return None;
        }
        Some(
            self.answer_question(question, &snapshot.combined_text)
                .await,
        )
    }

    fn snapshot(&self) -> Arc<CorpusSnapshot> {
        self.state.snapshot()
    }

    fn subscribe_progress(&self) -> broadcast::Receiver<ProgressEvent> {
        self.reporter.subscribe()
    }

    fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}
