//! HTTP surface for Corpus Digest.
//!
//! This module exposes a compact Axum router with a handful of endpoints:
//!
//! - `POST /reload` – Run a full corpus pass: walk the configured root, extract and chunk each
//!   document, summarize it, and replace the job state snapshot. Returns pass counters.
//!   Responds `409 Conflict` while another pass is running.
//! - `POST /ask` – Answer a question against the combined text of the last pass. Returns a
//!   `null` answer (without touching the inference backend) when no corpus text is loaded.
//! - `GET /summaries` – Per-file summaries from the current snapshot.
//! - `GET /progress` – Server-Sent Events stream of per-file progress for running passes.
//! - `GET /metrics` – Observe pass counters and chunk failure totals.
//! - `GET /commands` – Machine-readable command catalog for quick discovery by tools/hosts.
//!
//! The HTTP surface shares the pipeline service with the CLI mode, so behavior is identical
//! across interfaces.

use crate::pipeline::{PassError, PipelineApi};
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{
        IntoResponse, Response,
        sse::{Event, KeepAlive, Sse},
    },
    routing::{get, post},
};
use futures_core::Stream;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;
use std::convert::Infallible;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Build the HTTP router exposing the corpus pipeline.
pub fn create_router<S>(service: Arc<S>) -> Router
where
    S: PipelineApi + 'static,
{
    Router::new()
        .route("/reload", post(reload_corpus::<S>))
        .route("/ask", post(ask_question::<S>))
        .route("/summaries", get(get_summaries::<S>))
        .route("/progress", get(progress_events::<S>))
        .route("/metrics", get(get_metrics::<S>))
        .route("/commands", get(get_commands))
        .with_state(service)
}

/// Success response for the `POST /reload` endpoint.
#[derive(Serialize)]
struct ReloadResponse {
    /// Number of files discovered under the corpus root.
    total_files: usize,
    /// Number of documents that produced a summary.
    documents_summarized: usize,
    /// Number of files skipped (unsupported, failed, or empty extraction).
    documents_skipped: usize,
}

/// Run one corpus pass and report its counters.
async fn reload_corpus<S>(State(service): State<Arc<S>>) -> Result<Json<ReloadResponse>, AppError>
where
    S: PipelineApi,
{
    let outcome = service.run_pass().await?;
    tracing::info!(
        total_files = outcome.total_files,
        documents_summarized = outcome.documents_summarized,
        documents_skipped = outcome.documents_skipped,
        "Reload request completed"
    );
    Ok(Json(ReloadResponse {
        total_files: outcome.total_files,
        documents_summarized: outcome.documents_summarized,
        documents_skipped: outcome.documents_skipped,
    }))
}

/// Request body for the `POST /ask` endpoint.
#[derive(Deserialize)]
struct AskRequest {
    /// Question to answer against the loaded corpus.
    question: String,
}

/// Response body for the `POST /ask` endpoint.
#[derive(Serialize)]
struct AskResponse {
    /// Question as received.
    question: String,
    /// Aggregated answer, or `null` when no corpus text is loaded.
    answer: Option<String>,
}

/// Answer a question against the current combined corpus text.
async fn ask_question<S>(
    State(service): State<Arc<S>>,
    Json(request): Json<AskRequest>,
) -> Json<AskResponse>
where
    S: PipelineApi,
{
    let answer = service.ask(&request.question).await;
    Json(AskResponse {
        question: request.question,
        answer,
    })
}

/// Response body for `GET /summaries`.
#[derive(Serialize)]
struct SummariesResponse {
    /// File name mapped to its aggregated summary.
    summaries: BTreeMap<String, String>,
}

/// Return the per-file summaries from the last completed pass.
async fn get_summaries<S>(State(service): State<Arc<S>>) -> Json<SummariesResponse>
where
    S: PipelineApi,
{
    let snapshot = service.snapshot();
    let summaries = snapshot
        .file_summaries
        .iter()
        .map(|(name, summary)| (name.clone(), summary.summary_text.clone()))
        .collect();
    Json(SummariesResponse { summaries })
}

/// Stream per-file progress events for running passes.
///
/// Delivery is best-effort: a subscriber that falls behind the broadcast
/// buffer loses the oldest events rather than stalling the pass.
async fn progress_events<S>(
    State(service): State<Arc<S>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>>
where
    S: PipelineApi,
{
    let mut receiver = service.subscribe_progress();
    let stream = async_stream::stream! {
        loop {
            match receiver.recv().await {
                Ok(event) => match Event::default().event("progress").json_data(&event) {
                    Ok(sse_event) => yield Ok(sse_event),
                    Err(error) => tracing::warn!(%error, "Failed to encode progress event"),
                },
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "Progress subscriber lagged; events dropped");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    };
    Sse::new(stream).keep_alive(KeepAlive::default())
}

/// Return a concise metrics snapshot with pass and chunk counters.
async fn get_metrics<S>(State(service): State<Arc<S>>) -> Json<MetricsResponse>
where
    S: PipelineApi,
{
    let snapshot = service.metrics_snapshot();
    Json(MetricsResponse {
        passes_completed: snapshot.passes_completed,
        documents_summarized: snapshot.documents_summarized,
        documents_skipped: snapshot.documents_skipped,
        chunks_processed: snapshot.chunks_processed,
        chunk_failures: snapshot.chunk_failures,
        questions_answered: snapshot.questions_answered,
    })
}

/// Response body for `GET /metrics`.
#[derive(Serialize)]
struct MetricsResponse {
    passes_completed: u64,
    documents_summarized: u64,
    documents_skipped: u64,
    chunks_processed: u64,
    chunk_failures: u64,
    questions_answered: u64,
}

/// Descriptor for a single command in the discovery catalog.
#[derive(Serialize)]
struct CommandDescriptor {
    name: &'static str,
    method: &'static str,
    path: &'static str,
    description: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    request_example: Option<serde_json::Value>,
}

/// Response body for `GET /commands`.
#[derive(Serialize)]
struct CommandsResponse {
    commands: Vec<CommandDescriptor>,
}

/// Enumerate supported HTTP commands for discovery/UX in hosts and tools.
async fn get_commands() -> Json<CommandsResponse> {
    Json(CommandsResponse {
        commands: vec![
            CommandDescriptor {
                name: "reload",
                method: "POST",
                path: "/reload",
                description: "Walk the corpus root, summarize every supported document, and replace the job state snapshot. Responds 409 while a pass is running.",
                request_example: None,
            },
            CommandDescriptor {
                name: "ask",
                method: "POST",
                path: "/ask",
                description: "Answer a question against the combined text of the last pass. Returns { \"question\": string, \"answer\": string | null }.",
                request_example: Some(json!({
                    "question": "What is the refund policy?"
                })),
            },
            CommandDescriptor {
                name: "summaries",
                method: "GET",
                path: "/summaries",
                description: "Return per-file summaries from the last completed pass.",
                request_example: None,
            },
            CommandDescriptor {
                name: "progress",
                method: "GET",
                path: "/progress",
                description: "Server-Sent Events stream of per-file progress for running passes.",
                request_example: None,
            },
            CommandDescriptor {
                name: "metrics",
                method: "GET",
                path: "/metrics",
                description: "Return pass counters useful for observability dashboards.",
                request_example: None,
            },
        ],
    })
}

struct AppError(PassError);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            PassError::AlreadyRunning => StatusCode::CONFLICT,
            PassError::RootUnreadable { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

impl From<PassError> for AppError {
    fn from(inner: PassError) -> Self {
        Self(inner)
    }
}
