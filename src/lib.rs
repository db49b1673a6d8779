#![deny(missing_docs)]

//! Core library for the Corpus Digest server.

/// HTTP routing and REST handlers.
pub mod api;
/// Environment-driven configuration management.
pub mod config;
/// Per-format document text extraction.
pub mod extract;
/// Inference client abstraction and adapters.
pub mod inference;
/// Structured logging and tracing setup.
pub mod logging;
/// Corpus pass metrics helpers.
pub mod metrics;
/// Document processing pipeline: chunking, inference orchestration, corpus passes.
pub mod pipeline;
/// Best-effort progress event publishing.
pub mod progress;
/// Job state snapshots shared with query handlers.
pub mod state;
