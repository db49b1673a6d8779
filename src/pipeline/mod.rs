//! Document processing pipeline: chunking, corpus passes, and chunked
//! inference orchestration.

pub mod chunking;
mod corpus;
mod service;
pub mod types;

pub use service::{PipelineApi, PipelineService, PipelineSettings, SUMMARY_FAILURE_SENTINEL};
pub use types::{
    Chunk, ChunkKind, ChunkOutcome, ChunkingError, CorpusSnapshot, DocumentSummary, PassError,
    PassOutcome, ProgressEvent,
};
