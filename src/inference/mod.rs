//! Inference backend contract and adapters.
//!
//! The pipeline drives two capabilities through one narrow interface:
//! summarization with explicit word bounds and extractive question answering.
//! The Ollama-backed client issues HTTP requests directly to the runtime; the
//! heuristic client is a deterministic in-process fallback that keeps the
//! pipeline usable (and testable) without any model runtime.

use crate::config::{InferenceProvider, get_config};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use std::collections::HashSet;
use thiserror::Error;

const DEFAULT_OLLAMA_URL: &str = "http://127.0.0.1:11434";

/// Errors surfaced by inference backends.
///
/// Chunk-level callers pattern-match these and absorb them; they never abort
/// a corpus pass.
#[derive(Debug, Error)]
pub enum InferenceClientError {
    /// Provider was unreachable or the requested model is not installed.
    #[error("Inference provider unavailable: {0}")]
    ProviderUnavailable(String),
    /// Provider returned an error response.
    #[error("Failed to generate output: {0}")]
    GenerationFailed(String),
    /// Provider response could not be parsed.
    #[error("Malformed provider response: {0}")]
    InvalidResponse(String),
    /// The call exceeded the configured per-chunk budget.
    #[error("Inference call timed out after {0} seconds")]
    TimedOut(u64),
}

/// Interface implemented by inference backends.
#[async_trait]
pub trait InferenceClient: Send + Sync {
    /// Summarize `text` within the supplied word bounds.
    async fn summarize(
        &self,
        text: &str,
        max_words: usize,
        min_words: usize,
    ) -> Result<String, InferenceClientError>;

    /// Answer `question` from `context` alone.
    async fn answer(
        &self,
        question: &str,
        context: &str,
    ) -> Result<String, InferenceClientError>;
}

/// Build an inference client suitable for the current configuration.
pub fn build_inference_client() -> Box<dyn InferenceClient> {
    let config = get_config();
    match config.inference_provider {
        InferenceProvider::Heuristic => Box::new(HeuristicInferenceClient),
        InferenceProvider::Ollama => {
            let base_url = config
                .ollama_url
                .clone()
                .unwrap_or_else(|| DEFAULT_OLLAMA_URL.to_string());
            let summarization_model = config
                .summarization_model
                .clone()
                .expect("SUMMARIZATION_MODEL must be set for the ollama provider");
            let qa_model = config
                .qa_model
                .clone()
                .unwrap_or_else(|| summarization_model.clone());
            Box::new(OllamaInferenceClient::new(
                base_url,
                summarization_model,
                qa_model,
            ))
        }
    }
}

/// Inference client backed by a local Ollama runtime.
pub struct OllamaInferenceClient {
    http: Client,
    base_url: String,
    summarization_model: String,
    qa_model: String,
}

impl OllamaInferenceClient {
    /// Construct a client for the given runtime URL and model pair.
    pub fn new(base_url: String, summarization_model: String, qa_model: String) -> Self {
        let http = Client::builder()
            .user_agent("corpus-digest/inference")
            .build()
            .expect("Failed to construct reqwest::Client for inference");
        Self {
            http,
            base_url,
            summarization_model,
            qa_model,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/api/generate", self.base_url.trim_end_matches('/'))
    }

    async fn generate(&self, model: &str, prompt: String) -> Result<String, InferenceClientError> {
        let payload = json!({
            "model": model,
            "prompt": prompt,
            "stream": false,
            "options": {
                // Lower temperature for reproducible outputs.
                "temperature": 0.1,
            }
        });

        let response = self
            .http
            .post(self.endpoint())
            .json(&payload)
            .send()
            .await
            .map_err(|error| {
                InferenceClientError::ProviderUnavailable(format!(
                    "failed to reach Ollama at {}: {error}",
                    self.base_url
                ))
            })?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(InferenceClientError::ProviderUnavailable(format!(
                "Ollama endpoint {} returned 404",
                self.endpoint()
            )));
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(InferenceClientError::GenerationFailed(format!(
                "Ollama returned {status}: {body}"
            )));
        }

        let body: OllamaResponse = response.json().await.map_err(|error| {
            InferenceClientError::InvalidResponse(format!(
                "failed to decode Ollama response: {error}"
            ))
        })?;

        if !body.done {
            return Err(InferenceClientError::InvalidResponse(
                "Ollama response incomplete (streaming not supported)".into(),
            ));
        }

        Ok(body.response.trim().to_string())
    }
}

#[derive(Debug, Deserialize)]
struct OllamaResponse {
    response: String,
    done: bool,
}

#[async_trait]
impl InferenceClient for OllamaInferenceClient {
    async fn summarize(
        &self,
        text: &str,
        max_words: usize,
        min_words: usize,
    ) -> Result<String, InferenceClientError> {
        let prompt = format!(
            "Summarize the following text in no more than {max_words} words and no fewer \
             than {min_words} words. Respond with the summary only.\n\n{text}"
        );
        self.generate(&self.summarization_model, prompt).await
    }

    async fn answer(
        &self,
        question: &str,
        context: &str,
    ) -> Result<String, InferenceClientError> {
        let prompt = format!(
            "Answer the question using only the provided context. Respond with the shortest \
             passage from the context that answers it, and nothing else.\n\n\
             Question: {question}\n\nContext:\n{context}"
        );
        self.generate(&self.qa_model, prompt).await
    }
}

/// Deterministic fallback backend with no external dependencies.
///
/// Summaries are the leading words of the input; answers are the sentence
/// sharing the most terms with the question.
pub struct HeuristicInferenceClient;

fn normalize_term(word: &str) -> String {
    word.chars()
        .filter(|ch| ch.is_alphanumeric())
        .collect::<String>()
        .to_lowercase()
}

#[async_trait]
impl InferenceClient for HeuristicInferenceClient {
    async fn summarize(
        &self,
        text: &str,
        max_words: usize,
        _min_words: usize,
    ) -> Result<String, InferenceClientError> {
        Ok(text
            .split_whitespace()
            .take(max_words)
            .collect::<Vec<_>>()
            .join(" "))
    }

    async fn answer(
        &self,
        question: &str,
        context: &str,
    ) -> Result<String, InferenceClientError> {
        let terms: HashSet<String> = question
            .split_whitespace()
            .map(normalize_term)
            .filter(|term| !term.is_empty())
            .collect();

        let mut best: Option<(usize, &str)> = None;
        for sentence in context.split(['.', '!', '?']) {
            if sentence.trim().is_empty() {
                continue;
            }
            let score = sentence
                .split_whitespace()
                .map(normalize_term)
                .filter(|word| terms.contains(word))
                .count();
            if best.is_none_or(|(top, _)| score > top) {
                best = Some((score, sentence));
            }
        }

        Ok(best
            .map(|(_, sentence)| sentence.trim().to_string())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::{Method::POST, MockServer};

    fn test_client(base_url: String) -> OllamaInferenceClient {
        OllamaInferenceClient::new(base_url, "llama".into(), "llama".into())
    }

    #[tokio::test]
    async fn ollama_client_handles_successful_response() {
        let server = MockServer::start_async().await;
        let client = test_client(server.base_url());

        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/api/generate");
                then.status(200).json_body(json!({
                    "response": "Summary text",
                    "done": true
                }));
            })
            .await;

        let summary = client
            .summarize("Some document text", 50, 20)
            .await
            .expect("summary");

        mock.assert();
        assert_eq!(summary, "Summary text");
    }

    #[tokio::test]
    async fn ollama_client_handles_error_status() {
        let server = MockServer::start_async().await;
        let client = test_client(server.base_url());

        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/generate");
                then.status(500).body("boom");
            })
            .await;

        let error = client
            .answer("What is it?", "Context")
            .await
            .expect_err("error response");

        assert!(matches!(error, InferenceClientError::GenerationFailed(message) if message.contains("500")));
    }

    #[tokio::test]
    async fn ollama_client_rejects_incomplete_response() {
        let server = MockServer::start_async().await;
        let client = test_client(server.base_url());

        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/generate");
                then.status(200).json_body(json!({
                    "response": "partial",
                    "done": false
                }));
            })
            .await;

        let error = client
            .summarize("text", 10, 5)
            .await
            .expect_err("incomplete response");

        assert!(matches!(error, InferenceClientError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn heuristic_summary_respects_word_budget() {
        let client = HeuristicInferenceClient;
        let summary = client
            .summarize("one two three four five six", 3, 1)
            .await
            .expect("summary");
        assert_eq!(summary, "one two three");
    }

    #[tokio::test]
    async fn heuristic_summary_with_zero_budget_is_empty() {
        let client = HeuristicInferenceClient;
        let summary = client.summarize("hi", 0, 0).await.expect("summary");
        assert!(summary.is_empty());
    }

    #[tokio::test]
    async fn heuristic_answer_picks_overlapping_sentence() {
        let client = HeuristicInferenceClient;
        let context = "The sky is blue. Grass is green. Rust ships fearless concurrency.";
        let answer = client
            .answer("What color is the sky?", context)
            .await
            .expect("answer");
        assert_eq!(answer, "The sky is blue");
    }

    #[tokio::test]
    async fn heuristic_answer_on_empty_context_is_empty() {
        let client = HeuristicInferenceClient;
        let answer = client.answer("Anything?", "").await.expect("answer");
        assert!(answer.is_empty());
    }
}
