use serde::Deserialize;
use std::env;
use std::sync::OnceLock;
use thiserror::Error;

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required environment variable was not provided.
    #[error("Missing environment variable: {0}")]
    MissingVariable(String),
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

/// Runtime configuration for the Corpus Digest server.
#[derive(Debug, Deserialize)]
pub struct Config {
    /// Root folder of the document corpus ingested on each pass.
    pub corpus_root: String,
    /// Inference backend used for summarization and question answering.
    pub inference_provider: InferenceProvider,
    /// Model identifier used for summarization requests (Ollama provider).
    pub summarization_model: Option<String>,
    /// Model identifier used for question answering; falls back to the summarization model.
    pub qa_model: Option<String>,
    /// Base URL of the Ollama runtime.
    pub ollama_url: Option<String>,
    /// Optional override for the chunk window size in characters.
    pub chunk_size: Option<usize>,
    /// Optional override for the summary target word budget.
    pub summary_target_words: Option<usize>,
    /// Optional override for the summary minimum word budget.
    pub summary_min_words: Option<usize>,
    /// Optional override for per-chunk answer truncation in characters.
    pub answer_max_chars: Option<usize>,
    /// Optional override for the per-chunk inference timeout in seconds.
    pub inference_timeout_secs: Option<u64>,
    /// Optional override for the HTTP server port.
    pub server_port: Option<u16>,
}

/// Supported inference backends for the processing pipeline.
#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InferenceProvider {
    /// Local Ollama runtime.
    Ollama,
    /// Deterministic in-process fallback, usable without any model runtime.
    Heuristic,
}

impl Config {
    /// Load configuration from environment variables, performing validation along the way.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            corpus_root: load_env("CORPUS_ROOT")?,
            inference_provider: load_env("INFERENCE_PROVIDER")?.parse().map_err(|()| {
                ConfigError::InvalidValue("INFERENCE_PROVIDER".to_string())
            })?,
            summarization_model: load_env_optional("SUMMARIZATION_MODEL"),
            qa_model: load_env_optional("QA_MODEL"),
            ollama_url: load_env_optional("OLLAMA_URL"),
            chunk_size: parse_optional("CHUNK_SIZE")?,
            summary_target_words: parse_optional("SUMMARY_TARGET_WORDS")?,
            summary_min_words: parse_optional("SUMMARY_MIN_WORDS")?,
            answer_max_chars: parse_optional("ANSWER_MAX_CHARS")?,
            inference_timeout_secs: parse_optional("INFERENCE_TIMEOUT_SECS")?,
            server_port: parse_optional("SERVER_PORT")?,
        })
    }
}

fn load_env(key: &str) -> Result<String, ConfigError> {
    env::var(key).map_err(|_| ConfigError::MissingVariable(key.to_string()))
}

fn load_env_optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_optional<T: std::str::FromStr>(key: &str) -> Result<Option<T>, ConfigError> {
    load_env_optional(key)
        .map(|value| {
            value
                .parse()
                .map_err(|_| ConfigError::InvalidValue(key.to_string()))
        })
        .transpose()
}

impl std::str::FromStr for InferenceProvider {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ollama" => Ok(Self::Ollama),
            "heuristic" => Ok(Self::Heuristic),
            _ => Err(()),
        }
    }
}

/// Global configuration cache populated during process start.
pub static CONFIG: OnceLock<Config> = OnceLock::new();

/// Retrieve the loaded configuration, panicking if initialization has not occurred.
pub fn get_config() -> &'static Config {
    CONFIG.get().expect("Config not initialized")
}

/// Load configuration from the environment and install it in the global cache.
pub fn init_config() {
    dotenvy::dotenv().ok();
    let config = Config::from_env().expect("Failed to load config from environment");
    tracing::debug!(
        corpus_root = %config.corpus_root,
        inference_provider = ?config.inference_provider,
        server_port = ?config.server_port,
        chunk_size = ?config.chunk_size,
        "Loaded configuration"
    );
    CONFIG.set(config).expect("Failed to set config");
}
