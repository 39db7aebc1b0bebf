use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level application configuration.
///
/// Loaded from an optional TOML file, then overridden field-by-field from
/// the environment. Every tunable has a default, so the server starts with
/// no configuration at all (the in-memory vector index makes that useful
/// for local development).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub embedding: EmbeddingConfig,
    pub completion: CompletionConfig,
    pub vector: VectorConfig,
    pub chunking: ChunkingConfig,
    pub retrieval: RetrievalConfig,
    pub ingestion: IngestionConfig,
    pub adaptive: AdaptiveConfig,
    /// Deadline for each external call (embedder, completer, vector index).
    pub upstream_timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
    /// Cap on multipart upload bodies, in megabytes.
    pub body_limit_mb: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Provider type: "openai".
    pub provider: String,
    pub model: String,
    /// API endpoint (None for the provider default).
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    /// Dimensionality of the embedder output.
    pub dimensions: usize,
    /// Maximum chunks per embedding request.
    pub batch_size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompletionConfig {
    /// Provider type: "openai".
    pub provider: String,
    pub model: String,
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub max_tokens: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorConfig {
    /// Index backend: "http" (serverless REST index) or "memory".
    pub provider: String,
    /// Base URL of the index host (required for the "http" backend).
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Target chunk size in characters.
    pub chunk_size: usize,
    /// Overlap carried between consecutive chunks, in characters.
    pub chunk_overlap: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Total token budget for assembled context.
    pub max_context_tokens: usize,
    /// Tokens reserved for the completion.
    pub response_reserve: usize,
    /// Quality floor: chunks with fewer non-whitespace characters are dropped.
    pub min_chunk_chars: usize,
    /// All retrieved similarities below this trigger the fallback pre-signal.
    pub similarity_fallback_threshold: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestionConfig {
    /// Maximum combined page count per upload.
    pub max_pages_total: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdaptiveConfig {
    /// Q-learning learning rate.
    pub alpha: f64,
    /// Q-learning discount factor.
    pub gamma: f64,
    /// Exploration rate for the Q-policy.
    pub epsilon: f64,
    /// Probability of taking the Q-policy recommendation over Thompson's.
    pub blend_weight_q: f64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            embedding: EmbeddingConfig::default(),
            completion: CompletionConfig::default(),
            vector: VectorConfig::default(),
            chunking: ChunkingConfig::default(),
            retrieval: RetrievalConfig::default(),
            ingestion: IngestionConfig::default(),
            adaptive: AdaptiveConfig::default(),
            upstream_timeout_ms: 30_000,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8000,
            body_limit_mb: 50,
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: "text-embedding-3-small".to_string(),
            endpoint: None,
            api_key: None,
            dimensions: 1536,
            batch_size: 96,
        }
    }
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: "gpt-4o-mini".to_string(),
            endpoint: None,
            api_key: None,
            max_tokens: 2048,
        }
    }
}

impl Default for VectorConfig {
    fn default() -> Self {
        Self {
            provider: "memory".to_string(),
            endpoint: None,
            api_key: None,
        }
    }
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1024,
            chunk_overlap: 200,
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            max_context_tokens: 4000,
            response_reserve: 1000,
            min_chunk_chars: 50,
            similarity_fallback_threshold: 0.3,
        }
    }
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            max_pages_total: 300,
        }
    }
}

impl Default for AdaptiveConfig {
    fn default() -> Self {
        Self {
            alpha: 0.1,
            gamma: 0.9,
            epsilon: 0.2,
            blend_weight_q: 0.7,
        }
    }
}

impl AppConfig {
    /// Load configuration: TOML file if present, then environment overrides.
    /// A missing or unparseable file falls back to defaults with a warning.
    pub fn load() -> Self {
        let mut config = match std::fs::read_to_string(Self::config_path()) {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(config) => {
                    tracing::info!("Loaded config from {}", Self::config_path().display());
                    config
                }
                Err(e) => {
                    tracing::warn!(
                        "Failed to parse config at {}: {e} — using defaults",
                        Self::config_path().display()
                    );
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        };
        config.apply_env();
        config
    }

    fn config_path() -> PathBuf {
        dirs::config_dir()
            .map(|d| d.join("study-assistant").join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }

    /// Apply environment overrides; every tunable can be set without
    /// touching the config file.
    pub fn apply_env(&mut self) {
        set_from_env(&mut self.server.port, "PORT");
        set_from_env(&mut self.embedding.dimensions, "EMBEDDING_DIM");
        set_from_env(&mut self.retrieval.max_context_tokens, "MAX_CONTEXT_TOKENS");
        set_from_env(&mut self.retrieval.response_reserve, "RESPONSE_RESERVE");
        set_from_env(&mut self.chunking.chunk_size, "CHUNK_SIZE");
        set_from_env(&mut self.chunking.chunk_overlap, "CHUNK_OVERLAP");
        set_from_env(&mut self.retrieval.min_chunk_chars, "MIN_CHUNK_CHARS");
        set_from_env(&mut self.ingestion.max_pages_total, "MAX_PAGES_TOTAL");
        set_from_env(
            &mut self.retrieval.similarity_fallback_threshold,
            "SIMILARITY_FALLBACK_THRESHOLD",
        );
        set_from_env(&mut self.adaptive.alpha, "QL_ALPHA");
        set_from_env(&mut self.adaptive.gamma, "QL_GAMMA");
        set_from_env(&mut self.adaptive.epsilon, "QL_EPSILON");
        set_from_env(&mut self.adaptive.blend_weight_q, "BLEND_WEIGHT_Q");
        set_from_env(&mut self.upstream_timeout_ms, "UPSTREAM_TIMEOUT_MS");

        set_opt_from_env(&mut self.embedding.api_key, "OPENAI_API_KEY");
        set_opt_from_env(&mut self.completion.api_key, "OPENAI_API_KEY");
        set_opt_from_env(&mut self.embedding.endpoint, "OPENAI_BASE_URL");
        set_opt_from_env(&mut self.completion.endpoint, "OPENAI_BASE_URL");
        set_from_env(&mut self.embedding.model, "EMBEDDING_MODEL");
        set_from_env(&mut self.completion.model, "LLM_MODEL");
        set_from_env(&mut self.vector.provider, "VECTOR_PROVIDER");
        set_opt_from_env(&mut self.vector.endpoint, "VECTOR_INDEX_URL");
        set_opt_from_env(&mut self.vector.api_key, "VECTOR_INDEX_API_KEY");
    }

    /// Deadline applied to every external call.
    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_millis(self.upstream_timeout_ms)
    }
}

fn set_from_env<T: FromStr>(slot: &mut T, key: &str) {
    if let Ok(raw) = std::env::var(key) {
        match raw.parse::<T>() {
            Ok(value) => *slot = value,
            Err(_) => tracing::warn!("Ignoring unparseable {key}={raw}"),
        }
    }
}

fn set_opt_from_env(slot: &mut Option<String>, key: &str) {
    if let Ok(raw) = std::env::var(key) {
        if !raw.is_empty() {
            *slot = Some(raw);
        }
    }
}
