//! OpenAI-Compatible Providers
//!
//! Embeddings and chat-completion clients for the OpenAI API surface (also
//! usable against compatible endpoints via a custom base URL). Both apply
//! the configured deadline and retry once with backoff on transient
//! failures.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{CompletionError, CompletionProvider, EmbeddingError, EmbeddingProvider};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const RETRY_BACKOFF: Duration = Duration::from_millis(250);

// ============================================================================
// Embeddings
// ============================================================================

#[derive(Debug, Serialize)]
struct EmbeddingRequest {
    model: String,
    input: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}

pub struct OpenAiEmbeddings {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
    dimensions: usize,
    timeout: Duration,
}

impl OpenAiEmbeddings {
    pub fn new(
        api_key: &str,
        model: String,
        dimensions: usize,
        base_url: Option<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.to_string(),
            model,
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            dimensions,
            timeout,
        }
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbeddings {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let url = format!("{}/embeddings", self.base_url);
        let request = EmbeddingRequest {
            model: self.model.clone(),
            input: texts.to_vec(),
            // Only the -3 generation models accept an explicit size.
            dimensions: self
                .model
                .starts_with("text-embedding-3")
                .then_some(self.dimensions),
        };

        let body = send_with_retry(&self.client, &url, &self.api_key, &request, self.timeout)
            .await
            .map_err(|e| match e {
                UpstreamFailure::Timeout => EmbeddingError::Timeout,
                UpstreamFailure::Network(e) => EmbeddingError::Network(e),
                UpstreamFailure::Api(msg) => EmbeddingError::Api(msg),
            })?;

        let response: EmbeddingResponse = serde_json::from_str(&body)
            .map_err(|e| EmbeddingError::InvalidResponse(e.to_string()))?;

        let mut data = response.data;
        data.sort_by_key(|d| d.index);
        if data.len() != texts.len() {
            return Err(EmbeddingError::InvalidResponse(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                data.len()
            )));
        }
        Ok(data.into_iter().map(|d| d.embedding).collect())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        "openai"
    }
}

// ============================================================================
// Completions
// ============================================================================

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

pub struct OpenAiCompleter {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
    max_tokens: u32,
    timeout: Duration,
}

impl OpenAiCompleter {
    pub fn new(
        api_key: &str,
        model: String,
        max_tokens: u32,
        base_url: Option<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.to_string(),
            model,
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            max_tokens,
            timeout,
        }
    }
}

#[async_trait]
impl CompletionProvider for OpenAiCompleter {
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError> {
        let url = format!("{}/chat/completions", self.base_url);
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            max_tokens: self.max_tokens,
            temperature: 0.3,
        };

        let body = send_with_retry(&self.client, &url, &self.api_key, &request, self.timeout)
            .await
            .map_err(|e| match e {
                UpstreamFailure::Timeout => CompletionError::Timeout,
                UpstreamFailure::Network(e) => CompletionError::Network(e),
                UpstreamFailure::Api(msg) => CompletionError::Api(msg),
            })?;

        let response: ChatResponse = serde_json::from_str(&body)
            .map_err(|e| CompletionError::InvalidResponse(e.to_string()))?;

        response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| CompletionError::InvalidResponse("no choices returned".to_string()))
    }

    fn name(&self) -> &str {
        "openai"
    }
}

// ============================================================================
// Shared request plumbing
// ============================================================================

enum UpstreamFailure {
    Timeout,
    Network(reqwest::Error),
    Api(String),
}

/// POST a JSON body with bearer auth; retry once with backoff on connect
/// failures and HTTP 5xx. Error bodies are logged, not propagated.
async fn send_with_retry<B: Serialize>(
    client: &reqwest::Client,
    url: &str,
    api_key: &str,
    body: &B,
    timeout: Duration,
) -> Result<String, UpstreamFailure> {
    let mut attempt = 0u32;
    loop {
        attempt += 1;
        let request = client
            .post(url)
            .timeout(timeout)
            .header("Authorization", format!("Bearer {api_key}"))
            .json(body);

        match tokio::time::timeout(timeout, request.send()).await {
            Err(_) => return Err(UpstreamFailure::Timeout),
            Ok(Err(e)) if e.is_timeout() => return Err(UpstreamFailure::Timeout),
            Ok(Err(e)) => {
                if e.is_connect() && attempt == 1 {
                    tracing::warn!("Connect failure to {url}, retrying: {e}");
                    tokio::time::sleep(RETRY_BACKOFF).await;
                    continue;
                }
                return Err(UpstreamFailure::Network(e));
            }
            Ok(Ok(response)) => {
                let status = response.status();
                let text = response.text().await.unwrap_or_default();
                if status.is_success() {
                    return Ok(text);
                }
                if status.is_server_error() && attempt == 1 {
                    tracing::warn!("{url} returned {status}, retrying");
                    tokio::time::sleep(RETRY_BACKOFF * 2u32.pow(attempt - 1)).await;
                    continue;
                }
                tracing::error!("{url} failed with {status}: {text}");
                return Err(UpstreamFailure::Api(format!("HTTP {status}")));
            }
        }
    }
}
