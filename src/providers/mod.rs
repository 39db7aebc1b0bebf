//! Model Provider Boundary
//!
//! Traits for the two external models the engine depends on: an embedder
//! (text → fixed-dimension vector, batchable) and a completer (prompt →
//! text). Production implementations talk to an OpenAI-compatible API;
//! mock implementations back the tests.

mod mock;
mod openai;

pub use mock::{MockCompleter, MockEmbeddings};
pub use openai::{OpenAiCompleter, OpenAiEmbeddings};

use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EmbeddingError {
    #[error("API error: {0}")]
    Api(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Call timed out")]
    Timeout,

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

#[derive(Error, Debug)]
pub enum CompletionError {
    #[error("API error: {0}")]
    Api(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Call timed out")]
    Timeout,

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a batch of texts, preserving order.
    async fn embed_batch(&self, texts: &[String])
        -> std::result::Result<Vec<Vec<f32>>, EmbeddingError>;

    /// Embed a single text.
    async fn embed(&self, text: &str) -> std::result::Result<Vec<f32>, EmbeddingError> {
        let batch = [text.to_string()];
        let mut embeddings = self.embed_batch(&batch).await?;
        embeddings
            .pop()
            .ok_or_else(|| EmbeddingError::InvalidResponse("empty batch response".to_string()))
    }

    /// Output dimensionality.
    fn dimensions(&self) -> usize;

    fn name(&self) -> &str;
}

#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Complete a prompt into text.
    async fn complete(&self, prompt: &str) -> std::result::Result<String, CompletionError>;

    fn name(&self) -> &str;
}
