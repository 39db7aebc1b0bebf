use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use study_assistant::config::AppConfig;
use study_assistant::providers::{
    CompletionProvider, EmbeddingProvider, MockCompleter, MockEmbeddings, OpenAiCompleter,
    OpenAiEmbeddings,
};
use study_assistant::startup::Application;
use study_assistant::vector::{HttpVectorIndex, InMemoryVectorIndex, VectorIndex};

#[tokio::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::load();

    let embedder: Arc<dyn EmbeddingProvider> = match config.embedding.provider.as_str() {
        "mock" => Arc::new(MockEmbeddings::new(config.embedding.dimensions)),
        "openai" => {
            let api_key = config.embedding.api_key.clone().ok_or_else(|| {
                std::io::Error::other("OPENAI_API_KEY is required for the openai embedding provider")
            })?;
            Arc::new(OpenAiEmbeddings::new(
                &api_key,
                config.embedding.model.clone(),
                config.embedding.dimensions,
                config.embedding.endpoint.clone(),
                config.upstream_timeout(),
            ))
        }
        other => {
            return Err(std::io::Error::other(format!(
                "Unknown embedding provider \"{other}\""
            )))
        }
    };

    let completer: Arc<dyn CompletionProvider> = match config.completion.provider.as_str() {
        "mock" => Arc::new(MockCompleter::new()),
        "openai" => {
            let api_key = config.completion.api_key.clone().ok_or_else(|| {
                std::io::Error::other("OPENAI_API_KEY is required for the openai completion provider")
            })?;
            Arc::new(OpenAiCompleter::new(
                &api_key,
                config.completion.model.clone(),
                config.completion.max_tokens,
                config.completion.endpoint.clone(),
                config.upstream_timeout(),
            ))
        }
        other => {
            return Err(std::io::Error::other(format!(
                "Unknown completion provider \"{other}\""
            )))
        }
    };

    let index: Arc<dyn VectorIndex> = match config.vector.provider.as_str() {
        "memory" => {
            tracing::warn!("Using the in-memory vector index; documents will not survive restarts");
            Arc::new(InMemoryVectorIndex::new())
        }
        "http" => {
            let endpoint = config.vector.endpoint.clone().ok_or_else(|| {
                std::io::Error::other("VECTOR_INDEX_URL is required for the http vector index")
            })?;
            Arc::new(HttpVectorIndex::new(
                &endpoint,
                config.vector.api_key.clone(),
                config.upstream_timeout(),
            ))
        }
        other => {
            return Err(std::io::Error::other(format!(
                "Unknown vector index provider \"{other}\""
            )))
        }
    };

    let app = Application::build(config, embedder, completer, index).await?;
    app.run_until_stopped().await
}
