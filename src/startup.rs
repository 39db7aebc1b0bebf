//! Application Startup
//!
//! Builds the shared state (providers behind trait objects, services on
//! top) and runs the HTTP server. The listener is bound during `build`, so
//! tests can pass port 0 and read the real port back before starting the
//! server.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;

use crate::api;
use crate::config::AppConfig;
use crate::generate::ContentGenerator;
use crate::ingestion::IngestionService;
use crate::providers::{CompletionProvider, EmbeddingProvider};
use crate::qa::QaService;
use crate::quiz::CompetitiveQuizService;
use crate::retrieval::RetrievalService;
use crate::vector::VectorIndex;

/// Shared application state: configuration plus one instance of each
/// service, all cheap to clone per request.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub ingestion: IngestionService,
    pub retrieval: RetrievalService,
    pub qa: QaService,
    pub generator: ContentGenerator,
    pub competitive: CompetitiveQuizService,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        completer: Arc<dyn CompletionProvider>,
        index: Arc<dyn VectorIndex>,
    ) -> Self {
        let ingestion = IngestionService::new(&config, embedder.clone(), index.clone());
        let retrieval = RetrievalService::new(&config, embedder, index);
        let qa = QaService::new(
            retrieval.clone(),
            completer.clone(),
            config.retrieval.similarity_fallback_threshold,
        );
        let generator = ContentGenerator::new(retrieval.clone(), completer);
        let competitive = CompetitiveQuizService::new(generator.clone(), config.adaptive.clone());

        Self {
            config,
            ingestion,
            retrieval,
            qa,
            generator,
            competitive,
        }
    }
}

pub struct Application {
    port: u16,
    listener: TcpListener,
    state: AppState,
}

impl Application {
    /// Bind the listener and assemble the state. Port 0 picks a free port.
    pub async fn build(
        config: AppConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        completer: Arc<dyn CompletionProvider>,
        index: Arc<dyn VectorIndex>,
    ) -> std::io::Result<Self> {
        let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
        let listener = TcpListener::bind(addr).await?;
        let port = listener.local_addr()?.port();

        Ok(Self {
            port,
            listener,
            state: AppState::new(config, embedder, completer, index),
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Serve until the process receives a shutdown signal.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        tracing::info!("Listening on port {}", self.port);
        axum::serve(self.listener, api::router(self.state))
            .with_graceful_shutdown(shutdown_signal())
            .await
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {e}");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => tracing::error!("Failed to install SIGTERM handler: {e}"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
