//! Ingestion Service
//!
//! Orchestrates extract → chunk → embed → upsert into a freshly minted
//! namespace. Indexing is atomic from the client's point of view: if any
//! step fails after vectors were written, the namespace is deleted before
//! the error propagates, so a half-indexed document is never observable.

use std::sync::Arc;

use futures::future::join_all;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::error::{AppError, Result};
use crate::ingestion::chunker::{ChunkerConfig, HybridChunker};
use crate::ingestion::pdf::{ExtractedFile, PdfExtractor};
use crate::providers::EmbeddingProvider;
use crate::vector::{ChunkMetadata, VectorIndex, VectorRecord};

/// One file from a multipart upload.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Result of a successful ingestion.
#[derive(Debug, Clone)]
pub struct IngestedDocument {
    pub document_id: String,
    pub filenames: Vec<String>,
    pub page_count: usize,
    pub chunk_count: usize,
}

/// One entry of the document listing.
#[derive(Debug, Clone)]
pub struct DocumentSummary {
    pub document_id: String,
    pub filename: String,
    pub vector_count: usize,
}

#[derive(Clone)]
pub struct IngestionService {
    extractor: Arc<PdfExtractor>,
    chunker: Arc<HybridChunker>,
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn VectorIndex>,
    batch_size: usize,
    max_pages_total: usize,
    min_chunk_chars: usize,
}

impl IngestionService {
    pub fn new(
        config: &AppConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        index: Arc<dyn VectorIndex>,
    ) -> Self {
        let chunker = HybridChunker::new(ChunkerConfig {
            target_size: config.chunking.chunk_size,
            overlap: config.chunking.chunk_overlap,
            min_tail_chars: config.retrieval.min_chunk_chars,
        });
        Self {
            extractor: Arc::new(PdfExtractor::new()),
            chunker: Arc::new(chunker),
            embedder,
            index,
            batch_size: config.embedding.batch_size.clamp(1, 96),
            max_pages_total: config.ingestion.max_pages_total,
            min_chunk_chars: config.retrieval.min_chunk_chars,
        }
    }

    /// Ingest one or more PDFs into a new document namespace.
    pub async fn ingest(&self, files: Vec<UploadedFile>) -> Result<IngestedDocument> {
        if files.is_empty() {
            return Err(AppError::BadInput(
                "At least one file must be uploaded".to_string(),
            ));
        }

        let mut extracted = Vec::with_capacity(files.len());
        let mut total_pages = 0usize;
        for file in &files {
            let doc = self.extractor.extract(&file.bytes, &file.filename)?;
            total_pages += doc.page_count;
            if total_pages > self.max_pages_total {
                return Err(AppError::BadInput(format!(
                    "Total pages ({total_pages}) exceeds the maximum of {}",
                    self.max_pages_total
                )));
            }
            extracted.push(doc);
        }

        self.ingest_extracted(extracted).await
    }

    /// Index already-extracted files. Split out so orchestration can be
    /// tested without synthesizing PDF bytes.
    pub async fn ingest_extracted(&self, files: Vec<ExtractedFile>) -> Result<IngestedDocument> {
        let total_pages: usize = files.iter().map(|f| f.page_count).sum();
        if total_pages > self.max_pages_total {
            return Err(AppError::BadInput(format!(
                "Total pages ({total_pages}) exceeds the maximum of {}",
                self.max_pages_total
            )));
        }

        let combined_chars: usize = files.iter().map(ExtractedFile::text_chars).sum();
        if combined_chars < 10 {
            return Err(AppError::BadInput(
                "No extractable text found in the uploaded files".to_string(),
            ));
        }

        let document_id = Uuid::new_v4().to_string();
        let filenames: Vec<String> = files.iter().map(|f| f.filename.clone()).collect();

        // Chunk per file; indices run document-wide.
        let mut records_pending: Vec<(String, ChunkMetadata)> = Vec::new();
        let mut next_index = 0usize;
        for file in &files {
            let chunks = self.chunker.chunk_pages(&file.pages, next_index);
            next_index = chunks.last().map_or(next_index, |c| c.chunk_index + 1);
            for chunk in chunks {
                let trimmed_chars = chunk.text.chars().filter(|c| !c.is_whitespace()).count();
                if trimmed_chars < self.min_chunk_chars {
                    continue;
                }
                records_pending.push((
                    format!("{document_id}-{}", chunk.chunk_index),
                    ChunkMetadata {
                        text: chunk.text,
                        filename: file.filename.clone(),
                        page_number: chunk.page_number,
                        chunk_index: chunk.chunk_index,
                        char_start: Some(chunk.char_start),
                        char_end: Some(chunk.char_end),
                    },
                ));
            }
        }

        if records_pending.is_empty() {
            return Err(AppError::BadInput(
                "No content could be extracted from the uploaded files".to_string(),
            ));
        }

        let chunk_count = records_pending.len();
        tracing::info!(
            "Indexing {chunk_count} chunks from {} file(s) into namespace {document_id}",
            files.len()
        );

        // Covers request cancellation: if this future is dropped mid-upsert,
        // the guard deletes whatever made it into the namespace.
        let mut guard = NamespaceCleanup::armed(self.index.clone(), &document_id);

        if let Err(e) = self.embed_and_upsert(&document_id, records_pending).await {
            guard.disarm();
            // Never leave a half-indexed namespace behind.
            if let Err(cleanup) = self.index.delete_namespace(&document_id).await {
                tracing::error!(
                    "Failed to clean up namespace {document_id} after ingestion error: {cleanup}"
                );
            }
            return Err(e);
        }
        guard.disarm();

        Ok(IngestedDocument {
            document_id,
            filenames,
            page_count: total_pages,
            chunk_count,
        })
    }

    /// Embed and upsert in order, one batch outstanding at a time.
    async fn embed_and_upsert(
        &self,
        document_id: &str,
        records: Vec<(String, ChunkMetadata)>,
    ) -> Result<()> {
        for batch in records.chunks(self.batch_size) {
            let texts: Vec<String> = batch.iter().map(|(_, m)| m.text.clone()).collect();
            let embeddings = self.embedder.embed_batch(&texts).await?;

            let vectors: Vec<VectorRecord> = batch
                .iter()
                .zip(embeddings)
                .map(|((id, metadata), values)| VectorRecord {
                    id: id.clone(),
                    values,
                    metadata: metadata.clone(),
                })
                .collect();
            self.index.upsert(document_id, vectors).await?;
        }
        Ok(())
    }

    /// List indexed documents from the namespace stats, recovering the
    /// display filename from any one vector's metadata. Namespaces are
    /// sampled concurrently.
    pub async fn list_documents(&self) -> Result<Vec<DocumentSummary>> {
        let stats = self.index.list_namespaces().await?;
        let probe = vec![0.0f32; self.embedder.dimensions()];

        let documents = join_all(stats.into_iter().map(|entry| {
            let probe = probe.clone();
            async move {
                let filename = match self.index.query(&entry.namespace, &probe, 1).await {
                    Ok(matches) => matches
                        .into_iter()
                        .next()
                        .map(|m| m.metadata.filename)
                        .unwrap_or_else(|| fallback_name(&entry.namespace)),
                    Err(e) => {
                        tracing::warn!("Could not sample namespace {}: {e}", entry.namespace);
                        fallback_name(&entry.namespace)
                    }
                };
                DocumentSummary {
                    document_id: entry.namespace,
                    filename,
                    vector_count: entry.vector_count,
                }
            }
        }))
        .await;
        Ok(documents)
    }
}

fn fallback_name(namespace: &str) -> String {
    let prefix: String = namespace.chars().take(8).collect();
    format!("Document {prefix}…")
}

/// Deletes a namespace on drop unless disarmed. Backstop for ingestion
/// futures dropped by client cancellation after vectors were written.
struct NamespaceCleanup {
    index: Arc<dyn VectorIndex>,
    namespace: String,
    armed: bool,
}

impl NamespaceCleanup {
    fn armed(index: Arc<dyn VectorIndex>, namespace: &str) -> Self {
        Self {
            index,
            namespace: namespace.to_string(),
            armed: true,
        }
    }

    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for NamespaceCleanup {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let index = self.index.clone();
        let namespace = self.namespace.clone();
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn(async move {
                tracing::warn!("Ingestion into {namespace} was cancelled; deleting the namespace");
                if let Err(e) = index.delete_namespace(&namespace).await {
                    tracing::error!("Failed to clean up cancelled namespace {namespace}: {e}");
                }
            });
        }
    }
}
