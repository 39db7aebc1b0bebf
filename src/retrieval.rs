//! Retrieval Service
//!
//! Embeds a query, searches one document namespace, quality-filters and
//! ranks the matches, then assembles a token-budgeted context window.
//! Output is deterministic for a fixed query and vector set: ties in
//! similarity break on text length, then chunk index.

use std::sync::Arc;

use serde::Serialize;

use crate::config::AppConfig;
use crate::error::Result;
use crate::providers::EmbeddingProvider;
use crate::vector::VectorIndex;

/// A chunk surviving retrieval, with its provenance and similarity.
#[derive(Debug, Clone, Serialize)]
pub struct RetrievedChunk {
    pub text: String,
    /// Cosine similarity in [-1, 1].
    pub similarity: f32,
    pub filename: String,
    pub page_number: u32,
    pub chunk_index: usize,
}

#[derive(Clone)]
pub struct RetrievalService {
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn VectorIndex>,
    max_context_tokens: usize,
    response_reserve: usize,
    min_chunk_chars: usize,
}

impl RetrievalService {
    pub fn new(
        config: &AppConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        index: Arc<dyn VectorIndex>,
    ) -> Self {
        Self {
            embedder,
            index,
            max_context_tokens: config.retrieval.max_context_tokens,
            response_reserve: config.retrieval.response_reserve,
            min_chunk_chars: config.retrieval.min_chunk_chars,
        }
    }

    /// Retrieve up to `k` ranked chunks for `query`, budgeted to fit the
    /// context window.
    pub async fn retrieve(
        &self,
        document_id: &str,
        query: &str,
        k: usize,
    ) -> Result<Vec<RetrievedChunk>> {
        if k == 0 {
            return Ok(Vec::new());
        }

        let query_vector = self.embedder.embed(query).await?;
        let matches = self.index.query(document_id, &query_vector, 2 * k).await?;

        let mut chunks: Vec<RetrievedChunk> = matches
            .into_iter()
            .filter(|m| {
                m.metadata
                    .text
                    .trim()
                    .chars()
                    .filter(|c| !c.is_whitespace())
                    .count()
                    >= self.min_chunk_chars
            })
            .map(|m| RetrievedChunk {
                text: m.metadata.text,
                similarity: m.score,
                filename: m.metadata.filename,
                page_number: m.metadata.page_number,
                chunk_index: m.metadata.chunk_index,
            })
            .collect();

        chunks.sort_by(|a, b| {
            b.similarity
                .total_cmp(&a.similarity)
                .then_with(|| b.text.len().cmp(&a.text.len()))
                .then_with(|| a.chunk_index.cmp(&b.chunk_index))
        });
        chunks.truncate(k);

        Ok(self.fit_to_budget(query, chunks))
    }

    /// Keep ranked chunks while the token budget allows. A chunk that no
    /// longer fits whole is truncated at the last sentence boundary that
    /// does, or dropped when truncation would leave too little text; either
    /// way, assembly stops there.
    fn fit_to_budget(&self, query: &str, chunks: Vec<RetrievedChunk>) -> Vec<RetrievedChunk> {
        let budget = self
            .max_context_tokens
            .saturating_sub(estimate_tokens(query))
            .saturating_sub(self.response_reserve);

        let mut selected = Vec::with_capacity(chunks.len());
        let mut used = 0usize;

        for mut chunk in chunks {
            let tokens = estimate_tokens(&chunk.text);
            if used + tokens <= budget {
                used += tokens;
                selected.push(chunk);
                continue;
            }

            let remaining = budget.saturating_sub(used);
            if remaining > 0 {
                let char_limit = remaining * 4;
                if let Some(cut) = last_sentence_boundary(&chunk.text, char_limit) {
                    let truncated = chunk.text[..cut].trim_end();
                    let content = truncated.chars().filter(|c| !c.is_whitespace()).count();
                    if content >= self.min_chunk_chars {
                        chunk.text = truncated.to_string();
                        selected.push(chunk);
                    }
                }
            }
            break;
        }

        selected
    }
}

/// Rough token estimate: one token per four characters, rounded up.
pub fn estimate_tokens(text: &str) -> usize {
    text.len().div_ceil(4)
}

/// Byte offset just past the last sentence end within `limit` bytes, if any.
fn last_sentence_boundary(text: &str, limit: usize) -> Option<usize> {
    let mut end = limit.min(text.len());
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    let window = &text[..end];
    for pattern in [". ", ".\n", "\n"] {
        if let Some(pos) = window.rfind(pattern) {
            return Some(pos + 1);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::EmbeddingError;
    use crate::vector::{ChunkMetadata, InMemoryVectorIndex, VectorRecord};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Embeds every query to the same unit basis vector, so match scores
    /// are fully controlled by the stored vectors.
    struct StubEmbedder {
        calls: AtomicUsize,
    }

    impl StubEmbedder {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl EmbeddingProvider for StubEmbedder {
        async fn embed_batch(
            &self,
            texts: &[String],
        ) -> std::result::Result<Vec<Vec<f32>>, EmbeddingError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(texts.iter().map(|_| vec![1.0, 0.0]).collect())
        }

        fn dimensions(&self) -> usize {
            2
        }

        fn name(&self) -> &str {
            "stub"
        }
    }

    fn record(id: &str, alignment: f32, text: &str, chunk_index: usize) -> VectorRecord {
        // alignment in [0, 1]: cosine against the stub query vector.
        let other = (1.0 - alignment * alignment).max(0.0).sqrt();
        VectorRecord {
            id: id.to_string(),
            values: vec![alignment, other],
            metadata: ChunkMetadata {
                text: text.to_string(),
                filename: "doc.pdf".to_string(),
                page_number: 1,
                chunk_index,
                char_start: None,
                char_end: None,
            },
        }
    }

    fn long_text(word: &str, sentences: usize) -> String {
        (1..=sentences)
            .map(|i| format!("{word} appears in sentence {i} with supporting detail attached."))
            .collect::<Vec<_>>()
            .join(" ")
    }

    async fn service_with(
        records: Vec<VectorRecord>,
        config: AppConfig,
    ) -> (RetrievalService, Arc<StubEmbedder>) {
        let index = Arc::new(InMemoryVectorIndex::new());
        index.upsert("doc", records).await.unwrap();
        let embedder = Arc::new(StubEmbedder::new());
        (
            RetrievalService::new(&config, embedder.clone(), index),
            embedder,
        )
    }

    #[tokio::test]
    async fn test_zero_k_makes_no_upstream_call() {
        let (service, embedder) = service_with(vec![], AppConfig::default()).await;
        let result = service.retrieve("doc", "anything", 0).await.unwrap();
        assert!(result.is_empty());
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_results_ordered_by_similarity() {
        let records = vec![
            record("a", 0.5, &long_text("alpha", 3), 0),
            record("b", 0.9, &long_text("beta", 3), 1),
            record("c", 0.7, &long_text("gamma", 3), 2),
        ];
        let (service, _) = service_with(records, AppConfig::default()).await;

        let result = service.retrieve("doc", "query", 3).await.unwrap();
        assert_eq!(result.len(), 3);
        for pair in result.windows(2) {
            assert!(pair[0].similarity >= pair[1].similarity);
        }
        assert_eq!(result[0].chunk_index, 1);
    }

    #[tokio::test]
    async fn test_short_chunks_filtered_out() {
        let records = vec![
            record("short", 0.95, "too short", 0),
            record("long", 0.5, &long_text("kept", 3), 1),
        ];
        let (service, _) = service_with(records, AppConfig::default()).await;

        let result = service.retrieve("doc", "query", 5).await.unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].chunk_index, 1);
    }

    #[tokio::test]
    async fn test_ties_break_on_length_then_index() {
        let longer = long_text("shared", 5);
        let shorter = long_text("shared", 2);
        let records = vec![
            record("a", 0.8, &shorter, 0),
            record("b", 0.8, &longer, 1),
            record("c", 0.8, &shorter, 2),
        ];
        let (service, _) = service_with(records, AppConfig::default()).await;

        let result = service.retrieve("doc", "query", 3).await.unwrap();
        assert_eq!(result[0].chunk_index, 1);
        assert_eq!(result[1].chunk_index, 0);
        assert_eq!(result[2].chunk_index, 2);
    }

    #[tokio::test]
    async fn test_k_limits_result_count() {
        let records: Vec<VectorRecord> = (0..6)
            .map(|i| {
                record(
                    &format!("r{i}"),
                    0.9 - i as f32 * 0.1,
                    &long_text("topic", 3),
                    i,
                )
            })
            .collect();
        let (service, _) = service_with(records, AppConfig::default()).await;

        let result = service.retrieve("doc", "query", 2).await.unwrap();
        assert_eq!(result.len(), 2);
    }

    #[tokio::test]
    async fn test_budget_truncates_at_sentence_boundary() {
        let mut config = AppConfig::default();
        // Budget of ~50 tokens ≈ 200 chars after the query and reserve.
        config.retrieval.max_context_tokens = 1052;
        config.retrieval.response_reserve = 1000;

        let records = vec![record("a", 0.9, &long_text("budget", 10), 0)];
        let (service, _) = service_with(records, config).await;

        let result = service.retrieve("doc", "q", 1).await.unwrap();
        assert_eq!(result.len(), 1);
        assert!(result[0].text.len() <= 200);
        assert!(result[0].text.ends_with('.'));
    }

    #[tokio::test]
    async fn test_budget_drops_chunk_when_truncation_too_small() {
        let mut config = AppConfig::default();
        // Leaves a budget of 10 tokens ≈ 40 chars, below the 50-char floor.
        config.retrieval.max_context_tokens = 1011;
        config.retrieval.response_reserve = 1000;

        let records = vec![record("a", 0.9, &long_text("squeeze", 10), 0)];
        let (service, _) = service_with(records, config).await;

        let result = service.retrieve("doc", "q", 1).await.unwrap();
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_retrieval_is_deterministic() {
        let records: Vec<VectorRecord> = (0..5)
            .map(|i| record(&format!("r{i}"), 0.8, &long_text("same", 3), i))
            .collect();
        let (service, _) = service_with(records, AppConfig::default()).await;

        let first = service.retrieve("doc", "query", 4).await.unwrap();
        let second = service.retrieve("doc", "query", 4).await.unwrap();
        let ids: Vec<usize> = first.iter().map(|c| c.chunk_index).collect();
        let ids2: Vec<usize> = second.iter().map(|c| c.chunk_index).collect();
        assert_eq!(ids, ids2);
    }

    #[test]
    fn test_estimate_tokens_rounds_up() {
        assert_eq!(estimate_tokens(""), 0);
        assert_eq!(estimate_tokens("abc"), 1);
        assert_eq!(estimate_tokens("abcd"), 1);
        assert_eq!(estimate_tokens("abcde"), 2);
    }

    #[test]
    fn test_last_sentence_boundary() {
        let text = "First sentence. Second sentence. Third";
        let cut = last_sentence_boundary(text, 20).unwrap();
        assert_eq!(&text[..cut], "First sentence.");
        assert!(last_sentence_boundary("no boundary here", 10).is_none());
    }
}
