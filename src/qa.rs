//! Question-Answering Service
//!
//! Grounded answering over retrieved context with a dual-signal fallback:
//! when retrieval is too weak (pre-signal) or the model's answer disclaims
//! coverage (post-signal), the question is re-asked without context and the
//! response opens by saying the material does not cover it.

use std::sync::Arc;

use serde::Serialize;

use crate::error::Result;
use crate::prompting::{
    self, build_prompt, classify, indicates_missing_info, is_low_similarity, post_process,
};
use crate::providers::CompletionProvider;
use crate::retrieval::RetrievalService;

/// Chunks retrieved per question.
const QA_TOP_K: usize = 5;
/// Sources reported back to the client.
const SOURCE_LIMIT: usize = 3;
/// Source preview length in characters.
const SOURCE_TEXT_LIMIT: usize = 300;

#[derive(Debug, Clone, Serialize)]
pub struct SourceRef {
    pub text: String,
    pub page_number: u32,
    pub filename: String,
    pub similarity: f32,
}

#[derive(Debug, Clone)]
pub struct QaAnswer {
    pub answer: String,
    pub sources: Vec<SourceRef>,
    pub from_document: bool,
}

#[derive(Clone)]
pub struct QaService {
    retrieval: RetrievalService,
    completer: Arc<dyn CompletionProvider>,
    similarity_threshold: f32,
}

impl QaService {
    pub fn new(
        retrieval: RetrievalService,
        completer: Arc<dyn CompletionProvider>,
        similarity_threshold: f32,
    ) -> Self {
        Self {
            retrieval,
            completer,
            similarity_threshold,
        }
    }

    /// Answer a question against one document.
    pub async fn answer(&self, document_id: &str, question: &str) -> Result<QaAnswer> {
        let chunks = self.retrieval.retrieve(document_id, question, QA_TOP_K).await?;

        if is_low_similarity(&chunks, self.similarity_threshold) {
            tracing::info!(
                "Weak retrieval for question ({} chunks), answering from general knowledge",
                chunks.len()
            );
            return self.fallback(question).await;
        }

        let question_type = classify(question);
        tracing::debug!("Classified question as {}", question_type.as_str());

        let prompt = build_prompt(question, question_type, &chunks);
        let raw = self.completer.complete(&prompt).await?;
        let answer = post_process(&raw);

        if indicates_missing_info(&answer) {
            tracing::info!("Answer disclaims coverage, answering from general knowledge");
            return self.fallback(question).await;
        }

        let sources = chunks
            .iter()
            .take(SOURCE_LIMIT)
            .map(|c| SourceRef {
                text: preview(&c.text),
                page_number: c.page_number,
                filename: c.filename.clone(),
                similarity: c.similarity,
            })
            .collect();

        Ok(QaAnswer {
            answer,
            sources,
            from_document: true,
        })
    }

    async fn fallback(&self, question: &str) -> Result<QaAnswer> {
        let raw = self
            .completer
            .complete(&prompting::templates::fallback_prompt(question))
            .await?;
        Ok(QaAnswer {
            answer: raw.trim().to_string(),
            sources: Vec::new(),
            from_document: false,
        })
    }
}

fn preview(text: &str) -> String {
    if text.chars().count() <= SOURCE_TEXT_LIMIT {
        return text.to_string();
    }
    let cut: String = text.chars().take(SOURCE_TEXT_LIMIT).collect();
    format!("{}...", cut.trim_end())
}
