//! Study Assistant Server
//!
//! Turns uploaded PDF study material into interactive learning artifacts:
//! grounded question-answering, quizzes (including an adaptively-difficult
//! competitive variant), summaries, and flashcards. Documents are chunked,
//! embedded, and indexed under per-document namespaces in an external
//! vector index; everything else is generated on demand from retrieved
//! context.

pub mod api;
pub mod config;
pub mod error;
pub mod generate;
pub mod ingestion;
pub mod prompting;
pub mod providers;
pub mod qa;
pub mod quiz;
pub mod retrieval;
pub mod startup;
pub mod vector;
