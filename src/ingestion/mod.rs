//! Document Ingestion
//!
//! Everything between an uploaded PDF byte stream and a fully indexed
//! document namespace: extraction, chunking, embedding, upsert.

pub mod chunker;
pub mod pdf;
pub mod service;

pub use chunker::{ChunkerConfig, HybridChunker, PageChunk};
pub use pdf::{ExtractedFile, PdfExtractor};
pub use service::{DocumentSummary, IngestedDocument, IngestionService, UploadedFile};
