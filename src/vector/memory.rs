//! In-Memory Vector Index
//!
//! Brute-force cosine search over namespaced vectors. Backs local
//! development and the integration tests; the production deployment points
//! at an external index over HTTP.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{NamespaceStats, Result, VectorIndex, VectorMatch, VectorRecord};

#[derive(Default)]
pub struct InMemoryVectorIndex {
    namespaces: RwLock<HashMap<String, Vec<VectorRecord>>>,
}

impl InMemoryVectorIndex {
    pub fn new() -> Self {
        Self::default()
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[async_trait]
impl VectorIndex for InMemoryVectorIndex {
    async fn upsert(&self, namespace: &str, records: Vec<VectorRecord>) -> Result<()> {
        let mut namespaces = self.namespaces.write().await;
        let existing = namespaces.entry(namespace.to_string()).or_default();
        for record in records {
            if let Some(slot) = existing.iter_mut().find(|r| r.id == record.id) {
                *slot = record;
            } else {
                existing.push(record);
            }
        }
        Ok(())
    }

    async fn query(
        &self,
        namespace: &str,
        vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<VectorMatch>> {
        let namespaces = self.namespaces.read().await;
        let Some(records) = namespaces.get(namespace) else {
            return Ok(Vec::new());
        };

        let mut matches: Vec<VectorMatch> = records
            .iter()
            .map(|r| VectorMatch {
                id: r.id.clone(),
                score: cosine_similarity(vector, &r.values),
                metadata: r.metadata.clone(),
            })
            .collect();
        matches.sort_by(|a, b| b.score.total_cmp(&a.score));
        matches.truncate(top_k);
        Ok(matches)
    }

    async fn list_namespaces(&self) -> Result<Vec<NamespaceStats>> {
        let namespaces = self.namespaces.read().await;
        let mut stats: Vec<NamespaceStats> = namespaces
            .iter()
            .filter(|(_, records)| !records.is_empty())
            .map(|(namespace, records)| NamespaceStats {
                namespace: namespace.clone(),
                vector_count: records.len(),
            })
            .collect();
        stats.sort_by(|a, b| a.namespace.cmp(&b.namespace));
        Ok(stats)
    }

    async fn delete_namespace(&self, namespace: &str) -> Result<()> {
        self.namespaces.write().await.remove(namespace);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector::ChunkMetadata;

    fn record(id: &str, values: Vec<f32>) -> VectorRecord {
        VectorRecord {
            id: id.to_string(),
            values,
            metadata: ChunkMetadata {
                text: format!("text for {id}"),
                filename: "test.pdf".to_string(),
                page_number: 1,
                chunk_index: 0,
                char_start: None,
                char_end: None,
            },
        }
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert!((cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }

    #[tokio::test]
    async fn test_query_ranks_by_similarity() {
        let index = InMemoryVectorIndex::new();
        index
            .upsert(
                "ns",
                vec![
                    record("far", vec![0.0, 1.0]),
                    record("near", vec![1.0, 0.05]),
                    record("mid", vec![0.7, 0.7]),
                ],
            )
            .await
            .unwrap();

        let matches = index.query("ns", &[1.0, 0.0], 2).await.unwrap();
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].id, "near");
        assert_eq!(matches[1].id, "mid");
        assert!(matches[0].score >= matches[1].score);
    }

    #[tokio::test]
    async fn test_namespaces_are_isolated() {
        let index = InMemoryVectorIndex::new();
        index.upsert("a", vec![record("1", vec![1.0])]).await.unwrap();
        index.upsert("b", vec![record("2", vec![1.0])]).await.unwrap();

        let matches = index.query("a", &[1.0], 10).await.unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].id, "1");

        let matches = index.query("missing", &[1.0], 10).await.unwrap();
        assert!(matches.is_empty());
    }

    #[tokio::test]
    async fn test_upsert_replaces_by_id() {
        let index = InMemoryVectorIndex::new();
        index.upsert("ns", vec![record("1", vec![1.0, 0.0])]).await.unwrap();
        index.upsert("ns", vec![record("1", vec![0.0, 1.0])]).await.unwrap();

        let stats = index.list_namespaces().await.unwrap();
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].vector_count, 1);

        let matches = index.query("ns", &[0.0, 1.0], 1).await.unwrap();
        assert!((matches[0].score - 1.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_delete_namespace() {
        let index = InMemoryVectorIndex::new();
        index.upsert("ns", vec![record("1", vec![1.0])]).await.unwrap();
        index.delete_namespace("ns").await.unwrap();

        assert!(index.list_namespaces().await.unwrap().is_empty());
        assert!(index.query("ns", &[1.0], 5).await.unwrap().is_empty());
    }
}
