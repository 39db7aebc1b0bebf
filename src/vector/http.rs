//! HTTP Vector Index Client
//!
//! Client for a serverless vector index exposing the common REST shape:
//! `/vectors/upsert`, `/query`, `/describe_index_stats`, `/vectors/delete`.
//! All calls carry the configured deadline and retry once with backoff on
//! transient failures. Provider error bodies are logged, never propagated
//! into error messages.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use super::{
    ChunkMetadata, NamespaceStats, Result, VectorIndex, VectorIndexError, VectorMatch,
    VectorRecord,
};

const RETRY_BACKOFF: Duration = Duration::from_millis(250);

pub struct HttpVectorIndex {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    timeout: Duration,
}

impl HttpVectorIndex {
    pub fn new(base_url: &str, api_key: Option<String>, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            timeout,
        }
    }

    async fn post_json(&self, path: &str, body: &Value) -> Result<Value> {
        let url = format!("{}/{}", self.base_url, path);
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            let mut request = self.client.post(&url).timeout(self.timeout).json(body);
            if let Some(key) = &self.api_key {
                request = request.header("Api-Key", key);
            }

            match tokio::time::timeout(self.timeout, request.send()).await {
                Err(_) => return Err(VectorIndexError::Timeout),
                Ok(Err(e)) if e.is_timeout() => return Err(VectorIndexError::Timeout),
                Ok(Err(e)) => {
                    if e.is_connect() && attempt == 1 {
                        tracing::warn!("Vector index connect failure, retrying: {e}");
                        tokio::time::sleep(RETRY_BACKOFF).await;
                        continue;
                    }
                    return Err(VectorIndexError::Network(e));
                }
                Ok(Ok(response)) => {
                    let status = response.status();
                    if status.is_success() {
                        return response
                            .json()
                            .await
                            .map_err(|e| VectorIndexError::InvalidResponse(e.to_string()));
                    }
                    let body_text = response.text().await.unwrap_or_default();
                    if status.is_server_error() && attempt == 1 {
                        tracing::warn!("Vector index returned {status}, retrying: {body_text}");
                        tokio::time::sleep(RETRY_BACKOFF * 2u32.pow(attempt - 1)).await;
                        continue;
                    }
                    tracing::error!("Vector index error {status}: {body_text}");
                    return Err(VectorIndexError::Api(format!("HTTP {status}")));
                }
            }
        }
    }
}

#[async_trait]
impl VectorIndex for HttpVectorIndex {
    async fn upsert(&self, namespace: &str, records: Vec<VectorRecord>) -> Result<()> {
        let vectors: Vec<Value> = records
            .iter()
            .map(|r| {
                json!({
                    "id": r.id,
                    "values": r.values,
                    "metadata": r.metadata,
                })
            })
            .collect();

        self.post_json(
            "vectors/upsert",
            &json!({ "vectors": vectors, "namespace": namespace }),
        )
        .await?;
        tracing::debug!("Upserted {} vectors into namespace {namespace}", records.len());
        Ok(())
    }

    async fn query(
        &self,
        namespace: &str,
        vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<VectorMatch>> {
        let response = self
            .post_json(
                "query",
                &json!({
                    "vector": vector,
                    "topK": top_k,
                    "namespace": namespace,
                    "includeMetadata": true,
                }),
            )
            .await?;

        let matches = response
            .get("matches")
            .and_then(Value::as_array)
            .ok_or_else(|| VectorIndexError::InvalidResponse("missing matches".to_string()))?;

        let mut results = Vec::with_capacity(matches.len());
        for entry in matches {
            let id = entry
                .get("id")
                .and_then(Value::as_str)
                .ok_or_else(|| VectorIndexError::InvalidResponse("match without id".to_string()))?
                .to_string();
            let score = entry
                .get("score")
                .and_then(Value::as_f64)
                .unwrap_or_default() as f32;
            let metadata: ChunkMetadata =
                serde_json::from_value(entry.get("metadata").cloned().unwrap_or(Value::Null))
                    .map_err(|e| {
                        VectorIndexError::InvalidResponse(format!("bad metadata for {id}: {e}"))
                    })?;
            results.push(VectorMatch { id, score, metadata });
        }
        Ok(results)
    }

    async fn list_namespaces(&self) -> Result<Vec<NamespaceStats>> {
        let response = self.post_json("describe_index_stats", &json!({})).await?;

        let namespaces = response
            .get("namespaces")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();

        let mut stats: Vec<NamespaceStats> = namespaces
            .into_iter()
            .map(|(namespace, value)| NamespaceStats {
                vector_count: value
                    .get("vectorCount")
                    .and_then(Value::as_u64)
                    .unwrap_or_default() as usize,
                namespace,
            })
            .filter(|s| s.vector_count > 0)
            .collect();
        stats.sort_by(|a, b| a.namespace.cmp(&b.namespace));
        Ok(stats)
    }

    async fn delete_namespace(&self, namespace: &str) -> Result<()> {
        self.post_json(
            "vectors/delete",
            &json!({ "deleteAll": true, "namespace": namespace }),
        )
        .await?;
        tracing::info!("Deleted namespace {namespace}");
        Ok(())
    }
}
