//! OpenAI-compatible embedding client.

use arklife_core::{EmbedError, Embedder, EmbeddingConfig, EmbeddingOutput};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error};

/// Default endpoint when none is configured.
pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";

/// Embedder backed by a remote `/embeddings` endpoint.
#[derive(Debug, Clone)]
pub struct OpenAiEmbedder {
    api_key: String,
    model: String,
    endpoint: String,
    client: Client,
}

impl OpenAiEmbedder {
    /// Create a new embedder.
    ///
    /// `endpoint` defaults to [`DEFAULT_API_BASE`]. A trailing slash is ignored.
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        endpoint: Option<String>,
    ) -> Result<Self, EmbedError> {
        Self::with_timeout(api_key, model, endpoint, Duration::from_secs(60))
    }

    /// Create a new embedder with a request timeout.
    pub fn with_timeout(
        api_key: impl Into<String>,
        model: impl Into<String>,
        endpoint: Option<String>,
        timeout: Duration,
    ) -> Result<Self, EmbedError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(EmbedError::MissingApiKey);
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| EmbedError::Request(format!("failed to create HTTP client: {e}")))?;

        let endpoint = endpoint
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            api_key,
            model: model.into(),
            endpoint,
            client,
        })
    }

    /// Endpoint base URL in use.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn embed_batch(&self, batch: &[&str]) -> Result<Vec<EmbeddingOutput>, EmbedError> {
        let request = EmbeddingRequest {
            model: &self.model,
            input: batch,
        };

        let response = self
            .client
            .post(format!("{}/embeddings", self.endpoint))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| EmbedError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Embedding API error {}: {}", status, body);
            return Err(EmbedError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let mut parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| EmbedError::Request(format!("invalid response body: {e}")))?;

        if parsed.data.len() != batch.len() {
            return Err(EmbedError::Inference(format!(
                "expected {} embeddings, got {}",
                batch.len(),
                parsed.data.len()
            )));
        }

        // The service may answer out of order
        parsed.data.sort_by_key(|d| d.index);

        let per_item_tokens = parsed
            .usage
            .map_or(0, |u| u.prompt_tokens / batch.len().max(1));

        Ok(parsed
            .data
            .into_iter()
            .map(|d| EmbeddingOutput {
                embedding: d.embedding,
                token_count: per_item_tokens,
            })
            .collect())
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn embed_text(
        &self,
        texts: &[&str],
        config: &EmbeddingConfig,
    ) -> Result<Vec<EmbeddingOutput>, EmbedError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let batch_size = config.batch_size.max(1);
        let mut outputs = Vec::with_capacity(texts.len());
        for (i, batch) in texts.chunks(batch_size).enumerate() {
            debug!(
                "Embedding batch {} ({} texts) with {}",
                i + 1,
                batch.len(),
                self.model
            );
            outputs.extend(self.embed_batch(batch).await?);
        }

        if let Some(first) = outputs.first() {
            let expected = first.embedding.len();
            if let Some(bad) = outputs.iter().find(|o| o.embedding.len() != expected) {
                return Err(EmbedError::DimensionMismatch {
                    expected,
                    actual: bad.embedding.len(),
                });
            }
        }

        Ok(outputs)
    }
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [&'a str],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
    usage: Option<EmbeddingUsage>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingUsage {
    prompt_tokens: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    #[test]
    fn test_empty_api_key_rejected() {
        let result = OpenAiEmbedder::new("", "text-embedding-3-small", None);
        assert!(matches!(result, Err(EmbedError::MissingApiKey)));
    }

    #[test]
    fn test_default_endpoint_and_trailing_slash() {
        let embedder = OpenAiEmbedder::new("key", "m", None).unwrap();
        assert_eq!(embedder.endpoint(), DEFAULT_API_BASE);

        let embedder =
            OpenAiEmbedder::new("key", "m", Some("http://localhost:9000/v1/".to_string())).unwrap();
        assert_eq!(embedder.endpoint(), "http://localhost:9000/v1");
    }

    #[tokio::test]
    async fn test_embed_sorts_by_index() {
        let mut server = Server::new_async().await;

        let mock = server
            .mock("POST", "/embeddings")
            .match_header("authorization", "Bearer test-key")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "model": "text-embedding-3-small",
                "input": ["first", "second"]
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{
                "data": [
                    {"index": 1, "embedding": [0.0, 1.0]},
                    {"index": 0, "embedding": [1.0, 0.0]}
                ],
                "usage": {"prompt_tokens": 4, "total_tokens": 4}
            }"#,
            )
            .create_async()
            .await;

        let embedder =
            OpenAiEmbedder::new("test-key", "text-embedding-3-small", Some(server.url())).unwrap();
        let outputs = embedder
            .embed_text(&["first", "second"], &EmbeddingConfig::default())
            .await
            .unwrap();

        assert_eq!(outputs[0].embedding, vec![1.0, 0.0]);
        assert_eq!(outputs[1].embedding, vec![0.0, 1.0]);
        assert_eq!(outputs[0].token_count, 2);

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_embed_batches_requests() {
        let mut server = Server::new_async().await;

        let mock = server
            .mock("POST", "/embeddings")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"data": [{"index": 0, "embedding": [0.5, 0.5]}]}"#)
            .expect(3)
            .create_async()
            .await;

        let embedder = OpenAiEmbedder::new("test-key", "m", Some(server.url())).unwrap();
        let config = EmbeddingConfig { batch_size: 1 };
        let outputs = embedder
            .embed_text(&["a", "b", "c"], &config)
            .await
            .unwrap();

        assert_eq!(outputs.len(), 3);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_embed_api_error() {
        let mut server = Server::new_async().await;

        let _mock = server
            .mock("POST", "/embeddings")
            .with_status(401)
            .with_body("invalid api key")
            .create_async()
            .await;

        let embedder = OpenAiEmbedder::new("bad-key", "m", Some(server.url())).unwrap();
        let result = embedder
            .embed_text(&["a"], &EmbeddingConfig::default())
            .await;

        match result {
            Err(EmbedError::Api { status, body }) => {
                assert_eq!(status, 401);
                assert_eq!(body, "invalid api key");
            }
            other => panic!("Expected Api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_embed_count_mismatch() {
        let mut server = Server::new_async().await;

        let _mock = server
            .mock("POST", "/embeddings")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"data": []}"#)
            .create_async()
            .await;

        let embedder = OpenAiEmbedder::new("key", "m", Some(server.url())).unwrap();
        let result = embedder
            .embed_text(&["a"], &EmbeddingConfig::default())
            .await;

        assert!(matches!(result, Err(EmbedError::Inference(_))));
    }

    #[tokio::test]
    async fn test_embed_empty_input_makes_no_request() {
        let embedder = OpenAiEmbedder::new("key", "m", Some("http://127.0.0.1:9".to_string()))
            .unwrap();
        let outputs = embedder
            .embed_text(&[], &EmbeddingConfig::default())
            .await
            .unwrap();

        assert!(outputs.is_empty());
    }
}
