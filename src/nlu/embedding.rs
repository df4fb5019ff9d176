//! Text embeddings: the vector value type, cosine similarity and the
//! provider seam (an OpenAI-compatible `/v1/embeddings` endpoint in production).

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::config::EmbeddingConfig;
use crate::error::{CoreError, CoreResult};

/// Fixed-width embedding vector. Only the storage adapter sees its byte form.
#[derive(Debug, Clone, PartialEq)]
pub struct Embedding(Vec<f32>);

impl Embedding {
    pub fn new(values: Vec<f32>) -> Self {
        Self(values)
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    /// Little-endian `f32` encoding used for the `BYTEA` column.
    pub fn to_le_bytes(&self) -> Vec<u8> {
        self.0.iter().flat_map(|v| v.to_le_bytes()).collect()
    }

    pub fn from_le_bytes(bytes: &[u8]) -> CoreResult<Self> {
        if bytes.len() % 4 != 0 {
            return Err(CoreError::InvalidInput(format!(
                "embedding blob of {} bytes is not a whole number of f32",
                bytes.len()
            )));
        }
        let values = bytes
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        Ok(Self(values))
    }

    pub fn cosine(&self, other: &Embedding) -> f32 {
        cosine_similarity(self.as_slice(), other.as_slice())
    }
}

/// Cosine similarity in `[-1, 1]`; `0.0` for empty, zero or mismatched vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    (dot / (norm_a * norm_b)).clamp(-1.0, 1.0)
}

#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> CoreResult<Embedding>;

    async fn embed_batch(&self, texts: &[String]) -> CoreResult<Vec<Embedding>> {
        let mut out = Vec::with_capacity(texts.len());
        for t in texts {
            out.push(self.embed(t).await?);
        }
        Ok(out)
    }

    fn model_name(&self) -> &str;
}

pub type SharedEmbedder = Arc<dyn Embedder>;

pub struct HttpEmbedder {
    client: reqwest::Client,
    url: String,
    api_key: Option<String>,
    model: String,
}

impl HttpEmbedder {
    pub fn new(cfg: &EmbeddingConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: cfg.url.clone(),
            api_key: cfg.api_key.clone(),
            model: cfg.model.clone(),
        }
    }

    async fn request(&self, input: serde_json::Value) -> CoreResult<Vec<Embedding>> {
        let mut req = self.client.post(&self.url).json(&serde_json::json!({
            "model": self.model,
            "input": input,
        }));
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }

        let response = req
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(unavailable)?
            .json::<EmbeddingResponse>()
            .await
            .map_err(unavailable)?;

        let mut data = response.data;
        data.sort_by_key(|d| d.index);
        debug!(model = %self.model, count = data.len(), "embeddings received");
        Ok(data.into_iter().map(|d| Embedding(d.embedding)).collect())
    }
}

fn unavailable(e: reqwest::Error) -> CoreError {
    CoreError::CapabilityUnavailable(format!("embedding provider: {e}"))
}

#[async_trait]
impl Embedder for HttpEmbedder {
    async fn embed(&self, text: &str) -> CoreResult<Embedding> {
        self.request(serde_json::json!(text))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| CoreError::CapabilityUnavailable("empty embedding response".into()))
    }

    async fn embed_batch(&self, texts: &[String]) -> CoreResult<Vec<Embedding>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let out = self.request(serde_json::json!(texts)).await?;
        if out.len() != texts.len() {
            return Err(CoreError::CapabilityUnavailable(format!(
                "asked for {} embeddings, got {}",
                texts.len(),
                out.len()
            )));
        }
        Ok(out)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    #[serde(default)]
    index: usize,
}


#[cfg(test)]
mod tests {
    use super::testing::KeywordEmbedder;
    use super::*;

    #[test]
    fn cosine_basics() {
        let a = [1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &a) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&a, &[0.0, 1.0, 0.0]).abs() < 1e-6);
        assert!((cosine_similarity(&a, &[-1.0, 0.0, 0.0]) + 1.0).abs() < 1e-6);
        assert_eq!(cosine_similarity(&a, &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&a, &[0.0, 0.0, 0.0]), 0.0);
    }

    #[test]
    fn cosine_is_symmetric() {
        let a = [0.3, -0.2, 0.9];
        let b = [0.1, 0.5, 0.4];
        assert_eq!(cosine_similarity(&a, &b), cosine_similarity(&b, &a));
    }

    #[test]
    fn byte_encoding_is_little_endian_f32() {
        let e = Embedding::new(vec![1.0, -2.5, 0.125]);
        let bytes = e.to_le_bytes();
        assert_eq!(bytes.len(), 12);
        assert_eq!(&bytes[0..4], &1.0f32.to_le_bytes());
        assert_eq!(Embedding::from_le_bytes(&bytes).unwrap(), e);
    }

    #[test]
    fn malformed_blob_is_rejected() {
        let err = Embedding::from_le_bytes(&[0, 1, 2]).unwrap_err();
        assert!(matches!(err, CoreError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn keyword_embedder_is_deterministic() {
        let embedder = KeywordEmbedder::new(&["arroz", "frango"]);
        let a = embedder.embed("Arroz integral").await.unwrap();
        let b = embedder.embed("arroz integral").await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a.as_slice(), &[1.0, 0.0]);
        let batch = embedder
            .embed_batch(&["frango".to_string(), "arroz e frango".to_string()])
            .await
            .unwrap();
        assert_eq!(batch[1].as_slice(), &[1.0, 1.0]);
    }
}
