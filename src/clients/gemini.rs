//! Gemini REST implementation of the completion and embedding traits.
//!
//! Talks to the `generateContent` and `embedContent` endpoints of the
//! Generative Language API. Built once at startup and shared read-only; the
//! base URL is overridable so tests can point the client at a mock server.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::{ClientError, CompletionClient, EmbeddingClient};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_MODEL: &str = "gemini-2.0-flash";
const DEFAULT_EMBED_MODEL: &str = "text-embedding-004";
/// Dimensionality of `text-embedding-004` vectors.
const DEFAULT_EMBED_DIM: usize = 768;

/// HTTP client for the Gemini completion and embedding endpoints.
#[derive(Clone, Debug)]
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    embed_model: String,
    embed_dim: usize,
}

impl GeminiClient {
    /// Build a client with default models and endpoint.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            embed_model: DEFAULT_EMBED_MODEL.to_string(),
            embed_dim: DEFAULT_EMBED_DIM,
        }
    }

    /// Build a client from `GEMINI_API_KEY` (and optionally `GEMINI_MODEL`),
    /// loading `.env` first when present.
    pub fn from_env() -> Result<Self, ClientError> {
        dotenvy::dotenv().ok();
        let api_key = std::env::var("GEMINI_API_KEY").map_err(|_| ClientError::MissingApiKey)?;
        let mut client = Self::new(api_key);
        if let Ok(model) = std::env::var("GEMINI_MODEL") {
            client.model = model;
        }
        Ok(client)
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    #[must_use]
    pub fn with_embed_model(mut self, embed_model: impl Into<String>, dimension: usize) -> Self {
        self.embed_model = embed_model.into();
        self.embed_dim = dimension;
        self
    }

    async fn post_json<B: Serialize, R: for<'de> Deserialize<'de>>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<R, ClientError> {
        let url = format!("{}/{endpoint}?key={}", self.base_url, self.api_key);
        let response = self.http.post(&url).json(body).send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ClientError::Api {
                status: status.as_u16(),
                message,
            });
        }
        response
            .json::<R>()
            .await
            .map_err(|err| ClientError::Malformed(err.to_string()))
    }
}

#[async_trait]
impl CompletionClient for GeminiClient {
    #[instrument(skip(self, prompt), fields(model = %self.model))]
    async fn complete(&self, prompt: &str) -> Result<String, ClientError> {
        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
        };
        let endpoint = format!("models/{}:generateContent", self.model);
        let reply: GenerateResponse = self.post_json(&endpoint, &body).await?;

        let text = reply
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content.parts.into_iter().next())
            .map(|part| part.text)
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(ClientError::Empty);
        }
        Ok(text)
    }
}

#[async_trait]
impl EmbeddingClient for GeminiClient {
    #[instrument(skip(self, text), fields(model = %self.embed_model))]
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ClientError> {
        let body = EmbedRequest {
            model: format!("models/{}", self.embed_model),
            content: Content {
                parts: vec![Part {
                    text: text.to_string(),
                }],
            },
        };
        let endpoint = format!("models/{}:embedContent", self.embed_model);
        let reply: EmbedResponse = self.post_json(&endpoint, &body).await?;

        if reply.embedding.values.is_empty() {
            return Err(ClientError::Empty);
        }
        Ok(reply.embedding.values)
    }

    fn dimension(&self) -> usize {
        self.embed_dim
    }
}

// ── Wire types ─────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    text: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Content,
}

#[derive(Debug, Serialize)]
struct EmbedRequest {
    model: String,
    content: Content,
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embedding: EmbeddingValues,
}

#[derive(Debug, Deserialize)]
struct EmbeddingValues {
    #[serde(default)]
    values: Vec<f32>,
}
