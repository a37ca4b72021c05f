//! Gemini API client for embeddings and answer generation
//!
//! One client implements both provider traits so indexing and querying are
//! guaranteed to use the same embedding model and dimensionality.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::GeminiConfig;
use crate::error::{Error, Result};

use super::embedding::{EmbeddingProvider, EmbeddingTask};
use super::llm::LlmProvider;
use super::retry::with_backoff;

/// Gemini REST client with automatic retry on rate limits
pub struct GeminiClient {
    client: Client,
    config: GeminiConfig,
}

#[derive(Serialize)]
struct EmbedRequest {
    content: Content,
    #[serde(rename = "taskType")]
    task_type: &'static str,
    #[serde(rename = "outputDimensionality")]
    output_dimensionality: usize,
}

#[derive(Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Serialize)]
struct Part {
    text: String,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embedding: EmbeddingValues,
}

#[derive(Deserialize)]
struct EmbeddingValues {
    values: Vec<f32>,
}

#[derive(Deserialize)]
struct GenerateResponse {
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: ResponseContent,
}

#[derive(Deserialize)]
struct ResponseContent {
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: String,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiError,
}

#[derive(Deserialize)]
struct ApiError {
    #[serde(default)]
    status: String,
    #[serde(default)]
    message: String,
}

impl EmbeddingTask {
    fn as_api_str(self) -> &'static str {
        match self {
            Self::Document => "RETRIEVAL_DOCUMENT",
            Self::Query => "RETRIEVAL_QUERY",
        }
    }
}

/// Classify an error response body. Structured `status` wins; the "quota"
/// substring check is a fallback heuristic for providers that omit it.
fn classify_failure(status: StatusCode, body: &str, fatal: fn(String) -> Error) -> Error {
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Error::RateLimited(format!("HTTP 429: {body}"));
    }
    if let Ok(parsed) = serde_json::from_str::<ApiErrorBody>(body) {
        if parsed.error.status == "RESOURCE_EXHAUSTED" {
            return Error::RateLimited(parsed.error.message);
        }
    }
    if body.to_lowercase().contains("quota") {
        return Error::RateLimited(format!("HTTP {status}: {body}"));
    }
    fatal(format!("HTTP {status}: {body}"))
}

impl GeminiClient {
    /// Create a client; the timeout applies to every request it issues
    pub fn new(config: &GeminiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    fn embed_endpoint(&self) -> String {
        format!(
            "{}/models/{}:embedContent",
            self.config.base_url, self.config.embed_model
        )
    }

    fn generate_endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.base_url, self.config.generate_model
        )
    }

    async fn embed_once(&self, text: &str, task: EmbeddingTask) -> Result<Vec<f32>> {
        let request = EmbedRequest {
            content: Content {
                parts: vec![Part {
                    text: text.to_string(),
                }],
            },
            task_type: task.as_api_str(),
            output_dimensionality: self.config.dimensions,
        };

        let response = self
            .client
            .post(self.embed_endpoint())
            .header("x-goog-api-key", &self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::embedding(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_failure(status, &body, Error::Embedding));
        }

        let parsed: EmbedResponse = response
            .json()
            .await
            .map_err(|e| Error::embedding(format!("malformed response: {e}")))?;

        if parsed.embedding.values.len() != self.config.dimensions {
            return Err(Error::embedding(format!(
                "provider returned {} dimensions, expected {}",
                parsed.embedding.values.len(),
                self.config.dimensions
            )));
        }

        Ok(parsed.embedding.values)
    }

    async fn generate_once(&self, prompt: &str) -> Result<String> {
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: self.config.temperature,
            },
        };

        let response = self
            .client
            .post(self.generate_endpoint())
            .header("x-goog-api-key", &self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::generation(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_failure(status, &body, Error::Generation));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| Error::generation(format!("malformed response: {e}")))?;

        parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text)
            .ok_or_else(|| Error::generation("no text in response"))
    }
}

#[async_trait]
impl EmbeddingProvider for GeminiClient {
    async fn embed(&self, text: &str, task: EmbeddingTask) -> Result<Vec<f32>> {
        if text.trim().is_empty() {
            return Err(Error::validation("cannot embed empty text"));
        }

        with_backoff("embed", self.config.max_retries, || {
            self.embed_once(text, task)
        })
        .await
    }

    fn dimensions(&self) -> usize {
        self.config.dimensions
    }

    fn name(&self) -> &str {
        "gemini"
    }
}

#[async_trait]
impl LlmProvider for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        if prompt.trim().is_empty() {
            return Err(Error::validation("cannot generate from an empty prompt"));
        }

        with_backoff("generate", self.config.max_retries, || {
            self.generate_once(prompt)
        })
        .await
    }

    fn name(&self) -> &str {
        "gemini"
    }

    fn model(&self) -> &str {
        &self.config.generate_model
    }
}
