//! Gemini API client implementation

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::timeout;

use docqa_core::{
    Embedder, LLMProvider, GenerationConfig, GenerationResult,
    Error, Result,
};

use crate::config::GeminiConfig;

/// Gemini client for text generation and embeddings
pub struct GeminiClient {
    config: GeminiConfig,
    client: Client,
    current_model: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct Part {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    pub parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerationParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    pub max_output_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub stop_sequences: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerationRequest {
    pub contents: Vec<Content>,
    pub generation_config: GenerationParams,
}

#[derive(Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<ResponseContent>,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    total_token_count: Option<u32>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerationResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct EmbedRequest {
    pub model: String,
    pub content: Content,
    pub task_type: &'static str,
}

#[derive(Debug, Serialize)]
pub(crate) struct BatchEmbedRequest {
    pub requests: Vec<EmbedRequest>,
}

#[derive(Deserialize)]
struct EmbeddingValues {
    values: Vec<f32>,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embedding: EmbeddingValues,
}

#[derive(Deserialize)]
struct BatchEmbedResponse {
    #[serde(default)]
    embeddings: Vec<EmbeddingValues>,
}

const TASK_DOCUMENT: &str = "RETRIEVAL_DOCUMENT";
const TASK_QUERY: &str = "RETRIEVAL_QUERY";

impl GeminiClient {
    /// Create a new Gemini client from configuration
    pub fn new(config: GeminiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| Error::Network(e.to_string()))?;

        let current_model = config.chat_model.clone();

        Ok(Self {
            config,
            client,
            current_model,
        })
    }

    /// Create a new Gemini client from environment variables
    pub fn from_env() -> Result<Self> {
        let config = GeminiConfig::from_env()?;
        Self::new(config)
    }

    /// Set the model to use for generation
    pub fn with_model(mut self, model_id: impl Into<String>) -> Self {
        self.current_model = model_id.into();
        self
    }

    pub(crate) fn build_generation_request(
        prompt: &str,
        config: &GenerationConfig,
    ) -> GenerationRequest {
        GenerationRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part { text: prompt.to_string() }],
            }],
            generation_config: GenerationParams {
                temperature: config.temperature,
                max_output_tokens: config.max_tokens,
                top_p: config.top_p,
                top_k: config.top_k,
                stop_sequences: config.stop_sequences.clone(),
            },
        }
    }

    pub(crate) fn build_embed_request(&self, text: &str, task_type: &'static str) -> EmbedRequest {
        EmbedRequest {
            model: self.config.embedding_model.clone(),
            content: Content {
                role: None,
                parts: vec![Part { text: text.to_string() }],
            },
            task_type,
        }
    }

    /// Pull the answer text out of a generateContent response
    pub(crate) fn extract_text(response: GenerationResponse) -> Result<(String, Option<String>, Option<u32>)> {
        if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
            return Err(Error::LLMProvider(format!("Prompt was blocked: {}", reason)));
        }

        let tokens = response.usage_metadata.and_then(|u| u.total_token_count);

        let Some(candidate) = response.candidates.into_iter().next() else {
            return Err(Error::LLMProvider("Gemini returned no candidates".to_string()));
        };

        let text: String = candidate
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        Ok((text, candidate.finish_reason, tokens))
    }

    async fn post_json<B: Serialize + ?Sized>(&self, url: &str, body: &B) -> Result<reqwest::Response> {
        self.client
            .post(url)
            .query(&[("key", self.config.api_key.as_str())])
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| Error::Network(e.without_url().to_string()))
    }

    /// Perform the actual generation request
    async fn perform_generation(
        &self,
        prompt: &str,
        config: &GenerationConfig,
    ) -> Result<GenerationResult> {
        let request_body = Self::build_generation_request(prompt, config);
        let url = format!(
            "{}/models/{}:generateContent",
            self.config.api_url, config.model_id
        );

        tracing::debug!(model = %config.model_id, prompt_len = prompt.len(), "Sending generation request");

        let response = self.post_json(&url, &request_body).await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(Error::LLMProvider(format!(
                "Gemini API request failed with status {}: {}",
                status, error_text
            )));
        }

        let data: GenerationResponse = response
            .json()
            .await
            .map_err(|e| Error::Serialization(e.to_string()))?;

        let (text, finish_reason, tokens_used) = Self::extract_text(data)?;

        Ok(GenerationResult {
            text: text.trim().to_string(),
            model_id: config.model_id.clone(),
            tokens_used,
            finish_reason,
        })
    }

    async fn perform_embedding(&self, text: &str, task_type: &'static str) -> Result<Vec<f32>> {
        let url = format!(
            "{}/{}:embedContent",
            self.config.api_url, self.config.embedding_model
        );
        let response = self.post_json(&url, &self.build_embed_request(text, task_type)).await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(Error::Embedding(format!(
                "Gemini embedding request failed with status {}: {}",
                status, error_text
            )));
        }

        let data: EmbedResponse = response
            .json()
            .await
            .map_err(|e| Error::Serialization(e.to_string()))?;

        Ok(data.embedding.values)
    }
}

#[async_trait]
impl LLMProvider for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<GenerationResult> {
        let config = GenerationConfig {
            model_id: self.current_model.clone(),
            ..Default::default()
        };
        self.generate_with_config(prompt, &config).await
    }

    async fn generate_with_config(
        &self,
        prompt: &str,
        config: &GenerationConfig,
    ) -> Result<GenerationResult> {
        let generation_future = self.perform_generation(prompt, config);

        match timeout(config.timeout, generation_future).await {
            Ok(result) => result,
            Err(_) => Err(Error::Timeout(format!(
                "Generation request timed out after {}s",
                config.timeout.as_secs()
            ))),
        }
    }

    fn model_id(&self) -> &str {
        &self.current_model
    }
}

#[async_trait]
impl Embedder for GeminiClient {
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!(
            "{}/{}:batchEmbedContents",
            self.config.api_url, self.config.embedding_model
        );
        let body = BatchEmbedRequest {
            requests: texts
                .iter()
                .map(|text| self.build_embed_request(text, TASK_DOCUMENT))
                .collect(),
        };

        let response = self.post_json(&url, &body).await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(Error::Embedding(format!(
                "Gemini batch embedding request failed with status {}: {}",
                status, error_text
            )));
        }

        let data: BatchEmbedResponse = response
            .json()
            .await
            .map_err(|e| Error::Serialization(e.to_string()))?;

        if data.embeddings.len() != texts.len() {
            return Err(Error::Embedding(format!(
                "Expected {} embeddings, got {}",
                texts.len(),
                data.embeddings.len()
            )));
        }

        Ok(data.embeddings.into_iter().map(|e| e.values).collect())
    }

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        self.perform_embedding(text, TASK_QUERY).await
    }

    fn model_id(&self) -> &str {
        &self.config.embedding_model
    }
}
