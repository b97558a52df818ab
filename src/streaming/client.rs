//! Ollama API client
//!
//! Endpoints:
//! - GET  /api/tags      model listing and liveness probe
//! - POST /api/generate  line-delimited streaming generation
//!
//! Non-streaming generation is the streaming path folded by the aggregator;
//! there is no separate request shape for it.

use crate::config::ClientConfig;
use crate::errors::{ClientError, Result};
use crate::models::ModelListing;
use crate::retry::RetryPolicy;
use crate::streaming::aggregate::aggregate;
use crate::streaming::stream::{chunk_stream, ChunkStream};
use crate::types::{GenerationParameters, GenerationResult};
use crate::validation::validate_parameters;
use futures_util::StreamExt;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Client, Response};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Generation endpoint
pub const GENERATE_ENDPOINT: &str = "/api/generate";

/// Model listing endpoint
pub const TAGS_ENDPOINT: &str = "/api/tags";

/// Liveness probe timeout, independent of the configured request timeout
pub const HEALTH_CHECK_TIMEOUT: Duration = Duration::from_secs(5);

/// Ollama API client
///
/// Cheap to clone; clones share the connection pool. Holds no per-call state,
/// so one instance can serve concurrent callers.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    client: Client,
    config: Arc<ClientConfig>,
    retry: RetryPolicy,
}

/// Outcome of [`OllamaClient::generate`]
pub enum Generation {
    /// Chunks as they arrive
    Streaming(ChunkStream),

    /// Aggregated result
    Complete(GenerationResult),
}

/// Body of `POST /api/generate`
#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    #[serde(flatten)]
    parameters: &'a GenerationParameters,
}

impl OllamaClient {
    /// Create new client with default settings
    pub fn new() -> Result<Self> {
        Self::with_config(ClientConfig::default())
    }

    /// Create client with custom configuration
    pub fn with_config(config: ClientConfig) -> Result<Self> {
        config.validate()?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .connect_timeout(config.timeout())
            .default_headers(headers)
            .build()
            .map_err(|e| ClientError::Config(format!("Failed to build HTTP client: {}", e)))?;

        let retry = RetryPolicy::new(config.retry_attempts, config.retry_backoff_factor);

        Ok(Self {
            client,
            config: Arc::new(config),
            retry,
        })
    }

    /// Full URL for an endpoint; leading separators on `endpoint` are ignored
    pub fn endpoint_url(&self, endpoint: &str) -> String {
        format!(
            "{}/{}",
            self.config.normalized_base_url(),
            endpoint.trim_start_matches('/')
        )
    }

    /// List installed models
    pub async fn list_models(&self) -> Result<ModelListing> {
        let url = self.endpoint_url(TAGS_ENDPOINT);
        let request_timeout = self.config.timeout();
        debug!(%url, "listing models");

        let response = self
            .retry
            .execute(|| {
                let request = self.client.get(&url).timeout(request_timeout);
                async move { request.send().await.map_err(ClientError::from) }
            })
            .await?;

        let body = ensure_success(response, request_timeout)
            .await?
            .text()
            .await?;

        serde_json::from_str(&body)
            .map_err(|e| ClientError::invalid_response(format!("Invalid model listing: {}", e)))
    }

    /// Check whether the server answers; never fails
    ///
    /// Single attempt with a short fixed timeout, safe to poll.
    pub async fn health_check(&self) -> bool {
        let url = self.endpoint_url(TAGS_ENDPOINT);

        match self
            .client
            .get(&url)
            .timeout(HEALTH_CHECK_TIMEOUT)
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                debug!(%url, error = %e, "health check failed");
                false
            }
        }
    }

    /// Open a streaming generation
    ///
    /// Parameters are merged over the configured defaults and validated
    /// before anything is sent. An empty `model` falls back to the configured
    /// default model. The returned stream owns the connection.
    pub async fn generate_stream(
        &self,
        model: &str,
        prompt: &str,
        parameters: Option<&GenerationParameters>,
    ) -> Result<ChunkStream> {
        let model = self.resolve_model(model)?;
        let parameters = self.resolve_parameters(parameters)?;
        let url = self.endpoint_url(GENERATE_ENDPOINT);
        let stream_timeout = self.config.stream_timeout();

        let request = GenerateRequest {
            model,
            prompt,
            stream: true,
            parameters: &parameters,
        };
        debug!(%url, model, parameters = parameters.len(), "opening generation stream");

        let response = self
            .retry
            .execute(|| {
                let builder = self.client.post(&url).json(&request);
                async move {
                    match tokio::time::timeout(stream_timeout, builder.send()).await {
                        Ok(sent) => sent.map_err(ClientError::from),
                        Err(_) => Err(ClientError::timeout(format!(
                            "no response within {}s",
                            stream_timeout.as_secs()
                        ))),
                    }
                }
            })
            .await?;

        let response = ensure_success(response, stream_timeout).await?;
        let body = response
            .bytes_stream()
            .map(|read| read.map_err(ClientError::from));

        Ok(chunk_stream(body, Some(stream_timeout)))
    }

    /// Generate and aggregate into one result
    ///
    /// Equivalent to draining [`generate_stream`](Self::generate_stream).
    pub async fn generate_complete(
        &self,
        model: &str,
        prompt: &str,
        parameters: Option<&GenerationParameters>,
    ) -> Result<GenerationResult> {
        let stream = self.generate_stream(model, prompt, parameters).await?;
        aggregate(stream).await
    }

    /// Generate in either mode
    pub async fn generate(
        &self,
        model: &str,
        prompt: &str,
        stream: bool,
        parameters: Option<&GenerationParameters>,
    ) -> Result<Generation> {
        if stream {
            self.generate_stream(model, prompt, parameters)
                .await
                .map(Generation::Streaming)
        } else {
            self.generate_complete(model, prompt, parameters)
                .await
                .map(Generation::Complete)
        }
    }

    /// Release the connection pool held by this handle
    pub fn close(self) {
        debug!(base_url = self.config.normalized_base_url(), "closing client");
    }

    /// Get configuration
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Get retry policy
    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    fn resolve_model<'a>(&'a self, model: &'a str) -> Result<&'a str> {
        if !model.trim().is_empty() {
            return Ok(model);
        }
        self.config
            .default_model
            .as_deref()
            .ok_or_else(|| ClientError::Config("no model given and no default_model configured".to_string()))
    }

    fn resolve_parameters(
        &self,
        parameters: Option<&GenerationParameters>,
    ) -> Result<GenerationParameters> {
        let mut merged = self.config.default_parameters.clone();
        if let Some(parameters) = parameters {
            merged.extend(parameters.to_json_map());
        }
        validate_parameters(&merged)
    }
}

/// Pass successful responses through; turn anything else into `RequestFailed`
///
/// The error body is read for at most `body_timeout`; a body that stalls or
/// fails to read is reported in place of the text.
async fn ensure_success(response: Response, body_timeout: Duration) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = match tokio::time::timeout(body_timeout, response.text()).await {
        Ok(Ok(body)) => body,
        Ok(Err(e)) => format!("<failed to read response body: {}>", e),
        Err(_) => format!(
            "<response body not received within {}s>",
            body_timeout.as_secs()
        ),
    };
    warn!(status = status.as_u16(), "API request failed");
    Err(ClientError::request(
        format!("API request failed with status {}: {}", status.as_u16(), body),
        Some(status.as_u16()),
    ))
}
