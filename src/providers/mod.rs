/*!
 * Provider implementations for the model backends.
 *
 * This module contains client implementations for various LLM providers:
 * - Ollama: Local LLM server
 * - OpenAI: OpenAI API integration, also used for LM Studio
 * - Anthropic: Anthropic API integration
 *
 * The translation and summarization engines only talk to the `Provider`
 * trait, so any backend can serve either capability.
 */

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use log::{debug, warn};
use reqwest::Client;
use reqwest::header::HeaderMap;
use serde::Serialize;
use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

use crate::app_config::{ModelConfig, ModelProvider};
use crate::errors::ProviderError;

pub mod anthropic;
pub mod mock;
pub mod ollama;
pub mod openai;

/// One prompt sent to a model
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    /// Model name
    pub model: String,
    /// System message to guide the model
    pub system: Option<String>,
    /// User prompt
    pub prompt: String,
    /// Sampling temperature
    pub temperature: Option<f32>,
    /// Upper bound on generated tokens
    pub max_tokens: Option<u32>,
}

impl CompletionRequest {
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            system: None,
            prompt: prompt.into(),
            temperature: None,
            max_tokens: None,
        }
    }

    pub fn system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// Text generated by a model
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CompletionResponse {
    /// The generated text
    pub text: String,
    /// Prompt tokens, when reported
    pub prompt_tokens: Option<u64>,
    /// Generated tokens, when reported
    pub completion_tokens: Option<u64>,
}

/// Common trait for all LLM providers
///
/// This trait defines the interface that all provider implementations must follow,
/// allowing them to be used interchangeably by the engines.
#[async_trait]
pub trait Provider: Send + Sync + Debug {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Complete a request using this provider
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, ProviderError>;

    /// Test the connection to the provider
    async fn test_connection(&self) -> Result<(), ProviderError>;
}

/// Retry settings for transient HTTP failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of retry attempts after the first one
    pub max_retries: u32,
    /// Base backoff time in milliseconds for exponential backoff
    pub backoff_base_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff_base_ms: 1000,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, backoff_base_ms: u64) -> Self {
        Self {
            max_retries,
            backoff_base_ms,
        }
    }

    /// No retries at all
    pub fn none() -> Self {
        Self::new(0, 0)
    }

    /// Delay before retry number `attempt` (1-based)
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u64 << attempt.saturating_sub(1).min(16);
        Duration::from_millis(self.backoff_base_ms.saturating_mul(factor))
    }
}

/// HTTP client with a per-request timeout
pub(crate) fn build_client(timeout_secs: u64) -> Client {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs.max(1)))
        .pool_idle_timeout(Duration::from_secs(90))
        .build()
        .unwrap_or_default()
}

fn classify_send_error(provider: &str, error: reqwest::Error) -> ProviderError {
    if error.is_timeout() {
        ProviderError::Timeout(format!("{} request: {}", provider, error))
    } else {
        ProviderError::ConnectionError(format!("Failed to send request to {}: {}", provider, error))
    }
}

/// POST a JSON body and return the raw response text.
///
/// Network failures, rate limiting and 5xx answers are retried with
/// exponential backoff; any other error status is returned at once.
pub(crate) async fn post_with_retry<B>(
    client: &Client,
    url: &str,
    headers: HeaderMap,
    body: &B,
    retry: RetryPolicy,
    provider: &'static str,
) -> Result<String, ProviderError>
where
    B: Serialize + Sync + ?Sized,
{
    let mut attempt = 0;

    loop {
        let result = client
            .post(url)
            .headers(headers.clone())
            .json(body)
            .send()
            .await;

        let error = match result {
            Ok(response) => {
                let status = response.status();
                if status.is_success() {
                    return response.text().await.map_err(|e| {
                        ProviderError::ParseError(format!("Failed to read {} response: {}", provider, e))
                    });
                }
                let error_text = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Failed to get error response text".to_string());
                ProviderError::from_status(status.as_u16(), error_text)
            }
            Err(e) => classify_send_error(provider, e),
        };

        attempt += 1;
        if !error.is_retryable() || attempt > retry.max_retries {
            return Err(error);
        }

        warn!(
            "{} request failed: {} - attempt {}/{}",
            provider,
            error,
            attempt,
            retry.max_retries + 1
        );
        tokio::time::sleep(retry.backoff(attempt)).await;
    }
}

/// GET a URL and require a success status
pub(crate) async fn get_ok(
    client: &Client,
    url: &str,
    headers: HeaderMap,
    provider: &'static str,
) -> Result<String, ProviderError> {
    let response = client
        .get(url)
        .headers(headers)
        .send()
        .await
        .map_err(|e| classify_send_error(provider, e))?;

    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| ProviderError::ParseError(format!("Failed to read {} response: {}", provider, e)))?;
    if !status.is_success() {
        return Err(ProviderError::from_status(status.as_u16(), text));
    }
    Ok(text)
}

/// Parse an endpoint into a base URL without trailing slash
pub fn parse_endpoint(endpoint: &str) -> Result<String> {
    let endpoint = endpoint.trim();
    if endpoint.is_empty() {
        return Err(anyhow!("Endpoint cannot be empty"));
    }

    let url = if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
        Url::parse(endpoint)?
    } else {
        Url::parse(&format!("http://{}", endpoint))?
    };

    if url.host_str().is_none() {
        return Err(anyhow!("Invalid host in endpoint: {}", endpoint));
    }

    Ok(url.as_str().trim_end_matches('/').to_string())
}

/// Create the client for the configured provider
pub fn create_provider(config: &ModelConfig) -> Result<Arc<dyn Provider>> {
    let retry = RetryPolicy::new(config.common.retry_count, config.common.retry_backoff_ms);
    let endpoint = parse_endpoint(&config.get_endpoint())?;
    let timeout_secs = config.get_timeout_secs();

    debug!(
        "Creating {} provider for model '{}' at {}",
        config.provider.display_name(),
        config.get_model(),
        endpoint
    );

    let provider: Arc<dyn Provider> = match config.provider {
        ModelProvider::Ollama => Arc::new(ollama::Ollama::new(endpoint, timeout_secs, retry)),
        ModelProvider::OpenAI => Arc::new(openai::OpenAI::new(
            config.get_api_key(),
            endpoint,
            timeout_secs,
            retry,
        )),
        ModelProvider::LMStudio => Arc::new(
            openai::OpenAI::new(config.get_api_key(), endpoint, timeout_secs, retry).named("LM Studio"),
        ),
        ModelProvider::Anthropic => Arc::new(anthropic::Anthropic::new(
            config.get_api_key(),
            endpoint,
            config.get_model(),
            timeout_secs,
            retry,
        )),
    };

    Ok(provider)
}
