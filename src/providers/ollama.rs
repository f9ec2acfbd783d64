use async_trait::async_trait;
use log::{debug, error};
use reqwest::Client;
use reqwest::header::HeaderMap;
use serde::{Deserialize, Serialize};

use super::{CompletionRequest, CompletionResponse, Provider, RetryPolicy, build_client, get_ok, post_with_retry};
use crate::errors::ProviderError;

/// Ollama client for interacting with Ollama API
#[derive(Debug)]
pub struct Ollama {
    /// Base URL of the Ollama API
    base_url: String,
    /// HTTP client for making requests
    client: Client,
    /// Retry settings for transient failures
    retry: RetryPolicy,
}

/// Generate request for the Ollama API
#[derive(Debug, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Model name to use for generation
    model: String,
    /// Prompt to generate from
    prompt: String,
    /// System message to guide the model
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    /// Additional model parameters
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<GenerationOptions>,
    /// Whether to stream the response
    #[serde(skip_serializing_if = "Option::is_none")]
    stream: Option<bool>,
}

/// Generation options for the Ollama API
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct GenerationOptions {
    /// Temperature for generation
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    /// Maximum number of tokens to generate
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

/// Generation response from the Ollama API
#[derive(Debug, Serialize, Deserialize)]
pub struct GenerationResponse {
    /// Model name
    #[serde(default)]
    pub model: String,
    /// Generated text
    #[serde(default)]
    pub response: String,
    /// Whether the generation is complete
    #[serde(default)]
    pub done: bool,
    /// Number of prompt tokens
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_eval_count: Option<u64>,
    /// Number of generated tokens
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eval_count: Option<u64>,
}

impl GenerationRequest {
    /// Create a new generation request
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            system: None,
            options: None,
            stream: Some(false),
        }
    }

    /// Set the system prompt
    pub fn system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Set the temperature
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.options.get_or_insert_with(GenerationOptions::default).temperature = Some(temperature);
        self
    }

    /// Limit the number of generated tokens
    pub fn num_predict(mut self, num_predict: u32) -> Self {
        self.options.get_or_insert_with(GenerationOptions::default).num_predict = Some(num_predict);
        self
    }
}

impl From<CompletionRequest> for GenerationRequest {
    fn from(request: CompletionRequest) -> Self {
        let mut generation = GenerationRequest::new(request.model, request.prompt);
        if let Some(system) = request.system {
            generation = generation.system(system);
        }
        if let Some(temperature) = request.temperature {
            generation = generation.temperature(temperature);
        }
        if let Some(max_tokens) = request.max_tokens {
            generation = generation.num_predict(max_tokens);
        }
        generation
    }
}

impl Ollama {
    /// Create a new Ollama client for a base URL such as `http://localhost:11434`
    pub fn new(base_url: impl Into<String>, timeout_secs: u64, retry: RetryPolicy) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: build_client(timeout_secs),
            retry,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Generate text from the Ollama API with retry logic
    pub async fn generate(&self, request: GenerationRequest) -> Result<GenerationResponse, ProviderError> {
        let url = format!("{}/api/generate", self.base_url);
        let response_text =
            post_with_retry(&self.client, &url, HeaderMap::new(), &request, self.retry, "Ollama").await?;
        parse_generation_response(&response_text)
    }

    /// Get the Ollama API version
    pub async fn version(&self) -> Result<String, ProviderError> {
        let url = format!("{}/api/version", self.base_url);
        let body = get_ok(&self.client, &url, HeaderMap::new(), "Ollama").await?;
        let value: serde_json::Value = serde_json::from_str(&body)
            .map_err(|e| ProviderError::ParseError(format!("Failed to parse Ollama version response: {}", e)))?;

        value["version"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| ProviderError::ParseError("Invalid version format in response".to_string()))
    }
}

/// Parse a generate response, accepting a streamed JSONL body as well
pub fn parse_generation_response(response_text: &str) -> Result<GenerationResponse, ProviderError> {
    let parse_error = match serde_json::from_str::<GenerationResponse>(response_text) {
        Ok(response) => return Ok(response),
        Err(e) => e,
    };

    let lines: Vec<serde_json::Value> = response_text
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| serde_json::from_str(line).ok())
        .collect();

    if lines.is_empty() {
        error!(
            "Failed to parse Ollama API response: {}. Raw response (first 500 chars): {}",
            parse_error,
            response_text.chars().take(500).collect::<String>()
        );
        return Err(ProviderError::ParseError(format!(
            "Failed to parse Ollama API response: {}",
            parse_error
        )));
    }

    debug!("Ollama returned {} streamed chunks", lines.len());

    // Streamed bodies carry the text in pieces and the counters on the final chunk
    let response: String = lines
        .iter()
        .filter_map(|value| value.get("response").and_then(|v| v.as_str()))
        .collect();
    let last = lines
        .iter()
        .rev()
        .find(|value| value.get("done").and_then(|v| v.as_bool()).unwrap_or(false))
        .or(lines.last());

    Ok(GenerationResponse {
        model: last
            .and_then(|value| value.get("model"))
            .and_then(|v| v.as_str())
            .unwrap_or("unknown")
            .to_string(),
        response,
        done: true,
        prompt_eval_count: last.and_then(|value| value.get("prompt_eval_count")).and_then(|v| v.as_u64()),
        eval_count: last.and_then(|value| value.get("eval_count")).and_then(|v| v.as_u64()),
    })
}

#[async_trait]
impl Provider for Ollama {
    fn name(&self) -> &'static str {
        "Ollama"
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, ProviderError> {
        let response = self.generate(request.into()).await?;
        Ok(CompletionResponse {
            text: response.response,
            prompt_tokens: response.prompt_eval_count,
            completion_tokens: response.eval_count,
        })
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        let version = self.version().await?;
        debug!("Connected to Ollama {}", version);
        Ok(())
    }
}
