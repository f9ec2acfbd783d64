/*!
 * Summarization of English text.
 *
 * The summarization engine only ever sees working-language text. Length
 * bounds are expressed in words; output that overshoots `max_length` is
 * clipped at a word boundary.
 */

use async_trait::async_trait;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::sync::Arc;

use crate::app_config::{ModelConfig, SummarizationConfig};
use crate::errors::SummarizationError;
use crate::prompts::{DEFAULT_SUMMARY_PROMPT, PromptTemplate};
use crate::providers::{CompletionRequest, Provider};

/// Length and decoding parameters for one summary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryParams {
    /// Shortest acceptable summary in words
    pub min_length: usize,
    /// Longest acceptable summary in words
    pub max_length: usize,
    /// Beam width for backends that decode with beam search
    pub num_beams: u32,
}

impl Default for SummaryParams {
    fn default() -> Self {
        Self {
            min_length: 20,
            max_length: 200,
            num_beams: 2,
        }
    }
}

impl From<&SummarizationConfig> for SummaryParams {
    fn from(config: &SummarizationConfig) -> Self {
        Self {
            min_length: config.sum_min_length,
            max_length: config.sum_max_length,
            num_beams: config.num_beams,
        }
    }
}

impl SummaryParams {
    pub fn validate(&self) -> Result<(), SummarizationError> {
        if self.min_length >= self.max_length {
            return Err(SummarizationError::InvalidParams(format!(
                "min_length ({}) must be less than max_length ({})",
                self.min_length, self.max_length
            )));
        }
        if self.num_beams == 0 {
            return Err(SummarizationError::InvalidParams(
                "num_beams must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Capability to summarize English text
#[async_trait]
pub trait SummarizationEngine: Send + Sync + Debug {
    async fn summarize(&self, text: &str, params: &SummaryParams) -> Result<String, SummarizationError>;
}

/// Keep at most `max_words` whitespace-separated words, preserving inner spacing
pub fn clip_words(text: &str, max_words: usize) -> &str {
    if max_words == 0 {
        return "";
    }

    let mut words = 0;
    let mut in_word = false;
    for (index, c) in text.char_indices() {
        if c.is_whitespace() {
            if in_word && words == max_words {
                return text[..index].trim_end();
            }
            in_word = false;
        } else if !in_word {
            in_word = true;
            words += 1;
        }
    }
    text
}

/// Summarization engine that prompts an LLM provider
#[derive(Debug, Clone)]
pub struct ProviderSummarizer {
    provider: Arc<dyn Provider>,
    model: String,
    prompt: PromptTemplate,
    max_tokens: Option<u32>,
}

impl ProviderSummarizer {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            prompt: PromptTemplate::new(DEFAULT_SUMMARY_PROMPT),
            max_tokens: None,
        }
    }

    pub fn from_config(provider: Arc<dyn Provider>, config: &ModelConfig) -> Self {
        Self::new(provider, config.get_model())
            .with_prompt(PromptTemplate::new(config.common.summary_prompt.clone()))
            .with_max_tokens(config.get_max_tokens())
    }

    pub fn with_prompt(mut self, prompt: PromptTemplate) -> Self {
        self.prompt = prompt;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

#[async_trait]
impl SummarizationEngine for ProviderSummarizer {
    async fn summarize(&self, text: &str, params: &SummaryParams) -> Result<String, SummarizationError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(SummarizationError::EmptyInput);
        }
        params.validate()?;

        info!(
            "Summarizing {} characters with {} ({}-{} words)",
            text.chars().count(),
            self.provider.name(),
            params.min_length,
            params.max_length
        );
        debug!("Requested beam width {} (decoding runs at temperature 0)", params.num_beams);

        // Sampling disabled: deterministic output for identical input
        let mut request = CompletionRequest::new(self.model.clone(), text)
            .system(self.prompt.render_summary(params.min_length, params.max_length))
            .temperature(0.0);
        if let Some(max_tokens) = self.max_tokens {
            request = request.max_tokens(max_tokens);
        }

        let response = self.provider.complete(request).await?;
        let summary = response.text.trim();
        if summary.is_empty() {
            return Err(SummarizationError::EmptyOutput);
        }

        let clipped = clip_words(summary, params.max_length);
        if clipped.len() < summary.len() {
            debug!("Clipped summary to {} words", params.max_length);
        }
        Ok(clipped.to_string())
    }
}
