use anyhow::{Context, Result, anyhow};
use log::warn;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::language_policy::{LanguageSupportPolicy, WORKING_LANGUAGE};
use crate::language_utils;
use crate::prompts::{DEFAULT_SUMMARY_PROMPT, DEFAULT_TRANSLATION_PROMPT};

/// Accepted range of `sum_max_length`, shared with the HTTP API
pub const SUM_MAX_LENGTH_RANGE: [usize; 2] = [10, 1000];

/// Smallest accepted `sum_min_length`
pub const SUM_MIN_LENGTH_FLOOR: usize = 5;

/// Application configuration module
/// This module handles loading, validating and saving the configuration of
/// the summarization pipeline, the model providers and the HTTP server.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Config {
    /// Length limits for the summarizer
    #[serde(default)]
    pub summarization: SummarizationConfig,

    /// Accepted languages and detection settings
    #[serde(default)]
    pub languages: LanguagesConfig,

    /// Model providers backing translation and summarization
    #[serde(default)]
    pub models: ModelConfig,

    /// HTTP API settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Model provider type
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ModelProvider {
    #[default]
    Ollama,
    OpenAI,
    Anthropic,
    /// LM Studio (OpenAI-compatible local server)
    LMStudio,
}

impl ModelProvider {
    pub const ALL: [ModelProvider; 4] = [
        ModelProvider::Ollama,
        ModelProvider::OpenAI,
        ModelProvider::Anthropic,
        ModelProvider::LMStudio,
    ];

    /// Capitalized provider name
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Ollama => "Ollama",
            Self::OpenAI => "OpenAI",
            Self::Anthropic => "Anthropic",
            Self::LMStudio => "LM Studio",
        }
    }

    /// Lowercase provider identifier, as used in the config file
    pub fn to_lowercase_string(&self) -> String {
        match self {
            Self::Ollama => "ollama".to_string(),
            Self::OpenAI => "openai".to_string(),
            Self::Anthropic => "anthropic".to_string(),
            Self::LMStudio => "lmstudio".to_string(),
        }
    }

    pub fn requires_api_key(&self) -> bool {
        matches!(self, Self::OpenAI | Self::Anthropic)
    }

    fn default_model(&self) -> String {
        match self {
            Self::Ollama => default_ollama_model(),
            Self::OpenAI => default_openai_model(),
            Self::Anthropic => default_anthropic_model(),
            Self::LMStudio => default_lmstudio_model(),
        }
    }

    fn default_endpoint(&self) -> String {
        match self {
            Self::Ollama => default_ollama_endpoint(),
            Self::OpenAI => default_openai_endpoint(),
            Self::Anthropic => default_anthropic_endpoint(),
            Self::LMStudio => default_lmstudio_endpoint(),
        }
    }
}

impl std::fmt::Display for ModelProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_lowercase_string())
    }
}

impl std::str::FromStr for ModelProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "ollama" => Ok(Self::Ollama),
            "openai" => Ok(Self::OpenAI),
            "anthropic" => Ok(Self::Anthropic),
            "lmstudio" => Ok(Self::LMStudio),
            _ => Err(anyhow!("Invalid provider type: {}", s)),
        }
    }
}

/// Connection settings for one provider
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ProviderConfig {
    /// Provider type identifier
    #[serde(rename = "type")]
    pub provider_type: String,

    /// Model name
    #[serde(default = "String::new")]
    pub model: String,

    /// API key
    #[serde(default = "String::new")]
    pub api_key: String,

    /// Service URL
    #[serde(default = "String::new")]
    pub endpoint: String,

    /// Max characters sent in one translation request
    #[serde(default = "default_max_chars_per_request")]
    pub max_chars_per_request: usize,

    /// HTTP timeout for one request
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Upper bound on generated tokens
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

impl ProviderConfig {
    pub fn new(provider: ModelProvider) -> Self {
        Self {
            provider_type: provider.to_lowercase_string(),
            model: provider.default_model(),
            api_key: String::new(),
            endpoint: provider.default_endpoint(),
            max_chars_per_request: match provider {
                ModelProvider::Anthropic => default_anthropic_max_chars_per_request(),
                _ => default_max_chars_per_request(),
            },
            timeout_secs: match provider {
                ModelProvider::Anthropic => default_anthropic_timeout_secs(),
                _ => default_timeout_secs(),
            },
            max_tokens: default_max_tokens(),
        }
    }
}

/// Summary length limits, in characters for the input and words for the output
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct SummarizationConfig {
    /// Input budget handed to the summarizer (characters)
    #[serde(default = "default_input_max_length")]
    pub input_max_length: usize,

    /// Longest acceptable summary (words)
    #[serde(default = "default_sum_max_length")]
    pub sum_max_length: usize,

    /// Shortest acceptable summary (words)
    #[serde(default = "default_sum_min_length")]
    pub sum_min_length: usize,

    /// Beam width requested from the summarizer
    #[serde(default = "default_num_beams")]
    pub num_beams: u32,
}

impl Default for SummarizationConfig {
    fn default() -> Self {
        Self {
            input_max_length: default_input_max_length(),
            sum_max_length: default_sum_max_length(),
            sum_min_length: default_sum_min_length(),
            num_beams: default_num_beams(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct LanguagesConfig {
    /// Languages accepted by the pipeline, any ISO 639 form
    #[serde(default = "default_supported_languages")]
    pub supported: Vec<String>,

    /// Detection results below this confidence are rejected
    #[serde(default)]
    pub min_confidence: f64,
}

impl Default for LanguagesConfig {
    fn default() -> Self {
        Self {
            supported: default_supported_languages(),
            min_confidence: 0.0,
        }
    }
}

impl LanguagesConfig {
    /// Build the support policy described by this section
    pub fn policy(&self) -> Result<LanguageSupportPolicy> {
        LanguageSupportPolicy::from_codes(&self.supported)
    }
}

/// Provider selection and settings shared by every provider
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ModelConfig {
    /// Provider to use
    #[serde(default)]
    pub provider: ModelProvider,

    /// Available providers
    #[serde(default)]
    pub available_providers: Vec<ProviderConfig>,

    /// Common settings
    #[serde(default)]
    pub common: ModelCommonConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ModelCommonConfig {
    /// System prompt for translation
    /// Placeholders: {source_language}, {target_language}
    #[serde(default = "default_translation_prompt")]
    pub translation_prompt: String,

    /// System prompt for summarization
    /// Placeholders: {min_length}, {max_length}
    #[serde(default = "default_summary_prompt")]
    pub summary_prompt: String,

    /// Retry count for failed requests
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,

    /// Base backoff for retries (in milliseconds), doubled on each retry
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Temperature for translation requests (0.0 to 1.0)
    #[serde(default = "default_translation_temperature")]
    pub translation_temperature: f32,

    /// Upper bound on a single model call within the pipeline, 0 disables it
    #[serde(default = "default_stage_timeout_secs")]
    pub stage_timeout_secs: u64,

    /// Reuse translations of identical text
    #[serde(default = "default_true")]
    pub cache_translations: bool,
}

impl Default for ModelCommonConfig {
    fn default() -> Self {
        Self {
            translation_prompt: default_translation_prompt(),
            summary_prompt: default_summary_prompt(),
            retry_count: default_retry_count(),
            retry_backoff_ms: default_retry_backoff_ms(),
            translation_temperature: default_translation_temperature(),
            stage_timeout_secs: default_stage_timeout_secs(),
            cache_translations: true,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Origins allowed by CORS
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            allowed_origins: default_allowed_origins(),
        }
    }
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            Self::Error => log::LevelFilter::Error,
            Self::Warn => log::LevelFilter::Warn,
            Self::Info => log::LevelFilter::Info,
            Self::Debug => log::LevelFilter::Debug,
            Self::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_input_max_length() -> usize {
    1024
}

fn default_sum_max_length() -> usize {
    200
}

fn default_sum_min_length() -> usize {
    20
}

fn default_num_beams() -> u32 {
    2
}

fn default_supported_languages() -> Vec<String> {
    ["en", "ca", "es", "fr", "it", "pt", "ro"]
        .iter()
        .map(|code| code.to_string())
        .collect()
}

fn default_max_chars_per_request() -> usize {
    4000
}

fn default_anthropic_max_chars_per_request() -> usize {
    8000
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_anthropic_timeout_secs() -> u64 {
    90
}

fn default_max_tokens() -> u32 {
    2048
}

fn default_retry_count() -> u32 {
    3
}

fn default_retry_backoff_ms() -> u64 {
    1000
}

fn default_translation_temperature() -> f32 {
    0.1
}

fn default_stage_timeout_secs() -> u64 {
    120
}

fn default_true() -> bool {
    true
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_allowed_origins() -> Vec<String> {
    vec![
        "http://localhost:3000".to_string(),
        "http://127.0.0.1:3000".to_string(),
    ]
}

fn default_ollama_endpoint() -> String {
    "http://localhost:11434".to_string()
}

fn default_openai_endpoint() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_anthropic_endpoint() -> String {
    "https://api.anthropic.com".to_string()
}

fn default_lmstudio_endpoint() -> String {
    // LM Studio serves its OpenAI-compatible API under /v1
    "http://localhost:1234/v1".to_string()
}

fn default_ollama_model() -> String {
    "llama3.2:3b".to_string()
}

fn default_openai_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_anthropic_model() -> String {
    "claude-3-haiku-20240307".to_string()
}

fn default_lmstudio_model() -> String {
    "local-model".to_string()
}

fn default_translation_prompt() -> String {
    DEFAULT_TRANSLATION_PROMPT.to_string()
}

fn default_summary_prompt() -> String {
    DEFAULT_SUMMARY_PROMPT.to_string()
}

impl Config {
    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        let summarization = &self.summarization;
        if summarization.input_max_length == 0 {
            return Err(anyhow!("input_max_length must be greater than 0"));
        }
        if summarization.sum_min_length < SUM_MIN_LENGTH_FLOOR {
            return Err(anyhow!("sum_min_length must be at least {}", SUM_MIN_LENGTH_FLOOR));
        }
        if !(SUM_MAX_LENGTH_RANGE[0]..=SUM_MAX_LENGTH_RANGE[1]).contains(&summarization.sum_max_length) {
            return Err(anyhow!(
                "sum_max_length must be between {} and {}",
                SUM_MAX_LENGTH_RANGE[0],
                SUM_MAX_LENGTH_RANGE[1]
            ));
        }
        if summarization.sum_max_length <= summarization.sum_min_length {
            return Err(anyhow!(
                "sum_max_length ({}) must be greater than sum_min_length ({})",
                summarization.sum_max_length,
                summarization.sum_min_length
            ));
        }
        if summarization.num_beams == 0 {
            return Err(anyhow!("num_beams must be greater than 0"));
        }

        for code in &self.languages.supported {
            language_utils::validate_language_code(code)
                .with_context(|| format!("Invalid entry in languages.supported: '{}'", code))?;
        }
        if !self
            .languages
            .supported
            .iter()
            .any(|code| language_utils::language_codes_match(code, WORKING_LANGUAGE))
        {
            return Err(anyhow!("languages.supported must contain '{}'", WORKING_LANGUAGE));
        }
        self.languages.policy()?;

        if !(0.0..=1.0).contains(&self.languages.min_confidence) {
            return Err(anyhow!("languages.min_confidence must be between 0.0 and 1.0"));
        }

        if self.models.provider.requires_api_key() && self.models.get_api_key().is_empty() {
            return Err(anyhow!(
                "API key is required for {} provider",
                self.models.provider.display_name()
            ));
        }

        Ok(())
    }

    /// Load configuration from a JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open config file: {}", path.display()))?;
        let reader = BufReader::new(file);
        serde_json::from_reader(reader)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Write the configuration as pretty JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        let config_json =
            serde_json::to_string_pretty(self).context("Failed to serialize config to JSON")?;
        std::fs::write(path, config_json)
            .with_context(|| format!("Failed to write config to file: {}", path.display()))
    }

    /// Load the file at `path`, or write and return the defaults when it does not exist
    pub fn load_or_create(path: &Path) -> Result<Self> {
        if path.exists() {
            return Self::from_file(path);
        }

        warn!("Config file not found at '{}', creating default config.", path.display());
        let config = Self::default();
        config.save(path)?;
        Ok(config)
    }
}

impl ModelConfig {
    /// Get the active provider configuration from the available_providers array
    pub fn get_active_provider_config(&self) -> Option<&ProviderConfig> {
        self.get_provider_config(&self.provider)
    }

    pub fn get_provider_config(&self, provider: &ModelProvider) -> Option<&ProviderConfig> {
        let provider_str = provider.to_lowercase_string();
        self.available_providers
            .iter()
            .find(|p| p.provider_type == provider_str)
    }

    /// Mutable entry for the active provider, created with defaults when missing
    pub fn active_provider_config_mut(&mut self) -> &mut ProviderConfig {
        let provider_str = self.provider.to_lowercase_string();
        let index = match self
            .available_providers
            .iter()
            .position(|p| p.provider_type == provider_str)
        {
            Some(index) => index,
            None => {
                self.available_providers.push(ProviderConfig::new(self.provider));
                self.available_providers.len() - 1
            }
        };
        &mut self.available_providers[index]
    }

    /// Get the model for the active provider
    pub fn get_model(&self) -> String {
        match self.get_active_provider_config() {
            Some(provider_config) if !provider_config.model.is_empty() => provider_config.model.clone(),
            _ => self.provider.default_model(),
        }
    }

    /// Get the API key for the active provider
    pub fn get_api_key(&self) -> String {
        self.get_active_provider_config()
            .map(|provider_config| provider_config.api_key.clone())
            .unwrap_or_default()
    }

    /// Get the endpoint for the active provider
    pub fn get_endpoint(&self) -> String {
        match self.get_active_provider_config() {
            Some(provider_config) if !provider_config.endpoint.is_empty() => {
                provider_config.endpoint.clone()
            }
            _ => self.provider.default_endpoint(),
        }
    }

    /// Get the max chars per request for the active provider
    pub fn get_max_chars_per_request(&self) -> usize {
        match self.get_active_provider_config() {
            Some(provider_config) if provider_config.max_chars_per_request > 0 => {
                provider_config.max_chars_per_request
            }
            _ => default_max_chars_per_request(),
        }
    }

    pub fn get_timeout_secs(&self) -> u64 {
        match self.get_active_provider_config() {
            Some(provider_config) if provider_config.timeout_secs > 0 => provider_config.timeout_secs,
            _ => default_timeout_secs(),
        }
    }

    pub fn get_max_tokens(&self) -> u32 {
        match self.get_active_provider_config() {
            Some(provider_config) if provider_config.max_tokens > 0 => provider_config.max_tokens,
            _ => default_max_tokens(),
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            provider: ModelProvider::default(),
            available_providers: ModelProvider::ALL
                .iter()
                .map(|provider| ProviderConfig::new(*provider))
                .collect(),
            common: ModelCommonConfig::default(),
        }
    }
}
