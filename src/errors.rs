/*!
 * Error types for the polysum pipeline.
 *
 * Each stage of the summarization pipeline has its own error enum, built
 * with the thiserror crate. `PipelineError` is what a caller of the pipeline
 * sees: it keeps the stage-specific reason and classifies it as a client or
 * server failure.
 */

use serde::Serialize;
use thiserror::Error;

use crate::translation::TranslationDirection;

/// Errors that can occur when working with provider APIs
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Error related to rate limiting
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    /// The HTTP request did not complete in time
    #[error("Request timed out: {0}")]
    Timeout(String),
}

impl ProviderError {
    /// Whether a retry of the same request may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::ConnectionError(_) | Self::RateLimitExceeded(_) => true,
            Self::ApiError { status_code, .. } => *status_code >= 500,
            _ => false,
        }
    }

    /// Map a non-success HTTP status to the matching error variant
    pub fn from_status(status_code: u16, message: String) -> Self {
        match status_code {
            401 | 403 => Self::AuthenticationError(message),
            429 => Self::RateLimitExceeded(message),
            _ => Self::ApiError { status_code, message },
        }
    }
}

/// Errors raised by a language detector
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DetectionError {
    /// Nothing left to classify after trimming
    #[error("Input text is empty")]
    EmptyInput,

    /// Only punctuation, digits or symbols
    #[error("Input text contains no alphabetic characters")]
    NoLinguisticContent,

    /// The detector could not settle on a language
    #[error("Unable to detect text language: {0}")]
    Ambiguous(String),

    /// The detector produced a code with no ISO 639 mapping
    #[error("Detector returned an unrecognized language code: {0}")]
    UnknownCode(String),
}

/// Errors that can occur during translation
#[derive(Error, Debug)]
pub enum TranslationError {
    /// Nothing to translate
    #[error("Text to translate is empty")]
    EmptyInput,

    /// The engine cannot translate between these languages
    #[error("Unsupported translation pair: {source_language} -> {target_language}")]
    UnsupportedPair {
        source_language: String,
        target_language: String,
    },

    /// The engine answered with blank text
    #[error("Translation {source_language} -> {target_language} produced no text")]
    EmptyOutput {
        source_language: String,
        target_language: String,
    },

    /// Error from the provider API
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),
}

/// Errors that can occur during summarization
#[derive(Error, Debug)]
pub enum SummarizationError {
    /// Nothing to summarize after truncation
    #[error("Text to summarize is empty")]
    EmptyInput,

    /// Length or beam parameters are inconsistent
    #[error("Invalid summarization parameters: {0}")]
    InvalidParams(String),

    /// The engine answered with blank text
    #[error("Summary generation produced no text")]
    EmptyOutput,

    /// Error from the provider API
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),
}

/// Who is responsible for a failed request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureKind {
    /// The request was understood but cannot be served as given
    Client,
    /// A model call or collaborator failed
    Server,
}

/// Terminal failure of one pipeline run
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Language detection failed: {0}")]
    Detection(#[from] DetectionError),

    #[error("Language '{code}' is not supported. Supported languages: {}", .supported.join(", "))]
    UnsupportedLanguage { code: String, supported: Vec<String> },

    #[error("Translation {direction} failed: {source}")]
    Translation {
        direction: TranslationDirection,
        #[source]
        source: TranslationError,
    },

    #[error("Summarization failed: {0}")]
    Summarization(#[from] SummarizationError),

    #[error("{operation} timed out after {secs}s")]
    Timeout { operation: &'static str, secs: u64 },
}

impl PipelineError {
    /// Stable machine-readable reason code
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Detection(_) => "detection_error",
            Self::UnsupportedLanguage { .. } => "unsupported_language",
            Self::Translation { .. } => "translation_error",
            Self::Summarization(_) => "summarization_error",
            Self::Timeout { .. } => "timeout",
        }
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Detection(_) | Self::UnsupportedLanguage { .. } => FailureKind::Client,
            Self::Translation { .. } | Self::Summarization(_) | Self::Timeout { .. } => {
                FailureKind::Server
            }
        }
    }

    /// HTTP status an API layer should answer with
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Detection(_) => 400,
            Self::UnsupportedLanguage { .. } => 422,
            Self::Translation { .. } | Self::Summarization(_) => 500,
            Self::Timeout { .. } => 504,
        }
    }
}

/// Error body returned to API callers
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ErrorPayload {
    /// Short title of the failure
    pub error: String,
    /// Human-readable explanation
    pub message: String,
    /// Machine-readable reason code
    pub reason: String,
    /// HTTP status code
    pub status_code: u16,
}

impl ErrorPayload {
    pub fn new(error: impl Into<String>, message: impl Into<String>, reason: impl Into<String>, status_code: u16) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            reason: reason.into(),
            status_code,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new("Bad Request", message, "invalid_request", 400)
    }
}

impl From<&PipelineError> for ErrorPayload {
    fn from(error: &PipelineError) -> Self {
        let title = match error {
            PipelineError::Detection(_) => "Language Detection Failed",
            PipelineError::UnsupportedLanguage { .. } => "Unsupported Language",
            PipelineError::Translation { .. } => "Translation Failed",
            PipelineError::Summarization(_) => "Summarization Failed",
            PipelineError::Timeout { .. } => "Processing Timeout",
        };
        Self::new(title, error.to_string(), error.reason(), error.status_code())
    }
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Invalid or unreadable configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error from a provider
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error from a pipeline run
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
