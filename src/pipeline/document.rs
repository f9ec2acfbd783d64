/*!
 * Request and result values of one pipeline run.
 */

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use super::orchestrator::PipelineStage;
use crate::detection::DetectedLanguage;

/// Where the text of a document came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentSource {
    /// Passed directly by the caller
    Inline,
    /// Read from a text file
    File(PathBuf),
    /// Extracted from a PDF
    Pdf(PathBuf),
}

impl fmt::Display for DocumentSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inline => write!(f, "inline text"),
            Self::File(path) => write!(f, "file {}", path.display()),
            Self::Pdf(path) => write!(f, "PDF {}", path.display()),
        }
    }
}

/// Text to summarize, fixed once created
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    text: String,
    source: DocumentSource,
}

impl Document {
    pub fn new(text: impl Into<String>, source: DocumentSource) -> Self {
        Self {
            text: text.into(),
            source,
        }
    }

    pub fn inline(text: impl Into<String>) -> Self {
        Self::new(text, DocumentSource::Inline)
    }

    pub fn from_file(path: impl AsRef<Path>, text: impl Into<String>) -> Self {
        Self::new(text, DocumentSource::File(path.as_ref().to_path_buf()))
    }

    pub fn from_pdf(path: impl AsRef<Path>, text: impl Into<String>) -> Self {
        Self::new(text, DocumentSource::Pdf(path.as_ref().to_path_buf()))
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn source(&self) -> &DocumentSource {
        &self.source
    }
}

/// Summary expressed in the language of the input
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryResult {
    /// Detected language of the input
    pub lang: String,
    /// Summary in that language
    pub text: String,
}

/// Measurements of one successful run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessingStats {
    pub input_chars: usize,
    pub input_words: usize,
    /// Characters handed to the summarizer
    pub working_chars: usize,
    pub summary_chars: usize,
    pub summary_words: usize,
    /// summary_chars / input_chars
    pub compression_ratio: f64,
    pub detected_language: DetectedLanguage,
    /// Whether the text went through translation
    pub translated: bool,
    /// Whether the working text was cut to the input budget
    pub truncated: bool,
    pub duration_ms: u64,
    /// States visited, in order
    pub stages: Vec<PipelineStage>,
}

/// Summary together with its processing statistics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineRun {
    #[serde(flatten)]
    pub result: SummaryResult,
    pub stats: ProcessingStats,
}
