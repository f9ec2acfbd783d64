/*!
 * Language detection.
 *
 * A detector classifies one text and reports its ISO code together with the
 * backend's confidence. Detection never falls back to a default language:
 * input that cannot be classified is an error.
 */

use log::debug;
use serde::Serialize;
use std::fmt::Debug;

use crate::errors::DetectionError;
use crate::language_utils::normalize_to_part1_or_part2t;

/// Below this many letters an unreliable guess is rejected instead of used
pub const MIN_UNRELIABLE_LETTERS: usize = 40;

/// Result of classifying a text
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectedLanguage {
    /// ISO 639-1 code when one exists, ISO 639-3 otherwise
    pub code: String,
    /// Backend confidence in [0, 1]
    pub confidence: f64,
    /// Whether the backend considers the result reliable
    pub reliable: bool,
}

impl DetectedLanguage {
    pub fn new(code: impl Into<String>, confidence: f64, reliable: bool) -> Self {
        Self {
            code: code.into(),
            confidence: confidence.clamp(0.0, 1.0),
            reliable,
        }
    }
}

/// Capability to identify the language of a text
///
/// Implementations must be deterministic for identical input.
pub trait LanguageDetector: Send + Sync + Debug {
    fn detect(&self, text: &str) -> Result<DetectedLanguage, DetectionError>;
}

/// Checks shared by every detector
pub fn check_detectable(text: &str) -> Result<&str, DetectionError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(DetectionError::EmptyInput);
    }
    if !trimmed.chars().any(char::is_alphabetic) {
        return Err(DetectionError::NoLinguisticContent);
    }
    Ok(trimmed)
}

/// Detector backed by the whatlang trigram model
#[derive(Debug, Clone, Default)]
pub struct WhatlangDetector {
    min_confidence: f64,
}

impl WhatlangDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject results whose confidence is below the given floor
    pub fn with_min_confidence(mut self, min_confidence: f64) -> Self {
        self.min_confidence = min_confidence.clamp(0.0, 1.0);
        self
    }

    pub fn min_confidence(&self) -> f64 {
        self.min_confidence
    }
}

impl LanguageDetector for WhatlangDetector {
    fn detect(&self, text: &str) -> Result<DetectedLanguage, DetectionError> {
        let text = check_detectable(text)?;

        let info = whatlang::detect(text)
            .ok_or_else(|| DetectionError::Ambiguous("no language matched the text".to_string()))?;

        let backend_code = info.lang().code();
        let code = normalize_to_part1_or_part2t(backend_code)
            .map_err(|_| DetectionError::UnknownCode(backend_code.to_string()))?;

        debug!(
            "Detected language '{}' (confidence {:.3}, reliable: {})",
            code,
            info.confidence(),
            info.is_reliable()
        );

        let letters = text.chars().filter(|c| c.is_alphabetic()).count();
        if !info.is_reliable() && letters < MIN_UNRELIABLE_LETTERS {
            return Err(DetectionError::Ambiguous(format!(
                "text is too short to classify reliably ({} letters, best guess '{}' at {:.3})",
                letters,
                code,
                info.confidence()
            )));
        }

        if info.confidence() < self.min_confidence {
            return Err(DetectionError::Ambiguous(format!(
                "confidence {:.3} for '{}' is below the required {:.3}",
                info.confidence(),
                code,
                self.min_confidence
            )));
        }

        Ok(DetectedLanguage::new(code, info.confidence(), info.is_reliable()))
    }
}
