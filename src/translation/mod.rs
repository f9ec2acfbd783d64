/*!
 * Translation between English and the supported source languages.
 *
 * - `engine`: the provider-backed translation engine
 * - `cache`: in-memory reuse of earlier translations
 */

use async_trait::async_trait;
use std::fmt::{self, Debug};

use crate::errors::TranslationError;

pub use self::cache::TranslationCache;
pub use self::engine::ProviderTranslator;

pub mod cache;
pub mod engine;

/// Capability to translate text between two ISO languages
#[async_trait]
pub trait TranslationEngine: Send + Sync + Debug {
    async fn translate(
        &self,
        text: &str,
        source_language: &str,
        target_language: &str,
    ) -> Result<String, TranslationError>;
}

/// Which of the two translation legs of a pipeline run failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranslationDirection {
    /// Source text into the working language
    ToWorking,
    /// Summary back into the source language
    BackToOriginal,
}

impl fmt::Display for TranslationDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ToWorking => write!(f, "to English"),
            Self::BackToOriginal => write!(f, "back to original language"),
        }
    }
}
