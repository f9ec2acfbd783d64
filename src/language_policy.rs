/*!
 * Language support policy.
 *
 * Maps a detected language code to a routing decision for the pipeline.
 * English is summarized directly; the Romance group is routed through
 * translation; everything else is refused.
 */

use anyhow::{Result, anyhow};
use std::collections::BTreeSet;

use crate::language_utils::{self, normalize_to_part1_or_part2t};

/// Working language of the summarization model
pub const WORKING_LANGUAGE: &str = "en";

/// Languages the translation models can carry to and from English
pub const ROMANCE_LANGUAGES: [&str; 6] = ["ca", "es", "fr", "it", "pt", "ro"];

/// Routing decision for one detected language
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SupportDecision {
    /// The language cannot be served
    Unsupported,
    /// English text goes straight to the summarizer
    DirectEnglish,
    /// Translate from this (normalized ISO 639-1) code to English first
    RequiresTranslation(String),
}

impl SupportDecision {
    pub fn is_supported(&self) -> bool {
        !matches!(self, Self::Unsupported)
    }
}

/// Fixed set of languages the pipeline accepts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageSupportPolicy {
    translatable: BTreeSet<String>,
}

impl Default for LanguageSupportPolicy {
    fn default() -> Self {
        Self {
            translatable: ROMANCE_LANGUAGES.iter().map(|c| c.to_string()).collect(),
        }
    }
}

impl LanguageSupportPolicy {
    /// Build a policy from configured codes.
    ///
    /// Codes may use any ISO 639 form. English may be listed but is always
    /// served directly. Codes outside the Romance group are rejected because
    /// no translation route exists for them.
    pub fn from_codes<I, S>(codes: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut translatable = BTreeSet::new();
        for code in codes {
            let code = code.as_ref();
            let normalized = normalize_to_part1_or_part2t(code)?;
            if normalized == WORKING_LANGUAGE {
                continue;
            }
            if !ROMANCE_LANGUAGES.contains(&normalized.as_str()) {
                return Err(anyhow!(
                    "Language '{}' cannot be routed through translation. Translatable languages: {}",
                    code,
                    ROMANCE_LANGUAGES.join(", ")
                ));
            }
            translatable.insert(normalized);
        }
        Ok(Self { translatable })
    }

    /// Decide how a detected code is handled. Pure and total.
    pub fn decide(&self, code: &str) -> SupportDecision {
        match normalize_to_part1_or_part2t(code) {
            Ok(normalized) if normalized == WORKING_LANGUAGE => SupportDecision::DirectEnglish,
            Ok(normalized) if self.translatable.contains(&normalized) => {
                SupportDecision::RequiresTranslation(normalized)
            }
            _ => SupportDecision::Unsupported,
        }
    }

    pub fn is_supported(&self, code: &str) -> bool {
        self.decide(code).is_supported()
    }

    /// Supported codes, English first
    pub fn supported_codes(&self) -> Vec<String> {
        std::iter::once(WORKING_LANGUAGE.to_string())
            .chain(self.translatable.iter().cloned())
            .collect()
    }

    /// Languages that go through translation
    pub fn translatable_codes(&self) -> impl Iterator<Item = &str> {
        self.translatable.iter().map(String::as_str)
    }

    /// (code, English name) pairs for every supported language
    pub fn language_names(&self) -> Vec<(String, String)> {
        self.supported_codes()
            .into_iter()
            .map(|code| {
                let name = language_utils::display_name(&code);
                (code, name)
            })
            .collect()
    }
}
