/*!
 * Prompt templates for the model backends.
 *
 * Templates are plain strings with `{name}` placeholders. Unknown
 * placeholders are left as they are.
 */

use crate::language_utils;

/// Translation system prompt used when the config does not set one
pub const DEFAULT_TRANSLATION_PROMPT: &str = "You are a professional translator. Translate the following text from {source_language} to {target_language}. Preserve the meaning and tone. Reply with the translation only.";

/// Summary system prompt used when the config does not set one
pub const DEFAULT_SUMMARY_PROMPT: &str = "You are an expert editor. Summarize the following English text in English, using between {min_length} and {max_length} words. Reply with the summary only.";

/// System prompt template with named placeholders
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    template: String,
}

impl PromptTemplate {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.template
    }

    /// Replace each `{key}` with its value
    pub fn render(&self, values: &[(&str, &str)]) -> String {
        values.iter().fold(self.template.clone(), |rendered, (key, value)| {
            rendered.replace(&format!("{{{}}}", key), value)
        })
    }

    /// Render `{source_language}` and `{target_language}` with English language names
    pub fn render_translation(&self, source_language: &str, target_language: &str) -> String {
        let source_name = language_utils::display_name(source_language);
        let target_name = language_utils::display_name(target_language);
        self.render(&[
            ("source_language", source_name.as_str()),
            ("target_language", target_name.as_str()),
        ])
    }

    /// Render `{min_length}` and `{max_length}`
    pub fn render_summary(&self, min_length: usize, max_length: usize) -> String {
        let min_length = min_length.to_string();
        let max_length = max_length.to_string();
        self.render(&[
            ("min_length", min_length.as_str()),
            ("max_length", max_length.as_str()),
        ])
    }
}
