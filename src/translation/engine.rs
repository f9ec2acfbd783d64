/*!
 * Provider-backed translation engine.
 *
 * Text is split into request-sized segments on sentence boundaries, each
 * segment is translated in order, and the results are joined with a space.
 */

use async_trait::async_trait;
use log::{debug, info};
use std::sync::Arc;

use super::{TranslationCache, TranslationEngine};
use crate::app_config::ModelConfig;
use crate::chunker::TextChunker;
use crate::errors::TranslationError;
use crate::language_policy::{LanguageSupportPolicy, SupportDecision, WORKING_LANGUAGE};
use crate::language_utils::normalize_to_part1_or_part2t;
use crate::prompts::{DEFAULT_TRANSLATION_PROMPT, PromptTemplate};
use crate::providers::{CompletionRequest, Provider};

/// Translation engine that prompts an LLM provider
#[derive(Debug, Clone)]
pub struct ProviderTranslator {
    provider: Arc<dyn Provider>,
    model: String,
    prompt: PromptTemplate,
    temperature: f32,
    max_tokens: Option<u32>,
    chunker: TextChunker,
    languages: LanguageSupportPolicy,
    cache: TranslationCache,
}

impl ProviderTranslator {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            prompt: PromptTemplate::new(DEFAULT_TRANSLATION_PROMPT),
            temperature: 0.1,
            max_tokens: None,
            chunker: TextChunker::new(4000),
            languages: LanguageSupportPolicy::default(),
            cache: TranslationCache::default(),
        }
    }

    /// Engine configured from the `models` section
    pub fn from_config(provider: Arc<dyn Provider>, config: &ModelConfig, languages: LanguageSupportPolicy) -> Self {
        Self::new(provider, config.get_model())
            .with_prompt(PromptTemplate::new(config.common.translation_prompt.clone()))
            .with_temperature(config.common.translation_temperature)
            .with_max_tokens(config.get_max_tokens())
            .with_max_chars_per_request(config.get_max_chars_per_request())
            .with_languages(languages)
            .with_cache(TranslationCache::new(config.common.cache_translations))
    }

    pub fn with_prompt(mut self, prompt: PromptTemplate) -> Self {
        self.prompt = prompt;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Longest text sent in one request, 0 sends everything at once
    pub fn with_max_chars_per_request(mut self, max_chars: usize) -> Self {
        self.chunker = TextChunker::new(max_chars);
        self
    }

    /// Languages that may be translated to and from English
    pub fn with_languages(mut self, languages: LanguageSupportPolicy) -> Self {
        self.languages = languages;
        self
    }

    pub fn with_cache(mut self, cache: TranslationCache) -> Self {
        self.cache = cache;
        self
    }

    pub fn cache(&self) -> &TranslationCache {
        &self.cache
    }

    /// Normalize both codes and require exactly one side to be English
    fn validate_pair(&self, source_language: &str, target_language: &str) -> Result<(String, String), TranslationError> {
        let unsupported = || TranslationError::UnsupportedPair {
            source_language: source_language.to_string(),
            target_language: target_language.to_string(),
        };

        let source = normalize_to_part1_or_part2t(source_language).map_err(|_| unsupported())?;
        let target = normalize_to_part1_or_part2t(target_language).map_err(|_| unsupported())?;

        let other = match (source == WORKING_LANGUAGE, target == WORKING_LANGUAGE) {
            (true, false) => &target,
            (false, true) => &source,
            _ => return Err(unsupported()),
        };
        match self.languages.decide(other) {
            SupportDecision::RequiresTranslation(_) => Ok((source, target)),
            _ => Err(unsupported()),
        }
    }

    async fn translate_segment(&self, segment: &str, system: &str, source: &str, target: &str) -> Result<String, TranslationError> {
        let mut request = CompletionRequest::new(self.model.clone(), segment)
            .system(system)
            .temperature(self.temperature);
        if let Some(max_tokens) = self.max_tokens {
            request = request.max_tokens(max_tokens);
        }

        let response = self.provider.complete(request).await?;
        let translated = response.text.trim();
        if translated.is_empty() {
            return Err(TranslationError::EmptyOutput {
                source_language: source.to_string(),
                target_language: target.to_string(),
            });
        }
        Ok(translated.to_string())
    }
}

#[async_trait]
impl TranslationEngine for ProviderTranslator {
    async fn translate(
        &self,
        text: &str,
        source_language: &str,
        target_language: &str,
    ) -> Result<String, TranslationError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(TranslationError::EmptyInput);
        }
        let (source, target) = self.validate_pair(source_language, target_language)?;

        if let Some(cached) = self.cache.get(text, &source, &target) {
            return Ok(cached);
        }

        let system = self.prompt.render_translation(&source, &target);
        let segments = self.chunker.segments(text);
        info!(
            "Translating {} characters {} -> {} with {} ({} request(s))",
            text.chars().count(),
            source,
            target,
            self.provider.name(),
            segments.len()
        );

        let mut translated = Vec::with_capacity(segments.len());
        for (index, segment) in segments.iter().enumerate() {
            debug!("Translating segment {}/{} ({} chars)", index + 1, segments.len(), segment.chars().count());
            translated.push(self.translate_segment(segment, &system, &source, &target).await?);
        }

        let result = translated.join(" ");
        self.cache.store(text, &source, &target, &result);
        Ok(result)
    }
}
