/*!
 * Pipeline orchestrator.
 *
 * Runs one request through the fixed state sequence
 * Received → Detected → Routed → Chunked → Ready → Summarized → Completed.
 * Any step may end the run with a `PipelineError`; there are no retries
 * across steps and no fallback to untranslated text.
 */

use anyhow::{Result, anyhow};
use log::{debug, info, warn};
use serde::Serialize;
use std::borrow::Cow;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::document::{Document, PipelineRun, ProcessingStats, SummaryResult};
use crate::app_config::Config;
use crate::chunker::TextChunker;
use crate::detection::{LanguageDetector, WhatlangDetector};
use crate::errors::{DetectionError, PipelineError, SummarizationError, TranslationError};
use crate::language_policy::{LanguageSupportPolicy, SupportDecision, WORKING_LANGUAGE};
use crate::providers::Provider;
use crate::summarization::{ProviderSummarizer, SummarizationEngine, SummaryParams};
use crate::translation::{ProviderTranslator, TranslationDirection, TranslationEngine};

/// States of a pipeline run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PipelineStage {
    Received,
    Detected,
    Routed,
    Chunked,
    Ready,
    Summarized,
    Completed,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Received => "received",
            Self::Detected => "detected",
            Self::Routed => "routed",
            Self::Chunked => "chunked",
            Self::Ready => "ready",
            Self::Summarized => "summarized",
            Self::Completed => "completed",
        };
        write!(f, "{}", name)
    }
}

/// Limits applied to every run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipelineConfig {
    /// Character budget of the summarizer input
    pub input_max_length: usize,
    /// Default summary parameters
    pub summary: SummaryParams,
    /// Bound on each model call, `None` waits indefinitely
    pub stage_timeout: Option<Duration>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input_max_length: 1024,
            summary: SummaryParams::default(),
            stage_timeout: Some(Duration::from_secs(120)),
        }
    }
}

impl PipelineConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            input_max_length: config.summarization.input_max_length,
            summary: SummaryParams::from(&config.summarization),
            stage_timeout: None,
        }
        .with_stage_timeout_secs(config.models.common.stage_timeout_secs)
    }

    pub fn with_input_max_length(mut self, input_max_length: usize) -> Self {
        self.input_max_length = input_max_length;
        self
    }

    pub fn with_summary_params(mut self, summary: SummaryParams) -> Self {
        self.summary = summary;
        self
    }

    pub fn with_stage_timeout(mut self, stage_timeout: Option<Duration>) -> Self {
        self.stage_timeout = stage_timeout;
        self
    }

    /// Seconds per model call, 0 disables the bound
    pub fn with_stage_timeout_secs(self, secs: u64) -> Self {
        self.with_stage_timeout((secs > 0).then(|| Duration::from_secs(secs)))
    }
}

/// The summarization pipeline
///
/// Cloning is cheap: engines are shared behind `Arc`s, so one pipeline can
/// serve concurrent requests.
#[derive(Debug, Clone)]
pub struct SummaryPipeline {
    detector: Arc<dyn LanguageDetector>,
    policy: Arc<LanguageSupportPolicy>,
    translator: Arc<dyn TranslationEngine>,
    summarizer: Arc<dyn SummarizationEngine>,
    config: PipelineConfig,
}

/// Builder for [`SummaryPipeline`]
#[derive(Debug, Default)]
pub struct SummaryPipelineBuilder {
    detector: Option<Arc<dyn LanguageDetector>>,
    policy: Option<LanguageSupportPolicy>,
    translator: Option<Arc<dyn TranslationEngine>>,
    summarizer: Option<Arc<dyn SummarizationEngine>>,
    config: PipelineConfig,
}

impl SummaryPipelineBuilder {
    pub fn detector(mut self, detector: Arc<dyn LanguageDetector>) -> Self {
        self.detector = Some(detector);
        self
    }

    pub fn policy(mut self, policy: LanguageSupportPolicy) -> Self {
        self.policy = Some(policy);
        self
    }

    pub fn translator(mut self, translator: Arc<dyn TranslationEngine>) -> Self {
        self.translator = Some(translator);
        self
    }

    pub fn summarizer(mut self, summarizer: Arc<dyn SummarizationEngine>) -> Self {
        self.summarizer = Some(summarizer);
        self
    }

    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    /// Both engines are required; detector and policy fall back to the defaults
    pub fn build(self) -> Result<SummaryPipeline> {
        let translator = self
            .translator
            .ok_or_else(|| anyhow!("A translation engine is required"))?;
        let summarizer = self
            .summarizer
            .ok_or_else(|| anyhow!("A summarization engine is required"))?;

        Ok(SummaryPipeline {
            detector: self
                .detector
                .unwrap_or_else(|| Arc::new(WhatlangDetector::new())),
            policy: Arc::new(self.policy.unwrap_or_default()),
            translator,
            summarizer,
            config: self.config,
        })
    }
}

/// Per-run bookkeeping of visited states
struct StageTrace {
    stages: Vec<PipelineStage>,
}

impl StageTrace {
    fn start() -> Self {
        debug!("Pipeline stage: {}", PipelineStage::Received);
        Self {
            stages: vec![PipelineStage::Received],
        }
    }

    fn enter(&mut self, stage: PipelineStage) {
        debug!("Pipeline stage: {}", stage);
        self.stages.push(stage);
    }
}

fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

impl SummaryPipeline {
    pub fn builder() -> SummaryPipelineBuilder {
        SummaryPipelineBuilder::default()
    }

    /// Pipeline whose engines both run on `provider`
    pub fn from_config(config: &Config, provider: Arc<dyn Provider>) -> Result<Self> {
        let policy = config.languages.policy()?;
        let detector = WhatlangDetector::new().with_min_confidence(config.languages.min_confidence);
        let translator = ProviderTranslator::from_config(Arc::clone(&provider), &config.models, policy.clone());
        let summarizer = ProviderSummarizer::from_config(provider, &config.models);

        Self::builder()
            .detector(Arc::new(detector))
            .policy(policy)
            .translator(Arc::new(translator))
            .summarizer(Arc::new(summarizer))
            .config(PipelineConfig::from_config(config))
            .build()
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn policy(&self) -> &LanguageSupportPolicy {
        &self.policy
    }

    /// Summarize `text` with the configured parameters
    pub async fn process(&self, text: &str) -> Result<SummaryResult, PipelineError> {
        self.run(text, &self.config.summary).await.map(|run| run.result)
    }

    /// Summarize `text` with per-request parameters
    pub async fn process_with_params(
        &self,
        text: &str,
        params: &SummaryParams,
    ) -> Result<SummaryResult, PipelineError> {
        self.run(text, params).await.map(|run| run.result)
    }

    /// Summarize a document and report processing statistics
    pub async fn process_document(&self, document: &Document) -> Result<PipelineRun, PipelineError> {
        info!("Summarizing {}", document.source());
        self.run(document.text(), &self.config.summary).await
    }

    pub async fn process_document_with_params(
        &self,
        document: &Document,
        params: &SummaryParams,
    ) -> Result<PipelineRun, PipelineError> {
        info!("Summarizing {}", document.source());
        self.run(document.text(), params).await
    }

    /// Await a model call within the stage timeout
    async fn bounded<T, F>(&self, operation: &'static str, call: F) -> Result<T, PipelineError>
    where
        F: Future<Output = T>,
    {
        match self.config.stage_timeout {
            Some(limit) => tokio::time::timeout(limit, call).await.map_err(|_| {
                warn!("{} exceeded {:?}", operation, limit);
                PipelineError::Timeout {
                    operation,
                    secs: limit.as_secs(),
                }
            }),
            None => Ok(call.await),
        }
    }

    async fn translate(
        &self,
        text: &str,
        source: &str,
        target: &str,
        direction: TranslationDirection,
    ) -> Result<String, PipelineError> {
        let operation = match direction {
            TranslationDirection::ToWorking => "Translation to English",
            TranslationDirection::BackToOriginal => "Back-translation",
        };
        let translated = self
            .bounded(operation, self.translator.translate(text, source, target))
            .await?
            .map_err(|source_error| PipelineError::Translation {
                direction,
                source: source_error,
            })?;

        if translated.trim().is_empty() {
            return Err(PipelineError::Translation {
                direction,
                source: TranslationError::EmptyOutput {
                    source_language: source.to_string(),
                    target_language: target.to_string(),
                },
            });
        }
        Ok(translated)
    }

    async fn run(&self, text: &str, params: &SummaryParams) -> Result<PipelineRun, PipelineError> {
        let started = Instant::now();
        let mut trace = StageTrace::start();

        if text.trim().is_empty() {
            return Err(DetectionError::EmptyInput.into());
        }
        let detected = self.detector.detect(text)?;
        trace.enter(PipelineStage::Detected);

        let source_code = match self.policy.decide(&detected.code) {
            SupportDecision::Unsupported => {
                warn!("Detected language '{}' is not supported", detected.code);
                return Err(PipelineError::UnsupportedLanguage {
                    code: detected.code,
                    supported: self.policy.supported_codes(),
                });
            }
            SupportDecision::DirectEnglish => None,
            SupportDecision::RequiresTranslation(code) => Some(code),
        };
        trace.enter(PipelineStage::Routed);
        info!(
            "Language '{}' detected ({})",
            detected.code,
            if source_code.is_some() { "translating to English" } else { "summarizing directly" }
        );

        let working: Cow<'_, str> = match &source_code {
            Some(code) => Cow::Owned(
                self.translate(text, code, WORKING_LANGUAGE, TranslationDirection::ToWorking)
                    .await?,
            ),
            None => Cow::Borrowed(text),
        };

        let truncated = TextChunker::new(self.config.input_max_length).truncate(&working);
        trace.enter(PipelineStage::Chunked);
        if truncated.truncated {
            info!(
                "Working text truncated from {} to {} characters",
                truncated.original_chars,
                truncated.kept_chars()
            );
        }
        trace.enter(PipelineStage::Ready);

        let summary = self
            .bounded("Summarization", self.summarizer.summarize(truncated.text, params))
            .await??;
        if summary.trim().is_empty() {
            return Err(SummarizationError::EmptyOutput.into());
        }
        trace.enter(PipelineStage::Summarized);

        let text_out = match &source_code {
            Some(code) => {
                self.translate(&summary, WORKING_LANGUAGE, code, TranslationDirection::BackToOriginal)
                    .await?
            }
            None => summary,
        };
        trace.enter(PipelineStage::Completed);

        let input_chars = text.chars().count();
        let summary_chars = text_out.chars().count();
        let stats = ProcessingStats {
            input_chars,
            input_words: word_count(text),
            working_chars: truncated.kept_chars(),
            summary_chars,
            summary_words: word_count(&text_out),
            compression_ratio: if input_chars > 0 {
                summary_chars as f64 / input_chars as f64
            } else {
                0.0
            },
            translated: source_code.is_some(),
            truncated: truncated.truncated,
            detected_language: detected.clone(),
            duration_ms: started.elapsed().as_millis() as u64,
            stages: trace.stages,
        };
        info!(
            "Summary ready: {} -> {} characters in {} ms",
            stats.input_chars, stats.summary_chars, stats.duration_ms
        );

        Ok(PipelineRun {
            result: SummaryResult {
                lang: detected.code,
                text: text_out,
            },
            stats,
        })
    }
}
