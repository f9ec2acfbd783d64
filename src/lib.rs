/*!
 * # polysum - multilingual document summarization
 *
 * A Rust library that summarizes a document in the language it was written in.
 *
 * ## Features
 *
 * - Language detection with a confidence threshold
 * - English input summarized directly
 * - Catalan, Spanish, French, Italian, Portuguese and Romanian input
 *   translated to English, summarized, and the summary translated back
 * - Translation and summarization backed by LLM providers:
 *   - Ollama (local LLM)
 *   - OpenAI API and OpenAI-compatible servers such as LM Studio
 *   - Anthropic API
 * - Sentence-aware truncation of the summarizer input
 * - Text, Markdown and PDF documents
 * - A CLI and an HTTP API
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `detection`: Language identification
 * - `language_policy`: Which languages are served and how
 * - `chunker`: Input truncation and segmentation
 * - `translation`: Translation engine and cache
 * - `summarization`: Summarization engine
 * - `pipeline`: The request state machine tying the engines together
 * - `providers`: Client implementations for various LLM providers:
 *   - `providers::ollama`: Ollama API client
 *   - `providers::openai`: OpenAI API client
 *   - `providers::anthropic`: Anthropic API client
 *   - `providers::mock`: Scripted provider for tests
 * - `file_utils`: File system operations and PDF text extraction
 * - `app_controller`: Main application controller
 * - `api`: HTTP API
 * - `language_utils`: ISO language code utilities
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod api;
pub mod app_config;
pub mod app_controller;
pub mod chunker;
pub mod detection;
pub mod errors;
pub mod file_utils;
pub mod language_policy;
pub mod language_utils;
pub mod pipeline;
pub mod prompts;
pub mod providers;
pub mod summarization;
pub mod translation;

// Re-export main types for easier usage
pub use app_config::Config;
pub use detection::{DetectedLanguage, LanguageDetector, WhatlangDetector};
pub use errors::{AppError, DetectionError, PipelineError, ProviderError, SummarizationError, TranslationError};
pub use language_policy::{LanguageSupportPolicy, SupportDecision};
pub use language_utils::{get_language_name, language_codes_match, normalize_to_part2t};
pub use pipeline::{Document, PipelineRun, SummaryPipeline, SummaryResult};
pub use summarization::{SummarizationEngine, SummaryParams};
pub use translation::TranslationEngine;
