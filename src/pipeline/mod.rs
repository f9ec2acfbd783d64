/*!
 * Summarization pipeline.
 *
 * A request moves through detection, support routing, optional translation
 * into English, truncation, summarization and optional back-translation.
 * Each step either advances the run or ends it with a `PipelineError`.
 */

pub mod document;
pub mod orchestrator;

pub use document::{Document, DocumentSource, PipelineRun, ProcessingStats, SummaryResult};
pub use orchestrator::{PipelineConfig, PipelineStage, SummaryPipeline, SummaryPipelineBuilder};
