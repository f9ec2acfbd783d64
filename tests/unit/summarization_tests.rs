/*!
 * Tests for the provider-backed summarization engine
 */

use std::sync::Arc;

use polysum::app_config::SummarizationConfig;
use polysum::errors::SummarizationError;
use polysum::prompts::PromptTemplate;
use polysum::providers::mock::MockProvider;
use polysum::summarization::{ProviderSummarizer, SummarizationEngine, SummaryParams};

fn summarizer(provider: &MockProvider) -> ProviderSummarizer {
    ProviderSummarizer::new(Arc::new(provider.clone()), "mock-model")
}

fn params(min_length: usize, max_length: usize) -> SummaryParams {
    SummaryParams {
        min_length,
        max_length,
        num_beams: 2,
    }
}

#[tokio::test]
async fn test_summarize_shouldSendDeterministicRequest() {
    let provider = MockProvider::working();
    let engine = summarizer(&provider).with_max_tokens(256);

    let summary = engine.summarize("  Short English text.  ", &params(20, 200)).await.unwrap();

    assert_eq!(summary, "Short English text.");
    let request = &provider.requests()[0];
    assert_eq!(request.prompt, "Short English text.");
    assert_eq!(request.temperature, Some(0.0));
    assert_eq!(request.max_tokens, Some(256));
    let system = request.system.as_deref().unwrap();
    assert!(system.contains("between 20 and 200 words"));
}

#[tokio::test]
async fn test_summarize_withCustomPrompt_shouldRenderBounds() {
    let provider = MockProvider::working();
    let engine = summarizer(&provider).with_prompt(PromptTemplate::new("At most {max_length} words"));

    engine.summarize("text", &params(5, 40)).await.unwrap();

    assert_eq!(provider.requests()[0].system.as_deref(), Some("At most 40 words"));
}

#[tokio::test]
async fn test_summarize_withLongModelOutput_shouldClipToMaxLength() {
    let provider = MockProvider::working()
        .with_custom_response(|_| "one two three four five six seven eight nine ten".to_string());

    let summary = summarizer(&provider).summarize("input", &params(1, 5)).await.unwrap();

    assert_eq!(summary, "one two three four five");
}

#[tokio::test]
async fn test_summarize_withBlankModelOutput_shouldFail() {
    let provider = MockProvider::empty();
    let error = summarizer(&provider).summarize("input", &params(1, 5)).await.unwrap_err();
    assert!(matches!(error, SummarizationError::EmptyOutput));
}

#[tokio::test]
async fn test_summarize_withInvalidParams_shouldFailBeforeRequest() {
    let provider = MockProvider::working();
    let engine = summarizer(&provider);

    let error = engine.summarize("input", &params(50, 10)).await.unwrap_err();
    assert!(matches!(error, SummarizationError::InvalidParams(_)));

    let no_beams = SummaryParams {
        num_beams: 0,
        ..SummaryParams::default()
    };
    assert!(engine.summarize("input", &no_beams).await.is_err());
    assert_eq!(provider.request_count(), 0);
}

#[tokio::test]
async fn test_summarize_withEmptyInput_shouldFail() {
    let provider = MockProvider::working();
    let error = summarizer(&provider).summarize("   ", &SummaryParams::default()).await.unwrap_err();

    assert!(matches!(error, SummarizationError::EmptyInput));
    assert_eq!(provider.request_count(), 0);
}

#[tokio::test]
async fn test_summarize_withFailingProvider_shouldWrapProviderError() {
    let provider = MockProvider::failing();
    let error = summarizer(&provider).summarize("input", &SummaryParams::default()).await.unwrap_err();
    assert!(matches!(error, SummarizationError::Provider(_)));
}

#[test]
fn test_summary_params_fromConfig_shouldCopyLengths() {
    let config = SummarizationConfig {
        sum_max_length: 120,
        sum_min_length: 15,
        num_beams: 4,
        ..SummarizationConfig::default()
    };
    assert_eq!(SummaryParams::from(&config), SummaryParams {
        min_length: 15,
        max_length: 120,
        num_beams: 4
    });
}
