/*!
 * Tests for the summarization pipeline state machine
 */

use std::time::Duration;

use polysum::errors::{DetectionError, FailureKind, PipelineError, SummarizationError, TranslationError};
use polysum::pipeline::{Document, PipelineConfig, PipelineStage, SummaryPipeline};
use polysum::summarization::SummaryParams;
use polysum::translation::TranslationDirection;

use crate::common::stub_engines::{StubDetector, StubSummarizer, StubTranslator};
use crate::common::{ENGLISH_TEXT, FRENCH_TEXT, GERMAN_TEXT, SPANISH_TEXT, StubSet};

#[tokio::test]
async fn test_process_withSupportedNonEnglish_shouldReportDetectedLanguage() {
    for (code, text) in [("fr", FRENCH_TEXT), ("es", SPANISH_TEXT), ("pt", FRENCH_TEXT), ("ca", SPANISH_TEXT)] {
        let stubs = StubSet::detecting(code);
        let result = stubs.pipeline().process(text).await.unwrap();

        assert_eq!(result.lang, code);
        assert_ne!(result.lang, "en");
        assert!(result.text.starts_with(&format!("[en->{}]", code)), "unexpected summary: {}", result.text);
    }
}

#[tokio::test]
async fn test_process_withSupportedNonEnglish_shouldTranslateBothWays() {
    let stubs = StubSet::detecting("fr");
    stubs.pipeline().process(FRENCH_TEXT).await.unwrap();

    let calls = stubs.translator.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!((calls[0].source.as_str(), calls[0].target.as_str()), ("fr", "en"));
    assert_eq!(calls[0].text, FRENCH_TEXT);
    assert_eq!((calls[1].source.as_str(), calls[1].target.as_str()), ("en", "fr"));

    // The summarizer only ever sees the English working text
    let inputs = stubs.summarizer.inputs();
    assert_eq!(inputs.len(), 1);
    assert!(inputs[0].starts_with("[fr->en]"));
}

#[tokio::test]
async fn test_process_withEnglish_shouldNeverInvokeTranslator() {
    let stubs = StubSet::detecting("en");
    let result = stubs.pipeline().process(ENGLISH_TEXT).await.unwrap();

    assert_eq!(result.lang, "en");
    assert_eq!(stubs.translator.call_count(), 0);
    assert_eq!(stubs.summarizer.call_count(), 1);
    assert_eq!(result.text, "The city council approved the new budget on");
}

#[tokio::test]
async fn test_process_withUnsupportedLanguage_shouldFailBeforeSummarizing() {
    let stubs = StubSet::detecting("de");
    let error = stubs.pipeline().process(GERMAN_TEXT).await.unwrap_err();

    match &error {
        PipelineError::UnsupportedLanguage { code, supported } => {
            assert_eq!(code, "de");
            assert_eq!(supported.first().map(String::as_str), Some("en"));
            assert!(supported.contains(&"ro".to_string()));
        }
        other => panic!("expected UnsupportedLanguage, got {:?}", other),
    }
    assert_eq!(stubs.summarizer.call_count(), 0);
    assert_eq!(stubs.translator.call_count(), 0);
    assert_eq!(error.kind(), FailureKind::Client);
    assert_eq!(error.status_code(), 422);
}

#[tokio::test]
async fn test_process_withEmptyInput_shouldFailWithDetectionError() {
    let stubs = StubSet::detecting("en");
    let pipeline = stubs.pipeline();

    for input in ["", "   \n\t"] {
        let error = pipeline.process(input).await.unwrap_err();
        assert!(matches!(error, PipelineError::Detection(DetectionError::EmptyInput)));
        assert_eq!(error.status_code(), 400);
    }
    assert_eq!(stubs.detector.calls(), 0);
    assert_eq!(stubs.summarizer.call_count(), 0);
}

#[tokio::test]
async fn test_process_withUndetectableText_shouldPropagateDetectorError() {
    let stubs = StubSet::new(
        StubDetector::failing(DetectionError::Ambiguous("no match".to_string())),
        StubTranslator::tagging(),
        StubSummarizer::first_words(5),
    );
    let error = stubs.pipeline().process("zzkx qqv").await.unwrap_err();

    assert!(matches!(error, PipelineError::Detection(DetectionError::Ambiguous(_))));
    assert_eq!(error.kind(), FailureKind::Client);
    assert_eq!(stubs.summarizer.call_count(), 0);
}

#[tokio::test]
async fn test_process_withFrenchRoundTrip_shouldReturnBackTranslatedSummary() {
    let stubs = StubSet::new(
        StubDetector::fixed("fr"),
        StubTranslator::scripted(&[(FRENCH_TEXT, "English working text"), ("English summary", "Résumé français")]),
        StubSummarizer::fixed("English summary"),
    );
    let result = stubs.pipeline().process(FRENCH_TEXT).await.unwrap();

    assert_eq!(result.lang, "fr");
    assert_eq!(result.text, "Résumé français");
    assert_eq!(stubs.summarizer.inputs(), vec!["English working text".to_string()]);
}

#[tokio::test]
async fn test_process_withRepeatedInput_shouldBeIdempotent() {
    let stubs = StubSet::detecting("it");
    let pipeline = stubs.pipeline();

    let first = pipeline.process(FRENCH_TEXT).await.unwrap();
    let second = pipeline.process(FRENCH_TEXT).await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_process_withLongInput_shouldBoundSummarizerInput() {
    let long_text = ENGLISH_TEXT.repeat(20);
    let stubs = StubSet::detecting("en");
    let pipeline = stubs.pipeline_with(PipelineConfig::default().with_input_max_length(100));

    let run = pipeline.process_document(&Document::inline(long_text.clone())).await.unwrap();

    let inputs = stubs.summarizer.inputs();
    assert!(inputs[0].chars().count() <= 100);
    assert!(long_text.starts_with(&inputs[0]));
    assert!(run.stats.truncated);
    assert_eq!(run.stats.working_chars, inputs[0].chars().count());
}

#[tokio::test]
async fn test_process_withInputAtLimit_shouldPassTextUnmodified() {
    let limit = ENGLISH_TEXT.chars().count();

    for budget in [limit, limit + 1, 1024] {
        let stubs = StubSet::detecting("en");
        let pipeline = stubs.pipeline_with(PipelineConfig::default().with_input_max_length(budget));
        let run = pipeline.process_document(&Document::inline(ENGLISH_TEXT)).await.unwrap();

        assert_eq!(stubs.summarizer.inputs(), vec![ENGLISH_TEXT.to_string()]);
        assert!(!run.stats.truncated);
    }
}

#[tokio::test]
async fn test_process_withLongTranslatedInput_shouldTruncateAfterTranslation() {
    let long_french = FRENCH_TEXT.repeat(10);
    let stubs = StubSet::detecting("fr");
    let pipeline = stubs.pipeline_with(PipelineConfig::default().with_input_max_length(200));

    pipeline.process(&long_french).await.unwrap();

    // Translation receives the whole document, the summarizer only the budget
    assert_eq!(stubs.translator.calls()[0].text, long_french);
    assert!(stubs.summarizer.inputs()[0].chars().count() <= 200);
}

#[tokio::test]
async fn test_process_withSlowSummarizer_shouldTimeOut() {
    let stubs = StubSet::new(StubDetector::fixed("en"), StubTranslator::tagging(), StubSummarizer::slow(500));
    let pipeline =
        stubs.pipeline_with(PipelineConfig::default().with_stage_timeout(Some(Duration::from_millis(20))));

    let error = pipeline.process(ENGLISH_TEXT).await.unwrap_err();
    assert!(matches!(error, PipelineError::Timeout { operation: "Summarization", .. }));
    assert_eq!(error.kind(), FailureKind::Server);
    assert_eq!(error.status_code(), 504);
}

#[tokio::test]
async fn test_process_withSlowTranslator_shouldTimeOutBeforeSummarizing() {
    let stubs = StubSet::new(StubDetector::fixed("ro"), StubTranslator::slow(500), StubSummarizer::first_words(3));
    let pipeline =
        stubs.pipeline_with(PipelineConfig::default().with_stage_timeout(Some(Duration::from_millis(20))));

    let error = pipeline.process(SPANISH_TEXT).await.unwrap_err();
    assert!(matches!(error, PipelineError::Timeout { operation: "Translation to English", .. }));
    assert_eq!(stubs.summarizer.call_count(), 0);
}

#[tokio::test]
async fn test_process_withoutStageTimeout_shouldWaitForSlowEngines() {
    let stubs = StubSet::new(StubDetector::fixed("en"), StubTranslator::tagging(), StubSummarizer::slow(30));
    let pipeline = stubs.pipeline_with(PipelineConfig::default().with_stage_timeout_secs(0));

    let result = pipeline.process(ENGLISH_TEXT).await.unwrap();
    assert_eq!(result.text, "late summary");
}

#[tokio::test]
async fn test_process_withEmptyTranslation_shouldFailWithTranslationError() {
    let stubs = StubSet::new(StubDetector::fixed("es"), StubTranslator::empty(), StubSummarizer::first_words(3));
    let error = stubs.pipeline().process(SPANISH_TEXT).await.unwrap_err();

    match error {
        PipelineError::Translation { direction, source } => {
            assert_eq!(direction, TranslationDirection::ToWorking);
            assert!(matches!(source, TranslationError::EmptyOutput { .. }));
        }
        other => panic!("expected Translation error, got {:?}", other),
    }
    assert_eq!(stubs.summarizer.call_count(), 0);
}

#[tokio::test]
async fn test_process_withFailingTranslator_shouldNotFallBackToSourceText() {
    let stubs = StubSet::new(StubDetector::fixed("fr"), StubTranslator::failing(), StubSummarizer::first_words(3));
    let error = stubs.pipeline().process(FRENCH_TEXT).await.unwrap_err();

    assert!(matches!(error, PipelineError::Translation { direction: TranslationDirection::ToWorking, .. }));
    assert_eq!(error.status_code(), 500);
    assert_eq!(stubs.summarizer.call_count(), 0);
}

#[tokio::test]
async fn test_process_withEmptySummary_shouldFailWithSummarizationError() {
    let stubs = StubSet::new(StubDetector::fixed("en"), StubTranslator::tagging(), StubSummarizer::empty());
    let error = stubs.pipeline().process(ENGLISH_TEXT).await.unwrap_err();

    assert!(matches!(error, PipelineError::Summarization(SummarizationError::EmptyOutput)));
    assert_eq!(error.kind(), FailureKind::Server);
}

#[tokio::test]
async fn test_process_withFailingSummarizer_shouldSkipBackTranslation() {
    let stubs = StubSet::new(StubDetector::fixed("fr"), StubTranslator::tagging(), StubSummarizer::failing());
    let error = stubs.pipeline().process(FRENCH_TEXT).await.unwrap_err();

    assert!(matches!(error, PipelineError::Summarization(SummarizationError::Provider(_))));
    assert_eq!(stubs.translator.call_count(), 1);
}

#[tokio::test]
async fn test_process_document_withEnglish_shouldVisitEveryStageInOrder() {
    let stubs = StubSet::detecting("en");
    let run = stubs
        .pipeline()
        .process_document(&Document::inline(ENGLISH_TEXT))
        .await
        .unwrap();

    assert_eq!(
        run.stats.stages,
        vec![
            PipelineStage::Received,
            PipelineStage::Detected,
            PipelineStage::Routed,
            PipelineStage::Chunked,
            PipelineStage::Ready,
            PipelineStage::Summarized,
            PipelineStage::Completed,
        ]
    );
    assert!(!run.stats.translated);
    assert_eq!(run.stats.detected_language.code, "en");
    assert_eq!(run.stats.input_chars, ENGLISH_TEXT.chars().count());
    assert_eq!(run.stats.summary_words, 8);
    assert!(run.stats.compression_ratio > 0.0 && run.stats.compression_ratio < 1.0);
}

#[tokio::test]
async fn test_process_with_params_shouldForwardRequestParameters() {
    let stubs = StubSet::detecting("en");
    let params = SummaryParams {
        min_length: 10,
        max_length: 60,
        num_beams: 4,
    };
    stubs.pipeline().process_with_params(ENGLISH_TEXT, &params).await.unwrap();

    assert_eq!(stubs.summarizer.params(), vec![params]);
}

#[tokio::test]
async fn test_process_withConcurrentRequests_shouldShareEngines() {
    let stubs = StubSet::detecting("fr");
    let pipeline = stubs.pipeline();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let pipeline = pipeline.clone();
            tokio::spawn(async move { pipeline.process(FRENCH_TEXT).await })
        })
        .collect();

    for handle in handles {
        let result = handle.await.unwrap().unwrap();
        assert_eq!(result.lang, "fr");
    }
    assert_eq!(stubs.summarizer.call_count(), 8);
    assert_eq!(stubs.translator.call_count(), 16);
}

#[test]
fn test_builder_withoutEngines_shouldFail() {
    use std::sync::Arc;

    assert!(SummaryPipeline::builder().build().is_err());
    assert!(
        SummaryPipeline::builder()
            .translator(Arc::new(StubTranslator::tagging()))
            .build()
            .is_err()
    );
}

#[tokio::test]
async fn test_process_withTooShortText_shouldFailDetectionNotLanguageSupport() {
    let stubs = StubSet::detecting("en");
    // Default detector: the whatlang backend
    let pipeline = SummaryPipeline::builder()
        .translator(stubs.translator.clone())
        .summarizer(stubs.summarizer.clone())
        .build()
        .unwrap();

    for text in ["Hello", "a"] {
        let error = pipeline.process(text).await.unwrap_err();
        assert_eq!(error.reason(), "detection_error", "{:?}: {}", text, error);
        assert_eq!(error.status_code(), 400);
    }
    assert_eq!(stubs.summarizer.call_count(), 0);
    assert_eq!(stubs.translator.call_count(), 0);
}
