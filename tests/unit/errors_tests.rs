/*!
 * Tests for error types and conversions
 */

use polysum::errors::{
    AppError, DetectionError, ErrorPayload, FailureKind, PipelineError, ProviderError, SummarizationError,
    TranslationError,
};
use polysum::translation::TranslationDirection;

#[test]
fn test_providerError_apiError_shouldDisplayStatusAndMessage() {
    let error = ProviderError::ApiError {
        status_code: 503,
        message: "overloaded".to_string(),
    };
    let display = format!("{}", error);
    assert!(display.contains("503"));
    assert!(display.contains("overloaded"));
}

#[test]
fn test_providerError_isRetryable_shouldOnlyRetryTransientFailures() {
    assert!(ProviderError::ConnectionError("reset".to_string()).is_retryable());
    assert!(ProviderError::RateLimitExceeded("slow down".to_string()).is_retryable());
    assert!(ProviderError::ApiError { status_code: 502, message: String::new() }.is_retryable());
    assert!(!ProviderError::ApiError { status_code: 404, message: String::new() }.is_retryable());
    assert!(!ProviderError::AuthenticationError("bad key".to_string()).is_retryable());
    assert!(!ProviderError::ParseError("junk".to_string()).is_retryable());
}

#[test]
fn test_providerError_fromStatus_shouldClassifyCommonStatuses() {
    assert!(matches!(ProviderError::from_status(401, String::new()), ProviderError::AuthenticationError(_)));
    assert!(matches!(ProviderError::from_status(403, String::new()), ProviderError::AuthenticationError(_)));
    assert!(matches!(ProviderError::from_status(429, String::new()), ProviderError::RateLimitExceeded(_)));
    assert!(matches!(
        ProviderError::from_status(500, String::new()),
        ProviderError::ApiError { status_code: 500, .. }
    ));
}

#[test]
fn test_pipelineError_kind_shouldSplitClientAndServerFailures() {
    let client_errors = [
        PipelineError::Detection(DetectionError::EmptyInput),
        PipelineError::Detection(DetectionError::NoLinguisticContent),
        PipelineError::UnsupportedLanguage {
            code: "de".to_string(),
            supported: vec!["en".to_string()],
        },
    ];
    for error in &client_errors {
        assert_eq!(error.kind(), FailureKind::Client, "{}", error);
        assert!((400..500).contains(&error.status_code()));
    }

    let server_errors = [
        PipelineError::Translation {
            direction: TranslationDirection::BackToOriginal,
            source: TranslationError::EmptyInput,
        },
        PipelineError::Summarization(SummarizationError::EmptyOutput),
        PipelineError::Timeout {
            operation: "Summarization",
            secs: 5,
        },
    ];
    for error in &server_errors {
        assert_eq!(error.kind(), FailureKind::Server, "{}", error);
        assert!((500..600).contains(&error.status_code()));
    }
}

#[test]
fn test_pipelineError_display_shouldNameDirectionAndLanguages() {
    let error = PipelineError::Translation {
        direction: TranslationDirection::BackToOriginal,
        source: TranslationError::EmptyOutput {
            source_language: "en".to_string(),
            target_language: "fr".to_string(),
        },
    };
    let display = error.to_string();
    assert!(display.contains("back to original language"));
    assert!(display.contains("en -> fr"));

    let unsupported = PipelineError::UnsupportedLanguage {
        code: "de".to_string(),
        supported: vec!["en".to_string(), "fr".to_string()],
    };
    assert!(unsupported.to_string().contains("en, fr"));
}

#[test]
fn test_errorPayload_fromPipelineError_shouldCarryReasonAndStatus() {
    let error = PipelineError::UnsupportedLanguage {
        code: "ja".to_string(),
        supported: vec!["en".to_string()],
    };
    let payload = ErrorPayload::from(&error);

    assert_eq!(payload.error, "Unsupported Language");
    assert_eq!(payload.reason, "unsupported_language");
    assert_eq!(payload.status_code, 422);
    assert!(payload.message.contains("'ja'"));

    let json = serde_json::to_value(&payload).unwrap();
    assert_eq!(json["status_code"], 422);
}

#[test]
fn test_appError_fromConversions_shouldWrapSources() {
    let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
    assert!(matches!(AppError::from(io), AppError::File(_)));

    let pipeline = PipelineError::Summarization(SummarizationError::EmptyInput);
    assert!(matches!(AppError::from(pipeline), AppError::Pipeline(_)));

    let other = AppError::from(anyhow::anyhow!("boom"));
    assert!(other.to_string().contains("boom"));
}
