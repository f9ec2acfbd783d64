/*!
 * Tests for the application controller over files and folders
 */

use anyhow::Result;
use std::fs;
use std::sync::Arc;

use polysum::app_config::Config;
use polysum::app_controller::{Controller, FolderReport};
use polysum::providers::mock::MockProvider;

use crate::common::stub_engines::{StubDetector, StubSummarizer, StubTranslator};
use crate::common::{ENGLISH_TEXT, FRENCH_TEXT, StubSet, create_temp_dir, create_test_file, init_test_logging};

fn mock_controller(provider: MockProvider) -> Result<Controller> {
    init_test_logging();
    Controller::with_provider(Config::default(), Arc::new(provider))
}

#[tokio::test]
async fn test_summarize_text_withEnglish_shouldUseOneProviderCall() -> Result<()> {
    let provider = MockProvider::working();
    let controller = mock_controller(provider.clone())?;

    let run = controller.summarize_text(ENGLISH_TEXT, None).await?;

    assert_eq!(run.result.lang, "en");
    assert!(!run.result.text.is_empty());
    assert_eq!(provider.request_count(), 1);
    Ok(())
}

#[tokio::test]
async fn test_summarize_text_withFrench_shouldCallProviderThreeTimes() -> Result<()> {
    let provider = MockProvider::working();
    let controller = mock_controller(provider.clone())?;

    let run = controller.summarize_text(FRENCH_TEXT, None).await?;

    // translate to English, summarize, translate back
    assert_eq!(run.result.lang, "fr");
    assert_eq!(provider.request_count(), 3);
    assert!(run.stats.translated);
    Ok(())
}

#[tokio::test]
async fn test_summarize_file_withTextFile_shouldReadAndSummarize() -> Result<()> {
    let temp_dir = create_temp_dir()?;
    let path = create_test_file(temp_dir.path(), "article.txt", ENGLISH_TEXT)?;
    let controller = mock_controller(MockProvider::working())?;

    let run = controller.summarize_file(&path, None).await?;

    assert_eq!(run.result.lang, "en");
    assert_eq!(run.stats.input_chars, ENGLISH_TEXT.chars().count());
    Ok(())
}

#[tokio::test]
async fn test_summarize_file_withMissingFile_shouldFail() -> Result<()> {
    let temp_dir = create_temp_dir()?;
    let controller = mock_controller(MockProvider::working())?;

    let result = controller.summarize_file(&temp_dir.path().join("missing.txt"), None).await;
    assert!(result.is_err());
    Ok(())
}

#[tokio::test]
async fn test_summarize_folder_withExistingSummary_shouldSkipIt() -> Result<()> {
    let temp_dir = create_temp_dir()?;
    create_test_file(temp_dir.path(), "a.txt", ENGLISH_TEXT)?;
    create_test_file(temp_dir.path(), "a.summary.txt", "old summary")?;
    create_test_file(temp_dir.path(), "b.md", ENGLISH_TEXT)?;
    create_test_file(temp_dir.path(), "ignored.csv", "x,y")?;

    let stubs = StubSet::detecting("en");
    let controller = Controller::with_pipeline(Config::default(), stubs.pipeline());

    let report = controller.summarize_folder(temp_dir.path(), false).await?;

    assert_eq!(
        report,
        FolderReport {
            processed: 1,
            skipped: 1,
            failed: 0
        }
    );
    assert_eq!(fs::read_to_string(temp_dir.path().join("a.summary.txt"))?, "old summary");
    assert!(temp_dir.path().join("b.summary.txt").exists());
    Ok(())
}

#[tokio::test]
async fn test_summarize_folder_withForceOverwrite_shouldReplaceSummaries() -> Result<()> {
    let temp_dir = create_temp_dir()?;
    create_test_file(temp_dir.path(), "a.txt", ENGLISH_TEXT)?;
    create_test_file(temp_dir.path(), "a.summary.txt", "old summary")?;

    let stubs = StubSet::new(
        StubDetector::fixed("en"),
        StubTranslator::tagging(),
        StubSummarizer::fixed("new summary"),
    );
    let controller = Controller::with_pipeline(Config::default(), stubs.pipeline());

    let report = controller.summarize_folder(temp_dir.path(), true).await?;

    assert_eq!(report.processed, 1);
    assert_eq!(fs::read_to_string(temp_dir.path().join("a.summary.txt"))?, "new summary");
    Ok(())
}

#[tokio::test]
async fn test_summarize_folder_withUnreadableFile_shouldCountFailure() -> Result<()> {
    let temp_dir = create_temp_dir()?;
    create_test_file(temp_dir.path(), "good.txt", ENGLISH_TEXT)?;
    fs::write(temp_dir.path().join("broken.txt"), [0xff, 0xfe, 0x00, 0x81])?;

    let stubs = StubSet::detecting("en");
    let controller = Controller::with_pipeline(Config::default(), stubs.pipeline());

    let report = controller.summarize_folder(temp_dir.path(), false).await?;

    assert_eq!(report.processed, 1);
    assert_eq!(report.failed, 1);
    Ok(())
}

#[tokio::test]
async fn test_summarize_folder_withNoDocuments_shouldFail() -> Result<()> {
    let temp_dir = create_temp_dir()?;
    create_test_file(temp_dir.path(), "data.csv", "a,b")?;
    let controller = Controller::with_pipeline(Config::default(), StubSet::detecting("en").pipeline());

    assert!(controller.summarize_folder(temp_dir.path(), false).await.is_err());
    assert!(controller.summarize_folder(&temp_dir.path().join("nope"), false).await.is_err());
    Ok(())
}

#[tokio::test]
async fn test_check_connection_withProviderStates_shouldReportReachability() -> Result<()> {
    assert!(mock_controller(MockProvider::working())?.check_connection().await.is_ok());
    assert!(mock_controller(MockProvider::failing())?.check_connection().await.is_err());

    let injected = Controller::with_pipeline(Config::default(), StubSet::detecting("en").pipeline());
    assert!(injected.check_connection().await.is_err());
    Ok(())
}
