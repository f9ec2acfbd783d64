use anyhow::{Context, Result, anyhow};
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::app_config::Config;
use crate::errors::PipelineError;
use crate::file_utils::{FileManager, PdfExtractor, TEXT_EXTENSIONS};
use crate::pipeline::{Document, PipelineRun, SummaryPipeline};
use crate::providers::{Provider, create_provider};
use crate::summarization::SummaryParams;

// @module: Application controller for document summarization

/// Counts of one folder run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FolderReport {
    pub processed: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Main application controller
#[derive(Debug, Clone)]
pub struct Controller {
    config: Config,
    pipeline: SummaryPipeline,
    /// Backend used for connectivity checks, absent when engines were injected
    provider: Option<Arc<dyn Provider>>,
    pdf: PdfExtractor,
    show_progress: bool,
}

impl Controller {
    /// Create a controller backed by the configured provider
    pub fn with_config(config: Config) -> Result<Self> {
        config.validate().context("Configuration validation failed")?;
        let provider = create_provider(&config.models)?;
        Self::with_provider(config, provider)
    }

    /// Create a controller whose engines run on the given provider
    pub fn with_provider(config: Config, provider: Arc<dyn Provider>) -> Result<Self> {
        let pipeline = SummaryPipeline::from_config(&config, Arc::clone(&provider))?;
        Ok(Self {
            config,
            pipeline,
            provider: Some(provider),
            pdf: PdfExtractor::default(),
            show_progress: false,
        })
    }

    /// Create a controller around an already assembled pipeline
    pub fn with_pipeline(config: Config, pipeline: SummaryPipeline) -> Self {
        Self {
            config,
            pipeline,
            provider: None,
            pdf: PdfExtractor::default(),
            show_progress: false,
        }
    }

    /// Show a spinner while files are processed
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn with_pdf_extractor(mut self, pdf: PdfExtractor) -> Self {
        self.pdf = pdf;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn pipeline(&self) -> &SummaryPipeline {
        &self.pipeline
    }

    /// Summarize inline text
    pub async fn summarize_text(&self, text: &str, params: Option<SummaryParams>) -> Result<PipelineRun, PipelineError> {
        let document = Document::inline(text);
        let params = params.unwrap_or(self.pipeline.config().summary);
        self.pipeline.process_document_with_params(&document, &params).await
    }

    /// Summarize a text or PDF file
    pub async fn summarize_file(&self, path: &Path, params: Option<SummaryParams>) -> Result<PipelineRun> {
        let spinner = self.spinner(format!(
            "Summarizing {}",
            path.file_name().map(|f| f.to_string_lossy().to_string()).unwrap_or_default()
        ));

        let result = async {
            let document = FileManager::load_document(path, &self.pdf).await?;
            let params = params.unwrap_or(self.pipeline.config().summary);
            let run = self.pipeline.process_document_with_params(&document, &params).await?;
            Ok::<_, anyhow::Error>(run)
        }
        .await;

        if let Some(spinner) = spinner {
            spinner.finish_and_clear();
        }
        result
    }

    /// Summarize every text and PDF file below `input_dir`.
    ///
    /// Each summary is written to `<stem>.summary.txt` next to its input.
    /// Existing summaries are kept unless `force_overwrite` is set.
    pub async fn summarize_folder(&self, input_dir: &Path, force_overwrite: bool) -> Result<FolderReport> {
        if !FileManager::dir_exists(input_dir) {
            return Err(anyhow!("Input directory does not exist: {:?}", input_dir));
        }

        let mut extensions = TEXT_EXTENSIONS.to_vec();
        extensions.push("pdf");
        let files: Vec<PathBuf> = FileManager::find_files(input_dir, &extensions)?
            .into_iter()
            .filter(|path| !is_summary_file(path))
            .collect();

        if files.is_empty() {
            return Err(anyhow!("No text or PDF files found in directory: {:?}", input_dir));
        }

        let folder_pb = self.progress_bar(files.len() as u64);
        let mut report = FolderReport::default();

        for file in &files {
            let output_path = FileManager::summary_output_path(file, "txt");
            if output_path.exists() && !force_overwrite {
                warn!("Skipping {:?}, summary already exists (use -f to force overwrite)", file);
                report.skipped += 1;
                if let Some(pb) = &folder_pb {
                    pb.inc(1);
                }
                continue;
            }

            if let Some(pb) = &folder_pb {
                pb.set_message(format!(
                    "Processing: {}",
                    file.file_name().map(|f| f.to_string_lossy().to_string()).unwrap_or_default()
                ));
            }

            let outcome = async {
                let document = FileManager::load_document(file, &self.pdf).await?;
                let run = self.pipeline.process_document(&document).await?;
                FileManager::write_to_file(&output_path, &run.result.text)?;
                Ok::<_, anyhow::Error>(run)
            }
            .await;

            match outcome {
                Ok(run) => {
                    info!("Summary ({}) written to {:?}", run.result.lang, output_path);
                    report.processed += 1;
                }
                Err(e) => {
                    error!("Error processing file {:?}: {}", file, e);
                    report.failed += 1;
                }
            }

            if let Some(pb) = &folder_pb {
                pb.inc(1);
            }
        }

        if let Some(pb) = folder_pb {
            pb.finish_with_message("Folder processing complete");
        }
        info!(
            "Folder processing completed: {} processed, {} skipped, {} errors",
            report.processed, report.skipped, report.failed
        );
        Ok(report)
    }

    /// Check that the configured provider answers
    pub async fn check_connection(&self) -> Result<()> {
        let provider = self
            .provider
            .as_ref()
            .ok_or_else(|| anyhow!("No provider configured for this controller"))?;
        provider
            .test_connection()
            .await
            .with_context(|| format!("Could not reach {}", provider.name()))?;
        info!(
            "Connected to {} (model '{}')",
            self.config.models.provider.display_name(),
            self.config.models.get_model()
        );
        Ok(())
    }

    fn spinner(&self, message: String) -> Option<ProgressBar> {
        if !self.show_progress {
            return None;
        }
        let spinner = ProgressBar::new_spinner();
        let style = ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        spinner.set_style(style);
        spinner.set_message(message);
        spinner.enable_steady_tick(Duration::from_millis(100));
        Some(spinner)
    }

    fn progress_bar(&self, len: u64) -> Option<ProgressBar> {
        if !self.show_progress {
            return None;
        }
        let pb = ProgressBar::new(len);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files ({percent}%) {msg}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        pb.set_style(style.progress_chars("█▓▒░"));
        Some(pb)
    }
}

/// Files written by an earlier folder run
fn is_summary_file(path: &Path) -> bool {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().ends_with(".summary"))
        .unwrap_or(false)
}
