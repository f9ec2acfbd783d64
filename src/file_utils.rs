use anyhow::{Context, Result, anyhow};
use log::{debug, error, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;
use walkdir::WalkDir;

use crate::pipeline::Document;

// @module: File and document input utilities

/// Extensions read as plain UTF-8 text
pub const TEXT_EXTENSIONS: [&str; 3] = ["txt", "md", "text"];

// @const: Any run of whitespace
static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\s+").unwrap()
});

/// Replace non-breaking spaces, tabs and line breaks, then collapse runs of whitespace
pub fn normalize_whitespace(text: &str) -> String {
    let replaced = text.replace(['\u{00a0}', '\u{202f}', '\u{2007}'], " ");
    WHITESPACE_RUN.replace_all(&replaced, " ").trim().to_string()
}

/// Kinds of input file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    /// Plain text, read as UTF-8
    Text,
    /// PDF, extracted with `pdftotext`
    Pdf,
    /// Anything else
    Unknown,
}

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: File existence
    pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().is_file()
    }

    // @checks: Directory existence
    pub fn dir_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().is_dir()
    }

    /// Read a file to a string
    pub fn read_to_string<P: AsRef<Path>>(path: P) -> Result<String> {
        fs::read_to_string(&path).with_context(|| format!("Failed to read file: {:?}", path.as_ref()))
    }

    /// Write a string to a file, creating parent directories
    pub fn write_to_file<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&path, content).with_context(|| format!("Failed to write to file: {:?}", path.as_ref()))
    }

    /// Path for the summary of `input`: `<stem>.summary.<ext>` next to it
    pub fn summary_output_path<P: AsRef<Path>>(input: P, extension: &str) -> PathBuf {
        let input = input.as_ref();
        let stem = input.file_stem().unwrap_or_default().to_string_lossy();
        input.with_file_name(format!("{}.summary.{}", stem, extension))
    }

    /// Find files with any of the given extensions below `dir`
    pub fn find_files<P: AsRef<Path>>(dir: P, extensions: &[&str]) -> Result<Vec<PathBuf>> {
        let mut result = Vec::new();

        for entry in WalkDir::new(dir.as_ref()).follow_links(true) {
            let entry = entry.context("Failed to read directory entry")?;
            let path = entry.path();

            let matches = path.is_file()
                && path.extension().is_some_and(|ext| {
                    let ext = ext.to_string_lossy();
                    extensions.iter().any(|wanted| ext.eq_ignore_ascii_case(wanted.trim_start_matches('.')))
                });
            if matches {
                result.push(path.to_path_buf());
            }
        }

        result.sort();
        Ok(result)
    }

    /// Decide how a file is read from its extension, then its magic bytes
    pub fn detect_file_type<P: AsRef<Path>>(path: P) -> Result<FileType> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(anyhow!("File does not exist: {:?}", path));
        }

        if let Some(ext) = path.extension() {
            let ext = ext.to_string_lossy().to_lowercase();
            if ext == "pdf" {
                return Ok(FileType::Pdf);
            }
            if TEXT_EXTENSIONS.contains(&ext.as_str()) {
                return Ok(FileType::Text);
            }
        }

        let mut header = [0u8; 5];
        let read = fs::File::open(path)
            .and_then(|mut file| file.read(&mut header))
            .with_context(|| format!("Failed to read file: {:?}", path))?;
        if read == header.len() && &header == b"%PDF-" {
            return Ok(FileType::Pdf);
        }

        match fs::read(path) {
            Ok(bytes) if std::str::from_utf8(&bytes).is_ok() => Ok(FileType::Text),
            _ => Ok(FileType::Unknown),
        }
    }

    /// Read a text or PDF file into a document
    pub async fn load_document<P: AsRef<Path>>(path: P, extractor: &PdfExtractor) -> Result<Document> {
        let path = path.as_ref();
        match Self::detect_file_type(path)? {
            FileType::Text => {
                let text = Self::read_to_string(path)?;
                Ok(Document::from_file(path, text))
            }
            FileType::Pdf => {
                let text = extractor.extract(path).await?;
                Ok(Document::from_pdf(path, text))
            }
            FileType::Unknown => Err(anyhow!("Unsupported input file (not UTF-8 text or PDF): {:?}", path)),
        }
    }
}

/// Plain-text extraction from PDFs through poppler's `pdftotext`
#[derive(Debug, Clone)]
pub struct PdfExtractor {
    program: String,
    timeout: Duration,
}

impl Default for PdfExtractor {
    fn default() -> Self {
        Self {
            program: "pdftotext".to_string(),
            timeout: Duration::from_secs(60),
        }
    }
}

impl PdfExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use another executable with the same command line
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Extract the text of every page, whitespace normalized
    pub async fn extract<P: AsRef<Path>>(&self, path: P) -> Result<String> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(anyhow!("PDF file not found: {:?}", path));
        }
        if !path
            .extension()
            .is_some_and(|ext| ext.to_string_lossy().eq_ignore_ascii_case("pdf"))
        {
            warn!("File may not be a PDF: {:?}", path);
        }

        debug!("Extracting text from {:?} with {}", path, self.program);
        let extraction = Command::new(&self.program)
            .arg("-layout")
            .args(["-enc", "UTF-8"])
            .arg(path)
            .arg("-")
            .kill_on_drop(true)
            .output();

        let output = tokio::select! {
            result = extraction => {
                result.with_context(|| format!("Failed to execute {} for {:?}", self.program, path))?
            },
            _ = tokio::time::sleep(self.timeout) => {
                return Err(anyhow!("{} timed out after {} seconds", self.program, self.timeout.as_secs()));
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            error!("PDF text extraction failed: {}", stderr.trim());
            return Err(anyhow!("PDF text extraction failed: {}", stderr.trim()));
        }

        let text = normalize_whitespace(&String::from_utf8_lossy(&output.stdout));
        if text.is_empty() {
            return Err(anyhow!("No text could be extracted from {:?}", path));
        }
        Ok(text)
    }
}
