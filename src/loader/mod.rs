// Loader module
// Thin file loaders producing documents for the ingestion pipeline


use std::fmt;
use std::fs;
use std::path::Path;

use anyhow::Context;
use pulldown_cmark::{Event, Parser};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{RagError, Result};

/// Origin format of a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentType {
    Pdf,
    Docx,
    Csv,
    Txt,
    Markdown,
    Website,
    Text,
}

impl DocumentType {
    #[inline]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Docx => "docx",
            Self::Csv => "csv",
            Self::Txt => "txt",
            Self::Markdown => "markdown",
            Self::Website => "website",
            Self::Text => "text",
        }
    }

    /// Parse the storage form; unknown tags map to `Text`.
    #[inline]
    pub fn from_str_lossy(value: &str) -> Self {
        match value {
            "pdf" => Self::Pdf,
            "docx" => Self::Docx,
            "csv" => Self::Csv,
            "txt" => Self::Txt,
            "markdown" => Self::Markdown,
            "website" => Self::Website,
            _ => Self::Text,
        }
    }
}

impl fmt::Display for DocumentType {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A raw document handed to the pipeline: content plus its origin
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocument {
    pub content: String,
    pub source: String,
    pub doc_type: DocumentType,
}

impl SourceDocument {
    #[inline]
    pub fn new(content: impl Into<String>, source: impl Into<String>, doc_type: DocumentType) -> Self {
        Self {
            content: content.into(),
            source: source.into(),
            doc_type,
        }
    }
}

/// Outcome of loading a directory tree
#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    pub documents: Vec<SourceDocument>,
    /// Files skipped because their extension is unsupported
    pub skipped: Vec<String>,
}

/// Load a plain text file as a single document.
#[inline]
pub fn load_txt(path: &Path) -> Result<Vec<SourceDocument>> {
    let content = read_text(path)?;
    Ok(vec![SourceDocument::new(
        content,
        path.display().to_string(),
        DocumentType::Txt,
    )])
}

/// Load a Markdown file, extracting text and code content from the markup.
#[inline]
pub fn load_markdown(path: &Path) -> Result<Vec<SourceDocument>> {
    let raw = read_text(path)?;

    let mut content = String::new();
    for event in Parser::new(&raw) {
        match event {
            Event::Text(text) | Event::Code(text) => content.push_str(&text),
            Event::SoftBreak | Event::HardBreak => content.push('\n'),
            Event::End(_) => {
                if !content.ends_with('\n') {
                    content.push('\n');
                }
            }
            _ => {}
        }
    }

    Ok(vec![SourceDocument::new(
        content,
        path.display().to_string(),
        DocumentType::Markdown,
    )])
}

/// Load a CSV file. Each row becomes a `header: value` block; the rows are
/// joined into one document so tabular context stays together.
#[inline]
pub fn load_csv(path: &Path) -> Result<Vec<SourceDocument>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open CSV file: {}", path.display()))?;

    let headers = reader
        .headers()
        .with_context(|| format!("Failed to read CSV headers: {}", path.display()))?
        .clone();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record =
            record.with_context(|| format!("Failed to read CSV row: {}", path.display()))?;
        let row_text: Vec<String> = headers
            .iter()
            .zip(record.iter())
            .map(|(header, value)| format!("{}: {}", header, value))
            .collect();
        rows.push(row_text.join("\n"));
    }

    Ok(vec![SourceDocument::new(
        rows.join("\n\n"),
        path.display().to_string(),
        DocumentType::Csv,
    )])
}

/// Load a file by extension, or walk a directory recursively.
///
/// A directory walk skips unsupported files and reports them; naming an
/// unsupported file directly is an error.
#[inline]
pub fn load_path(path: &Path) -> Result<LoadReport> {
    if path.is_dir() {
        let mut report = LoadReport::default();
        load_dir(path, &mut report)?;
        return Ok(report);
    }

    let documents = load_file(path)?;
    Ok(LoadReport {
        documents,
        skipped: Vec::new(),
    })
}

fn load_file(path: &Path) -> Result<Vec<SourceDocument>> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();

    match extension.as_str() {
        "txt" => load_txt(path),
        "md" | "markdown" => load_markdown(path),
        "csv" => load_csv(path),
        other => Err(RagError::Config(format!(
            "Unsupported file type: {:?} ({})",
            other,
            path.display()
        ))),
    }
}

fn load_dir(dir: &Path, report: &mut LoadReport) -> Result<()> {
    let entries = fs::read_dir(dir)
        .with_context(|| format!("Failed to read directory: {}", dir.display()))?;

    for entry in entries {
        let entry = entry.with_context(|| format!("Failed to read entry in {}", dir.display()))?;
        let path = entry.path();

        if path.is_dir() {
            load_dir(&path, report)?;
        } else {
            match load_file(&path) {
                Ok(documents) => report.documents.extend(documents),
                Err(RagError::Config(_)) => {
                    debug!("Skipping unsupported file: {}", path.display());
                    report.skipped.push(path.display().to_string());
                }
                Err(e) => {
                    warn!("Failed to load {}: {}", path.display(), e);
                    return Err(e);
                }
            }
        }
    }

    Ok(())
}

fn read_text(path: &Path) -> Result<String> {
    let bytes =
        fs::read(path).with_context(|| format!("Failed to read file: {}", path.display()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
