//! Export of AI-generated reports as Word documents.

mod docx;
mod markup;

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use thiserror::Error;
use tracing::info;

pub use docx::DocxBuilder;
pub use markup::{inline, parse_report, Block, Span};

pub const DEFAULT_REPORT_TITLE: &str = "Business analysis report";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("nothing to export: the report is empty")]
    EmptyReport,

    #[error("failed to build docx: {0}")]
    Write(String),

    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Render a report to .docx bytes: centered title, the report body, and a
/// dated closing line.
pub fn render_report(content: &str, title: &str, date: NaiveDate) -> Result<Vec<u8>, ExportError> {
    if content.trim().is_empty() {
        return Err(ExportError::EmptyReport);
    }
    let mut builder = DocxBuilder::new();
    builder.title(title);
    for block in parse_report(content) {
        builder.block(&block);
    }
    builder.footer(&format!("Generated on {}", date.format("%Y-%m-%d")));
    builder.finish()
}

/// Write a report into `dir` as `{file_stem}.docx`, never overwriting an
/// existing file. Returns the path written.
pub fn export_report(
    content: &str,
    title: &str,
    dir: &Path,
    file_stem: &str,
    date: NaiveDate,
) -> Result<PathBuf, ExportError> {
    let bytes = render_report(content, title, date)?;
    std::fs::create_dir_all(dir).map_err(|source| ExportError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    let path = free_path(dir, &sanitize_file_stem(file_stem));
    std::fs::write(&path, bytes).map_err(|source| ExportError::Io {
        path: path.clone(),
        source,
    })?;
    info!("Exported report to {}", path.display());
    Ok(path)
}

/// Replace characters that are not allowed in file names.
pub fn sanitize_file_stem(stem: &str) -> String {
    let cleaned: String = stem
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    if cleaned.is_empty() {
        DEFAULT_REPORT_TITLE.to_string()
    } else {
        cleaned
    }
}

fn free_path(dir: &Path, stem: &str) -> PathBuf {
    let first = dir.join(format!("{}.docx", stem));
    if !first.exists() {
        return first;
    }
    (1..)
        .map(|n| dir.join(format!("{} ({}).docx", stem, n)))
        .find(|p| !p.exists())
        .unwrap_or(first)
}
