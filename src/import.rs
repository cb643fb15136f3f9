//! Text extraction from local files before document creation.
//!
//! Supports plain text (.txt), Word (.docx, paragraph text from
//! `word/document.xml`) and PDF (via the `pdftotext` tool from poppler-utils).

use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

/// Errors that can occur while importing a file.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("unsupported file type: {0} (expected .txt, .docx or .pdf)")]
    UnsupportedFileType(String),

    #[error("external tool not found: {0}")]
    ToolNotFound(String),

    #[error("extraction failed: {0}")]
    ExtractionFailed(String),

    #[error("{path} is not valid UTF-8 text")]
    Encoding { path: PathBuf },

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid docx archive: {0}")]
    Zip(#[from] zip::result::ZipError),
}

/// Text pulled out of a file, with a title taken from its name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedText {
    pub title: String,
    pub content: String,
}

/// Supported input formats, chosen by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Text,
    Docx,
    Pdf,
}

impl FileKind {
    pub fn from_path(path: &Path) -> Result<Self, ImportError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();
        match ext.as_str() {
            "txt" => Ok(Self::Text),
            "docx" => Ok(Self::Docx),
            "pdf" => Ok(Self::Pdf),
            _ => Err(ImportError::UnsupportedFileType(if ext.is_empty() {
                path.display().to_string()
            } else {
                format!(".{}", ext)
            })),
        }
    }
}

/// Extract the text of a file and derive a title from its stem.
pub async fn import_file(path: &Path) -> Result<ImportedText, ImportError> {
    let kind = FileKind::from_path(path)?;
    let content = match kind {
        FileKind::Text => {
            let bytes = read(path).await?;
            String::from_utf8(bytes).map_err(|_| ImportError::Encoding {
                path: path.to_path_buf(),
            })?
        }
        FileKind::Docx => docx_text(&read(path).await?)?,
        FileKind::Pdf => pdf_text(path).await?,
    };
    debug!(
        "Imported {} ({:?}, {} chars)",
        path.display(),
        kind,
        content.chars().count()
    );
    Ok(ImportedText {
        title: title_from_path(path),
        content,
    })
}

/// File name without its extension.
pub fn title_from_path(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().trim().to_string())
        .unwrap_or_default()
}

async fn read(path: &Path) -> Result<Vec<u8>, ImportError> {
    tokio::fs::read(path).await.map_err(|source| ImportError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn has_tag(node: roxmltree::Node<'_, '_>, name: &str) -> bool {
    node.is_element() && node.tag_name().name() == name
}

/// Paragraph text of a .docx archive, one paragraph per line.
pub fn docx_text(bytes: &[u8]) -> Result<String, ImportError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))?;
    let mut xml = String::new();
    archive
        .by_name("word/document.xml")?
        .read_to_string(&mut xml)
        .map_err(|e| ImportError::ExtractionFailed(format!("word/document.xml: {}", e)))?;

    let document = roxmltree::Document::parse(&xml)
        .map_err(|e| ImportError::ExtractionFailed(format!("word/document.xml: {}", e)))?;
    let paragraphs: Vec<String> = document
        .descendants()
        .filter(|node| has_tag(*node, "p"))
        .map(paragraph_text)
        .collect();
    Ok(paragraphs.join("\n"))
}

fn paragraph_text(paragraph: roxmltree::Node<'_, '_>) -> String {
    let mut text = String::new();
    for node in paragraph.descendants().filter(|n| n.is_element()) {
        if has_tag(node, "t") {
            text.push_str(node.text().unwrap_or_default());
        } else if has_tag(node, "tab") {
            text.push('\t');
        } else if has_tag(node, "br") || has_tag(node, "cr") {
            text.push('\n');
        }
    }
    text
}

async fn pdf_text(path: &Path) -> Result<String, ImportError> {
    which::which("pdftotext")
        .map_err(|_| ImportError::ToolNotFound("pdftotext (install poppler-utils)".to_string()))?;

    let output = Command::new("pdftotext")
        .args(["-layout", "-enc", "UTF-8"])
        .arg(path)
        .arg("-")
        .output()
        .await
        .map_err(|source| ImportError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    if !output.status.success() {
        return Err(ImportError::ExtractionFailed(format!(
            "pdftotext failed: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    /// A package whose document body is `body`.
    fn docx(body: &str) -> Vec<u8> {
        let document_xml = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{}</w:body></w:document>"#,
            body
        );
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file("word/document.xml", zip::write::SimpleFileOptions::default())
            .unwrap();
        writer.write_all(document_xml.as_bytes()).unwrap();
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn test_docx_paragraphs() {
        let bytes = docx(
            r#"
<w:p><w:r><w:t xml:space="preserve">Bank of </w:t></w:r><w:r><w:t xml:space="preserve">China &amp; Co</w:t></w:r></w:p>
<w:p/>
<w:p w:rsidR="1"><w:r><w:t>a</w:t><w:tab/><w:t>b</w:t></w:r></w:p>
"#,
        );
        assert_eq!(docx_text(&bytes).unwrap(), "Bank of China & Co\n\na\tb");
    }

    #[test]
    fn test_docx_character_references() {
        let bytes = docx("<w:p><w:r><w:t>Caf&#233; &#x4E2D; &lt;ok&gt;</w:t></w:r></w:p>");
        assert_eq!(docx_text(&bytes).unwrap(), "Café 中 <ok>");
    }

    #[test]
    fn test_docx_with_broken_xml() {
        let bytes = docx("<w:p><w:r><w:t>unclosed</w:r></w:p>");
        assert!(matches!(
            docx_text(&bytes),
            Err(ImportError::ExtractionFailed(_))
        ));
    }

    #[test]
    fn test_docx_without_document_part() {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file("other.xml", zip::write::SimpleFileOptions::default())
            .unwrap();
        let bytes = writer.finish().unwrap().into_inner();
        assert!(matches!(docx_text(&bytes), Err(ImportError::Zip(_))));
        assert!(matches!(docx_text(b"not a zip"), Err(ImportError::Zip(_))));
    }

    #[tokio::test]
    async fn test_import_text_and_docx_files() {
        let dir = tempfile::tempdir().unwrap();
        let txt = dir.path().join("Notes.TXT");
        std::fs::write(&txt, "Paris is in France.").unwrap();
        let imported = import_file(&txt).await.unwrap();
        assert_eq!(imported.title, "Notes");
        assert_eq!(imported.content, "Paris is in France.");

        let word = dir.path().join("report.docx");
        std::fs::write(&word, docx("<w:p><w:r><w:t>Hello</w:t></w:r></w:p>")).unwrap();
        assert_eq!(import_file(&word).await.unwrap().content, "Hello");
    }

    #[tokio::test]
    async fn test_rejections() {
        let dir = tempfile::tempdir().unwrap();
        let latin1 = dir.path().join("old.txt");
        std::fs::write(&latin1, [0x50, 0xe9, 0xff]).unwrap();
        assert!(matches!(
            import_file(&latin1).await,
            Err(ImportError::Encoding { .. })
        ));
        assert!(matches!(
            import_file(Path::new("slides.pptx")).await,
            Err(ImportError::UnsupportedFileType(ext)) if ext == ".pptx"
        ));
        assert!(matches!(
            import_file(&dir.path().join("missing.txt")).await,
            Err(ImportError::Io { .. })
        ));
    }
}
