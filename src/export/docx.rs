//! Word document assembly on top of `docx-rs`.

use std::io::Cursor;

use docx_rs::{AlignmentType, Docx, LineSpacing, Paragraph, Run};

use super::markup::{Block, Span};
use super::ExportError;

/// Font sizes in half-points.
const TITLE_SIZE: usize = 36;
const HEADING_SIZE: usize = 28;
const BODY_SIZE: usize = 24;

/// Run styling shared by every span of one paragraph.
#[derive(Debug, Clone, Copy)]
struct Style {
    size: usize,
    bold: bool,
    italic: bool,
}

impl Style {
    const BODY: Self = Self {
        size: BODY_SIZE,
        bold: false,
        italic: false,
    };
}

/// Accumulates paragraphs and packs them into a .docx archive.
#[derive(Debug, Default)]
pub struct DocxBuilder {
    paragraphs: Vec<Paragraph>,
}

impl DocxBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Centered, bold title line.
    pub fn title(&mut self, text: &str) -> &mut Self {
        let style = Style {
            size: TITLE_SIZE,
            bold: true,
            italic: false,
        };
        self.paragraph(AlignmentType::Center, &[Span::plain(text)], style, 400)
    }

    pub fn block(&mut self, block: &Block) -> &mut Self {
        match block {
            Block::Blank => self.paragraph(AlignmentType::Left, &[], Style::BODY, 0),
            Block::Heading { spans, .. } => {
                let style = Style {
                    size: HEADING_SIZE,
                    bold: true,
                    italic: false,
                };
                self.paragraph(AlignmentType::Left, spans, style, 120)
            }
            Block::Bullet(spans) => {
                let mut with_marker = vec![Span::plain("• ")];
                with_marker.extend(spans.iter().cloned());
                self.paragraph(AlignmentType::Left, &with_marker, Style::BODY, 120)
            }
            Block::Numbered { number, spans } => {
                let mut with_marker = vec![Span::plain(format!("{}. ", number))];
                with_marker.extend(spans.iter().cloned());
                self.paragraph(AlignmentType::Left, &with_marker, Style::BODY, 120)
            }
            Block::Paragraph(spans) => {
                self.paragraph(AlignmentType::Both, spans, Style::BODY, 120)
            }
        }
    }

    /// Right-aligned italic closing line.
    pub fn footer(&mut self, text: &str) -> &mut Self {
        let style = Style {
            italic: true,
            ..Style::BODY
        };
        self.paragraph(AlignmentType::Right, &[Span::plain(text)], style, 0)
    }

    fn paragraph(
        &mut self,
        align: AlignmentType,
        spans: &[Span],
        style: Style,
        after: u32,
    ) -> &mut Self {
        let paragraph = spans.iter().fold(
            Paragraph::new()
                .align(align)
                .line_spacing(LineSpacing::new().before(0).after(after)),
            |paragraph, span| {
                let mut run = Run::new().add_text(span.text.as_str()).size(style.size);
                if style.bold || span.bold {
                    run = run.bold();
                }
                if style.italic {
                    run = run.italic();
                }
                paragraph.add_run(run)
            },
        );
        self.paragraphs.push(paragraph);
        self
    }

    /// Pack into .docx bytes.
    pub fn finish(&self) -> Result<Vec<u8>, ExportError> {
        let docx = self
            .paragraphs
            .iter()
            .cloned()
            .fold(Docx::new(), Docx::add_paragraph);
        let mut out = Cursor::new(Vec::new());
        docx.build()
            .pack(&mut out)
            .map_err(|e| ExportError::Write(e.to_string()))?;
        Ok(out.into_inner())
    }
}
