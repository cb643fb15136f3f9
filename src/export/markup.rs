//! Line-oriented scanner for the lightweight markup AI reports are written in.

use std::sync::LazyLock;

use regex::Regex;

/// A run of text, bold or plain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub text: String,
    pub bold: bool,
}

impl Span {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            bold: false,
        }
    }

    pub fn bold(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            bold: true,
        }
    }
}

/// One line of a report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    /// `#`..`###` headings and enumerated section markers such as `一、`.
    Heading { level: u8, spans: Vec<Span> },
    Bullet(Vec<Span>),
    Numbered { number: u32, spans: Vec<Span> },
    Paragraph(Vec<Span>),
    Blank,
}

impl Block {
    pub fn spans(&self) -> &[Span] {
        match self {
            Self::Heading { spans, .. }
            | Self::Bullet(spans)
            | Self::Numbered { spans, .. }
            | Self::Paragraph(spans) => spans,
            Self::Blank => &[],
        }
    }

    /// Text without markup.
    pub fn text(&self) -> String {
        self.spans().iter().map(|s| s.text.as_str()).collect()
    }
}

static HEADING: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(#{1,3})\s+(.*)$").unwrap());
static SECTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[一二三四五六七八九十]+、").unwrap());
static BULLET: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[-*•]\s+(.*)$").unwrap());
static NUMBERED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,3})(?:[.)]\s+|、\s*)(.+)$").unwrap());
static BOLD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*\*(.+?)\*\*").unwrap());

/// Split a report into blocks, one per line.
pub fn parse_report(content: &str) -> Vec<Block> {
    content.lines().map(parse_line).collect()
}

fn parse_line(line: &str) -> Block {
    let line = line.trim();
    if line.is_empty() {
        return Block::Blank;
    }
    if let Some(c) = HEADING.captures(line) {
        return Block::Heading {
            level: c[1].len() as u8,
            spans: inline(&c[2]),
        };
    }
    if SECTION.is_match(line) {
        return Block::Heading {
            level: 2,
            spans: inline(line),
        };
    }
    // `**bold**` lines start with `*` too.
    if !line.starts_with("**") {
        if let Some(c) = BULLET.captures(line) {
            return Block::Bullet(inline(&c[1]));
        }
    }
    if let Some(c) = NUMBERED.captures(line) {
        if let Ok(number) = c[1].parse() {
            return Block::Numbered {
                number,
                spans: inline(&c[2]),
            };
        }
    }
    Block::Paragraph(inline(line))
}

/// Split `**bold**` spans out of a line.
pub fn inline(text: &str) -> Vec<Span> {
    let mut spans = Vec::new();
    let mut cursor = 0;
    for c in BOLD.captures_iter(text) {
        let (Some(whole), Some(inner)) = (c.get(0), c.get(1)) else {
            continue;
        };
        if whole.start() > cursor {
            spans.push(Span::plain(&text[cursor..whole.start()]));
        }
        spans.push(Span::bold(inner.as_str()));
        cursor = whole.end();
    }
    if cursor < text.len() {
        spans.push(Span::plain(&text[cursor..]));
    }
    spans
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_blocks() {
        let report = "# Grid report\n\n一、Overview\n## Risks\n- churn is **up**\n2. Call back\n**Key:** stay close\nplain text";
        let blocks = parse_report(report);
        assert_eq!(blocks.len(), 8);
        assert_eq!(
            blocks[0],
            Block::Heading {
                level: 1,
                spans: vec![Span::plain("Grid report")]
            }
        );
        assert_eq!(blocks[1], Block::Blank);
        assert!(matches!(blocks[2], Block::Heading { level: 2, .. }));
        assert_eq!(blocks[2].text(), "一、Overview");
        assert!(matches!(blocks[3], Block::Heading { level: 2, .. }));
        assert_eq!(
            blocks[4],
            Block::Bullet(vec![Span::plain("churn is "), Span::bold("up")])
        );
        assert_eq!(
            blocks[5],
            Block::Numbered {
                number: 2,
                spans: vec![Span::plain("Call back")]
            }
        );
        assert_eq!(
            blocks[6],
            Block::Paragraph(vec![Span::bold("Key:"), Span::plain(" stay close")])
        );
        assert_eq!(blocks[7], Block::Paragraph(vec![Span::plain("plain text")]));
    }

    #[test]
    fn test_unbalanced_markers_stay_literal() {
        assert_eq!(inline("a ** b"), vec![Span::plain("a ** b")]);
        assert_eq!(
            parse_line("3.5 percent growth"),
            Block::Paragraph(vec![Span::plain("3.5 percent growth")])
        );
        assert_eq!(parse_line("#hashtag"), Block::Paragraph(vec![Span::plain("#hashtag")]));
        assert_eq!(
            parse_line("#### deep"),
            Block::Paragraph(vec![Span::plain("#### deep")])
        );
    }
}
