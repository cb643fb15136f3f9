//! Character-offset index over a token sequence.

use crate::models::DocumentToken;

use super::TokenRange;

/// Character span covered by one token.
///
/// Offsets count Unicode scalar values. A token with empty text has a
/// zero-width span that never contains any offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CharSpan {
    pub start: usize,
    pub len: usize,
}

impl CharSpan {
    /// Inclusive last offset, `None` for a zero-width span.
    pub fn end(&self) -> Option<usize> {
        self.len.checked_sub(1).map(|l| self.start + l)
    }

    pub fn contains(&self, offset: usize) -> bool {
        offset >= self.start && offset < self.start + self.len
    }

    /// Offset where the next span starts.
    pub fn next_start(&self) -> usize {
        self.start + self.len
    }
}

/// Ordered character spans parallel to a document's token sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenOffsetIndex {
    spans: Vec<CharSpan>,
}

impl TokenOffsetIndex {
    /// Build the index from backend tokens, in sequence order.
    pub fn build(tokens: &[DocumentToken]) -> Self {
        Self::from_texts(tokens.iter().map(|t| t.token_text.as_str()))
    }

    /// Build the index from raw token texts.
    pub fn from_texts<'a, I>(texts: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut cursor = 0;
        let spans = texts
            .into_iter()
            .map(|text| {
                let len = text.chars().count();
                let span = CharSpan { start: cursor, len };
                cursor += len;
                span
            })
            .collect();
        Self { spans }
    }

    pub fn spans(&self) -> &[CharSpan] {
        &self.spans
    }

    pub fn span(&self, token: usize) -> Option<CharSpan> {
        self.spans.get(token).copied()
    }

    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    /// Total characters covered by all tokens.
    pub fn char_len(&self) -> usize {
        self.spans.last().map(CharSpan::next_start).unwrap_or(0)
    }

    /// Index of the first token whose span contains `offset`.
    pub fn token_at(&self, offset: usize) -> Option<usize> {
        self.spans.iter().position(|s| s.contains(offset))
    }

    /// Token range covering the inclusive character range `first..=last`.
    pub fn range_for_chars(&self, first: usize, last: usize) -> Option<TokenRange> {
        if last < first {
            return None;
        }
        let start = self.token_at(first)?;
        let end = self.token_at(last)?;
        Some(TokenRange::new(start, end))
    }

    /// Inclusive character range covered by a token range.
    pub fn chars_for_range(&self, range: TokenRange) -> Option<(usize, usize)> {
        let first = self.span(range.start)?;
        let last = self.span(range.end)?;
        let end = last.next_start().checked_sub(1)?;
        if end < first.start {
            return None;
        }
        Some((first.start, end))
    }
}

/// Concatenated document text as the tokens render it.
pub fn full_text(tokens: &[DocumentToken]) -> String {
    tokens.iter().map(|t| t.token_text.as_str()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bank_of_china() -> TokenOffsetIndex {
        TokenOffsetIndex::from_texts(["Bank", " of ", "China", " is ", "big", "."])
    }

    #[test]
    fn test_spans_match_reference_layout() {
        let index = bank_of_china();
        let inclusive: Vec<(usize, Option<usize>)> =
            index.spans().iter().map(|s| (s.start, s.end())).collect();
        assert_eq!(
            inclusive,
            vec![
                (0, Some(3)),
                (4, Some(7)),
                (8, Some(12)),
                (13, Some(16)),
                (17, Some(19)),
                (20, Some(20)),
            ]
        );
        assert_eq!(index.char_len(), 21);
    }

    #[test]
    fn test_spans_are_contiguous() {
        let index = TokenOffsetIndex::from_texts(["ab", "", "c", "def", "", "", "g"]);
        for pair in index.spans().windows(2) {
            assert_eq!(pair[1].start, pair[0].next_start());
        }
        for pair in bank_of_china().spans().windows(2) {
            assert_eq!(pair[1].start, pair[0].end().unwrap() + 1);
        }
    }

    #[test]
    fn test_empty_token_never_matches() {
        let index = TokenOffsetIndex::from_texts(["ab", "", "c"]);
        assert_eq!(index.span(1).unwrap().end(), None);
        assert_eq!(index.token_at(2), Some(2));
        assert_eq!(index.token_at(1), Some(0));
        assert_eq!(index.token_at(3), None);
    }

    #[test]
    fn test_offsets_count_characters_not_bytes() {
        let index = TokenOffsetIndex::from_texts(["北京", "是", "首都"]);
        assert_eq!(index.token_at(2), Some(1));
        assert_eq!(index.range_for_chars(0, 4), Some(TokenRange::new(0, 2)));
    }

    #[test]
    fn test_range_for_chars() {
        let index = bank_of_china();
        assert_eq!(index.range_for_chars(8, 12), Some(TokenRange::single(2)));
        assert_eq!(index.range_for_chars(0, 12), Some(TokenRange::new(0, 2)));
        // Spans are contiguous, so chars 9..=13 run into the " is " token.
        assert_eq!(index.range_for_chars(9, 13), Some(TokenRange::new(2, 3)));
        assert_eq!(index.range_for_chars(20, 40), None);
        assert_eq!(index.range_for_chars(5, 4), None);
    }

    #[test]
    fn test_chars_for_range() {
        let index = bank_of_china();
        assert_eq!(index.chars_for_range(TokenRange::new(0, 2)), Some((0, 12)));
        assert_eq!(index.chars_for_range(TokenRange::new(5, 9)), None);
    }

    #[test]
    fn test_full_text() {
        let tokens = DocumentToken::sequence(["Bank", " of ", "China"]);
        assert_eq!(full_text(&tokens), "Bank of China");
    }
}
