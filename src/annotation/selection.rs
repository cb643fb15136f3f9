//! Resolving text selections to token ranges.

use super::{TokenOffsetIndex, TokenRange};

/// A text selection inside the rendered document container.
///
/// `start` is the number of characters of container text preceding the
/// selection; `text` is the selected text exactly as rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub start: usize,
    pub text: String,
}

impl Selection {
    pub fn new(start: usize, text: impl Into<String>) -> Self {
        Self {
            start,
            text: text.into(),
        }
    }

    /// Select the characters `from..to` (exclusive end) of the container text.
    ///
    /// Out-of-bounds boundaries are clamped to the container, so a collapsed or
    /// fully outside selection yields empty text.
    pub fn within(container: &str, from: usize, to: usize) -> Self {
        let total = container.chars().count();
        let from = from.min(total);
        let to = to.clamp(from, total);
        let text = container.chars().skip(from).take(to - from).collect();
        Self { start: from, text }
    }

    /// Select the `nth` (0-based) literal occurrence of `needle` in the container.
    pub fn nth_occurrence(container: &str, needle: &str, nth: usize) -> Option<Self> {
        if needle.is_empty() {
            return None;
        }
        let (byte_start, matched) = container.match_indices(needle).nth(nth)?;
        let start = container[..byte_start].chars().count();
        Some(Self::new(start, matched))
    }

    pub fn is_collapsed(&self) -> bool {
        self.text.is_empty()
    }

    /// Inclusive offset of the last selected character.
    pub fn last(&self) -> Option<usize> {
        self.text
            .chars()
            .count()
            .checked_sub(1)
            .map(|n| self.start + n)
    }
}

/// A selection that maps cleanly onto tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSelection {
    pub range: TokenRange,
    /// Selected text with surrounding whitespace removed.
    pub text: String,
}

/// Maps selections onto a token offset index.
#[derive(Debug, Clone, Copy)]
pub struct SelectionResolver<'a> {
    index: &'a TokenOffsetIndex,
}

impl<'a> SelectionResolver<'a> {
    pub fn new(index: &'a TokenOffsetIndex) -> Self {
        Self { index }
    }

    /// Resolve a selection, or `None` when it is empty, whitespace-only or
    /// falls outside the tokens.
    ///
    /// The range runs from the token holding the first selected character to
    /// the token holding the last one.
    pub fn resolve(&self, selection: &Selection) -> Option<ResolvedSelection> {
        let trimmed = selection.text.trim();
        if trimmed.is_empty() {
            return None;
        }
        let last = selection.last()?;
        let range = self.index.range_for_chars(selection.start, last)?;
        Some(ResolvedSelection {
            range,
            text: trimmed.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEXT: &str = "Bank of China is big.";

    fn index() -> TokenOffsetIndex {
        TokenOffsetIndex::from_texts(["Bank", " of ", "China", " is ", "big", "."])
    }

    #[test]
    fn test_single_token_selection() {
        let index = index();
        let resolver = SelectionResolver::new(&index);
        let sel = Selection::within(TEXT, 8, 13);
        assert_eq!(sel.text, "China");
        let resolved = resolver.resolve(&sel).unwrap();
        assert_eq!(resolved.range, TokenRange::single(2));
        assert_eq!(resolved.text, "China");
    }

    #[test]
    fn test_multi_token_selection() {
        let index = index();
        let resolver = SelectionResolver::new(&index);
        let resolved = resolver.resolve(&Selection::within(TEXT, 0, 13)).unwrap();
        assert_eq!(resolved.range, TokenRange::new(0, 2));
        assert_eq!(resolved.text, "Bank of China");
    }

    #[test]
    fn test_partial_token_selection_expands_to_tokens() {
        let index = index();
        let resolver = SelectionResolver::new(&index);
        let resolved = resolver.resolve(&Selection::within(TEXT, 2, 11)).unwrap();
        assert_eq!(resolved.range, TokenRange::new(0, 2));
    }

    #[test]
    fn test_collapsed_selection_is_rejected() {
        let index = index();
        let resolver = SelectionResolver::new(&index);
        let sel = Selection::within(TEXT, 5, 5);
        assert!(sel.is_collapsed());
        assert_eq!(resolver.resolve(&sel), None);
    }

    #[test]
    fn test_whitespace_selection_is_rejected() {
        let index = index();
        let resolver = SelectionResolver::new(&index);
        assert_eq!(resolver.resolve(&Selection::within(TEXT, 4, 5)), None);
    }

    #[test]
    fn test_selection_outside_tokens_is_rejected() {
        let index = index();
        let resolver = SelectionResolver::new(&index);
        assert_eq!(resolver.resolve(&Selection::new(20, "x y")), None);
    }

    #[test]
    fn test_every_inside_selection_is_ordered_and_in_bounds() {
        let index = index();
        let resolver = SelectionResolver::new(&index);
        let total = TEXT.chars().count();
        for from in 0..total {
            for to in from + 1..=total {
                let sel = Selection::within(TEXT, from, to);
                if let Some(r) = resolver.resolve(&sel) {
                    assert!(r.range.start <= r.range.end);
                    assert!(r.range.end < index.len());
                }
            }
        }
    }

    #[test]
    fn test_nth_occurrence() {
        let text = "Paris is in France. Paris has a tower.";
        let second = Selection::nth_occurrence(text, "Paris", 1).unwrap();
        assert_eq!(second.start, 20);
        assert!(Selection::nth_occurrence(text, "Paris", 2).is_none());
        assert!(Selection::nth_occurrence(text, "", 0).is_none());
    }
}
