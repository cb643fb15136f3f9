//! Annotation core shared by every view.
//!
//! Everything here is pure and synchronous: building the character index over
//! a token sequence, resolving text selections to token ranges, guarding
//! against duplicate ranges, assigning display colors and proposing further
//! occurrences of an entity's text.

mod colors;
mod guard;
mod matcher;
mod offsets;
mod selection;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use colors::{paint_tokens, ColorAssigner, ColorAssignment, Palette, PaintedRun};
pub use guard::{check_label_name, check_range, check_relation, ValidationError};
pub use matcher::{find_occurrences, CharMatch, MatchOutcome, MatchProposal, TextMatcher};
pub use offsets::{full_text, CharSpan, TokenOffsetIndex};
pub use selection::{ResolvedSelection, Selection, SelectionResolver};

/// Inclusive range of token indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TokenRange {
    pub start: usize,
    pub end: usize,
}

impl TokenRange {
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end, "token range start after end");
        Self { start, end }
    }

    /// `None` when `start` comes after `end`.
    pub fn try_new(start: usize, end: usize) -> Option<Self> {
        (start <= end).then_some(Self { start, end })
    }

    /// Range covering both indices in whichever order they come.
    pub fn spanning(a: usize, b: usize) -> Self {
        Self {
            start: a.min(b),
            end: a.max(b),
        }
    }

    pub fn single(index: usize) -> Self {
        Self::new(index, index)
    }

    pub fn contains(&self, token: usize) -> bool {
        token >= self.start && token <= self.end
    }

    /// True when the two ranges share at least one token.
    pub fn overlaps(&self, other: &TokenRange) -> bool {
        self.start <= other.end && other.start <= self.end
    }
}

impl fmt::Display for TokenRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{},{}]", self.start, self.end)
    }
}

/// Anything that occupies a token range of a document under a label.
pub trait Annotated {
    fn range(&self) -> TokenRange;

    fn label_id(&self) -> Option<i64>;

    /// Backend identity, if the annotation has been persisted.
    fn annotation_id(&self) -> Option<i64>;

    /// Stable key: the id when present, otherwise label and range.
    fn identity_key(&self) -> String {
        match self.annotation_id() {
            Some(id) => id.to_string(),
            None => {
                let r = self.range();
                let label = self.label_id().map(|l| l.to_string()).unwrap_or_default();
                format!("{}-{}-{}", label, r.start, r.end)
            }
        }
    }
}

impl Annotated for TokenRange {
    fn range(&self) -> TokenRange {
        *self
    }

    fn label_id(&self) -> Option<i64> {
        None
    }

    fn annotation_id(&self) -> Option<i64> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_overlap() {
        let outer = TokenRange::new(0, 2);
        let inner = TokenRange::single(2);
        let after = TokenRange::new(3, 4);
        assert!(outer.overlaps(&inner));
        assert!(!outer.overlaps(&after));
        assert_eq!(outer.to_string(), "[0,2]");
    }

    #[test]
    fn test_reversed_bounds() {
        assert_eq!(TokenRange::try_new(4, 2), None);
        assert_eq!(TokenRange::try_new(2, 2), Some(TokenRange::single(2)));
        assert_eq!(TokenRange::spanning(4, 2), TokenRange::new(2, 4));
    }

    #[test]
    fn test_identity_key_without_id() {
        assert_eq!(TokenRange::new(4, 6).identity_key(), "-4-6");
    }
}
