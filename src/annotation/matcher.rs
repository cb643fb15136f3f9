//! Proposing further token ranges for an entity's literal text.

use std::collections::HashSet;

use super::{Annotated, TokenOffsetIndex, TokenRange};

/// Inclusive character range of one literal occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CharMatch {
    pub start: usize,
    pub end: usize,
}

/// Find every non-overlapping, case-sensitive occurrence of `needle`,
/// scanning left to right. Offsets are in characters.
pub fn find_occurrences(haystack: &str, needle: &str) -> Vec<CharMatch> {
    if needle.is_empty() {
        return Vec::new();
    }
    let needle_chars = needle.chars().count();
    let mut matches = Vec::new();
    let mut byte_cursor = 0;
    let mut char_cursor = 0;
    for (byte_start, _) in haystack.match_indices(needle) {
        char_cursor += haystack[byte_cursor..byte_start].chars().count();
        byte_cursor = byte_start;
        matches.push(CharMatch {
            start: char_cursor,
            end: char_cursor + needle_chars - 1,
        });
    }
    matches
}

/// How a text match turned out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchOutcome {
    /// The text does not occur in the document.
    NoOccurrences,
    /// Every occurrence is already annotated.
    AllExisting,
    /// This many new ranges are proposed.
    New(usize),
}

/// Result of matching an entity's text against a document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchProposal {
    /// Literal occurrences found in the text.
    pub occurrences: usize,
    /// Occurrences that mapped onto token ranges, in document order.
    pub mapped: Vec<TokenRange>,
    /// Mapped ranges not yet annotated, deduplicated.
    pub proposed: Vec<TokenRange>,
}

impl MatchProposal {
    pub fn outcome(&self) -> MatchOutcome {
        if self.occurrences == 0 {
            MatchOutcome::NoOccurrences
        } else if self.proposed.is_empty() {
            MatchOutcome::AllExisting
        } else {
            MatchOutcome::New(self.proposed.len())
        }
    }
}

/// Literal substring matcher over a document's token index.
///
/// Matching is not word-boundary aware: an occurrence may start or end in
/// the middle of a token, in which case the whole token is included.
#[derive(Debug, Clone, Copy)]
pub struct TextMatcher<'a> {
    index: &'a TokenOffsetIndex,
    full_text: &'a str,
}

impl<'a> TextMatcher<'a> {
    pub fn new(index: &'a TokenOffsetIndex, full_text: &'a str) -> Self {
        Self { index, full_text }
    }

    pub fn propose<A: Annotated>(&self, needle: &str, existing: &[A]) -> MatchProposal {
        let occurrences = find_occurrences(self.full_text, needle);
        let mapped: Vec<TokenRange> = occurrences
            .iter()
            .filter_map(|m| self.index.range_for_chars(m.start, m.end))
            .collect();

        let taken: HashSet<TokenRange> = existing.iter().map(|a| a.range()).collect();
        let mut seen = HashSet::new();
        let proposed = mapped
            .iter()
            .copied()
            .filter(|r| !taken.contains(r) && seen.insert(*r))
            .collect();

        MatchProposal {
            occurrences: occurrences.len(),
            mapped,
            proposed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PARIS: [&str; 16] = [
        "Paris", " ", "is", " ", "in", " ", "France", ".", " ", "Paris", " ", "has", " ", "a",
        " ", "tower.",
    ];

    fn paris() -> (TokenOffsetIndex, String) {
        (TokenOffsetIndex::from_texts(PARIS), PARIS.concat())
    }

    #[test]
    fn test_two_occurrences_two_proposals() {
        let (index, text) = paris();
        assert_eq!(text, "Paris is in France. Paris has a tower.");
        let proposal = TextMatcher::new(&index, &text).propose::<TokenRange>("Paris", &[]);
        assert_eq!(proposal.occurrences, 2);
        assert_eq!(
            proposal.proposed,
            vec![TokenRange::single(0), TokenRange::single(9)]
        );
        assert!(!proposal.proposed[0].overlaps(&proposal.proposed[1]));
        assert_eq!(proposal.outcome(), MatchOutcome::New(2));
    }

    #[test]
    fn test_existing_range_is_skipped() {
        let (index, text) = paris();
        let existing = [TokenRange::single(0)];
        let proposal = TextMatcher::new(&index, &text).propose("Paris", &existing);
        assert_eq!(proposal.proposed, vec![TokenRange::single(9)]);
        assert_eq!(proposal.outcome(), MatchOutcome::New(1));
    }

    #[test]
    fn test_all_existing_and_no_occurrence_outcomes() {
        let (index, text) = paris();
        let existing = [TokenRange::single(0), TokenRange::single(9)];
        let matcher = TextMatcher::new(&index, &text);
        assert_eq!(
            matcher.propose("Paris", &existing).outcome(),
            MatchOutcome::AllExisting
        );
        assert_eq!(
            matcher.propose::<TokenRange>("London", &[]).outcome(),
            MatchOutcome::NoOccurrences
        );
    }

    #[test]
    fn test_match_inside_token_and_across_boundaries() {
        let (index, text) = paris();
        let matcher = TextMatcher::new(&index, &text);
        let inside = matcher.propose::<TokenRange>("tow", &[]);
        assert_eq!(inside.proposed, vec![TokenRange::single(15)]);
        let across = matcher.propose::<TokenRange>("ce. Pa", &[]);
        assert_eq!(across.proposed, vec![TokenRange::new(6, 9)]);
    }

    #[test]
    fn test_matching_is_case_sensitive_and_non_overlapping() {
        assert!(find_occurrences("Paris", "paris").is_empty());
        let hits = find_occurrences("aaaa", "aa");
        assert_eq!(
            hits,
            vec![CharMatch { start: 0, end: 1 }, CharMatch { start: 2, end: 3 }]
        );
        assert!(find_occurrences("abc", "").is_empty());
    }

    #[test]
    fn test_character_offsets_with_multibyte_text() {
        let hits = find_occurrences("北京和北京", "北京");
        assert_eq!(
            hits,
            vec![CharMatch { start: 0, end: 1 }, CharMatch { start: 3, end: 4 }]
        );
    }

    #[test]
    fn test_unmappable_occurrences_are_dropped() {
        let index = TokenOffsetIndex::from_texts(["ab"]);
        let proposal = TextMatcher::new(&index, "abab").propose::<TokenRange>("ab", &[]);
        assert_eq!(proposal.occurrences, 2);
        assert_eq!(proposal.mapped, vec![TokenRange::single(0)]);
    }
}
