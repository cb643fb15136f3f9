//! Deterministic, adjacent-distinct display colors for annotations.

use std::collections::HashMap;

use super::{Annotated, TokenRange};

/// Default palette: two shades of fifteen hues.
const DEFAULT_PALETTE: [&str; 30] = [
    "#dc2626", "#db2777", "#9333ea", "#7c3aed", "#4f46e5", "#2563eb", "#0284c7", "#0891b2",
    "#0d9488", "#059669", "#16a34a", "#65a30d", "#ca8a04", "#d97706", "#ea580c", "#991b1b",
    "#9d174d", "#6b21a8", "#5b21b6", "#3730a3", "#1e40af", "#075985", "#155e75", "#115e59",
    "#065f46", "#166534", "#3f6212", "#854d0e", "#92400e", "#9a3412",
];

/// Fixed pool of display colors, as `#rrggbb` strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    colors: Vec<String>,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            colors: DEFAULT_PALETTE.iter().map(|c| c.to_string()).collect(),
        }
    }
}

impl Palette {
    /// Custom palette; `None` when no colors are given.
    pub fn new(colors: Vec<String>) -> Option<Self> {
        if colors.is_empty() {
            None
        } else {
            Some(Self { colors })
        }
    }

    pub fn size(&self) -> usize {
        self.colors.len()
    }

    pub fn color(&self, index: usize) -> &str {
        &self.colors[index % self.colors.len()]
    }

    /// Nearest xterm-256 color for terminal rendering.
    pub fn ansi256(&self, index: usize) -> u8 {
        hex_to_ansi256(self.color(index)).unwrap_or(7)
    }
}

fn hex_to_ansi256(hex: &str) -> Option<u8> {
    let hex = hex.strip_prefix('#').unwrap_or(hex);
    if hex.len() != 6 {
        return None;
    }
    let channel = |i: usize| -> Option<u8> {
        let v = u8::from_str_radix(hex.get(i..i + 2)?, 16).ok()?;
        Some(((v as u16 * 5 + 127) / 255) as u8)
    };
    let (r, g, b) = (channel(0)?, channel(2)?, channel(4)?);
    Some(16 + 36 * r + 6 * g + b)
}

/// Palette index per annotation, recomputed whenever the annotation set changes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColorAssignment {
    by_key: HashMap<String, usize>,
    order: Vec<(String, TokenRange)>,
}

impl ColorAssignment {
    /// Assigned index for an annotation that took part in the assignment.
    pub fn get<A: Annotated + ?Sized>(&self, annotation: &A) -> Option<usize> {
        self.by_key.get(&annotation.identity_key()).copied()
    }

    /// Identity keys with their ranges in sorted reading order.
    pub fn order(&self) -> &[(String, TokenRange)] {
        &self.order
    }

    /// Indices in sorted reading order.
    pub fn indices(&self) -> Vec<usize> {
        self.order.iter().map(|(k, _)| self.by_key[k]).collect()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Assigns palette indices so that neighbours in reading order differ.
#[derive(Debug, Clone)]
pub struct ColorAssigner<'a> {
    palette_size: usize,
    labels: &'a [i64],
}

impl<'a> ColorAssigner<'a> {
    /// `labels` are the known label ids in display order.
    pub fn new(palette_size: usize, labels: &'a [i64]) -> Self {
        Self {
            palette_size: palette_size.max(1),
            labels,
        }
    }

    /// Color a label would get on its own.
    ///
    /// Known labels use their position; unknown ones fall back to the id.
    pub fn base_index(&self, label_id: Option<i64>) -> usize {
        let Some(id) = label_id else {
            return 0;
        };
        match self.labels.iter().position(|l| *l == id) {
            Some(pos) => pos % self.palette_size,
            None => (id.unsigned_abs() % self.palette_size as u64) as usize,
        }
    }

    pub fn assign<A: Annotated>(&self, annotations: &[A]) -> ColorAssignment {
        let mut sorted: Vec<(String, TokenRange, Option<i64>)> = annotations
            .iter()
            .map(|a| (a.identity_key(), a.range(), a.label_id()))
            .collect();
        sorted.sort_by(|(ka, ra, _), (kb, rb, _)| {
            ra.start
                .cmp(&rb.start)
                .then(ra.end.cmp(&rb.end))
                .then_with(|| ka.cmp(kb))
        });

        let mut assignment = ColorAssignment::default();
        let mut previous: Option<usize> = None;
        for (key, range, label) in sorted {
            let mut index = self.base_index(label);
            if previous == Some(index) && self.palette_size > 1 {
                index = (index + 1) % self.palette_size;
            }
            assignment.by_key.insert(key.clone(), index);
            assignment.order.push((key, range));
            previous = Some(index);
        }
        assignment
    }
}

/// A run of consecutive tokens rendered with one style.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaintedRun {
    pub text: String,
    /// Palette index, `None` for plain text.
    pub color: Option<usize>,
    /// Identity key of the annotation covering the run.
    pub annotation: Option<String>,
}

/// Split token texts into runs colored by the first annotation, in reading
/// order, that covers each token.
pub fn paint_tokens<'t, I>(tokens: I, assignment: &ColorAssignment) -> Vec<PaintedRun>
where
    I: IntoIterator<Item = &'t str>,
{
    let mut runs: Vec<PaintedRun> = Vec::new();
    for (idx, text) in tokens.into_iter().enumerate() {
        let owner = assignment
            .order
            .iter()
            .find(|(_, range)| range.contains(idx))
            .map(|(key, _)| key.clone());
        let color = owner.as_ref().and_then(|k| assignment.by_key.get(k).copied());

        match runs.last_mut() {
            Some(last) if last.annotation == owner => last.text.push_str(text),
            _ => runs.push(PaintedRun {
                text: text.to_string(),
                color,
                annotation: owner,
            }),
        }
    }
    runs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EntityItem;

    fn entity(id: i64, label_id: i64, start: usize, end: usize) -> EntityItem {
        EntityItem {
            id,
            document_id: 1,
            label_id,
            text: String::new(),
            token_start: start,
            token_end: end,
            created_at: None,
        }
    }

    fn assert_adjacent_distinct(assignment: &ColorAssignment) {
        for pair in assignment.indices().windows(2) {
            assert_ne!(pair[0], pair[1]);
        }
    }

    #[test]
    fn test_same_label_neighbours_alternate() {
        let labels = [10];
        let entities: Vec<EntityItem> = (0..5).map(|i| entity(i, 10, i as usize, i as usize)).collect();
        let assignment = ColorAssigner::new(30, &labels).assign(&entities);
        assert_eq!(assignment.indices(), vec![0, 1, 0, 1, 0]);
    }

    #[test]
    fn test_sort_order_is_start_then_end_then_identity() {
        let labels = [1, 2, 3];
        let entities = vec![entity(3, 3, 4, 4), entity(2, 2, 0, 2), entity(1, 1, 0, 0)];
        let assignment = ColorAssigner::new(30, &labels).assign(&entities);
        let keys: Vec<&str> = assignment.order().iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["1", "2", "3"]);
        assert_eq!(assignment.get(&entities[0]), Some(2));
    }

    #[test]
    fn test_unknown_label_falls_back_to_id() {
        let assigner = ColorAssigner::new(30, &[]);
        assert_eq!(assigner.base_index(Some(47)), 17);
        assert_eq!(assigner.base_index(Some(-3)), 3);
        assert_eq!(assigner.base_index(None), 0);
    }

    #[test]
    fn test_adjacent_distinct_for_small_palettes() {
        let labels = [1, 2, 3, 4];
        let entities: Vec<EntityItem> = (0..40)
            .map(|i| entity(i, (i * 7 % 5) as i64, (i / 2) as usize, (i / 2 + i % 3) as usize))
            .collect();
        for size in 2..6 {
            let assignment = ColorAssigner::new(size, &labels).assign(&entities);
            assert_eq!(assignment.len(), entities.len());
            assert_adjacent_distinct(&assignment);
            assert!(assignment.indices().iter().all(|i| *i < size));
        }
    }

    #[test]
    fn test_single_color_palette_never_bumps() {
        let entities = vec![entity(1, 1, 0, 0), entity(2, 1, 1, 1)];
        let assignment = ColorAssigner::new(1, &[1]).assign(&entities);
        assert_eq!(assignment.indices(), vec![0, 0]);
    }

    #[test]
    fn test_stable_across_input_order() {
        let labels = [1, 2];
        let a = vec![entity(1, 1, 0, 0), entity(2, 2, 1, 3), entity(3, 1, 5, 5)];
        let mut b = a.clone();
        b.reverse();
        let assigner = ColorAssigner::new(30, &labels);
        assert_eq!(assigner.assign(&a), assigner.assign(&b));
    }

    #[test]
    fn test_empty_and_single_sets() {
        let assigner = ColorAssigner::new(30, &[1]);
        assert!(assigner.assign::<EntityItem>(&[]).is_empty());
        assert_eq!(assigner.assign(&[entity(1, 1, 0, 0)]).indices(), vec![0]);
    }

    #[test]
    fn test_paint_tokens_merges_runs() {
        let texts = ["Bank", " of ", "China", " is ", "big", "."];
        let entities = vec![entity(1, 1, 0, 2), entity(2, 2, 4, 4)];
        let assignment = ColorAssigner::new(30, &[1, 2]).assign(&entities);
        let runs = paint_tokens(texts, &assignment);
        let shape: Vec<(&str, Option<usize>)> =
            runs.iter().map(|r| (r.text.as_str(), r.color)).collect();
        assert_eq!(
            shape,
            vec![
                ("Bank of China", Some(0)),
                (" is ", None),
                ("big", Some(1)),
                (".", None)
            ]
        );
    }

    #[test]
    fn test_ansi_conversion() {
        let palette = Palette::default();
        assert_eq!(palette.size(), 30);
        assert_eq!(hex_to_ansi256("#ff0000"), Some(196));
        assert_eq!(hex_to_ansi256("#000000"), Some(16));
        assert_eq!(hex_to_ansi256("nope"), None);
        assert!(Palette::new(Vec::new()).is_none());
    }
}
