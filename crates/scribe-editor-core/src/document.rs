//! The rich-text document model.
//!
//! A `RichDocument` is a span list over a rope:
//! - the text holds every character, with `'\n'` between blocks
//! - `blocks` holds one `BlockKind` per block, in order
//! - `marks` holds inline formatting as character ranges
//!
//! Invariants kept by every operation:
//! - `blocks.len()` equals the number of lines in the text (at least one)
//! - mark spans are non-empty, never cover a block separator, are sorted by
//!   start, and spans of the same mark never overlap or touch
//! - link spans never overlap each other

use std::ops::{Range, RangeInclusive};

use smol_str::SmolStr;

use crate::text::{EditorRope, TextBuffer};
use crate::types::{BLOCK_SEPARATOR, BlockKind, Mark, MarkKind, MarkSpan};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RichDocument {
    text: EditorRope,
    blocks: Vec<BlockKind>,
    marks: Vec<MarkSpan>,
}

impl Default for RichDocument {
    fn default() -> Self {
        Self {
            text: EditorRope::new(),
            blocks: vec![BlockKind::Paragraph],
            marks: Vec::new(),
        }
    }
}

impl RichDocument {
    /// An empty document: a single empty paragraph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse an HTML fragment. Never fails; unknown markup is unwrapped.
    pub fn from_html(html: &str) -> Self {
        crate::html::parse(html)
    }

    /// Serialize to a canonical, well-formed HTML fragment.
    pub fn to_html(&self) -> String {
        crate::html::serialize(self)
    }

    /// Build a document from raw parts, repairing anything that breaks the
    /// model invariants (block count, marks crossing separators, overlapping
    /// links).
    pub fn from_parts(text: &str, blocks: Vec<BlockKind>, marks: Vec<MarkSpan>) -> Self {
        let mut doc = Self {
            text: EditorRope::from_str(text),
            blocks,
            marks: Vec::new(),
        };
        let lines = doc.text.len_lines();
        if doc.blocks.len() != lines {
            tracing::trace!(
                blocks = doc.blocks.len(),
                lines,
                "block list does not match text, padding with paragraphs"
            );
            doc.blocks.resize(lines, BlockKind::Paragraph);
        }

        let len = doc.len_chars();
        let mut links: Vec<MarkSpan> = Vec::new();
        let mut others: Vec<MarkSpan> = Vec::new();
        for span in marks {
            let range = span.start.min(len)..span.end.min(len);
            for segment in doc.block_segments(range) {
                if segment.is_empty() {
                    continue;
                }
                let piece = MarkSpan::new(segment.start, segment.end, span.mark.clone());
                if piece.mark.kind() == MarkKind::Link {
                    // Later links win where they overlap earlier ones.
                    links = subtract(links, &piece.range());
                    links.push(piece);
                } else {
                    others.push(piece);
                }
            }
        }
        others.extend(links);
        doc.marks = others;
        doc.normalize_marks();
        doc
    }

    // === Accessors ===

    /// The full model text, with `'\n'` between blocks.
    pub fn text(&self) -> String {
        self.text.to_string()
    }

    pub fn len_chars(&self) -> usize {
        self.text.len_chars()
    }

    /// True for a single empty paragraph, the document that serializes to
    /// the empty string.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty() && self.blocks == [BlockKind::Paragraph]
    }

    pub fn slice(&self, range: Range<usize>) -> Option<SmolStr> {
        self.text.slice(range)
    }

    pub fn char_at(&self, offset: usize) -> Option<char> {
        self.text.char_at(offset)
    }

    pub fn blocks(&self) -> &[BlockKind] {
        &self.blocks
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    pub fn block_kind(&self, index: usize) -> Option<BlockKind> {
        self.blocks.get(index).copied()
    }

    pub fn marks(&self) -> &[MarkSpan] {
        &self.marks
    }

    // === Block geometry ===

    /// Index of the block containing `offset`. An offset on a separator
    /// belongs to the block the separator ends.
    pub fn block_index_at(&self, offset: usize) -> usize {
        self.text.char_to_line(offset)
    }

    /// Character range of a block's content, excluding its separator.
    pub fn block_range(&self, index: usize) -> Range<usize> {
        let start = self.text.line_to_char(index);
        let end = if index + 1 < self.blocks.len() {
            self.text.line_to_char(index + 1) - 1
        } else {
            self.len_chars()
        };
        start..end
    }

    /// Indices of the blocks touched by `range`. A non-empty range that ends
    /// exactly at the start of a block does not touch that block.
    pub fn block_indices_in(&self, range: Range<usize>) -> RangeInclusive<usize> {
        let first = self.block_index_at(range.start);
        let mut last = self.block_index_at(range.end);
        if range.end > range.start && last > first && self.block_range(last).start == range.end {
            last -= 1;
        }
        first..=last
    }

    /// `range` clipped to each block it touches. Segments may be empty.
    pub fn block_segments(&self, range: Range<usize>) -> Vec<Range<usize>> {
        self.block_indices_in(range.clone())
            .map(|index| {
                let block = self.block_range(index);
                let start = block.start.max(range.start);
                let end = block.end.min(range.end).max(start);
                start..end
            })
            .collect()
    }

    // === Mark queries ===

    /// Whether the character at `offset` carries a mark of `kind`.
    pub fn mark_at(&self, offset: usize, kind: MarkKind) -> bool {
        self.span_at(offset, kind).is_some()
    }

    /// The span of `kind` covering the character at `offset`.
    pub fn span_at(&self, offset: usize, kind: MarkKind) -> Option<&MarkSpan> {
        self.marks
            .iter()
            .find(|span| span.mark.kind() == kind && span.covers(offset))
    }

    /// Whether every non-separator character in `range` carries a mark of
    /// `kind`. False when the range holds no such characters.
    pub fn has_mark(&self, range: Range<usize>, kind: MarkKind) -> bool {
        let segments: Vec<_> = self
            .block_segments(range)
            .into_iter()
            .filter(|segment| !segment.is_empty())
            .collect();
        if segments.is_empty() {
            return false;
        }
        segments.iter().all(|segment| {
            let mut pos = segment.start;
            for span in self.marks.iter().filter(|span| span.mark.kind() == kind) {
                if span.start <= pos && span.end > pos {
                    pos = span.end;
                }
                if pos >= segment.end {
                    break;
                }
            }
            pos >= segment.end
        })
    }

    /// Whether any character in `range` carries a mark of `kind`.
    pub fn intersects_mark(&self, range: Range<usize>, kind: MarkKind) -> bool {
        self.marks.iter().any(|span| {
            span.mark.kind() == kind && span.start < range.end && span.end > range.start
        })
    }

    // === Structural edits ===

    /// Insert text that contains no block separator at `offset`.
    ///
    /// Inclusive marks (bold, italic, underline) ending at `offset` grow to
    /// cover the new text, as do those starting at `offset` when it is a block
    /// start. Links only grow when the insert lands inside them.
    pub fn insert_text(&mut self, offset: usize, text: &str) {
        debug_assert!(!text.contains(BLOCK_SEPARATOR));
        let inserted = text.chars().count();
        if inserted == 0 {
            return;
        }
        let offset = offset.min(self.len_chars());
        let at_block_start = offset == 0 || self.char_at(offset - 1) == Some(BLOCK_SEPARATOR);
        self.text.insert(offset, text);

        for span in &mut self.marks {
            if at_block_start && span.start == offset && span.mark.is_inclusive() {
                span.end += inserted;
            } else if span.start >= offset {
                span.start += inserted;
                span.end += inserted;
            } else if span.end > offset || (span.end == offset && span.mark.is_inclusive()) {
                span.end += inserted;
            }
        }
        self.normalize_marks();
    }

    /// Delete a character range. Removing a separator merges the following
    /// block into the preceding one, which keeps its kind.
    pub fn delete(&mut self, range: Range<usize>) {
        let len = self.len_chars();
        let range = range.start.min(len)..range.end.min(len);
        if range.start >= range.end {
            return;
        }
        let first = self.block_index_at(range.start);
        let last = self.block_index_at(range.end);
        if last > first {
            self.blocks.drain(first + 1..=last);
        }
        self.text.delete(range.clone());

        let removed = range.end - range.start;
        let map = |offset: usize| {
            if offset <= range.start {
                offset
            } else if offset >= range.end {
                offset - removed
            } else {
                range.start
            }
        };
        for span in &mut self.marks {
            span.start = map(span.start);
            span.end = map(span.end);
        }
        self.normalize_marks();
    }

    /// Split the block containing `offset` in two. The new block, holding
    /// everything after `offset`, gets `new_kind`.
    pub fn split_block(&mut self, offset: usize, new_kind: BlockKind) {
        let offset = offset.min(self.len_chars());
        let index = self.block_index_at(offset);
        self.text.insert(offset, "\n");
        self.blocks.insert(index + 1, new_kind);

        let mut tails = Vec::new();
        for span in &mut self.marks {
            if span.start >= offset {
                span.start += 1;
                span.end += 1;
            } else if span.end > offset {
                tails.push(MarkSpan::new(offset + 1, span.end + 1, span.mark.clone()));
                span.end = offset;
            }
        }
        self.marks.extend(tails);
        self.normalize_marks();
    }

    pub fn set_block_kind(&mut self, index: usize, kind: BlockKind) {
        if let Some(block) = self.blocks.get_mut(index) {
            *block = kind;
        }
    }

    /// Apply `mark` to every non-separator character in `range`. A link
    /// replaces any other link in the range.
    pub fn add_mark(&mut self, range: Range<usize>, mark: Mark) {
        if mark.kind() == MarkKind::Link {
            self.remove_mark(range.clone(), MarkKind::Link);
        }
        for segment in self.block_segments(range) {
            if !segment.is_empty() {
                self.marks
                    .push(MarkSpan::new(segment.start, segment.end, mark.clone()));
            }
        }
        self.normalize_marks();
    }

    /// Remove marks of `kind` from `range`, splitting spans that extend past it.
    pub fn remove_mark(&mut self, range: Range<usize>, kind: MarkKind) {
        let (matching, mut rest): (Vec<_>, Vec<_>) = std::mem::take(&mut self.marks)
            .into_iter()
            .partition(|span| span.mark.kind() == kind);
        rest.extend(subtract(matching, &range));
        self.marks = rest;
        self.normalize_marks();
    }

    /// Restore the mark invariants: clamp, drop empty spans, merge touching
    /// spans of the same mark, sort by start.
    fn normalize_marks(&mut self) {
        let len = self.len_chars();
        let mut spans = std::mem::take(&mut self.marks);
        for span in &mut spans {
            span.start = span.start.min(len);
            span.end = span.end.min(len);
        }
        spans.retain(|span| !span.is_empty());
        spans.sort_by(|a, b| {
            a.mark
                .rank()
                .cmp(&b.mark.rank())
                .then_with(|| link_url(&a.mark).cmp(link_url(&b.mark)))
                .then(a.start.cmp(&b.start))
        });

        let mut merged: Vec<MarkSpan> = Vec::with_capacity(spans.len());
        for span in spans {
            if let Some(last) = merged.last_mut() {
                if last.mark == span.mark && span.start <= last.end {
                    last.end = last.end.max(span.end);
                    continue;
                }
            }
            merged.push(span);
        }
        merged.sort_by(|a, b| {
            a.start
                .cmp(&b.start)
                .then(a.mark.rank().cmp(&b.mark.rank()))
                .then(a.end.cmp(&b.end))
        });
        self.marks = merged;
    }
}

fn link_url(mark: &Mark) -> &str {
    match mark {
        Mark::Link(url) => url.as_str(),
        _ => "",
    }
}

/// Cut `range` out of every span.
fn subtract(spans: Vec<MarkSpan>, range: &Range<usize>) -> Vec<MarkSpan> {
    let mut out = Vec::with_capacity(spans.len());
    for span in spans {
        if span.end <= range.start || span.start >= range.end {
            out.push(span);
            continue;
        }
        if span.start < range.start {
            out.push(MarkSpan::new(span.start, range.start, span.mark.clone()));
        }
        if span.end > range.end {
            out.push(MarkSpan::new(range.end, span.end, span.mark));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ListKind;

    fn doc(text: &str, blocks: Vec<BlockKind>, marks: Vec<MarkSpan>) -> RichDocument {
        RichDocument::from_parts(text, blocks, marks)
    }

    fn bold(start: usize, end: usize) -> MarkSpan {
        MarkSpan::new(start, end, Mark::Bold)
    }

    #[test]
    fn test_new_document_is_empty() {
        let doc = RichDocument::new();
        assert!(doc.is_empty());
        assert_eq!(doc.block_count(), 1);
        assert_eq!(doc.block_range(0), 0..0);
    }

    #[test]
    fn test_block_geometry() {
        let doc = doc(
            "one\ntwo\nthree",
            vec![BlockKind::Paragraph; 3],
            Vec::new(),
        );
        assert_eq!(doc.block_range(0), 0..3);
        assert_eq!(doc.block_range(1), 4..7);
        assert_eq!(doc.block_range(2), 8..13);
        assert_eq!(doc.block_index_at(3), 0);
        assert_eq!(doc.block_index_at(4), 1);
        assert_eq!(doc.block_indices_in(1..5), 0..=1);
        // Ending exactly at a block start does not touch that block.
        assert_eq!(doc.block_indices_in(0..4), 0..=0);
        assert_eq!(doc.block_indices_in(4..4), 1..=1);
    }

    #[test]
    fn test_from_parts_repairs_block_count() {
        let doc = doc("a\nb", vec![BlockKind::Heading(1)], Vec::new());
        assert_eq!(doc.blocks(), &[BlockKind::Heading(1), BlockKind::Paragraph]);
    }

    #[test]
    fn test_from_parts_splits_marks_at_separators() {
        let doc = doc("ab\ncd", vec![BlockKind::Paragraph; 2], vec![bold(1, 4)]);
        assert_eq!(doc.marks(), &[bold(1, 2), bold(3, 4)]);
    }

    #[test]
    fn test_later_link_wins_overlap() {
        let doc = doc(
            "abcdef",
            vec![BlockKind::Paragraph],
            vec![
                MarkSpan::new(0, 6, Mark::Link("https://outer".into())),
                MarkSpan::new(2, 4, Mark::Link("https://inner".into())),
            ],
        );
        assert_eq!(
            doc.marks(),
            &[
                MarkSpan::new(0, 2, Mark::Link("https://outer".into())),
                MarkSpan::new(2, 4, Mark::Link("https://inner".into())),
                MarkSpan::new(4, 6, Mark::Link("https://outer".into())),
            ]
        );
    }

    #[test]
    fn test_insert_extends_inclusive_marks() {
        let mut doc = doc("hello", vec![BlockKind::Paragraph], vec![bold(0, 5)]);
        doc.insert_text(5, "!");
        assert_eq!(doc.text(), "hello!");
        assert_eq!(doc.marks(), &[bold(0, 6)]);
    }

    #[test]
    fn test_insert_does_not_extend_link_end() {
        let link = Mark::Link("https://example.com".into());
        let mut doc = doc(
            "site",
            vec![BlockKind::Paragraph],
            vec![MarkSpan::new(0, 4, link.clone())],
        );
        doc.insert_text(4, "s");
        assert_eq!(doc.marks(), &[MarkSpan::new(0, 4, link.clone())]);
        doc.insert_text(2, "x");
        assert_eq!(doc.marks(), &[MarkSpan::new(0, 5, link)]);
    }

    #[test]
    fn test_insert_before_mark_shifts_it() {
        let mut doc = doc("ab", vec![BlockKind::Paragraph], vec![bold(1, 2)]);
        doc.insert_text(0, "xy");
        assert_eq!(doc.marks(), &[bold(3, 4)]);
    }

    #[test]
    fn test_insert_at_block_start_joins_leading_mark() {
        let link = Mark::Link("https://example.com".into());
        let mut doc = doc(
            "ab\ncd",
            vec![BlockKind::Paragraph, BlockKind::Paragraph],
            vec![bold(0, 2), MarkSpan::new(3, 5, link.clone())],
        );
        doc.insert_text(0, "x");
        doc.insert_text(4, "y");
        assert_eq!(doc.text(), "xab\nycd");
        assert_eq!(doc.marks(), &[bold(0, 3), MarkSpan::new(5, 7, link)]);
    }

    #[test]
    fn test_delete_within_block() {
        let mut doc = doc("hello world", vec![BlockKind::Paragraph], vec![bold(6, 11)]);
        doc.delete(2..8);
        assert_eq!(doc.text(), "herld");
        assert_eq!(doc.marks(), &[bold(2, 5)]);
    }

    #[test]
    fn test_delete_across_blocks_merges() {
        let mut doc = doc(
            "title\nbody",
            vec![BlockKind::Heading(1), BlockKind::Paragraph],
            vec![bold(6, 10)],
        );
        doc.delete(3..8);
        assert_eq!(doc.text(), "titdy");
        assert_eq!(doc.blocks(), &[BlockKind::Heading(1)]);
        assert_eq!(doc.marks(), &[bold(3, 5)]);
    }

    #[test]
    fn test_delete_merges_touching_marks() {
        let mut doc = doc("ab\ncd", vec![BlockKind::Paragraph; 2], vec![bold(0, 2), bold(3, 5)]);
        doc.delete(2..3);
        assert_eq!(doc.marks(), &[bold(0, 4)]);
    }

    #[test]
    fn test_split_block_splits_marks() {
        let mut doc = doc("abcd", vec![BlockKind::Paragraph], vec![bold(1, 3)]);
        doc.split_block(2, BlockKind::Paragraph);
        assert_eq!(doc.text(), "ab\ncd");
        assert_eq!(doc.block_count(), 2);
        assert_eq!(doc.marks(), &[bold(1, 2), bold(3, 4)]);
    }

    #[test]
    fn test_split_list_item_keeps_kind() {
        let item = BlockKind::ListItem(ListKind::Ordered);
        let mut doc = doc("one", vec![item], Vec::new());
        doc.split_block(3, item);
        assert_eq!(doc.blocks(), &[item, item]);
    }

    #[test]
    fn test_add_mark_skips_separators() {
        let mut doc = doc("ab\ncd", vec![BlockKind::Paragraph; 2], Vec::new());
        doc.add_mark(1..4, Mark::Italic);
        assert_eq!(
            doc.marks(),
            &[MarkSpan::new(1, 2, Mark::Italic), MarkSpan::new(3, 4, Mark::Italic)]
        );
        assert!(doc.has_mark(1..4, MarkKind::Italic));
        assert!(!doc.has_mark(0..4, MarkKind::Italic));
    }

    #[test]
    fn test_remove_mark_splits_span() {
        let mut doc = doc("abcdef", vec![BlockKind::Paragraph], vec![bold(0, 6)]);
        doc.remove_mark(2..4, MarkKind::Bold);
        assert_eq!(doc.marks(), &[bold(0, 2), bold(4, 6)]);
    }

    #[test]
    fn test_add_link_replaces_existing_link() {
        let mut doc = doc(
            "abcdef",
            vec![BlockKind::Paragraph],
            vec![MarkSpan::new(0, 6, Mark::Link("https://old".into()))],
        );
        doc.add_mark(0..3, Mark::Link("https://new".into()));
        assert_eq!(
            doc.marks(),
            &[
                MarkSpan::new(0, 3, Mark::Link("https://new".into())),
                MarkSpan::new(3, 6, Mark::Link("https://old".into())),
            ]
        );
    }

    #[test]
    fn test_has_mark_on_separator_only_range() {
        let doc = doc("a\nb", vec![BlockKind::Paragraph; 2], vec![bold(0, 1)]);
        assert!(!doc.has_mark(1..2, MarkKind::Bold));
        assert!(doc.intersects_mark(0..3, MarkKind::Bold));
    }
}
