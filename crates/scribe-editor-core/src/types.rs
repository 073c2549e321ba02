//! Core editor types: selection, block kinds and inline marks.
//!
//! These types are framework-agnostic. Offsets are character offsets into the
//! document text (Unicode scalar values, not bytes or UTF-16 units).

use std::ops::Range;

use smol_str::SmolStr;

/// Separates blocks in the document text.
pub const BLOCK_SEPARATOR: char = '\n';

/// Soft line break inside a block. Serialized as `<br>`.
pub const SOFT_BREAK: char = '\u{2028}';

/// Non-breaking space. Serialized as `&nbsp;`.
pub const NBSP: char = '\u{a0}';

/// The heading level produced by the heading command and reported by the
/// toolbar's heading flag.
pub const TOP_HEADING_LEVEL: u8 = 1;

/// Text selection with anchor and head positions.
///
/// The anchor is where the selection started, the head is where the cursor is now.
/// They may be in any order - use `start()` and `end()` for ordered bounds.
#[derive(Clone, Debug, Copy, PartialEq, Eq)]
pub struct Selection {
    /// Where selection started
    pub anchor: usize,
    /// Where cursor is now
    pub head: usize,
}

impl Selection {
    /// Create a new selection.
    pub fn new(anchor: usize, head: usize) -> Self {
        Self { anchor, head }
    }

    /// Create a collapsed selection (cursor position).
    pub fn collapsed(offset: usize) -> Self {
        Self {
            anchor: offset,
            head: offset,
        }
    }

    /// Get the start (lower bound) of the selection.
    pub fn start(&self) -> usize {
        self.anchor.min(self.head)
    }

    /// Get the end (upper bound) of the selection.
    pub fn end(&self) -> usize {
        self.anchor.max(self.head)
    }

    /// Check if the selection is collapsed (empty, cursor only).
    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.head
    }

    /// Check if an offset is within the selection.
    pub fn contains(&self, offset: usize) -> bool {
        offset >= self.start() && offset < self.end()
    }

    /// Get the selection length.
    pub fn len(&self) -> usize {
        self.end() - self.start()
    }

    /// Check if empty (same as is_collapsed).
    pub fn is_empty(&self) -> bool {
        self.is_collapsed()
    }

    /// Convert to a Range<usize> (ordered).
    pub fn to_range(&self) -> Range<usize> {
        self.start()..self.end()
    }

    /// Check if the selection is backwards (head before anchor).
    pub fn is_backwards(&self) -> bool {
        self.head < self.anchor
    }

    /// Clamp both ends to `len`, keeping direction.
    pub fn clamp(self, len: usize) -> Self {
        Self {
            anchor: self.anchor.min(len),
            head: self.head.min(len),
        }
    }
}

/// Which kind of list a list item belongs to.
#[derive(Clone, Debug, Copy, PartialEq, Eq, Hash)]
pub enum ListKind {
    /// `<ul>`
    Unordered,
    /// `<ol>`
    Ordered,
}

impl ListKind {
    pub fn tag(self) -> &'static str {
        match self {
            Self::Unordered => "ul",
            Self::Ordered => "ol",
        }
    }
}

/// Block-level formatting of one block in the document.
#[derive(Clone, Debug, Copy, PartialEq, Eq, Hash, Default)]
pub enum BlockKind {
    #[default]
    Paragraph,
    /// Heading level, 1..=6.
    Heading(u8),
    ListItem(ListKind),
}

impl BlockKind {
    /// Element name used when serializing the block.
    pub fn tag(self) -> &'static str {
        match self {
            Self::Paragraph => "p",
            Self::Heading(1) => "h1",
            Self::Heading(2) => "h2",
            Self::Heading(3) => "h3",
            Self::Heading(4) => "h4",
            Self::Heading(5) => "h5",
            Self::Heading(_) => "h6",
            Self::ListItem(_) => "li",
        }
    }

    pub fn list_kind(self) -> Option<ListKind> {
        match self {
            Self::ListItem(kind) => Some(kind),
            _ => None,
        }
    }

    pub fn is_top_heading(self) -> bool {
        self == Self::Heading(TOP_HEADING_LEVEL)
    }
}

/// The kind of an inline mark, without its payload.
#[derive(Clone, Debug, Copy, PartialEq, Eq, Hash)]
pub enum MarkKind {
    Bold,
    Italic,
    Underline,
    Link,
}

/// An inline formatting mark.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Mark {
    Bold,
    Italic,
    Underline,
    /// Hyperlink to the given URL, stored verbatim.
    Link(SmolStr),
}

impl Mark {
    pub fn kind(&self) -> MarkKind {
        match self {
            Self::Bold => MarkKind::Bold,
            Self::Italic => MarkKind::Italic,
            Self::Underline => MarkKind::Underline,
            Self::Link(_) => MarkKind::Link,
        }
    }

    /// Nesting rank when serializing: lower ranks are opened first (outermost).
    pub fn rank(&self) -> u8 {
        match self {
            Self::Link(_) => 0,
            Self::Bold => 1,
            Self::Italic => 2,
            Self::Underline => 3,
        }
    }

    /// Whether text typed at the end of a run of this mark joins the run.
    pub fn is_inclusive(&self) -> bool {
        !matches!(self, Self::Link(_))
    }
}

/// A mark applied to a character range of the document text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MarkSpan {
    pub start: usize,
    pub end: usize,
    pub mark: Mark,
}

impl MarkSpan {
    pub fn new(start: usize, end: usize, mark: Mark) -> Self {
        Self { start, end, mark }
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// Whether the character at `offset` carries this mark.
    pub fn covers(&self, offset: usize) -> bool {
        offset >= self.start && offset < self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selection_bounds() {
        // Forward selection
        let sel = Selection::new(5, 10);
        assert_eq!(sel.start(), 5);
        assert_eq!(sel.end(), 10);
        assert!(!sel.is_backwards());

        // Backward selection
        let sel = Selection::new(10, 5);
        assert_eq!(sel.start(), 5);
        assert_eq!(sel.end(), 10);
        assert!(sel.is_backwards());
    }

    #[test]
    fn test_selection_collapsed() {
        let sel = Selection::collapsed(7);
        assert!(sel.is_collapsed());
        assert!(sel.is_empty());
        assert_eq!(sel.len(), 0);
        assert_eq!(sel.start(), 7);
        assert_eq!(sel.end(), 7);
    }

    #[test]
    fn test_selection_contains() {
        let sel = Selection::new(5, 10);
        assert!(!sel.contains(4));
        assert!(sel.contains(5));
        assert!(sel.contains(9));
        assert!(!sel.contains(10)); // end is exclusive
    }

    #[test]
    fn test_selection_clamp_keeps_direction() {
        let sel = Selection::new(12, 3).clamp(8);
        assert_eq!(sel, Selection::new(8, 3));
        assert!(sel.is_backwards());
    }

    #[test]
    fn test_block_tags() {
        assert_eq!(BlockKind::Paragraph.tag(), "p");
        assert_eq!(BlockKind::Heading(2).tag(), "h2");
        assert_eq!(BlockKind::ListItem(ListKind::Ordered).tag(), "li");
        assert!(BlockKind::Heading(1).is_top_heading());
        assert!(!BlockKind::Heading(2).is_top_heading());
    }

    #[test]
    fn test_mark_ordering() {
        let link = Mark::Link("https://example.com".into());
        assert!(link.rank() < Mark::Bold.rank());
        assert!(Mark::Bold.rank() < Mark::Italic.rank());
        assert!(Mark::Italic.rank() < Mark::Underline.rank());
        assert!(!link.is_inclusive());
        assert!(Mark::Bold.is_inclusive());
    }
}
