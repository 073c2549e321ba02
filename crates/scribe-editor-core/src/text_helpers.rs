//! Text navigation helpers.
//!
//! Word boundaries never cross a block separator: word deletion at the edge
//! of a block stops at the block edge, and the block merge is left to a
//! plain backspace/delete.

use crate::document::RichDocument;

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Find word boundary backward from cursor, within the cursor's block.
pub fn find_word_boundary_backward(doc: &RichDocument, cursor: usize) -> usize {
    let block_start = doc.block_range(doc.block_index_at(cursor)).start;
    let mut pos = cursor;

    // Skip any whitespace/punctuation immediately before cursor.
    while pos > block_start {
        match doc.char_at(pos - 1) {
            Some(c) if is_word_char(c) => break,
            Some(_) => pos -= 1,
            None => break,
        }
    }

    // Skip the word characters.
    while pos > block_start {
        match doc.char_at(pos - 1) {
            Some(c) if is_word_char(c) => pos -= 1,
            _ => break,
        }
    }

    pos
}

/// Find word boundary forward from cursor, within the cursor's block.
pub fn find_word_boundary_forward(doc: &RichDocument, cursor: usize) -> usize {
    let block_end = doc.block_range(doc.block_index_at(cursor)).end;
    let mut pos = cursor;

    // Skip word characters first.
    while pos < block_end {
        match doc.char_at(pos) {
            Some(c) if is_word_char(c) => pos += 1,
            _ => break,
        }
    }

    // Then skip whitespace/punctuation.
    while pos < block_end {
        match doc.char_at(pos) {
            Some(c) if is_word_char(c) => break,
            Some(_) => pos += 1,
            None => break,
        }
    }

    pos
}

/// Whether `offset` is the first position of its block.
pub fn is_block_start(doc: &RichDocument, offset: usize) -> bool {
    doc.block_range(doc.block_index_at(offset)).start == offset
}

/// Whether `offset` is the last position of its block.
pub fn is_block_end(doc: &RichDocument, offset: usize) -> bool {
    doc.block_range(doc.block_index_at(offset)).end == offset
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BlockKind;

    fn doc(text: &str) -> RichDocument {
        RichDocument::from_parts(text, Vec::new(), Vec::new())
    }

    #[test]
    fn test_find_word_boundary_backward() {
        let d = doc("hello world");
        assert_eq!(find_word_boundary_backward(&d, 11), 6);
        assert_eq!(find_word_boundary_backward(&d, 6), 0);
        assert_eq!(find_word_boundary_backward(&d, 0), 0);
    }

    #[test]
    fn test_find_word_boundary_forward() {
        let d = doc("hello world");
        assert_eq!(find_word_boundary_forward(&d, 0), 6);
        assert_eq!(find_word_boundary_forward(&d, 6), 11);
    }

    #[test]
    fn test_word_boundaries_stop_at_block_edges() {
        let d = doc("one two\n  three");
        assert_eq!(d.blocks(), &[BlockKind::Paragraph, BlockKind::Paragraph]);
        assert_eq!(find_word_boundary_backward(&d, 10), 8);
        assert_eq!(find_word_boundary_forward(&d, 4), 7);
    }

    #[test]
    fn test_block_edges() {
        let d = doc("ab\ncd");
        assert!(is_block_start(&d, 0));
        assert!(is_block_start(&d, 3));
        assert!(!is_block_start(&d, 2));
        assert!(is_block_end(&d, 2));
        assert!(is_block_end(&d, 5));
    }
}
