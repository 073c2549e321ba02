//! Action execution for rich documents.
//!
//! `execute_action` is the command interpreter: it applies an `EditorAction`
//! to a `RichDocument` as structural edits (insert and delete text, split and
//! merge blocks, set block kinds, add and remove marks).

use std::ops::Range as CharRange;

use smol_str::SmolStr;

use crate::actions::{EditorAction, Range};
use crate::document::RichDocument;
use crate::text_helpers::{
    find_word_boundary_backward, find_word_boundary_forward, is_block_end, is_block_start,
};
use crate::types::{BlockKind, ListKind, Mark, MarkKind, SOFT_BREAK, Selection, TOP_HEADING_LEVEL};

/// Execute an editor action on a document.
///
/// This is the central dispatch point for document edits. Returns the
/// selection to place after the action, or `None` when the action did not
/// apply. Undo, redo and the link dialog belong to the editor and always
/// return `None` here.
pub fn execute_action(doc: &mut RichDocument, action: &EditorAction) -> Option<Selection> {
    let len = doc.len_chars();
    let clamp = move |range: Range| {
        let range = range.normalize();
        range.start.min(len)..range.end.min(len)
    };
    match action {
        EditorAction::Insert { text, range } => execute_insert(doc, text, clamp(*range)),
        EditorAction::Paste { text, range } => execute_paste(doc, text, clamp(*range)),
        EditorAction::InsertLineBreak { range } => execute_insert_line_break(doc, clamp(*range)),
        EditorAction::InsertParagraph { range } => execute_insert_paragraph(doc, clamp(*range)),
        EditorAction::DeleteBackward { range } => execute_delete_backward(doc, clamp(*range)),
        EditorAction::DeleteForward { range } => execute_delete_forward(doc, clamp(*range)),
        EditorAction::DeleteWordBackward { range } => {
            execute_delete_word_backward(doc, clamp(*range))
        }
        EditorAction::DeleteWordForward { range } => {
            execute_delete_word_forward(doc, clamp(*range))
        }
        EditorAction::DeleteSelection { range } => {
            let range = clamp(*range);
            if range.is_empty() {
                return None;
            }
            delete_selection(doc, range)
        }
        EditorAction::ToggleBold { range } => {
            execute_toggle_mark(doc, clamp(*range), Mark::Bold)
        }
        EditorAction::ToggleItalic { range } => {
            execute_toggle_mark(doc, clamp(*range), Mark::Italic)
        }
        EditorAction::ToggleUnderline { range } => {
            execute_toggle_mark(doc, clamp(*range), Mark::Underline)
        }
        EditorAction::ToggleHeading { range } => execute_toggle_block(
            doc,
            clamp(*range),
            BlockKind::Heading(TOP_HEADING_LEVEL),
        ),
        EditorAction::ToggleUnorderedList { range } => execute_toggle_block(
            doc,
            clamp(*range),
            BlockKind::ListItem(ListKind::Unordered),
        ),
        EditorAction::ToggleOrderedList { range } => execute_toggle_block(
            doc,
            clamp(*range),
            BlockKind::ListItem(ListKind::Ordered),
        ),
        EditorAction::InsertLink { range, url } => execute_insert_link(doc, clamp(*range), url),
        EditorAction::RemoveLink { range } => execute_remove_link(doc, clamp(*range)),
        EditorAction::SelectAll => Some(Selection::new(0, doc.len_chars())),
        EditorAction::Undo | EditorAction::Redo | EditorAction::OpenLinkDialog => None,
    }
}

fn selection_of(range: &CharRange<usize>) -> Selection {
    Selection::new(range.start, range.end)
}

fn delete_selection(doc: &mut RichDocument, range: CharRange<usize>) -> Option<Selection> {
    doc.delete(range.clone());
    Some(Selection::collapsed(range.start))
}

fn execute_insert(doc: &mut RichDocument, text: &str, range: CharRange<usize>) -> Option<Selection> {
    if text.contains(['\n', '\r']) {
        return execute_paste(doc, text, range);
    }
    if text.is_empty() && range.is_empty() {
        return None;
    }
    doc.delete(range.clone());
    doc.insert_text(range.start, text);
    Some(Selection::collapsed(range.start + text.chars().count()))
}

/// Plain-text paste: each line break starts a new block.
fn execute_paste(doc: &mut RichDocument, text: &str, range: CharRange<usize>) -> Option<Selection> {
    let text = text.replace("\r\n", "\n").replace('\r', "\n");
    if text.is_empty() && range.is_empty() {
        return None;
    }
    doc.delete(range.clone());

    let mut offset = range.start;
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            let kind = split_kind(doc, offset);
            doc.split_block(offset, kind);
            offset += 1;
        }
        doc.insert_text(offset, line);
        offset += line.chars().count();
    }
    Some(Selection::collapsed(offset))
}

fn execute_insert_line_break(doc: &mut RichDocument, range: CharRange<usize>) -> Option<Selection> {
    doc.delete(range.clone());
    let mut buf = [0u8; 4];
    doc.insert_text(range.start, SOFT_BREAK.encode_utf8(&mut buf));
    Some(Selection::collapsed(range.start + 1))
}

/// Kind of the block created by splitting at `offset`: a heading split at
/// its end continues as a paragraph, everything else keeps its kind.
fn split_kind(doc: &RichDocument, offset: usize) -> BlockKind {
    let index = doc.block_index_at(offset);
    match doc.block_kind(index) {
        Some(BlockKind::Heading(_)) if is_block_end(doc, offset) => BlockKind::Paragraph,
        Some(kind) => kind,
        None => BlockKind::Paragraph,
    }
}

fn execute_insert_paragraph(doc: &mut RichDocument, range: CharRange<usize>) -> Option<Selection> {
    doc.delete(range.clone());
    let offset = range.start;
    let index = doc.block_index_at(offset);

    // Enter in an empty list item leaves the list.
    if let Some(BlockKind::ListItem(_)) = doc.block_kind(index) {
        if doc.block_range(index).is_empty() {
            doc.set_block_kind(index, BlockKind::Paragraph);
            return Some(Selection::collapsed(offset));
        }
    }

    let kind = split_kind(doc, offset);
    doc.split_block(offset, kind);
    Some(Selection::collapsed(offset + 1))
}

fn execute_delete_backward(doc: &mut RichDocument, range: CharRange<usize>) -> Option<Selection> {
    if !range.is_empty() {
        return delete_selection(doc, range);
    }
    let offset = range.start;
    if is_block_start(doc, offset) {
        let index = doc.block_index_at(offset);
        // Backspace at the start of a list item drops the list formatting first.
        if let Some(BlockKind::ListItem(_)) = doc.block_kind(index) {
            doc.set_block_kind(index, BlockKind::Paragraph);
            return Some(Selection::collapsed(offset));
        }
        if offset == 0 {
            return None;
        }
    }
    delete_selection(doc, offset - 1..offset)
}

fn execute_delete_forward(doc: &mut RichDocument, range: CharRange<usize>) -> Option<Selection> {
    if !range.is_empty() {
        return delete_selection(doc, range);
    }
    let offset = range.start;
    if offset >= doc.len_chars() {
        return None;
    }
    delete_selection(doc, offset..offset + 1)
}

fn execute_delete_word_backward(
    doc: &mut RichDocument,
    range: CharRange<usize>,
) -> Option<Selection> {
    if !range.is_empty() || is_block_start(doc, range.start) {
        return execute_delete_backward(doc, range);
    }
    let start = find_word_boundary_backward(doc, range.start);
    delete_selection(doc, start..range.start)
}

fn execute_delete_word_forward(
    doc: &mut RichDocument,
    range: CharRange<usize>,
) -> Option<Selection> {
    if !range.is_empty() || is_block_end(doc, range.start) {
        return execute_delete_forward(doc, range);
    }
    let end = find_word_boundary_forward(doc, range.start);
    delete_selection(doc, range.start..end)
}

/// Remove the mark when the whole range already carries it, apply it to the
/// whole range otherwise. A caret has nothing to format.
fn execute_toggle_mark(
    doc: &mut RichDocument,
    range: CharRange<usize>,
    mark: Mark,
) -> Option<Selection> {
    if range.is_empty() {
        return None;
    }
    let kind = mark.kind();
    if doc.has_mark(range.clone(), kind) {
        doc.remove_mark(range.clone(), kind);
    } else {
        doc.add_mark(range.clone(), mark);
    }
    Some(selection_of(&range))
}

/// Set every touched block to `kind`, or back to paragraphs when all of them
/// already are `kind`.
fn execute_toggle_block(
    doc: &mut RichDocument,
    range: CharRange<usize>,
    kind: BlockKind,
) -> Option<Selection> {
    let indices = doc.block_indices_in(range.clone());
    let all_set = indices
        .clone()
        .all(|index| doc.block_kind(index) == Some(kind));
    let target = if all_set { BlockKind::Paragraph } else { kind };
    for index in indices {
        doc.set_block_kind(index, target);
    }
    Some(selection_of(&range))
}

fn execute_insert_link(
    doc: &mut RichDocument,
    range: CharRange<usize>,
    url: &SmolStr,
) -> Option<Selection> {
    if url.is_empty() {
        return None;
    }
    if range.is_empty() {
        // Nothing to wrap: the URL itself becomes the linked text.
        let text: String = url
            .chars()
            .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
            .collect();
        let end = range.start + text.chars().count();
        doc.insert_text(range.start, &text);
        doc.add_mark(range.start..end, Mark::Link(url.clone()));
        return Some(Selection::collapsed(end));
    }
    doc.add_mark(range.clone(), Mark::Link(url.clone()));
    Some(selection_of(&range))
}

fn execute_remove_link(doc: &mut RichDocument, range: CharRange<usize>) -> Option<Selection> {
    if range.is_empty() {
        let offset = range.start;
        let link = doc
            .marks()
            .iter()
            .find(|span| {
                span.mark.kind() == MarkKind::Link && span.start <= offset && offset <= span.end
            })?
            .range();
        doc.remove_mark(link, MarkKind::Link);
        return Some(Selection::collapsed(offset));
    }
    if !doc.intersects_mark(range.clone(), MarkKind::Link) {
        return None;
    }
    doc.remove_mark(range.clone(), MarkKind::Link);
    Some(selection_of(&range))
}
