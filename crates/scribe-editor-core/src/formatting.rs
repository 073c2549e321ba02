//! Toolbar formatting state, derived from the document and selection.

use serde::{Deserialize, Serialize};

use crate::document::RichDocument;
use crate::types::{ListKind, MarkKind, Selection};

/// Which formats apply at the current selection. Each flag drives the
/// active state of one toolbar button.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormattingState {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    /// Only the top heading level counts.
    pub heading: bool,
    pub unordered_list: bool,
    pub ordered_list: bool,
}

/// Compute the formatting state. With no selection nothing is active.
pub fn formatting_state(doc: &RichDocument, selection: Option<Selection>) -> FormattingState {
    let Some(selection) = selection else {
        return FormattingState::default();
    };
    let selection = selection.clamp(doc.len_chars());
    let range = selection.to_range();

    let inline = |kind: MarkKind| {
        if selection.is_collapsed() {
            caret_mark_offset(doc, selection.head).is_some_and(|offset| doc.mark_at(offset, kind))
        } else {
            doc.has_mark(range.clone(), kind)
        }
    };
    let all_list = |kind: ListKind| {
        doc.block_indices_in(range.clone())
            .all(|index| doc.block_kind(index).and_then(|b| b.list_kind()) == Some(kind))
    };

    let state = FormattingState {
        bold: inline(MarkKind::Bold),
        italic: inline(MarkKind::Italic),
        underline: inline(MarkKind::Underline),
        heading: doc
            .block_kind(doc.block_index_at(range.start))
            .is_some_and(|kind| kind.is_top_heading()),
        unordered_list: all_list(ListKind::Unordered),
        ordered_list: all_list(ListKind::Ordered),
    };
    tracing::trace!(?selection, ?state, "formatting state");
    state
}

/// The character whose marks a caret reports: the one before it in the same
/// block, or the one after it at a block start. `None` in an empty block.
fn caret_mark_offset(doc: &RichDocument, caret: usize) -> Option<usize> {
    let block = doc.block_range(doc.block_index_at(caret));
    if block.is_empty() {
        None
    } else if caret > block.start {
        Some(caret - 1)
    } else {
        Some(caret)
    }
}
