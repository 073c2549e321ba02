//! scribe-editor-core: the rich-text editing surface, without framework dependencies.
//!
//! This crate provides:
//! - `RichDocument` - span-list document model over an `EditorRope`
//! - `html` - lenient HTML fragment parsing and canonical serialization
//! - `execute_action` - command interpreter for `EditorAction`
//! - `RichTextEditor` - the component: value/on-change contract, toolbar,
//!   link dialog, formatting state and undo history

pub mod actions;
pub mod config;
pub mod document;
pub mod editor;
pub mod error;
pub mod execute;
pub mod formatting;
pub mod html;
pub mod link;
pub mod text;
pub mod text_helpers;
pub mod toolbar;
pub mod types;
pub mod undo;

pub use actions::{
    EditorAction, InputType, Key, KeyCombo, KeybindingConfig, KeydownResult, Modifiers, Range,
};
pub use config::{EditorConfig, KeybindingPreset};
pub use document::RichDocument;
pub use editor::RichTextEditor;
pub use error::EditorError;
pub use execute::execute_action;
pub use formatting::{FormattingState, formatting_state};
pub use link::LinkDialog;
pub use smol_str::SmolStr;
pub use text::{EditorRope, TextBuffer};
pub use toolbar::{EditorView, LinkDialogView, ToolbarButton, ToolbarCommand};
pub use types::{BlockKind, ListKind, Mark, MarkKind, MarkSpan, Selection};
pub use undo::{History, Snapshot};
