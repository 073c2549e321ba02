//! Editor actions, input types and keybindings.
//!
//! Platform-agnostic definitions for editor operations. The `EditorAction` enum
//! represents semantic editing operations, while `InputType` represents the
//! semantic intent from input events (browser beforeinput, native input methods, etc.).

use std::collections::HashMap;

use smol_str::SmolStr;

/// A range in the document, measured in character offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range {
    pub start: usize,
    pub end: usize,
}

impl Range {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn caret(offset: usize) -> Self {
        Self {
            start: offset,
            end: offset,
        }
    }

    pub fn is_caret(&self) -> bool {
        self.start == self.end
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Normalize range so start <= end.
    pub fn normalize(self) -> Self {
        if self.start <= self.end {
            self
        } else {
            Self {
                start: self.end,
                end: self.start,
            }
        }
    }
}

impl From<std::ops::Range<usize>> for Range {
    fn from(r: std::ops::Range<usize>) -> Self {
        Self::new(r.start, r.end)
    }
}

impl From<Range> for std::ops::Range<usize> {
    fn from(r: Range) -> Self {
        r.start..r.end
    }
}

impl From<crate::types::Selection> for Range {
    fn from(sel: crate::types::Selection) -> Self {
        Self::new(sel.start(), sel.end())
    }
}

/// Semantic input types from input events.
///
/// Based on the W3C Input Events `inputType` values. Platform code maps its
/// native events to these; anything the editor does not act on arrives as
/// `Unknown` and passes through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputType {
    // === Insertion ===
    /// Insert typed text.
    InsertText,
    /// Insert a line break (`<br>`, Shift+Enter).
    InsertLineBreak,
    /// Insert a paragraph break (Enter).
    InsertParagraph,
    /// Insert from paste operation.
    InsertFromPaste,
    /// Insert from drop operation.
    InsertFromDrop,
    /// Insert replacement text (e.g., spell check correction).
    InsertReplacementText,

    // === Deletion ===
    /// Delete content backward (Backspace).
    DeleteContentBackward,
    /// Delete content forward (Delete key).
    DeleteContentForward,
    /// Delete word backward (Ctrl/Alt+Backspace).
    DeleteWordBackward,
    /// Delete word forward (Ctrl/Alt+Delete).
    DeleteWordForward,
    /// Delete by cut operation.
    DeleteByCut,

    // === History ===
    HistoryUndo,
    HistoryRedo,

    // === Formatting ===
    FormatBold,
    FormatItalic,
    FormatUnderline,

    // === Unknown ===
    /// Unrecognized input type.
    Unknown(String),
}

impl InputType {
    /// Map a W3C `inputType` string.
    pub fn from_name(name: &str) -> Self {
        match name {
            "insertText" => Self::InsertText,
            "insertLineBreak" => Self::InsertLineBreak,
            "insertParagraph" => Self::InsertParagraph,
            "insertFromPaste" => Self::InsertFromPaste,
            "insertFromDrop" => Self::InsertFromDrop,
            "insertReplacementText" => Self::InsertReplacementText,
            "deleteContentBackward" => Self::DeleteContentBackward,
            "deleteContentForward" => Self::DeleteContentForward,
            "deleteWordBackward" => Self::DeleteWordBackward,
            "deleteWordForward" => Self::DeleteWordForward,
            "deleteByCut" => Self::DeleteByCut,
            "historyUndo" => Self::HistoryUndo,
            "historyRedo" => Self::HistoryRedo,
            "formatBold" => Self::FormatBold,
            "formatItalic" => Self::FormatItalic,
            "formatUnderline" => Self::FormatUnderline,
            other => Self::Unknown(other.to_string()),
        }
    }

    /// Whether this input type is a deletion operation.
    pub fn is_deletion(&self) -> bool {
        matches!(
            self,
            Self::DeleteContentBackward
                | Self::DeleteContentForward
                | Self::DeleteWordBackward
                | Self::DeleteWordForward
                | Self::DeleteByCut
        )
    }

    /// Whether this input type is an insertion operation.
    pub fn is_insertion(&self) -> bool {
        matches!(
            self,
            Self::InsertText
                | Self::InsertLineBreak
                | Self::InsertParagraph
                | Self::InsertFromPaste
                | Self::InsertFromDrop
                | Self::InsertReplacementText
        )
    }

    /// Build the action for this input at `range`. `None` for input types
    /// the editor leaves to the platform.
    pub fn to_action(&self, data: Option<&str>, range: Range) -> Option<EditorAction> {
        let text = || data.unwrap_or_default().to_string();
        let action = match self {
            Self::InsertText | Self::InsertReplacementText => EditorAction::Insert {
                text: text(),
                range,
            },
            Self::InsertFromPaste | Self::InsertFromDrop => EditorAction::Paste {
                text: text(),
                range,
            },
            Self::InsertLineBreak => EditorAction::InsertLineBreak { range },
            Self::InsertParagraph => EditorAction::InsertParagraph { range },
            Self::DeleteContentBackward => EditorAction::DeleteBackward { range },
            Self::DeleteContentForward => EditorAction::DeleteForward { range },
            Self::DeleteWordBackward => EditorAction::DeleteWordBackward { range },
            Self::DeleteWordForward => EditorAction::DeleteWordForward { range },
            Self::DeleteByCut => EditorAction::DeleteSelection { range },
            Self::HistoryUndo => EditorAction::Undo,
            Self::HistoryRedo => EditorAction::Redo,
            Self::FormatBold => EditorAction::ToggleBold { range },
            Self::FormatItalic => EditorAction::ToggleItalic { range },
            Self::FormatUnderline => EditorAction::ToggleUnderline { range },
            Self::Unknown(_) => return None,
        };
        Some(action)
    }
}

/// All possible editor actions.
///
/// These represent semantic operations on the document, decoupled from
/// how they're triggered (toolbar, keyboard, input events).
#[derive(Debug, Clone, PartialEq)]
pub enum EditorAction {
    // === Text Insertion ===
    /// Insert text at the given range (replacing any selected content).
    Insert { text: String, range: Range },

    /// Insert plain text where newlines become paragraph breaks.
    Paste { text: String, range: Range },

    /// Insert a soft line break (Shift+Enter, `<br>` equivalent).
    InsertLineBreak { range: Range },

    /// Insert a paragraph break (Enter).
    InsertParagraph { range: Range },

    // === Deletion ===
    /// Delete content backward (Backspace).
    DeleteBackward { range: Range },

    /// Delete content forward (Delete key).
    DeleteForward { range: Range },

    /// Delete word backward (Ctrl/Alt+Backspace).
    DeleteWordBackward { range: Range },

    /// Delete word forward (Ctrl/Alt+Delete).
    DeleteWordForward { range: Range },

    /// Delete the selected content (cut).
    DeleteSelection { range: Range },

    // === History ===
    /// Undo the last change. Handled by the editor's history, not the document.
    Undo,

    /// Redo the last undone change.
    Redo,

    // === Formatting ===
    ToggleBold { range: Range },
    ToggleItalic { range: Range },
    ToggleUnderline { range: Range },

    /// Toggle the touched blocks between the top heading level and paragraph.
    ToggleHeading { range: Range },

    ToggleUnorderedList { range: Range },
    ToggleOrderedList { range: Range },

    /// Wrap the range in a link to `url`.
    InsertLink { range: Range, url: SmolStr },

    /// Remove links in the range, or the whole link under a caret.
    RemoveLink { range: Range },

    /// Open the link dialog. Handled by the editor, not the document.
    OpenLinkDialog,

    // === Selection ===
    /// Select all content.
    SelectAll,
}

impl EditorAction {
    /// Update the range in actions that use one.
    pub fn with_range(self, range: Range) -> Self {
        match self {
            Self::Insert { text, .. } => Self::Insert { text, range },
            Self::Paste { text, .. } => Self::Paste { text, range },
            Self::InsertLineBreak { .. } => Self::InsertLineBreak { range },
            Self::InsertParagraph { .. } => Self::InsertParagraph { range },
            Self::DeleteBackward { .. } => Self::DeleteBackward { range },
            Self::DeleteForward { .. } => Self::DeleteForward { range },
            Self::DeleteWordBackward { .. } => Self::DeleteWordBackward { range },
            Self::DeleteWordForward { .. } => Self::DeleteWordForward { range },
            Self::DeleteSelection { .. } => Self::DeleteSelection { range },
            Self::ToggleBold { .. } => Self::ToggleBold { range },
            Self::ToggleItalic { .. } => Self::ToggleItalic { range },
            Self::ToggleUnderline { .. } => Self::ToggleUnderline { range },
            Self::ToggleHeading { .. } => Self::ToggleHeading { range },
            Self::ToggleUnorderedList { .. } => Self::ToggleUnorderedList { range },
            Self::ToggleOrderedList { .. } => Self::ToggleOrderedList { range },
            Self::InsertLink { url, .. } => Self::InsertLink { range, url },
            Self::RemoveLink { .. } => Self::RemoveLink { range },
            other => other,
        }
    }
}

/// Key values for keyboard input.
///
/// Platform-agnostic key representation. Platform-specific code converts
/// from native key events to this enum.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    /// A character key.
    Character(SmolStr),

    /// Unknown/unidentified key.
    Unidentified,

    // === Whitespace / editing ===
    Backspace,
    Delete,
    Enter,
    Tab,
    Escape,
    Space,

    // === Navigation ===
    ArrowLeft,
    ArrowRight,
    ArrowUp,
    ArrowDown,
    Home,
    End,
    PageUp,
    PageDown,

    // === Modifiers ===
    Alt,
    AltGraph,
    CapsLock,
    Control,
    Meta,
    Shift,
}

impl Key {
    /// Create a character key.
    pub fn character(s: impl Into<SmolStr>) -> Self {
        Self::Character(s.into())
    }

    /// Map a DOM `KeyboardEvent.key` value.
    pub fn from_name(name: &str) -> Self {
        match name {
            "Backspace" => Self::Backspace,
            "Delete" => Self::Delete,
            "Enter" => Self::Enter,
            "Tab" => Self::Tab,
            "Escape" => Self::Escape,
            " " => Self::Space,
            "ArrowLeft" => Self::ArrowLeft,
            "ArrowRight" => Self::ArrowRight,
            "ArrowUp" => Self::ArrowUp,
            "ArrowDown" => Self::ArrowDown,
            "Home" => Self::Home,
            "End" => Self::End,
            "PageUp" => Self::PageUp,
            "PageDown" => Self::PageDown,
            "Alt" => Self::Alt,
            "AltGraph" => Self::AltGraph,
            "CapsLock" => Self::CapsLock,
            "Control" => Self::Control,
            "Meta" => Self::Meta,
            "Shift" => Self::Shift,
            s if s.chars().count() == 1 => Self::character(s),
            _ => Self::Unidentified,
        }
    }

    /// Character keys compare case-insensitively (Shift+z reports "Z").
    pub fn normalized(&self) -> Self {
        match self {
            Self::Character(s) => Self::Character(s.to_lowercase().into()),
            other => other.clone(),
        }
    }

    /// Check if this is a navigation key.
    pub fn is_navigation(&self) -> bool {
        matches!(
            self,
            Self::ArrowLeft
                | Self::ArrowRight
                | Self::ArrowUp
                | Self::ArrowDown
                | Self::Home
                | Self::End
                | Self::PageUp
                | Self::PageDown
        )
    }

    /// Check if this is a modifier key.
    pub fn is_modifier(&self) -> bool {
        matches!(
            self,
            Self::Alt | Self::AltGraph | Self::CapsLock | Self::Control | Self::Meta | Self::Shift
        )
    }
}

/// Modifier key state for a key combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Modifiers {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        ctrl: false,
        alt: false,
        shift: false,
        meta: false,
    };

    pub const CTRL: Self = Self {
        ctrl: true,
        alt: false,
        shift: false,
        meta: false,
    };

    pub const SHIFT: Self = Self {
        ctrl: false,
        alt: false,
        shift: true,
        meta: false,
    };

    pub const META: Self = Self {
        ctrl: false,
        alt: false,
        shift: false,
        meta: true,
    };

    pub const CTRL_SHIFT: Self = Self {
        ctrl: true,
        alt: false,
        shift: true,
        meta: false,
    };

    pub const META_SHIFT: Self = Self {
        ctrl: false,
        alt: false,
        shift: true,
        meta: true,
    };

    /// Get the primary modifier for the platform (Cmd on Mac, Ctrl elsewhere).
    pub fn primary(is_mac: bool) -> Self {
        if is_mac { Self::META } else { Self::CTRL }
    }

    /// Get the primary modifier + Shift for the platform.
    pub fn primary_shift(is_mac: bool) -> Self {
        if is_mac {
            Self::META_SHIFT
        } else {
            Self::CTRL_SHIFT
        }
    }
}

/// A key combination for triggering an action.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyCombo {
    pub key: Key,
    pub modifiers: Modifiers,
}

impl KeyCombo {
    pub fn new(key: Key) -> Self {
        Self {
            key,
            modifiers: Modifiers::NONE,
        }
    }

    pub fn with_modifiers(key: Key, modifiers: Modifiers) -> Self {
        Self { key, modifiers }
    }

    pub fn ctrl(key: Key) -> Self {
        Self::with_modifiers(key, Modifiers::CTRL)
    }

    pub fn meta(key: Key) -> Self {
        Self::with_modifiers(key, Modifiers::META)
    }

    pub fn shift(key: Key) -> Self {
        Self::with_modifiers(key, Modifiers::SHIFT)
    }

    pub fn primary(key: Key, is_mac: bool) -> Self {
        Self::with_modifiers(key, Modifiers::primary(is_mac))
    }

    pub fn primary_shift(key: Key, is_mac: bool) -> Self {
        Self::with_modifiers(key, Modifiers::primary_shift(is_mac))
    }

    fn normalized(&self) -> Self {
        Self::with_modifiers(self.key.normalized(), self.modifiers)
    }
}

/// Result of handling a keydown event.
#[derive(Debug, Clone, PartialEq)]
pub enum KeydownResult {
    /// Event was handled, prevent default.
    Handled,
    /// Event was not a keybinding, let platform handle it.
    NotHandled,
    /// Event should be passed through (navigation, etc.).
    PassThrough,
}

/// Maps key combinations to editor actions.
#[derive(Debug, Clone, Default)]
pub struct KeybindingConfig {
    bindings: HashMap<KeyCombo, EditorAction>,
}

impl KeybindingConfig {
    /// The default shortcuts, using Cmd on mac and Ctrl elsewhere.
    pub fn default_for_platform(is_mac: bool) -> Self {
        let mut config = Self::default();
        let primary = |c: &str| KeyCombo::primary(Key::character(c), is_mac);
        let placeholder = Range::caret(0);

        config.bind(primary("b"), EditorAction::ToggleBold { range: placeholder });
        config.bind(primary("i"), EditorAction::ToggleItalic { range: placeholder });
        config.bind(primary("u"), EditorAction::ToggleUnderline { range: placeholder });
        config.bind(primary("k"), EditorAction::OpenLinkDialog);
        config.bind(primary("z"), EditorAction::Undo);
        config.bind(
            KeyCombo::primary_shift(Key::character("z"), is_mac),
            EditorAction::Redo,
        );
        if !is_mac {
            config.bind(primary("y"), EditorAction::Redo);
        }
        config
    }

    /// Add or replace a binding.
    pub fn bind(&mut self, combo: KeyCombo, action: EditorAction) {
        self.bindings.insert(combo.normalized(), action);
    }

    /// Look up the action for a key combination, with its range set to `range`.
    pub fn lookup(&self, combo: &KeyCombo, range: Range) -> Option<EditorAction> {
        self.bindings
            .get(&combo.normalized())
            .cloned()
            .map(|action| action.with_range(range))
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}
