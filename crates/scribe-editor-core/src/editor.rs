//! The rich-text editor component.
//!
//! `RichTextEditor` owns the document, the last-known selection, the derived
//! formatting state, the link dialog and the undo history. The host feeds it
//! platform events and draws the `EditorView` returned by `render`. Every
//! content mutation is reported through the `on_change` listener with the
//! full canonical HTML.

use crate::actions::{EditorAction, InputType, Key, KeyCombo, KeybindingConfig, KeydownResult, Range};
use crate::config::EditorConfig;
use crate::document::RichDocument;
use crate::execute::execute_action;
use crate::formatting::{FormattingState, formatting_state};
use crate::link::LinkDialog;
use crate::toolbar::{EditorView, LINK_URL_PLACEHOLDER, LinkDialogView, ToolbarCommand, toolbar_buttons};
use crate::types::Selection;
use crate::undo::{History, Snapshot};

type ChangeListener = Box<dyn FnMut(&str)>;

pub struct RichTextEditor {
    document: RichDocument,
    /// Serialized `document`; the region's live content.
    html: String,
    selection: Option<Selection>,
    focused: bool,
    formatting: FormattingState,
    link_dialog: LinkDialog,
    history: History,
    keybindings: KeybindingConfig,
    placeholder: String,
    on_change: Option<ChangeListener>,
}

impl Default for RichTextEditor {
    fn default() -> Self {
        Self::new(&EditorConfig::default())
    }
}

impl std::fmt::Debug for RichTextEditor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RichTextEditor")
            .field("html", &self.html)
            .field("selection", &self.selection)
            .field("focused", &self.focused)
            .field("formatting", &self.formatting)
            .field("link_dialog", &self.link_dialog)
            .finish_non_exhaustive()
    }
}

impl RichTextEditor {
    pub fn new(config: &EditorConfig) -> Self {
        Self {
            document: RichDocument::new(),
            html: String::new(),
            selection: None,
            focused: false,
            formatting: FormattingState::default(),
            link_dialog: LinkDialog::Closed,
            history: History::new(config.max_undo_steps),
            keybindings: config.keybindings.bindings(),
            placeholder: String::new(),
            on_change: None,
        }
    }

    /// Replace the default shortcuts.
    pub fn with_keybindings(mut self, keybindings: KeybindingConfig) -> Self {
        self.keybindings = keybindings;
        self
    }

    // === Public contract ===

    /// One render pass: adopt the external value if it differs from the live
    /// content, store the change listener and describe what to draw.
    pub fn render(
        &mut self,
        value: &str,
        on_change: impl FnMut(&str) + 'static,
        placeholder: &str,
    ) -> EditorView {
        self.on_change = Some(Box::new(on_change));
        if self.placeholder != placeholder {
            self.placeholder = placeholder.to_string();
        }
        self.sync_value(value);
        self.view()
    }

    /// Replace the content with an external value when it differs from the
    /// live content. Returns whether the content was replaced. Replacement
    /// does not notify the change listener and clears the undo history.
    pub fn sync_value(&mut self, value: &str) -> bool {
        if value == self.html {
            return false;
        }
        let incoming = RichDocument::from_html(value);
        let canonical = incoming.to_html();
        if canonical == self.html {
            tracing::trace!("external value matches live content");
            return false;
        }

        tracing::debug!(len = value.len(), "replacing content from external value");
        self.document = incoming;
        self.html = canonical;
        let len = self.document.len_chars();
        self.selection = self.selection.map(|sel| sel.clamp(len));
        self.history.clear();
        self.refresh_formatting();
        true
    }

    pub fn view(&self) -> EditorView {
        EditorView {
            html: self.html.clone(),
            placeholder: (self.document.is_empty() && !self.placeholder.is_empty())
                .then(|| self.placeholder.clone()),
            toolbar: toolbar_buttons(&self.formatting),
            link_dialog: self.link_dialog.url().map(|url| LinkDialogView {
                url: url.to_string(),
                placeholder: LINK_URL_PLACEHOLDER,
            }),
        }
    }

    // === Accessors ===

    /// The region's current content.
    pub fn html(&self) -> &str {
        &self.html
    }

    pub fn document(&self) -> &RichDocument {
        &self.document
    }

    pub fn selection(&self) -> Option<Selection> {
        self.selection
    }

    pub fn formatting(&self) -> FormattingState {
        self.formatting
    }

    pub fn link_dialog(&self) -> &LinkDialog {
        &self.link_dialog
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    // === Platform events ===

    pub fn focus(&mut self) {
        self.focused = true;
        self.refresh_formatting();
    }

    /// The last-known selection survives blur so toolbar commands still
    /// apply to it.
    pub fn blur(&mut self) {
        self.focused = false;
    }

    pub fn select(&mut self, selection: Selection) {
        self.selection = Some(selection.clamp(self.document.len_chars()));
        self.refresh_formatting();
    }

    /// Apply an input event. Without a known selection the edit lands at the
    /// end of the document. Returns whether the content changed.
    pub fn input(&mut self, input_type: &InputType, data: Option<&str>) -> bool {
        let Some(action) = input_type.to_action(data, self.edit_range()) else {
            tracing::trace!(?input_type, "input passed through");
            return false;
        };
        self.dispatch(action)
    }

    /// Handle a key press. Enter without Shift breaks the paragraph and is
    /// reported handled so the platform does not insert its own newline.
    pub fn keydown(&mut self, combo: &KeyCombo) -> KeydownResult {
        let range = self.edit_range();
        if combo.key == Key::Enter && !combo.modifiers.shift {
            self.dispatch(EditorAction::InsertParagraph { range });
            return KeydownResult::Handled;
        }
        if let Some(action) = self.keybindings.lookup(combo, range) {
            self.dispatch(action);
            return KeydownResult::Handled;
        }
        if combo.key.is_navigation() || combo.key.is_modifier() {
            return KeydownResult::PassThrough;
        }
        KeydownResult::NotHandled
    }

    /// Run a toolbar command against the last-known selection. Returns
    /// whether the content changed (or, for insert-link, the dialog opened).
    pub fn command(&mut self, command: ToolbarCommand) -> bool {
        self.focused = true;
        let Some(selection) = self.selection else {
            tracing::debug!(command = command.name(), "no selection, command ignored");
            return false;
        };
        tracing::debug!(command = command.name(), ?selection, "toolbar command");

        let range = Range::from(selection);
        let action = match command {
            ToolbarCommand::Bold => EditorAction::ToggleBold { range },
            ToolbarCommand::Italic => EditorAction::ToggleItalic { range },
            ToolbarCommand::Underline => EditorAction::ToggleUnderline { range },
            ToolbarCommand::Heading => EditorAction::ToggleHeading { range },
            ToolbarCommand::BulletList => EditorAction::ToggleUnorderedList { range },
            ToolbarCommand::NumberedList => EditorAction::ToggleOrderedList { range },
            ToolbarCommand::InsertLink => EditorAction::OpenLinkDialog,
            ToolbarCommand::RemoveLink => EditorAction::RemoveLink { range },
        };
        self.dispatch(action)
    }

    // === Link dialog ===

    pub fn open_link_dialog(&mut self) -> bool {
        let opened = self.link_dialog.open(self.selection);
        tracing::debug!(opened, "open link dialog");
        opened
    }

    pub fn link_url_input(&mut self, url: &str) {
        self.link_dialog.set_url(url);
    }

    pub fn cancel_link(&mut self) {
        tracing::debug!("link dialog cancelled");
        self.link_dialog.cancel();
    }

    /// Insert the drafted link. An empty draft keeps the dialog open and
    /// changes nothing. Returns whether the content changed.
    pub fn confirm_link(&mut self) -> bool {
        let Some(url) = self.link_dialog.submit() else {
            tracing::debug!("empty link url, dialog stays open");
            return false;
        };
        tracing::debug!(%url, "inserting link");
        let range = self.edit_range();
        self.apply(EditorAction::InsertLink { range, url })
    }

    // === History ===

    pub fn undo(&mut self) -> bool {
        let current = Snapshot::new(self.document.clone(), self.selection);
        let Some(previous) = self.history.undo(current) else {
            return false;
        };
        tracing::debug!("undo");
        self.restore(previous);
        true
    }

    pub fn redo(&mut self) -> bool {
        let current = Snapshot::new(self.document.clone(), self.selection);
        let Some(next) = self.history.redo(current) else {
            return false;
        };
        tracing::debug!("redo");
        self.restore(next);
        true
    }

    // === Internals ===

    /// The last-known selection, or the document end when there is none.
    fn edit_range(&self) -> Range {
        match self.selection {
            Some(selection) => Range::from(selection),
            None => Range::caret(self.document.len_chars()),
        }
    }

    fn dispatch(&mut self, action: EditorAction) -> bool {
        match action {
            EditorAction::Undo => self.undo(),
            EditorAction::Redo => self.redo(),
            EditorAction::OpenLinkDialog => self.open_link_dialog(),
            action => self.apply(action),
        }
    }

    /// Run a document action, recording history and notifying the listener
    /// when the document changed.
    fn apply(&mut self, action: EditorAction) -> bool {
        let before = self.document.clone();
        let Some(selection) = execute_action(&mut self.document, &action) else {
            tracing::trace!(?action, "action did not apply");
            self.refresh_formatting();
            return false;
        };

        // Keep the selection's direction when the action left its bounds alone.
        let selection = match self.selection {
            Some(old) if old.to_range() == selection.to_range() => old,
            _ => selection,
        };
        let previous = self.selection.replace(selection);

        let changed = self.document != before;
        if changed {
            self.history.record(Snapshot::new(before, previous));
            self.emit_change();
        }
        self.refresh_formatting();
        changed
    }

    fn restore(&mut self, snapshot: Snapshot) {
        self.document = snapshot.document;
        self.selection = snapshot
            .selection
            .map(|sel| sel.clamp(self.document.len_chars()));
        self.emit_change();
        self.refresh_formatting();
    }

    fn emit_change(&mut self) {
        self.html = self.document.to_html();
        if let Some(on_change) = self.on_change.as_mut() {
            on_change(&self.html);
        }
    }

    fn refresh_formatting(&mut self) {
        self.formatting = formatting_state(&self.document, self.selection);
    }
}
