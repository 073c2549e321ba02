//! Toolbar commands and the view model handed to the host for drawing.

use serde::Serialize;

use crate::formatting::FormattingState;

/// Placeholder shown in the link dialog's URL field.
pub const LINK_URL_PLACEHOLDER: &str = "https://example.com";

/// A toolbar button's command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ToolbarCommand {
    Bold,
    Italic,
    Underline,
    Heading,
    BulletList,
    NumberedList,
    InsertLink,
    RemoveLink,
}

impl ToolbarCommand {
    /// Every command, in toolbar order.
    pub const ALL: [Self; 8] = [
        Self::Bold,
        Self::Italic,
        Self::Underline,
        Self::Heading,
        Self::BulletList,
        Self::NumberedList,
        Self::InsertLink,
        Self::RemoveLink,
    ];

    /// Button tooltip.
    pub fn title(self) -> &'static str {
        match self {
            Self::Bold => "Bold",
            Self::Italic => "Italic",
            Self::Underline => "Underline",
            Self::Heading => "Heading",
            Self::BulletList => "Bullet List",
            Self::NumberedList => "Numbered List",
            Self::InsertLink => "Insert Link",
            Self::RemoveLink => "Remove Link",
        }
    }

    /// Command-line / host name, e.g. `bullet-list`.
    pub fn name(self) -> &'static str {
        match self {
            Self::Bold => "bold",
            Self::Italic => "italic",
            Self::Underline => "underline",
            Self::Heading => "heading",
            Self::BulletList => "bullet-list",
            Self::NumberedList => "numbered-list",
            Self::InsertLink => "link",
            Self::RemoveLink => "unlink",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|command| command.name() == name)
    }

    /// Whether the button shows as active. Link buttons have no state.
    pub fn is_active(self, state: &FormattingState) -> bool {
        match self {
            Self::Bold => state.bold,
            Self::Italic => state.italic,
            Self::Underline => state.underline,
            Self::Heading => state.heading,
            Self::BulletList => state.unordered_list,
            Self::NumberedList => state.ordered_list,
            Self::InsertLink | Self::RemoveLink => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolbarButton {
    pub command: ToolbarCommand,
    pub title: &'static str,
    pub active: bool,
}

/// The open link dialog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkDialogView {
    pub url: String,
    pub placeholder: &'static str,
}

/// What the host draws for one render pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EditorView {
    /// Region content.
    pub html: String,
    /// Present only while the document is empty.
    pub placeholder: Option<String>,
    pub toolbar: Vec<ToolbarButton>,
    /// Present only while the dialog is open.
    pub link_dialog: Option<LinkDialogView>,
}

pub fn toolbar_buttons(state: &FormattingState) -> Vec<ToolbarButton> {
    ToolbarCommand::ALL
        .into_iter()
        .map(|command| ToolbarButton {
            command,
            title: command.title(),
            active: command.is_active(state),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_roundtrip() {
        for command in ToolbarCommand::ALL {
            assert_eq!(ToolbarCommand::from_name(command.name()), Some(command));
        }
        assert_eq!(ToolbarCommand::from_name("strike"), None);
    }

    #[test]
    fn test_buttons_reflect_state() {
        let state = FormattingState {
            italic: true,
            ordered_list: true,
            ..Default::default()
        };
        let active: Vec<_> = toolbar_buttons(&state)
            .into_iter()
            .filter(|b| b.active)
            .map(|b| b.title)
            .collect();
        assert_eq!(active, ["Italic", "Numbered List"]);
    }
}
