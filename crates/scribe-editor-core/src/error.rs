//! Error types for the editor core. Editing itself never fails; only loading
//! configuration can.

use miette::Diagnostic;

/// Main error type for editor configuration.
#[derive(thiserror::Error, Debug, Diagnostic)]
pub enum EditorError {
    /// Config JSON could not be decoded
    #[error("failed to read editor config: {0}")]
    #[diagnostic(
        code(scribe::config),
        help("the config is a JSON object with `max_undo_steps` and `keybindings`")
    )]
    Config(#[from] serde_json::Error),

    /// Config decoded but holds an unusable value
    #[error("invalid editor config: {0}")]
    #[diagnostic(code(scribe::config::invalid))]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, EditorError>;
