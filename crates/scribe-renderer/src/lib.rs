//! scribe-renderer: prepares editor documents for display outside the editor.
//!
//! The editor emits whatever HTML it was given, including `javascript:` links
//! and foreign markup. Anything rendered outside the editing region goes
//! through [`sanitize`] (or a [`Sanitizer`] with a custom policy) first.

pub mod sanitize;

pub use sanitize::{SanitizeError, SanitizePolicy, Sanitizer, sanitize};
