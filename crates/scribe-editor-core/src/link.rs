//! Link insertion dialog state.

use smol_str::SmolStr;

use crate::types::Selection;

/// The link dialog: closed, or open with a draft URL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LinkDialog {
    #[default]
    Closed,
    Open { url: SmolStr },
}

impl LinkDialog {
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open { .. })
    }

    /// The draft URL while open.
    pub fn url(&self) -> Option<&str> {
        match self {
            Self::Open { url } => Some(url.as_str()),
            Self::Closed => None,
        }
    }

    /// Open with an empty draft. Only a non-empty selection opens the
    /// dialog; returns whether it opened.
    pub fn open(&mut self, selection: Option<Selection>) -> bool {
        if !selection.is_some_and(|sel| !sel.is_collapsed()) {
            return false;
        }
        *self = Self::Open {
            url: SmolStr::default(),
        };
        true
    }

    /// Replace the draft URL. Ignored while closed.
    pub fn set_url(&mut self, value: &str) {
        if let Self::Open { url } = self {
            *url = value.into();
        }
    }

    /// Close and discard the draft.
    pub fn cancel(&mut self) {
        *self = Self::Closed;
    }

    /// Take the draft URL and close. With an empty draft the dialog stays
    /// open and nothing is returned.
    pub fn submit(&mut self) -> Option<SmolStr> {
        match self {
            Self::Open { url } if !url.is_empty() => {
                let url = std::mem::take(url);
                *self = Self::Closed;
                Some(url)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_requires_selection() {
        let mut dialog = LinkDialog::default();
        assert!(!dialog.open(None));
        assert!(!dialog.open(Some(Selection::collapsed(3))));
        assert_eq!(dialog, LinkDialog::Closed);

        assert!(dialog.open(Some(Selection::new(5, 2))));
        assert_eq!(dialog.url(), Some(""));
    }

    #[test]
    fn test_submit_empty_stays_open() {
        let mut dialog = LinkDialog::default();
        dialog.open(Some(Selection::new(0, 1)));
        assert_eq!(dialog.submit(), None);
        assert!(dialog.is_open());
    }

    #[test]
    fn test_submit_takes_url_and_closes() {
        let mut dialog = LinkDialog::default();
        dialog.open(Some(Selection::new(0, 1)));
        dialog.set_url("https://exa");
        dialog.set_url("https://example.com");
        assert_eq!(dialog.submit().as_deref(), Some("https://example.com"));
        assert_eq!(dialog, LinkDialog::Closed);
    }

    #[test]
    fn test_cancel_discards_draft() {
        let mut dialog = LinkDialog::default();
        dialog.open(Some(Selection::new(0, 1)));
        dialog.set_url("https://example.com");
        dialog.cancel();
        assert_eq!(dialog.url(), None);

        // typing while closed does nothing
        dialog.set_url("x");
        assert_eq!(dialog, LinkDialog::Closed);
    }
}
