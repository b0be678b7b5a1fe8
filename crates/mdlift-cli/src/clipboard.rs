//! System clipboard access.

use mdlift_core::export::Clipboard;
use mdlift_core::{Error, Result};

/// Clipboard of the current desktop session.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClipboard;

impl Clipboard for SystemClipboard {
    fn set_text(&self, text: &str) -> Result<()> {
        let mut clipboard =
            arboard::Clipboard::new().map_err(|error| Error::Clipboard(error.to_string()))?;
        clipboard
            .set_text(text.to_string())
            .map_err(|error| Error::Clipboard(error.to_string()))
    }
}
