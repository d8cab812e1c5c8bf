//! Clipboard module for copy/paste of plain text.
//!
//! Uses the `arboard` crate for cross-platform clipboard access.

use arboard::Clipboard;

/// Error type for clipboard operations.
#[derive(Debug, thiserror::Error)]
pub enum ClipboardError {
    /// Failed to initialize clipboard access.
    #[error("Failed to initialize clipboard: {0}")]
    InitializationFailed(String),

    /// Failed to copy text to clipboard.
    #[error("Failed to copy to clipboard: {0}")]
    CopyFailed(String),

    /// Failed to read text from clipboard.
    #[error("Failed to read clipboard: {0}")]
    ReadFailed(String),
}

/// Copies the given text to the system clipboard.
pub fn copy_to_clipboard(text: &str) -> Result<(), ClipboardError> {
    let mut clipboard =
        Clipboard::new().map_err(|e| ClipboardError::InitializationFailed(e.to_string()))?;

    clipboard
        .set_text(text)
        .map_err(|e| ClipboardError::CopyFailed(e.to_string()))?;

    Ok(())
}

/// Reads the current plain-text clipboard contents.
pub fn read_from_clipboard() -> Result<String, ClipboardError> {
    let mut clipboard =
        Clipboard::new().map_err(|e| ClipboardError::InitializationFailed(e.to_string()))?;

    clipboard
        .get_text()
        .map_err(|e| ClipboardError::ReadFailed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    // Note: Clipboard tests that access the system clipboard are marked
    // #[ignore] because they can crash in headless CI environments.
    // Run them manually with: cargo test -p overtype-app -- --ignored

    #[test]
    #[ignore = "Requires system clipboard access, may crash in CI"]
    fn test_copy_then_read_round_trip() {
        let test_text = "Overtype clipboard test - can be safely ignored";

        match copy_to_clipboard(test_text) {
            Ok(()) => {
                if let Ok(contents) = read_from_clipboard() {
                    assert_eq!(contents, test_text);
                }
            }
            Err(ClipboardError::InitializationFailed(_)) => {
                // Clipboard not available (headless environment)
            }
            Err(e) => {
                panic!("Unexpected clipboard error: {}", e);
            }
        }
    }

    #[test]
    fn test_clipboard_error_display() {
        let init_error = ClipboardError::InitializationFailed("test init".to_string());
        assert!(init_error.to_string().contains("initialize"));
        assert!(init_error.to_string().contains("test init"));

        let read_error = ClipboardError::ReadFailed("test read".to_string());
        assert!(read_error.to_string().contains("read"));
    }
}
