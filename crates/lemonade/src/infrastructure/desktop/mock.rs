//! In-memory desktop for tests.
//!
//! The real desktop touches the user's clipboard and launches a browser,
//! neither of which a test can observe (or should disturb).  `MockDesktop`
//! records every call instead.
//!
//! ```ignore
//! let desktop = Arc::new(MockDesktop::new());
//! let port = serve_local(desktop.clone(), None).await?;
//! // ... drive a client against `port` ...
//! assert_eq!(desktop.copied(), vec!["hello".to_string()]);
//! ```
//!
//! Set `should_fail = true` to make every call return a [`DesktopError`].

use std::sync::Mutex;

use crate::application::{DesktopError, DesktopServices};

/// Records desktop calls without touching the OS.
#[derive(Default)]
pub struct MockDesktop {
    /// Every URI passed to `open_uri`, in order.
    pub opened: Mutex<Vec<String>>,
    /// Every text passed to `write_clipboard`, in order.
    pub copied: Mutex<Vec<String>>,
    /// Current clipboard contents; `write_clipboard` replaces it.
    pub clipboard: Mutex<String>,
    /// When `true`, every method returns an error.
    pub should_fail: bool,
}

impl MockDesktop {
    pub fn new() -> Self {
        Self::default()
    }

    /// A desktop whose clipboard already holds `text`.
    pub fn with_clipboard(text: &str) -> Self {
        Self {
            clipboard: Mutex::new(text.to_string()),
            ..Self::default()
        }
    }

    /// A desktop on which every call fails.
    pub fn failing() -> Self {
        Self {
            should_fail: true,
            ..Self::default()
        }
    }

    /// Snapshot of the URIs opened so far.
    pub fn opened(&self) -> Vec<String> {
        self.opened.lock().map(|v| v.clone()).unwrap_or_default()
    }

    /// Snapshot of the texts copied so far.
    pub fn copied(&self) -> Vec<String> {
        self.copied.lock().map(|v| v.clone()).unwrap_or_default()
    }

    fn check(&self, what: &str) -> Result<(), DesktopError> {
        if self.should_fail {
            Err(DesktopError::Clipboard(format!("mock {what} failure")))
        } else {
            Ok(())
        }
    }
}

impl DesktopServices for MockDesktop {
    fn open_uri(&self, uri: &str) -> Result<(), DesktopError> {
        if self.should_fail {
            return Err(DesktopError::Browser {
                uri: uri.to_string(),
                message: "mock open failure".to_string(),
            });
        }
        if let Ok(mut opened) = self.opened.lock() {
            opened.push(uri.to_string());
        }
        Ok(())
    }

    fn write_clipboard(&self, text: &str) -> Result<(), DesktopError> {
        self.check("write")?;
        if let Ok(mut copied) = self.copied.lock() {
            copied.push(text.to_string());
        }
        if let Ok(mut clipboard) = self.clipboard.lock() {
            *clipboard = text.to_string();
        }
        Ok(())
    }

    fn read_clipboard(&self) -> Result<String, DesktopError> {
        self.check("read")?;
        self.clipboard
            .lock()
            .map(|c| c.clone())
            .map_err(|_| DesktopError::Clipboard("mock clipboard poisoned".to_string()))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
