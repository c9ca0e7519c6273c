//! Desktop adapters: the system clipboard and default browser.
//!
//! `SystemDesktop` is what `lemonade server` (and the local fallback) use.
//! `MockDesktop` is provided for tests.
//!
//! On X11 and Wayland the clipboard content is owned by a process and is gone
//! once that process stops serving it.  `SystemDesktop` therefore keeps one
//! `arboard::Clipboard` alive for as long as the endpoint runs.  The local
//! fallback endpoint dies with the client process, so there a copy blocks
//! until another application takes the selection over.

pub mod mock;

use std::sync::{Mutex, MutexGuard};

use arboard::Clipboard;
#[cfg(target_os = "linux")]
use arboard::SetExtLinux;
use tracing::{debug, warn};

use crate::application::{DesktopError, DesktopServices};

pub use mock::MockDesktop;

/// The user's real clipboard (via `arboard`) and browser (via `open`).
///
/// The clipboard handle is opened on first use, so a headless machine can
/// still start an endpoint and fail per request instead of at startup.
#[derive(Default)]
pub struct SystemDesktop {
    clipboard: Mutex<Option<Clipboard>>,
    #[cfg_attr(not(target_os = "linux"), allow(dead_code))]
    hand_off: bool,
}

impl SystemDesktop {
    /// Desktop for a long-running endpoint (`lemonade server`).
    pub fn new() -> Self {
        Self::default()
    }

    /// Desktop for the in-process fallback endpoint.
    ///
    /// On Linux, `write_clipboard` does not return until another application
    /// owns the clipboard, so the copied text survives the process exiting.
    pub fn short_lived() -> Self {
        Self {
            clipboard: Mutex::new(None),
            hand_off: true,
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Option<Clipboard>>, DesktopError> {
        self.clipboard
            .lock()
            .map_err(|_| DesktopError::Clipboard("clipboard lock poisoned".to_string()))
    }

    /// Runs `f` on the held clipboard, opening it first if needed.
    ///
    /// A failed call drops the handle so the next request reconnects.
    fn with_clipboard<T>(
        &self,
        f: impl FnOnce(&mut Clipboard) -> Result<T, arboard::Error>,
    ) -> Result<T, DesktopError> {
        let mut slot = self.lock()?;
        let mut clipboard = match slot.take() {
            Some(clipboard) => clipboard,
            None => {
                debug!("opening system clipboard");
                Clipboard::new().map_err(|e| DesktopError::Clipboard(e.to_string()))?
            }
        };

        match f(&mut clipboard) {
            Ok(value) => {
                *slot = Some(clipboard);
                Ok(value)
            }
            Err(e) => {
                warn!("clipboard call failed, reopening on next use: {e}");
                Err(DesktopError::Clipboard(e.to_string()))
            }
        }
    }
}

impl DesktopServices for SystemDesktop {
    fn open_uri(&self, uri: &str) -> Result<(), DesktopError> {
        debug!("launching browser for {uri}");
        open::that(uri).map_err(|e| DesktopError::Browser {
            uri: uri.to_string(),
            message: e.to_string(),
        })
    }

    fn write_clipboard(&self, text: &str) -> Result<(), DesktopError> {
        self.with_clipboard(|clipboard| {
            let set = clipboard.set();
            #[cfg(target_os = "linux")]
            let set = if self.hand_off { set.wait() } else { set };
            set.text(text)
        })
    }

    fn read_clipboard(&self) -> Result<String, DesktopError> {
        self.with_clipboard(|clipboard| clipboard.get_text())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
