//! lemonade library crate.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the binary entry point in `main.rs` share the same module tree.
//!
//! # What does lemonade do? (for beginners)
//!
//! You are logged into a remote machine over SSH and want to copy some output
//! to your laptop's clipboard, or open a URL in your laptop's browser.  Run
//! `lemonade server` on the laptop, forward its port through SSH
//! (`ssh -R 2489:localhost:2489 remote`), and on the remote machine:
//!
//! ```text
//! some-command | lemonade copy
//! lemonade paste
//! lemonade open https://example.com
//! lemonade open ./report.html        # served to the laptop over HTTP
//! ```
//!
//! Installing lemonade under the names `pbcopy`, `pbpaste` or `xdg-open`
//! makes it behave like those platform tools.
//!
//! If the endpoint cannot be reached, the client starts one in-process on
//! localhost and retries once, so the same commands also work on the desktop
//! itself.
//!
//! # Architecture
//!
//! ```text
//! [lemonade]
//!   ├── application/        Use cases: dispatching an invocation, handling a
//!   │                       request on the endpoint side
//!   └── infrastructure/
//!         ├── transport/    TCP connection + client with local fallback
//!         ├── file_exposure One-shot HTTP server for local files (axum)
//!         ├── server/       Endpoint accept loop and allow-list filter
//!         ├── desktop/      Clipboard (arboard) and browser (open) adapters
//!         └── storage/      ~/.config/lemonade.toml
//! ```

/// Application layer: use cases.
pub mod application;

/// Infrastructure layer: network, HTTP, desktop and configuration adapters.
pub mod infrastructure;
