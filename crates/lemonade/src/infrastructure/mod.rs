//! Infrastructure layer for lemonade.
//!
//! Contains the OS-facing adapters: TCP transport, the one-shot HTTP file
//! server, the endpoint accept loop, desktop clipboard and browser access,
//! and the config file.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `lemonade_core`, but MUST NOT be imported by the `application` layer.
//!
//! # Sub-modules
//!
//! - **`transport`** – framed request/reply over TCP and the
//!   [`TransportClient`](transport::TransportClient), which falls back to an
//!   in-process endpoint when the configured one is unreachable.
//!
//! - **`file_exposure`** – serves one local file over HTTP exactly once so the
//!   endpoint can open it in a browser.
//!
//! - **`server`** – the endpoint: binds a listener, drops peers outside the
//!   allow-list, and answers requests through
//!   [`EndpointService`](crate::application::EndpointService).
//!
//! - **`desktop`** – `arboard` clipboard and `open` browser adapters, plus a
//!   `MockDesktop` for tests.
//!
//! - **`storage`** – loads `lemonade.toml` from the platform config directory.

pub mod desktop;
pub mod file_exposure;
pub mod server;
pub mod storage;
pub mod transport;
