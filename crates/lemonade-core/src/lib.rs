//! # lemonade-core
//!
//! Shared library for lemonade containing the invocation model, line-ending
//! conversion, configuration values and the binary wire codec spoken between
//! the client and the endpoint.
//!
//! This crate has zero dependencies on sockets, async runtimes or desktop APIs.
//!
//! # Architecture overview (for beginners)
//!
//! lemonade lets a shell on a remote machine (typically reached over SSH) copy
//! text into, paste text from, and open URLs on the *local* desktop.  A
//! `lemonade server` runs on the desktop machine; the `lemonade` client runs in
//! the remote shell and talks to it through a forwarded TCP port.
//!
//! - **`domain`** – Pure types: which action the user invoked (`open`, `copy`,
//!   `paste`, `server`), how the command line is resolved into that action,
//!   line-ending normalisation, the allow-list of peer addresses, and the
//!   configuration values built once at startup.
//!
//! - **`protocol`** – How requests and responses travel over the network.  A
//!   message is an 8-byte header followed by a small payload.

pub mod domain;
pub mod protocol;

// Re-export the most-used types at the crate root so callers can write
// `lemonade_core::Invocation` instead of `lemonade_core::domain::invocation::Invocation`.
pub use domain::allow::{AllowList, IpRange};
pub use domain::config::{ClientConfig, ServerConfig, TransportEndpoint};
pub use domain::invocation::{
    resolve_command, Action, CommandStyle, Invocation, ResolveError, ResolvedCommand, USAGE,
};
pub use domain::line_ending::{convert_line_ending, LineEnding};
pub use protocol::codec::{decode_message, encode_message, ProtocolError};
pub use protocol::messages::{OpenParams, RpcMessage};
