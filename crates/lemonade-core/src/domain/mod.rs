//! Domain layer for lemonade.
//!
//! Pure business-logic types with no dependencies on I/O, networking or
//! desktop frameworks.
//!
//! # What belongs in the domain layer?
//!
//! - The resolved [`invocation::Invocation`] and the resolver that builds it
//! - Line-ending normalisation
//! - Configuration values (endpoint address, allow-list, timeouts)
//!
//! # What does NOT belong here?
//!
//! - Any `tokio`, `TcpStream` or HTTP types
//! - Reading the configuration file or environment variables
//! - Clipboard or browser access

pub mod allow;
pub mod config;
pub mod invocation;
pub mod line_ending;

pub use config::{ClientConfig, ServerConfig, TransportEndpoint};
pub use invocation::{Action, Invocation};
pub use line_ending::LineEnding;
