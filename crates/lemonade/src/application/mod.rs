//! Application layer for lemonade.
//!
//! The application layer knows *what* to do, but delegates *how* to the
//! infrastructure layer through traits.
//!
//! # Responsibilities
//!
//! - Mapping a resolved [`lemonade_core::Invocation`] onto a client operation
//!   and a process exit status ([`dispatch`])
//! - Executing a decoded request on the endpoint side: loopback translation,
//!   line-ending conversion, clipboard and browser calls ([`endpoint_service`])
//!
//! # What does NOT belong here?
//!
//! - Opening sockets or binding listeners
//! - Tokio task spawning
//! - Clipboard or browser libraries

pub mod dispatch;
pub mod endpoint_service;

pub use dispatch::{dispatch, ActionClient, ClientError, DispatchOutcome, ExitStatus};
pub use endpoint_service::{translate_loopback, DesktopError, DesktopServices, EndpointService};
