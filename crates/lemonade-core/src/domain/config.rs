//! Runtime configuration values.
//!
//! [`ClientConfig`] and [`ServerConfig`] are built exactly once at startup
//! (from command-line flags layered over the configuration file) and then
//! passed by value or `Arc` to every component that needs them.  Nothing in
//! lemonade reads configuration from process-wide globals.

use std::fmt;
use std::time::Duration;

use crate::domain::allow::AllowList;
use crate::domain::line_ending::LineEnding;

/// Default TCP port of the endpoint.
pub const DEFAULT_PORT: u16 = 2489;

/// Default endpoint host name.
pub const DEFAULT_HOST: &str = "localhost";

/// Default time the client waits for the endpoint to fetch an exposed file.
pub const DEFAULT_FILE_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Address of the endpoint the client talks to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportEndpoint {
    pub host: String,
    pub port: u16,
}

impl TransportEndpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl Default for TransportEndpoint {
    fn default() -> Self {
        Self::new(DEFAULT_HOST, DEFAULT_PORT)
    }
}

impl fmt::Display for TransportEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Everything the client side needs to reach the endpoint.
///
/// # Example
///
/// ```rust
/// use lemonade_core::ClientConfig;
///
/// let cfg = ClientConfig::default();
/// assert_eq!(cfg.endpoint.to_string(), "localhost:2489");
/// assert!(cfg.line_ending.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Where the endpoint is expected to listen.
    pub endpoint: TransportEndpoint,
    /// Conversion applied to pasted text (and to copied text by a locally
    /// hosted fallback endpoint).  `None` leaves text untouched.
    pub line_ending: Option<LineEnding>,
    /// Suppress the diagnostic logged before falling back to a local endpoint.
    pub no_fallback_messages: bool,
    /// Upper bound on the wait for an exposed file to be fetched.
    pub file_fetch_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: TransportEndpoint::default(),
            line_ending: None,
            no_fallback_messages: false,
            file_fetch_timeout: DEFAULT_FILE_FETCH_TIMEOUT,
        }
    }
}

/// Settings of the endpoint (`lemonade server`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// TCP port to listen on (all interfaces).
    pub port: u16,
    /// Peers outside these ranges are disconnected immediately.
    pub allow: AllowList,
    /// Conversion applied to text before it is written to the clipboard.
    pub line_ending: Option<LineEnding>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            allow: AllowList::default(),
            line_ending: None,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
