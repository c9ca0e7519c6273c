//! EndpointService: executes decoded requests on the desktop side.
//!
//! This use case sits at the application layer and delegates to a
//! [`DesktopServices`] trait object for the actual clipboard and browser
//! calls.  The real implementation is in the infrastructure layer.

use std::net::IpAddr;
use std::sync::Arc;

use lemonade_core::{LineEnding, OpenParams, RpcMessage};
use thiserror::Error;
use tracing::{debug, info, warn};
use url::{Host, Url};

/// Error type for desktop operations.
#[derive(Debug, Error)]
pub enum DesktopError {
    #[error("clipboard error: {0}")]
    Clipboard(String),
    #[error("failed to open {uri}: {message}")]
    Browser { uri: String, message: String },
}

/// Desktop capabilities the endpoint needs.
///
/// Implementations are blocking; the server calls them from a blocking task.
pub trait DesktopServices: Send + Sync {
    /// Opens `uri` in the default browser.
    fn open_uri(&self, uri: &str) -> Result<(), DesktopError>;

    /// Replaces the clipboard contents with `text`.
    fn write_clipboard(&self, text: &str) -> Result<(), DesktopError>;

    /// Returns the current clipboard text.
    fn read_clipboard(&self) -> Result<String, DesktopError>;
}

/// Handles one request at a time for a connected peer.
pub struct EndpointService {
    desktop: Arc<dyn DesktopServices>,
    line_ending: Option<LineEnding>,
}

impl EndpointService {
    /// Creates a service.  `line_ending` is applied to copied text before it
    /// reaches the clipboard.
    pub fn new(desktop: Arc<dyn DesktopServices>, line_ending: Option<LineEnding>) -> Self {
        Self {
            desktop,
            line_ending,
        }
    }

    /// Executes `request` on behalf of `peer` and returns the reply to send.
    ///
    /// Desktop failures become [`RpcMessage::Error`]; replies received as
    /// requests are answered with an error as well.
    pub fn handle(&self, request: RpcMessage, peer: IpAddr) -> RpcMessage {
        let method = request.method_name();
        let result = match request {
            RpcMessage::Open(params) => self.open(params, peer).map(|_| RpcMessage::Ack),
            RpcMessage::Copy(text) => self.copy(&text).map(|_| RpcMessage::Ack),
            RpcMessage::Paste => self.desktop.read_clipboard().map(RpcMessage::Text),
            reply => {
                warn!("peer {peer} sent a {} reply as a request", reply.method_name());
                return RpcMessage::Error(format!("{method} is not a request"));
            }
        };

        match result {
            Ok(reply) => reply,
            Err(e) => {
                warn!("{method} from {peer} failed: {e}");
                RpcMessage::Error(e.to_string())
            }
        }
    }

    fn open(&self, params: OpenParams, peer: IpAddr) -> Result<(), DesktopError> {
        let uri = if params.trans_loopback {
            translate_loopback(&params.uri, peer)
        } else {
            params.uri
        };
        info!("opening {uri}");
        self.desktop.open_uri(&uri)
    }

    fn copy(&self, text: &str) -> Result<(), DesktopError> {
        debug!("copying {} bytes", text.len());
        match self.line_ending {
            Some(ending) => self.desktop.write_clipboard(&ending.normalize(text)),
            None => self.desktop.write_clipboard(text),
        }
    }
}

/// Replaces a loopback host in `uri` with `peer`.
///
/// A client on another machine that says "open http://127.0.0.1:8000" means
/// *its* loopback, so the URL is pointed at the client's address instead.
/// URIs that do not parse, have no loopback host, or come from a loopback
/// peer are returned unchanged.
///
/// A rewritten URI is re-serialized by [`Url`], so it comes back normalized:
/// an empty path becomes `/` and the scheme's default port is dropped
/// (`http://127.0.0.1:80` becomes `http://10.0.0.9/`).
///
/// # Examples
///
/// ```rust
/// use lemonade::application::translate_loopback;
///
/// let peer = "192.168.1.20".parse().unwrap();
/// assert_eq!(
///     translate_loopback("http://localhost:8000/index.html", peer),
///     "http://192.168.1.20:8000/index.html"
/// );
/// ```
pub fn translate_loopback(uri: &str, peer: IpAddr) -> String {
    if peer.is_loopback() || is_mapped_loopback(peer) {
        return uri.to_string();
    }

    let mut url = match Url::parse(uri) {
        Ok(url) => url,
        Err(_) => return uri.to_string(),
    };

    let is_loopback_host = match url.host() {
        Some(Host::Domain(domain)) => domain.eq_ignore_ascii_case("localhost"),
        Some(Host::Ipv4(ip)) => ip.is_loopback(),
        Some(Host::Ipv6(ip)) => ip.is_loopback(),
        None => false,
    };
    if !is_loopback_host {
        return uri.to_string();
    }

    match url.set_ip_host(peer) {
        Ok(()) => url.to_string(),
        Err(()) => uri.to_string(),
    }
}

fn is_mapped_loopback(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V6(v6) => v6.to_ipv4_mapped().is_some_and(|v4| v4.is_loopback()),
        IpAddr::V4(_) => false,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
