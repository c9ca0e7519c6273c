//! The endpoint: accept loop, allow-list filter and per-connection tasks.
//!
//! Each accepted connection runs in its own Tokio task and may carry any
//! number of sequential requests.  Desktop calls block (clipboard libraries
//! talk to the display server synchronously), so each request is executed on
//! the blocking pool.

use std::io;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use async_trait::async_trait;
use lemonade_core::{AllowList, LineEnding, ServerConfig};
use thiserror::Error;
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, error, info, warn};

use crate::application::{DesktopServices, EndpointService};
use crate::infrastructure::transport::{read_message, write_message, LocalEndpointHost};

/// Errors that stop the endpoint.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind endpoint on {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Serves on `0.0.0.0:<port>` until the returned future is dropped.
///
/// # Errors
///
/// Returns [`ServerError::Bind`] if the port cannot be bound.
pub async fn serve(
    config: ServerConfig,
    desktop: Arc<dyn DesktopServices>,
) -> Result<(), ServerError> {
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })?;
    info!("endpoint listening on {addr}");

    let service = Arc::new(EndpointService::new(desktop, config.line_ending));
    run_accept_loop(listener, service, Arc::new(config.allow)).await;
    Ok(())
}

/// Starts a loopback-only endpoint on an OS-assigned port and returns the port.
///
/// The accept loop runs on a background task for the rest of the process.
pub async fn serve_local(
    desktop: Arc<dyn DesktopServices>,
    line_ending: Option<LineEnding>,
) -> io::Result<u16> {
    let listener = TcpListener::bind(("127.0.0.1", 0)).await?;
    let port = listener.local_addr()?.port();
    info!("local endpoint listening on 127.0.0.1:{port}");

    let service = Arc::new(EndpointService::new(desktop, line_ending));
    tokio::spawn(run_accept_loop(
        listener,
        service,
        Arc::new(AllowList::loopback()),
    ));
    Ok(port)
}

/// Accepts connections forever, dropping peers outside `allow`.
pub async fn run_accept_loop(
    listener: TcpListener,
    service: Arc<EndpointService>,
    allow: Arc<AllowList>,
) {
    loop {
        match listener.accept().await {
            Ok((stream, peer)) => {
                if !allow.allows(peer.ip()) {
                    warn!("rejecting connection from {peer}: not in allow-list");
                    drop(stream);
                    continue;
                }
                debug!("accepted connection from {peer}");
                let service = Arc::clone(&service);
                tokio::spawn(async move {
                    handle_connection(stream, peer, service).await;
                });
            }
            Err(e) => {
                // Transient (e.g. too many open files); keep accepting.
                error!("accept error: {e}");
            }
        }
    }
}

/// Falls back to an in-process endpoint using the given desktop.
pub struct LocalEndpoint {
    desktop: Arc<dyn DesktopServices>,
    line_ending: Option<LineEnding>,
}

impl LocalEndpoint {
    pub fn new(desktop: Arc<dyn DesktopServices>, line_ending: Option<LineEnding>) -> Self {
        Self {
            desktop,
            line_ending,
        }
    }
}

#[async_trait]
impl LocalEndpointHost for LocalEndpoint {
    async fn host_local(&self) -> io::Result<u16> {
        serve_local(Arc::clone(&self.desktop), self.line_ending).await
    }
}

// ── Per-connection handler ────────────────────────────────────────────────────

async fn handle_connection(mut stream: TcpStream, peer: SocketAddr, service: Arc<EndpointService>) {
    let peer_ip: IpAddr = peer.ip().to_canonical();

    loop {
        let request = match read_message(&mut stream).await {
            Ok(Some(request)) => request,
            Ok(None) => {
                debug!("connection from {peer} closed");
                return;
            }
            Err(e) => {
                warn!("dropping connection from {peer}: {e}");
                return;
            }
        };

        let svc = Arc::clone(&service);
        let reply = match tokio::task::spawn_blocking(move || svc.handle(request, peer_ip)).await {
            Ok(reply) => reply,
            Err(e) => {
                error!("request handler for {peer} panicked: {e}");
                return;
            }
        };

        if let Err(e) = write_message(&mut stream, &reply).await {
            warn!("failed to reply to {peer}: {e}");
            return;
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use lemonade_core::RpcMessage;

    use crate::infrastructure::desktop::MockDesktop;
    use crate::infrastructure::transport::EndpointConnection;

    #[tokio::test]
    async fn test_serve_local_answers_sequential_requests_on_one_connection() {
        // Arrange
        let desktop = Arc::new(MockDesktop::new());
        let port = serve_local(desktop.clone(), None).await.unwrap();
        let mut conn = EndpointConnection::connect("127.0.0.1", port).await.unwrap();

        // Act
        let copy_reply = conn.call(&RpcMessage::Copy("one".to_string())).await.unwrap();
        let paste_reply = conn.call(&RpcMessage::Paste).await.unwrap();

        // Assert
        assert_eq!(copy_reply, RpcMessage::Ack);
        assert_eq!(paste_reply, RpcMessage::Text("one".to_string()));
    }

    #[tokio::test]
    async fn test_peer_outside_allow_list_is_disconnected() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let service = Arc::new(EndpointService::new(Arc::new(MockDesktop::new()), None));
        let allow = Arc::new(AllowList::parse("10.0.0.0/8").unwrap());
        tokio::spawn(run_accept_loop(listener, service, allow));

        let mut conn = EndpointConnection::connect("127.0.0.1", port).await.unwrap();
        let result = conn.call(&RpcMessage::Paste).await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_local_endpoint_host_applies_line_ending_to_copy() {
        let desktop = Arc::new(MockDesktop::new());
        let host = LocalEndpoint::new(desktop.clone(), Some(LineEnding::Crlf));
        let port = host.host_local().await.unwrap();

        let mut conn = EndpointConnection::connect("127.0.0.1", port).await.unwrap();
        conn.call(&RpcMessage::Copy("a\nb".to_string())).await.unwrap();

        assert_eq!(desktop.copied(), vec!["a\r\nb".to_string()]);
    }

    #[tokio::test]
    async fn test_serve_reports_bind_failure() {
        let taken = TcpListener::bind("0.0.0.0:0").await.unwrap();
        let config = ServerConfig {
            port: taken.local_addr().unwrap().port(),
            ..Default::default()
        };

        let err = serve(config, Arc::new(MockDesktop::new())).await.unwrap_err();

        assert!(matches!(err, ServerError::Bind { .. }));
    }
}
