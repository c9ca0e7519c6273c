//! Client side of the transport, with a one-time local fallback.
//!
//! Every operation dials the configured endpoint afresh.  If that dial fails
//! the client asks a [`LocalEndpointHost`] to start an endpoint in-process,
//! then dials `localhost` on the port it reports.  There is exactly one
//! fallback attempt per call; a second dial failure is final.

use std::io;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use lemonade_core::{ClientConfig, OpenParams, RpcMessage};
use tracing::{debug, info, warn};

use crate::application::{ActionClient, ClientError};
use crate::infrastructure::file_exposure::{self, ExposeError};
use crate::infrastructure::transport::connection::EndpointConnection;

/// Host dialled after a locally hosted endpoint has been started.
const LOCAL_HOST: &str = "localhost";

/// Starts an endpoint inside the current process.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LocalEndpointHost: Send + Sync {
    /// Starts serving and returns the port it listens on.
    async fn host_local(&self) -> io::Result<u16>;
}

/// [`ActionClient`] that talks to an endpoint over TCP.
pub struct TransportClient {
    config: ClientConfig,
    local_host: Arc<dyn LocalEndpointHost>,
}

impl TransportClient {
    pub fn new(config: ClientConfig, local_host: Arc<dyn LocalEndpointHost>) -> Self {
        Self { config, local_host }
    }

    /// Connects to the configured endpoint, falling back once to a local one.
    async fn connect(&self) -> Result<EndpointConnection, ClientError> {
        let endpoint = &self.config.endpoint;
        let dial_error = match EndpointConnection::connect(&endpoint.host, endpoint.port).await {
            Ok(conn) => {
                debug!("connected to {endpoint}");
                return Ok(conn);
            }
            Err(e) => e,
        };

        if !self.config.no_fallback_messages {
            warn!("cannot reach endpoint at {endpoint}: {dial_error}");
            warn!("falling back to a local endpoint");
        }

        let port = self
            .local_host
            .host_local()
            .await
            .map_err(|e| ClientError::TransportFailure {
                endpoint: endpoint.to_string(),
                reason: format!("{dial_error}; local endpoint did not start: {e}"),
            })?;

        EndpointConnection::connect(LOCAL_HOST, port)
            .await
            .map_err(|e| ClientError::TransportFailure {
                endpoint: format!("{LOCAL_HOST}:{port}"),
                reason: e.to_string(),
            })
    }

    /// Sends one request and returns the reply.  Error replies become
    /// [`ClientError::RemoteCall`].
    async fn send(&self, request: RpcMessage) -> Result<RpcMessage, ClientError> {
        let mut conn = self.connect().await?;
        let reply = conn
            .call(&request)
            .await
            .map_err(|e| ClientError::Connection(e.to_string()))?;

        match reply {
            RpcMessage::Error(message) => Err(ClientError::RemoteCall(message)),
            other => Ok(other),
        }
    }
}

fn expect_ack(method: &'static str, reply: RpcMessage) -> Result<(), ClientError> {
    match reply {
        RpcMessage::Ack => Ok(()),
        other => Err(ClientError::UnexpectedReply {
            method,
            reply: other.method_name().to_string(),
        }),
    }
}

#[async_trait]
impl ActionClient for TransportClient {
    async fn open(
        &self,
        uri: &str,
        trans_localfile: bool,
        trans_loopback: bool,
    ) -> Result<(), ClientError> {
        let exposure = if trans_localfile && tokio::fs::metadata(uri).await.is_ok() {
            let exposure = file_exposure::expose(Path::new(uri))
                .await
                .map_err(|e| ClientError::FileServe(e.to_string()))?;
            Some(exposure)
        } else {
            None
        };

        let target = exposure
            .as_ref()
            .map_or_else(|| uri.to_string(), |e| e.url().to_string());
        info!("opening {target}");

        let reply = self
            .send(RpcMessage::Open(OpenParams {
                uri: target.clone(),
                trans_loopback: trans_loopback || trans_localfile,
            }))
            .await?;
        expect_ack("open", reply)?;

        if let Some(exposure) = exposure {
            exposure
                .wait(self.config.file_fetch_timeout)
                .await
                .map_err(|e| match e {
                    ExposeError::Timeout(waited) => ClientError::FileFetchTimeout {
                        url: target,
                        seconds: waited.as_secs(),
                    },
                    other => ClientError::FileServe(other.to_string()),
                })?;
        }
        Ok(())
    }

    async fn copy(&self, text: &str) -> Result<(), ClientError> {
        debug!("sending {} bytes", text.len());
        let reply = self.send(RpcMessage::Copy(text.to_string())).await?;
        expect_ack("copy", reply)
    }

    async fn paste(&self) -> Result<String, ClientError> {
        match self.send(RpcMessage::Paste).await? {
            RpcMessage::Text(text) => Ok(match self.config.line_ending {
                Some(ending) => ending.normalize(&text),
                None => text,
            }),
            other => Err(ClientError::UnexpectedReply {
                method: "paste",
                reply: other.method_name().to_string(),
            }),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
