//! Dispatch use case: runs a resolved invocation against an [`ActionClient`].
//!
//! The concrete client (TCP transport with local fallback) lives in the
//! infrastructure layer; tests plug in a recording fake.

use async_trait::async_trait;
use lemonade_core::{Action, Invocation};
use thiserror::Error;
use tracing::debug;

/// Failures surfaced to the user by a client operation.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Neither the configured endpoint nor a locally hosted one could be reached.
    #[error("cannot reach endpoint at {endpoint}: {reason}")]
    TransportFailure { endpoint: String, reason: String },

    /// The connection broke or carried garbage while a call was in flight.
    #[error("connection to endpoint failed: {0}")]
    Connection(String),

    /// The endpoint was reached but the action failed on its side.
    #[error("{0}")]
    RemoteCall(String),

    /// The endpoint answered with a reply that does not fit the request.
    #[error("unexpected reply to {method}: {reply}")]
    UnexpectedReply { method: &'static str, reply: String },

    /// A local file could not be served to the endpoint.
    #[error("failed to serve local file: {0}")]
    FileServe(String),

    /// The endpoint never fetched the exposed file.
    #[error("endpoint did not fetch {url} within {seconds}s")]
    FileFetchTimeout { url: String, seconds: u64 },

    /// `server` is not a client operation.
    #[error("{0:?} is not a client action")]
    NotAClientAction(Action),
}

/// The three remote operations, as seen by the dispatcher.
#[async_trait]
pub trait ActionClient: Send + Sync {
    /// Opens `uri` on the desktop.  When `trans_localfile` is set and `uri`
    /// names an existing local file, the file is served over HTTP first.
    async fn open(
        &self,
        uri: &str,
        trans_localfile: bool,
        trans_loopback: bool,
    ) -> Result<(), ClientError>;

    /// Places `text` on the desktop clipboard.
    async fn copy(&self, text: &str) -> Result<(), ClientError>;

    /// Returns the desktop clipboard text, line endings already converted.
    async fn paste(&self) -> Result<String, ClientError>;
}

/// What a successful dispatch produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// `open` or `copy` finished; nothing to print.
    Done,
    /// `paste` finished; the text goes to stdout.
    Pasted(String),
}

/// Process exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    /// The command completed.
    Success = 0,
    /// The command line or config file could not be parsed.
    FlagParseError = 11,
    /// The endpoint could not be reached or reported a failure.
    RpcError = 12,
    /// Usage was printed because `--help` was given.
    Help = 13,
}

impl ExitStatus {
    pub fn code(self) -> u8 {
        self as u8
    }
}

/// Executes a client invocation.
///
/// # Errors
///
/// Propagates the [`ClientError`] of the underlying operation, and returns
/// [`ClientError::NotAClientAction`] for [`Action::Serve`].
pub async fn dispatch(
    invocation: &Invocation,
    client: &dyn ActionClient,
) -> Result<DispatchOutcome, ClientError> {
    match invocation.action {
        Action::Open => {
            debug!("opening URL");
            client
                .open(
                    &invocation.payload,
                    invocation.trans_localfile,
                    invocation.trans_loopback,
                )
                .await?;
            Ok(DispatchOutcome::Done)
        }
        Action::Copy => {
            debug!("copying text");
            client.copy(&invocation.payload).await?;
            Ok(DispatchOutcome::Done)
        }
        Action::Paste => {
            debug!("pasting text");
            client.paste().await.map(DispatchOutcome::Pasted)
        }
        Action::Serve => Err(ClientError::NotAClientAction(Action::Serve)),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
