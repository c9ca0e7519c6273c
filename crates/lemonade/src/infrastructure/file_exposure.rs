//! One-shot HTTP exposure of a local file.
//!
//! `lemonade open ./report.html` on a remote shell cannot hand the desktop a
//! path it can read, so the client serves the file over HTTP and asks the
//! endpoint to open `http://127.0.0.1:<port>/<path>` instead (the endpoint
//! rewrites `127.0.0.1` to the client's address).
//!
//! The server answers exactly one request.  Whatever happens to that request,
//! the completion signal fires once and the listener shuts down.  Later
//! requests that still reach it get `410 Gone`.

use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Router;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::{oneshot, Notify};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use url::Url;

/// Errors raised while exposing a file.
#[derive(Debug, Error)]
pub enum ExposeError {
    /// The HTTP listener could not be bound.
    #[error("failed to bind file server: {0}")]
    Bind(#[source] std::io::Error),

    /// The exposure URL could not be built.
    #[error("failed to build file URL: {0}")]
    Url(#[from] url::ParseError),

    /// The file was requested but could not be read.
    #[error("failed to read {path}: {message}")]
    Read { path: String, message: String },

    /// The HTTP server stopped with an error before serving the file.
    #[error("file server failed: {0}")]
    Server(String),

    /// Nobody fetched the file in time.
    #[error("file was not fetched within {0:?}")]
    Timeout(Duration),

    /// The server task went away without reporting an outcome.
    #[error("file server stopped without serving the file")]
    Abandoned,
}

/// A file being served until its first request.
pub struct FileExposure {
    url: String,
    port: u16,
    completion: oneshot::Receiver<Result<(), ExposeError>>,
    _task: ServeTask,
}

impl FileExposure {
    /// The URL the endpoint should open.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// The OS-assigned port the file server listens on.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Waits until the file has been served, or `timeout` elapses.
    ///
    /// The server is torn down when this returns.
    ///
    /// # Errors
    ///
    /// Returns [`ExposeError::Timeout`] if no request arrived in time, and
    /// the serving error ([`ExposeError::Read`], [`ExposeError::Server`])
    /// otherwise.
    pub async fn wait(self, timeout: Duration) -> Result<(), ExposeError> {
        match tokio::time::timeout(timeout, self.completion).await {
            Err(_) => Err(ExposeError::Timeout(timeout)),
            Ok(Err(_)) => Err(ExposeError::Abandoned),
            Ok(Ok(outcome)) => outcome,
        }
    }
}

/// Aborts the server task when the exposure is dropped.
struct ServeTask(JoinHandle<()>);

impl Drop for ServeTask {
    fn drop(&mut self) {
        self.0.abort();
    }
}

struct ExposureState {
    path: PathBuf,
    served: AtomicBool,
    outcome: Mutex<Option<Result<(), ExposeError>>>,
    shutdown: Notify,
}

/// Starts serving `path` on an OS-assigned port on all interfaces.
///
/// The listener is bound before this returns, so the URL is reachable as soon
/// as the caller has it.
///
/// # Errors
///
/// Returns [`ExposeError::Bind`] if no port could be bound.
pub async fn expose(path: &Path) -> Result<FileExposure, ExposeError> {
    let listener = TcpListener::bind("0.0.0.0:0")
        .await
        .map_err(ExposeError::Bind)?;
    let port = listener.local_addr().map_err(ExposeError::Bind)?.port();
    let url = exposure_url(port, path)?;

    let state = Arc::new(ExposureState {
        path: path.to_path_buf(),
        served: AtomicBool::new(false),
        outcome: Mutex::new(None),
        shutdown: Notify::new(),
    });
    let app = Router::new()
        .fallback(serve_file)
        .with_state(Arc::clone(&state));

    let (tx, rx) = oneshot::channel();
    let task = tokio::spawn(async move {
        let shutdown_state = Arc::clone(&state);
        let result = axum::serve(listener, app)
            .with_graceful_shutdown(async move { shutdown_state.shutdown.notified().await })
            .await;

        let outcome = match result {
            Ok(()) => take_outcome(&state),
            Err(e) => Err(ExposeError::Server(e.to_string())),
        };
        debug!("file server on port {port} stopped");
        let _ = tx.send(outcome);
    });

    info!("serving {} at {url}", path.display());
    Ok(FileExposure {
        url,
        port,
        completion: rx,
        _task: ServeTask(task),
    })
}

fn take_outcome(state: &ExposureState) -> Result<(), ExposeError> {
    match state.outcome.lock() {
        Ok(mut slot) => slot.take().unwrap_or(Err(ExposeError::Abandoned)),
        Err(_) => Err(ExposeError::Abandoned),
    }
}

async fn serve_file(State(state): State<Arc<ExposureState>>) -> Response {
    if state.served.swap(true, Ordering::SeqCst) {
        debug!("rejecting repeated request for {}", state.path.display());
        return (StatusCode::GONE, "already served").into_response();
    }

    let (response, outcome) = match tokio::fs::read(&state.path).await {
        Ok(bytes) => {
            debug!("serving {} bytes from {}", bytes.len(), state.path.display());
            let content_type = content_type_for(&state.path);
            (
                ([(header::CONTENT_TYPE, content_type)], bytes).into_response(),
                Ok(()),
            )
        }
        Err(e) => {
            warn!("cannot read {}: {e}", state.path.display());
            (
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
                Err(ExposeError::Read {
                    path: state.path.display().to_string(),
                    message: e.to_string(),
                }),
            )
        }
    };

    if let Ok(mut slot) = state.outcome.lock() {
        *slot = Some(outcome);
    }
    // Graceful shutdown lets this response finish before the server exits.
    state.shutdown.notify_one();
    response
}

/// Builds `http://127.0.0.1:<port>/<path segments>`.
fn exposure_url(port: u16, path: &Path) -> Result<String, ExposeError> {
    let mut url = Url::parse(&format!("http://127.0.0.1:{port}/"))?;
    if let Ok(mut segments) = url.path_segments_mut() {
        segments.pop_if_empty();
        for component in path.components() {
            if let Component::Normal(part) = component {
                segments.push(&part.to_string_lossy());
            }
        }
    }
    Ok(url.to_string())
}

fn content_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "html" | "htm" => "text/html; charset=utf-8",
        "txt" | "md" | "log" => "text/plain; charset=utf-8",
        "css" => "text/css; charset=utf-8",
        "js" => "text/javascript; charset=utf-8",
        "json" => "application/json",
        "svg" => "image/svg+xml",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "pdf" => "application/pdf",
        _ => "application/octet-stream",
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
