//! Integration tests for `open` on a local file.
//!
//! The client serves the file over HTTP, sends the endpoint a
//! `http://127.0.0.1:<port>/...` URL, and only reports success once the
//! endpoint side has fetched it.  Here the "browser" is the test itself: it
//! waits for the `MockDesktop` to record the URL, then fetches it.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use lemonade::application::{ActionClient, ClientError};
use lemonade::infrastructure::desktop::MockDesktop;
use lemonade::infrastructure::server::{serve_local, LocalEndpoint};
use lemonade::infrastructure::transport::TransportClient;
use lemonade_core::{ClientConfig, TransportEndpoint};

async fn client_for(desktop: Arc<MockDesktop>, file_timeout: Duration) -> TransportClient {
    let port = serve_local(desktop, None).await.unwrap();
    let config = ClientConfig {
        endpoint: TransportEndpoint::new("127.0.0.1", port),
        no_fallback_messages: true,
        file_fetch_timeout: file_timeout,
        ..Default::default()
    };
    TransportClient::new(config, Arc::new(LocalEndpoint::new(Arc::new(MockDesktop::new()), None)))
}

/// Polls the mock until it has recorded an opened URI.
async fn wait_for_open(desktop: &MockDesktop) -> String {
    for _ in 0..200 {
        if let Some(uri) = desktop.opened().into_iter().next() {
            return uri;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("endpoint never opened a URI");
}

#[tokio::test]
async fn test_open_local_file_completes_after_endpoint_fetches_it() {
    // Arrange
    let mut file = tempfile::Builder::new().suffix(".html").tempfile().unwrap();
    file.write_all(b"<p>report</p>").unwrap();
    let path = file.path().to_string_lossy().to_string();

    let desktop = Arc::new(MockDesktop::new());
    let client = client_for(desktop.clone(), Duration::from_secs(10)).await;

    // Act
    let open_task = tokio::spawn(async move { client.open(&path, true, false).await });
    let uri = wait_for_open(&desktop).await;
    let resp = reqwest::get(&uri).await.unwrap();
    let content_type = resp
        .headers()
        .get("content-type")
        .map(|v| v.to_str().unwrap().to_string());
    let body = resp.bytes().await.unwrap();
    let result = open_task.await.unwrap();

    // Assert
    assert!(uri.starts_with("http://127.0.0.1:"), "got {uri}");
    assert_eq!(&body[..], b"<p>report</p>");
    assert_eq!(content_type.as_deref(), Some("text/html; charset=utf-8"));
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_open_local_file_times_out_when_never_fetched() {
    let file = tempfile::NamedTempFile::new().unwrap();
    let path = file.path().to_string_lossy().to_string();
    let desktop = Arc::new(MockDesktop::new());
    let client = client_for(desktop.clone(), Duration::from_millis(100)).await;

    let err = client.open(&path, true, false).await.unwrap_err();

    assert!(matches!(err, ClientError::FileFetchTimeout { .. }));
    assert_eq!(desktop.opened().len(), 1);
}

#[tokio::test]
async fn test_trans_localfile_off_sends_path_verbatim() {
    let file = tempfile::NamedTempFile::new().unwrap();
    let path = file.path().to_string_lossy().to_string();
    let desktop = Arc::new(MockDesktop::new());
    let client = client_for(desktop.clone(), Duration::from_secs(1)).await;

    client.open(&path, false, false).await.unwrap();

    assert_eq!(desktop.opened(), vec![path]);
}
