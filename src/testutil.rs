//! Shared helpers for unit tests: a canned-response HTTP listener and a
//! ready-to-use client over a temporary store.

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::watch;

use crate::client::http::ApiClient;
use crate::session::{AuthState, SessionNotifier};
use crate::store::CredentialStore;

/// Serve the same status/body to every connection. Returns the base URL.
pub(crate) async fn serve_canned(status: u16, body: &'static str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                break;
            };
            tokio::spawn(async move {
                let mut buf = [0u8; 8192];
                let _ = socket.read(&mut buf).await;
                let reason = reqwest::StatusCode::from_u16(status)
                    .ok()
                    .and_then(|s| s.canonical_reason())
                    .unwrap_or("");
                let response = format!(
                    "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    reason,
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });
    format!("http://{}", addr)
}

/// Accept connections and never respond, for timeout scenarios.
pub(crate) async fn serve_stalled() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                break;
            };
            tokio::spawn(async move {
                let mut buf = [0u8; 8192];
                let _ = socket.read(&mut buf).await;
                tokio::time::sleep(Duration::from_secs(3600)).await;
            });
        }
    });
    format!("http://{}", addr)
}

pub(crate) fn test_client(
    base_url: &str,
) -> (tempfile::TempDir, ApiClient, watch::Receiver<AuthState>) {
    let dir = tempfile::TempDir::new().unwrap();
    let store = Arc::new(CredentialStore::open(dir.path()).unwrap());
    let (notifier, rx) = SessionNotifier::new();
    let api = ApiClient::new(
        base_url.to_string(),
        Duration::from_secs(5),
        store,
        notifier,
    )
    .unwrap();
    (dir, api, rx)
}
