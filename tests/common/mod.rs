//! Shared utilities for integration tests.

use std::net::SocketAddr;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

/// Start a one-shot peer that reads a request until the client half-closes,
/// replies with a fixed response and hands the captured bytes back.
pub async fn start_capture_peer(response: &'static str) -> (SocketAddr, oneshot::Receiver<Vec<u8>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = oneshot::channel();

    tokio::spawn(async move {
        if let Ok((mut socket, _)) = listener.accept().await {
            let mut captured = Vec::new();
            let _ = socket.read_to_end(&mut captured).await;
            let _ = socket.write_all(response.as_bytes()).await;
            let _ = socket.shutdown().await;
            let _ = tx.send(captured);
        }
    });

    (addr, rx)
}
