//! Single-request HTTP server for adapter tests.

use std::net::SocketAddr;

use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpListener,
    sync::oneshot,
};

pub(crate) struct OneShotServer {
    addr: SocketAddr,
    request_line: oneshot::Receiver<String>,
}

impl OneShotServer {
    pub(crate) fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    /// First line of the request the server received (`METHOD /path HTTP/1.1`).
    pub(crate) async fn request_line(self) -> String {
        self.request_line.await.unwrap_or_default()
    }
}

/// Accept one connection, read the request head, answer with `response` verbatim.
pub(crate) async fn serve_once(response: &'static str) -> OneShotServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = oneshot::channel();

    tokio::spawn(async move {
        let (mut sock, _) = listener.accept().await.unwrap();
        let mut head = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let n = sock.read(&mut chunk).await.unwrap_or(0);
            if n == 0 {
                break;
            }
            head.extend_from_slice(&chunk[..n]);
            if head.windows(4).any(|w| w == b"\r\n\r\n") {
                break;
            }
        }

        let line = String::from_utf8_lossy(&head)
            .lines()
            .next()
            .unwrap_or("")
            .to_string();
        let _ = tx.send(line);

        let _ = sock.write_all(response.as_bytes()).await;
        let _ = sock.shutdown().await;
    });

    OneShotServer {
        addr,
        request_line: rx,
    }
}
