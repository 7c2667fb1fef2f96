//! Minimal liveness responder.
//!
//! Answers any HTTP request with 200/"ok" so an external supervisor can
//! tell the process is up. Deliberately not a real HTTP server.

use eyre::{Context, Result};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tracing::info;

const RESPONSE: &[u8] = b"HTTP/1.1 200 OK\r\ncontent-type: text/plain\r\ncontent-length: 2\r\n\r\nok";

pub async fn serve(port: u16) -> Result<()> {
    let listener = TcpListener::bind(("0.0.0.0", port))
        .await
        .wrap_err_with(|| format!("failed to bind liveness port {port}"))?;
    info!(port, "liveness responder listening");

    loop {
        let (mut stream, _) = listener.accept().await?;
        tokio::spawn(async move {
            let mut request = [0u8; 512];
            let _ = stream.read(&mut request).await;
            let _ = stream.write_all(RESPONSE).await;
        });
    }
}
