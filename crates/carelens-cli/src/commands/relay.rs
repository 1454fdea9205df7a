use anyhow::Result;
use tokio::sync::mpsc;

use carelens_relay::RelayServer;

/// Run the callback relay in the foreground.
///
/// A standalone relay has no sign-in attempt to deliver codes to; the
/// receiver is drained so the channel never backs up, and the browser
/// popup contract (confirmation page + cross-window message) still works
/// for an app that opened the popup.
pub async fn run(port: u16) -> Result<()> {
    let (tx, mut rx) = mpsc::channel(8);
    let server = RelayServer::bind(port, tx).await?;
    let port = server.port();

    println!("OAuth callback server running on http://localhost:{port}");
    println!("Callback URL:  http://localhost:{port}");
    println!("Health check:  http://localhost:{port}/health");

    tokio::spawn(async move {
        while let Some(callback) = rx.recv().await {
            tracing::info!(
                state = %callback.state,
                "received callback (no sign-in attempt in this process)"
            );
        }
    });

    server.serve().await?;
    Ok(())
}
