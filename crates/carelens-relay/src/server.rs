//! Callback relay server setup.

use axum::Router;
use axum::routing::get;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use carelens_auth::AuthCallback;

use crate::error::RelayError;
use crate::handlers;

/// Port the provider redirect URI points at.
pub const DEFAULT_RELAY_PORT: u16 = 3000;

/// Shared handler state: the bound port (reported by `/health` and the
/// status page) and the channel into the session controller.
#[derive(Clone)]
pub struct RelayState {
    pub port: u16,
    pub tx: mpsc::Sender<AuthCallback>,
}

/// Build the relay router.
pub fn app(state: RelayState) -> Router {
    Router::new()
        .route("/", get(handlers::callback))
        .route("/health", get(handlers::health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// A bound (not yet serving) callback relay.
pub struct RelayServer {
    listener: TcpListener,
    state: RelayState,
}

impl RelayServer {
    /// Bind the relay on `127.0.0.1:port`. Pass port 0 to pick a free
    /// port; `port()` reports the actual one.
    pub async fn bind(
        port: u16,
        tx: mpsc::Sender<AuthCallback>,
    ) -> Result<Self, RelayError> {
        let addr = format!("127.0.0.1:{port}");
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| RelayError::Bind {
                addr: addr.clone(),
                source,
            })?;
        let port = listener.local_addr().map(|a| a.port()).unwrap_or(port);
        tracing::info!(port, "callback relay listening");
        Ok(Self {
            listener,
            state: RelayState { port, tx },
        })
    }

    /// The actually bound port.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.state.port
    }

    /// Serve until the process ends or the listener fails.
    pub async fn serve(self) -> Result<(), RelayError> {
        let router = app(self.state);
        axum::serve(self.listener, router).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use time::OffsetDateTime;
    use time::format_description::well_known::Rfc3339;

    async fn spawn_relay() -> (u16, mpsc::Receiver<AuthCallback>) {
        let (tx, rx) = mpsc::channel(8);
        let server = RelayServer::bind(0, tx).await.unwrap();
        let port = server.port();
        tokio::spawn(server.serve());
        (port, rx)
    }

    #[tokio::test]
    async fn health_reports_status_port_and_timestamp() {
        let (port, _rx) = spawn_relay().await;

        let body: Value = reqwest::get(format!("http://127.0.0.1:{port}/health"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();

        assert_eq!(body["status"], "OK");
        assert_eq!(body["port"], u64::from(port));
        let timestamp = body["timestamp"].as_str().unwrap();
        assert!(OffsetDateTime::parse(timestamp, &Rfc3339).is_ok());
    }

    #[tokio::test]
    async fn callback_forwards_code_and_state() {
        let (port, mut rx) = spawn_relay().await;

        let response = reqwest::get(format!(
            "http://127.0.0.1:{port}/?code=code-123&state=state-abc"
        ))
        .await
        .unwrap();
        assert!(response.status().is_success());
        let body = response.text().await.unwrap();
        assert!(body.contains("EPIC_AUTH_SUCCESS"));
        assert!(body.contains("code-123"));
        assert!(body.contains("state-abc"));

        let forwarded = rx.recv().await.unwrap();
        assert_eq!(forwarded.code, "code-123");
        assert_eq!(forwarded.state, "state-abc");
    }

    #[tokio::test]
    async fn bare_request_serves_status_page() {
        let (port, mut rx) = spawn_relay().await;

        let body = reqwest::get(format!("http://127.0.0.1:{port}/"))
            .await
            .unwrap()
            .text()
            .await
            .unwrap();

        assert!(body.contains("ready to handle OAuth callbacks"));
        assert!(!body.contains("EPIC_AUTH_SUCCESS"));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn relay_satisfies_sign_in_probe() {
        use carelens_auth::{AuthError, BrowserOpener, ProviderConfig, SessionController};
        use std::sync::Arc;
        use url::Url;

        struct NoopOpener;
        impl BrowserOpener for NoopOpener {
            fn open(&self, _url: &Url) -> Result<(), AuthError> {
                Ok(())
            }
        }

        let (port, _rx) = spawn_relay().await;
        let config = ProviderConfig::epic_sandbox()
            .with_redirect_uri(Url::parse(&format!("http://127.0.0.1:{port}")).unwrap());
        let controller = SessionController::new(config, Arc::new(NoopOpener));

        // The probe stays enabled here; sign-in proceeds because the
        // relay answers /health.
        let url = controller.sign_in().await.unwrap();
        assert!(url.as_str().contains("code_challenge"));
    }
}
