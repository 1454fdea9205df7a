//! Axum handlers for the callback relay.

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use carelens_auth::AuthCallback;

use crate::server::RelayState;
use crate::templates;

/// Query parameters of the provider redirect.
#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
}

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    port: u16,
    timestamp: String,
}

/// `GET /` — the OAuth callback. With a `code` this forwards the values
/// to the session controller and renders the confirmation page; without
/// one it serves the status page.
pub async fn callback(
    State(relay): State<RelayState>,
    Query(params): Query<CallbackParams>,
) -> impl IntoResponse {
    match params.code {
        Some(code) => {
            let state = params.state.unwrap_or_default();
            tracing::info!("received authorization callback");
            let forwarded = AuthCallback {
                code: code.clone(),
                state: state.clone(),
            };
            if relay.tx.send(forwarded).await.is_err() {
                tracing::warn!("no sign-in attempt is listening for callbacks");
            }
            Html(templates::success_page(&code, &state))
        }
        None => Html(templates::status_page(relay.port)),
    }
}

/// `GET /health` — reachability probe checked before sign-in is offered.
pub async fn health(State(relay): State<RelayState>) -> impl IntoResponse {
    let timestamp = OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_default();
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "OK",
            port: relay.port,
            timestamp,
        }),
    )
}
