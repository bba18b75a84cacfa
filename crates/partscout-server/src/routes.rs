use std::sync::Arc;

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::middleware;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use tracing::Instrument;
use uuid::Uuid;

use partscout_core::ReplyHandle;

use crate::dto::{HealthResponse, WebhookRequest};
use crate::error::ApiError;
use crate::signature::require_signature;
use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    let webhook = Router::new()
        .route("/webhook", post(webhook))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_signature,
        ));

    let public = Router::new().route("/health", get(health));

    Router::new()
        .merge(webhook)
        .merge(public)
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Webhook
// ---------------------------------------------------------------------------

/// Acknowledge a LINE webhook call and answer its text messages in the background.
///
/// LINE expects a quick 200; a search takes several seconds, so each query
/// runs as its own task and replies through the messaging API when done.
pub async fn webhook(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let payload: WebhookRequest = serde_json::from_slice(&body)?;

    let mut accepted = 0usize;
    for event in &payload.events {
        match event.text_message() {
            Some((text, handle)) => {
                spawn_reply(state.clone(), text.to_string(), handle);
                accepted += 1;
            }
            None => tracing::debug!(kind = %event.kind, "Ignoring non-text event"),
        }
    }

    tracing::info!(events = payload.events.len(), accepted, "Webhook received");
    Ok((StatusCode::OK, "OK"))
}

fn spawn_reply(state: Arc<AppState>, text: String, handle: ReplyHandle) {
    let query_id = Uuid::new_v4();
    let span = tracing::info_span!("query", %query_id);

    tokio::spawn(
        async move {
            match state
                .responder
                .respond_and_send(&text, &handle, &state.messenger)
                .await
            {
                Ok(blocks) => tracing::info!(blocks, "Reply delivered"),
                Err(e) => tracing::error!(error = %e, "Reply delivery failed"),
            }
        }
        .instrument(span),
    );
}

// ---------------------------------------------------------------------------
// System
// ---------------------------------------------------------------------------

pub async fn health() -> impl IntoResponse {
    axum::Json(HealthResponse { status: "healthy" })
}
