use std::sync::Arc;

use axum::{
    Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::post,
};
use tokio::sync::mpsc;

use crate::error::{SignatureError, WebhookError};
use crate::types::Update;

use super::service::WebhookVerifier;
use super::signature::ZALO_SIGNATURE_HEADER;

/// Route used when the configured path is blank.
pub const DEFAULT_WEBHOOK_PATH: &str = "/zalo/webhook";

/// Built webhook ingress: router plus the path it serves.
pub struct WebhookApp {
    /// Axum router serving `POST path`.
    pub app: Router,
    /// Normalized route path.
    pub path: String,
}

#[derive(Clone)]
struct WebhookState {
    verifier: Arc<WebhookVerifier>,
    tx: mpsc::Sender<Update>,
}

/// Router that verifies, parses and forwards webhook updates into `tx`.
///
/// Responses: 200 after enqueue, 401 for missing or forged signatures, 400 for
/// empty or unparseable bodies, 500 when no secret is configured, 503 when the
/// receiving side of `tx` is gone.
pub fn build_webhook_app(
    path: &str,
    verifier: WebhookVerifier,
    tx: mpsc::Sender<Update>,
) -> WebhookApp {
    if !verifier.has_secret() {
        tracing::warn!("Webhook secret is not configured; every request will be rejected");
    }
    let path = normalize_webhook_path(path);
    let state = WebhookState {
        verifier: Arc::new(verifier),
        tx,
    };
    let app = Router::new()
        .route(&path, post(webhook_handler))
        .with_state(state);
    WebhookApp { app, path }
}

fn normalize_webhook_path(path: &str) -> String {
    let trimmed = path.trim();
    if trimmed.is_empty() {
        DEFAULT_WEBHOOK_PATH.to_string()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}

fn rejection_status(error: &WebhookError) -> StatusCode {
    match error {
        WebhookError::Rejected(SignatureError::EmptySecret) => StatusCode::INTERNAL_SERVER_ERROR,
        WebhookError::Rejected(SignatureError::EmptyPayload) => StatusCode::BAD_REQUEST,
        WebhookError::Rejected(_) => StatusCode::UNAUTHORIZED,
        _ => StatusCode::BAD_REQUEST,
    }
}

async fn webhook_handler(
    State(state): State<WebhookState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, (StatusCode, String)> {
    if !state.verifier.has_secret() {
        tracing::error!("Webhook secret is not configured");
        return Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            SignatureError::EmptySecret.to_string(),
        ));
    }
    let signature = headers
        .get(ZALO_SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();

    let update = state.verifier.process(&body, signature).map_err(|error| {
        let status = rejection_status(&error);
        tracing::warn!(status = %status, error = %error, "Rejected webhook request");
        (status, error.to_string())
    })?;

    tracing::info!(update_id = update.update_id, "Webhook received update");
    if state.tx.send(update).await.is_err() {
        tracing::error!("Webhook update queue unavailable");
        return Err((
            StatusCode::SERVICE_UNAVAILABLE,
            "update queue unavailable".to_string(),
        ));
    }
    Ok(StatusCode::OK)
}
