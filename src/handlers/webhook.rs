use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::errors::AppError;
use crate::models::{WebhookEvent, WebhookPayload};
use crate::services::messaging::ReplyToken;
use crate::state::AppState;

pub const SIGNATURE_HEADER: &str = "x-line-signature";

/// base64(HMAC-SHA256(channel secret, raw body)), compared in constant time.
pub fn verify_signature(channel_secret: &str, body: &[u8], signature: &str) -> bool {
    let Ok(expected) = base64::engine::general_purpose::STANDARD.decode(signature.trim()) else {
        return false;
    };

    let mut mac = match Hmac::<Sha256>::new_from_slice(channel_secret.as_bytes()) {
        Ok(m) => m,
        Err(_) => return false,
    };
    mac.update(body);
    mac.verify_slice(&expected).is_ok()
}

pub fn sign(channel_secret: &str, body: &[u8]) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(channel_secret.as_bytes())
        .expect("HMAC accepts keys of any length");
    mac.update(body);
    base64::engine::general_purpose::STANDARD.encode(mac.finalize().into_bytes())
}

pub async fn line_callback(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<&'static str, AppError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    if signature.is_empty() {
        tracing::warn!("missing X-Line-Signature header");
        return Err(AppError::InvalidSignature);
    }
    if !verify_signature(&state.config.line_channel_secret, &body, signature) {
        tracing::warn!("invalid LINE signature");
        return Err(AppError::InvalidSignature);
    }

    let payload: WebhookPayload = serde_json::from_slice(&body).map_err(|e| {
        tracing::warn!(error = %e, "unparseable webhook payload");
        AppError::BadPayload(e.to_string())
    })?;

    tracing::debug!(
        destination = payload.destination.as_deref().unwrap_or(""),
        events = payload.events.len(),
        "webhook received"
    );

    let now = state.dispatcher.now().naive_utc();
    if let Err(e) = state.dispatcher.pending().purge_expired(now) {
        tracing::error!(error = %e, "failed to purge expired selections");
    }

    for event in payload.events {
        handle_event(&state, event).await;
    }

    Ok("OK")
}

async fn handle_event(state: &AppState, event: WebhookEvent) {
    let Some(text) = event.command_text() else {
        tracing::debug!(kind = %event.kind, "ignoring event");
        return;
    };
    let Some(requester_id) = event.source.requester_id() else {
        tracing::warn!(kind = %event.kind, "event without a source id");
        return;
    };
    let Some(token) = event.reply_token.as_deref() else {
        tracing::warn!(requester = %requester_id, "event without a reply token");
        return;
    };

    tracing::info!(requester = %requester_id, text = %text, "incoming message");

    let reply = state.dispatcher.handle_command(text, requester_id).await;

    if let Err(e) = state
        .messaging
        .reply(ReplyToken::new(token), &reply.to_string())
        .await
    {
        tracing::error!(error = %e, requester = %requester_id, "failed to send reply");
    }
}
