//! Webhook handler for GitHub deliveries

use axum::{
    body,
    extract::{Request, State as AxumState},
};
use tracing::{debug, error, info, warn};

use crate::SharedState;
use crate::error::{LankyError, Result};
use crate::github::PingPayload;
use crate::webhook::{
    HookEvent, MAX_BODY_BYTES, PING_RESPONSE, check_sender, decode_signature, event_type,
    verify_signature,
};

/// Handles /_github. Every rejection answers with a terse plain-text body.
pub async fn handle_webhook(
    AxumState(state): AxumState<SharedState>,
    request: Request,
) -> Result<&'static str> {
    verify_and_dispatch(&state, request).await.map_err(|e| {
        warn!("Webhook rejected ({}): {}", e.status_code(), e);
        e
    })
}

async fn verify_and_dispatch(state: &SharedState, request: Request) -> Result<&'static str> {
    let (parts, body) = request.into_parts();

    check_sender(&parts.method, &parts.headers)?;
    let signature = decode_signature(&parts.headers)?;

    let payload = body::to_bytes(body, MAX_BODY_BYTES).await.map_err(|e| {
        error!("Could not read webhook body: {}", e);
        LankyError::UnreadableBody
    })?;

    let secret = state.config.hook_secret().ok_or_else(|| {
        LankyError::ConfigError("Github hook secret is not configured.".to_string())
    })?;
    verify_signature(secret.as_bytes(), &payload, &signature)?;

    match event_type(&parts.headers)? {
        HookEvent::Ping => {
            match serde_json::from_slice::<PingPayload>(&payload) {
                Ok(ping) => info!(
                    "Ping for hook {} ({}): {}",
                    ping.hook_id,
                    ping.repository
                        .as_ref()
                        .map(|r| r.full_name.as_str())
                        .unwrap_or("-"),
                    ping.zen
                ),
                Err(e) => debug!("Ping payload not decoded: {}", e),
            }
            Ok(PING_RESPONSE)
        }
        HookEvent::Push => {
            info!("Push event received; push handling is not implemented");
            Err(LankyError::NotImplemented)
        }
    }
}
