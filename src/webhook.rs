//! GitHub webhook authenticity checks
//!
//! Checks run in a fixed order: method, user agent, signature header format,
//! signature hex, body read, HMAC, event type. Nothing past the HMAC check
//! runs for an unverified payload.

use axum::http::{HeaderMap, Method, header};
use hmac::{Hmac, Mac};
use sha1::Sha1;
use std::str::FromStr;

use crate::error::{LankyError, Result};

type HmacSha1 = Hmac<Sha1>;

pub const EVENT_HEADER: &str = "X-GitHub-Event";
pub const SIGNATURE_HEADER: &str = "X-Hub-Signature";
pub const SIGNATURE_PREFIX: &str = "sha1=";
pub const USER_AGENT_PREFIX: &str = "GitHub-Hookshot/";
/// GitHub caps webhook payloads at 25 MB.
pub const MAX_BODY_BYTES: usize = 25 * 1024 * 1024;
pub const PING_RESPONSE: &str = "OK: 1";

/// Events the relay understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookEvent {
    Ping,
    Push,
}

impl FromStr for HookEvent {
    type Err = LankyError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "ping" => Ok(HookEvent::Ping),
            "push" => Ok(HookEvent::Push),
            other => Err(LankyError::UnsupportedEvent(other.to_string())),
        }
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: impl header::AsHeaderName) -> &'a str {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
}

/// Raw HMAC-SHA1 of `payload` keyed with `key`.
pub fn sign(payload: &[u8], key: &[u8]) -> Result<Vec<u8>> {
    let mut mac = match HmacSha1::new_from_slice(key) {
        Ok(mac) => mac,
        Err(e) => {
            return Err(LankyError::ConfigError(format!("Invalid HMAC key: {}", e)));
        }
    };
    mac.update(payload);
    Ok(mac.finalize().into_bytes().to_vec())
}

/// Method and user-agent checks.
pub fn check_sender(method: &Method, headers: &HeaderMap) -> Result<()> {
    if *method != Method::POST {
        return Err(LankyError::MethodNotAllowed);
    }
    if !header_str(headers, header::USER_AGENT).starts_with(USER_AGENT_PREFIX) {
        return Err(LankyError::Unauthorized);
    }
    Ok(())
}

/// Decodes `sha1=<hex>` from the signature header.
pub fn decode_signature(headers: &HeaderMap) -> Result<Vec<u8>> {
    let value = header_str(headers, SIGNATURE_HEADER);
    let hex_sig = value
        .strip_prefix(SIGNATURE_PREFIX)
        .ok_or(LankyError::InvalidSignature)?;
    hex::decode(hex_sig).map_err(|_| LankyError::InvalidSignature)
}

/// Constant-time comparison of the payload's HMAC against `signature`.
pub fn verify_signature(secret: &[u8], payload: &[u8], signature: &[u8]) -> Result<()> {
    let mut mac = HmacSha1::new_from_slice(secret).map_err(|_| LankyError::InvalidSignature)?;
    mac.update(payload);
    mac.verify_slice(signature)
        .map_err(|_| LankyError::InvalidSignature)
}

/// Event selected by the event header. Only call after the signature passed.
pub fn event_type(headers: &HeaderMap) -> Result<HookEvent> {
    header_str(headers, EVENT_HEADER).parse()
}
