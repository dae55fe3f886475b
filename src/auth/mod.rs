//! Confirmation gate for destructive roster operations.
//!
//! Only the local reset sits behind it. Scanning, lookup, reports and sync
//! stay open so a kiosk works without a key. The gate stops accidental wipes
//! from the UI; it is not a security boundary, since the remote bucket is
//! writable by anyone holding its URL.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use subtle::ConstantTimeEq;

use crate::errors::AppError;

/// Header carrying the reset key.
pub const RESET_KEY_HEADER: &str = "x-reset-key";

/// The configured reset key, if any. Without one the gate is open.
#[derive(Clone, Default)]
pub struct ResetGate {
    key: Option<Arc<str>>,
}

impl ResetGate {
    pub fn new(key: Option<String>) -> Self {
        Self {
            key: key.map(Arc::from),
        }
    }

    /// Accept the request if it presents the configured key, either in
    /// [`RESET_KEY_HEADER`] or as a bearer token.
    pub fn authorize(&self, headers: &HeaderMap) -> Result<(), AppError> {
        let Some(expected) = self.key.as_deref() else {
            return Ok(());
        };

        match presented_key(headers) {
            Some(key) if keys_match(key, expected) => Ok(()),
            Some(_) => Err(AppError::Unauthorized("Invalid reset key".to_string())),
            None => Err(AppError::Unauthorized(
                "Reset key required to clear the roster".to_string(),
            )),
        }
    }
}

fn presented_key(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(RESET_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .or_else(|| {
            headers
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.strip_prefix("Bearer "))
        })
}

fn keys_match(provided: &str, expected: &str) -> bool {
    provided.as_bytes().ct_eq(expected.as_bytes()).into()
}

/// Route layer for the reset endpoint.
pub async fn require_reset_key(
    State(gate): State<ResetGate>,
    request: Request,
    next: Next,
) -> Response {
    match gate.authorize(request.headers()) {
        Ok(()) => next.run(request).await,
        Err(e) => {
            tracing::warn!("Roster reset refused: {}", e.message());
            e.into_response()
        }
    }
}
