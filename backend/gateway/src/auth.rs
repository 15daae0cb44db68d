//! Gateway Authentication Module
//!
//! Optional shared API key. When the server is configured with a key the
//! process route requires `Authorization: Bearer <key>` or `X-Api-Key`.

use axum::{
    Json, async_trait,
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
};
use tracing::warn;

use crate::ocr_api::IntakeResponse;
use crate::server::GatewayState;

pub const API_KEY_HEADER: &str = "x-api-key";

/// Extractor guarding a route with the configured API key.
/// Passes everything through when no key is configured.
pub struct RequireApiKey;

#[async_trait]
impl FromRequestParts<GatewayState> for RequireApiKey {
    type Rejection = (StatusCode, Json<IntakeResponse>);

    async fn from_request_parts(
        parts: &mut Parts,
        state: &GatewayState,
    ) -> Result<Self, Self::Rejection> {
        let Some(expected) = state.api_key.as_deref() else {
            return Ok(RequireApiKey);
        };

        match presented_key(parts) {
            Some(key) if constant_time_eq(key.as_bytes(), expected.as_bytes()) => Ok(RequireApiKey),
            Some(_) => {
                warn!("Invalid API key");
                Err(unauthorized())
            }
            None => {
                warn!("Missing API key");
                Err(unauthorized())
            }
        }
    }
}

fn presented_key(parts: &Parts) -> Option<&str> {
    let bearer = parts
        .headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|val| val.to_str().ok())
        .and_then(|header| header.strip_prefix("Bearer "));
    bearer.or_else(|| {
        parts
            .headers
            .get(API_KEY_HEADER)
            .and_then(|val| val.to_str().ok())
    })
}

fn unauthorized() -> (StatusCode, Json<IntakeResponse>) {
    (
        StatusCode::UNAUTHORIZED,
        Json(IntakeResponse::failure("Missing or invalid API key.")),
    )
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compares_keys() {
        assert!(constant_time_eq(b"secret", b"secret"));
        assert!(!constant_time_eq(b"secret", b"secreT"));
        assert!(!constant_time_eq(b"secret", b"secret-longer"));
    }
}
