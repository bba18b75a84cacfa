use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::{Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use hmac::{Hmac, Mac};
use partscout_core::AppError;
use sha2::Sha256;

use crate::dto::ErrorResponse;
use crate::state::AppState;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "x-line-signature";

/// Webhook bodies larger than this are rejected before verification.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Base64 HMAC-SHA256 of `body` keyed with the channel secret.
pub fn sign(secret: &str, body: &[u8]) -> Result<String, AppError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| AppError::ConfigError(format!("Unusable channel secret: {e}")))?;
    mac.update(body);
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

/// Check a signature header value in constant time.
pub fn verify(secret: &str, body: &[u8], signature: &str) -> bool {
    let Ok(expected) = STANDARD.decode(signature.trim()) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(body);
    mac.verify_slice(&expected).is_ok()
}

fn unauthorized(message: &str) -> Response {
    let body = ErrorResponse {
        error: "unauthorized".to_string(),
        message: message.to_string(),
    };
    (StatusCode::UNAUTHORIZED, axum::Json(body)).into_response()
}

/// Middleware that validates `X-Line-Signature` against the raw request body.
///
/// The body is buffered for the check and handed on unchanged.
pub async fn require_signature(
    State(state): State<Arc<AppState>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let (parts, body) = request.into_parts();

    let Some(signature) = parts
        .headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
    else {
        tracing::warn!("Webhook call without signature header");
        return unauthorized("Missing X-Line-Signature header");
    };

    let bytes = match axum::body::to_bytes(body, MAX_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(e) => {
            let body = ErrorResponse {
                error: "bad_request".to_string(),
                message: format!("Could not read request body: {e}"),
            };
            return (StatusCode::BAD_REQUEST, axum::Json(body)).into_response();
        }
    };

    if !verify(&state.channel_secret, &bytes, &signature) {
        tracing::warn!("Webhook call with invalid signature");
        return unauthorized("Invalid X-Line-Signature");
    }

    next.run(Request::from_parts(parts, Body::from(bytes))).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_signature() {
        let body = br#"{"events":[]}"#;
        let signature = sign("secret", body).unwrap();
        assert!(verify("secret", body, &signature));
        assert_eq!(signature.len(), 44);
    }

    #[test]
    fn tampered_body_fails() {
        let signature = sign("secret", b"{\"events\":[]}").unwrap();
        assert!(!verify("secret", b"{\"events\":[{}]}", &signature));
    }

    #[test]
    fn wrong_secret_fails() {
        let signature = sign("other", b"payload").unwrap();
        assert!(!verify("secret", b"payload", &signature));
    }

    #[test]
    fn garbage_header_fails() {
        assert!(!verify("secret", b"payload", "not base64 !!"));
        assert!(!verify("secret", b"payload", ""));
    }
}
