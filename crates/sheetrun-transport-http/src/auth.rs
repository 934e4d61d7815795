//! Bearer token authentication for execution requests.

use axum::http::{header, HeaderMap, StatusCode};

/// Validates the `Authorization: Bearer <token>` header.
///
/// # Errors
///
/// Returns `StatusCode::UNAUTHORIZED` if the header is absent or the
/// token does not match `expected`.
pub(crate) fn validate_bearer(headers: &HeaderMap, expected: &str) -> Result<(), StatusCode> {
    let provided = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim);

    match provided {
        Some(token) if constant_time_eq(token.as_bytes(), expected.as_bytes()) => Ok(()),
        _ => Err(StatusCode::UNAUTHORIZED),
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
