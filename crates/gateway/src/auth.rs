use {
    axum::{
        Json,
        http::{HeaderMap, StatusCode},
        response::{IntoResponse, Response},
    },
    secrecy::{ExposeSecret, Secret},
};

pub const API_KEY_HEADER: &str = "x-api-key";

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("missing API key")]
    Missing,
    #[error("invalid API key")]
    Invalid,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({ "detail": "Invalid or missing API key" })),
        )
            .into_response()
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────────

/// Constant-time string comparison.
fn safe_equal(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let diff = a
        .as_bytes()
        .iter()
        .zip(b.as_bytes())
        .fold(0u8, |acc, (x, y)| acc | (x ^ y));
    diff == 0
}

// ── Auth logic ───────────────────────────────────────────────────────────────

/// Shared-key check for the `x-api-key` header. With no key configured every
/// request is let through.
#[derive(Default)]
pub struct ApiKeyAuth {
    key: Option<Secret<String>>,
}

impl ApiKeyAuth {
    pub fn new(key: Option<String>) -> Self {
        Self {
            key: key.filter(|k| !k.is_empty()).map(Secret::new),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.key.is_some()
    }

    pub fn check(&self, provided: Option<&str>) -> Result<(), AuthError> {
        let Some(expected) = &self.key else {
            return Ok(());
        };
        let given = provided.ok_or(AuthError::Missing)?;
        if safe_equal(given, expected.expose_secret()) {
            Ok(())
        } else {
            Err(AuthError::Invalid)
        }
    }

    pub fn check_headers(&self, headers: &HeaderMap) -> Result<(), AuthError> {
        self.check(headers.get(API_KEY_HEADER).and_then(|v| v.to_str().ok()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_time_compare() {
        assert!(safe_equal("secret", "secret"));
        assert!(!safe_equal("secret", "secreT"));
        assert!(!safe_equal("secret", "secrets"));
    }

    #[test]
    fn key_required_when_configured() {
        let auth = ApiKeyAuth::new(Some("k1".into()));
        assert!(auth.check(Some("k1")).is_ok());
        assert!(matches!(auth.check(None), Err(AuthError::Missing)));
        assert!(matches!(auth.check(Some("k2")), Err(AuthError::Invalid)));
    }

    #[test]
    fn open_without_key() {
        let auth = ApiKeyAuth::new(Some(String::new()));
        assert!(!auth.is_enabled());
        assert!(auth.check(None).is_ok());
    }

    #[test]
    fn reads_header() {
        let auth = ApiKeyAuth::new(Some("k1".into()));
        let mut headers = HeaderMap::new();
        assert!(auth.check_headers(&headers).is_err());
        headers.insert(API_KEY_HEADER, "k1".parse().unwrap());
        assert!(auth.check_headers(&headers).is_ok());
    }
}
