//! HTTP Basic Authentication for the host control socket

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, Request, Response, StatusCode},
    middleware::Next,
    response::IntoResponse,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use std::sync::Arc;

const REALM: &str = "Basic realm=\"Gold Clash Host\"";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Host credentials; `None` leaves the control socket open
#[derive(Debug, Clone, Default)]
pub struct AuthConfig {
    pub credentials: Option<Credentials>,
}

impl AuthConfig {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            credentials: Some(Credentials {
                username: username.into(),
                password: password.into(),
            }),
        }
    }

    /// HOST_USERNAME and HOST_PASSWORD must both be set to enable auth
    pub fn from_env() -> Self {
        let read = |key: &str| {
            std::env::var(key)
                .ok()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        };

        match (read("HOST_USERNAME"), read("HOST_PASSWORD")) {
            (Some(username), Some(password)) => {
                tracing::info!("Host authentication enabled");
                Self::new(username, password)
            }
            (None, None) => {
                tracing::warn!("Host authentication DISABLED - anyone can take over the room!");
                Self::default()
            }
            _ => {
                tracing::warn!(
                    "HOST_USERNAME and HOST_PASSWORD must both be set; host authentication DISABLED"
                );
                Self::default()
            }
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.credentials.is_some()
    }

    /// Disabled auth accepts anything
    pub fn validate(&self, username: &str, password: &str) -> bool {
        let Some(expected) = &self.credentials else {
            return true;
        };
        // Both halves are always compared
        let user_ok = constant_time_eq(expected.username.as_bytes(), username.as_bytes());
        let pass_ok = constant_time_eq(expected.password.as_bytes(), password.as_bytes());
        user_ok & pass_ok
    }

    /// Check the `Authorization: Basic ...` header
    pub fn authorizes(&self, headers: &HeaderMap) -> bool {
        basic_credentials(headers).is_some_and(|(user, pass)| self.validate(&user, &pass))
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

fn basic_credentials(headers: &HeaderMap) -> Option<(String, String)> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let encoded = value.strip_prefix("Basic ")?;
    let decoded = String::from_utf8(STANDARD.decode(encoded.trim()).ok()?).ok()?;
    let (user, pass) = decoded.split_once(':')?;
    Some((user.to_string(), pass.to_string()))
}

/// Middleware guarding the host control socket.
///
/// Without configured credentials the socket stays open for local play and
/// every connection attempt is logged.
pub async fn host_ws_auth_middleware(
    State(auth_config): State<Arc<AuthConfig>>,
    request: Request<Body>,
    next: Next,
) -> Response<Body> {
    if !auth_config.is_enabled() {
        tracing::warn!(
            "Host socket requested but authentication is DISABLED; set HOST_USERNAME and HOST_PASSWORD"
        );
        return next.run(request).await;
    }

    if auth_config.authorizes(request.headers()) {
        return next.run(request).await;
    }

    tracing::warn!("Rejected host socket connection with bad credentials");
    (
        StatusCode::UNAUTHORIZED,
        [(header::WWW_AUTHENTICATE, REALM)],
        "Unauthorized",
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use serial_test::serial;

    fn with_authorization(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_disabled_accepts_anything() {
        let config = AuthConfig::default();
        assert!(!config.is_enabled());
        assert!(config.validate("any", "thing"));
    }

    #[test]
    fn test_enabled_validates_both_halves() {
        let config = AuthConfig::new("admin", "secret");
        assert!(config.is_enabled());
        assert!(config.validate("admin", "secret"));
        assert!(!config.validate("admin", "wrong"));
        assert!(!config.validate("wrong", "secret"));
        assert!(!config.validate("", ""));
    }

    #[test]
    fn test_basic_header() {
        let config = AuthConfig::new("admin", "secret");
        // "admin:secret"
        assert!(config.authorizes(&with_authorization("Basic YWRtaW46c2VjcmV0")));
        // "user:pass"
        assert!(!config.authorizes(&with_authorization("Basic dXNlcjpwYXNz")));
        assert!(!config.authorizes(&with_authorization("Bearer YWRtaW46c2VjcmV0")));
        assert!(!config.authorizes(&with_authorization("Basic !!!")));
        assert!(!config.authorizes(&HeaderMap::new()));
    }

    #[test]
    fn test_password_may_contain_colon() {
        let config = AuthConfig::new("host", "a:b");
        let header = format!("Basic {}", STANDARD.encode("host:a:b"));
        assert!(config.authorizes(&with_authorization(&header)));
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"hello", b"hello"));
        assert!(!constant_time_eq(b"hello", b"world"));
        assert!(!constant_time_eq(b"hello", b"hell"));
        assert!(constant_time_eq(b"", b""));
    }

    #[test]
    #[serial]
    fn test_from_env_needs_both() {
        std::env::set_var("HOST_USERNAME", "host");
        std::env::remove_var("HOST_PASSWORD");
        assert!(!AuthConfig::from_env().is_enabled());

        std::env::set_var("HOST_PASSWORD", " pw ");
        let config = AuthConfig::from_env();
        assert_eq!(
            config.credentials,
            Some(Credentials {
                username: "host".to_string(),
                password: "pw".to_string()
            })
        );

        std::env::remove_var("HOST_USERNAME");
        std::env::remove_var("HOST_PASSWORD");
    }
}
