//! Inbound bearer-token verification.
//!
//! The expected token is read from an environment variable on every
//! request, so operators can rotate it without a restart. Auth being
//! enabled with the variable undefined is a deployment error and is
//! reported as such, not as an auth failure.

use axum::http::{HeaderMap, StatusCode, header};

/// Inbound authentication settings.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Env variable holding the expected bearer token.
    pub token_env: String,
}

impl AuthConfig {
    pub fn new(token_env: impl Into<String>) -> Self {
        Self {
            token_env: token_env.into(),
        }
    }

    /// Verify the `Authorization` header against the configured token.
    ///
    /// Returns `500` when the env variable is undefined, `401` when the
    /// header is missing or wrong.
    pub fn verify(&self, headers: &HeaderMap) -> Result<(), (StatusCode, &'static str)> {
        let Ok(expected) = std::env::var(&self.token_env) else {
            tracing::error!(
                env = %self.token_env,
                "Auth enabled but token env variable is undefined"
            );
            return Err((StatusCode::INTERNAL_SERVER_ERROR, "Token misconfiguration"));
        };

        let provided = headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("");
        if provided != format!("Bearer {}", expected) {
            return Err((StatusCode::UNAUTHORIZED, "Invalid token"));
        }
        Ok(())
    }
}

/// Verify against an optional auth config; `None` means auth is disabled.
pub fn verify_token(
    auth: &Option<AuthConfig>,
    headers: &HeaderMap,
) -> Result<(), (StatusCode, &'static str)> {
    match auth {
        Some(config) => config.verify(headers),
        None => Ok(()),
    }
}
