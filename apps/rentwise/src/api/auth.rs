//! # Authentication Module
//!
//! Password hashing and bearer-token authentication for the Rentwise API.
//!
//! ## Usage
//!
//! Obtain a token from `POST /api/login`, then send it on every other
//! request:
//! ```text
//! Authorization: Bearer <token>
//! ```

use super::AppState;
use super::types::ApiError;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use axum::{
    body::Body,
    extract::State,
    http::{Request, header},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rentwise_core::{Role, User, UserId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("password hashing failed: {0}")]
    Hash(String),

    #[error("invalid token: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
}

// =============================================================================
// PASSWORDS
// =============================================================================

/// Hash a password into an Argon2 PHC string.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::Hash(e.to_string()))
}

/// Check a password against a stored PHC string.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    PasswordHash::new(stored_hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

// =============================================================================
// TOKENS
// =============================================================================

/// Token payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: u64,
    pub email: String,
    pub role: Role,
    pub iat: u64,
    pub exp: u64,
}

/// Signing and verification keys for HS256 tokens.
pub struct AuthKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_secs: u64,
}

impl AuthKeys {
    pub fn new(secret: &str, ttl_hours: u64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl_secs: ttl_hours.saturating_mul(3600),
        }
    }

    /// Issue a token for `user`, valid from now for the configured lifetime.
    pub fn issue(&self, user: &User) -> Result<String, AuthError> {
        let now = jsonwebtoken::get_current_timestamp();
        self.sign(&Claims {
            sub: user.id.0,
            email: user.email.clone(),
            role: user.role,
            iat: now,
            exp: now.saturating_add(self.ttl_secs),
        })
    }

    fn sign(&self, claims: &Claims) -> Result<String, AuthError> {
        Ok(encode(&Header::default(), claims, &self.encoding)?)
    }

    /// Verify signature and expiry.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let data = decode::<Claims>(token, &self.decoding, &Validation::default())?;
        Ok(data.claims)
    }
}

// =============================================================================
// MIDDLEWARE
// =============================================================================

/// The authenticated caller, inserted into request extensions.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl CurrentUser {
    /// Fail with 403 unless the caller is an admin.
    pub fn require_admin(&self) -> Result<(), ApiError> {
        if self.0.role == Role::Admin {
            Ok(())
        } else {
            tracing::warn!(
                event = "auth_failure",
                reason = "admin_required",
                user_id = self.0.id.0,
                "Admin role required"
            );
            Err(ApiError::forbidden("admin role required"))
        }
    }
}

/// Bearer-token authentication middleware.
///
/// Missing, malformed, expired or forged tokens answer 401, as do tokens
/// whose user no longer exists. On success the caller is available to
/// handlers as `Extension<CurrentUser>`.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());

    let Some(token) = token else {
        tracing::warn!(
            event = "auth_failure",
            reason = "missing_authorization_header",
            "Missing bearer token"
        );
        return Err(ApiError::unauthorized("missing bearer token"));
    };

    let claims = state.auth.verify(token).map_err(|e| {
        tracing::warn!(
            event = "auth_failure",
            reason = "invalid_token",
            error = %e,
            "Authentication failed"
        );
        ApiError::unauthorized("invalid or expired token")
    })?;

    let user = state
        .portfolio
        .read()
        .await
        .user(UserId(claims.sub))
        .map_err(|_| {
            tracing::warn!(
                event = "auth_failure",
                reason = "unknown_user",
                user_id = claims.sub,
                "Token refers to a missing user"
            );
            ApiError::unauthorized("invalid or expired token")
        })?;

    request.extensions_mut().insert(CurrentUser(user));
    Ok(next.run(request).await)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: Role) -> User {
        User {
            id: UserId(7),
            email: "owner@example.com".to_string(),
            password_hash: String::new(),
            role,
        }
    }

    #[test]
    fn password_roundtrip() {
        let hash = hash_password("s3cret").expect("hash");
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("s3cret", &hash));
        assert!(!verify_password("wrong", &hash));
        assert!(!verify_password("s3cret", "not-a-phc-string"));
    }

    #[test]
    fn token_carries_identity() {
        let keys = AuthKeys::new("test-secret", 24);
        let token = keys.issue(&user(Role::Owner)).expect("issue");
        let claims = keys.verify(&token).expect("verify");
        assert_eq!(claims.sub, 7);
        assert_eq!(claims.role, Role::Owner);
        assert_eq!(claims.exp - claims.iat, 24 * 3600);
    }

    #[test]
    fn token_from_other_secret_rejected() {
        let token = AuthKeys::new("one", 24).issue(&user(Role::Admin)).expect("issue");
        assert!(AuthKeys::new("two", 24).verify(&token).is_err());
    }

    #[test]
    fn expired_token_rejected() {
        let keys = AuthKeys::new("test-secret", 24);
        let past = jsonwebtoken::get_current_timestamp() - 7200;
        let token = keys
            .sign(&Claims {
                sub: 7,
                email: "owner@example.com".to_string(),
                role: Role::Owner,
                iat: past - 3600,
                exp: past,
            })
            .expect("sign");
        assert!(keys.verify(&token).is_err());
    }

    #[test]
    fn owner_is_not_admin() {
        assert!(CurrentUser(user(Role::Admin)).require_admin().is_ok());
        assert!(CurrentUser(user(Role::Owner)).require_admin().is_err());
    }
}
