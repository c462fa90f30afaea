//! Authentication module for token issuance and verification.
//!
//! This module provides bearer-token authentication for the HTTP API. At
//! login, the server issues an HS256-signed token embedding the user's id
//! and name; every protected route then requires that token in the
//! `Authorization` header, checked by [`auth_middleware`] before the handler
//! runs.
//!
//! # Overview
//!
//! The authentication flow works as follows:
//! 1. The client POSTs `{username, password}` to `/auth/login`
//! 2. On a credential match, the server returns a signed token carrying
//!    `{sub, username, iat, exp}`
//! 3. The client sends `Authorization: Bearer <token>` on protected routes
//! 4. The middleware verifies the signature and expiry, then attaches the
//!    decoded [`Claims`] to the request extensions
//!
//! # Example
//!
//! ```rust
//! use stagepass_server::auth::{decode_token, issue_token};
//! use stagepass_server::users::User;
//!
//! let user = User {
//!     user_id: 1,
//!     username: "john".to_string(),
//!     password: "cena".to_string(),
//! };
//!
//! let token = issue_token(&user, "secret").expect("signing succeeds");
//! let claims = decode_token(&token, "secret").expect("token is valid");
//! assert_eq!(claims.sub, 1);
//! assert_eq!(claims.username, "john");
//! ```

use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::error::ApiError;
use crate::routes::AppState;
use crate::users::User;

/// Token lifetime in seconds (24 hours).
const TOKEN_TTL_SECS: i64 = 24 * 60 * 60;

/// Claims carried by an issued token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    /// Subject: the authenticated user's id.
    pub sub: i64,

    /// The authenticated user's login name.
    pub username: String,

    /// Issued-at, seconds since the Unix epoch.
    pub iat: i64,

    /// Expiry, seconds since the Unix epoch.
    pub exp: i64,
}

/// Errors that can occur during authentication.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// The username/password pair did not match any stored credential.
    ///
    /// Deliberately does not distinguish an unknown user from a wrong
    /// password.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// No bearer token was supplied on a protected route.
    #[error("missing bearer token")]
    MissingToken,

    /// The token failed verification.
    ///
    /// Covers malformed tokens, bad signatures, and tokens signed with a
    /// different secret.
    #[error("invalid token")]
    InvalidToken,

    /// The token was valid but has expired.
    #[error("expired token")]
    ExpiredToken,

    /// Token signing failed.
    #[error("token signing failed: {0}")]
    Signing(String),
}

impl AuthError {
    /// Creates a signing error.
    pub fn signing(message: impl Into<String>) -> Self {
        Self::Signing(message.into())
    }

    /// Returns `true` if this error concerns the presented token.
    pub fn is_token_error(&self) -> bool {
        matches!(
            self,
            Self::MissingToken | Self::InvalidToken | Self::ExpiredToken
        )
    }

    /// Returns `true` if this error concerns the login credentials.
    pub fn is_credential_error(&self) -> bool {
        matches!(self, Self::InvalidCredentials)
    }
}

/// Issues a signed token for an authenticated user.
///
/// The token carries the user's id as the subject, the username, and a
/// fixed 24-hour expiry.
///
/// # Errors
///
/// Returns [`AuthError::Signing`] if encoding fails.
pub fn issue_token(user: &User, secret: &str) -> Result<String, AuthError> {
    let now = Utc::now().timestamp();
    let claims = Claims {
        sub: user.user_id,
        username: user.username.clone(),
        iat: now,
        exp: now + TOKEN_TTL_SECS,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|err| AuthError::signing(err.to_string()))
}

/// Decodes and verifies a token, returning its claims.
///
/// Uses the library's default validation: HS256 only, expiry checked with
/// the default leeway.
///
/// # Errors
///
/// - [`AuthError::ExpiredToken`] if the expiry has passed
/// - [`AuthError::InvalidToken`] for any other verification failure
pub fn decode_token(token: &str, secret: &str) -> Result<Claims, AuthError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|err| match err.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::ExpiredToken,
        _ => AuthError::InvalidToken,
    })
}

/// Extracts the bearer token from the `Authorization` header.
fn extract_bearer(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers.get(AUTHORIZATION).ok_or(AuthError::MissingToken)?;
    let value = value.to_str().map_err(|_| AuthError::InvalidToken)?;
    let token = value
        .strip_prefix("Bearer ")
        .ok_or(AuthError::InvalidToken)?
        .trim();

    if token.is_empty() {
        return Err(AuthError::MissingToken);
    }

    Ok(token)
}

/// Middleware guarding protected routes.
///
/// Verifies the bearer token and attaches the decoded [`Claims`] to the
/// request extensions. Rejects with 401 before the handler runs, so no
/// persistence operation executes for an unauthenticated request.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let claims = match extract_bearer(req.headers())
        .and_then(|token| decode_token(token, &state.config.jwt_secret))
    {
        Ok(claims) => claims,
        Err(err) => {
            debug!(error = %err, path = %req.uri().path(), "Rejected unauthenticated request");
            return ApiError::unauthorized(err.to_string()).into_response();
        }
    };

    req.extensions_mut().insert(claims);
    next.run(req).await
}
