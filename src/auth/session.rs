//! Signed session tokens and their cookie / header transport.

use std::time::{SystemTime, UNIX_EPOCH};

use axum::http::{HeaderMap, header};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::{config::AppConfig, models::User};

/// Name of the cookie carrying the session token.
pub const SESSION_COOKIE: &str = "kura_session";

/// Claims
///
/// The payload signed into a session token: the cached, sanitized user copy plus
/// the standard issued-at and expiry timestamps.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub user: User,
    pub iat: usize,
    pub exp: usize,
}

/// Session
///
/// The per-client session record. It may carry a cached user whose `email` keys
/// the live lookup; the cached copy itself is never trusted for authorization.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    pub user: Option<User>,
}

impl Session {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn for_user(user: User) -> Self {
        Self { user: Some(user) }
    }

    /// A session that only knows an email address.
    pub fn for_email(email: &str) -> Self {
        Self::for_user(User {
            email: email.to_string(),
            ..User::default()
        })
    }

    /// The identity key, if the session carries one.
    pub fn email(&self) -> Option<&str> {
        self.user
            .as_ref()
            .map(|user| user.email.as_str())
            .filter(|email| !email.is_empty())
    }
}

/// SessionKeys
///
/// HS256 signing material and lifetime for session tokens.
#[derive(Clone)]
pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_secs: u64,
}

impl SessionKeys {
    pub fn new(secret: &str, ttl_secs: u64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl_secs,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(&config.session_secret, config.session_ttl_secs)
    }

    pub fn ttl_secs(&self) -> u64 {
        self.ttl_secs
    }

    /// Signs a session token caching `user`.
    pub fn issue(&self, user: &User) -> Result<String, jsonwebtoken::errors::Error> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs())
            .unwrap_or_default();
        let claims = Claims {
            user: user.clone(),
            iat: now as usize,
            exp: (now + self.ttl_secs) as usize,
        };
        encode(&Header::default(), &claims, &self.encoding)
    }

    /// decode
    ///
    /// Verifies signature and expiry. Any failure yields an anonymous session: a bad
    /// or stale token means "not logged in", not an error.
    pub fn decode(&self, token: &str) -> Session {
        let mut validation = Validation::default();
        validation.validate_exp = true;

        match decode::<Claims>(token, &self.decoding, &validation) {
            Ok(data) => Session::for_user(data.claims.user),
            Err(e) => {
                tracing::debug!(error = %e, "discarding invalid session token");
                Session::anonymous()
            }
        }
    }
}

/// token_from_headers
///
/// Reads the session token from the `kura_session` cookie, falling back to an
/// `Authorization: Bearer` header.
pub fn token_from_headers(headers: &HeaderMap) -> Option<&str> {
    let from_cookie = headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .find_map(|pair| {
            pair.trim()
                .strip_prefix(SESSION_COOKIE)
                .and_then(|rest| rest.strip_prefix('='))
        })
        .filter(|token| !token.is_empty());

    from_cookie.or_else(|| {
        headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
    })
}

/// `Set-Cookie` value installing `token`.
pub fn session_cookie(token: &str, ttl_secs: u64) -> String {
    format!("{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={ttl_secs}")
}

/// `Set-Cookie` value removing the session cookie.
pub fn cleared_session_cookie() -> String {
    format!("{SESSION_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}
