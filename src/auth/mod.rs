use std::convert::Infallible;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, HeaderValue, header, request::Parts},
    middleware::Next,
    response::Response,
};

use crate::{
    AppState,
    config::{AppConfig, Env},
    error::ForumError,
    models::User,
    repository::RepositoryState,
};

pub mod password;
pub mod session;

use session::{Session, session_cookie, token_from_headers};

/// Development-only header naming the email of the user to act as.
pub const LOCAL_BYPASS_HEADER: &str = "x-user-email";

/// Resolution
///
/// Output of [`SessionAuthGate::resolve`]: the identity to attach to the request (if
/// any) and the session to keep, refreshed with the live sanitized record on a hit.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub identity: Option<User>,
    pub session: Session,
}

/// SessionAuthGate
///
/// Turns a session into a live identity once per request. The session's cached user
/// only supplies the lookup key (email); the identity always comes from the store,
/// so deleted users lose access and role changes apply immediately.
#[derive(Clone)]
pub struct SessionAuthGate {
    repo: RepositoryState,
}

impl SessionAuthGate {
    pub fn new(repo: RepositoryState) -> Self {
        Self { repo }
    }

    /// resolve
    ///
    /// * Hit: strip the password, attach the sanitized user, refresh the session copy.
    /// * Miss, absent session, or store failure: no identity. Never an error.
    pub async fn resolve(&self, session: &Session) -> Resolution {
        let unresolved = || Resolution {
            identity: None,
            session: session.clone(),
        };

        let Some(email) = session.email() else {
            return unresolved();
        };

        match self.repo.find_user_by_email(email).await {
            Ok(Some(stored)) => {
                let user = stored.sanitize();
                Resolution {
                    identity: Some(user.clone()),
                    session: Session::for_user(user),
                }
            }
            Ok(None) => {
                tracing::debug!(%email, "session references unknown user");
                unresolved()
            }
            Err(e) => {
                tracing::warn!(%email, error = %e, "session lookup failed, continuing anonymously");
                unresolved()
            }
        }
    }
}

/// RequestContext
///
/// The immutable per-request identity, inserted into request extensions by
/// [`session_middleware`] before any handler runs.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub identity: Option<User>,
}

/// CurrentUser
///
/// Extracts the optional identity. Never rejects.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Option<User>);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let identity = parts
            .extensions
            .get::<RequestContext>()
            .and_then(|context| context.identity.clone());
        Ok(CurrentUser(identity))
    }
}

/// RequireLogin
///
/// Extracts the identity or rejects with [`ForumError::LoginRequired`], which the
/// boundary renders as a 401 pointing at the login page.
#[derive(Debug, Clone)]
pub struct RequireLogin(pub User);

impl<S> FromRequestParts<S> for RequireLogin
where
    S: Send + Sync,
{
    type Rejection = ForumError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let CurrentUser(identity) = match CurrentUser::from_request_parts(parts, state).await {
            Ok(current) => current,
            Err(never) => match never {},
        };
        identity.map(RequireLogin).ok_or(ForumError::LoginRequired)
    }
}

/// require_login
///
/// Route-layer middleware for the authenticated route group: the downstream handler
/// only runs when an identity is attached.
pub async fn require_login(RequireLogin(_user): RequireLogin, request: Request, next: Next) -> Response {
    next.run(request).await
}

/// In `Env::Local`, lets a request name its user by email instead of a token.
fn local_bypass(config: &AppConfig, headers: &HeaderMap) -> Option<Session> {
    if config.env != Env::Local {
        return None;
    }
    headers
        .get(LOCAL_BYPASS_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|email| !email.is_empty())
        .map(Session::for_email)
}

/// session_middleware
///
/// Runs the [`SessionAuthGate`] exactly once per request and attaches the resulting
/// [`RequestContext`]. When a presented session token resolves to a live user, the
/// response re-issues the cookie with the refreshed copy, unless the handler already
/// set a cookie of its own (login, logout).
///
/// 1. Session Source: a presented token, else the local bypass header.
/// 2. Resolution: one store lookup through the gate.
/// 3. Handler: runs with the [`RequestContext`] attached.
/// 4. Cookie Refresh: only for token sessions that resolved.
pub async fn session_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    // 1. Session Source (token first, then the local bypass)
    let presented = token_from_headers(request.headers()).map(|token| state.sessions.decode(token));
    let from_token = presented.is_some();
    let session = presented
        .or_else(|| local_bypass(&state.config, request.headers()))
        .unwrap_or_default();

    // 2. Resolve Once and Attach the Context
    let resolution = state.gate().resolve(&session).await;
    request.extensions_mut().insert(RequestContext {
        identity: resolution.identity.clone(),
    });

    // 3. Handler
    let mut response = next.run(request).await;

    // 4. Cookie Refresh

    let refreshed = match (&resolution.identity, from_token) {
        (Some(_), true) => resolution.session.user.as_ref(),
        _ => None,
    };
    let Some(user) = refreshed else {
        return response;
    };
    if response.headers().contains_key(header::SET_COOKIE) {
        return response;
    }
    match state.sessions.issue(user) {
        Ok(token) => {
            let cookie = session_cookie(&token, state.sessions.ttl_secs());
            if let Ok(value) = HeaderValue::from_str(&cookie) {
                response.headers_mut().insert(header::SET_COOKIE, value);
            }
        }
        // The handler already ran; keep its response and let the old token age out.
        Err(e) => tracing::error!(error = %e, "failed to refresh session token"),
    }
    response
}
