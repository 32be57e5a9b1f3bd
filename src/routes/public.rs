use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Read-only forum pages plus the account gateway. A visitor with a valid session
/// still gets their identity attached here; it is simply not required.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness probe for load balancers.
        .route("/health", get(|| async { "ok" }))
        // GET /
        // Home feed: questions newest-first with users, tags and answers.
        .route("/", get(handlers::home))
        // GET /search?search=...
        // Literal, case-insensitive title search. No term redirects home.
        .route("/search", get(handlers::search))
        // GET /category/{name}
        .route("/category/{name}", get(handlers::category_questions))
        // GET /questions/{id}
        // The DELETE on this path lives in the authenticated group.
        .route("/questions/{id}", get(handlers::get_question))
        // --- Accounts ---
        .route("/user/register", post(handlers::register))
        .route("/user/login", post(handlers::login))
        .route("/user/logout", post(handlers::logout))
}
