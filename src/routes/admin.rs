use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Admin Router Module
///
/// Mounted behind `require_login`; the admin flag is checked by the handler, which
/// answers 403 for any other identity.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // GET /admin
        // The same feed snapshot as the home page, for moderation.
        .route("/admin", get(handlers::admin_dashboard))
}
