use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{delete, get, post},
};

/// Authenticated Router Module
///
/// Every route here sits behind `require_login`, so handlers can rely on the
/// `RequireLogin` extractor succeeding. Edit and delete also go through the
/// ownership policy: only the question's author may change it.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // GET /user/me
        .route("/user/me", get(handlers::me))
        // GET/POST /questions/ask
        // The form data (categories) and the submission itself.
        .route(
            "/questions/ask",
            get(handlers::ask_form).post(handlers::ask_question),
        )
        // GET/POST /questions/edit/{id}
        // Owner-only. A refusal leaves the question untouched and points back at it.
        .route(
            "/questions/edit/{id}",
            get(handlers::edit_form).post(handlers::edit_question),
        )
        // DELETE /questions/{id}
        // Owner-only. Answers go with the question.
        .route("/questions/{id}", delete(handlers::delete_question))
        // POST /answer/{question_id}
        .route("/answer/{question_id}", post(handlers::post_answer))
}
