use crate::{
    AppState,
    auth::{RequireLogin, session::{cleared_session_cookie, session_cookie}},
    error::{ForumError, ForumResult, MutationOutcome},
    models::{
        Answer, AnswerForm, AskView, CategoryView, Deleted, FeedView, LoginForm, Question,
        QuestionForm, QuestionView, RegisterForm, SearchView, SessionResponse, User,
    },
    search::SearchOutcome,
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use uuid::Uuid;

/// Shown when a search term matched nothing.
pub const NO_RESULTS_NOTICE: &str = "No result found!";

/// SearchQuery
///
/// Query parameters accepted by `GET /search`.
#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
pub struct SearchQuery {
    /// Free text matched literally and case-insensitively against question titles.
    pub search: Option<String>,
}

// --- Public Handlers ---

/// home
///
/// [Public Route] The home feed: every question (newest-first), user, tag and answer.
/// Any failed read fails the whole page.
#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Feed snapshot", body = FeedView),
        (status = 500, description = "A feed read failed")
    )
)]
pub async fn home(State(state): State<AppState>) -> ForumResult<Json<FeedView>> {
    let snapshot = state.feed().get_all().await?;
    Ok(Json(snapshot.into()))
}

/// search
///
/// [Public Route] Title search. An empty or missing term redirects to the home feed
/// without querying the store.
#[utoipa::path(
    get,
    path = "/search",
    params(SearchQuery),
    responses(
        (status = 200, description = "Matching questions with sidebar data", body = SearchView),
        (status = 303, description = "No term supplied, redirect to /"),
        (status = 422, description = "Search term too long")
    )
)]
pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> ForumResult<Response> {
    let term = query.search.unwrap_or_default();

    let questions = match state.search().search(&term).await? {
        SearchOutcome::NoTerm => return Ok(Redirect::to("/").into_response()),
        SearchOutcome::Matches(questions) => questions,
        SearchOutcome::Invalid(fields) => return Err(ForumError::Validation(fields)),
    };

    let (_, users, tags, _) = state.feed().get_all().await?.into_parts();
    let notice = questions.is_empty().then(|| NO_RESULTS_NOTICE.to_string());

    Ok(Json(SearchView {
        questions,
        users,
        tags,
        notice,
    })
    .into_response())
}

/// category_questions
///
/// [Public Route] Questions filed under one category name.
#[utoipa::path(
    get,
    path = "/category/{name}",
    params(("name" = String, Path, description = "Category name")),
    responses((status = 200, description = "Questions in the category", body = CategoryView))
)]
pub async fn category_questions(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ForumResult<Json<CategoryView>> {
    let questions = state.questions().by_category(&name).await?;
    Ok(Json(CategoryView {
        subject: name,
        questions,
    }))
}

/// get_question
///
/// [Public Route] A single question with its answers.
#[utoipa::path(
    get,
    path = "/questions/{id}",
    params(("id" = Uuid, Path, description = "Question ID")),
    responses(
        (status = 200, description = "Found", body = QuestionView),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_question(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ForumResult<Json<QuestionView>> {
    Ok(Json(state.questions().view(id).await?))
}

// --- Account Handlers ---

/// register
///
/// [Public Route] Creates a non-admin account. Validation failures, including a
/// taken username or email, come back as 422 with per-field messages.
#[utoipa::path(
    post,
    path = "/user/register",
    request_body = RegisterForm,
    responses(
        (status = 200, description = "Registered", body = User),
        (status = 422, description = "Invalid submission")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    Json(form): Json<RegisterForm>,
) -> ForumResult<MutationOutcome<User>> {
    state.accounts().register(form).await
}

/// login
///
/// [Public Route] Verifies credentials and issues a session token, both in the body
/// and as the session cookie.
#[utoipa::path(
    post,
    path = "/user/login",
    request_body = LoginForm,
    responses(
        (status = 200, description = "Logged in", body = SessionResponse),
        (status = 401, description = "Invalid email or password")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(form): Json<LoginForm>,
) -> ForumResult<Response> {
    let user = state.accounts().login(form).await?;
    let token = state
        .sessions
        .issue(&user)
        .map_err(|e| ForumError::Internal(format!("failed to sign session token: {e}")))?;
    let cookie = session_cookie(&token, state.sessions.ttl_secs());

    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(SessionResponse { user, token }),
    )
        .into_response())
}

/// logout
///
/// [Public Route] Clears the session cookie. Safe to call when not logged in.
#[utoipa::path(
    post,
    path = "/user/logout",
    responses((status = 204, description = "Session cleared"))
)]
pub async fn logout() -> impl IntoResponse {
    (
        StatusCode::NO_CONTENT,
        [(header::SET_COOKIE, cleared_session_cookie())],
    )
}

/// me
///
/// [Authenticated Route] The sanitized identity attached to this request.
#[utoipa::path(
    get,
    path = "/user/me",
    responses(
        (status = 200, description = "Current user", body = User),
        (status = 401, description = "Login required")
    )
)]
pub async fn me(RequireLogin(user): RequireLogin) -> Json<User> {
    Json(user)
}

// --- Authenticated Question Handlers ---

/// ask_form
///
/// [Authenticated Route] Categories to choose from when asking a question.
#[utoipa::path(
    get,
    path = "/questions/ask",
    responses((status = 200, description = "Ask form data", body = AskView))
)]
pub async fn ask_form(
    RequireLogin(_user): RequireLogin,
    State(state): State<AppState>,
) -> ForumResult<Json<AskView>> {
    let categories = state.questions().categories().await?;
    Ok(Json(AskView { categories }))
}

/// ask_question
///
/// [Authenticated Route] Posts a question authored by the requesting user.
#[utoipa::path(
    post,
    path = "/questions/ask",
    request_body = QuestionForm,
    responses(
        (status = 200, description = "Question created", body = Question),
        (status = 422, description = "Invalid submission")
    )
)]
pub async fn ask_question(
    RequireLogin(user): RequireLogin,
    State(state): State<AppState>,
    Json(form): Json<QuestionForm>,
) -> ForumResult<MutationOutcome<Question>> {
    Ok(state.questions().ask(&user, form).await?)
}

/// edit_form
///
/// [Authenticated Route] Loads a question for editing. Owner-only.
#[utoipa::path(
    get,
    path = "/questions/edit/{id}",
    params(("id" = Uuid, Path, description = "Question ID")),
    responses(
        (status = 200, description = "Editable question", body = Question),
        (status = 403, description = "Not Owner"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn edit_form(
    RequireLogin(user): RequireLogin,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ForumResult<MutationOutcome<Question>> {
    Ok(state.questions().edit_form(&user, id).await?)
}

/// edit_question
///
/// [Authenticated Route] Replaces title, body and category. Owner-only; the author
/// never changes.
#[utoipa::path(
    post,
    path = "/questions/edit/{id}",
    params(("id" = Uuid, Path, description = "Question ID")),
    request_body = QuestionForm,
    responses(
        (status = 200, description = "Updated", body = Question),
        (status = 403, description = "Not Owner"),
        (status = 404, description = "Not Found"),
        (status = 422, description = "Invalid submission")
    )
)]
pub async fn edit_question(
    RequireLogin(user): RequireLogin,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(form): Json<QuestionForm>,
) -> ForumResult<MutationOutcome<Question>> {
    Ok(state.questions().edit(&user, id, form).await?)
}

/// delete_question
///
/// [Authenticated Route] Removes a question and its answers. Owner-only.
#[utoipa::path(
    delete,
    path = "/questions/{id}",
    params(("id" = Uuid, Path, description = "Question ID")),
    responses(
        (status = 200, description = "Deleted", body = Deleted),
        (status = 403, description = "Not Owner"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_question(
    RequireLogin(user): RequireLogin,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ForumResult<MutationOutcome<Deleted>> {
    Ok(state.questions().delete(&user, id).await?)
}

/// post_answer
///
/// [Authenticated Route] Answers an existing question.
#[utoipa::path(
    post,
    path = "/answer/{question_id}",
    params(("question_id" = Uuid, Path, description = "Question being answered")),
    request_body = AnswerForm,
    responses(
        (status = 200, description = "Answer created", body = Answer),
        (status = 404, description = "Question Not Found"),
        (status = 422, description = "Invalid submission")
    )
)]
pub async fn post_answer(
    RequireLogin(user): RequireLogin,
    State(state): State<AppState>,
    Path(question_id): Path<Uuid>,
    Json(form): Json<AnswerForm>,
) -> ForumResult<MutationOutcome<Answer>> {
    Ok(state.questions().answer(&user, question_id, form).await?)
}

// --- Admin Handlers ---

/// admin_dashboard
///
/// [Admin Route] The full feed snapshot, for users carrying the admin flag only.
#[utoipa::path(
    get,
    path = "/admin",
    responses(
        (status = 200, description = "Dashboard data", body = FeedView),
        (status = 403, description = "Not an admin")
    )
)]
pub async fn admin_dashboard(
    RequireLogin(user): RequireLogin,
    State(state): State<AppState>,
) -> ForumResult<Json<FeedView>> {
    if !user.admin {
        tracing::warn!(user = %user.username, "non-admin requested the dashboard");
        return Err(ForumError::Forbidden("Unauthorised User".to_string()));
    }
    let snapshot = state.feed().get_all().await?;
    Ok(Json(snapshot.into()))
}
