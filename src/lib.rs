use axum::{
    Router,
    extract::FromRef,
    http::HeaderName,
    middleware,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Core services: session resolution, aggregation, search, ownership policy.
pub mod accounts;
pub mod auth;
pub mod config;
pub mod error;
pub mod feed;
pub mod handlers;
pub mod models;
pub mod policy;
pub mod questions;
pub mod repository;
pub mod search;

// Module for routing segregation (Public, Authenticated, Admin).
pub mod routes;
use routes::{admin, authenticated, public};

use accounts::AccountService;
use auth::{SessionAuthGate, session::SessionKeys};
use feed::FeedService;
use questions::QuestionService;
use search::SearchService;

// --- Public Re-exports ---

pub use config::AppConfig;
pub use repository::{MemoryRepository, PostgresRepository, RepositoryState};

/// ApiDoc
///
/// Aggregates every `#[utoipa::path]` handler and `ToSchema` model into the OpenAPI
/// document served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::home, handlers::search, handlers::category_questions, handlers::get_question,
        handlers::ask_form, handlers::ask_question, handlers::edit_form, handlers::edit_question,
        handlers::delete_question, handlers::post_answer, handlers::register, handlers::login,
        handlers::logout, handlers::me, handlers::admin_dashboard
    ),
    components(
        schemas(
            models::Question, models::Answer, models::User, models::Category,
            models::FieldError, models::QuestionForm, models::AnswerForm, models::RegisterForm,
            models::LoginForm, models::FeedView, models::SearchView, models::QuestionView,
            models::CategoryView, models::AskView, models::SessionResponse, models::Deleted,
        )
    ),
    tags(
        (name = "kura-forum", description = "Course forum questions and answers")
    )
)]
struct ApiDoc;

/// AppState
///
/// The single shared container handed to every request: the persistence
/// collaborator, the session signing keys and the loaded configuration.
#[derive(Clone)]
pub struct AppState {
    pub repo: RepositoryState,
    pub sessions: SessionKeys,
    pub config: AppConfig,
}

impl AppState {
    pub fn new(repo: RepositoryState, config: AppConfig) -> Self {
        Self {
            repo,
            sessions: SessionKeys::from_config(&config),
            config,
        }
    }

    pub fn gate(&self) -> SessionAuthGate {
        SessionAuthGate::new(self.repo.clone())
    }

    pub fn feed(&self) -> FeedService {
        FeedService::new(self.repo.clone())
    }

    pub fn search(&self) -> SearchService {
        SearchService::new(self.repo.clone())
    }

    pub fn questions(&self) -> QuestionService {
        QuestionService::new(self.repo.clone())
    }

    pub fn accounts(&self) -> AccountService {
        AccountService::new(self.repo.clone())
    }
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for SessionKeys {
    fn from_ref(app_state: &AppState) -> SessionKeys {
        app_state.sessions.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// create_router
///
/// Assembles the routing tree. The session gate wraps every route so each request
/// carries a resolved identity (or none) before any handler runs; the authenticated
/// and admin groups add the login requirement on top.
pub fn create_router(state: AppState) -> Router {
    // 1. CORS Configuration
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    // 2. Base Router Assembly
    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        .merge(
            authenticated::authenticated_routes()
                .route_layer(middleware::from_fn(auth::require_login)),
        )
        // The admin flag itself is checked inside the handler.
        .merge(admin::admin_routes().route_layer(middleware::from_fn(auth::require_login)))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::session_middleware,
        ))
        .with_state(state);

    // 3. Observability and Correlation Layers
    base_router
        .layer(
            ServiceBuilder::new()
                // 3a. Request ID Generation
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                // 3b. Request Tracing, tagged with the request ID
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                // 3c. Request ID Propagation back onto the response
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        // 4. CORS Layer
        .layer(cors)
}

/// trace_span_logger
///
/// Opens the per-request span, tagged with the `x-request-id` so every log line for
/// one request can be correlated.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
