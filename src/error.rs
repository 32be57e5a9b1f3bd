//! Error taxonomy for the forum core and its HTTP mapping.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

use crate::models::FieldError;

/// Logical collections held by the persistence collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Questions,
    Users,
    Categories,
    Answers,
}

impl Collection {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Questions => "questions",
            Self::Users => "users",
            Self::Categories => "tags",
            Self::Answers => "answers",
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failure reported by a [`Repository`](crate::repository::Repository) implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("invalid title pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("{0} collection unavailable")]
    Unavailable(Collection),

    #[error("conflict: {0}")]
    Conflict(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Application-level error returned by read paths and the session layer.
#[derive(Debug, Error)]
pub enum ForumError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// No identity is attached to the request and the route requires one.
    #[error("login required")]
    LoginRequired,

    /// An identity is attached but lacks the admin flag.
    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("validation failed on {} field(s)", .0.len())]
    Validation(Vec<FieldError>),

    /// One of the feed reads failed; the whole snapshot is discarded.
    #[error("failed to load {collection}: {source}")]
    Aggregation {
        collection: Collection,
        #[source]
        source: StoreError,
    },

    #[error(transparent)]
    Persistence(#[from] StoreError),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type ForumResult<T> = Result<T, ForumError>;

/// Where an unauthenticated caller is sent.
pub const LOGIN_PATH: &str = "/user/login";

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: String,
    code: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    redirect: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    fields: Option<&'a [FieldError]>,
}

impl IntoResponse for ForumError {
    fn into_response(self) -> Response {
        let (status, code, redirect) = match &self {
            ForumError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND", None),
            ForumError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", None),
            ForumError::LoginRequired => {
                (StatusCode::UNAUTHORIZED, "LOGIN_REQUIRED", Some(LOGIN_PATH))
            }
            ForumError::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN", Some("/")),
            ForumError::Validation(_) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR", None)
            }
            ForumError::Aggregation { .. }
            | ForumError::Persistence(_)
            | ForumError::Internal(_) => {
                tracing::error!(error = %self, "internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", None)
            }
        };

        let message = match status {
            StatusCode::INTERNAL_SERVER_ERROR => "An internal error occurred".to_string(),
            _ => self.to_string(),
        };
        let fields = match &self {
            ForumError::Validation(fields) => Some(fields.as_slice()),
            _ => None,
        };

        let body = ErrorBody {
            error: message,
            code,
            redirect,
            fields,
        };
        (status, Json(body)).into_response()
    }
}

/// MutationOutcome
///
/// The explicit result of a gated mutation. The boundary decides how to present
/// each arm; nothing is signalled through redirects or control flow.
#[derive(Debug, Clone, PartialEq)]
pub enum MutationOutcome<T> {
    /// The change was persisted; carries the resulting record.
    Applied(T),
    /// The submission failed validation and never reached the store.
    Invalid(Vec<FieldError>),
    /// The identity failed the ownership check; no store write happened.
    Unauthorized { redirect: String },
    /// The target record does not exist.
    NotFound,
}

impl<T> MutationOutcome<T> {
    pub fn is_applied(&self) -> bool {
        matches!(self, MutationOutcome::Applied(_))
    }
}

impl<T: Serialize> IntoResponse for MutationOutcome<T> {
    fn into_response(self) -> Response {
        match self {
            MutationOutcome::Applied(value) => (StatusCode::OK, Json(value)).into_response(),
            MutationOutcome::Invalid(fields) => ForumError::Validation(fields).into_response(),
            MutationOutcome::Unauthorized { redirect } => (
                StatusCode::FORBIDDEN,
                Json(json!({
                    "error": "Unauthorized User",
                    "code": "UNAUTHORIZED",
                    "redirect": redirect,
                })),
            )
                .into_response(),
            MutationOutcome::NotFound => (
                StatusCode::NOT_FOUND,
                Json(json!({
                    "error": "Invalid Request",
                    "code": "NOT_FOUND",
                    "redirect": "/",
                })),
            )
                .into_response(),
        }
    }
}
