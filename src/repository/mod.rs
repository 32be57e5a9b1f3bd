use crate::{
    error::StoreResult,
    models::{
        Answer, Category, NewAnswer, NewCategory, NewQuestion, NewUser, Question, QuestionPatch,
        StoredUser, User,
    },
    search::TitlePattern,
};
use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

mod memory;
mod postgres;

pub use memory::MemoryRepository;
pub use postgres::PostgresRepository;

/// QuestionFilter
///
/// Restricts a question listing. An empty filter returns every question.
#[derive(Debug, Clone, Default)]
pub struct QuestionFilter {
    /// Case-insensitive literal substring over the title.
    pub title: Option<TitlePattern>,
    /// Exact category name.
    pub category: Option<String>,
}

impl QuestionFilter {
    pub fn title_matching(pattern: TitlePattern) -> Self {
        Self {
            title: Some(pattern),
            ..Self::default()
        }
    }

    pub fn in_category(name: impl Into<String>) -> Self {
        Self {
            category: Some(name.into()),
            ..Self::default()
        }
    }
}

/// Repository Trait
///
/// The persistence collaborator: one collection per entity with find / find-one /
/// save / update / remove operations. Handlers and services only ever see this
/// trait, so the Postgres store and the in-memory store are interchangeable.
///
/// Every method reports store failures as [`StoreError`](crate::error::StoreError);
/// nothing is retried.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Questions ---
    /// Questions matching `filter`, newest-first.
    async fn find_questions(&self, filter: &QuestionFilter) -> StoreResult<Vec<Question>>;
    async fn find_question(&self, id: Uuid) -> StoreResult<Option<Question>>;
    async fn save_question(&self, question: NewQuestion) -> StoreResult<Question>;
    /// Replaces title, body and category and refreshes `updated_at`.
    /// Returns `None` when no question has that id.
    async fn update_question(&self, id: Uuid, patch: QuestionPatch)
    -> StoreResult<Option<Question>>;
    /// Removes the question and its answers. Returns false when nothing was removed.
    async fn remove_question(&self, id: Uuid) -> StoreResult<bool>;

    // --- Answers ---
    /// Answers in posting order, optionally restricted to one parent question.
    async fn find_answers(&self, parent: Option<Uuid>) -> StoreResult<Vec<Answer>>;
    async fn save_answer(&self, answer: NewAnswer) -> StoreResult<Answer>;

    // --- Users ---
    /// All users, sanitized.
    async fn find_users(&self) -> StoreResult<Vec<User>>;
    /// The stored row, password hash included. Callers sanitize before sharing it.
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<StoredUser>>;
    /// Fails with `StoreError::Conflict(field)` when the username or email is taken.
    async fn save_user(&self, user: NewUser) -> StoreResult<User>;

    // --- Categories ---
    async fn find_categories(&self) -> StoreResult<Vec<Category>>;
    async fn save_category(&self, category: NewCategory) -> StoreResult<Category>;
}

/// RepositoryState
///
/// The shared handle to the persistence layer held in the application state.
pub type RepositoryState = Arc<dyn Repository>;
