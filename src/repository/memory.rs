use super::{QuestionFilter, Repository};
use crate::{
    error::{Collection, StoreError, StoreResult},
    models::{
        Answer, Category, NewAnswer, NewCategory, NewQuestion, NewUser, Question, QuestionPatch,
        StoredUser, User,
    },
};
use async_trait::async_trait;
use chrono::Utc;
use std::{
    collections::HashSet,
    sync::atomic::{AtomicUsize, Ordering},
};
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
struct Tables {
    questions: Vec<Question>,
    answers: Vec<Answer>,
    users: Vec<StoredUser>,
    categories: Vec<Category>,
}

/// MemoryRepository
///
/// An in-process implementation of `Repository`. Selected at startup when no
/// `DATABASE_URL` is configured in local mode, and used as the fixture store in tests.
///
/// Collections can be marked as failing to simulate store outages, and every
/// trait call is counted so callers can assert that no query ran.
#[derive(Default)]
pub struct MemoryRepository {
    tables: RwLock<Tables>,
    failing: HashSet<Collection>,
    calls: AtomicUsize,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every operation on `collection` fails with `StoreError::Unavailable`.
    pub fn failing(mut self, collection: Collection) -> Self {
        self.failing.insert(collection);
        self
    }

    /// Number of `Repository` calls served so far, failed ones included.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Inserts a fully-formed question, keeping its id and timestamps.
    /// Does not count as a repository call.
    pub async fn insert_question(&self, question: Question) {
        self.tables.write().await.questions.push(question);
    }

    fn enter(&self, collection: Collection) -> StoreResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.contains(&collection) {
            return Err(StoreError::Unavailable(collection));
        }
        Ok(())
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn find_questions(&self, filter: &QuestionFilter) -> StoreResult<Vec<Question>> {
        self.enter(Collection::Questions)?;
        let title = filter.title.as_ref().map(|p| p.compile()).transpose()?;

        let tables = self.tables.read().await;
        let mut questions: Vec<Question> = tables
            .questions
            .iter()
            .filter(|q| title.as_ref().is_none_or(|regex| regex.is_match(&q.title)))
            .filter(|q| filter.category.as_ref().is_none_or(|c| &q.category == c))
            .cloned()
            .collect();
        questions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(questions)
    }

    async fn find_question(&self, id: Uuid) -> StoreResult<Option<Question>> {
        self.enter(Collection::Questions)?;
        let tables = self.tables.read().await;
        Ok(tables.questions.iter().find(|q| q.id == id).cloned())
    }

    async fn save_question(&self, question: NewQuestion) -> StoreResult<Question> {
        self.enter(Collection::Questions)?;
        let now = Utc::now();
        let saved = Question {
            id: Uuid::now_v7(),
            title: question.title,
            author: question.author,
            body: question.body,
            category: question.category,
            created_at: now,
            updated_at: now,
        };
        self.tables.write().await.questions.push(saved.clone());
        Ok(saved)
    }

    async fn update_question(
        &self,
        id: Uuid,
        patch: QuestionPatch,
    ) -> StoreResult<Option<Question>> {
        self.enter(Collection::Questions)?;
        let mut tables = self.tables.write().await;
        let Some(question) = tables.questions.iter_mut().find(|q| q.id == id) else {
            return Ok(None);
        };
        question.title = patch.title;
        question.body = patch.body;
        question.category = patch.category;
        question.updated_at = Utc::now();
        Ok(Some(question.clone()))
    }

    async fn remove_question(&self, id: Uuid) -> StoreResult<bool> {
        self.enter(Collection::Questions)?;
        let mut tables = self.tables.write().await;
        let before = tables.questions.len();
        tables.questions.retain(|q| q.id != id);
        let removed = tables.questions.len() != before;
        if removed {
            tables.answers.retain(|a| a.parent != id);
        }
        Ok(removed)
    }

    async fn find_answers(&self, parent: Option<Uuid>) -> StoreResult<Vec<Answer>> {
        self.enter(Collection::Answers)?;
        let tables = self.tables.read().await;
        Ok(tables
            .answers
            .iter()
            .filter(|a| parent.is_none_or(|p| a.parent == p))
            .cloned()
            .collect())
    }

    async fn save_answer(&self, answer: NewAnswer) -> StoreResult<Answer> {
        self.enter(Collection::Answers)?;
        let mut tables = self.tables.write().await;
        if !tables.questions.iter().any(|q| q.id == answer.parent) {
            return Err(StoreError::Conflict("parent".to_string()));
        }
        let saved = Answer {
            id: Uuid::now_v7(),
            parent: answer.parent,
            author: answer.author,
            body: answer.body,
        };
        tables.answers.push(saved.clone());
        Ok(saved)
    }

    async fn find_users(&self) -> StoreResult<Vec<User>> {
        self.enter(Collection::Users)?;
        let tables = self.tables.read().await;
        Ok(tables.users.iter().cloned().map(StoredUser::sanitize).collect())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<StoredUser>> {
        self.enter(Collection::Users)?;
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.email == email).cloned())
    }

    async fn save_user(&self, user: NewUser) -> StoreResult<User> {
        self.enter(Collection::Users)?;
        let mut tables = self.tables.write().await;
        if tables.users.iter().any(|u| u.email == user.email) {
            return Err(StoreError::Conflict("email".to_string()));
        }
        if tables.users.iter().any(|u| u.username == user.username) {
            return Err(StoreError::Conflict("username".to_string()));
        }
        let stored = StoredUser {
            id: Uuid::now_v7(),
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            admin: user.admin,
        };
        tables.users.push(stored.clone());
        Ok(stored.sanitize())
    }

    async fn find_categories(&self) -> StoreResult<Vec<Category>> {
        self.enter(Collection::Categories)?;
        let tables = self.tables.read().await;
        let mut categories = tables.categories.clone();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn save_category(&self, category: NewCategory) -> StoreResult<Category> {
        self.enter(Collection::Categories)?;
        let saved = Category {
            id: Uuid::now_v7(),
            name: category.name,
            stream: category.stream,
            year: category.year,
            semester: category.semester,
        };
        self.tables.write().await.categories.push(saved.clone());
        Ok(saved)
    }
}
