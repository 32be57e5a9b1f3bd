//! Feed aggregation: the `[questions, users, tags, answers]` snapshot behind the
//! home page and the admin dashboard.
//!
//! The four reads are independent and run concurrently. They are not wrapped in a
//! transaction, so a snapshot is a best-effort view: writes landing between the
//! reads may leave it reflecting no single instant.

use std::future::Future;

use crate::{
    error::{Collection, ForumError, ForumResult, StoreResult},
    models::{Answer, Category, FeedView, Question, User},
    repository::{QuestionFilter, RepositoryState},
};

/// Orders questions by descending creation time. Ties keep their relative order.
pub(crate) fn newest_first(questions: &mut [Question]) {
    questions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}

/// FeedSnapshot
///
/// One complete aggregation result. Never partially populated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedSnapshot {
    pub questions: Vec<Question>,
    pub users: Vec<User>,
    pub tags: Vec<Category>,
    pub answers: Vec<Answer>,
}

impl FeedSnapshot {
    pub fn into_parts(self) -> (Vec<Question>, Vec<User>, Vec<Category>, Vec<Answer>) {
        (self.questions, self.users, self.tags, self.answers)
    }
}

impl From<FeedSnapshot> for FeedView {
    fn from(snapshot: FeedSnapshot) -> Self {
        FeedView {
            questions: snapshot.questions,
            users: snapshot.users,
            tags: snapshot.tags,
            answers: snapshot.answers,
        }
    }
}

/// FeedService
///
/// Assembles a [`FeedSnapshot`] from four concurrent repository reads.
#[derive(Clone)]
pub struct FeedService {
    repo: RepositoryState,
}

impl FeedService {
    pub fn new(repo: RepositoryState) -> Self {
        Self { repo }
    }

    /// get_all
    ///
    /// Fans out the question, user, tag and answer reads and joins them. The first
    /// failing read aborts the whole aggregation with a single
    /// [`ForumError::Aggregation`]; callers never observe a partial tuple.
    pub async fn get_all(&self) -> ForumResult<FeedSnapshot> {
        let repo = &self.repo;
        let every_question = QuestionFilter::default();

        let (mut questions, users, tags, answers) = tokio::try_join!(
            stage(Collection::Questions, repo.find_questions(&every_question)),
            stage(Collection::Users, repo.find_users()),
            stage(Collection::Categories, repo.find_categories()),
            stage(Collection::Answers, repo.find_answers(None)),
        )?;
        newest_first(&mut questions);

        Ok(FeedSnapshot {
            questions,
            users,
            tags,
            answers,
        })
    }
}

async fn stage<T>(
    collection: Collection,
    read: impl Future<Output = StoreResult<T>>,
) -> ForumResult<T> {
    read.await.map_err(|source| {
        tracing::warn!(%collection, error = %source, "feed read failed");
        ForumError::Aggregation { collection, source }
    })
}
