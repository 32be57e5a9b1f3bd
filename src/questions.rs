//! Question and answer operations behind the forum's read and mutation routes.

use uuid::Uuid;

use crate::{
    error::{ForumError, ForumResult, MutationOutcome, StoreError, StoreResult},
    feed::newest_first,
    models::{
        Answer, AnswerForm, Category, Deleted, NewAnswer, NewQuestion, Question, QuestionForm,
        QuestionPatch, QuestionView, User,
    },
    policy::AuthorizationPolicy,
    repository::{QuestionFilter, RepositoryState},
};

/// QuestionService
///
/// Every mutation returns a [`MutationOutcome`]; only store failures travel as errors.
#[derive(Clone)]
pub struct QuestionService {
    repo: RepositoryState,
}

impl QuestionService {
    pub fn new(repo: RepositoryState) -> Self {
        Self { repo }
    }

    /// ask
    ///
    /// Persists a new question authored by `author`. Validation runs before the store
    /// is touched; the author always comes from the identity, never from the form.
    pub async fn ask(&self, author: &User, form: QuestionForm) -> StoreResult<MutationOutcome<Question>> {
        let errors = form.validate();
        if !errors.is_empty() {
            return Ok(MutationOutcome::Invalid(errors));
        }

        let question = self
            .repo
            .save_question(NewQuestion {
                title: form.title,
                author: author.username.clone(),
                body: form.body.unwrap_or_default(),
                category: form.category,
            })
            .await?;

        tracing::info!(question_id = %question.id, author = %question.author, "question added");
        Ok(MutationOutcome::Applied(question))
    }

    /// A question with its answers. The two reads run concurrently.
    pub async fn view(&self, id: Uuid) -> ForumResult<QuestionView> {
        let (question, answers) =
            tokio::try_join!(self.repo.find_question(id), self.repo.find_answers(Some(id)))?;
        let question = question.ok_or_else(|| ForumError::NotFound(format!("question {id}")))?;
        Ok(QuestionView { question, answers })
    }

    /// edit_form
    ///
    /// Loads a question for editing. `Applied` carries the question only when the
    /// identity passes the same ownership check that guards `edit` and `delete`.
    pub async fn edit_form(&self, identity: &User, id: Uuid) -> StoreResult<MutationOutcome<Question>> {
        let found = self.repo.find_question(id).await?;
        Ok(match AuthorizationPolicy::authorize(identity, found) {
            Ok(question) => MutationOutcome::Applied(question),
            Err(refused) => refused,
        })
    }

    /// edit
    ///
    /// Order of checks: existence, ownership, validation. The author field is
    /// never rewritten, so an edit cannot transfer ownership.
    pub async fn edit(
        &self,
        identity: &User,
        id: Uuid,
        form: QuestionForm,
    ) -> StoreResult<MutationOutcome<Question>> {
        let found = self.repo.find_question(id).await?;
        if let Err(refused) = AuthorizationPolicy::authorize(identity, found) {
            return Ok(refused);
        }

        let errors = form.validate();
        if !errors.is_empty() {
            return Ok(MutationOutcome::Invalid(errors));
        }

        let patch = QuestionPatch {
            title: form.title,
            body: form.body.unwrap_or_default(),
            category: form.category,
        };
        Ok(match self.repo.update_question(id, patch).await? {
            Some(question) => {
                tracing::info!(question_id = %id, "question updated");
                MutationOutcome::Applied(question)
            }
            // Removed between the lookup and the write.
            None => MutationOutcome::NotFound,
        })
    }

    /// delete
    ///
    /// Removes the question (and its answers) when the identity owns it.
    pub async fn delete(&self, identity: &User, id: Uuid) -> StoreResult<MutationOutcome<Deleted>> {
        let found = self.repo.find_question(id).await?;
        let question = match AuthorizationPolicy::authorize(identity, found) {
            Ok(question) => question,
            Err(refused) => return Ok(refused),
        };

        if !self.repo.remove_question(question.id).await? {
            return Ok(MutationOutcome::NotFound);
        }

        tracing::info!(question_id = %id, author = %question.author, "question deleted");
        Ok(MutationOutcome::Applied(Deleted {
            id,
            redirect: "/".to_string(),
        }))
    }

    /// answer
    ///
    /// Attaches an answer to an existing question.
    pub async fn answer(
        &self,
        author: &User,
        parent: Uuid,
        form: AnswerForm,
    ) -> StoreResult<MutationOutcome<Answer>> {
        let errors = form.validate();
        if !errors.is_empty() {
            return Ok(MutationOutcome::Invalid(errors));
        }

        if self.repo.find_question(parent).await?.is_none() {
            return Ok(MutationOutcome::NotFound);
        }

        let saved = self
            .repo
            .save_answer(NewAnswer {
                parent,
                author: author.username.clone(),
                body: form.body,
            })
            .await;

        match saved {
            Ok(answer) => {
                tracing::info!(answer_id = %answer.id, question_id = %parent, "answer added");
                Ok(MutationOutcome::Applied(answer))
            }
            // Removed between the lookup and the write.
            Err(StoreError::Conflict(field)) if field == "parent" => {
                tracing::debug!(question_id = %parent, "question vanished before answer was saved");
                Ok(MutationOutcome::NotFound)
            }
            Err(e) => Err(e),
        }
    }

    /// Questions filed under one category name, newest-first.
    pub async fn by_category(&self, name: &str) -> StoreResult<Vec<Question>> {
        let mut questions = self
            .repo
            .find_questions(&QuestionFilter::in_category(name))
            .await?;
        newest_first(&mut questions);
        Ok(questions)
    }

    pub async fn categories(&self) -> StoreResult<Vec<Category>> {
        self.repo.find_categories().await
    }
}
