use async_trait::async_trait;
use kura_forum::{
    error::{MutationOutcome, StoreResult},
    models::{
        Answer, AnswerForm, Category, NewAnswer, NewCategory, NewQuestion, NewUser, Question,
        QuestionForm, QuestionPatch, StoredUser, User,
    },
    policy::AuthorizationPolicy,
    questions::QuestionService,
    repository::{MemoryRepository, QuestionFilter, Repository, RepositoryState},
};
use std::sync::Arc;
use uuid::Uuid;

/// Hands out a question and deletes it in the same breath, so the next write
/// against it races a concurrent removal.
struct VanishingRepository {
    inner: MemoryRepository,
}

#[async_trait]
impl Repository for VanishingRepository {
    async fn find_questions(&self, filter: &QuestionFilter) -> StoreResult<Vec<Question>> {
        self.inner.find_questions(filter).await
    }
    async fn find_question(&self, id: Uuid) -> StoreResult<Option<Question>> {
        let found = self.inner.find_question(id).await?;
        self.inner.remove_question(id).await?;
        Ok(found)
    }
    async fn save_question(&self, question: NewQuestion) -> StoreResult<Question> {
        self.inner.save_question(question).await
    }
    async fn update_question(
        &self,
        id: Uuid,
        patch: QuestionPatch,
    ) -> StoreResult<Option<Question>> {
        self.inner.update_question(id, patch).await
    }
    async fn remove_question(&self, id: Uuid) -> StoreResult<bool> {
        self.inner.remove_question(id).await
    }
    async fn find_answers(&self, parent: Option<Uuid>) -> StoreResult<Vec<Answer>> {
        self.inner.find_answers(parent).await
    }
    async fn save_answer(&self, answer: NewAnswer) -> StoreResult<Answer> {
        self.inner.save_answer(answer).await
    }
    async fn find_users(&self) -> StoreResult<Vec<User>> {
        self.inner.find_users().await
    }
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<StoredUser>> {
        self.inner.find_user_by_email(email).await
    }
    async fn save_user(&self, user: NewUser) -> StoreResult<User> {
        self.inner.save_user(user).await
    }
    async fn find_categories(&self) -> StoreResult<Vec<Category>> {
        self.inner.find_categories().await
    }
    async fn save_category(&self, category: NewCategory) -> StoreResult<Category> {
        self.inner.save_category(category).await
    }
}

fn user(username: &str) -> User {
    User {
        id: Uuid::new_v4(),
        username: username.to_string(),
        email: format!("{username}@example.com"),
        admin: false,
    }
}

fn form(title: &str) -> QuestionForm {
    QuestionForm {
        title: title.to_string(),
        body: Some("details".to_string()),
        category: "COMP1010".to_string(),
    }
}

async fn alice_question() -> (Arc<MemoryRepository>, QuestionService, Question) {
    let repo = Arc::new(MemoryRepository::new());
    let service = QuestionService::new(repo.clone() as RepositoryState);
    let question = match service.ask(&user("alice"), form("Original")).await.unwrap() {
        MutationOutcome::Applied(question) => question,
        other => panic!("ask should apply, got {other:?}"),
    };
    (repo, service, question)
}

#[test]
fn test_can_mutate_is_exact_username_equality() {
    let question = Question {
        author: "alice".to_string(),
        ..Question::default()
    };

    assert!(AuthorizationPolicy::can_mutate(&user("alice"), &question));
    assert!(!AuthorizationPolicy::can_mutate(&user("bob"), &question));
    assert!(!AuthorizationPolicy::can_mutate(&user("Alice"), &question));
    assert!(!AuthorizationPolicy::can_mutate(&user("alice "), &question));
}

#[test]
fn test_admin_flag_does_not_grant_ownership() {
    let question = Question {
        author: "alice".to_string(),
        ..Question::default()
    };
    let admin = User {
        admin: true,
        ..user("root")
    };
    assert!(!AuthorizationPolicy::can_mutate(&admin, &question));
}

#[tokio::test]
async fn test_ask_takes_author_from_identity() {
    let (_, _, question) = alice_question().await;
    assert_eq!(question.author, "alice");
    assert_eq!(question.title, "Original");
}

#[tokio::test]
async fn test_non_owner_cannot_delete() {
    let (repo, service, question) = alice_question().await;

    let outcome = service.delete(&user("bob"), question.id).await.unwrap();

    assert_eq!(
        outcome,
        MutationOutcome::Unauthorized {
            redirect: format!("/questions/{}", question.id)
        }
    );
    assert_eq!(repo.find_question(question.id).await.unwrap(), Some(question));
}

#[tokio::test]
async fn test_owner_deletes_and_question_is_gone() {
    let (repo, service, question) = alice_question().await;
    service
        .answer(
            &user("bob"),
            question.id,
            AnswerForm {
                body: "Try the lab notes".to_string(),
            },
        )
        .await
        .unwrap();

    let outcome = service.delete(&user("alice"), question.id).await.unwrap();

    match outcome {
        MutationOutcome::Applied(deleted) => {
            assert_eq!(deleted.id, question.id);
            assert_eq!(deleted.redirect, "/");
        }
        other => panic!("owner delete should apply, got {other:?}"),
    }
    assert_eq!(repo.find_question(question.id).await.unwrap(), None);
    assert!(repo.find_answers(Some(question.id)).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_non_owner_cannot_edit() {
    let (repo, service, question) = alice_question().await;

    let outcome = service
        .edit(&user("bob"), question.id, form("Hijacked"))
        .await
        .unwrap();

    assert!(matches!(outcome, MutationOutcome::Unauthorized { .. }));
    assert_eq!(repo.find_question(question.id).await.unwrap(), Some(question));
}

#[tokio::test]
async fn test_non_owner_cannot_open_edit_form() {
    let (_, service, question) = alice_question().await;

    let outcome = service.edit_form(&user("bob"), question.id).await.unwrap();
    assert!(matches!(outcome, MutationOutcome::Unauthorized { .. }));

    let outcome = service.edit_form(&user("alice"), question.id).await.unwrap();
    assert_eq!(outcome, MutationOutcome::Applied(question));
}

#[tokio::test]
async fn test_owner_edit_keeps_author() {
    let (_, service, question) = alice_question().await;

    let outcome = service
        .edit(&user("alice"), question.id, form("Revised"))
        .await
        .unwrap();

    match outcome {
        MutationOutcome::Applied(updated) => {
            assert_eq!(updated.id, question.id);
            assert_eq!(updated.title, "Revised");
            assert_eq!(updated.author, "alice");
            assert_eq!(updated.created_at, question.created_at);
            assert!(updated.updated_at >= question.updated_at);
        }
        other => panic!("owner edit should apply, got {other:?}"),
    }
}

#[tokio::test]
async fn test_invalid_edit_never_reaches_the_store() {
    let (repo, service, question) = alice_question().await;
    let calls_before = repo.calls();

    let outcome = service
        .edit(&user("alice"), question.id, form("   "))
        .await
        .unwrap();

    match outcome {
        MutationOutcome::Invalid(errors) => {
            assert_eq!(errors.len(), 1);
            assert_eq!(errors[0].field, "title");
        }
        other => panic!("blank title should be invalid, got {other:?}"),
    }
    // Only the existence lookup ran.
    assert_eq!(repo.calls(), calls_before + 1);
    assert_eq!(repo.find_question(question.id).await.unwrap(), Some(question));
}

#[tokio::test]
async fn test_mutating_missing_question_is_not_found() {
    let (_, service, _) = alice_question().await;
    let missing = Uuid::new_v4();

    assert_eq!(
        service.delete(&user("alice"), missing).await.unwrap(),
        MutationOutcome::NotFound
    );
    assert_eq!(
        service.edit(&user("alice"), missing, form("x")).await.unwrap(),
        MutationOutcome::NotFound
    );
}

#[tokio::test]
async fn test_answer_to_missing_question_is_not_found() {
    let (_, service, _) = alice_question().await;

    let outcome = service
        .answer(
            &user("bob"),
            Uuid::new_v4(),
            AnswerForm {
                body: "hello".to_string(),
            },
        )
        .await
        .unwrap();

    assert_eq!(outcome, MutationOutcome::NotFound);
}

#[tokio::test]
async fn test_answer_to_question_removed_mid_request_is_not_found() {
    let inner = MemoryRepository::new();
    let question = inner
        .save_question(NewQuestion {
            title: "Short-lived".to_string(),
            author: "alice".to_string(),
            body: String::new(),
            category: "COMP1010".to_string(),
        })
        .await
        .unwrap();
    let repo = Arc::new(VanishingRepository { inner });
    let service = QuestionService::new(repo.clone() as RepositoryState);

    let outcome = service
        .answer(
            &user("bob"),
            question.id,
            AnswerForm {
                body: "Too late".to_string(),
            },
        )
        .await
        .unwrap();

    assert_eq!(outcome, MutationOutcome::NotFound);
    assert!(repo.inner.find_answers(None).await.unwrap().is_empty());
}
