use kura_forum::{
    error::StoreError,
    models::{NewAnswer, NewCategory, NewQuestion, NewUser, QuestionPatch},
    repository::{MemoryRepository, PostgresRepository, QuestionFilter, Repository},
    search::TitlePattern,
};
use sqlx::PgPool;
use uuid::Uuid;

// --- Shared Scenarios ---
//
// Each scenario runs against any `Repository`, so the in-memory store and the
// Postgres store are held to the same contract.

fn unique(prefix: &str) -> String {
    format!("{prefix}-{}", Uuid::new_v4().simple())
}

fn new_question(title: &str, author: &str, category: &str) -> NewQuestion {
    NewQuestion {
        title: title.to_string(),
        author: author.to_string(),
        body: "body".to_string(),
        category: category.to_string(),
    }
}

async fn question_crud(repo: &dyn Repository) {
    let category = unique("CRUD");
    let saved = repo
        .save_question(new_question("What is a monad?", "alice", &category))
        .await
        .unwrap();
    assert_eq!(saved.author, "alice");
    assert_eq!(saved.created_at, saved.updated_at);

    let found = repo.find_question(saved.id).await.unwrap();
    assert_eq!(found.as_ref().map(|q| q.id), Some(saved.id));

    let updated = repo
        .update_question(
            saved.id,
            QuestionPatch {
                title: "What is a functor?".to_string(),
                body: "edited".to_string(),
                category: category.clone(),
            },
        )
        .await
        .unwrap()
        .expect("question exists");
    assert_eq!(updated.title, "What is a functor?");
    assert_eq!(updated.author, "alice");
    assert!(updated.updated_at >= saved.updated_at);

    assert!(
        repo.update_question(Uuid::new_v4(), QuestionPatch {
            title: "x".to_string(),
            body: String::new(),
            category: category.clone(),
        })
        .await
        .unwrap()
        .is_none()
    );

    assert!(repo.remove_question(saved.id).await.unwrap());
    assert!(!repo.remove_question(saved.id).await.unwrap());
    assert_eq!(repo.find_question(saved.id).await.unwrap(), None);
}

async fn answers_follow_their_question(repo: &dyn Repository) {
    let question = repo
        .save_question(new_question("Answer me", "alice", &unique("ANS")))
        .await
        .unwrap();

    let mut posted = Vec::new();
    for body in ["first", "second", "third"] {
        let answer = repo
            .save_answer(NewAnswer {
                parent: question.id,
                author: "bob".to_string(),
                body: body.to_string(),
            })
            .await
            .unwrap();
        posted.push(answer);
    }

    let answers = repo.find_answers(Some(question.id)).await.unwrap();
    assert_eq!(answers, posted);

    repo.remove_question(question.id).await.unwrap();
    assert!(repo.find_answers(Some(question.id)).await.unwrap().is_empty());
}

async fn title_and_category_filters(repo: &dyn Repository) {
    let category = unique("FILTER");
    let marker = unique("marker");
    repo.save_question(new_question(&format!("{marker} C++ (Intro)"), "alice", &category))
        .await
        .unwrap();
    repo.save_question(new_question(&format!("{marker} C Intro"), "alice", &category))
        .await
        .unwrap();
    repo.save_question(new_question(&format!("{marker} elsewhere"), "alice", &unique("OTHER")))
        .await
        .unwrap();

    let pattern = TitlePattern::literal(&format!("{} c++ (intro)", marker.to_uppercase())).unwrap();
    let matched = repo
        .find_questions(&QuestionFilter::title_matching(pattern))
        .await
        .unwrap();
    assert_eq!(matched.len(), 1);
    assert!(matched[0].title.ends_with("C++ (Intro)"));

    let in_category = repo
        .find_questions(&QuestionFilter::in_category(category.as_str()))
        .await
        .unwrap();
    assert_eq!(in_category.len(), 2);
    assert!(in_category[0].created_at >= in_category[1].created_at);
}

async fn users_are_unique_and_sanitized(repo: &dyn Repository) {
    let username = unique("user");
    let email = format!("{username}@example.com");
    let user = repo
        .save_user(NewUser {
            username: username.clone(),
            email: email.clone(),
            password_hash: "$argon2id$hash".to_string(),
            admin: false,
        })
        .await
        .unwrap();
    assert_eq!(user.username, username);

    let stored = repo.find_user_by_email(&email).await.unwrap().unwrap();
    assert_eq!(stored.password_hash, "$argon2id$hash");
    assert_eq!(stored.sanitize(), user);

    let duplicate_email = repo
        .save_user(NewUser {
            username: unique("other"),
            email: email.clone(),
            password_hash: String::new(),
            admin: false,
        })
        .await;
    assert!(matches!(duplicate_email, Err(StoreError::Conflict(ref f)) if f == "email"));

    let duplicate_username = repo
        .save_user(NewUser {
            username,
            email: format!("{}@example.com", unique("other")),
            password_hash: String::new(),
            admin: false,
        })
        .await;
    assert!(matches!(duplicate_username, Err(StoreError::Conflict(ref f)) if f == "username"));

    assert!(repo.find_users().await.unwrap().contains(&user));
    assert!(repo.find_user_by_email("nobody@nowhere").await.unwrap().is_none());
}

async fn categories_round_trip(repo: &dyn Repository) {
    let name = unique("CAT");
    let saved = repo
        .save_category(NewCategory {
            name: name.clone(),
            stream: "Computing".to_string(),
            year: 2,
            semester: 1,
        })
        .await
        .unwrap();
    assert!(repo.find_categories().await.unwrap().contains(&saved));
}

async fn answer_requires_existing_parent(repo: &dyn Repository) {
    let result = repo
        .save_answer(NewAnswer {
            parent: Uuid::new_v4(),
            author: "bob".to_string(),
            body: "orphan".to_string(),
        })
        .await;
    assert!(matches!(result, Err(StoreError::Conflict(ref f)) if f == "parent"));
}

// --- In-Memory Store ---

#[tokio::test]
async fn test_memory_question_crud() {
    question_crud(&MemoryRepository::new()).await;
}

#[tokio::test]
async fn test_memory_answers_follow_their_question() {
    answers_follow_their_question(&MemoryRepository::new()).await;
}

#[tokio::test]
async fn test_memory_title_and_category_filters() {
    title_and_category_filters(&MemoryRepository::new()).await;
}

#[tokio::test]
async fn test_memory_users_are_unique_and_sanitized() {
    users_are_unique_and_sanitized(&MemoryRepository::new()).await;
}

#[tokio::test]
async fn test_memory_categories_round_trip() {
    categories_round_trip(&MemoryRepository::new()).await;
}

#[tokio::test]
async fn test_memory_answer_requires_existing_parent() {
    answer_requires_existing_parent(&MemoryRepository::new()).await;
}

// --- Postgres Store (needs DATABASE_URL) ---

async fn postgres() -> PostgresRepository {
    dotenv::dotenv().ok();
    let db_url =
        std::env::var("DATABASE_URL").expect("DATABASE_URL must be set to run integration tests");
    let pool = PgPool::connect(&db_url)
        .await
        .expect("Failed to connect to database for integration tests.");
    let repo = PostgresRepository::new(pool);
    repo.migrate().await.expect("Failed to run database migrations.");
    repo
}

#[tokio::test]
#[ignore = "requires a Postgres DATABASE_URL"]
async fn test_postgres_question_crud() {
    question_crud(&postgres().await).await;
}

#[tokio::test]
#[ignore = "requires a Postgres DATABASE_URL"]
async fn test_postgres_answers_follow_their_question() {
    answers_follow_their_question(&postgres().await).await;
}

#[tokio::test]
#[ignore = "requires a Postgres DATABASE_URL"]
async fn test_postgres_title_and_category_filters() {
    title_and_category_filters(&postgres().await).await;
}

#[tokio::test]
#[ignore = "requires a Postgres DATABASE_URL"]
async fn test_postgres_users_are_unique_and_sanitized() {
    users_are_unique_and_sanitized(&postgres().await).await;
}

#[tokio::test]
#[ignore = "requires a Postgres DATABASE_URL"]
async fn test_postgres_categories_round_trip() {
    categories_round_trip(&postgres().await).await;
}

#[tokio::test]
#[ignore = "requires a Postgres DATABASE_URL"]
async fn test_postgres_answer_requires_existing_parent() {
    answer_requires_existing_parent(&postgres().await).await;
}

#[tokio::test]
#[ignore = "requires a Postgres DATABASE_URL"]
async fn test_postgres_title_search_ignores_nul() {
    let repo = postgres().await;
    let marker = unique("nul");
    repo.save_question(new_question(&format!("{marker} pointers"), "alice", &unique("NUL")))
        .await
        .unwrap();

    let pattern = TitlePattern::literal(&format!("{marker} poin\0ters")).unwrap();
    let matched = repo
        .find_questions(&QuestionFilter::title_matching(pattern))
        .await
        .unwrap();
    assert_eq!(matched.len(), 1);
}
