use super::{QuestionFilter, Repository};
use crate::{
    error::{StoreError, StoreResult},
    models::{
        Answer, Category, NewAnswer, NewCategory, NewQuestion, NewUser, Question, QuestionPatch,
        StoredUser, User,
    },
};
use async_trait::async_trait;
use sqlx::{PgPool, Postgres, migrate::MigrateError, query_builder::QueryBuilder};
use uuid::Uuid;

const QUESTION_COLUMNS: &str = "id, title, author, body, category, created_at, updated_at";

/// PostgresRepository
///
/// The concrete implementation of the `Repository` trait, backed by PostgreSQL.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Applies the embedded schema migrations from `./migrations`.
    pub async fn migrate(&self) -> Result<(), MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

/// Maps a unique-constraint violation on `users` to the name of the clashing field.
fn user_conflict(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.code().as_deref() == Some("23505") {
            let field = match db_err.constraint() {
                Some("uq_users_email") => "email",
                _ => "username",
            };
            return StoreError::Conflict(field.to_string());
        }
    }
    StoreError::Database(err)
}

/// Maps a foreign-key violation on `answers.parent` to `Conflict("parent")`: the
/// question was removed between the caller's lookup and the insert.
fn missing_parent(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.code().as_deref() == Some("23503") {
            return StoreError::Conflict("parent".to_string());
        }
    }
    StoreError::Database(err)
}

#[async_trait]
impl Repository for PostgresRepository {
    /// find_questions
    ///
    /// Builds the filter with `QueryBuilder` so every user-provided value is bound,
    /// never interpolated. Title filtering uses the case-insensitive regex operator
    /// `~*` with the already-escaped pattern, so it matches the term literally.
    async fn find_questions(&self, filter: &QuestionFilter) -> StoreResult<Vec<Question>> {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {QUESTION_COLUMNS} FROM questions WHERE TRUE"));

        if let Some(pattern) = &filter.title {
            builder.push(" AND title ~* ");
            builder.push_bind(pattern.as_regex().to_string());
        }
        if let Some(category) = &filter.category {
            builder.push(" AND category = ");
            builder.push_bind(category.clone());
        }
        builder.push(" ORDER BY created_at DESC");

        let questions = builder
            .build_query_as::<Question>()
            .fetch_all(&self.pool)
            .await
            .inspect_err(|e| tracing::error!("find_questions error: {:?}", e))?;
        Ok(questions)
    }

    async fn find_question(&self, id: Uuid) -> StoreResult<Option<Question>> {
        let question = sqlx::query_as::<_, Question>(&format!(
            "SELECT {QUESTION_COLUMNS} FROM questions WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(question)
    }

    async fn save_question(&self, question: NewQuestion) -> StoreResult<Question> {
        let saved = sqlx::query_as::<_, Question>(&format!(
            "INSERT INTO questions (id, title, author, body, category, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, NOW(), NOW()) RETURNING {QUESTION_COLUMNS}"
        ))
        .bind(Uuid::now_v7())
        .bind(question.title)
        .bind(question.author)
        .bind(question.body)
        .bind(question.category)
        .fetch_one(&self.pool)
        .await?;
        Ok(saved)
    }

    /// update_question
    ///
    /// The author column is deliberately absent from the `SET` list.
    async fn update_question(
        &self,
        id: Uuid,
        patch: QuestionPatch,
    ) -> StoreResult<Option<Question>> {
        let updated = sqlx::query_as::<_, Question>(&format!(
            "UPDATE questions SET title = $2, body = $3, category = $4, updated_at = NOW() \
             WHERE id = $1 RETURNING {QUESTION_COLUMNS}"
        ))
        .bind(id)
        .bind(patch.title)
        .bind(patch.body)
        .bind(patch.category)
        .fetch_optional(&self.pool)
        .await?;
        Ok(updated)
    }

    /// remove_question
    ///
    /// Answers go with it through the `ON DELETE CASCADE` foreign key.
    async fn remove_question(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM questions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_answers(&self, parent: Option<Uuid>) -> StoreResult<Vec<Answer>> {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT id, parent, author, body FROM answers");
        if let Some(parent) = parent {
            builder.push(" WHERE parent = ");
            builder.push_bind(parent);
        }
        // v7 ids sort in creation order.
        builder.push(" ORDER BY id ASC");

        let answers = builder
            .build_query_as::<Answer>()
            .fetch_all(&self.pool)
            .await
            .inspect_err(|e| tracing::error!("find_answers error: {:?}", e))?;
        Ok(answers)
    }

    async fn save_answer(&self, answer: NewAnswer) -> StoreResult<Answer> {
        let saved = sqlx::query_as::<_, Answer>(
            "INSERT INTO answers (id, parent, author, body) VALUES ($1, $2, $3, $4) \
             RETURNING id, parent, author, body",
        )
        .bind(Uuid::now_v7())
        .bind(answer.parent)
        .bind(answer.author)
        .bind(answer.body)
        .fetch_one(&self.pool)
        .await
        .map_err(missing_parent)?;
        Ok(saved)
    }

    async fn find_users(&self) -> StoreResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>(
            "SELECT id, username, email, admin FROM users ORDER BY id ASC",
        )
        .fetch_all(&self.pool)
        .await
        .inspect_err(|e| tracing::error!("find_users error: {:?}", e))?;
        Ok(users)
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<StoredUser>> {
        let user = sqlx::query_as::<_, StoredUser>(
            "SELECT id, username, email, password_hash, admin FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn save_user(&self, user: NewUser) -> StoreResult<User> {
        sqlx::query_as::<_, User>(
            "INSERT INTO users (id, username, email, password_hash, admin) \
             VALUES ($1, $2, $3, $4, $5) RETURNING id, username, email, admin",
        )
        .bind(Uuid::now_v7())
        .bind(user.username)
        .bind(user.email)
        .bind(user.password_hash)
        .bind(user.admin)
        .fetch_one(&self.pool)
        .await
        .map_err(user_conflict)
    }

    async fn find_categories(&self) -> StoreResult<Vec<Category>> {
        let categories = sqlx::query_as::<_, Category>(
            "SELECT id, name, stream, year, semester FROM categories ORDER BY name ASC",
        )
        .fetch_all(&self.pool)
        .await
        .inspect_err(|e| tracing::error!("find_categories error: {:?}", e))?;
        Ok(categories)
    }

    async fn save_category(&self, category: NewCategory) -> StoreResult<Category> {
        let saved = sqlx::query_as::<_, Category>(
            "INSERT INTO categories (id, name, stream, year, semester) \
             VALUES ($1, $2, $3, $4, $5) RETURNING id, name, stream, year, semester",
        )
        .bind(Uuid::now_v7())
        .bind(category.name)
        .bind(category.stream)
        .bind(category.year)
        .bind(category.semester)
        .fetch_one(&self.pool)
        .await?;
        Ok(saved)
    }
}
