use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

// --- Core Records (Mapped to Database) ---

/// Question
///
/// A forum question. `author` holds the poster's username by value and `category`
/// holds a category name; neither is a foreign key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Question {
    pub id: Uuid,
    pub title: String,
    pub author: String,
    pub body: String,
    pub category: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// Answer
///
/// A reply to a question. `parent` always references an existing question;
/// answers are removed together with their parent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Answer {
    pub id: Uuid,
    pub parent: Uuid,
    pub author: String,
    pub body: String,
}

/// User
///
/// The sanitized user record. This is the only user shape that reaches the session,
/// the request context, or a view-model: it has no password field at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub admin: bool,
}

/// StoredUser
///
/// The user row as persisted, including the argon2 password hash. Only the
/// repository and the login path ever hold one; call [`StoredUser::sanitize`]
/// before handing it anywhere else.
#[derive(Debug, Clone, FromRow)]
pub struct StoredUser {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub admin: bool,
}

impl StoredUser {
    /// Drops the password hash, producing the record that may be attached to a request.
    pub fn sanitize(self) -> User {
        User {
            id: self.id,
            username: self.username,
            email: self.email,
            admin: self.admin,
        }
    }
}

/// Category
///
/// A course-subject classifier ("tag"). Questions reference it by `name`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub stream: String,
    pub year: i32,
    pub semester: i32,
}

// --- Insert / Patch Records (Repository Inputs) ---

/// Fields supplied when persisting a new question. Timestamps and id are store-generated.
#[derive(Debug, Clone)]
pub struct NewQuestion {
    pub title: String,
    pub author: String,
    pub body: String,
    pub category: String,
}

/// Replacement content for an existing question. The author is never patched.
#[derive(Debug, Clone)]
pub struct QuestionPatch {
    pub title: String,
    pub body: String,
    pub category: String,
}

#[derive(Debug, Clone)]
pub struct NewAnswer {
    pub parent: Uuid,
    pub author: String,
    pub body: String,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub admin: bool,
}

#[derive(Debug, Clone, Default)]
pub struct NewCategory {
    pub name: String,
    pub stream: String,
    pub year: i32,
    pub semester: i32,
}

// --- Request Payloads (Input Schemas) ---

/// FieldError
///
/// One validation failure, keyed by the offending form field. Collected per field
/// and handed back to the caller for re-display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &str, message: &str) -> Self {
        Self {
            field: field.to_string(),
            message: message.to_string(),
        }
    }
}

/// QuestionForm
///
/// Payload for asking (`POST /questions/ask`) and editing (`POST /questions/edit/{id}`)
/// a question. Missing fields deserialize as empty so validation can report them.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
#[serde(default)]
pub struct QuestionForm {
    pub title: String,
    pub body: Option<String>,
    pub category: String,
}

impl QuestionForm {
    /// Title and category are required; the body is optional.
    pub fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        if self.title.trim().is_empty() {
            errors.push(FieldError::new("title", "Title is required"));
        }
        if self.category.trim().is_empty() {
            errors.push(FieldError::new("category", "Category is required"));
        }
        errors
    }
}

/// AnswerForm
///
/// Payload for posting an answer (`POST /answer/{question_id}`).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
#[serde(default)]
pub struct AnswerForm {
    pub body: String,
}

impl AnswerForm {
    pub fn validate(&self) -> Vec<FieldError> {
        if self.body.trim().is_empty() {
            vec![FieldError::new("body", "Answer cannot be blank")]
        } else {
            Vec::new()
        }
    }
}

/// Minimum accepted password length at registration.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// RegisterForm
///
/// Payload for `POST /user/register`. The password is hashed before it reaches
/// the repository and is never echoed back.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
#[serde(default)]
pub struct RegisterForm {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl RegisterForm {
    pub fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        if self.username.is_empty() {
            errors.push(FieldError::new("username", "Username is required"));
        } else if self.username.chars().any(char::is_whitespace) {
            errors.push(FieldError::new("username", "Username cannot contain spaces"));
        }
        if self.email.trim().is_empty() {
            errors.push(FieldError::new("email", "Email is required"));
        } else if !self.email.contains('@') {
            errors.push(FieldError::new("email", "Email is not valid"));
        }
        if self.password.chars().count() < MIN_PASSWORD_LENGTH {
            errors.push(FieldError::new(
                "password",
                &format!("Password must be at least {MIN_PASSWORD_LENGTH} characters long"),
            ));
        }
        errors
    }
}

/// LoginForm
///
/// Payload for `POST /user/login`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
#[serde(default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

// --- View-Models (Output Schemas handed to the render boundary) ---

/// FeedView
///
/// The aggregation snapshot `[questions, users, tags, answers]` as rendered by the
/// home feed and the admin dashboard. Questions are newest-first.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct FeedView {
    pub questions: Vec<Question>,
    pub users: Vec<User>,
    pub tags: Vec<Category>,
    pub answers: Vec<Answer>,
}

/// SearchView
///
/// Search results alongside the sidebar data. `notice` is set when nothing matched.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct SearchView {
    pub questions: Vec<Question>,
    pub users: Vec<User>,
    pub tags: Vec<Category>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
}

/// QuestionView
///
/// A single question with its answers in posting order.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct QuestionView {
    pub question: Question,
    pub answers: Vec<Answer>,
}

/// CategoryView
///
/// Questions scoped to one category name.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CategoryView {
    pub subject: String,
    pub questions: Vec<Question>,
}

/// AskView
///
/// Data backing the "ask a question" form: the selectable categories.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct AskView {
    pub categories: Vec<Category>,
}

/// SessionResponse
///
/// Returned on login: the sanitized user and the session token (also set as a cookie).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct SessionResponse {
    pub user: User,
    pub token: String,
}

/// Deleted
///
/// Acknowledges a deletion and names where the caller should go next.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct Deleted {
    pub id: Uuid,
    pub redirect: String,
}
