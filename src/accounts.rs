//! Account registration and credential checks.

use crate::{
    auth::password::{hash_password, verify_password},
    error::{ForumError, ForumResult, MutationOutcome, StoreError},
    models::{FieldError, LoginForm, NewUser, RegisterForm, User},
    repository::RepositoryState,
};

/// The single message returned for every failed login, so callers cannot probe
/// which emails are registered.
pub const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// AccountService
///
/// Owns the only code paths that ever see a plaintext password or a stored hash.
/// Everything it hands back is a sanitized [`User`].
#[derive(Clone)]
pub struct AccountService {
    repo: RepositoryState,
}

impl AccountService {
    pub fn new(repo: RepositoryState) -> Self {
        Self { repo }
    }

    /// register
    ///
    /// Validates the form, hashes the password and persists a non-admin user. A
    /// duplicate username or email comes back as `Invalid` on that field.
    pub async fn register(&self, form: RegisterForm) -> ForumResult<MutationOutcome<User>> {
        let errors = form.validate();
        if !errors.is_empty() {
            return Ok(MutationOutcome::Invalid(errors));
        }

        let password_hash = hash_password(&form.password)
            .map_err(|e| ForumError::Internal(format!("password hashing failed: {e}")))?;

        let saved = self
            .repo
            .save_user(NewUser {
                username: form.username,
                email: form.email,
                password_hash,
                admin: false,
            })
            .await;

        match saved {
            Ok(user) => {
                tracing::info!(user_id = %user.id, username = %user.username, "user registered");
                Ok(MutationOutcome::Applied(user))
            }
            Err(StoreError::Conflict(field)) => {
                tracing::debug!(%field, "registration conflict");
                let message = match field.as_str() {
                    "email" => "Email is already registered",
                    _ => "Username is already taken",
                };
                Ok(MutationOutcome::Invalid(vec![FieldError::new(&field, message)]))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// login
    ///
    /// Looks the user up by email and checks the password against the stored hash.
    /// An unknown email, a wrong password and an unreadable hash all fail the same way.
    pub async fn login(&self, form: LoginForm) -> ForumResult<User> {
        let rejected = || ForumError::Unauthorized(INVALID_CREDENTIALS.to_string());

        if form.email.is_empty() || form.password.is_empty() {
            return Err(rejected());
        }

        let Some(stored) = self.repo.find_user_by_email(&form.email).await? else {
            tracing::debug!(email = %form.email, "login for unknown email");
            return Err(rejected());
        };

        match verify_password(&form.password, &stored.password_hash) {
            Ok(true) => {
                tracing::info!(user_id = %stored.id, "user logged in");
                Ok(stored.sanitize())
            }
            Ok(false) => {
                tracing::debug!(user_id = %stored.id, "login with wrong password");
                Err(rejected())
            }
            Err(e) => {
                tracing::warn!(user_id = %stored.id, error = %e, "stored password hash is unreadable");
                Err(rejected())
            }
        }
    }
}
