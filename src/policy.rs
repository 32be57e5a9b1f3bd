//! Ownership-based authorization for question mutations.

use crate::{
    error::MutationOutcome,
    models::{Question, User},
};

/// AuthorizationPolicy
///
/// A question may be edited or deleted only by the identity whose username equals
/// the question's stored `author`. Edit and delete share this one rule.
pub struct AuthorizationPolicy;

impl AuthorizationPolicy {
    /// Exact, case-sensitive string equality between username and author.
    pub fn can_mutate(identity: &User, question: &Question) -> bool {
        identity.username == question.author
    }

    /// authorize
    ///
    /// Resolves a looked-up question into either the question the identity may
    /// mutate, or the outcome to hand back instead (`NotFound` or `Unauthorized`
    /// pointing back at the question). Performs no store operation.
    pub fn authorize<T>(
        identity: &User,
        found: Option<Question>,
    ) -> Result<Question, MutationOutcome<T>> {
        match found {
            None => Err(MutationOutcome::NotFound),
            Some(question) if Self::can_mutate(identity, &question) => Ok(question),
            Some(question) => {
                tracing::warn!(
                    user = %identity.username,
                    author = %question.author,
                    question_id = %question.id,
                    "ownership check refused mutation"
                );
                Err(MutationOutcome::Unauthorized {
                    redirect: format!("/questions/{}", question.id),
                })
            }
        }
    }
}
