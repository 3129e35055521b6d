//! Domain service for accounts, sessions and password resets.

use thiserror::Error;
use tokio::task::JoinHandle;

use crate::db::StoreError;
use crate::domain::{Token, User};
use crate::services::credentials::CredentialError;
use crate::services::tokens::TokenError;
use crate::services::validator::FieldErrors;

/// Errors specific to authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("validation failed")]
    Validation(FieldErrors),

    #[error("a user with this username already exists")]
    DuplicateUsername,

    #[error("a user with this email address already exists")]
    DuplicateEmail,

    /// Unknown email or wrong password; the two are never told apart.
    #[error("invalid authentication credentials")]
    InvalidCredentials,

    #[error("invalid or missing authentication token")]
    InvalidToken,

    #[error("invalid or expired password reset token")]
    InvalidResetToken,

    #[error("user not found")]
    UserNotFound,

    #[error(transparent)]
    Credential(#[from] CredentialError),

    #[error(transparent)]
    Token(TokenError),

    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UniqueViolation(crate::db::UniqueField::Username) => Self::DuplicateUsername,
            StoreError::UniqueViolation(crate::db::UniqueField::Email) => Self::DuplicateEmail,
            other => Self::Store(other),
        }
    }
}

impl From<TokenError> for AuthError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Store(store) => Self::Store(store),
            other => Self::Token(other),
        }
    }
}

/// Domain service trait for authentication.
#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    /// Validates and creates an account. The plaintext password is hashed
    /// before it reaches storage and is never returned.
    ///
    /// # Errors
    ///
    /// [`AuthError::Validation`], [`AuthError::DuplicateUsername`] or
    /// [`AuthError::DuplicateEmail`] for rejected input.
    async fn register(&self, username: &str, email: &str, password: &str)
    -> Result<User, AuthError>;

    /// Verifies credentials and issues an authentication-scoped token.
    async fn login(&self, email: &str, password: &str) -> Result<Token, AuthError>;

    /// Resolves a bearer token to its owner.
    async fn authenticate(&self, token: &str) -> Result<User, AuthError>;

    /// Issues a password-reset token and hands delivery to a detached task.
    /// The returned handle may be dropped; delivery failures are only logged.
    async fn request_password_reset(&self, email: &str) -> Result<JoinHandle<()>, AuthError>;

    /// Replaces the password of the reset token's owner and revokes every
    /// token the owner holds.
    async fn reset_password(&self, token: &str, password: &str) -> Result<(), AuthError>;
}
