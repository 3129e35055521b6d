//! `SeaORM` implementation of the `AuthService` trait.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::Instrument;

use crate::config::SecurityConfig;
use crate::db::{Store, StoreError};
use crate::domain::{Token, TokenScope, User};
use crate::services::auth_service::{AuthError, AuthService};
use crate::services::credentials::CredentialHasher;
use crate::services::mailer::{Mailer, OutboundEmail};
use crate::services::tokens::{TokenError, TokenIssuer};
use crate::services::validator::{self, Validator};

pub struct SeaOrmAuthService {
    store: Store,
    hasher: CredentialHasher,
    issuer: TokenIssuer,
    mailer: Arc<dyn Mailer>,
    security: SecurityConfig,
}

impl SeaOrmAuthService {
    #[must_use]
    pub fn new(store: Store, security: SecurityConfig, mailer: Arc<dyn Mailer>) -> Self {
        Self {
            hasher: CredentialHasher::new(security.clone()),
            issuer: TokenIssuer::new(store.clone()),
            store,
            mailer,
            security,
        }
    }
}

#[async_trait]
impl AuthService for SeaOrmAuthService {
    async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<User, AuthError> {
        let mut v = Validator::new();
        validator::validate_user(&mut v, username, email, password);
        v.finish().map_err(AuthError::Validation)?;

        let hash = self.hasher.set(password).await?;
        let user = self.store.user_repo().insert(username, email, &hash).await?;

        tracing::info!(user_id = %user.id, "User registered");
        Ok(user)
    }

    async fn login(&self, email: &str, password: &str) -> Result<Token, AuthError> {
        let mut v = Validator::new();
        validator::validate_email(&mut v, email);
        validator::validate_password_plaintext(&mut v, password);
        v.finish().map_err(AuthError::Validation)?;

        let record = match self.store.user_repo().find_by_email(email).await {
            Ok(record) => record,
            Err(StoreError::NotFound) => return Err(AuthError::InvalidCredentials),
            Err(e) => return Err(e.into()),
        };

        if !self.hasher.compare(&record.password_hash, password).await? {
            return Err(AuthError::InvalidCredentials);
        }

        let token = self
            .issuer
            .issue(
                record.user.id,
                self.security.authentication_ttl(),
                TokenScope::Authentication,
            )
            .await?;

        Ok(token)
    }

    async fn authenticate(&self, token: &str) -> Result<User, AuthError> {
        match self.issuer.resolve(token, TokenScope::Authentication).await {
            Ok(user) => Ok(user),
            Err(TokenError::NotFound) => Err(AuthError::InvalidToken),
            Err(e) => Err(e.into()),
        }
    }

    async fn request_password_reset(&self, email: &str) -> Result<JoinHandle<()>, AuthError> {
        let mut v = Validator::new();
        validator::validate_email(&mut v, email);
        v.finish().map_err(AuthError::Validation)?;

        let user = match self.store.user_repo().find_by_email(email).await {
            Ok(record) => record.user,
            Err(StoreError::NotFound) => return Err(AuthError::UserNotFound),
            Err(e) => return Err(e.into()),
        };

        let token = self
            .issuer
            .issue(
                user.id,
                self.security.password_reset_ttl(),
                TokenScope::PasswordReset,
            )
            .await?;

        let mailer = Arc::clone(&self.mailer);
        let message = OutboundEmail::password_reset(&user.email, &token.plaintext);
        let span = tracing::info_span!("password_reset_mail", user_id = %user.id);

        let handle = tokio::spawn(
            async move {
                match mailer.send(message).await {
                    Ok(()) => tracing::info!("Password reset mail dispatched"),
                    Err(e) => tracing::error!(error = %e, "Failed to send password reset mail"),
                }
            }
            .instrument(span),
        );

        Ok(handle)
    }

    async fn reset_password(&self, token: &str, password: &str) -> Result<(), AuthError> {
        let mut v = Validator::new();
        validator::validate_password_reset(&mut v, token, password);
        v.finish().map_err(AuthError::Validation)?;

        let user = match self.issuer.resolve(token, TokenScope::PasswordReset).await {
            Ok(user) => user,
            Err(TokenError::NotFound) => return Err(AuthError::InvalidResetToken),
            Err(e) => return Err(e.into()),
        };

        let hash = self.hasher.set(password).await?;
        let revoked = self.store.user_repo().reset_password(user.id, &hash).await?;

        tracing::info!(user_id = %user.id, revoked, "Password reset");
        Ok(())
    }
}
