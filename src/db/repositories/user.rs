use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, JoinType, QueryFilter,
    QuerySelect, RelationTrait, Set, TransactionTrait, sea_query::Expr,
};
use std::time::Duration;

use super::token::delete_tokens_for_user;
use crate::db::{StoreError, StoreResult, bounded};
use crate::domain::{TokenScope, User, UserId};
use crate::entities::{prelude::*, tokens, users};

impl From<users::Model> for User {
    fn from(model: users::Model) -> Self {
        Self {
            id: UserId::new(model.id),
            username: model.username,
            email: model.email,
            created_at: model.created_at,
        }
    }
}

/// A user together with the stored credential hash, for login checks only.
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub user: User,
    pub password_hash: String,
}

pub struct UserRepository {
    conn: DatabaseConnection,
    timeout: Duration,
}

impl UserRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection, timeout: Duration) -> Self {
        Self { conn, timeout }
    }

    /// Insert a new account. Uniqueness violations come back as
    /// [`StoreError::UniqueViolation`] naming the username or email column.
    pub async fn insert(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> StoreResult<User> {
        bounded(
            self.timeout,
            self.insert_unbounded(username, email, password_hash),
        )
        .await
    }

    async fn insert_unbounded(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> StoreResult<User> {
        let model = users::ActiveModel {
            username: Set(username.to_string()),
            email: Set(email.to_string()),
            password_hash: Set(password_hash.to_string()),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&self.conn)
        .await?;

        Ok(model.into())
    }

    pub async fn find_by_email(&self, email: &str) -> StoreResult<UserRecord> {
        bounded(self.timeout, async move {
            let model = Users::find()
                .filter(users::Column::Email.eq(email))
                .one(&self.conn)
                .await
                .map_err(StoreError::from)?
                .ok_or(StoreError::NotFound)?;

            let password_hash = model.password_hash.clone();
            Ok::<_, StoreError>(UserRecord {
                user: model.into(),
                password_hash,
            })
        })
        .await
    }

    pub async fn find_by_id(&self, id: UserId) -> StoreResult<User> {
        bounded(self.timeout, async move {
            Users::find_by_id(id.value())
                .one(&self.conn)
                .await
                .map_err(StoreError::from)?
                .map(User::from)
                .ok_or(StoreError::NotFound)
        })
        .await
    }

    /// Resolve the owner of a token issued under `scope` that is still valid
    /// at `now`. Unknown, expired and wrong-scope tokens are all
    /// [`StoreError::NotFound`].
    pub async fn find_for_token(
        &self,
        token: &str,
        scope: TokenScope,
        now: DateTime<Utc>,
    ) -> StoreResult<User> {
        bounded(self.timeout, async move {
            Users::find()
                .join(JoinType::InnerJoin, users::Relation::Tokens.def())
                .filter(tokens::Column::Token.eq(token))
                .filter(tokens::Column::Scope.eq(scope.as_str()))
                .filter(tokens::Column::ExpiresAt.gt(now))
                .one(&self.conn)
                .await
                .map_err(StoreError::from)?
                .map(User::from)
                .ok_or(StoreError::NotFound)
        })
        .await
    }

    /// Replace the credential hash and delete every token the user holds, in
    /// one transaction. Returns the number of revoked tokens.
    pub async fn reset_password(&self, id: UserId, password_hash: &str) -> StoreResult<u64> {
        bounded(self.timeout, self.reset_password_unbounded(id, password_hash)).await
    }

    async fn reset_password_unbounded(&self, id: UserId, password_hash: &str) -> StoreResult<u64> {
        let txn = self.conn.begin().await?;

        let updated = Users::update_many()
            .col_expr(users::Column::PasswordHash, Expr::value(password_hash))
            .filter(users::Column::Id.eq(id.value()))
            .exec(&txn)
            .await?;

        if updated.rows_affected == 0 {
            return Err(StoreError::NotFound);
        }

        let revoked = delete_tokens_for_user(&txn, id).await?;

        txn.commit().await?;
        Ok(revoked)
    }
}
