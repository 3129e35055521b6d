use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set,
};
use std::time::Duration;

use crate::db::{StoreError, StoreResult, bounded};
use crate::domain::{Token, UserId};
use crate::entities::{prelude::*, tokens};

/// Delete every token of `user_id` regardless of scope, on any connection or
/// open transaction.
pub async fn delete_tokens_for_user<C>(conn: &C, user_id: UserId) -> Result<u64, DbErr>
where
    C: ConnectionTrait,
{
    Tokens::delete_many()
        .filter(tokens::Column::UserId.eq(user_id.value()))
        .exec(conn)
        .await
        .map(|res| res.rows_affected)
}

pub struct TokenRepository {
    conn: DatabaseConnection,
    timeout: Duration,
}

impl TokenRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection, timeout: Duration) -> Self {
        Self { conn, timeout }
    }

    /// Persist a freshly generated token. The plaintext value is the primary key.
    pub async fn insert(&self, token: &Token) -> StoreResult<()> {
        let active_model = tokens::ActiveModel {
            token: Set(token.plaintext.clone()),
            user_id: Set(token.user_id.value()),
            scope: Set(token.scope.as_str().to_string()),
            expires_at: Set(token.expires_at),
        };

        bounded(self.timeout, async move {
            Tokens::insert(active_model)
                .exec_without_returning(&self.conn)
                .await
                .map(|_| ())
                .map_err(StoreError::from)
        })
        .await
    }

    /// Delete every token of `user_id` regardless of scope.
    pub async fn delete_all_for_user(&self, user_id: UserId) -> StoreResult<u64> {
        bounded(self.timeout, async move {
            delete_tokens_for_user(&self.conn, user_id)
                .await
                .map_err(StoreError::from)
        })
        .await
    }
}
