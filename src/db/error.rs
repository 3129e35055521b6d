//! Structured classification of storage failures.
//!
//! Callers match on [`StoreError`] instead of on driver message text. The only
//! place that looks at backend wording is [`UniqueField::from_violation`], which
//! turns SeaORM's `SqlErr::UniqueConstraintViolation` into the violated column.

use sea_orm::{DbErr, SqlErr};
use thiserror::Error;

/// Column whose uniqueness constraint rejected a write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UniqueField {
    Username,
    Email,
    TagTitle,
    Other(String),
}

impl UniqueField {
    /// Maps a unique-violation message to the column it names.
    ///
    /// SQLite reports `UNIQUE constraint failed: users.email`, PostgreSQL
    /// reports the constraint name `users_email_key`; both carry
    /// `<table>.<column>` or `<table>_<column>`.
    #[must_use]
    pub fn from_violation(message: &str) -> Self {
        let names = |table: &str, column: &str| {
            message.contains(&format!("{table}.{column}"))
                || message.contains(&format!("{table}_{column}"))
        };

        if names("users", "username") {
            Self::Username
        } else if names("users", "email") {
            Self::Email
        } else if names("tags", "title") {
            Self::TagTitle
        } else {
            Self::Other(message.to_string())
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,

    #[error("unique constraint violated on {0:?}")]
    UniqueViolation(UniqueField),

    #[error("storage call exceeded {0} seconds")]
    Timeout(u64),

    #[error("database error: {0}")]
    Database(DbErr),
}

impl From<DbErr> for StoreError {
    fn from(err: DbErr) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(message)) => {
                Self::UniqueViolation(UniqueField::from_violation(&message))
            }
            _ => Self::Database(err),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_sqlite_messages() {
        assert_eq!(
            UniqueField::from_violation("UNIQUE constraint failed: users.username"),
            UniqueField::Username
        );
        assert_eq!(
            UniqueField::from_violation("UNIQUE constraint failed: users.email"),
            UniqueField::Email
        );
        assert_eq!(
            UniqueField::from_violation("UNIQUE constraint failed: tags.title"),
            UniqueField::TagTitle
        );
    }

    #[test]
    fn classifies_postgres_constraint_names() {
        assert_eq!(
            UniqueField::from_violation(
                r#"duplicate key value violates unique constraint "users_username_key""#
            ),
            UniqueField::Username
        );
        assert_eq!(
            UniqueField::from_violation(
                r#"duplicate key value violates unique constraint "users_email_key""#
            ),
            UniqueField::Email
        );
    }

    #[test]
    fn unknown_columns_are_kept_verbatim() {
        let field = UniqueField::from_violation("UNIQUE constraint failed: ideas_tags.idea_id");
        assert!(matches!(field, UniqueField::Other(ref m) if m.contains("ideas_tags")));
    }

    #[test]
    fn plain_db_errors_stay_opaque() {
        let err: StoreError = DbErr::Custom("boom".to_string()).into();
        assert!(matches!(err, StoreError::Database(_)));
    }
}
