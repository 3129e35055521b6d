//! Domain service for ideas and their tags.

use thiserror::Error;

use crate::db::StoreError;
use crate::domain::{Idea, IdeaId, User};
use crate::services::validator::FieldErrors;

#[derive(Debug, Error)]
pub enum IdeaError {
    #[error("validation failed")]
    Validation(FieldErrors),

    /// Missing, or not owned by the caller on delete.
    #[error("idea not found")]
    NotFound,

    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for IdeaError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => Self::NotFound,
            other => Self::Store(other),
        }
    }
}

/// Input for [`IdeaService::create`]; tag titles are get-or-created.
#[derive(Debug, Clone)]
pub struct CreateIdea {
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
}

#[async_trait::async_trait]
pub trait IdeaService: Send + Sync {
    /// Validates, then stores the idea with its tags in one transaction.
    async fn create(&self, author: &User, input: CreateIdea) -> Result<Idea, IdeaError>;

    /// All ideas, newest first.
    async fn list(&self) -> Result<Vec<Idea>, IdeaError>;

    async fn get(&self, id: IdeaId) -> Result<Idea, IdeaError>;

    /// Deletes only when `requester` owns the idea.
    async fn delete(&self, id: IdeaId, requester: &User) -> Result<(), IdeaError>;
}
