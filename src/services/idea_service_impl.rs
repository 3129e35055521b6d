//! `SeaORM` implementation of the `IdeaService` trait.

use async_trait::async_trait;

use crate::db::Store;
use crate::domain::{Idea, IdeaId, NewIdea, User};
use crate::services::idea_service::{CreateIdea, IdeaError, IdeaService};
use crate::services::validator::{self, Validator};

pub struct SeaOrmIdeaService {
    store: Store,
}

impl SeaOrmIdeaService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }
}

#[async_trait]
impl IdeaService for SeaOrmIdeaService {
    async fn create(&self, author: &User, input: CreateIdea) -> Result<Idea, IdeaError> {
        let mut v = Validator::new();
        validator::validate_idea(&mut v, &input.title, &input.description, &input.tags);
        v.finish().map_err(IdeaError::Validation)?;

        let idea = self
            .store
            .idea_repo()
            .insert(&NewIdea {
                title: input.title,
                description: input.description,
                author: author.id,
                tags: input.tags,
            })
            .await?;

        tracing::info!(idea_id = %idea.id, user_id = %author.id, tags = idea.tags.len(), "Idea created");
        Ok(idea)
    }

    async fn list(&self) -> Result<Vec<Idea>, IdeaError> {
        Ok(self.store.idea_repo().list().await?)
    }

    async fn get(&self, id: IdeaId) -> Result<Idea, IdeaError> {
        Ok(self.store.idea_repo().get(id).await?)
    }

    async fn delete(&self, id: IdeaId, requester: &User) -> Result<(), IdeaError> {
        self.store.idea_repo().delete(id, requester.id).await?;
        tracing::info!(idea_id = %id, user_id = %requester.id, "Idea deleted");
        Ok(())
    }
}
