use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use std::sync::Arc;

use super::auth::AuthenticatedUser;
use super::json::StrictJson;
use super::{ApiError, AppState, CreateIdeaRequest, MessageResponse};
use crate::domain::{Idea, IdeaId};
use crate::services::CreateIdea;

/// Positive integer ids only; anything else cannot name an idea.
fn parse_id(raw: &str) -> Result<IdeaId, ApiError> {
    match raw.parse::<i32>() {
        Ok(id) if id > 0 => Ok(IdeaId::new(id)),
        _ => Err(ApiError::NotFound),
    }
}

/// `POST /v1/ideas`
pub async fn create_idea(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(user): AuthenticatedUser,
    StrictJson(input): StrictJson<CreateIdeaRequest>,
) -> Result<(StatusCode, Json<Idea>), ApiError> {
    let idea = state
        .idea_service()
        .create(
            &user,
            CreateIdea {
                title: input.title,
                description: input.description,
                tags: input.tags.into_iter().map(|tag| tag.title).collect(),
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(idea)))
}

/// `GET /v1/ideas`
pub async fn list_ideas(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Idea>>, ApiError> {
    Ok(Json(state.idea_service().list().await?))
}

/// `GET /v1/ideas/{id}`
pub async fn get_idea(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Idea>, ApiError> {
    let id = parse_id(&id)?;
    Ok(Json(state.idea_service().get(id).await?))
}

/// `DELETE /v1/ideas/{id}`
///
/// Non-owners get the same 404 as a missing idea.
pub async fn delete_idea(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id = parse_id(&id)?;
    state.idea_service().delete(id, &user).await?;
    Ok(Json(MessageResponse::new("deleted")))
}
