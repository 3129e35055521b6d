use axum::{Json, extract::State};
use std::sync::Arc;

use super::json::StrictJson;
use super::{ApiError, AppState, MessageResponse, RegisterRequest, ResetPasswordRequest, UserEnvelope};

/// `POST /v1/users/register`
pub async fn register(
    State(state): State<Arc<AppState>>,
    StrictJson(input): StrictJson<RegisterRequest>,
) -> Result<Json<UserEnvelope>, ApiError> {
    let user = state
        .auth_service()
        .register(&input.username, &input.email, &input.password)
        .await?;

    Ok(Json(UserEnvelope { user }))
}

/// `PUT /v1/users/password`
///
/// Completes a reset started at `/v1/tokens/password-reset`. Every token the
/// user holds is revoked, so existing sessions end.
pub async fn reset_password(
    State(state): State<Arc<AppState>>,
    StrictJson(input): StrictJson<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    state
        .auth_service()
        .reset_password(&input.token, &input.password)
        .await?;

    Ok(Json(MessageResponse::new("password reset successful")))
}
