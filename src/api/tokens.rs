use axum::{Json, extract::State};
use std::sync::Arc;

use super::json::StrictJson;
use super::{
    ApiError, AppState, AuthenticationTokenRequest, MessageResponse, PasswordResetTokenRequest,
};
use crate::domain::Token;

/// `POST /v1/tokens/authentication`
pub async fn create_authentication_token(
    State(state): State<Arc<AppState>>,
    StrictJson(input): StrictJson<AuthenticationTokenRequest>,
) -> Result<Json<Token>, ApiError> {
    let token = state
        .auth_service()
        .login(&input.email, &input.password)
        .await?;

    Ok(Json(token))
}

/// `POST /v1/tokens/password-reset`
///
/// Responds as soon as the token is stored; mail delivery runs detached.
pub async fn create_password_reset_token(
    State(state): State<Arc<AppState>>,
    StrictJson(input): StrictJson<PasswordResetTokenRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let _delivery = state
        .auth_service()
        .request_password_reset(&input.email)
        .await?;

    Ok(Json(MessageResponse::new("reset password token sent")))
}
