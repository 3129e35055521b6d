//! Bearer-token extractors.
//!
//! The resolved identity is handed to handlers as an argument. Nothing is
//! stashed in request extensions.

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use std::sync::Arc;

use super::{ApiError, AppState};
use crate::domain::{Identity, User};

/// Who is calling. A missing `Authorization` header is [`Identity::Anonymous`];
/// a present but malformed or unknown token is rejected with 401.
pub struct CurrentIdentity(pub Identity);

/// An authenticated caller. Anonymous requests get the same 401 as a bad token.
pub struct AuthenticatedUser(pub User);

fn bearer_token(parts: &Parts) -> Result<Option<&str>, ApiError> {
    let Some(value) = parts.headers.get(header::AUTHORIZATION) else {
        return Ok(None);
    };

    let token = value
        .to_str()
        .ok()
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(ApiError::InvalidAuthenticationToken)?;

    Ok(Some(token))
}

impl FromRequestParts<Arc<AppState>> for CurrentIdentity {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let Some(token) = bearer_token(parts)? else {
            return Ok(Self(Identity::Anonymous));
        };

        let user = state.auth_service().authenticate(token).await?;
        tracing::Span::current().record("user_id", user.id.value());

        Ok(Self(Identity::Authenticated(user)))
    }
}

impl FromRequestParts<Arc<AppState>> for AuthenticatedUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        match CurrentIdentity::from_request_parts(parts, state).await?.0 {
            Identity::Authenticated(user) => Ok(Self(user)),
            Identity::Anonymous => Err(ApiError::InvalidAuthenticationToken),
        }
    }
}
