use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;
use std::panic::Location;

use crate::services::{AuthError, FieldErrors, IdeaError};

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),

    FailedValidation(FieldErrors),

    InvalidCredentials,

    InvalidAuthenticationToken,

    NotFound,

    MethodNotAllowed(String),

    InternalError {
        message: String,
        location: &'static Location<'static>,
    },
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadRequest(msg) => write!(f, "Bad request: {msg}"),
            Self::FailedValidation(errors) => write!(f, "Validation failed: {errors:?}"),
            Self::InvalidCredentials => write!(f, "invalid authentication credentials"),
            Self::InvalidAuthenticationToken => {
                write!(f, "invalid or missing authentication token")
            }
            Self::NotFound => write!(f, "the requested resource could not be found"),
            Self::MethodNotAllowed(method) => {
                write!(f, "the {method} method is not supported for this resource")
            }
            Self::InternalError { message, location } => {
                write!(f, "Internal error at {location}: {message}")
            }
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, json!({ "error": msg })),
            Self::FailedValidation(errors) => {
                (StatusCode::BAD_REQUEST, json!({ "error": errors }))
            }
            Self::InvalidCredentials | Self::InvalidAuthenticationToken => {
                (StatusCode::UNAUTHORIZED, json!({ "error": self.to_string() }))
            }
            Self::NotFound => (StatusCode::NOT_FOUND, json!({ "error": self.to_string() })),
            Self::MethodNotAllowed(_) => (
                StatusCode::METHOD_NOT_ALLOWED,
                json!({ "error": self.to_string() }),
            ),
            Self::InternalError { message, location } => {
                tracing::error!(
                    file = location.file(),
                    line = location.line(),
                    error = %message,
                    "Internal error"
                );
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "the server encountered a problem and could not process your request" }),
                )
            }
        };

        let mut response = (status, Json(body)).into_response();
        if matches!(self, Self::InvalidAuthenticationToken) {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}

impl ApiError {
    #[track_caller]
    pub fn internal(msg: impl fmt::Display) -> Self {
        Self::InternalError {
            message: msg.to_string(),
            location: Location::caller(),
        }
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    fn field(key: &str, message: impl Into<String>) -> Self {
        let mut errors = FieldErrors::new();
        errors.insert(key.to_string(), message.into());
        Self::FailedValidation(errors)
    }
}

impl From<anyhow::Error> for ApiError {
    #[track_caller]
    fn from(err: anyhow::Error) -> Self {
        Self::internal(err)
    }
}

impl From<AuthError> for ApiError {
    #[track_caller]
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Validation(errors) => Self::FailedValidation(errors),
            AuthError::DuplicateUsername => {
                Self::field("username", AuthError::DuplicateUsername.to_string())
            }
            AuthError::DuplicateEmail => Self::field("email", AuthError::DuplicateEmail.to_string()),
            AuthError::InvalidCredentials => Self::InvalidCredentials,
            AuthError::InvalidToken => Self::InvalidAuthenticationToken,
            AuthError::InvalidResetToken => {
                Self::field("token", AuthError::InvalidResetToken.to_string())
            }
            AuthError::UserNotFound => Self::NotFound,
            other => Self::internal(other),
        }
    }
}

impl From<IdeaError> for ApiError {
    #[track_caller]
    fn from(err: IdeaError) -> Self {
        match err {
            IdeaError::Validation(errors) => Self::FailedValidation(errors),
            IdeaError::NotFound => Self::NotFound,
            IdeaError::Store(e) => Self::internal(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::StoreError;
    use http_body_util::BodyExt;

    async fn body_json(err: ApiError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn validation_errors_render_as_field_map() {
        let mut errors = FieldErrors::new();
        errors.insert("title".to_string(), "must be provided".to_string());

        let (status, body) = body_json(ApiError::FailedValidation(errors)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["title"], "must be provided");
    }

    #[tokio::test]
    async fn duplicates_name_the_field() {
        let (status, body) = body_json(AuthError::DuplicateEmail.into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["error"]["email"],
            "a user with this email address already exists"
        );
    }

    #[tokio::test]
    async fn internal_errors_hide_details() {
        let err: ApiError = IdeaError::Store(StoreError::Timeout(5)).into();
        let ApiError::InternalError { location, .. } = &err else {
            panic!("expected internal error");
        };
        assert!(location.file().ends_with("error.rs"));

        let (status, body) = body_json(err).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!body["error"].as_str().unwrap().contains("5 seconds"));
    }

    #[tokio::test]
    async fn invalid_token_sets_challenge_header() {
        let response = ApiError::InvalidAuthenticationToken.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers()[header::WWW_AUTHENTICATE], "Bearer");
    }

    #[tokio::test]
    async fn unresolved_token_and_anonymous_share_one_message() {
        let (status, body) = body_json(AuthError::InvalidToken.into()).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "invalid or missing authentication token");
    }

    #[tokio::test]
    async fn unknown_user_is_not_found() {
        let (status, _) = body_json(AuthError::UserNotFound.into()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
