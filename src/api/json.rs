//! Strict JSON request bodies.
//!
//! Unlike `axum::Json`, every way a body can be wrong maps to its own
//! human-readable 400 message.

use axum::{
    body::Bytes,
    extract::{
        FromRequest, Request,
        rejection::{BytesRejection, FailedToBufferBody},
    },
};
use serde::de::DeserializeOwned;
use serde_json::error::Category;

use super::ApiError;

/// Body size ceiling shared with the `DefaultBodyLimit` layer, carried as a
/// request extension so rejections can name it.
#[derive(Debug, Clone, Copy)]
pub struct BodyLimit(pub usize);

pub struct StrictJson<T>(pub T);

impl<S, T> FromRequest<S> for StrictJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let limit = req.extensions().get::<BodyLimit>().copied();

        let bytes = match Bytes::from_request(req, state).await {
            Ok(bytes) => bytes,
            Err(BytesRejection::FailedToBufferBody(FailedToBufferBody::LengthLimitError(_))) => {
                let message = limit.map_or_else(
                    || "body is too large".to_string(),
                    |BodyLimit(n)| format!("body must not be larger than {n} bytes"),
                );
                return Err(ApiError::BadRequest(message));
            }
            Err(rejection) => return Err(ApiError::BadRequest(rejection.body_text())),
        };

        decode(&bytes).map(StrictJson).map_err(ApiError::BadRequest)
    }
}

/// Decode exactly one JSON value of type `T`.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, String> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Err("body must not be empty".to_string());
    }

    let mut de = serde_json::Deserializer::from_slice(bytes);
    let value = T::deserialize(&mut de).map_err(|e| describe(&e))?;
    de.end()
        .map_err(|_| "body must only contain a single JSON value".to_string())?;

    Ok(value)
}

fn describe(err: &serde_json::Error) -> String {
    match err.classify() {
        Category::Syntax | Category::Eof => format!(
            "body contains badly-formed JSON (at line {}, column {})",
            err.line(),
            err.column()
        ),
        Category::Data => {
            let text = err.to_string();
            let detail = text
                .rsplit_once(" at line ")
                .map_or(text.as_str(), |(head, _)| head);

            if let Some(rest) = detail.strip_prefix("unknown field `")
                && let Some((name, _)) = rest.split_once('`')
            {
                return format!("body contains unknown key \"{name}\"");
            }

            format!("body contains incorrect JSON type ({detail})")
        }
        Category::Io => format!("failed to read body: {err}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Default, Deserialize, PartialEq)]
    #[serde(default, deny_unknown_fields)]
    struct Payload {
        name: String,
        count: u32,
    }

    #[test]
    fn accepts_a_single_value() {
        let payload: Payload = decode(br#"{"name":"a","count":2}"#).unwrap();
        assert_eq!(payload.name, "a");
        assert_eq!(payload.count, 2);
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let payload: Payload = decode(b"{}").unwrap();
        assert_eq!(payload, Payload::default());
    }

    #[test]
    fn empty_body() {
        assert_eq!(
            decode::<Payload>(b"").unwrap_err(),
            "body must not be empty"
        );
        assert_eq!(
            decode::<Payload>(b"  \n").unwrap_err(),
            "body must not be empty"
        );
    }

    #[test]
    fn malformed_json_reports_position() {
        let err = decode::<Payload>(b"{\"name\": }").unwrap_err();
        assert!(
            err.starts_with("body contains badly-formed JSON (at line 1, column"),
            "{err}"
        );

        let err = decode::<Payload>(b"{\"name\": \"a\"").unwrap_err();
        assert!(err.starts_with("body contains badly-formed JSON"), "{err}");
    }

    #[test]
    fn wrong_type() {
        let err = decode::<Payload>(br#"{"count":"three"}"#).unwrap_err();
        assert!(err.starts_with("body contains incorrect JSON type ("), "{err}");
        assert!(!err.contains(" at line "), "{err}");
    }

    #[test]
    fn unknown_key() {
        assert_eq!(
            decode::<Payload>(br#"{"name":"a","admin":true}"#).unwrap_err(),
            "body contains unknown key \"admin\""
        );
    }

    #[test]
    fn trailing_value() {
        assert_eq!(
            decode::<Payload>(br#"{"name":"a"}{"name":"b"}"#).unwrap_err(),
            "body must only contain a single JSON value"
        );
    }
}
