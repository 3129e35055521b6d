//! Domain types for identities, tokens and ideas.
//!
//! Newtype identifiers keep user and idea ids from being mixed up, and
//! [`Identity`] replaces the "anonymous user" sentinel with a tagged variant.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a registered user.
///
/// # Examples
///
/// ```rust
/// use projectideas::domain::UserId;
///
/// let id = UserId::new(7);
/// assert_eq!(id.value(), 7);
/// assert_eq!(id.to_string(), "7");
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct UserId(i32);

impl UserId {
    #[must_use]
    pub const fn new(id: i32) -> Self {
        Self(id)
    }

    #[must_use]
    pub const fn value(&self) -> i32 {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i32> for UserId {
    fn from(id: i32) -> Self {
        Self::new(id)
    }
}

impl From<UserId> for i32 {
    fn from(id: UserId) -> Self {
        id.0
    }
}

/// Unique identifier for an idea.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct IdeaId(i32);

impl IdeaId {
    #[must_use]
    pub const fn new(id: i32) -> Self {
        Self(id)
    }

    #[must_use]
    pub const fn value(&self) -> i32 {
        self.0
    }
}

impl fmt::Display for IdeaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i32> for IdeaId {
    fn from(id: i32) -> Self {
        Self::new(id)
    }
}

/// Purpose a bearer token was issued for. Enforced when the token is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenScope {
    Authentication,
    PasswordReset,
}

impl TokenScope {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Authentication => "authentication",
            Self::PasswordReset => "password-reset",
        }
    }
}

impl fmt::Display for TokenScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A registered account. Never carries the credential hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

/// Who is making a request, as decided by the authentication boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    Authenticated(User),
    Anonymous,
}

/// Opaque bearer token handed back to a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    #[serde(rename = "token")]
    pub plaintext: String,
    #[serde(skip)]
    pub user_id: UserId,
    #[serde(skip)]
    pub scope: TokenScope,
    pub expires_at: DateTime<Utc>,
}

/// A vocabulary entry shared between ideas.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tag {
    pub title: String,
}

/// An idea together with its tags, reassembled from the association table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Idea {
    pub id: IdeaId,
    pub title: String,
    pub description: String,
    #[serde(skip)]
    pub user_id: UserId,
    pub tags: Vec<Tag>,
    pub created_at: DateTime<Utc>,
}

/// Input for creating an idea. Tag titles are resolved with get-or-create.
#[derive(Debug, Clone)]
pub struct NewIdea {
    pub title: String,
    pub description: String,
    pub author: UserId,
    pub tags: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_id_conversions() {
        let id = UserId::new(42);
        assert_eq!(id.value(), 42);
        assert_eq!(i32::from(id), 42);
        assert_eq!(UserId::from(42), id);
        assert_eq!(serde_json::to_string(&id).unwrap(), "42");
    }


    #[test]
    fn token_scope_names() {
        assert_eq!(TokenScope::Authentication.as_str(), "authentication");
        assert_eq!(TokenScope::PasswordReset.to_string(), "password-reset");
    }

    #[test]
    fn token_serializes_only_public_fields() {
        let token = Token {
            plaintext: "ABC".to_string(),
            user_id: UserId::new(3),
            scope: TokenScope::Authentication,
            expires_at: Utc::now(),
        };
        let json = serde_json::to_value(&token).unwrap();
        assert_eq!(json["token"], "ABC");
        assert!(json.get("expires_at").is_some());
        assert!(json.get("user_id").is_none());
        assert!(json.get("scope").is_none());
    }

    #[test]
    fn idea_hides_owner() {
        let idea = Idea {
            id: IdeaId::new(1),
            title: "t".to_string(),
            description: "d".to_string(),
            user_id: UserId::new(9),
            tags: vec![Tag {
                title: "rust".to_string(),
            }],
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(&idea).unwrap();
        assert!(json.get("user_id").is_none());
        assert_eq!(json["tags"][0]["title"], "rust");
    }
}
