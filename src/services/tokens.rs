//! Opaque bearer tokens: 16 random bytes, base32 without padding.
//!
//! Tokens move through `Issued -> Valid -> Expired | Revoked`. Expiry is not
//! stored as a state; resolution simply ignores rows past `expires_at`.

use chrono::{Duration, Utc};
use rand::TryRngCore;
use rand::rngs::OsRng;
use thiserror::Error;

use crate::db::{Store, StoreError};
use crate::domain::{Token, TokenScope, User, UserId};

/// Bytes of entropy per token.
pub const TOKEN_BYTES: usize = 16;

const ALPHABET: &[u8; 32] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ234567";

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("random source failed: {0}")]
    RandomSource(String),

    /// Unknown, expired and wrong-scope tokens are all reported this way.
    #[error("token not found")]
    NotFound,

    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for TokenError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => Self::NotFound,
            other => Self::Store(other),
        }
    }
}

/// RFC 4648 base32, no padding.
#[must_use]
pub fn encode_base32(bytes: &[u8]) -> String {
    let mut out = String::with_capacity((bytes.len() * 8).div_ceil(5));
    let mut buffer: u32 = 0;
    let mut bits: u32 = 0;

    for &byte in bytes {
        buffer = (buffer << 8) | u32::from(byte);
        bits += 8;
        while bits >= 5 {
            bits -= 5;
            out.push(ALPHABET[((buffer >> bits) & 0x1F) as usize] as char);
        }
    }

    if bits > 0 {
        out.push(ALPHABET[((buffer << (5 - bits)) & 0x1F) as usize] as char);
    }

    out
}

/// Fresh token plaintext from the operating system's random source.
pub fn generate_plaintext() -> Result<String, TokenError> {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| TokenError::RandomSource(e.to_string()))?;
    Ok(encode_base32(&bytes))
}

#[derive(Clone)]
pub struct TokenIssuer {
    store: Store,
}

impl TokenIssuer {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    /// Create and persist a token for `user_id` valid for `ttl`.
    pub async fn issue(
        &self,
        user_id: UserId,
        ttl: Duration,
        scope: TokenScope,
    ) -> Result<Token, TokenError> {
        let token = Token {
            plaintext: generate_plaintext()?,
            user_id,
            scope,
            expires_at: Utc::now() + ttl,
        };

        self.store.token_repo().insert(&token).await?;
        tracing::debug!(user_id = %user_id, scope = %scope, "Token issued");

        Ok(token)
    }

    /// The owner of `plaintext`, if it was issued under `scope` and has not
    /// expired.
    pub async fn resolve(&self, plaintext: &str, scope: TokenScope) -> Result<User, TokenError> {
        Ok(self
            .store
            .user_repo()
            .find_for_token(plaintext, scope, Utc::now())
            .await?)
    }

    /// Delete every token held by `user_id`, whatever its scope.
    pub async fn revoke_all(&self, user_id: UserId) -> Result<u64, TokenError> {
        let revoked = self.store.token_repo().delete_all_for_user(user_id).await?;
        tracing::info!(user_id = %user_id, revoked, "Revoked all tokens");
        Ok(revoked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base32_matches_rfc_vectors() {
        assert_eq!(encode_base32(b""), "");
        assert_eq!(encode_base32(b"f"), "MY");
        assert_eq!(encode_base32(b"fo"), "MZXQ");
        assert_eq!(encode_base32(b"foo"), "MZXW6");
        assert_eq!(encode_base32(b"foob"), "MZXW6YQ");
        assert_eq!(encode_base32(b"fooba"), "MZXW6YTB");
        assert_eq!(encode_base32(b"foobar"), "MZXW6YTBOI");
    }

    #[test]
    fn plaintext_is_26_unpadded_chars() {
        let token = generate_plaintext().unwrap();
        assert_eq!(token.len(), 26);
        assert!(!token.contains('='));
        assert!(token.bytes().all(|b| ALPHABET.contains(&b)));
        assert_ne!(token, generate_plaintext().unwrap());
    }

    async fn issuer_with_user() -> (TokenIssuer, User) {
        let store = Store::new("sqlite::memory:").await.unwrap();
        let user = store
            .user_repo()
            .insert("alice", "alice@example.com", "hash")
            .await
            .unwrap();
        (TokenIssuer::new(store), user)
    }

    #[tokio::test]
    async fn issued_token_resolves_in_its_scope_only() {
        let (issuer, user) = issuer_with_user().await;
        let token = issuer
            .issue(user.id, Duration::hours(1), TokenScope::Authentication)
            .await
            .unwrap();

        let resolved = issuer
            .resolve(&token.plaintext, TokenScope::Authentication)
            .await
            .unwrap();
        assert_eq!(resolved, user);

        assert!(matches!(
            issuer
                .resolve(&token.plaintext, TokenScope::PasswordReset)
                .await,
            Err(TokenError::NotFound)
        ));
        assert!(matches!(
            issuer
                .resolve("NEVERISSUED", TokenScope::Authentication)
                .await,
            Err(TokenError::NotFound)
        ));
    }

    #[tokio::test]
    async fn expired_token_does_not_resolve() {
        let (issuer, user) = issuer_with_user().await;
        let token = issuer
            .issue(user.id, Duration::seconds(-1), TokenScope::Authentication)
            .await
            .unwrap();

        assert!(matches!(
            issuer
                .resolve(&token.plaintext, TokenScope::Authentication)
                .await,
            Err(TokenError::NotFound)
        ));
    }

    #[tokio::test]
    async fn revoke_all_invalidates_every_scope() {
        let (issuer, user) = issuer_with_user().await;
        let auth = issuer
            .issue(user.id, Duration::hours(1), TokenScope::Authentication)
            .await
            .unwrap();
        let reset = issuer
            .issue(user.id, Duration::hours(24), TokenScope::PasswordReset)
            .await
            .unwrap();

        assert_eq!(issuer.revoke_all(user.id).await.unwrap(), 2);

        assert!(matches!(
            issuer
                .resolve(&auth.plaintext, TokenScope::Authentication)
                .await,
            Err(TokenError::NotFound)
        ));
        assert!(matches!(
            issuer
                .resolve(&reset.plaintext, TokenScope::PasswordReset)
                .await,
            Err(TokenError::NotFound)
        ));
    }
}
