//! One-way credential hashing with Argon2id.
//!
//! Hashing and verification are CPU-bound, so both run on the blocking pool.

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use thiserror::Error;
use tokio::task;

use crate::config::SecurityConfig;

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("invalid argon2 parameters: {0}")]
    InvalidParams(String),

    #[error("failed to hash credential: {0}")]
    Hashing(String),

    #[error("credential task failed: {0}")]
    Join(#[from] task::JoinError),
}

#[derive(Debug, Clone)]
pub struct CredentialHasher {
    config: SecurityConfig,
}

impl CredentialHasher {
    #[must_use]
    pub const fn new(config: SecurityConfig) -> Self {
        Self { config }
    }

    /// Hash `plaintext` with a fresh salt.
    pub async fn set(&self, plaintext: &str) -> Result<String, CredentialError> {
        let plaintext = plaintext.to_string();
        let config = self.config.clone();
        task::spawn_blocking(move || hash_password(&plaintext, &config)).await?
    }

    /// Check `plaintext` against `stored_hash`. A malformed hash is a
    /// mismatch, never an error.
    pub async fn compare(&self, stored_hash: &str, plaintext: &str) -> Result<bool, CredentialError> {
        let stored_hash = stored_hash.to_string();
        let plaintext = plaintext.to_string();
        let matches = task::spawn_blocking(move || verify_password(&stored_hash, &plaintext)).await?;
        Ok(matches)
    }
}

pub fn hash_password(password: &str, config: &SecurityConfig) -> Result<String, CredentialError> {
    let salt = SaltString::generate(&mut OsRng);

    let params = Params::new(
        config.argon2_memory_cost_kib,
        config.argon2_time_cost,
        config.argon2_parallelism,
        None,
    )
    .map_err(|e| CredentialError::InvalidParams(e.to_string()))?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| CredentialError::Hashing(e.to_string()))?;

    Ok(hash.to_string())
}

/// Parameters are read back from the PHC string, so hashes made under older
/// settings still verify.
#[must_use]
pub fn verify_password(stored_hash: &str, password: &str) -> bool {
    let parsed = match PasswordHash::new(stored_hash) {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::warn!(error = %e, "Stored credential hash is malformed");
            return false;
        }
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}
