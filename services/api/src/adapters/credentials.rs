//! services/api/src/adapters/credentials.rs
//!
//! Implementations of the `CredentialVerifier` port: the built-in table of
//! enumerator and admin accounts, and a file of Argon2-hashed credentials.

use std::collections::HashMap;
use std::path::Path;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use async_trait::async_trait;
use paid_survey_core::domain::Role;
use paid_survey_core::ports::{CredentialVerifier, PortError, PortResult};
use serde::Deserialize;
use tracing::info;

/// Number of field enumerator accounts in the built-in table.
pub const ENUMERATOR_COUNT: u32 = 25;

//=========================================================================================
// Built-in Credential Table
//=========================================================================================

/// The fixed credential table: `enum01`/`pass01` through `enum25`/`pass25`,
/// plus `admin`/`admin123`. Matching is exact and case-sensitive.
#[derive(Clone, Debug)]
pub struct StaticCredentials {
    table: HashMap<String, String>,
}

impl StaticCredentials {
    pub fn new() -> Self {
        let mut table: HashMap<String, String> = (1..=ENUMERATOR_COUNT)
            .map(|i| (format!("enum{:02}", i), format!("pass{:02}", i)))
            .collect();
        table.insert("admin".to_string(), "admin123".to_string());
        Self { table }
    }

    pub fn authenticate(&self, username: &str, password: &str) -> bool {
        self.table
            .get(username)
            .is_some_and(|stored| stored == password)
    }

    /// Number of accounts in the table.
    pub(crate) fn account_count(&self) -> usize {
        self.table.len()
    }
}

impl Default for StaticCredentials {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CredentialVerifier for StaticCredentials {
    async fn verify(&self, username: &str, password: &str) -> PortResult<Role> {
        if self.authenticate(username, password) {
            Ok(Role::for_username(username))
        } else {
            Err(PortError::Unauthorized)
        }
    }
}

//=========================================================================================
// Hashed Credential File
//=========================================================================================

#[derive(Deserialize)]
struct CredentialEntry {
    username: String,
    password_hash: String,
}

/// Credentials loaded from a JSON array of `{ "username", "password_hash" }`
/// objects, where each hash is an Argon2 PHC string.
#[derive(Clone, Debug)]
pub struct HashedCredentials {
    hashes: HashMap<String, String>,
}

impl HashedCredentials {
    /// Reads and checks a credentials file. Every hash must parse.
    pub async fn load(path: &Path) -> PortResult<Self> {
        let text = tokio::fs::read_to_string(path).await.map_err(|e| {
            PortError::Unexpected(format!(
                "Failed to read credentials file {}: {}",
                path.display(),
                e
            ))
        })?;
        let credentials = Self::from_json(&text)?;
        info!(
            "Loaded {} hashed credentials from {}",
            credentials.hashes.len(),
            path.display()
        );
        Ok(credentials)
    }

    pub fn from_json(text: &str) -> PortResult<Self> {
        let entries: Vec<CredentialEntry> = serde_json::from_str(text)
            .map_err(|e| PortError::Unexpected(format!("Invalid credentials file: {}", e)))?;

        let mut hashes = HashMap::with_capacity(entries.len());
        for entry in entries {
            PasswordHash::new(&entry.password_hash).map_err(|e| {
                PortError::Unexpected(format!(
                    "Invalid password hash for user '{}': {}",
                    entry.username, e
                ))
            })?;
            hashes.insert(entry.username, entry.password_hash);
        }
        Ok(Self { hashes })
    }
}

#[async_trait]
impl CredentialVerifier for HashedCredentials {
    async fn verify(&self, username: &str, password: &str) -> PortResult<Role> {
        let stored = self.hashes.get(username).ok_or(PortError::Unauthorized)?;
        let parsed_hash =
            PasswordHash::new(stored).map_err(|e| PortError::Unexpected(e.to_string()))?;

        Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .map_err(|_| PortError::Unauthorized)?;

        Ok(Role::for_username(username))
    }
}

/// Hashes a password into an Argon2 PHC string suitable for a credentials file.
pub fn hash_password(password: &str) -> PortResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| PortError::Unexpected(format!("Failed to hash password: {}", e)))
}
