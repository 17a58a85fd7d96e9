//! crates/paid_survey_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of the credential source, the session store and the data file.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};

use crate::domain::{AuthSession, RecordTable, ResponseRecord, Role};
use crate::questionnaire::FormGate;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external resources (files, identity providers).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
    #[error("Unauthorized")]
    Unauthorized,
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait CredentialVerifier: Send + Sync {
    /// Checks a username/password pair and returns the user's role.
    /// Unknown users and wrong passwords both yield `PortError::Unauthorized`.
    async fn verify(&self, username: &str, password: &str) -> PortResult<Role>;
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn create_session(
        &self,
        username: &str,
        role: Role,
        expires_at: DateTime<Utc>,
    ) -> PortResult<AuthSession>;

    /// Returns the live session with this id. Expired sessions are `NotFound`.
    async fn get_session(&self, session_id: &str) -> PortResult<AuthSession>;

    /// Runs `update` on the session's form gate. No other update of the same
    /// gate can run between reading it and storing the result.
    async fn update_form_gate(
        &self,
        session_id: &str,
        update: &mut (dyn for<'a> FnMut(&'a mut FormGate) + Send),
    ) -> PortResult<()>;

    async fn delete_session(&self, session_id: &str) -> PortResult<()>;
}

#[async_trait]
pub trait ResponseStore: Send + Sync {
    /// Appends one record. Appends are never interleaved with each other.
    async fn append_record(&self, record: &ResponseRecord) -> PortResult<()>;

    /// Reads every stored record. `None` when nothing has been stored yet.
    async fn list_records(&self) -> PortResult<Option<RecordTable>>;

    /// The stored records encoded as CSV. `None` when nothing has been stored yet.
    async fn export(&self) -> PortResult<Option<Bytes>>;
}
