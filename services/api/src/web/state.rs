//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::adapters::{CsvResponseStore, HashedCredentials, InMemorySessionStore, StaticCredentials};
use crate::config::Config;
use paid_survey_core::ports::{CredentialVerifier, PortResult, ResponseStore, SessionStore};
use std::sync::Arc;
use tracing::info;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub credentials: Arc<dyn CredentialVerifier>,
    pub sessions: Arc<dyn SessionStore>,
    pub records: Arc<dyn ResponseStore>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Builds the state with the adapters selected by the configuration.
    pub async fn from_config(config: Arc<Config>) -> PortResult<Self> {
        let credentials: Arc<dyn CredentialVerifier> = match &config.credentials_path {
            Some(path) => Arc::new(HashedCredentials::load(path).await?),
            None => {
                let table = StaticCredentials::new();
                info!(
                    "No CREDENTIALS_PATH set, using the built-in table of {} accounts.",
                    table.account_count()
                );
                Arc::new(table)
            }
        };

        Ok(Self {
            credentials,
            sessions: Arc::new(InMemorySessionStore::new()),
            records: Arc::new(CsvResponseStore::new(config.data_file.clone())),
            config,
        })
    }
}
