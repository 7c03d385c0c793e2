// SPDX-FileCopyrightText: 2026 Unito Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session handling for the Unito portal client.
//!
//! Holds the credential pair (in memory or in SQLite), renews the access
//! credential with single-flight deduplication, and opens and closes
//! sessions.

pub mod auth;
pub mod refresh;
pub mod sqlite;
pub mod store;
pub mod transport;

use std::sync::Arc;

use tracing::debug;
use unito_config::model::{SessionConfig, StoreBackend};
use unito_core::{CredentialStore, UnitoError};

pub use auth::{SessionClient, UserProfile};
pub use refresh::TokenRefreshCoordinator;
pub use sqlite::SqliteCredentialStore;
pub use store::MemoryCredentialStore;
pub use transport::build_http_client;

/// Open the credential store selected by `[session]`.
pub async fn open_store(config: &SessionConfig) -> Result<Arc<dyn CredentialStore>, UnitoError> {
    match config.store {
        StoreBackend::Memory => {
            debug!("using in-memory credential store");
            Ok(Arc::new(MemoryCredentialStore::new()))
        }
        StoreBackend::Sqlite => Ok(Arc::new(
            SqliteCredentialStore::open(&config.database_path).await?,
        )),
    }
}
