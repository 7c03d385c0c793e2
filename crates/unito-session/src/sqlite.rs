// SPDX-FileCopyrightText: 2026 Unito Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite-backed credential store that survives process restarts.
//!
//! Credentials are kept under the fixed keys `access_token` and
//! `refresh_token` in a single key/value table. Reads are served from an
//! in-memory copy loaded at open; writes go to both.

use std::path::Path;

use async_trait::async_trait;
use rusqlite::params;
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, warn};
use unito_core::{ACCESS_TOKEN_KEY, CredentialStore, REFRESH_TOKEN_KEY, SessionTokens, UnitoError};

use crate::store::MemoryCredentialStore;

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS session_credentials (
    key        TEXT PRIMARY KEY NOT NULL,
    value      TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
);";

/// Durable credential store.
///
/// Persistence failures never reach callers: they are logged and the
/// in-memory copy stays authoritative for the rest of the process.
pub struct SqliteCredentialStore {
    conn: tokio_rusqlite::Connection,
    cache: MemoryCredentialStore,
}

impl std::fmt::Debug for SqliteCredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteCredentialStore")
            .field("cache", &self.cache)
            .finish()
    }
}

impl SqliteCredentialStore {
    /// Open (creating if needed) the credential database at `path` and load
    /// any credentials persisted by a previous run.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, UnitoError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| UnitoError::Storage {
                source: Box::new(e),
            })?;
        }

        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(|e| UnitoError::Storage {
                source: Box::new(e),
            })?;
        let store = Self::with_connection(conn).await?;
        debug!(path = %path.display(), "credential store opened");
        Ok(store)
    }

    /// Open a throwaway in-memory database.
    pub async fn open_in_memory() -> Result<Self, UnitoError> {
        let conn = tokio_rusqlite::Connection::open_in_memory()
            .await
            .map_err(|e| UnitoError::Storage {
                source: Box::new(e),
            })?;
        Self::with_connection(conn).await
    }

    async fn with_connection(conn: tokio_rusqlite::Connection) -> Result<Self, UnitoError> {
        let (access, refresh) = conn
            .call(
                |conn| -> Result<(Option<String>, Option<String>), rusqlite::Error> {
                    conn.execute_batch(SCHEMA)?;
                    Ok((
                        read_key(conn, ACCESS_TOKEN_KEY)?,
                        read_key(conn, REFRESH_TOKEN_KEY)?,
                    ))
                },
            )
            .await
            .map_err(map_tr_err)?;

        let cache = MemoryCredentialStore::with_tokens(SessionTokens {
            access: access.map(SecretString::from),
            refresh: refresh.map(SecretString::from),
        });
        Ok(Self { conn, cache })
    }

    async fn persist(&self, access: String, refresh: Option<String>) -> Result<(), UnitoError> {
        self.conn
            .call(move |conn| -> Result<(), rusqlite::Error> {
                let tx = conn.transaction()?;
                write_key(&tx, ACCESS_TOKEN_KEY, &access)?;
                if let Some(refresh) = refresh.as_deref() {
                    write_key(&tx, REFRESH_TOKEN_KEY, refresh)?;
                }
                tx.commit()
            })
            .await
            .map_err(map_tr_err)
    }

    async fn erase(&self) -> Result<(), UnitoError> {
        self.conn
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute(
                    "DELETE FROM session_credentials WHERE key IN (?1, ?2)",
                    params![ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY],
                )?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)
    }
}

#[async_trait]
impl CredentialStore for SqliteCredentialStore {
    async fn set(&self, access: SecretString, refresh: Option<SecretString>) {
        let access_raw = access.expose_secret().to_string();
        let refresh_raw = refresh.as_ref().map(|r| r.expose_secret().to_string());
        self.cache.set(access, refresh).await;

        if let Err(e) = self.persist(access_raw, refresh_raw).await {
            warn!(error = %e, "failed to persist session credentials");
        }
    }

    async fn access_token(&self) -> Option<SecretString> {
        self.cache.access_token().await
    }

    async fn refresh_token(&self) -> Option<SecretString> {
        self.cache.refresh_token().await
    }

    async fn clear(&self) {
        self.cache.clear().await;
        if let Err(e) = self.erase().await {
            warn!(error = %e, "failed to erase persisted session credentials");
        }
    }

    async fn tokens(&self) -> SessionTokens {
        self.cache.tokens().await
    }
}

fn read_key(conn: &rusqlite::Connection, key: &str) -> Result<Option<String>, rusqlite::Error> {
    match conn.query_row(
        "SELECT value FROM session_credentials WHERE key = ?1",
        params![key],
        |row| row.get(0),
    ) {
        Ok(value) => Ok(Some(value)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e),
    }
}

fn write_key(conn: &rusqlite::Connection, key: &str, value: &str) -> Result<(), rusqlite::Error> {
    conn.execute(
        "INSERT INTO session_credentials (key, value) VALUES (?1, ?2)
         ON CONFLICT(key) DO UPDATE SET
             value = excluded.value,
             updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
        params![key, value],
    )?;
    Ok(())
}

fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> UnitoError {
    UnitoError::Storage {
        source: format!("credential database error: {e}").into(),
    }
}
