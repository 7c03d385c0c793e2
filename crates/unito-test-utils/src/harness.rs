// SPDX-FileCopyrightText: 2026 Unito Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness assembling a complete portal client against a [`MockBackend`].

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use secrecy::SecretString;
use unito_billing::PortalContext;
use unito_config::UnitoConfig;
use unito_config::model::StoreBackend;
use unito_core::{CredentialStore, FixedClock, UnitoError};
use unito_session::{MemoryCredentialStore, SqliteCredentialStore};

use crate::mock_backend::MockBackend;

/// Builder for [`TestPortal`].
pub struct TestPortalBuilder {
    tokens: Option<(String, Option<String>)>,
    now: DateTime<Utc>,
    sqlite: bool,
    timeout_secs: u64,
}

impl TestPortalBuilder {
    fn new() -> Self {
        Self {
            tokens: None,
            now: Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).single().unwrap_or_default(),
            sqlite: false,
            timeout_secs: 5,
        }
    }

    /// Start with a credential pair already stored.
    pub fn with_tokens(mut self, access: &str, refresh: Option<&str>) -> Self {
        self.tokens = Some((access.to_string(), refresh.map(str::to_string)));
        self
    }

    /// Pin the clock. Defaults to 2026-01-01T12:00:00Z.
    pub fn at(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    /// Keep credentials in a SQLite file in a temp directory.
    pub fn with_sqlite(mut self) -> Self {
        self.sqlite = true;
        self
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub async fn build(self, backend: &MockBackend) -> Result<TestPortal, UnitoError> {
        let temp_dir = tempfile::TempDir::new().map_err(|e| UnitoError::Storage {
            source: Box::new(e),
        })?;

        let mut config = UnitoConfig::default();
        config.client.base_url = backend.uri();
        config.client.request_timeout_secs = self.timeout_secs;
        config.session.database_path = temp_dir
            .path()
            .join("session.db")
            .to_string_lossy()
            .to_string();
        config.session.store = if self.sqlite {
            StoreBackend::Sqlite
        } else {
            StoreBackend::Memory
        };

        let store: Arc<dyn CredentialStore> = if self.sqlite {
            Arc::new(SqliteCredentialStore::open(&config.session.database_path).await?)
        } else {
            Arc::new(MemoryCredentialStore::new())
        };
        if let Some((access, refresh)) = self.tokens {
            store
                .set(SecretString::from(access), refresh.map(SecretString::from))
                .await;
        }

        let clock = Arc::new(FixedClock::new(self.now));
        let portal = PortalContext::with_parts(config, store, clock.clone())?;

        Ok(TestPortal {
            portal,
            clock,
            _temp_dir: temp_dir,
        })
    }
}

/// A fully wired [`PortalContext`] with a controllable clock.
pub struct TestPortal {
    pub portal: PortalContext,
    pub clock: Arc<FixedClock>,
    _temp_dir: tempfile::TempDir,
}

impl TestPortal {
    pub fn builder() -> TestPortalBuilder {
        TestPortalBuilder::new()
    }

    pub fn now(&self) -> DateTime<Utc> {
        unito_core::Clock::now(self.clock.as_ref())
    }
}

impl std::ops::Deref for TestPortal {
    type Target = PortalContext;

    fn deref(&self) -> &PortalContext {
        &self.portal
    }
}
