// SPDX-FileCopyrightText: 2026 Unito Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory credential store.

use async_trait::async_trait;
use secrecy::SecretString;
use tokio::sync::RwLock;
use unito_core::{CredentialStore, SessionTokens};

/// Credential store that lives only as long as the process.
///
/// Used when `session.store = "memory"` and as the cache in front of the
/// SQLite store.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    tokens: RwLock<SessionTokens>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with a credential pair.
    pub fn with_tokens(tokens: SessionTokens) -> Self {
        Self {
            tokens: RwLock::new(tokens),
        }
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn set(&self, access: SecretString, refresh: Option<SecretString>) {
        let mut tokens = self.tokens.write().await;
        tokens.access = Some(access);
        if refresh.is_some() {
            tokens.refresh = refresh;
        }
    }

    async fn access_token(&self) -> Option<SecretString> {
        self.tokens.read().await.access.clone()
    }

    async fn refresh_token(&self) -> Option<SecretString> {
        self.tokens.read().await.refresh.clone()
    }

    async fn clear(&self) {
        *self.tokens.write().await = SessionTokens::default();
    }

    async fn tokens(&self) -> SessionTokens {
        self.tokens.read().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use secrecy::ExposeSecret;

    use super::*;

    fn secret(s: &str) -> SecretString {
        SecretString::from(s.to_string())
    }

    #[tokio::test]
    async fn set_stores_both_credentials() {
        let store = MemoryCredentialStore::new();
        store.set(secret("a1"), Some(secret("r1"))).await;

        assert_eq!(store.access_token().await.unwrap().expose_secret(), "a1");
        assert_eq!(store.refresh_token().await.unwrap().expose_secret(), "r1");
    }

    #[tokio::test]
    async fn set_without_refresh_keeps_existing_refresh() {
        let store = MemoryCredentialStore::new();
        store.set(secret("a1"), Some(secret("r1"))).await;
        store.set(secret("a2"), None).await;

        assert_eq!(store.access_token().await.unwrap().expose_secret(), "a2");
        assert_eq!(store.refresh_token().await.unwrap().expose_secret(), "r1");
    }

    #[tokio::test]
    async fn clear_removes_both() {
        let store = MemoryCredentialStore::new();
        store.set(secret("a1"), Some(secret("r1"))).await;
        store.clear().await;

        assert!(store.tokens().await.is_empty());
    }
}
