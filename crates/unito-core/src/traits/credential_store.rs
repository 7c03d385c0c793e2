// SPDX-FileCopyrightText: 2026 Unito Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Credential store trait for holding the session credential pair.

use async_trait::async_trait;
use secrecy::SecretString;

use crate::types::SessionTokens;

/// Holds the current access/refresh credential pair for the client session.
///
/// Implementations carry no business logic and surface no errors: a durable
/// backend that fails to persist logs the failure and keeps serving its
/// in-memory view.
#[async_trait]
pub trait CredentialStore: Send + Sync + 'static {
    /// Store a new access credential.
    ///
    /// When `refresh` is `None` the existing refresh credential is kept, so a
    /// refresh response that does not rotate it leaves it untouched.
    async fn set(&self, access: SecretString, refresh: Option<SecretString>);

    /// Returns the current access credential, if any.
    async fn access_token(&self) -> Option<SecretString>;

    /// Returns the current refresh credential, if any.
    async fn refresh_token(&self) -> Option<SecretString>;

    /// Remove both credentials.
    async fn clear(&self);

    /// Snapshot of both credentials.
    async fn tokens(&self) -> SessionTokens {
        SessionTokens {
            access: self.access_token().await,
            refresh: self.refresh_token().await,
        }
    }
}
