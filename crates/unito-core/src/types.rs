// SPDX-FileCopyrightText: 2026 Unito Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared across the session, gateway and billing crates.

use secrecy::SecretString;
use strum::{Display, EnumString};
use tokio::sync::broadcast;
use tracing::debug;

/// Durable storage key for the access credential.
pub const ACCESS_TOKEN_KEY: &str = "access_token";

/// Durable storage key for the refresh credential.
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";

/// The credential pair held by a [`CredentialStore`](crate::CredentialStore).
///
/// Both halves are optional: a fresh client has neither, and a refresh
/// response may rotate only the access credential.
#[derive(Default, Clone)]
pub struct SessionTokens {
    pub access: Option<SecretString>,
    pub refresh: Option<SecretString>,
}

impl SessionTokens {
    /// Returns `true` when no credential of either kind is held.
    pub fn is_empty(&self) -> bool {
        self.access.is_none() && self.refresh.is_none()
    }
}

impl std::fmt::Debug for SessionTokens {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionTokens")
            .field("access", &self.access.as_ref().map(|_| "[redacted]"))
            .field("refresh", &self.refresh.as_ref().map(|_| "[redacted]"))
            .finish()
    }
}

/// Session lifecycle notifications.
///
/// `Expired` is the signal the embedding application uses to send the user
/// back to its login surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum SessionEvent {
    LoggedIn,
    Refreshed,
    Expired,
    LoggedOut,
}

/// Broadcast channel for [`SessionEvent`]s.
///
/// Cloning shares the same underlying channel. Emitting with no subscribers
/// is not an error.
#[derive(Debug, Clone)]
pub struct SessionEvents {
    tx: broadcast::Sender<SessionEvent>,
}

impl SessionEvents {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(16);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.tx.subscribe()
    }

    pub fn emit(&self, event: SessionEvent) {
        if self.tx.send(event).is_err() {
            debug!(%event, "session event dropped: no subscribers");
        }
    }
}

impl Default for SessionEvents {
    fn default() -> Self {
        Self::new()
    }
}
