// SPDX-FileCopyrightText: 2026 Unito Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Login and logout.

use std::sync::Arc;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::info;
use unito_config::model::ClientConfig;
use unito_core::{CredentialStore, SessionEvent, SessionEvents, UnitoError};

use crate::transport::{api_error, decode_body, map_transport_error};

/// Backend path of the login endpoint.
pub const LOGIN_PATH: &str = "/auth/login/";

/// The account that just logged in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: i64,
    pub email: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub is_host: bool,
}

#[derive(Deserialize)]
struct LoginResponse {
    access: String,
    refresh: String,
    user: UserProfile,
}

/// Opens and closes sessions against the backend.
#[derive(Clone)]
pub struct SessionClient {
    http: reqwest::Client,
    login_url: String,
    timeout: Duration,
    store: Arc<dyn CredentialStore>,
    events: SessionEvents,
}

impl SessionClient {
    pub fn new(
        http: reqwest::Client,
        config: &ClientConfig,
        store: Arc<dyn CredentialStore>,
        events: SessionEvents,
    ) -> Self {
        Self {
            http,
            login_url: config.url_for(LOGIN_PATH),
            timeout: config.request_timeout(),
            store,
            events,
        }
    }

    /// Exchange email and password for a credential pair.
    ///
    /// On success both credentials are stored and
    /// [`SessionEvent::LoggedIn`] is emitted. A rejected login leaves any
    /// existing session untouched.
    pub async fn login(&self, email: &str, password: &SecretString) -> Result<UserProfile, UnitoError> {
        let response = self
            .http
            .post(&self.login_url)
            .json(&serde_json::json!({
                "email": email,
                "password": password.expose_secret(),
            }))
            .send()
            .await
            .map_err(|e| map_transport_error(e, self.timeout))?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        let LoginResponse {
            access,
            refresh,
            user,
        } = decode_body(response, self.timeout).await?;
        self.store
            .set(SecretString::from(access), Some(SecretString::from(refresh)))
            .await;

        info!(user_id = user.id, "logged in");
        self.events.emit(SessionEvent::LoggedIn);
        Ok(user)
    }

    /// Drop both credentials and announce the logout.
    pub async fn logout(&self) {
        self.store.clear().await;
        info!("logged out");
        self.events.emit(SessionEvent::LoggedOut);
    }

    /// Whether an access credential is currently held.
    pub async fn is_logged_in(&self) -> bool {
        self.store.access_token().await.is_some()
    }
}
