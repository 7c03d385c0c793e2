// SPDX-FileCopyrightText: 2026 Unito Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Access credential renewal with single-flight deduplication.
//!
//! When several requests see a 401 at the same moment, only one
//! `POST /auth/token/refresh/` goes out. Every caller that arrives while it
//! is outstanding awaits the same shared result. The shared handle is
//! cleared as soon as the renewal settles, so the next expiry starts a fresh
//! one.

use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use unito_config::model::ClientConfig;
use unito_core::{CredentialStore, SessionEvent, SessionEvents, UnitoError};

use crate::transport::{api_error, decode_body, map_transport_error};

/// Backend path of the renewal endpoint.
pub const TOKEN_REFRESH_PATH: &str = "/auth/token/refresh/";

type Flight = Shared<BoxFuture<'static, bool>>;

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access: String,
    #[serde(default)]
    refresh: Option<String>,
}

struct Renewer {
    http: reqwest::Client,
    url: String,
    timeout: Duration,
    store: Arc<dyn CredentialStore>,
    events: SessionEvents,
}

impl Renewer {
    async fn renew(&self) -> bool {
        let Some(refresh) = self.store.refresh_token().await else {
            debug!("no refresh credential held, skipping renewal");
            return false;
        };

        match self.exchange(&refresh).await {
            Ok(renewed) => {
                let rotated = renewed.refresh.is_some();
                self.store
                    .set(
                        SecretString::from(renewed.access),
                        renewed.refresh.map(SecretString::from),
                    )
                    .await;
                info!(rotated, "access credential renewed");
                self.events.emit(SessionEvent::Refreshed);
                true
            }
            Err(e) => {
                warn!(error = %e, "access credential renewal failed");
                false
            }
        }
    }

    async fn exchange(&self, refresh: &SecretString) -> Result<RefreshResponse, UnitoError> {
        let response = self
            .http
            .post(&self.url)
            .json(&serde_json::json!({ "refresh": refresh.expose_secret() }))
            .send()
            .await
            .map_err(|e| map_transport_error(e, self.timeout))?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }
        decode_body(response, self.timeout).await
    }
}

/// Renews the access credential, at most one renewal at a time.
///
/// Cloning shares the in-flight handle, so clones deduplicate against each
/// other.
#[derive(Clone)]
pub struct TokenRefreshCoordinator {
    renewer: Arc<Renewer>,
    in_flight: Arc<Mutex<Option<Flight>>>,
}

impl std::fmt::Debug for TokenRefreshCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenRefreshCoordinator")
            .field("url", &self.renewer.url)
            .finish_non_exhaustive()
    }
}

impl TokenRefreshCoordinator {
    pub fn new(
        http: reqwest::Client,
        config: &ClientConfig,
        store: Arc<dyn CredentialStore>,
        events: SessionEvents,
    ) -> Self {
        Self {
            renewer: Arc::new(Renewer {
                http,
                url: config.url_for(TOKEN_REFRESH_PATH),
                timeout: config.request_timeout(),
                store,
                events,
            }),
            in_flight: Arc::new(Mutex::new(None)),
        }
    }

    /// Renew the access credential.
    ///
    /// Returns `false` when no refresh credential is held (without touching
    /// the network) or when the renewal fails for any reason. Never errors.
    pub async fn refresh(&self) -> bool {
        let flight = {
            let mut slot = self.in_flight.lock().await;
            match slot.as_ref() {
                Some(flight) => {
                    debug!("joining outstanding credential renewal");
                    flight.clone()
                }
                None => {
                    let flight = self.start_flight();
                    *slot = Some(flight.clone());
                    flight
                }
            }
        };
        flight.await
    }

    /// Whether a renewal is outstanding right now.
    pub async fn is_refreshing(&self) -> bool {
        self.in_flight.lock().await.is_some()
    }

    fn start_flight(&self) -> Flight {
        let renewer = Arc::clone(&self.renewer);
        let slot = Arc::clone(&self.in_flight);
        async move {
            let renewed = renewer.renew().await;
            slot.lock().await.take();
            renewed
        }
        .boxed()
        .shared()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tracing_test::traced_test;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::store::MemoryCredentialStore;

    fn secret(s: &str) -> SecretString {
        SecretString::from(s.to_string())
    }

    fn config_for(server: &MockServer) -> ClientConfig {
        ClientConfig {
            base_url: server.uri(),
            request_timeout_secs: 5,
            ..ClientConfig::default()
        }
    }

    async fn coordinator(
        server: &MockServer,
        store: Arc<MemoryCredentialStore>,
        events: SessionEvents,
    ) -> TokenRefreshCoordinator {
        let config = config_for(server);
        TokenRefreshCoordinator::new(reqwest::Client::new(), &config, store, events)
    }

    #[tokio::test]
    async fn no_refresh_credential_means_no_network_call() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let store = Arc::new(MemoryCredentialStore::new());
        let coord = coordinator(&server, store, SessionEvents::new()).await;
        assert!(!coord.refresh().await);
    }

    #[tokio::test]
    async fn successful_renewal_stores_access_and_rotated_refresh() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/token/refresh/"))
            .and(body_json(serde_json::json!({"refresh": "r1"})))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"access": "a2", "refresh": "r2"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let store = Arc::new(MemoryCredentialStore::new());
        store.set(secret("a1"), Some(secret("r1"))).await;
        let events = SessionEvents::new();
        let mut rx = events.subscribe();
        let coord = coordinator(&server, store.clone(), events).await;

        assert!(coord.refresh().await);
        assert_eq!(store.access_token().await.unwrap().expose_secret(), "a2");
        assert_eq!(store.refresh_token().await.unwrap().expose_secret(), "r2");
        assert_eq!(rx.recv().await.unwrap(), SessionEvent::Refreshed);
    }

    #[tokio::test]
    async fn renewal_without_rotation_keeps_refresh_credential() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/token/refresh/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"access": "a2"})))
            .mount(&server)
            .await;

        let store = Arc::new(MemoryCredentialStore::new());
        store.set(secret("a1"), Some(secret("r1"))).await;
        let coord = coordinator(&server, store.clone(), SessionEvents::new()).await;

        assert!(coord.refresh().await);
        assert_eq!(store.access_token().await.unwrap().expose_secret(), "a2");
        assert_eq!(store.refresh_token().await.unwrap().expose_secret(), "r1");
    }

    #[tokio::test]
    #[traced_test]
    async fn rejected_renewal_returns_false_and_keeps_store() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/token/refresh/"))
            .respond_with(
                ResponseTemplate::new(401)
                    .set_body_json(serde_json::json!({"detail": "Token is invalid or expired"})),
            )
            .mount(&server)
            .await;

        let store = Arc::new(MemoryCredentialStore::new());
        store.set(secret("a1"), Some(secret("r1"))).await;
        let coord = coordinator(&server, store.clone(), SessionEvents::new()).await;

        assert!(!coord.refresh().await);
        assert_eq!(store.access_token().await.unwrap().expose_secret(), "a1");
        assert!(logs_contain("access credential renewal failed"));
    }

    #[tokio::test]
    async fn malformed_renewal_body_returns_false() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let store = Arc::new(MemoryCredentialStore::new());
        store.set(secret("a1"), Some(secret("r1"))).await;
        let coord = coordinator(&server, store, SessionEvents::new()).await;
        assert!(!coord.refresh().await);
    }

    #[tokio::test]
    async fn unreachable_backend_returns_false() {
        let config = ClientConfig {
            base_url: "http://127.0.0.1:1".into(),
            ..ClientConfig::default()
        };
        let store = Arc::new(MemoryCredentialStore::new());
        store.set(secret("a1"), Some(secret("r1"))).await;
        let coord =
            TokenRefreshCoordinator::new(reqwest::Client::new(), &config, store, SessionEvents::new());
        assert!(!coord.refresh().await);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_callers_share_one_renewal() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/token/refresh/"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"access": "a2"}))
                    .set_delay(Duration::from_millis(200)),
            )
            .expect(1)
            .mount(&server)
            .await;

        let store = Arc::new(MemoryCredentialStore::new());
        store.set(secret("a1"), Some(secret("r1"))).await;
        let coord = coordinator(&server, store, SessionEvents::new()).await;

        let callers: Vec<_> = (0..8)
            .map(|_| {
                let coord = coord.clone();
                tokio::spawn(async move { coord.refresh().await })
            })
            .collect();
        for caller in callers {
            assert!(caller.await.unwrap());
        }
        assert!(!coord.is_refreshing().await);
    }

    #[tokio::test]
    async fn handle_is_cleared_so_next_expiry_renews_again() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/token/refresh/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"access": "a2"})))
            .expect(2)
            .mount(&server)
            .await;

        let store = Arc::new(MemoryCredentialStore::new());
        store.set(secret("a1"), Some(secret("r1"))).await;
        let coord = coordinator(&server, store, SessionEvents::new()).await;

        assert!(coord.refresh().await);
        assert!(coord.refresh().await);
    }
}
