// SPDX-FileCopyrightText: 2026 Unito Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The request gateway: every outbound backend call goes through here.
//!
//! Order of operations for one call:
//!
//! 1. entitlement check (mutations are refused locally while locked, unless
//!    the endpoint is on the lockdown allow-list);
//! 2. attach the current access credential as a bearer token;
//! 3. send;
//! 4. on 401, renew through the [`TokenRefreshCoordinator`] and retry once,
//!    or tear the session down when renewal fails;
//! 5. map any other failure to [`UnitoError::Api`].

use std::sync::Arc;
use std::time::Duration;

use reqwest::StatusCode;
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info, warn};
use unito_config::model::ClientConfig;
use unito_core::{
    CredentialStore, EntitlementGuard, Method, SessionEvent, SessionEvents, UnitoError,
};
use unito_session::TokenRefreshCoordinator;
use unito_session::transport::{api_error, decode_body, map_transport_error};

/// Single chokepoint for authenticated backend calls.
pub struct RequestGateway {
    http: reqwest::Client,
    base_url: String,
    timeout: Duration,
    store: Arc<dyn CredentialStore>,
    refresher: TokenRefreshCoordinator,
    guard: Arc<dyn EntitlementGuard>,
    events: SessionEvents,
}

impl std::fmt::Debug for RequestGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestGateway")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("locked", &self.guard.is_locked())
            .finish_non_exhaustive()
    }
}

impl RequestGateway {
    pub fn new(
        http: reqwest::Client,
        config: &ClientConfig,
        store: Arc<dyn CredentialStore>,
        refresher: TokenRefreshCoordinator,
        guard: Arc<dyn EntitlementGuard>,
        events: SessionEvents,
    ) -> Self {
        Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout: config.request_timeout(),
            store,
            refresher,
            guard,
            events,
        }
    }

    /// Issue a request and decode the success body into `T`.
    ///
    /// An empty success body decodes as JSON `null`, so `()` and
    /// `Option<_>` work for endpoints that return nothing.
    pub async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&Value>,
    ) -> Result<T, UnitoError> {
        self.admit(&method, endpoint)?;

        let response = self.send(&method, endpoint, body).await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return self.finish(response).await;
        }

        debug!(%method, endpoint, "unauthorized, renewing access credential");
        if !self.refresher.refresh().await {
            self.store.clear().await;
            info!(%method, endpoint, "session expired, credentials cleared");
            self.events.emit(SessionEvent::Expired);
            return Err(UnitoError::SessionExpired);
        }

        // The portal may have locked while the renewal was outstanding.
        self.admit(&method, endpoint)?;

        let retry = self.send(&method, endpoint, body).await?;
        self.finish(retry).await
    }

    pub async fn get<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, UnitoError> {
        self.request(Method::GET, endpoint, None).await
    }

    pub async fn post<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: Option<&Value>,
    ) -> Result<T, UnitoError> {
        self.request(Method::POST, endpoint, body).await
    }

    pub async fn put<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: Option<&Value>,
    ) -> Result<T, UnitoError> {
        self.request(Method::PUT, endpoint, body).await
    }

    pub async fn patch<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: Option<&Value>,
    ) -> Result<T, UnitoError> {
        self.request(Method::PATCH, endpoint, body).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, UnitoError> {
        self.request(Method::DELETE, endpoint, None).await
    }

    /// Whether the entitlement guard currently reports a locked portal.
    pub fn is_locked(&self) -> bool {
        self.guard.is_locked()
    }

    fn admit(&self, method: &Method, endpoint: &str) -> Result<(), UnitoError> {
        if self.guard.admits(endpoint, method) {
            return Ok(());
        }
        warn!(%method, endpoint, "request refused: portal is locked");
        Err(UnitoError::Entitlement {
            method: method.to_string(),
            endpoint: endpoint.to_string(),
        })
    }

    async fn send(
        &self,
        method: &Method,
        endpoint: &str,
        body: Option<&Value>,
    ) -> Result<reqwest::Response, UnitoError> {
        let url = format!("{}{}", self.base_url, endpoint);
        let mut builder = self.http.request(method.clone(), &url);
        if let Some(access) = self.store.access_token().await {
            builder = builder.bearer_auth(access.expose_secret());
        }
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| map_transport_error(e, self.timeout))?;
        debug!(%method, endpoint, status = %response.status(), "response received");
        Ok(response)
    }

    async fn finish<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T, UnitoError> {
        if response.status().is_success() {
            decode_body(response, self.timeout).await
        } else {
            Err(api_error(response).await)
        }
    }
}
