// SPDX-FileCopyrightText: 2026 Unito Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The portal context: every long-lived component, built once and shared.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::debug;
use unito_config::UnitoConfig;
use unito_core::{Clock, CredentialStore, SessionEvents, SystemClock, UnitoError};
use unito_gateway::RequestGateway;
use unito_session::{SessionClient, TokenRefreshCoordinator, build_http_client, open_store};

use crate::contract::{CancellationPreview, ContractState, ContractView};
use crate::entitlement::{LockReason, PortalEntitlement};
use crate::poller::SubscriptionPoller;
use crate::subscription::SubscriptionState;

/// Owns the credential store, the gateway and both lifecycle state holders.
///
/// Construct one per process (or per test) and pass it by reference.
pub struct PortalContext {
    config: UnitoConfig,
    store: Arc<dyn CredentialStore>,
    events: SessionEvents,
    session: SessionClient,
    gateway: Arc<RequestGateway>,
    entitlement: PortalEntitlement,
    subscription: Arc<SubscriptionState>,
    contract: Arc<ContractState>,
}

impl std::fmt::Debug for PortalContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PortalContext")
            .field("base_url", &self.config.client.base_url)
            .field("subscription", &self.subscription)
            .field("contract", &self.contract)
            .finish_non_exhaustive()
    }
}

impl PortalContext {
    /// Open the configured credential store and wire everything up against
    /// the system clock.
    pub async fn open(config: UnitoConfig) -> Result<Self, UnitoError> {
        let store = open_store(&config.session).await?;
        Self::with_parts(config, store, Arc::new(SystemClock))
    }

    /// Wire the context from an explicit store and clock.
    pub fn with_parts(
        config: UnitoConfig,
        store: Arc<dyn CredentialStore>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, UnitoError> {
        let http = build_http_client(&config.client)?;
        let events = SessionEvents::new();

        let subscription = Arc::new(SubscriptionState::new(Arc::clone(&clock)));
        let contract = Arc::new(ContractState::new(clock));
        let entitlement = PortalEntitlement::new(Arc::clone(&subscription), Arc::clone(&contract));

        let refresher = TokenRefreshCoordinator::new(
            http.clone(),
            &config.client,
            Arc::clone(&store),
            events.clone(),
        );
        let gateway = Arc::new(RequestGateway::new(
            http.clone(),
            &config.client,
            Arc::clone(&store),
            refresher,
            Arc::new(entitlement.clone()),
            events.clone(),
        ));
        let session = SessionClient::new(http, &config.client, Arc::clone(&store), events.clone());

        debug!(base_url = %config.client.base_url, "portal context ready");
        Ok(Self {
            config,
            store,
            events,
            session,
            gateway,
            entitlement,
            subscription,
            contract,
        })
    }

    pub fn config(&self) -> &UnitoConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn CredentialStore> {
        &self.store
    }

    pub fn events(&self) -> &SessionEvents {
        &self.events
    }

    pub fn session(&self) -> &SessionClient {
        &self.session
    }

    pub fn gateway(&self) -> &RequestGateway {
        &self.gateway
    }

    pub fn subscription(&self) -> &SubscriptionState {
        &self.subscription
    }

    pub fn contract(&self) -> &ContractState {
        &self.contract
    }

    pub fn is_locked(&self) -> bool {
        unito_core::EntitlementGuard::is_locked(&self.entitlement)
    }

    pub fn lock_reason(&self) -> Option<LockReason> {
        self.entitlement.lock_reason()
    }

    /// Re-fetch subscription and contract state, keeping stale state for
    /// whichever fetch fails.
    pub async fn refresh_all(&self) {
        tokio::join!(
            self.subscription.refresh_quietly(&self.gateway),
            self.contract.refresh_quietly(&self.gateway),
        );
    }

    /// Sign the contract, then re-fetch the subscription it may have changed.
    pub async fn sign_contract(&self) -> Result<Arc<ContractView>, UnitoError> {
        let view = self.contract.sign(&self.gateway).await?;
        self.subscription.refresh_quietly(&self.gateway).await;
        Ok(view)
    }

    /// Request cancellation, then re-fetch the subscription it may have changed.
    pub async fn request_cancellation(
        &self,
        reason: Option<&str>,
    ) -> Result<Arc<ContractView>, UnitoError> {
        let view = self
            .contract
            .request_cancellation(&self.gateway, reason)
            .await?;
        self.subscription.refresh_quietly(&self.gateway).await;
        Ok(view)
    }

    pub fn preview_cancellation(&self) -> Result<CancellationPreview, UnitoError> {
        self.contract.preview_cancellation()
    }

    /// Start the background subscription poller at the configured interval.
    pub fn spawn_poller(&self, cancel: CancellationToken) -> tokio::task::JoinHandle<()> {
        SubscriptionPoller::new(
            Arc::clone(&self.gateway),
            Arc::clone(&self.subscription),
            self.events.clone(),
            self.config.billing.poll_interval(),
        )
        .spawn(cancel)
    }
}
