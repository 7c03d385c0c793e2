// SPDX-FileCopyrightText: 2026 Unito Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Background subscription status polling.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use unito_core::{SessionEvent, SessionEvents};
use unito_gateway::RequestGateway;

use crate::subscription::SubscriptionState;

/// Re-fetches the subscription status on a fixed interval.
///
/// The first fetch happens immediately. Failures keep the cached status.
/// Stops on cancellation, and when the session expires or is logged out.
pub struct SubscriptionPoller {
    gateway: Arc<RequestGateway>,
    subscription: Arc<SubscriptionState>,
    events: SessionEvents,
    interval: Duration,
}

impl SubscriptionPoller {
    pub fn new(
        gateway: Arc<RequestGateway>,
        subscription: Arc<SubscriptionState>,
        events: SessionEvents,
        interval: Duration,
    ) -> Self {
        Self {
            gateway,
            subscription,
            events,
            interval,
        }
    }

    pub fn spawn(self, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(cancel))
    }

    pub async fn run(self, cancel: CancellationToken) {
        let mut events = self.events.subscribe();
        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(interval_secs = self.interval.as_secs(), "subscription poller started");

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    self.subscription.refresh_quietly(&self.gateway).await;
                }
                event = events.recv() => match event {
                    Ok(event @ (SessionEvent::Expired | SessionEvent::LoggedOut)) => {
                        info!(%event, "subscription poller stopping: session ended");
                        break;
                    }
                    Ok(_) => {}
                    Err(RecvError::Lagged(skipped)) => {
                        debug!(skipped, "subscription poller lagged behind session events");
                    }
                    Err(RecvError::Closed) => break,
                },
                _ = cancel.cancelled() => {
                    info!("subscription poller shutting down");
                    break;
                }
            }
        }
    }
}
