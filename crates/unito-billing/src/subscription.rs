// SPDX-FileCopyrightText: 2026 Unito Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Subscription lifecycle: trial countdown and portal lockout.
//!
//! Transitions between statuses happen on the backend and are only observed
//! by re-fetching. Everything derived (days remaining, trial expiry, lock)
//! is recomputed from `(status, trial_ends_at, now)` on every read; derived
//! values the server includes in its payload are ignored.

use std::sync::Arc;

use arc_swap::ArcSwapOption;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use tracing::{debug, info, warn};
use unito_core::{Clock, UnitoError};
use unito_gateway::RequestGateway;

/// Backend path of the subscription status endpoint.
pub const SUBSCRIPTION_STATUS_PATH: &str = "/auth/subscription-status/";

const MILLIS_PER_DAY: i64 = 86_400_000;

/// Plan tier. Only informational; it does not affect entitlement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SubscriptionPlan {
    FreeTrial,
    Starter,
    Professional,
    Enterprise,
    #[serde(other)]
    Unknown,
}

/// Billing status as reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum BillingStatus {
    Trialing,
    Active,
    PastDue,
    Cancelled,
    Paused,
}

/// The subscription facts the portal lock is derived from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionStatus {
    #[serde(rename = "subscription_plan")]
    pub plan: SubscriptionPlan,
    #[serde(rename = "subscription_status")]
    pub status: BillingStatus,
    #[serde(default)]
    pub trial_ends_at: Option<DateTime<Utc>>,
    #[serde(default = "default_max_ota_connections")]
    pub max_ota_connections: u32,
}

fn default_max_ota_connections() -> u32 {
    2
}

impl SubscriptionStatus {
    /// Whole days left in the trial, rounded up, never negative.
    ///
    /// Zero when no trial end is set.
    pub fn trial_days_remaining(&self, now: DateTime<Utc>) -> i64 {
        self.trial_ends_at
            .map(|ends| ceil_days((ends - now).num_milliseconds()))
            .unwrap_or(0)
    }

    /// A trialing subscription with no days left.
    pub fn is_trial_expired(&self, now: DateTime<Utc>) -> bool {
        self.status == BillingStatus::Trialing && self.trial_days_remaining(now) == 0
    }

    /// Whether the subscription alone locks the portal.
    pub fn is_portal_locked(&self, now: DateTime<Utc>) -> bool {
        matches!(self.status, BillingStatus::PastDue | BillingStatus::Cancelled)
            || self.is_trial_expired(now)
    }

    /// A live trial within `warning_days` of its end.
    pub fn is_trial_ending_soon(&self, now: DateTime<Utc>, warning_days: u32) -> bool {
        self.status == BillingStatus::Trialing
            && !self.is_trial_expired(now)
            && self.trial_days_remaining(now) <= i64::from(warning_days)
    }

    /// Freeze the derived fields at `now` for display.
    pub fn summary(&self, now: DateTime<Utc>, warning_days: u32) -> SubscriptionSummary {
        SubscriptionSummary {
            plan: self.plan,
            status: self.status,
            trial_ends_at: self.trial_ends_at,
            max_ota_connections: self.max_ota_connections,
            trial_days_remaining: self.trial_days_remaining(now),
            is_trial_expired: self.is_trial_expired(now),
            is_trial_ending_soon: self.is_trial_ending_soon(now, warning_days),
            is_portal_locked: self.is_portal_locked(now),
        }
    }
}

/// Subscription facts plus derived fields evaluated at one instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubscriptionSummary {
    pub plan: SubscriptionPlan,
    pub status: BillingStatus,
    pub trial_ends_at: Option<DateTime<Utc>>,
    pub max_ota_connections: u32,
    pub trial_days_remaining: i64,
    pub is_trial_expired: bool,
    pub is_trial_ending_soon: bool,
    pub is_portal_locked: bool,
}

fn ceil_days(millis: i64) -> i64 {
    if millis <= 0 {
        0
    } else {
        (millis + MILLIS_PER_DAY - 1) / MILLIS_PER_DAY
    }
}

/// Cached subscription status, swapped atomically on each successful fetch.
///
/// Before the first successful fetch nothing is known and the subscription
/// does not lock the portal.
pub struct SubscriptionState {
    current: ArcSwapOption<SubscriptionStatus>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for SubscriptionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionState")
            .field("current", &self.current.load_full())
            .finish_non_exhaustive()
    }
}

impl SubscriptionState {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            current: ArcSwapOption::empty(),
            clock,
        }
    }

    /// The last successfully fetched status, if any.
    pub fn snapshot(&self) -> Option<Arc<SubscriptionStatus>> {
        self.current.load_full()
    }

    pub fn is_loaded(&self) -> bool {
        self.current.load().is_some()
    }

    pub fn is_portal_locked(&self) -> bool {
        self.current
            .load()
            .as_deref()
            .is_some_and(|s| s.is_portal_locked(self.clock.now()))
    }

    pub fn summary(&self, warning_days: u32) -> Option<SubscriptionSummary> {
        self.snapshot()
            .map(|s| s.summary(self.clock.now(), warning_days))
    }

    /// Replace the cached status.
    pub fn apply(&self, status: SubscriptionStatus) -> Arc<SubscriptionStatus> {
        let now = self.clock.now();
        let was_locked = self.is_portal_locked();
        let status = Arc::new(status);
        self.current.store(Some(Arc::clone(&status)));

        let locked = status.is_portal_locked(now);
        if locked != was_locked {
            info!(locked, status = %status.status, "portal lock changed by subscription");
        }
        status
    }

    /// Fetch the current status. On failure the cached status is kept.
    pub async fn fetch(
        &self,
        gateway: &RequestGateway,
    ) -> Result<Arc<SubscriptionStatus>, UnitoError> {
        let status: SubscriptionStatus = gateway.get(SUBSCRIPTION_STATUS_PATH).await?;
        debug!(status = %status.status, plan = %status.plan, "subscription status fetched");
        Ok(self.apply(status))
    }

    /// [`fetch`](Self::fetch), logging and swallowing failures.
    pub async fn refresh_quietly(&self, gateway: &RequestGateway) {
        if let Err(e) = self.fetch(gateway).await {
            warn!(error = %e, "subscription refresh failed, keeping cached status");
        }
    }
}
