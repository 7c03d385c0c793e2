// SPDX-FileCopyrightText: 2026 Unito Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Portal lock derived from the subscription and contract state.

use std::sync::Arc;

use serde::Serialize;
use strum::Display;
use unito_core::EntitlementGuard;

use crate::contract::ContractState;
use crate::subscription::{BillingStatus, SubscriptionState};

/// Why the portal is locked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum LockReason {
    #[strum(to_string = "payment is past due")]
    PastDue,
    #[strum(to_string = "subscription is cancelled")]
    SubscriptionCancelled,
    #[strum(to_string = "free trial has ended")]
    TrialExpired,
    #[strum(to_string = "service contract is cancelled")]
    ContractCancelled,
}

/// Entitlement guard reading the cached billing state.
///
/// Locked when the subscription is past due, cancelled or out of trial, or
/// when the contract is cancelled. A contract that only has cancellation
/// requested keeps the portal open.
#[derive(Debug, Clone)]
pub struct PortalEntitlement {
    subscription: Arc<SubscriptionState>,
    contract: Arc<ContractState>,
}

impl PortalEntitlement {
    pub fn new(subscription: Arc<SubscriptionState>, contract: Arc<ContractState>) -> Self {
        Self {
            subscription,
            contract,
        }
    }

    /// The first reason the portal is locked, if it is.
    pub fn lock_reason(&self) -> Option<LockReason> {
        if let Some(summary) = self.subscription.summary(0) {
            match summary.status {
                BillingStatus::PastDue => return Some(LockReason::PastDue),
                BillingStatus::Cancelled => return Some(LockReason::SubscriptionCancelled),
                _ if summary.is_trial_expired => return Some(LockReason::TrialExpired),
                _ => {}
            }
        }
        self.contract
            .is_portal_locked()
            .then_some(LockReason::ContractCancelled)
    }
}

impl EntitlementGuard for PortalEntitlement {
    fn is_locked(&self) -> bool {
        self.subscription.is_portal_locked() || self.contract.is_portal_locked()
    }
}
