// SPDX-FileCopyrightText: 2026 Unito Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Billing lifecycle state for the Unito portal client.
//!
//! Tracks the subscription (trial countdown, past-due) and the service
//! contract (signing, notice period, read-only window), derives the portal
//! lock from both, and wires the whole client together in
//! [`PortalContext`].

pub mod context;
pub mod contract;
pub mod entitlement;
pub mod poller;
pub mod subscription;

pub use context::PortalContext;
pub use contract::{
    CancellationPreview, Contract, ContractState, ContractStatus, ContractSummary,
    ContractTemplate, ContractView, ContractViolation,
};
pub use entitlement::{LockReason, PortalEntitlement};
pub use poller::SubscriptionPoller;
pub use subscription::{
    BillingStatus, SubscriptionPlan, SubscriptionState, SubscriptionStatus, SubscriptionSummary,
};
