// SPDX-FileCopyrightText: 2026 Unito Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Seam traits between the session, gateway and billing crates.

pub mod clock;
pub mod credential_store;
pub mod entitlement;

pub use clock::{Clock, FixedClock, SystemClock};
pub use credential_store::CredentialStore;
pub use entitlement::{
    EntitlementGuard, LOCKDOWN_ALLOW_LIST, Unrestricted, is_allow_listed, is_read_only,
};
