// SPDX-FileCopyrightText: 2026 Unito Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Unito integration tests.
//!
//! # Components
//!
//! - [`MockBackend`] - wiremock server with the portal endpoints pre-wired
//! - [`TestPortal`] - a complete [`PortalContext`](unito_billing::PortalContext)
//!   with a pinned clock, pointed at a `MockBackend`

pub mod harness;
pub mod mock_backend;

pub use harness::{TestPortal, TestPortalBuilder};
pub use mock_backend::{MockBackend, contract_body, subscription_body};
