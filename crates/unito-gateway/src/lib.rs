// SPDX-FileCopyrightText: 2026 Unito Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Authenticated request gateway for the Unito portal client.
//!
//! [`RequestGateway`] attaches credentials, enforces the portal lock before
//! any I/O, and recovers from access-credential expiry through the
//! single-flight refresh coordinator.

pub mod gateway;

pub use gateway::RequestGateway;
