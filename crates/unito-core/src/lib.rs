// SPDX-FileCopyrightText: 2026 Unito Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Unito portal client.
//!
//! Provides the error taxonomy, the session credential types and the seam
//! traits ([`CredentialStore`], [`EntitlementGuard`], [`Clock`]) that the
//! session, gateway and billing crates are wired together through.

pub mod error;
pub mod traits;
pub mod types;

pub use error::{TransitionError, UnitoError, server_message};
pub use types::{ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, SessionEvent, SessionEvents, SessionTokens};

pub use traits::{
    Clock, CredentialStore, EntitlementGuard, FixedClock, LOCKDOWN_ALLOW_LIST, SystemClock,
    Unrestricted, is_allow_listed, is_read_only,
};

/// HTTP method type used across the gateway API.
pub use http::Method;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unito_error_has_all_variants() {
        let _entitlement = UnitoError::Entitlement {
            method: "POST".into(),
            endpoint: "/auth/properties/".into(),
        };
        let _expired = UnitoError::SessionExpired;
        let _api = UnitoError::Api {
            status: 500,
            message: "boom".into(),
        };
        let _network = UnitoError::Network {
            message: "connection refused".into(),
            source: None,
        };
        let _timeout = UnitoError::Timeout {
            duration: std::time::Duration::from_secs(30),
        };
        let _decode = UnitoError::Decode("bad json".into());
        let _transition = UnitoError::Transition(TransitionError::MissingServiceEnd);
        let _config = UnitoError::Config("test".into());
        let _storage = UnitoError::Storage {
            source: Box::new(std::io::Error::other("test")),
        };
        let _internal = UnitoError::Internal("test".into());
    }

    #[test]
    fn all_seam_traits_are_exported() {
        fn _assert_store<T: CredentialStore>() {}
        fn _assert_guard<T: EntitlementGuard>() {}
        fn _assert_clock<T: Clock>() {}
        _assert_guard::<Unrestricted>();
        _assert_clock::<SystemClock>();
        _assert_clock::<FixedClock>();
    }
}
