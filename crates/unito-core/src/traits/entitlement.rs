// SPDX-FileCopyrightText: 2026 Unito Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Entitlement guard trait deciding whether mutating calls may proceed.

use http::Method;

/// Endpoint prefixes that stay reachable for every method while the portal is locked.
pub const LOCKDOWN_ALLOW_LIST: &[&str] = &[
    "/auth/subscription-status",
    "/auth/notifications",
    "/auth/token/refresh",
    "/auth/profile",
];

/// Read-only methods never mutate backend state and are always admitted.
pub fn is_read_only(method: &Method) -> bool {
    matches!(*method, Method::GET | Method::HEAD)
}

/// Whether `endpoint` starts with one of the [`LOCKDOWN_ALLOW_LIST`] prefixes.
pub fn is_allow_listed(endpoint: &str) -> bool {
    LOCKDOWN_ALLOW_LIST
        .iter()
        .any(|prefix| endpoint.starts_with(prefix))
}

/// Decides whether the billing/contract lifecycle permits mutating requests.
///
/// Injected into the request gateway at construction time; the gateway only
/// ever reads the verdict.
pub trait EntitlementGuard: Send + Sync + 'static {
    /// Returns `true` when the portal is locked for mutating operations.
    fn is_locked(&self) -> bool;

    /// Whether a request may proceed even though the portal is locked.
    fn is_allowed_while_locked(&self, endpoint: &str, method: &Method) -> bool {
        is_read_only(method) || is_allow_listed(endpoint)
    }

    /// Full admission decision for a request.
    fn admits(&self, endpoint: &str, method: &Method) -> bool {
        !self.is_locked() || self.is_allowed_while_locked(endpoint, method)
    }
}

/// A guard that never locks. Used before any billing state is known and for
/// unauthenticated calls such as login.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unrestricted;

impl EntitlementGuard for Unrestricted {
    fn is_locked(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Locked;

    impl EntitlementGuard for Locked {
        fn is_locked(&self) -> bool {
            true
        }
    }

    #[test]
    fn read_only_methods() {
        assert!(is_read_only(&Method::GET));
        assert!(is_read_only(&Method::HEAD));
        assert!(!is_read_only(&Method::POST));
        assert!(!is_read_only(&Method::PATCH));
        assert!(!is_read_only(&Method::DELETE));
    }

    #[test]
    fn allow_list_matches_by_prefix() {
        assert!(is_allow_listed("/auth/subscription-status/"));
        assert!(is_allow_listed("/auth/notifications/12/read/"));
        assert!(is_allow_listed("/auth/token/refresh/"));
        assert!(is_allow_listed("/auth/profile/"));
        assert!(!is_allow_listed("/auth/properties/"));
        assert!(!is_allow_listed("/auth/contract/sign/"));
    }

    #[test]
    fn locked_guard_rejects_mutations_off_the_allow_list() {
        let guard = Locked;
        assert!(!guard.admits("/auth/properties/", &Method::POST));
        assert!(guard.admits("/auth/properties/", &Method::GET));
        assert!(guard.admits("/auth/profile/", &Method::PATCH));
        assert!(guard.admits("/auth/notifications/3/read/", &Method::POST));
    }

    struct AllowListOnly;

    impl EntitlementGuard for AllowListOnly {
        fn is_locked(&self) -> bool {
            true
        }

        fn is_allowed_while_locked(&self, endpoint: &str, _method: &Method) -> bool {
            is_allow_listed(endpoint)
        }
    }

    #[test]
    fn admission_defers_to_the_lockdown_rule() {
        let guard = AllowListOnly;
        assert!(!guard.admits("/auth/properties/", &Method::GET));
        assert!(guard.admits("/auth/profile/", &Method::GET));
    }

    #[test]
    fn unrestricted_guard_admits_everything() {
        let guard = Unrestricted;
        assert!(!guard.is_locked());
        assert!(guard.admits("/auth/properties/", &Method::DELETE));
    }
}
