// SPDX-FileCopyrightText: 2026 Unito Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Unito portal client.
//!
//! All structs use `#[serde(deny_unknown_fields)]` so a misspelled key is
//! reported at startup instead of silently falling back to a default.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level Unito configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct UnitoConfig {
    /// Backend connection settings.
    #[serde(default)]
    pub client: ClientConfig,

    /// Credential persistence settings.
    #[serde(default)]
    pub session: SessionConfig,

    /// Subscription polling and trial warning settings.
    #[serde(default)]
    pub billing: BillingConfig,
}

/// Backend connection configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    /// API root every endpoint path is appended to, without a trailing slash.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Upper bound for a single HTTP round-trip.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl ClientConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Join an endpoint path onto the base URL.
    pub fn url_for(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), endpoint)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
            log_level: default_log_level(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8000/api".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Where the session credentials live between runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    /// SQLite file, survives process restart.
    #[default]
    Sqlite,
    /// Process memory only.
    Memory,
}

/// Credential persistence configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SessionConfig {
    #[serde(default)]
    pub store: StoreBackend,

    /// Path to the SQLite file holding the credential pair.
    #[serde(default = "default_database_path")]
    pub database_path: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            store: StoreBackend::default(),
            database_path: default_database_path(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("unito").join("session.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("unito-session.db"))
        .to_string_lossy()
        .to_string()
}

/// Subscription polling configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BillingConfig {
    /// Interval between background subscription-status fetches.
    #[serde(default = "default_subscription_poll_secs")]
    pub subscription_poll_secs: u64,

    /// A trial with this many days or fewer left is reported as ending soon.
    #[serde(default = "default_trial_warning_days")]
    pub trial_warning_days: u32,
}

impl BillingConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.subscription_poll_secs)
    }
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            subscription_poll_secs: default_subscription_poll_secs(),
            trial_warning_days: default_trial_warning_days(),
        }
    }
}

fn default_subscription_poll_secs() -> u64 {
    300
}

fn default_trial_warning_days() -> u32 {
    3
}
