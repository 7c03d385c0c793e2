// SPDX-FileCopyrightText: 2026 Unito Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.

use crate::diagnostic::ConfigError;
use crate::model::{StoreBackend, UnitoConfig};

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Shortest accepted subscription poll interval, in seconds.
pub const MIN_POLL_SECS: u64 = 10;

/// Validate a deserialized configuration.
///
/// Collects every failure instead of stopping at the first one.
pub fn validate_config(config: &UnitoConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let base_url = config.client.base_url.trim();
    if base_url.is_empty() {
        errors.push(ConfigError::Validation {
            message: "client.base_url must not be empty".to_string(),
        });
    } else if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
        errors.push(ConfigError::Validation {
            message: format!("client.base_url `{base_url}` must start with http:// or https://"),
        });
    }

    if config.client.request_timeout_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "client.request_timeout_secs must be at least 1".to_string(),
        });
    }

    if !LOG_LEVELS.contains(&config.client.log_level.as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "client.log_level `{}` must be one of: {}",
                config.client.log_level,
                LOG_LEVELS.join(", ")
            ),
        });
    }

    if config.session.store == StoreBackend::Sqlite && config.session.database_path.trim().is_empty()
    {
        errors.push(ConfigError::Validation {
            message: "session.database_path must not be empty when session.store = \"sqlite\""
                .to_string(),
        });
    }

    if config.billing.subscription_poll_secs < MIN_POLL_SECS {
        errors.push(ConfigError::Validation {
            message: format!(
                "billing.subscription_poll_secs must be at least {MIN_POLL_SECS}, got {}",
                config.billing.subscription_poll_secs
            ),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
