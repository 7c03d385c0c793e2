// SPDX-FileCopyrightText: 2026 Unito Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the Unito configuration system.

use unito_config::diagnostic::ConfigError;
use unito_config::model::StoreBackend;
use unito_config::{load_and_validate_str, load_config_from_str};

/// Valid TOML with every known field deserializes.
#[test]
fn valid_toml_deserializes_into_unito_config() {
    let toml = r#"
[client]
base_url = "https://app.unitopms.com/api"
request_timeout_secs = 10
log_level = "debug"

[session]
store = "memory"
database_path = "/tmp/unito.db"

[billing]
subscription_poll_secs = 120
trial_warning_days = 5
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.client.base_url, "https://app.unitopms.com/api");
    assert_eq!(config.client.request_timeout_secs, 10);
    assert_eq!(config.client.log_level, "debug");
    assert_eq!(config.session.store, StoreBackend::Memory);
    assert_eq!(config.session.database_path, "/tmp/unito.db");
    assert_eq!(config.billing.subscription_poll_secs, 120);
    assert_eq!(config.billing.trial_warning_days, 5);
}

/// An empty document yields the compiled defaults.
#[test]
fn empty_toml_uses_defaults() {
    let config = load_and_validate_str("").expect("defaults should validate");
    assert_eq!(config.client.base_url, "http://localhost:8000/api");
    assert_eq!(config.session.store, StoreBackend::Sqlite);
    assert_eq!(config.billing.subscription_poll_secs, 300);
}

/// A misspelled key is reported with a suggestion.
#[test]
fn unknown_key_produces_suggestion() {
    let toml = r#"
[client]
base_ulr = "https://app.unitopms.com/api"
"#;

    let errors = load_and_validate_str(toml).expect_err("should reject unknown key");
    assert_eq!(errors.len(), 1);
    match &errors[0] {
        ConfigError::UnknownKey {
            key, suggestion, ..
        } => {
            assert_eq!(key, "base_ulr");
            assert_eq!(suggestion.as_deref(), Some("base_url"));
        }
        other => panic!("expected UnknownKey, got {other:?}"),
    }
}

/// Unknown top-level sections are rejected too.
#[test]
fn unknown_section_is_rejected() {
    let toml = r#"
[telemetry]
enabled = true
"#;
    let err = load_config_from_str(toml).expect_err("should reject unknown section");
    assert!(err.to_string().contains("telemetry"), "got: {err}");
}

/// A wrong value type becomes an InvalidType diagnostic.
#[test]
fn wrong_type_is_reported() {
    let toml = r#"
[client]
request_timeout_secs = "soon"
"#;
    let errors = load_and_validate_str(toml).expect_err("should reject string timeout");
    assert!(
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::InvalidType { .. })),
        "got: {errors:?}"
    );
}

/// An unknown store backend names the accepted variants.
#[test]
fn unknown_store_backend_is_reported() {
    let toml = r#"
[session]
store = "redis"
"#;
    let errors = load_and_validate_str(toml).expect_err("should reject store backend");
    assert!(
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::InvalidValue { detail, .. } if detail.contains("sqlite"))),
        "got: {errors:?}"
    );
}

/// Semantic validation runs after a successful parse.
#[test]
fn validation_rejects_short_poll_interval() {
    let toml = r#"
[billing]
subscription_poll_secs = 2
"#;
    let errors = load_and_validate_str(toml).expect_err("poll interval below minimum");
    assert!(matches!(errors[0], ConfigError::Validation { .. }));
    assert!(errors[0].to_string().contains("subscription_poll_secs"));
}

/// Non-http base URLs are refused.
#[test]
fn validation_rejects_non_http_base_url() {
    let toml = r#"
[client]
base_url = "localhost:8000"
"#;
    let errors = load_and_validate_str(toml).expect_err("scheme is required");
    assert!(errors[0].to_string().contains("http://"));
}
