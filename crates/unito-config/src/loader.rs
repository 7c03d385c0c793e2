// SPDX-FileCopyrightText: 2026 Unito Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Layered configuration loading with Figment.
//!
//! Lookup order: `./unito.toml` > `~/.config/unito/unito.toml` > `/etc/unito/unito.toml`,
//! with `UNITO_` environment variables overriding all files.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::UnitoConfig;

/// System-wide config file.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/unito/unito.toml";

/// Config file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "unito.toml";

/// Per-user config file under the XDG config directory.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("unito").join("unito.toml"))
}

/// Load configuration from the standard hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/unito/unito.toml`
/// 3. `~/.config/unito/unito.toml`
/// 4. `./unito.toml`
/// 5. `UNITO_*` environment variables
pub fn load_config() -> Result<UnitoConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no file lookup, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<UnitoConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(UnitoConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from an explicit file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<UnitoConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(UnitoConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// The Figment used by [`load_config`], before extraction.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(UnitoConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_PATH))
        .merge(Toml::file(user_config_path().unwrap_or_default()))
        .merge(Toml::file(LOCAL_CONFIG_FILE))
        .merge(env_provider())
}

/// Config sections reachable through `UNITO_<SECTION>_<KEY>` variables.
const ENV_SECTIONS: [&str; 3] = ["client", "session", "billing"];

/// Environment provider mapping `UNITO_<SECTION>_<KEY>` to `section.key`.
///
/// Uses `Env::filter_map()` rather than `Env::split("_")`: keys such as
/// `base_url` contain underscores, so `UNITO_CLIENT_BASE_URL` must become
/// `client.base_url`, not `client.base.url`. Variables outside the known
/// sections, such as `UNITO_PASSWORD`, are not configuration and are
/// skipped.
fn env_provider() -> Env {
    Env::prefixed("UNITO_").filter_map(|key| {
        let key = key.as_str().to_ascii_lowercase();
        ENV_SECTIONS.iter().find_map(|section| {
            key.strip_prefix(section)
                .and_then(|rest| rest.strip_prefix('_'))
                .filter(|field| !field.is_empty())
                .map(|field| format!("{section}.{field}").into())
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::StoreBackend;

    #[test]
    fn env_overrides_file_values() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "custom.toml",
                r#"
[client]
base_url = "https://from-file.example.com/api"
"#,
            )?;
            jail.set_env("UNITO_CLIENT_BASE_URL", "https://from-env.example.com/api");
            jail.set_env("UNITO_SESSION_STORE", "memory");
            jail.set_env("UNITO_BILLING_SUBSCRIPTION_POLL_SECS", "60");

            let config = load_config_from_path(Path::new("custom.toml"))?;
            assert_eq!(config.client.base_url, "https://from-env.example.com/api");
            assert_eq!(config.session.store, StoreBackend::Memory);
            assert_eq!(config.billing.subscription_poll_secs, 60);
            Ok(())
        });
    }

    #[test]
    fn unrelated_unito_variables_are_ignored() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("UNITO_PASSWORD", "hunter2");
            jail.set_env("UNITO_CLIENT_REQUEST_TIMEOUT_SECS", "7");

            let config = load_config()?;
            assert_eq!(config.client.request_timeout_secs, 7);

            jail.create_file("custom.toml", "")?;
            let config = load_config_from_path(Path::new("custom.toml"))?;
            assert_eq!(config.client.request_timeout_secs, 7);
            Ok(())
        });
    }

    #[test]
    fn local_file_is_picked_up() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                LOCAL_CONFIG_FILE,
                r#"
[client]
request_timeout_secs = 5
"#,
            )?;
            let config = load_config()?;
            assert_eq!(config.client.request_timeout_secs, 5);
            Ok(())
        });
    }
}
