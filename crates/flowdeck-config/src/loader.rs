// SPDX-FileCopyrightText: 2026 Flowdeck Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./flowdeck.toml` > `~/.config/flowdeck/flowdeck.toml`
//! > `/etc/flowdeck/flowdeck.toml` with environment variable overrides via the
//! `FLOWDECK_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::FlowdeckConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/flowdeck/flowdeck.toml` (system-wide)
/// 3. `~/.config/flowdeck/flowdeck.toml` (user XDG config)
/// 4. `./flowdeck.toml` (local directory)
/// 5. `FLOWDECK_*` environment variables
pub fn load_config() -> Result<FlowdeckConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(FlowdeckConfig::default()))
        .merge(Toml::file("/etc/flowdeck/flowdeck.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("flowdeck/flowdeck.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("flowdeck.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
///
/// Used for testing and explicit config specification.
pub fn load_config_from_str(toml_content: &str) -> Result<FlowdeckConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(FlowdeckConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<FlowdeckConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(FlowdeckConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Create the environment variable provider using explicit `map()` for
/// section-to-dot mapping.
///
/// Uses `Env::map()` NOT `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names: `FLOWDECK_PLUGINS_LOAD_TIMEOUT_SECS` must
/// map to `plugins.load_timeout_secs`, not `plugins.load.timeout.secs`.
fn env_provider() -> Env {
    Env::prefixed("FLOWDECK_").map(|key| {
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("server_", "server.", 1)
            .replacen("backend_", "backend.", 1)
            .replacen("plugins_", "plugins.", 1)
            .replacen("scheduler_", "scheduler.", 1);
        mapped.into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_from_str_applies_overrides() {
        let config = load_config_from_str(
            r#"
[backend]
base_url = "http://backend.lab:8000"

[plugins]
load_timeout_secs = 3
"#,
        )
        .unwrap();

        assert_eq!(config.backend.base_url, "http://backend.lab:8000");
        assert_eq!(config.plugins.load_timeout_secs, 3);
        // Untouched sections keep defaults.
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn load_from_str_rejects_unknown_section_key() {
        let result = load_config_from_str(
            r#"
[plugins]
laod_timeout_secs = 3
"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn env_mapping_preserves_snake_case_tails() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("FLOWDECK_PLUGINS_LOAD_TIMEOUT_SECS", "42");
            jail.set_env("FLOWDECK_SERVER_PORT", "9999");

            let config: FlowdeckConfig = Figment::new()
                .merge(Serialized::defaults(FlowdeckConfig::default()))
                .merge(env_provider())
                .extract()?;

            assert_eq!(config.plugins.load_timeout_secs, 42);
            assert_eq!(config.server.port, 9999);
            Ok(())
        });
    }
}
