// SPDX-FileCopyrightText: 2026 Flowdeck Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Flowdeck dashboard.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Flowdeck configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable
/// overrides. All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FlowdeckConfig {
    /// Dashboard HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Record API backend settings.
    #[serde(default)]
    pub backend: BackendConfig,

    /// Runtime plugin loading settings.
    #[serde(default)]
    pub plugins: PluginsConfig,

    /// Scheduler monitor settings.
    #[serde(default)]
    pub scheduler: SchedulerConfig,
}

/// Dashboard HTTP server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
        }
    }
}

/// Record API backend configuration.
///
/// The backend is an external collaborator; Flowdeck only consumes its HTTP
/// contract (record tables, process control, scheduler status, plugin
/// discovery and bundle serving).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BackendConfig {
    /// Base URL of the record API backend.
    #[serde(default = "default_backend_url")]
    pub base_url: String,

    /// Request timeout for record API calls, in seconds.
    #[serde(default = "default_api_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_backend_url(),
            request_timeout_secs: default_api_timeout(),
        }
    }
}

/// Runtime plugin loading configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PluginsConfig {
    /// Master switch for the plugin subsystem.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Upper bound on one plugin's fetch + evaluate, in seconds.
    /// An overrun fails that plugin only.
    #[serde(default = "default_load_timeout")]
    pub load_timeout_secs: u64,

    /// Fuel budget for one guest invocation (describe or render).
    #[serde(default = "default_render_fuel")]
    pub render_fuel: u64,

    /// Wall-clock epoch deadline for one guest invocation, in seconds.
    #[serde(default = "default_render_timeout")]
    pub render_timeout_secs: u64,
}

impl Default for PluginsConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            load_timeout_secs: default_load_timeout(),
            render_fuel: default_render_fuel(),
            render_timeout_secs: default_render_timeout(),
        }
    }
}

/// Scheduler monitor configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SchedulerConfig {
    /// Interval between scheduler status polls, in seconds.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_backend_url() -> String {
    "http://127.0.0.1:8000".to_string()
}

fn default_api_timeout() -> u64 {
    30
}

fn default_true() -> bool {
    true
}

fn default_load_timeout() -> u64 {
    10
}

fn default_render_fuel() -> u64 {
    50_000_000
}

fn default_render_timeout() -> u64 {
    5
}

fn default_poll_interval() -> u64 {
    3
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sensible() {
        let config = FlowdeckConfig::default();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.backend.base_url, "http://127.0.0.1:8000");
        assert!(config.plugins.enabled);
        assert_eq!(config.plugins.load_timeout_secs, 10);
        assert_eq!(config.scheduler.poll_interval_secs, 3);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config: FlowdeckConfig = toml::from_str(
            r#"
[server]
port = 9090
"#,
        )
        .unwrap();
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.plugins.load_timeout_secs, 10);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let result: Result<FlowdeckConfig, _> = toml::from_str(
            r#"
[server]
prot = 9090
"#,
        );
        assert!(result.is_err());
    }
}
