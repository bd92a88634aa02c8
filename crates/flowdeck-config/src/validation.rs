// SPDX-FileCopyrightText: 2026 Flowdeck Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes, such as valid bind addresses and non-zero intervals.

use crate::diagnostic::ConfigError;
use crate::model::FlowdeckConfig;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &FlowdeckConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let host = config.server.host.trim();
    if host.is_empty() {
        errors.push(ConfigError::Validation {
            message: "server.host must not be empty".to_string(),
        });
    } else {
        let is_valid_ip = host.parse::<std::net::IpAddr>().is_ok();
        let is_valid_hostname = host
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == ':');
        if !is_valid_ip && !is_valid_hostname {
            errors.push(ConfigError::Validation {
                message: format!("server.host `{host}` is not a valid IP address or hostname"),
            });
        }
    }

    if config.server.port == 0 {
        errors.push(ConfigError::Validation {
            message: "server.port must not be 0".to_string(),
        });
    }

    let base_url = config.backend.base_url.trim();
    if base_url.is_empty() {
        errors.push(ConfigError::Validation {
            message: "backend.base_url must not be empty".to_string(),
        });
    } else if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
        errors.push(ConfigError::Validation {
            message: format!("backend.base_url `{base_url}` must start with http:// or https://"),
        });
    }

    if config.backend.request_timeout_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "backend.request_timeout_secs must be at least 1".to_string(),
        });
    }

    if config.plugins.load_timeout_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "plugins.load_timeout_secs must be at least 1".to_string(),
        });
    }

    if config.plugins.render_fuel == 0 {
        errors.push(ConfigError::Validation {
            message: "plugins.render_fuel must be non-zero".to_string(),
        });
    }

    if config.scheduler.poll_interval_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "scheduler.poll_interval_secs must be at least 1".to_string(),
        });
    }

    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_levels.contains(&config.server.log_level.as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "server.log_level `{}` is not one of: trace, debug, info, warn, error",
                config.server.log_level
            ),
        });
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}
