// SPDX-FileCopyrightText: 2026 Flowdeck Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for the Flowdeck dashboard.
//!
//! Provides TOML configuration parsing with strict validation
//! (`deny_unknown_fields`), XDG file hierarchy lookup, environment variable
//! overrides, and diagnostic error rendering.
//!
//! # Usage
//!
//! ```no_run
//! use flowdeck_config::load_and_validate;
//!
//! let config = load_and_validate().expect("config errors");
//! println!("backend: {}", config.backend.base_url);
//! ```

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

pub use diagnostic::{ConfigError, render_errors};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::FlowdeckConfig;

/// Load configuration from the XDG hierarchy and validate it.
///
/// The high-level entry point used by the binary:
/// 1. Loads config from TOML files + env vars via Figment
/// 2. On success: runs post-deserialization validation
/// 3. On Figment error: converts each keyed error to a diagnostic
pub fn load_and_validate() -> Result<FlowdeckConfig, Vec<ConfigError>> {
    match loader::load_config() {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => Err(diagnostic::figment_to_config_errors(err)),
    }
}

/// Load configuration from a TOML string and validate it.
///
/// Useful for testing and explicit configuration.
pub fn load_and_validate_str(toml_content: &str) -> Result<FlowdeckConfig, Vec<ConfigError>> {
    match loader::load_config_from_str(toml_content) {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => Err(diagnostic::figment_to_config_errors(err)),
    }
}
