// SPDX-FileCopyrightText: 2026 Flowdeck Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Flowdeck dashboard.

use thiserror::Error;

/// The primary error type used across all Flowdeck crates.
///
/// Plugin-boundary variants (`RegistryFetch`, `PluginLoad`, `MalformedPlugin`)
/// are always contained at the plugin boundary: one bad plugin degrades to
/// "contributes nothing" and never takes down the host or its siblings.
#[derive(Debug, Error)]
pub enum FlowdeckError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// The installed-plugin list could not be retrieved from the backend.
    ///
    /// Degrades to an empty plugin set with an operator-visible banner.
    #[error("plugin registry fetch failed: {message}")]
    RegistryFetch {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A specific plugin's bundle failed to fetch, compile, or evaluate.
    #[error("plugin '{plugin}' failed to load: {message}")]
    PluginLoad {
        plugin: String,
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A plugin loaded but its exported descriptor does not meet the
    /// minimum shape (a JSON object).
    #[error("plugin '{plugin}' exported a malformed descriptor: {reason}")]
    MalformedPlugin { plugin: String, reason: String },

    /// A record/scheduler API call returned an error or could not be made.
    #[error("record API error: {message}")]
    Api {
        message: String,
        status: Option<u16>,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A component failed to produce its HTML fragment.
    #[error("render error: {message}")]
    Render { message: String },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl FlowdeckError {
    /// True for errors that must be isolated to a single plugin.
    pub fn is_plugin_scoped(&self) -> bool {
        matches!(
            self,
            FlowdeckError::PluginLoad { .. } | FlowdeckError::MalformedPlugin { .. }
        )
    }
}
