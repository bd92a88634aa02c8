// SPDX-FileCopyrightText: 2026 Flowdeck Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration error diagnostics rendered through miette.
//!
//! Figment errors and post-deserialization validation failures are collected
//! into [`ConfigError`] values and rendered as readable reports at startup.

use miette::Diagnostic;
use thiserror::Error;

/// A configuration error with diagnostic help text.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    /// The configuration could not be parsed or deserialized.
    #[error("failed to parse configuration: {message}")]
    #[diagnostic(
        code(flowdeck::config::parse),
        help("check ./flowdeck.toml, ~/.config/flowdeck/flowdeck.toml and FLOWDECK_* environment variables")
    )]
    Parse {
        /// The underlying figment error message.
        message: String,
    },

    /// A configuration value failed semantic validation.
    #[error("invalid configuration: {message}")]
    #[diagnostic(code(flowdeck::config::validation))]
    Validation {
        /// Description of the failed constraint.
        message: String,
    },
}

/// Convert a figment extraction error into `ConfigError` values.
///
/// Figment reports one error per failed key; each becomes its own entry so
/// every problem is shown in a single run.
pub fn figment_to_config_errors(err: figment::Error) -> Vec<ConfigError> {
    err.into_iter()
        .map(|e| ConfigError::Parse {
            message: e.to_string(),
        })
        .collect()
}

/// Render collected configuration errors to stderr.
pub fn render_errors(errors: &[ConfigError]) {
    for error in errors {
        let report = miette::Report::msg(error.to_string());
        eprintln!("{report:?}");
        if let Some(help) = error.help() {
            eprintln!("  help: {help}");
        }
    }
}
