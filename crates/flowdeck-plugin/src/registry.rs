// SPDX-FileCopyrightText: 2026 Flowdeck Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for plugin discovery and bundle retrieval.
//!
//! The backend exposes `GET /plugins` returning the installed plugin
//! identifiers, and serves each plugin's self-contained bundle under the
//! convention locator `/plugins/{id}/static/{id}.wasm`. Both resources live
//! outside the host's own build graph.

use std::time::Duration;

use flowdeck_core::FlowdeckError;
use serde::Deserialize;
use tracing::debug;

/// Response shape of `GET /plugins`.
#[derive(Debug, Deserialize)]
struct PluginListResponse {
    #[serde(default)]
    plugins: Vec<String>,
}

/// Client for the backend's plugin discovery and bundle endpoints.
#[derive(Debug, Clone)]
pub struct RegistryClient {
    http: reqwest::Client,
    base_url: String,
}

impl RegistryClient {
    /// Creates a registry client against the given backend base URL.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, FlowdeckError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FlowdeckError::RegistryFetch {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch the installed plugin identifier list.
    ///
    /// Any failure here degrades the host to zero plugins; it is surfaced to
    /// the operator but never treated as fatal.
    pub async fn list_plugins(&self) -> Result<Vec<String>, FlowdeckError> {
        let url = format!("{}/plugins", self.base_url);
        let response =
            self.http
                .get(&url)
                .send()
                .await
                .map_err(|e| FlowdeckError::RegistryFetch {
                    message: format!("request to {url} failed: {e}"),
                    source: Some(Box::new(e)),
                })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FlowdeckError::RegistryFetch {
                message: format!("{url} returned HTTP {status}"),
                source: None,
            });
        }

        let list: PluginListResponse =
            response
                .json()
                .await
                .map_err(|e| FlowdeckError::RegistryFetch {
                    message: format!("invalid plugin list payload: {e}"),
                    source: Some(Box::new(e)),
                })?;

        debug!(count = list.plugins.len(), "fetched plugin identifier list");
        Ok(list.plugins)
    }

    /// Fetch one plugin's bundle bytes from the convention locator.
    ///
    /// Failures are scoped to the plugin being loaded.
    pub async fn fetch_bundle(&self, id: &str) -> Result<Vec<u8>, FlowdeckError> {
        let url = format!("{}/plugins/{id}/static/{id}.wasm", self.base_url);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| FlowdeckError::PluginLoad {
                plugin: id.to_string(),
                message: format!("bundle request to {url} failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FlowdeckError::PluginLoad {
                plugin: id.to_string(),
                message: format!("bundle at {url} returned HTTP {status}"),
                source: None,
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| FlowdeckError::PluginLoad {
                plugin: id.to_string(),
                message: format!("failed to read bundle body: {e}"),
                source: Some(Box::new(e)),
            })?;

        debug!(plugin = %id, size = bytes.len(), "fetched plugin bundle");
        Ok(bytes.to_vec())
    }
}
