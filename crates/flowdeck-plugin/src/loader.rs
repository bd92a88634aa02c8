// SPDX-FileCopyrightText: 2026 Flowdeck Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Plugin loading behind the [`PluginLoader`] seam.
//!
//! The only contract is "string identifier in, loaded plugin out". The
//! production [`WasmPluginLoader`] fetches the bundle from the backend's
//! convention locator and evaluates it in the wasmtime sandbox; the merger
//! and hub never know which mechanism produced a [`LoadedPlugin`], which
//! keeps them testable with fake loaders.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use flowdeck_core::FlowdeckError;
use tracing::debug;
use wasmtime::Engine;

use crate::descriptor::parse_descriptor;
use crate::host::HostCapabilities;
use crate::merge::LoadedPlugin;
use crate::registry::RegistryClient;
use crate::runtime::{GuestLimits, PluginModule, plugin_engine};

/// Asynchronous plugin loading contract.
///
/// Implementations must scope every failure to the requested identifier;
/// the hub treats any error as "this plugin contributes nothing".
#[async_trait]
pub trait PluginLoader: Send + Sync {
    async fn load(&self, id: &str) -> Result<LoadedPlugin, FlowdeckError>;
}

/// Production loader: HTTP bundle fetch + wasmtime evaluation.
pub struct WasmPluginLoader {
    registry: Arc<RegistryClient>,
    engine: Engine,
    limits: GuestLimits,
    host: Arc<HostCapabilities>,
    load_timeout: Duration,
}

impl WasmPluginLoader {
    pub fn new(
        registry: Arc<RegistryClient>,
        host: Arc<HostCapabilities>,
        limits: GuestLimits,
        load_timeout: Duration,
    ) -> Result<Self, FlowdeckError> {
        Ok(Self {
            registry,
            engine: plugin_engine()?,
            limits,
            host,
            load_timeout,
        })
    }
}

#[async_trait]
impl PluginLoader for WasmPluginLoader {
    async fn load(&self, id: &str) -> Result<LoadedPlugin, FlowdeckError> {
        validate_identifier(id)?;

        let load = async {
            let bytes = self.registry.fetch_bundle(id).await?;
            let module = PluginModule::compile(
                &self.engine,
                id,
                &bytes,
                self.limits.clone(),
                self.host.clone(),
            )?;

            // The descriptor call is the bundle's one-time evaluation; any
            // trap here means the bundle itself is broken.
            let descriptor_json =
                module
                    .invoke("describe", "{}".to_string())
                    .await
                    .map_err(|e| match e {
                        malformed @ FlowdeckError::MalformedPlugin { .. } => malformed,
                        other => FlowdeckError::PluginLoad {
                            plugin: id.to_string(),
                            message: format!("describe call failed: {other}"),
                            source: None,
                        },
                    })?;

            let descriptor = parse_descriptor(id, &descriptor_json)?;
            debug!(plugin = %id, title = %descriptor.title, "plugin evaluated");

            Ok(LoadedPlugin {
                id: id.to_string(),
                descriptor,
                source: Arc::new(module),
            })
        };

        match tokio::time::timeout(self.load_timeout, load).await {
            Ok(result) => result,
            Err(_) => Err(FlowdeckError::PluginLoad {
                plugin: id.to_string(),
                message: format!("load exceeded {:?}", self.load_timeout),
                source: None,
            }),
        }
    }
}

/// Identifiers become URL path segments; reject anything that cannot form
/// the convention locator safely.
fn validate_identifier(id: &str) -> Result<(), FlowdeckError> {
    if id.is_empty() {
        return Err(FlowdeckError::MalformedPlugin {
            plugin: id.to_string(),
            reason: "plugin identifier must not be empty".to_string(),
        });
    }
    let acceptable = id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if !acceptable || id.starts_with('.') {
        return Err(FlowdeckError::MalformedPlugin {
            plugin: id.to_string(),
            reason: format!("plugin identifier '{id}' is not usable as a path segment"),
        });
    }
    Ok(())
}
