// SPDX-FileCopyrightText: 2026 Flowdeck Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Host-provided building blocks exported to plugin code.
//!
//! The host capability set is a fixed mapping from capability name to a
//! host-implemented component, constructed once at application start and
//! passed by `Arc` into every plugin render invocation. Plugins compose host
//! UI (the generic record table, the generic detail shell) through it instead
//! of reimplementing those pieces. There is no mutation API: changing a
//! capability's implementation is a new build, not a runtime operation.

use std::sync::Arc;

use flowdeck_core::FlowdeckError;
use tracing::warn;

use crate::tables::{CapabilityMap, Component};

/// Capability name of the generic sortable/paginated record table.
pub const RECORD_TABLE: &str = "record_table";

/// Capability name of the generic record detail shell.
pub const RECORD_DETAIL: &str = "record_detail";

/// Fixed name -> component mapping handed to plugins, read-only.
#[derive(Default)]
pub struct HostCapabilities {
    entries: CapabilityMap<Arc<dyn Component>>,
}

impl HostCapabilities {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style registration, used only during startup assembly.
    pub fn with(mut self, name: &str, component: Arc<dyn Component>) -> Self {
        self.entries.insert(name, component);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Component>> {
        self.entries.get(name)
    }

    /// Capability names, in registration order. Included in every plugin
    /// render context so guests know what they may compose.
    pub fn names(&self) -> Vec<String> {
        self.entries.keys().map(str::to_string).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Render the named capability. An unknown name is a render error on the
    /// calling plugin's side, not a host failure.
    pub async fn render(
        &self,
        name: &str,
        props: &serde_json::Value,
    ) -> Result<String, FlowdeckError> {
        match self.entries.get(name) {
            Some(component) => component.render(props).await,
            None => {
                warn!(capability = %name, "plugin requested unknown host capability");
                Err(FlowdeckError::Render {
                    message: format!("unknown host capability '{name}'"),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct FixedFragment(&'static str);

    #[async_trait]
    impl Component for FixedFragment {
        async fn render(&self, _props: &serde_json::Value) -> Result<String, FlowdeckError> {
            Ok(self.0.to_string())
        }
    }

    #[tokio::test]
    async fn registered_capability_renders() {
        let host = HostCapabilities::new()
            .with(RECORD_TABLE, Arc::new(FixedFragment("<table/>")))
            .with(RECORD_DETAIL, Arc::new(FixedFragment("<dl/>")));

        assert_eq!(host.len(), 2);
        assert_eq!(host.names(), vec!["record_table", "record_detail"]);
        let html = host
            .render(RECORD_TABLE, &serde_json::json!({}))
            .await
            .unwrap();
        assert_eq!(html, "<table/>");
    }

    #[tokio::test]
    async fn unknown_capability_is_a_render_error() {
        let host = HostCapabilities::new();
        let err = host
            .render("charting", &serde_json::json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, FlowdeckError::Render { .. }));
    }
}
