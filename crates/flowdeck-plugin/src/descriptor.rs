// SPDX-FileCopyrightText: 2026 Flowdeck Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Plugin descriptor schema and validation.
//!
//! A plugin bundle's `describe` export hands back a JSON document which must
//! deserialize into [`PluginDescriptor`]. Every field is optional -- an empty
//! object is a valid descriptor contributing nothing -- but a document that is
//! not an object at all, or whose capability maps have the wrong shape, is
//! rejected as [`FlowdeckError::MalformedPlugin`] before any of it is merged.
//!
//! Wire field names are camelCase, matching what plugin bundles ship.

use flowdeck_core::FlowdeckError;
use serde::{Deserialize, Serialize};

use crate::tables::CapabilityMap;

/// The capability descriptor a plugin module exports.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PluginDescriptor {
    /// Plugin-declared identifier. Metadata only; the registry identifier is
    /// authoritative everywhere in the host.
    pub id: String,
    /// Human-readable title.
    pub title: String,
    /// Version string, opaque to the host.
    pub version: String,
    /// Human-readable description.
    pub description: String,

    /// Record `node_type` -> renderer name.
    #[serde(rename = "dataView")]
    pub data_view: CapabilityMap<String>,

    /// URL path -> renderer name.
    pub routes: CapabilityMap<String>,

    /// Item key -> sidebar entry.
    #[serde(rename = "sideBarItems")]
    pub side_bar_items: CapabilityMap<NavItem>,

    /// Item key -> home page entry.
    #[serde(rename = "homeItems")]
    pub home_items: CapabilityMap<NavItem>,
}

impl PluginDescriptor {
    /// True when the descriptor contributes to no capability table.
    pub fn is_empty(&self) -> bool {
        self.data_view.is_empty()
            && self.routes.is_empty()
            && self.side_bar_items.is_empty()
            && self.home_items.is_empty()
    }
}

/// A navigation affordance contributed to the sidebar or home page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavItem {
    /// Target path, typically one of the plugin's own routes.
    pub path: String,
    /// Display label.
    pub label: String,
    /// Optional icon name, opaque to the host.
    #[serde(default)]
    pub icon: Option<String>,
}

/// Parse and validate a descriptor JSON document.
///
/// Parses from the source text directly (not through `serde_json::Value`) so
/// that capability map entries keep their document order.
pub fn parse_descriptor(plugin: &str, json: &str) -> Result<PluginDescriptor, FlowdeckError> {
    let probe: serde_json::Value =
        serde_json::from_str(json).map_err(|e| FlowdeckError::MalformedPlugin {
            plugin: plugin.to_string(),
            reason: format!("descriptor is not valid JSON: {e}"),
        })?;

    if !probe.is_object() {
        return Err(FlowdeckError::MalformedPlugin {
            plugin: plugin.to_string(),
            reason: format!(
                "descriptor must be a JSON object, got {}",
                json_type_name(&probe)
            ),
        });
    }

    serde_json::from_str(json).map_err(|e| FlowdeckError::MalformedPlugin {
        plugin: plugin.to_string(),
        reason: format!("descriptor does not match the capability schema: {e}"),
    })
}

fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}
