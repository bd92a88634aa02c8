// SPDX-FileCopyrightText: 2026 Flowdeck Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Merged capability tables and the component rendering seam.
//!
//! [`CapabilityMap`] is the insertion-ordered, unique-key map underlying all
//! four capability tables. Insertion order is what the sidebar and home page
//! iterate, so the collision policy is part of the observable contract:
//! inserting an existing key overwrites the value **in place**, keeping the
//! position of the first insertion.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use flowdeck_core::FlowdeckError;
use serde::de::{Deserialize, Deserializer, MapAccess, Visitor};

use crate::descriptor::NavItem;

/// A renderable UI building block.
///
/// Host pages, host capabilities handed to plugins, and plugin-contributed
/// views all sit behind this one trait: JSON props in, HTML fragment out.
#[async_trait]
pub trait Component: Send + Sync {
    async fn render(&self, props: &serde_json::Value) -> Result<String, FlowdeckError>;
}

/// A provider of named renderers, typically one evaluated plugin module.
///
/// Keeping the loading mechanism behind this seam lets the merger and hub be
/// tested with fake sources that never touch WebAssembly.
#[async_trait]
pub trait ComponentSource: Send + Sync {
    /// Render the named component with the given props.
    async fn render_component(
        &self,
        component: &str,
        props: &serde_json::Value,
    ) -> Result<String, FlowdeckError>;
}

/// A handle to one named renderer of one plugin.
#[derive(Clone)]
pub struct ComponentRef {
    plugin: String,
    component: String,
    source: Arc<dyn ComponentSource>,
}

impl ComponentRef {
    pub fn new(
        plugin: impl Into<String>,
        component: impl Into<String>,
        source: Arc<dyn ComponentSource>,
    ) -> Self {
        Self {
            plugin: plugin.into(),
            component: component.into(),
            source,
        }
    }

    /// Identifier of the plugin that contributed this component.
    pub fn plugin(&self) -> &str {
        &self.plugin
    }

    /// Name of the renderer inside the contributing plugin.
    pub fn component(&self) -> &str {
        &self.component
    }

    pub async fn render(&self, props: &serde_json::Value) -> Result<String, FlowdeckError> {
        self.source.render_component(&self.component, props).await
    }
}

impl fmt::Debug for ComponentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentRef")
            .field("plugin", &self.plugin)
            .field("component", &self.component)
            .finish()
    }
}

/// Insertion-ordered map with unique keys and in-place overwrite.
#[derive(Debug, Clone)]
pub struct CapabilityMap<V> {
    entries: Vec<(String, V)>,
}

// Manual impl: the derive would demand `V: Default`, which component values
// do not have.
impl<V> Default for CapabilityMap<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> CapabilityMap<V> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Insert a key/value pair. Returns true when an existing key was
    /// overwritten (the key keeps its original position).
    pub fn insert(&mut self, key: impl Into<String>, value: V) -> bool {
        let key = key.into();
        if let Some(slot) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            slot.1 = value;
            true
        } else {
            self.entries.push((key, value));
            false
        }
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Deserializes from a JSON object, preserving document key order.
///
/// Going through `serde_json::Value` first would sort the keys; this visitor
/// consumes map entries in the order they appear in the source text.
impl<'de, V: Deserialize<'de>> Deserialize<'de> for CapabilityMap<V> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct MapVisitor<V> {
            marker: std::marker::PhantomData<V>,
        }

        impl<'de, V: Deserialize<'de>> Visitor<'de> for MapVisitor<V> {
            type Value = CapabilityMap<V>;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a JSON object")
            }

            fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut map = CapabilityMap::new();
                while let Some((key, value)) = access.next_entry::<String, V>()? {
                    map.insert(key, value);
                }
                Ok(map)
            }
        }

        deserializer.deserialize_map(MapVisitor {
            marker: std::marker::PhantomData,
        })
    }
}

/// The four merged capability tables.
///
/// Owned exclusively by the plugin hub and only ever replaced wholesale on
/// publish; consumers hold `Arc` snapshots and never observe a partial merge.
#[derive(Debug, Clone, Default)]
pub struct CapabilityTables {
    /// Record `node_type` -> detail-view component.
    pub data_views: CapabilityMap<ComponentRef>,
    /// URL path -> page component.
    pub routes: CapabilityMap<ComponentRef>,
    /// Item key -> sidebar navigation entry.
    pub side_bar_items: CapabilityMap<NavItem>,
    /// Item key -> home page entry.
    pub home_items: CapabilityMap<NavItem>,
}

impl CapabilityTables {
    pub fn is_empty(&self) -> bool {
        self.data_views.is_empty()
            && self.routes.is_empty()
            && self.side_bar_items.is_empty()
            && self.home_items.is_empty()
    }
}
