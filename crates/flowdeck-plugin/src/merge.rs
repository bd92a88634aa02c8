// SPDX-FileCopyrightText: 2026 Flowdeck Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pure, ordered merge of loaded plugin descriptors into capability tables.
//!
//! The merge is a pure function of its input order: descriptors are iterated
//! as given and every capability entry is copied into the accumulator with
//! last-writer-wins overwrite. Failed loads never reach this function, so the
//! output keys are exactly the union over successfully loaded plugins.

use std::fmt;
use std::sync::Arc;

use crate::descriptor::PluginDescriptor;
use crate::tables::{CapabilityTables, ComponentRef, ComponentSource};

/// A successfully loaded plugin: its validated descriptor plus the evaluated
/// module its component names resolve against.
#[derive(Clone)]
pub struct LoadedPlugin {
    /// Registry identifier (authoritative, unlike the descriptor's `id`).
    pub id: String,
    /// Validated capability descriptor.
    pub descriptor: PluginDescriptor,
    /// Renderer backing the descriptor's component names.
    pub source: Arc<dyn ComponentSource>,
}

impl fmt::Debug for LoadedPlugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadedPlugin")
            .field("id", &self.id)
            .field("descriptor", &self.descriptor)
            .finish()
    }
}

/// Merge descriptors in the given order into unified capability tables.
///
/// Later plugins overwrite earlier ones on key collisions; the colliding key
/// keeps its original position. Absent capability maps contribute nothing.
/// Performs no I/O and never fails.
pub fn merge(loaded: &[LoadedPlugin]) -> CapabilityTables {
    let mut tables = CapabilityTables::default();

    for plugin in loaded {
        for (key, component) in plugin.descriptor.data_view.iter() {
            tables.data_views.insert(
                key,
                ComponentRef::new(&plugin.id, component, plugin.source.clone()),
            );
        }
        for (key, component) in plugin.descriptor.routes.iter() {
            tables.routes.insert(
                key,
                ComponentRef::new(&plugin.id, component, plugin.source.clone()),
            );
        }
        for (key, item) in plugin.descriptor.side_bar_items.iter() {
            tables.side_bar_items.insert(key, item.clone());
        }
        for (key, item) in plugin.descriptor.home_items.iter() {
            tables.home_items.insert(key, item.clone());
        }
    }

    tables
}
