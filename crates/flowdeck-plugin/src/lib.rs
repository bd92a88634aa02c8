// SPDX-FileCopyrightText: 2026 Flowdeck Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Runtime plugin composition for the Flowdeck dashboard.
//!
//! Plugins are independently-deployed WebAssembly bundles discovered through
//! the backend's `/plugins` endpoint and fetched from a convention locator at
//! runtime -- code genuinely outside the host's build graph. Each bundle
//! exports a capability descriptor (detail views keyed by record type, routes,
//! sidebar and home entries); descriptors are merged in registry order with
//! last-writer-wins collision semantics and published to consumers as
//! immutable snapshots.
//!
//! A single bad or unavailable plugin never prevents the host or its sibling
//! plugins from functioning: every failure is scoped to one identifier and
//! that plugin simply contributes nothing.

pub mod descriptor;
pub mod host;
pub mod hub;
pub mod loader;
pub mod merge;
pub mod registry;
pub mod runtime;
pub mod tables;

pub use descriptor::{NavItem, PluginDescriptor, parse_descriptor};
pub use host::{HostCapabilities, RECORD_DETAIL, RECORD_TABLE};
pub use hub::{HubPhase, PluginHub, PluginSnapshot};
pub use loader::{PluginLoader, WasmPluginLoader};
pub use merge::{LoadedPlugin, merge};
pub use registry::RegistryClient;
pub use runtime::{GuestLimits, PluginModule};
pub use tables::{CapabilityMap, CapabilityTables, Component, ComponentRef, ComponentSource};
