// SPDX-FileCopyrightText: 2026 Flowdeck Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Dashboard web layer: routing, pages, and the host component exports.
//!
//! This crate holds the consumers of the merged capability tables: the router
//! (built-in pages plus fallback dispatch of plugin routes), the sidebar and
//! home contributions, and the record detail page's viewer lookup. It also
//! implements the host capability set -- the generic record table and detail
//! shell -- that plugin code composes at render time.

use std::sync::Arc;

use flowdeck_plugin::{HostCapabilities, RECORD_DETAIL, RECORD_TABLE};

pub mod components;
pub mod layout;
pub mod pages;
pub mod poller;
pub mod server;

pub use components::{RecordDetail, RecordTable};
pub use poller::{SchedulerMonitor, SchedulerPanel};
pub use server::{AppState, ServerConfig, build_router, start_server};

/// The fixed host capability set, constructed once at application start.
pub fn standard_host_capabilities() -> Arc<HostCapabilities> {
    Arc::new(
        HostCapabilities::new()
            .with(RECORD_TABLE, Arc::new(RecordTable))
            .with(RECORD_DETAIL, Arc::new(RecordDetail)),
    )
}
