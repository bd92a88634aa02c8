// SPDX-FileCopyrightText: 2026 Flowdeck Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Flowdeck dashboard.
//!
//! This crate provides the shared error type and the record/scheduler data
//! model mirrored from the workflow engine's REST backend. The plugin
//! composition core lives in `flowdeck-plugin`; this crate stays dependency-light
//! so every workspace member can use it.

pub mod error;
pub mod types;

pub use error::FlowdeckError;
pub use types::{
    ControlReply, DeleteReport, Page, RecordKind, RecordRow, SchedulerStatus, UpdateReply,
};
