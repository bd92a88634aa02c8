// SPDX-FileCopyrightText: 2026 Flowdeck Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Client for the workflow engine's record and scheduler REST API.
//!
//! The API server and its storage/query logic are an external collaborator;
//! this crate only speaks its HTTP contract.

pub mod client;
pub mod query;

pub use client::{RecordClient, StartScheduler};
pub use query::{ListQuery, SortOrder};
