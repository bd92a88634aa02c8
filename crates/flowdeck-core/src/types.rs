// SPDX-FileCopyrightText: 2026 Flowdeck Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Record and scheduler types shared across the Flowdeck workspace.
//!
//! The record API backend owns the storage and query logic; these types only
//! mirror its response shapes.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::FlowdeckError;

/// The record kinds served by the backend's table endpoints.
///
/// Each kind maps to a `/api/{segment}-data` listing endpoint plus the
/// pause/play/kill/delete operation routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordKind {
    Process,
    WorkGraph,
    DataNode,
    GroupNode,
}

impl RecordKind {
    /// URL path segment used by the backend routes (e.g. `datanode`).
    pub fn segment(&self) -> &'static str {
        match self {
            RecordKind::Process => "process",
            RecordKind::WorkGraph => "workgraph",
            RecordKind::DataNode => "datanode",
            RecordKind::GroupNode => "groupnode",
        }
    }

    /// Human-readable title for page headers.
    pub fn title(&self) -> &'static str {
        match self {
            RecordKind::Process => "Processes",
            RecordKind::WorkGraph => "WorkGraphs",
            RecordKind::DataNode => "Data Nodes",
            RecordKind::GroupNode => "Group Nodes",
        }
    }

    /// All kinds, in sidebar display order.
    pub fn all() -> [RecordKind; 4] {
        [
            RecordKind::Process,
            RecordKind::WorkGraph,
            RecordKind::DataNode,
            RecordKind::GroupNode,
        ]
    }

    /// True for kinds that represent running processes and accept
    /// pause/play/kill control actions.
    pub fn is_controllable(&self) -> bool {
        matches!(self, RecordKind::Process | RecordKind::WorkGraph)
    }
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.segment())
    }
}

impl FromStr for RecordKind {
    type Err = FlowdeckError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "process" => Ok(RecordKind::Process),
            "workgraph" => Ok(RecordKind::WorkGraph),
            "datanode" => Ok(RecordKind::DataNode),
            "groupnode" => Ok(RecordKind::GroupNode),
            other => Err(FlowdeckError::Internal(format!(
                "unknown record kind '{other}'"
            ))),
        }
    }
}

/// A single record row as returned by the backend's listing endpoints.
///
/// The backend projects a different column set per kind, so everything
/// beyond the primary key is kept as loosely-typed fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordRow {
    /// Primary key of the record.
    pub pk: i64,
    /// All remaining projected columns.
    #[serde(flatten)]
    pub fields: serde_json::Map<String, serde_json::Value>,
}

impl RecordRow {
    /// The record's fully-qualified node type, when the projection carries one.
    pub fn node_type(&self) -> Option<&str> {
        self.fields.get("node_type").and_then(|v| v.as_str())
    }

    /// A string field by name, when present and a string.
    pub fn str_field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(|v| v.as_str())
    }
}

/// One page of records plus the total matching count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub total: u64,
    pub data: Vec<T>,
}

/// Status of one scheduler as reported by `/api/scheduler/list`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerStatus {
    pub name: String,
    pub pk: i64,
    pub running: bool,
    pub waiting_process_count: u64,
    pub running_process_count: u64,
    pub running_calcjob_count: u64,
    pub max_calcjobs: u64,
    pub max_processes: u64,
}

/// Reply from the delete endpoint.
///
/// With `dry_run=true` nothing is removed; `deleted_nodes` still reports the
/// full cascade of dependent records that a real delete would take with it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteReport {
    pub deleted: bool,
    pub message: String,
    #[serde(default)]
    pub deleted_nodes: Vec<i64>,
}

/// Reply from the pause/play/kill control endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlReply {
    pub message: String,
}

/// Reply from the field-level partial update endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateReply {
    pub updated: bool,
    pub pk: i64,
}
