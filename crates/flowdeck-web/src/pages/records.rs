// SPDX-FileCopyrightText: 2026 Flowdeck Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Record table pages.
//!
//! One handler serves all four kinds; pagination, sort, and filter parameters
//! pass straight through to the backend, and the page body renders through
//! the same `record_table` host capability that plugins compose.

use axum::extract::{Query, State};
use axum::response::Html;
use flowdeck_core::RecordKind;
use flowdeck_plugin::RECORD_TABLE;
use flowdeck_records::{ListQuery, SortOrder};
use serde::Deserialize;
use tracing::warn;

use crate::components::error_block;
use crate::layout::page_shell;
use crate::server::AppState;

/// Table query parameters, named as the backend expects them.
#[derive(Debug, Default, Deserialize)]
pub struct TableParams {
    #[serde(default)]
    pub skip: Option<u64>,
    #[serde(default)]
    pub limit: Option<u64>,
    #[serde(default, rename = "sortField")]
    pub sort_field: Option<String>,
    #[serde(default, rename = "sortOrder")]
    pub sort_order: Option<String>,
    #[serde(default, rename = "filterModel")]
    pub filter_model: Option<String>,
}

impl TableParams {
    pub fn to_query(&self) -> ListQuery {
        let defaults = ListQuery::default();
        ListQuery {
            skip: self.skip.unwrap_or(defaults.skip),
            limit: self.limit.unwrap_or(defaults.limit).clamp(1, 500),
            sort_field: self
                .sort_field
                .clone()
                .unwrap_or_else(|| defaults.sort_field.clone()),
            sort_order: match self.sort_order.as_deref() {
                Some("asc") => SortOrder::Asc,
                Some("desc") => SortOrder::Desc,
                _ => defaults.sort_order,
            },
            filter: self
                .filter_model
                .as_deref()
                .and_then(|raw| serde_json::from_str(raw).ok()),
        }
    }
}

/// Projected columns per record kind, mirroring the backend projections.
pub fn columns_for(kind: RecordKind) -> &'static [&'static str] {
    match kind {
        RecordKind::Process | RecordKind::WorkGraph => &[
            "pk",
            "ctime",
            "process_label",
            "process_state",
            "process_status",
            "exit_status",
            "label",
            "description",
        ],
        RecordKind::DataNode => &["pk", "ctime", "node_type", "label", "description"],
        RecordKind::GroupNode => &["pk", "ctime", "label", "description"],
    }
}

pub async fn table_page(
    State(state): State<AppState>,
    kind: RecordKind,
    Query(params): Query<TableParams>,
) -> Html<String> {
    let snapshot = state.hub.snapshot();
    let banner = state.registry_banner.read().await.clone();
    let query = params.to_query();

    let body = match state.records.list(kind, &query).await {
        Ok(page) => {
            let props = serde_json::json!({
                "path": format!("/{}", kind.segment()),
                "columns": columns_for(kind),
                "rows": page.data,
                "total": page.total,
                "skip": query.skip,
                "limit": query.limit,
                "sort_field": query.sort_field,
                "sort_order": query.sort_order.to_string(),
            });
            match state.host.render(RECORD_TABLE, &props).await {
                Ok(html) => html,
                Err(error) => {
                    warn!(kind = %kind, %error, "record table failed to render");
                    error_block(&error.to_string())
                }
            }
        }
        Err(error) => {
            warn!(kind = %kind, %error, "record listing failed");
            error_block(&format!("Failed to load {}: {error}", kind.title()))
        }
    };

    Html(page_shell(
        kind.title(),
        &snapshot,
        banner.as_deref(),
        None,
        &body,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn params_default_to_table_defaults() {
        let query = TableParams::default().to_query();
        assert_eq!(query.skip, 0);
        assert_eq!(query.limit, 15);
        assert_eq!(query.sort_field, "pk");
        assert_eq!(query.sort_order, SortOrder::Desc);
        assert!(query.filter.is_none());
    }

    #[test]
    fn params_clamp_limit_and_parse_filter() {
        let params = TableParams {
            limit: Some(10_000),
            sort_order: Some("asc".into()),
            filter_model: Some(r#"{"items":[{"field":"label"}]}"#.into()),
            ..TableParams::default()
        };
        let query = params.to_query();
        assert_eq!(query.limit, 500);
        assert_eq!(query.sort_order, SortOrder::Asc);
        assert!(query.filter.is_some());
    }

    #[test]
    fn invalid_filter_json_is_dropped() {
        let params = TableParams {
            filter_model: Some("{broken".into()),
            ..TableParams::default()
        };
        assert!(params.to_query().filter.is_none());
    }

    #[test]
    fn every_kind_projects_pk_first() {
        for kind in RecordKind::all() {
            assert_eq!(columns_for(kind)[0], "pk");
        }
    }
}
