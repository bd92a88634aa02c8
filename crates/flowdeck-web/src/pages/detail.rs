// SPDX-FileCopyrightText: 2026 Flowdeck Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Record detail page and per-record actions.
//!
//! The detail page always renders the generic field table. When the record's
//! `node_type` has an entry in the merged `data_views` table, the plugin's
//! viewer renders below it with the record as its `data` prop; absence of an
//! entry is the default path, not an error. A viewer that fails to render
//! degrades to an inline error block for that section only.

use axum::Form;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use flowdeck_core::{FlowdeckError, RecordKind, RecordRow};
use flowdeck_plugin::RECORD_DETAIL;
use serde::Deserialize;
use tracing::warn;

use crate::components::{error_block, escape};
use crate::layout::page_shell;
use crate::server::AppState;

/// Transient notice/error codes carried across redirects.
#[derive(Debug, Default, Deserialize)]
pub struct NoticeParams {
    #[serde(default)]
    pub notice: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl NoticeParams {
    /// Resolve the carried code to display text. Unknown codes are ignored.
    pub fn text(&self) -> Option<String> {
        if let Some(code) = self.error.as_deref() {
            return error_text(code).map(str::to_string);
        }
        self.notice
            .as_deref()
            .and_then(notice_text)
            .map(str::to_string)
    }
}

fn notice_text(code: &str) -> Option<&'static str> {
    match code {
        "saved" => Some("Changes saved"),
        "unchanged" => Some("No changes to save"),
        "paused" => Some("Process paused"),
        "resumed" => Some("Process resumed"),
        "killed" => Some("Kill signal sent"),
        "deleted" => Some("Record deleted"),
        "scheduler_started" => Some("Scheduler started"),
        "scheduler_stopped" => Some("Scheduler stopped"),
        _ => None,
    }
}

fn error_text(code: &str) -> Option<&'static str> {
    match code {
        "save_failed" => Some("Saving failed; the record keeps its previous values"),
        "control_failed" => Some("Control action failed"),
        "delete_failed" => Some("Delete failed; nothing was removed"),
        "scheduler_failed" => Some("Scheduler control failed"),
        _ => None,
    }
}

fn detail_path(kind: RecordKind, pk: i64) -> String {
    format!("/{}/{pk}", kind.segment())
}

/// Built-in type-specific section for process-like records.
fn builtin_section(kind: RecordKind, record: &RecordRow) -> Option<String> {
    if !kind.is_controllable() {
        return None;
    }
    let state = record.str_field("process_state").unwrap_or("unknown");
    let status = record.str_field("process_status").unwrap_or("");
    let exit = record
        .fields
        .get("exit_status")
        .map(|v| v.to_string())
        .unwrap_or_default();
    Some(format!(
        r#"<section class="process-summary"><h3>Process</h3>
<p>State: <strong>{}</strong></p><p>Status: {}</p><p>Exit status: {}</p></section>"#,
        escape(state),
        escape(status),
        escape(&exit)
    ))
}

fn edit_form(kind: RecordKind, pk: i64, record: &RecordRow) -> String {
    format!(
        r#"<form class="edit-form" method="post" action="{path}/edit">
<label>Label <input name="label" value="{label}"></label>
<label>Description <input name="description" value="{description}"></label>
<button>Save</button>
</form>"#,
        path = detail_path(kind, pk),
        label = escape(record.str_field("label").unwrap_or("")),
        description = escape(record.str_field("description").unwrap_or("")),
    )
}

fn action_forms(kind: RecordKind, pk: i64) -> String {
    let path = detail_path(kind, pk);
    let mut html = String::from(r#"<div class="record-actions">"#);
    if kind.is_controllable() {
        for action in ["pause", "play", "kill"] {
            html.push_str(&format!(
                r#"<form method="post" action="{path}/{action}"><button>{action}</button></form>"#
            ));
        }
    }
    html.push_str(&format!(
        r#"<a class="delete-link" href="{path}/delete">delete…</a>"#
    ));
    html.push_str("</div>");
    html
}

pub async fn detail_page(
    State(state): State<AppState>,
    kind: RecordKind,
    Path(pk): Path<i64>,
    Query(params): Query<NoticeParams>,
) -> Response {
    let snapshot = state.hub.snapshot();
    let banner = state.registry_banner.read().await.clone();
    let notice = params.text();
    let title = format!("{} {pk}", kind.title().trim_end_matches('s'));

    let record = match state.records.get(kind, pk).await {
        Ok(record) => record,
        Err(error) => {
            warn!(kind = %kind, pk, %error, "record fetch failed");
            let status = match &error {
                FlowdeckError::Api {
                    status: Some(404), ..
                } => StatusCode::NOT_FOUND,
                _ => StatusCode::OK,
            };
            let body = error_block(&error.to_string());
            return (
                status,
                Html(page_shell(
                    &title,
                    &snapshot,
                    banner.as_deref(),
                    notice.as_deref(),
                    &body,
                )),
            )
                .into_response();
        }
    };

    let record_value =
        serde_json::to_value(&record).unwrap_or_else(|_| serde_json::json!({ "pk": pk }));
    let mut body = String::new();

    // Generic field table, through the same host capability plugins use.
    let props = serde_json::json!({ "title": title.clone(), "record": record_value });
    match state.host.render(RECORD_DETAIL, &props).await {
        Ok(html) => body.push_str(&html),
        Err(error) => {
            warn!(kind = %kind, pk, %error, "record detail failed to render");
            body.push_str(&error_block(&error.to_string()));
        }
    }

    if let Some(section) = builtin_section(kind, &record) {
        body.push_str(&section);
    }

    // Plugin-contributed viewer for this node type, when one is registered.
    if let Some(node_type) = record.node_type()
        && let Some(viewer) = snapshot.tables.data_views.get(node_type)
    {
        body.push_str(&format!(
            r#"<section class="plugin-view" data-plugin="{}">"#,
            escape(viewer.plugin())
        ));
        match viewer
            .render(&serde_json::json!({ "data": record_value }))
            .await
        {
            Ok(html) => body.push_str(&html),
            Err(error) => {
                warn!(plugin = %viewer.plugin(), %error, "plugin viewer failed to render");
                body.push_str(&error_block(&format!(
                    "Plugin viewer '{}' failed: {error}",
                    viewer.plugin()
                )));
            }
        }
        body.push_str("</section>");
    }

    body.push_str(&edit_form(kind, pk, &record));
    body.push_str(&action_forms(kind, pk));

    Html(page_shell(
        &title,
        &snapshot,
        banner.as_deref(),
        notice.as_deref(),
        &body,
    ))
    .into_response()
}

/// Metadata edit form payload.
#[derive(Debug, Deserialize)]
pub struct EditForm {
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub description: String,
}

/// Save metadata edits as a changed-field diff.
///
/// Only fields that differ from the record's current values are sent; a
/// failed save leaves the record untouched and redirects with an error code
/// so the page reverts to the backend's values.
pub async fn edit_record(
    State(state): State<AppState>,
    kind: RecordKind,
    Path(pk): Path<i64>,
    Form(form): Form<EditForm>,
) -> Redirect {
    let path = detail_path(kind, pk);

    let current = match state.records.get(kind, pk).await {
        Ok(record) => record,
        Err(error) => {
            warn!(kind = %kind, pk, %error, "edit aborted; record fetch failed");
            return Redirect::to(&format!("{path}?error=save_failed"));
        }
    };

    let mut changed = serde_json::Map::new();
    if current.str_field("label").unwrap_or("") != form.label {
        changed.insert("label".to_string(), serde_json::json!(form.label));
    }
    if current.str_field("description").unwrap_or("") != form.description {
        changed.insert(
            "description".to_string(),
            serde_json::json!(form.description),
        );
    }

    if changed.is_empty() {
        return Redirect::to(&format!("{path}?notice=unchanged"));
    }

    match state.records.update(kind, pk, &changed).await {
        Ok(_) => Redirect::to(&format!("{path}?notice=saved")),
        Err(error) => {
            warn!(kind = %kind, pk, %error, "record update failed");
            Redirect::to(&format!("{path}?error=save_failed"))
        }
    }
}

/// Process control actions.
#[derive(Debug, Clone, Copy)]
pub enum ControlAction {
    Pause,
    Play,
    Kill,
}

pub async fn control(
    State(state): State<AppState>,
    kind: RecordKind,
    action: ControlAction,
    Path(pk): Path<i64>,
) -> Redirect {
    let path = detail_path(kind, pk);
    let (result, notice) = match action {
        ControlAction::Pause => (state.records.pause(kind, pk).await, "paused"),
        ControlAction::Play => (state.records.play(kind, pk).await, "resumed"),
        ControlAction::Kill => (state.records.kill(kind, pk).await, "killed"),
    };

    match result {
        Ok(_) => Redirect::to(&format!("{path}?notice={notice}")),
        Err(error) => {
            warn!(kind = %kind, pk, %error, "process control failed");
            Redirect::to(&format!("{path}?error=control_failed"))
        }
    }
}

/// Delete preview: a dry-run reporting the full dependent cascade.
pub async fn delete_preview(
    State(state): State<AppState>,
    kind: RecordKind,
    Path(pk): Path<i64>,
) -> Html<String> {
    let snapshot = state.hub.snapshot();
    let banner = state.registry_banner.read().await.clone();
    let path = detail_path(kind, pk);
    let title = format!("Delete {} {pk}", kind.title().trim_end_matches('s'));

    let body = match state.records.delete(kind, pk, true).await {
        Ok(report) => {
            let mut html = format!(
                "<p>Deleting this record removes <strong>{}</strong> dependent record(s):</p><ul>",
                report.deleted_nodes.len()
            );
            for node in &report.deleted_nodes {
                html.push_str(&format!("<li>{node}</li>"));
            }
            html.push_str("</ul>");
            html.push_str(&format!(
                r#"<form method="post" action="{path}/delete"><button>Delete permanently</button></form>
<a href="{path}">cancel</a>"#
            ));
            html
        }
        Err(error) => {
            warn!(kind = %kind, pk, %error, "delete dry-run failed");
            error_block(&format!("Could not compute the delete cascade: {error}"))
        }
    };

    Html(page_shell(
        &title,
        &snapshot,
        banner.as_deref(),
        None,
        &body,
    ))
}

/// Execute the delete after the operator confirmed the preview.
pub async fn delete_confirm(
    State(state): State<AppState>,
    kind: RecordKind,
    Path(pk): Path<i64>,
) -> Redirect {
    match state.records.delete(kind, pk, false).await {
        Ok(report) if report.deleted => {
            Redirect::to(&format!("/{}?notice=deleted", kind.segment()))
        }
        Ok(_) => Redirect::to(&format!(
            "{}?error=delete_failed",
            detail_path(kind, pk)
        )),
        Err(error) => {
            warn!(kind = %kind, pk, %error, "delete failed");
            Redirect::to(&format!(
                "{}?error=delete_failed",
                detail_path(kind, pk)
            ))
        }
    }
}
