// SPDX-FileCopyrightText: 2026 Flowdeck Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Host-implemented UI building blocks.
//!
//! [`RecordTable`] and [`RecordDetail`] are the components exported to
//! plugins through the host capability set; the built-in pages render through
//! the exact same components, so plugins compose the same UI the host uses.

use async_trait::async_trait;
use flowdeck_core::FlowdeckError;
use flowdeck_plugin::Component;

/// Escape text for safe interpolation into HTML.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

/// Render a cell value: strings verbatim (escaped), other JSON compactly.
fn cell_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => escape(s),
        other => escape(&other.to_string()),
    }
}

/// An inline error notice used wherever a fragment fails to render.
pub fn error_block(message: &str) -> String {
    format!(r#"<div class="error-block">{}</div>"#, escape(message))
}

/// Generic sortable, paginated record table.
///
/// Props: `path` (base URL of the table page), `columns` (column names),
/// `rows` (record objects), `total`, `skip`, `limit`, `sort_field`,
/// `sort_order`. Row primary keys link to the record's detail page.
pub struct RecordTable;

#[async_trait]
impl Component for RecordTable {
    async fn render(&self, props: &serde_json::Value) -> Result<String, FlowdeckError> {
        let path = props.get("path").and_then(|v| v.as_str()).unwrap_or("");
        let columns: Vec<&str> = props
            .get("columns")
            .and_then(|v| v.as_array())
            .map(|cols| cols.iter().filter_map(|c| c.as_str()).collect())
            .unwrap_or_default();
        let rows = props
            .get("rows")
            .and_then(|v| v.as_array())
            .cloned()
            .unwrap_or_default();
        let total = props.get("total").and_then(|v| v.as_u64()).unwrap_or(0);
        let skip = props.get("skip").and_then(|v| v.as_u64()).unwrap_or(0);
        let limit = props.get("limit").and_then(|v| v.as_u64()).unwrap_or(15);
        let sort_field = props
            .get("sort_field")
            .and_then(|v| v.as_str())
            .unwrap_or("pk");
        let sort_order = props
            .get("sort_order")
            .and_then(|v| v.as_str())
            .unwrap_or("desc");

        if columns.is_empty() {
            return Err(FlowdeckError::Render {
                message: "record table props carry no columns".to_string(),
            });
        }

        let mut html = String::from(r#"<table class="record-table"><thead><tr>"#);
        for column in &columns {
            // Clicking a header sorts by it; clicking again flips direction.
            let next_order = if *column == sort_field && sort_order == "asc" {
                "desc"
            } else {
                "asc"
            };
            let marker = if *column == sort_field {
                if sort_order == "asc" { " ▲" } else { " ▼" }
            } else {
                ""
            };
            html.push_str(&format!(
                r#"<th><a href="{path}?sortField={col}&amp;sortOrder={next_order}">{label}{marker}</a></th>"#,
                col = escape(column),
                label = escape(column),
            ));
        }
        html.push_str("</tr></thead><tbody>");

        for row in &rows {
            html.push_str("<tr>");
            for column in &columns {
                let value = row.get(*column).cloned().unwrap_or(serde_json::Value::Null);
                if *column == "pk" {
                    let pk = cell_text(&value);
                    html.push_str(&format!(
                        r#"<td><a href="{path}/{pk}">{pk}</a></td>"#
                    ));
                } else {
                    html.push_str(&format!("<td>{}</td>", cell_text(&value)));
                }
            }
            html.push_str("</tr>");
        }
        html.push_str("</tbody></table>");

        // Pagination footer.
        let shown_from = if total == 0 { 0 } else { skip + 1 };
        let shown_to = (skip + limit).min(total);
        html.push_str(&format!(
            r#"<div class="pagination">rows {shown_from}–{shown_to} of {total}"#
        ));
        if skip > 0 {
            let prev = skip.saturating_sub(limit);
            html.push_str(&format!(
                r#" <a href="{path}?skip={prev}&amp;limit={limit}&amp;sortField={sort_field}&amp;sortOrder={sort_order}">prev</a>"#
            ));
        }
        if skip + limit < total {
            let next = skip + limit;
            html.push_str(&format!(
                r#" <a href="{path}?skip={next}&amp;limit={limit}&amp;sortField={sort_field}&amp;sortOrder={sort_order}">next</a>"#
            ));
        }
        html.push_str("</div>");

        Ok(html)
    }
}

/// Generic record detail shell: a field table over one record object.
///
/// Props: `title`, `record`. Renders one definition row per field.
pub struct RecordDetail;

#[async_trait]
impl Component for RecordDetail {
    async fn render(&self, props: &serde_json::Value) -> Result<String, FlowdeckError> {
        let record = props
            .get("record")
            .and_then(|v| v.as_object())
            .ok_or_else(|| FlowdeckError::Render {
                message: "record detail props carry no record object".to_string(),
            })?;
        let title = props.get("title").and_then(|v| v.as_str()).unwrap_or("Record");

        let mut html = format!(
            r#"<section class="record-detail"><h2>{}</h2><dl>"#,
            escape(title)
        );
        for (field, value) in record {
            html.push_str(&format!(
                "<dt>{}</dt><dd>{}</dd>",
                escape(field),
                cell_text(value)
            ));
        }
        html.push_str("</dl></section>");
        Ok(html)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_covers_html_metacharacters() {
        assert_eq!(
            escape(r#"<b>&"it's"</b>"#),
            "&lt;b&gt;&amp;&quot;it&#39;s&quot;&lt;/b&gt;"
        );
    }

    #[tokio::test]
    async fn record_table_renders_rows_and_links() {
        let props = serde_json::json!({
            "path": "/process",
            "columns": ["pk", "process_label", "process_state"],
            "rows": [
                {"pk": 42, "process_label": "Relax <fast>", "process_state": "Running"},
            ],
            "total": 1,
            "skip": 0,
            "limit": 15,
            "sort_field": "pk",
            "sort_order": "desc",
        });

        let html = RecordTable.render(&props).await.unwrap();
        assert!(html.contains(r#"<a href="/process/42">42</a>"#));
        assert!(html.contains("Relax &lt;fast&gt;"), "cells must be escaped");
        assert!(html.contains("rows 1–1 of 1"));
        assert!(!html.contains(">prev<"), "first page has no prev link");
    }

    #[tokio::test]
    async fn record_table_paginates_past_first_page() {
        let props = serde_json::json!({
            "path": "/datanode",
            "columns": ["pk"],
            "rows": [],
            "total": 100,
            "skip": 30,
            "limit": 15,
        });

        let html = RecordTable.render(&props).await.unwrap();
        assert!(html.contains("skip=15"), "prev link: {html}");
        assert!(html.contains("skip=45"), "next link: {html}");
    }

    #[tokio::test]
    async fn record_table_without_columns_is_a_render_error() {
        let err = RecordTable
            .render(&serde_json::json!({"rows": []}))
            .await
            .unwrap_err();
        assert!(matches!(err, FlowdeckError::Render { .. }));
    }

    #[tokio::test]
    async fn record_detail_lists_fields_in_order() {
        let props = serde_json::json!({
            "title": "Process 42",
            "record": {"pk": 42, "label": "relax", "description": "a & b"},
        });

        let html = RecordDetail.render(&props).await.unwrap();
        assert!(html.contains("<h2>Process 42</h2>"));
        assert!(html.contains("<dt>pk</dt><dd>42</dd>"));
        assert!(html.contains("a &amp; b"));
    }

    #[tokio::test]
    async fn record_detail_requires_a_record() {
        let err = RecordDetail
            .render(&serde_json::json!({"title": "x"}))
            .await
            .unwrap_err();
        assert!(matches!(err, FlowdeckError::Render { .. }));
    }
}
