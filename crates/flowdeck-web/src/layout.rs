// SPDX-FileCopyrightText: 2026 Flowdeck Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Page shell and sidebar rendering.
//!
//! The sidebar lists the built-in sections first, then every plugin
//! contribution from `side_bar_items` in map insertion order. Item keys are
//! the list identity, mirroring how the capability tables are keyed.

use flowdeck_core::RecordKind;
use flowdeck_plugin::PluginSnapshot;

use crate::components::escape;

/// A sidebar entry: label plus target path.
struct SidebarEntry {
    label: String,
    path: String,
}

fn builtin_entries() -> Vec<SidebarEntry> {
    let mut entries = vec![SidebarEntry {
        label: "Home".to_string(),
        path: "/".to_string(),
    }];
    for kind in RecordKind::all() {
        entries.push(SidebarEntry {
            label: kind.title().to_string(),
            path: format!("/{}", kind.segment()),
        });
    }
    entries.push(SidebarEntry {
        label: "Scheduler".to_string(),
        path: "/scheduler".to_string(),
    });
    entries
}

/// Render the sidebar navigation for the current plugin snapshot.
pub fn sidebar(snapshot: &PluginSnapshot) -> String {
    let mut html = String::from(r#"<nav class="sidebar"><ul>"#);
    for entry in builtin_entries() {
        html.push_str(&format!(
            r#"<li><a href="{}">{}</a></li>"#,
            escape(&entry.path),
            escape(&entry.label)
        ));
    }
    for (key, item) in snapshot.tables.side_bar_items.iter() {
        html.push_str(&format!(
            r#"<li data-plugin-item="{}"><a href="{}">{}</a></li>"#,
            escape(key),
            escape(&item.path),
            escape(&item.label)
        ));
    }
    html.push_str("</ul></nav>");
    html
}

/// Wrap a page body in the full document shell.
///
/// `banner` carries the persistent registry-failure indicator, `notice` the
/// per-action transient message.
pub fn page_shell(
    title: &str,
    snapshot: &PluginSnapshot,
    banner: Option<&str>,
    notice: Option<&str>,
    body: &str,
) -> String {
    let mut html = format!(
        r#"<!doctype html>
<html>
<head><meta charset="utf-8"><title>{title} – Flowdeck</title></head>
<body>
"#,
        title = escape(title)
    );
    if let Some(message) = banner {
        html.push_str(&format!(
            r#"<div class="banner banner-error">{}</div>
"#,
            escape(message)
        ));
    }
    if let Some(message) = notice {
        html.push_str(&format!(
            r#"<div class="notice">{}</div>
"#,
            escape(message)
        ));
    }
    html.push_str(&sidebar(snapshot));
    html.push_str(&format!(
        r#"
<main><h1>{}</h1>
{body}
</main>
</body>
</html>
"#,
        escape(title)
    ));
    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use flowdeck_core::FlowdeckError;
    use flowdeck_plugin::{
        ComponentSource, HubPhase, LoadedPlugin, PluginSnapshot, merge, parse_descriptor,
    };
    use std::sync::Arc;

    struct NullSource;

    #[async_trait]
    impl ComponentSource for NullSource {
        async fn render_component(
            &self,
            _component: &str,
            _props: &serde_json::Value,
        ) -> Result<String, FlowdeckError> {
            Ok(String::new())
        }
    }

    fn snapshot_with(descriptors: &[(&str, &str)]) -> PluginSnapshot {
        let loaded: Vec<LoadedPlugin> = descriptors
            .iter()
            .map(|(id, json)| LoadedPlugin {
                id: id.to_string(),
                descriptor: parse_descriptor(id, json).unwrap(),
                source: Arc::new(NullSource),
            })
            .collect();
        PluginSnapshot {
            phase: HubPhase::Ready,
            tables: Arc::new(merge(&loaded)),
        }
    }

    fn empty_snapshot() -> PluginSnapshot {
        snapshot_with(&[])
    }

    #[test]
    fn sidebar_lists_builtins_without_plugins() {
        let html = sidebar(&empty_snapshot());
        for expected in ["Home", "Processes", "Data Nodes", "Scheduler"] {
            assert!(html.contains(expected), "missing {expected}: {html}");
        }
        assert!(!html.contains("data-plugin-item"));
    }

    #[test]
    fn sidebar_appends_plugin_items_in_insertion_order() {
        let snapshot = snapshot_with(&[
            (
                "a",
                r#"{"sideBarItems": {
                    "zeta": {"path": "/z", "label": "Zeta"},
                    "alpha": {"path": "/a", "label": "Alpha"}
                }}"#,
            ),
            (
                "b",
                r#"{"sideBarItems": {"mid": {"path": "/m", "label": "Mid"}}}"#,
            ),
        ]);

        let html = sidebar(&snapshot);
        let zeta = html.find("Zeta").unwrap();
        let alpha = html.find("Alpha").unwrap();
        let mid = html.find("Mid").unwrap();
        assert!(zeta < alpha && alpha < mid, "plugin order must be insertion order");
    }

    #[test]
    fn page_shell_carries_banner_and_notice() {
        let html = page_shell(
            "Processes",
            &empty_snapshot(),
            Some("plugin registry unavailable"),
            Some("Paused process 42"),
            "<p>body</p>",
        );
        assert!(html.contains("banner-error"));
        assert!(html.contains("plugin registry unavailable"));
        assert!(html.contains("Paused process 42"));
        assert!(html.contains("<p>body</p>"));
    }

    #[test]
    fn page_shell_escapes_title() {
        let html = page_shell("<script>", &empty_snapshot(), None, None, "");
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }
}
