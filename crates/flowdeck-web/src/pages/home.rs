// SPDX-FileCopyrightText: 2026 Flowdeck Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Home page: built-in sections plus plugin home contributions.

use axum::extract::State;
use axum::response::Html;
use flowdeck_core::RecordKind;

use crate::components::escape;
use crate::layout::page_shell;
use crate::server::AppState;

pub async fn home_page(State(state): State<AppState>) -> Html<String> {
    let snapshot = state.hub.snapshot();
    let banner = state.registry_banner.read().await.clone();

    let mut body = String::from(r#"<ul class="home-grid">"#);
    for kind in RecordKind::all() {
        body.push_str(&format!(
            r#"<li><a href="/{}">{}</a></li>"#,
            kind.segment(),
            kind.title()
        ));
    }
    body.push_str(r#"<li><a href="/scheduler">Scheduler</a></li>"#);
    for (key, item) in snapshot.tables.home_items.iter() {
        body.push_str(&format!(
            r#"<li data-plugin-item="{}"><a href="{}">{}</a></li>"#,
            escape(key),
            escape(&item.path),
            escape(&item.label)
        ));
    }
    body.push_str("</ul>");
    body.push_str(
        r#"<form method="post" action="/plugins/refresh"><button>Reload plugins</button></form>"#,
    );

    Html(page_shell("Home", &snapshot, banner.as_deref(), None, &body))
}
