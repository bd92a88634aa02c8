// SPDX-FileCopyrightText: 2026 Flowdeck Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scheduler monitor page and controls.
//!
//! The page renders the poller's last published panel; a failed poll shows a
//! staleness note over the last-good list instead of an empty page.

use axum::Form;
use axum::extract::{Query, State};
use axum::response::{Html, Redirect};
use flowdeck_records::StartScheduler;
use serde::Deserialize;
use tracing::warn;

use crate::components::{error_block, escape};
use crate::layout::page_shell;
use crate::pages::detail::NoticeParams;
use crate::server::AppState;

pub async fn scheduler_page(
    State(state): State<AppState>,
    Query(params): Query<NoticeParams>,
) -> Html<String> {
    let snapshot = state.hub.snapshot();
    let banner = state.registry_banner.read().await.clone();
    let panel = state.scheduler.borrow().clone();

    let mut body = String::new();
    if let Some(stale) = &panel.last_error {
        body.push_str(&error_block(&format!(
            "Scheduler status may be stale: {stale}"
        )));
    }

    if panel.schedulers.is_empty() {
        body.push_str("<p>No schedulers registered.</p>");
    } else {
        body.push_str(
            r#"<table class="scheduler-table"><thead><tr>
<th>name</th><th>running</th><th>waiting</th><th>processes</th><th>calcjobs</th><th>limits</th><th></th>
</tr></thead><tbody>"#,
        );
        for scheduler in &panel.schedulers {
            let toggle = if scheduler.running {
                format!(
                    r#"<form method="post" action="/scheduler/stop"><input type="hidden" name="name" value="{name}"><button>stop</button></form>"#,
                    name = escape(&scheduler.name)
                )
            } else {
                format!(
                    r#"<form method="post" action="/scheduler/start"><input type="hidden" name="name" value="{name}"><button>start</button></form>"#,
                    name = escape(&scheduler.name)
                )
            };
            body.push_str(&format!(
                "<tr><td>{name}</td><td>{running}</td><td>{waiting}</td><td>{processes}</td><td>{calcjobs}</td><td>{max_p}/{max_c}</td><td>{toggle}</td></tr>",
                name = escape(&scheduler.name),
                running = scheduler.running,
                waiting = scheduler.waiting_process_count,
                processes = scheduler.running_process_count,
                calcjobs = scheduler.running_calcjob_count,
                max_p = scheduler.max_processes,
                max_c = scheduler.max_calcjobs,
            ));
        }
        body.push_str("</tbody></table>");
    }

    Html(page_shell(
        "Scheduler",
        &snapshot,
        banner.as_deref(),
        params.text().as_deref(),
        &body,
    ))
}

/// Scheduler control form payload. Limit fields arrive as text so empty
/// inputs mean "leave unset".
#[derive(Debug, Deserialize)]
pub struct SchedulerForm {
    pub name: String,
    #[serde(default)]
    pub max_calcjobs: Option<String>,
    #[serde(default)]
    pub max_processes: Option<String>,
}

fn parse_limit(raw: &Option<String>) -> Option<u64> {
    raw.as_deref().and_then(|s| s.trim().parse().ok())
}

pub async fn start_scheduler(
    State(state): State<AppState>,
    Form(form): Form<SchedulerForm>,
) -> Redirect {
    let params = StartScheduler {
        name: form.name.clone(),
        max_calcjobs: parse_limit(&form.max_calcjobs),
        max_processes: parse_limit(&form.max_processes),
    };
    match state.records.start_scheduler(&params).await {
        Ok(_) => Redirect::to("/scheduler?notice=scheduler_started"),
        Err(error) => {
            warn!(scheduler = %form.name, %error, "scheduler start failed");
            Redirect::to("/scheduler?error=scheduler_failed")
        }
    }
}

pub async fn stop_scheduler(
    State(state): State<AppState>,
    Form(form): Form<SchedulerForm>,
) -> Redirect {
    match state.records.stop_scheduler(&form.name).await {
        Ok(_) => Redirect::to("/scheduler?notice=scheduler_stopped"),
        Err(error) => {
            warn!(scheduler = %form.name, %error, "scheduler stop failed");
            Redirect::to("/scheduler?error=scheduler_failed")
        }
    }
}
