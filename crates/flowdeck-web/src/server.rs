// SPDX-FileCopyrightText: 2026 Flowdeck Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Dashboard HTTP server built on axum.
//!
//! Built-in pages are registered as static routes. Plugin-contributed routes
//! are resolved by the fallback handler against the hub's *current* snapshot
//! on every request, so a republished capability table takes effect
//! immediately and an empty table simply means the fallback 404s.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{StatusCode, Uri};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use flowdeck_core::{FlowdeckError, RecordKind};
use flowdeck_plugin::{HostCapabilities, PluginHub, RegistryClient};
use flowdeck_records::RecordClient;
use tokio::sync::{RwLock, watch};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::components::error_block;
use crate::layout::page_shell;
use crate::pages;
use crate::pages::detail::ControlAction;
use crate::poller::SchedulerPanel;

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Plugin context provider; single writer of the capability tables.
    pub hub: Arc<PluginHub>,
    /// Fixed host capability set, also used by the built-in pages.
    pub host: Arc<HostCapabilities>,
    /// Record/scheduler API client.
    pub records: Arc<RecordClient>,
    /// Plugin discovery client, for operator-triggered refresh.
    pub registry: Arc<RegistryClient>,
    /// Last published scheduler panel.
    pub scheduler: watch::Receiver<SchedulerPanel>,
    /// Persistent registry-failure indicator, cleared on a successful refresh.
    pub registry_banner: Arc<RwLock<Option<String>>>,
}

/// Dashboard server configuration (mirrors ServerConfig from flowdeck-config).
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Assemble the application router.
pub fn build_router(state: AppState) -> Router {
    let mut router = Router::new()
        .route("/", get(pages::home::home_page))
        .route("/health", get(get_health))
        .route("/scheduler", get(pages::scheduler::scheduler_page))
        .route("/scheduler/start", post(pages::scheduler::start_scheduler))
        .route("/scheduler/stop", post(pages::scheduler::stop_scheduler))
        .route("/plugins/refresh", post(refresh_plugins));

    for kind in RecordKind::all() {
        router = router.merge(record_routes(kind));
    }

    router
        .fallback(plugin_route_fallback)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Routes for one record kind: table page, detail page, and actions.
fn record_routes(kind: RecordKind) -> Router<AppState> {
    let base = format!("/{}", kind.segment());
    Router::new()
        .route(
            &base,
            get(
                move |state: State<AppState>,
                      query: axum::extract::Query<pages::records::TableParams>| {
                    pages::records::table_page(state, kind, query)
                },
            ),
        )
        .route(
            &format!("{base}/{{pk}}"),
            get(
                move |state: State<AppState>,
                      path: axum::extract::Path<i64>,
                      query: axum::extract::Query<pages::detail::NoticeParams>| {
                    pages::detail::detail_page(state, kind, path, query)
                },
            ),
        )
        .route(
            &format!("{base}/{{pk}}/edit"),
            post(
                move |state: State<AppState>,
                      path: axum::extract::Path<i64>,
                      form: axum::Form<pages::detail::EditForm>| {
                    pages::detail::edit_record(state, kind, path, form)
                },
            ),
        )
        .route(
            &format!("{base}/{{pk}}/pause"),
            post(
                move |state: State<AppState>, path: axum::extract::Path<i64>| {
                    pages::detail::control(state, kind, ControlAction::Pause, path)
                },
            ),
        )
        .route(
            &format!("{base}/{{pk}}/play"),
            post(
                move |state: State<AppState>, path: axum::extract::Path<i64>| {
                    pages::detail::control(state, kind, ControlAction::Play, path)
                },
            ),
        )
        .route(
            &format!("{base}/{{pk}}/kill"),
            post(
                move |state: State<AppState>, path: axum::extract::Path<i64>| {
                    pages::detail::control(state, kind, ControlAction::Kill, path)
                },
            ),
        )
        .route(
            &format!("{base}/{{pk}}/delete"),
            get(
                move |state: State<AppState>, path: axum::extract::Path<i64>| {
                    pages::detail::delete_preview(state, kind, path)
                },
            )
            .post(
                move |state: State<AppState>, path: axum::extract::Path<i64>| {
                    pages::detail::delete_confirm(state, kind, path)
                },
            ),
        )
}

/// Resolve unmatched paths against the current plugin route table.
async fn plugin_route_fallback(State(state): State<AppState>, uri: Uri) -> Response {
    let snapshot = state.hub.snapshot();
    let banner = state.registry_banner.read().await.clone();
    let path = uri.path().to_string();

    let Some(component) = snapshot.tables.routes.get(&path) else {
        let body = "<p>Sorry, that page doesn't exist.</p>";
        return (
            StatusCode::NOT_FOUND,
            Html(page_shell(
                "Not found",
                &snapshot,
                banner.as_deref(),
                None,
                body,
            )),
        )
            .into_response();
    };

    // The host capability set travels with the render context; the guest
    // composes host components through its host_render import.
    let props = serde_json::json!({
        "path": path,
        "host": state.host.names(),
    });
    match component.render(&props).await {
        Ok(body) => Html(page_shell(
            component.plugin(),
            &snapshot,
            banner.as_deref(),
            None,
            &body,
        ))
        .into_response(),
        Err(error) => {
            warn!(plugin = %component.plugin(), route = %path, %error, "plugin route failed to render");
            let body = error_block(&format!(
                "Plugin '{}' failed to render this page: {error}",
                component.plugin()
            ));
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Html(page_shell(
                    "Plugin error",
                    &snapshot,
                    banner.as_deref(),
                    None,
                    &body,
                )),
            )
                .into_response()
        }
    }
}

/// Re-fetch the plugin identifier list and reload.
async fn refresh_plugins(State(state): State<AppState>) -> Redirect {
    match state.hub.refresh_from_registry(&state.registry).await {
        Ok(count) => {
            *state.registry_banner.write().await = None;
            info!(count, "plugin registry refreshed");
        }
        Err(error) => {
            *state.registry_banner.write().await =
                Some(format!("Plugin registry unavailable: {error}"));
        }
    }
    Redirect::to("/")
}

async fn get_health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Start the dashboard HTTP server.
pub async fn start_server(config: &ServerConfig, state: AppState) -> Result<(), FlowdeckError> {
    let app = build_router(state);
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| FlowdeckError::Internal(format!("failed to bind dashboard to {addr}: {e}")))?;

    info!("dashboard listening on {addr}");

    axum::serve(listener, app)
        .await
        .map_err(|e| FlowdeckError::Internal(format!("dashboard server error: {e}")))
}
