// SPDX-FileCopyrightText: 2026 Flowdeck Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the record and scheduler API.
//!
//! The backend is an external collaborator consumed only through its HTTP
//! contract: per-kind table data with server-side pagination/sort/filter,
//! field-level partial update, process control, cascade-aware delete with a
//! dry-run mode, and scheduler status/control. Any non-2xx response becomes
//! [`FlowdeckError::Api`]; callers surface it per-action and keep the view in
//! its last-good state.

use std::time::Duration;

use flowdeck_core::{
    ControlReply, DeleteReport, FlowdeckError, Page, RecordKind, RecordRow, SchedulerStatus,
    UpdateReply,
};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::query::ListQuery;

/// Error body shape used by the backend (`{"detail": "..."}`).
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    detail: String,
}

/// Parameters for starting a scheduler.
#[derive(Debug, Clone, serde::Serialize)]
pub struct StartScheduler {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_calcjobs: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_processes: Option<u64>,
}

/// Client for the workflow engine's record API.
#[derive(Debug, Clone)]
pub struct RecordClient {
    http: reqwest::Client,
    base_url: String,
}

impl RecordClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, FlowdeckError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FlowdeckError::Api {
                message: format!("failed to build HTTP client: {e}"),
                status: None,
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// One page of a record table, paginated/sorted/filtered server-side.
    pub async fn list(
        &self,
        kind: RecordKind,
        query: &ListQuery,
    ) -> Result<Page<RecordRow>, FlowdeckError> {
        let url = format!("{}/api/{}-data", self.base_url, kind.segment());
        let request = self.http.get(&url).query(&query.to_pairs());
        let page: Page<RecordRow> = self.send(request, &url).await?;
        debug!(kind = %kind, total = page.total, rows = page.data.len(), "listed records");
        Ok(page)
    }

    /// A single record by primary key.
    pub async fn get(&self, kind: RecordKind, pk: i64) -> Result<RecordRow, FlowdeckError> {
        let url = format!("{}/api/{}/{pk}", self.base_url, kind.segment());
        self.send(self.http.get(&url), &url).await
    }

    /// Field-level partial update: only the changed fields are sent.
    pub async fn update(
        &self,
        kind: RecordKind,
        pk: i64,
        fields: &serde_json::Map<String, serde_json::Value>,
    ) -> Result<UpdateReply, FlowdeckError> {
        let url = format!("{}/api/{}-data/{pk}", self.base_url, kind.segment());
        self.send(self.http.put(&url).json(fields), &url).await
    }

    /// Pause a running process.
    pub async fn pause(&self, kind: RecordKind, pk: i64) -> Result<ControlReply, FlowdeckError> {
        self.control(kind, "pause", pk).await
    }

    /// Resume a paused process.
    pub async fn play(&self, kind: RecordKind, pk: i64) -> Result<ControlReply, FlowdeckError> {
        self.control(kind, "play", pk).await
    }

    /// Kill a running process.
    pub async fn kill(&self, kind: RecordKind, pk: i64) -> Result<ControlReply, FlowdeckError> {
        self.control(kind, "kill", pk).await
    }

    async fn control(
        &self,
        kind: RecordKind,
        action: &str,
        pk: i64,
    ) -> Result<ControlReply, FlowdeckError> {
        let url = format!("{}/api/{}/{action}/{pk}", self.base_url, kind.segment());
        self.send(self.http.post(&url), &url).await
    }

    /// Delete a record. With `dry_run` the backend reports the full cascade
    /// of dependent records without removing anything.
    pub async fn delete(
        &self,
        kind: RecordKind,
        pk: i64,
        dry_run: bool,
    ) -> Result<DeleteReport, FlowdeckError> {
        let url = format!("{}/api/{}/delete/{pk}", self.base_url, kind.segment());
        let request = self
            .http
            .delete(&url)
            .query(&[("dry_run", dry_run.to_string())]);
        self.send(request, &url).await
    }

    /// All schedulers with their status counters.
    pub async fn list_schedulers(&self) -> Result<Vec<SchedulerStatus>, FlowdeckError> {
        let url = format!("{}/api/scheduler/list", self.base_url);
        self.send(self.http.get(&url), &url).await
    }

    /// Status details for one scheduler.
    pub async fn scheduler_status(&self, name: &str) -> Result<SchedulerStatus, FlowdeckError> {
        let url = format!("{}/api/scheduler/status/{name}", self.base_url);
        self.send(self.http.get(&url), &url).await
    }

    /// Start a scheduler daemon.
    pub async fn start_scheduler(
        &self,
        params: &StartScheduler,
    ) -> Result<SchedulerStatus, FlowdeckError> {
        let url = format!("{}/api/scheduler/start", self.base_url);
        self.send(self.http.post(&url).json(params), &url).await
    }

    /// Stop a scheduler daemon.
    pub async fn stop_scheduler(&self, name: &str) -> Result<SchedulerStatus, FlowdeckError> {
        let url = format!("{}/api/scheduler/stop", self.base_url);
        self.send(
            self.http.post(&url).json(&serde_json::json!({"name": name})),
            &url,
        )
        .await
    }

    /// Send a request and decode the JSON reply, mapping failures to
    /// [`FlowdeckError::Api`].
    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        url: &str,
    ) -> Result<T, FlowdeckError> {
        let response = request.send().await.map_err(|e| FlowdeckError::Api {
            message: format!("request to {url} failed: {e}"),
            status: None,
            source: Some(Box::new(e)),
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = match serde_json::from_str::<ApiErrorBody>(&body) {
                Ok(err) => format!("{url} returned {status}: {}", err.detail),
                Err(_) => format!("{url} returned {status}: {body}"),
            };
            return Err(FlowdeckError::Api {
                message,
                status: Some(status.as_u16()),
                source: None,
            });
        }

        let body = response.text().await.map_err(|e| FlowdeckError::Api {
            message: format!("failed to read response body from {url}: {e}"),
            status: Some(status.as_u16()),
            source: Some(Box::new(e)),
        })?;
        serde_json::from_str(&body).map_err(|e| FlowdeckError::Api {
            message: format!("invalid response payload from {url}: {e}"),
            status: Some(status.as_u16()),
            source: Some(Box::new(e)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::SortOrder;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(base_url: &str) -> RecordClient {
        RecordClient::new(base_url, Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn list_sends_pagination_sort_and_filter() {
        let server = MockServer::start().await;
        let body = serde_json::json!({
            "total": 120,
            "data": [
                {"pk": 99, "process_label": "Relax", "process_state": "Running"},
                {"pk": 98, "process_label": "Bands", "process_state": "Finished"}
            ]
        });
        Mock::given(method("GET"))
            .and(path("/api/process-data"))
            .and(query_param("skip", "30"))
            .and(query_param("limit", "15"))
            .and(query_param("sortField", "ctime"))
            .and(query_param("sortOrder", "asc"))
            .and(query_param("filterModel", r#"{"items":[]}"#))
            .respond_with(ResponseTemplate::new(200).set_body_json(&body))
            .mount(&server)
            .await;

        let query = ListQuery {
            skip: 30,
            limit: 15,
            sort_field: "ctime".into(),
            sort_order: SortOrder::Asc,
            filter: Some(serde_json::json!({"items": []})),
        };
        let page = client(&server.uri())
            .list(RecordKind::Process, &query)
            .await
            .unwrap();

        assert_eq!(page.total, 120);
        assert_eq!(page.data.len(), 2);
        assert_eq!(page.data[0].pk, 99);
        assert_eq!(page.data[0].str_field("process_label"), Some("Relax"));
    }

    #[tokio::test]
    async fn update_sends_only_changed_fields() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/api/datanode-data/7"))
            .and(body_json(serde_json::json!({"label": "new label"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "updated": true,
                "pk": 7
            })))
            .mount(&server)
            .await;

        let mut fields = serde_json::Map::new();
        fields.insert("label".into(), serde_json::json!("new label"));
        let reply = client(&server.uri())
            .update(RecordKind::DataNode, 7, &fields)
            .await
            .unwrap();

        assert!(reply.updated);
        assert_eq!(reply.pk, 7);
    }

    #[tokio::test]
    async fn pause_posts_to_control_route() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/process/pause/42"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "message": "Paused process 42"
            })))
            .mount(&server)
            .await;

        let reply = client(&server.uri())
            .pause(RecordKind::Process, 42)
            .await
            .unwrap();
        assert!(reply.message.contains("Paused"));
    }

    #[tokio::test]
    async fn delete_dry_run_reports_cascade_without_deleting() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/groupnode/delete/5"))
            .and(query_param("dry_run", "true"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "deleted": false,
                "message": "Did not delete groupnode 5 [dry-run]",
                "deleted_nodes": [5, 17, 23]
            })))
            .mount(&server)
            .await;

        let report = client(&server.uri())
            .delete(RecordKind::GroupNode, 5, true)
            .await
            .unwrap();

        assert!(!report.deleted);
        assert_eq!(report.deleted_nodes, vec![5, 17, 23]);
    }

    #[tokio::test]
    async fn scheduler_list_decodes_status_counters() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/scheduler/list"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([{
                "name": "default",
                "pk": 1,
                "running": true,
                "waiting_process_count": 2,
                "running_process_count": 5,
                "running_calcjob_count": 3,
                "max_calcjobs": 10,
                "max_processes": 50
            }])))
            .mount(&server)
            .await;

        let schedulers = client(&server.uri()).list_schedulers().await.unwrap();
        assert_eq!(schedulers.len(), 1);
        assert_eq!(schedulers[0].name, "default");
        assert!(schedulers[0].running);
        assert_eq!(schedulers[0].running_calcjob_count, 3);
    }

    #[tokio::test]
    async fn start_scheduler_omits_unset_limits() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/scheduler/start"))
            .and(body_json(serde_json::json!({"name": "default", "max_calcjobs": 10})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "name": "default",
                "pk": 1,
                "running": true,
                "waiting_process_count": 0,
                "running_process_count": 0,
                "running_calcjob_count": 0,
                "max_calcjobs": 10,
                "max_processes": 50
            })))
            .mount(&server)
            .await;

        let status = client(&server.uri())
            .start_scheduler(&StartScheduler {
                name: "default".into(),
                max_calcjobs: Some(10),
                max_processes: None,
            })
            .await
            .unwrap();
        assert!(status.running);
    }

    #[tokio::test]
    async fn backend_detail_message_is_surfaced() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/process/404"))
            .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
                "detail": "Process 404 not found"
            })))
            .mount(&server)
            .await;

        let err = client(&server.uri())
            .get(RecordKind::Process, 404)
            .await
            .unwrap_err();
        match err {
            FlowdeckError::Api { message, status, .. } => {
                assert_eq!(status, Some(404));
                assert!(message.contains("Process 404 not found"), "got: {message}");
            }
            other => panic!("expected Api, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn connection_failure_is_api_error_without_status() {
        // Port 1 is essentially guaranteed closed.
        let err = client("http://127.0.0.1:1")
            .list(RecordKind::Process, &ListQuery::default())
            .await
            .unwrap_err();
        match err {
            FlowdeckError::Api { status, .. } => assert_eq!(status, None),
            other => panic!("expected Api, got {other:?}"),
        }
    }
}
