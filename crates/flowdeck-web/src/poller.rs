// SPDX-FileCopyrightText: 2026 Flowdeck Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Background scheduler monitor.
//!
//! Polls the backend's scheduler list on a fixed interval and publishes the
//! latest panel through a watch channel. A failed poll keeps the last-good
//! scheduler list and records the error so the page can show a staleness
//! note instead of losing the view.

use std::sync::Arc;
use std::time::Duration;

use flowdeck_core::SchedulerStatus;
use flowdeck_records::RecordClient;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Last-known scheduler state published to the `/scheduler` page.
#[derive(Debug, Clone, Default)]
pub struct SchedulerPanel {
    pub schedulers: Vec<SchedulerStatus>,
    /// Error message of the most recent failed poll, if the panel is stale.
    pub last_error: Option<String>,
}

/// Periodic scheduler status poller.
pub struct SchedulerMonitor {
    client: Arc<RecordClient>,
    interval: Duration,
}

impl SchedulerMonitor {
    pub fn new(client: Arc<RecordClient>, interval: Duration) -> Self {
        Self { client, interval }
    }

    /// Spawn the polling task. The task runs for the application's lifetime;
    /// the returned receiver always holds the last published panel.
    pub fn spawn(self) -> (watch::Receiver<SchedulerPanel>, JoinHandle<()>) {
        let (tx, rx) = watch::channel(SchedulerPanel::default());

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                match self.client.list_schedulers().await {
                    Ok(schedulers) => {
                        debug!(count = schedulers.len(), "scheduler poll completed");
                        tx.send_replace(SchedulerPanel {
                            schedulers,
                            last_error: None,
                        });
                    }
                    Err(error) => {
                        warn!(%error, "scheduler poll failed; keeping last-good panel");
                        let previous = tx.borrow().schedulers.clone();
                        tx.send_replace(SchedulerPanel {
                            schedulers: previous,
                            last_error: Some(error.to_string()),
                        });
                    }
                }
            }
        });

        (rx, handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn scheduler_json(running: bool) -> serde_json::Value {
        serde_json::json!([{
            "name": "default",
            "pk": 1,
            "running": running,
            "waiting_process_count": 0,
            "running_process_count": 2,
            "running_calcjob_count": 1,
            "max_calcjobs": 10,
            "max_processes": 50
        }])
    }

    #[tokio::test]
    async fn poller_publishes_scheduler_list() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/scheduler/list"))
            .respond_with(ResponseTemplate::new(200).set_body_json(scheduler_json(true)))
            .mount(&server)
            .await;

        let client =
            Arc::new(RecordClient::new(&server.uri(), Duration::from_secs(5)).unwrap());
        let (mut rx, handle) =
            SchedulerMonitor::new(client, Duration::from_millis(20)).spawn();

        rx.changed().await.unwrap();
        let panel = rx.borrow().clone();
        assert_eq!(panel.schedulers.len(), 1);
        assert!(panel.schedulers[0].running);
        assert!(panel.last_error.is_none());

        handle.abort();
    }

    #[tokio::test]
    async fn failed_poll_keeps_last_good_list_and_flags_staleness() {
        let server = MockServer::start().await;
        // First poll succeeds, everything after fails.
        Mock::given(method("GET"))
            .and(path("/api/scheduler/list"))
            .respond_with(ResponseTemplate::new(200).set_body_json(scheduler_json(true)))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/scheduler/list"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client =
            Arc::new(RecordClient::new(&server.uri(), Duration::from_secs(5)).unwrap());
        let (mut rx, handle) =
            SchedulerMonitor::new(client, Duration::from_millis(20)).spawn();

        // First publication: healthy.
        rx.changed().await.unwrap();
        assert!(rx.borrow().last_error.is_none());

        // A later publication reports the failure but keeps the list.
        loop {
            rx.changed().await.unwrap();
            let panel = rx.borrow().clone();
            if panel.last_error.is_some() {
                assert_eq!(panel.schedulers.len(), 1, "last-good list must survive");
                break;
            }
        }

        handle.abort();
    }
}
