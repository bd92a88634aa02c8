// SPDX-FileCopyrightText: 2026 Flowdeck Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The plugin hub: reload lifecycle and snapshot publication.
//!
//! The hub is the single writer of the merged capability tables. Consumers
//! subscribe through a `tokio::sync::watch` channel and always see the last
//! fully-published snapshot; tables are replaced wholesale, never patched.
//!
//! A reload cycle loads each identifier **sequentially in source order** --
//! last-writer-wins merging is only deterministic with a fixed input order.
//! Starting a new cycle bumps a generation counter; an in-flight cycle checks
//! it before publishing, so a superseded cycle's result is discarded instead
//! of clobbering newer tables.

use std::sync::Arc;

use flowdeck_core::FlowdeckError;
use tokio::sync::{Mutex, watch};
use tracing::{debug, info, warn};

use crate::loader::PluginLoader;
use crate::merge::merge;
use crate::registry::RegistryClient;
use crate::tables::CapabilityTables;

/// Lifecycle phase of the hub.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HubPhase {
    /// No plugin identifiers known; tables are empty.
    Empty,
    /// A reload cycle is in progress; tables are the previous publish.
    Loading,
    /// Tables reflect the most recent completed cycle.
    Ready,
}

/// One published state of the plugin subsystem.
#[derive(Clone)]
pub struct PluginSnapshot {
    pub phase: HubPhase,
    pub tables: Arc<CapabilityTables>,
}

impl PluginSnapshot {
    fn empty() -> Self {
        Self {
            phase: HubPhase::Empty,
            tables: Arc::new(CapabilityTables::default()),
        }
    }
}

/// Owns the merged capability tables for the application's lifetime.
pub struct PluginHub {
    loader: Arc<dyn PluginLoader>,
    generation: Mutex<u64>,
    tx: watch::Sender<PluginSnapshot>,
}

impl PluginHub {
    pub fn new(loader: Arc<dyn PluginLoader>) -> Self {
        let (tx, _rx) = watch::channel(PluginSnapshot::empty());
        Self {
            loader,
            generation: Mutex::new(0),
            tx,
        }
    }

    /// Subscribe to snapshot publications.
    pub fn subscribe(&self) -> watch::Receiver<PluginSnapshot> {
        self.tx.subscribe()
    }

    /// The current snapshot.
    pub fn snapshot(&self) -> PluginSnapshot {
        self.tx.borrow().clone()
    }

    /// Replace the plugin identifier set and run a reload cycle.
    ///
    /// Loads run sequentially in `ids` order; a failed load is logged and
    /// contributes nothing. The merged tables are published only if no newer
    /// cycle started in the meantime.
    pub async fn set_plugins(&self, ids: &[String]) {
        let generation = self.begin_cycle().await;

        if ids.is_empty() {
            if self
                .publish_if_current(generation, PluginSnapshot::empty())
                .await
            {
                info!("plugin set is empty; published empty capability tables");
            }
            return;
        }

        // Keep the previous tables visible while the reload runs.
        let previous = self.tx.borrow().tables.clone();
        self.publish_if_current(
            generation,
            PluginSnapshot {
                phase: HubPhase::Loading,
                tables: previous,
            },
        )
        .await;

        let mut loaded = Vec::with_capacity(ids.len());
        for id in ids {
            if !self.is_current(generation).await {
                debug!(generation, "reload cycle superseded mid-flight; abandoning");
                return;
            }
            match self.loader.load(id).await {
                Ok(plugin) => {
                    debug!(plugin = %id, "plugin loaded");
                    loaded.push(plugin);
                }
                Err(error) => {
                    warn!(plugin = %id, %error, "plugin failed to load; it contributes nothing");
                }
            }
        }

        let tables = merge(&loaded);
        let published = self
            .publish_if_current(
                generation,
                PluginSnapshot {
                    phase: HubPhase::Ready,
                    tables: Arc::new(tables),
                },
            )
            .await;

        if published {
            info!(
                loaded = loaded.len(),
                requested = ids.len(),
                "capability tables published"
            );
        } else {
            debug!(generation, "discarding superseded reload result");
        }
    }

    /// Fetch the identifier list from the registry and reload.
    ///
    /// A registry failure degrades to the empty plugin set (published
    /// immediately) and the error is returned for the operator banner.
    pub async fn refresh_from_registry(
        &self,
        registry: &RegistryClient,
    ) -> Result<usize, FlowdeckError> {
        match registry.list_plugins().await {
            Ok(ids) => {
                let count = ids.len();
                self.set_plugins(&ids).await;
                Ok(count)
            }
            Err(error) => {
                warn!(%error, "plugin registry unavailable; degrading to zero plugins");
                self.set_plugins(&[]).await;
                Err(error)
            }
        }
    }

    async fn begin_cycle(&self) -> u64 {
        let mut generation = self.generation.lock().await;
        *generation += 1;
        *generation
    }

    async fn is_current(&self, generation: u64) -> bool {
        *self.generation.lock().await == generation
    }

    /// Publish atomically with the generation check, so a newer cycle cannot
    /// start between check and send.
    async fn publish_if_current(&self, generation: u64, snapshot: PluginSnapshot) -> bool {
        let current = self.generation.lock().await;
        if *current == generation {
            self.tx.send_replace(snapshot);
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::parse_descriptor;
    use crate::merge::LoadedPlugin;
    use crate::tables::ComponentSource;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use tokio::sync::Notify;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct NullSource;

    #[async_trait]
    impl ComponentSource for NullSource {
        async fn render_component(
            &self,
            component: &str,
            _props: &serde_json::Value,
        ) -> Result<String, FlowdeckError> {
            Ok(format!("<{component}/>"))
        }
    }

    /// Fake loader returning canned descriptors, with per-identifier failure
    /// injection and an optional gate that parks a specific load until
    /// notified.
    #[derive(Default)]
    struct FakeLoader {
        descriptors: HashMap<String, String>,
        failing: Vec<String>,
        gate: Option<(String, Arc<Notify>)>,
    }

    impl FakeLoader {
        fn with_plugin(mut self, id: &str, descriptor_json: &str) -> Self {
            self.descriptors
                .insert(id.to_string(), descriptor_json.to_string());
            self
        }

        fn with_failing(mut self, id: &str) -> Self {
            self.failing.push(id.to_string());
            self
        }

        fn gated(mut self, id: &str, gate: Arc<Notify>) -> Self {
            self.gate = Some((id.to_string(), gate));
            self
        }
    }

    #[async_trait]
    impl PluginLoader for FakeLoader {
        async fn load(&self, id: &str) -> Result<LoadedPlugin, FlowdeckError> {
            if let Some((gated_id, gate)) = &self.gate
                && gated_id == id
            {
                gate.notified().await;
            }
            if self.failing.iter().any(|f| f == id) {
                return Err(FlowdeckError::PluginLoad {
                    plugin: id.to_string(),
                    message: "injected failure".to_string(),
                    source: None,
                });
            }
            let json = self.descriptors.get(id).ok_or_else(|| {
                FlowdeckError::PluginLoad {
                    plugin: id.to_string(),
                    message: "unknown plugin".to_string(),
                    source: None,
                }
            })?;
            Ok(LoadedPlugin {
                id: id.to_string(),
                descriptor: parse_descriptor(id, json)?,
                source: Arc::new(NullSource),
            })
        }
    }

    fn ids(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn starts_empty() {
        let hub = PluginHub::new(Arc::new(FakeLoader::default()));
        let snapshot = hub.snapshot();
        assert_eq!(snapshot.phase, HubPhase::Empty);
        assert!(snapshot.tables.is_empty());
    }

    #[tokio::test]
    async fn empty_set_publishes_empty_tables() {
        let loader = FakeLoader::default().with_plugin("a", r#"{"routes":{"/a":"A"}}"#);
        let hub = PluginHub::new(Arc::new(loader));

        hub.set_plugins(&ids(&["a"])).await;
        assert_eq!(hub.snapshot().phase, HubPhase::Ready);
        assert!(!hub.snapshot().tables.is_empty());

        hub.set_plugins(&[]).await;
        let snapshot = hub.snapshot();
        assert_eq!(snapshot.phase, HubPhase::Empty);
        assert!(snapshot.tables.is_empty());
    }

    #[tokio::test]
    async fn successful_cycle_merges_in_source_order() {
        let loader = FakeLoader::default()
            .with_plugin("a", r#"{"dataView":{"X":"ViewA"}}"#)
            .with_plugin("b", r#"{"dataView":{"X":"ViewB","Y":"ViewB2"}}"#);
        let hub = PluginHub::new(Arc::new(loader));

        hub.set_plugins(&ids(&["a", "b"])).await;

        let snapshot = hub.snapshot();
        assert_eq!(snapshot.phase, HubPhase::Ready);
        let x = snapshot.tables.data_views.get("X").unwrap();
        assert_eq!(x.plugin(), "b");
        assert!(snapshot.tables.data_views.contains_key("Y"));
    }

    #[tokio::test]
    async fn failing_plugin_is_isolated() {
        // ["a","c"] where "c" fails: tables equal merge over ["a"] alone.
        let loader = FakeLoader::default()
            .with_plugin("a", r#"{"routes":{"/a":"A"}}"#)
            .with_failing("c");
        let hub = PluginHub::new(Arc::new(loader));

        hub.set_plugins(&ids(&["a", "c"])).await;

        let snapshot = hub.snapshot();
        assert_eq!(snapshot.phase, HubPhase::Ready);
        assert_eq!(snapshot.tables.routes.len(), 1);
        assert_eq!(snapshot.tables.routes.get("/a").unwrap().plugin(), "a");
    }

    #[tokio::test]
    async fn malformed_plugin_is_isolated_like_load_failure() {
        let loader = FakeLoader::default()
            .with_plugin("good", r#"{"routes":{"/g":"G"}}"#)
            .with_plugin("bad", r#"["not an object"]"#);
        let hub = PluginHub::new(Arc::new(loader));

        hub.set_plugins(&ids(&["bad", "good"])).await;

        let snapshot = hub.snapshot();
        assert_eq!(snapshot.tables.routes.len(), 1);
        assert!(snapshot.tables.routes.contains_key("/g"));
    }

    #[tokio::test]
    async fn superseded_cycle_never_publishes() {
        let gate = Arc::new(Notify::new());
        let loader = FakeLoader::default()
            .with_plugin("slow", r#"{"routes":{"/old":"Old"}}"#)
            .with_plugin("b", r#"{"routes":{"/new":"New"}}"#)
            .gated("slow", gate.clone());
        let hub = Arc::new(PluginHub::new(Arc::new(loader)));

        // Cycle 1 parks on the gated load.
        let first = {
            let hub = hub.clone();
            tokio::spawn(async move { hub.set_plugins(&ids(&["slow"])).await })
        };

        // Wait until cycle 1 has published its Loading state.
        let mut rx = hub.subscribe();
        while rx.borrow().phase != HubPhase::Loading {
            rx.changed().await.unwrap();
        }

        // Cycle 2 supersedes and completes.
        hub.set_plugins(&ids(&["b"])).await;
        assert_eq!(hub.snapshot().phase, HubPhase::Ready);

        // Release cycle 1; its result must be discarded.
        gate.notify_waiters();
        first.await.unwrap();

        let snapshot = hub.snapshot();
        assert_eq!(snapshot.phase, HubPhase::Ready);
        assert!(snapshot.tables.routes.contains_key("/new"));
        assert!(!snapshot.tables.routes.contains_key("/old"));
    }

    #[tokio::test]
    async fn reload_replaces_previous_tables_wholesale() {
        let loader = FakeLoader::default()
            .with_plugin("a", r#"{"routes":{"/a":"A"}}"#)
            .with_plugin("b", r#"{"routes":{"/b":"B"}}"#);
        let hub = PluginHub::new(Arc::new(loader));

        hub.set_plugins(&ids(&["a"])).await;
        assert!(hub.snapshot().tables.routes.contains_key("/a"));

        hub.set_plugins(&ids(&["b"])).await;
        let snapshot = hub.snapshot();
        assert!(snapshot.tables.routes.contains_key("/b"));
        assert!(
            !snapshot.tables.routes.contains_key("/a"),
            "old cycle's routes must not leak into the new tables"
        );
    }

    #[tokio::test]
    async fn subscribers_observe_publication() {
        let loader = FakeLoader::default().with_plugin("a", r#"{"routes":{"/a":"A"}}"#);
        let hub = PluginHub::new(Arc::new(loader));
        let mut rx = hub.subscribe();

        hub.set_plugins(&ids(&["a"])).await;

        // At least one change was published; the final state is Ready.
        rx.changed().await.unwrap();
        let snapshot = hub.snapshot();
        assert_eq!(snapshot.phase, HubPhase::Ready);
        assert_eq!(snapshot.tables.routes.len(), 1);
    }

    #[tokio::test]
    async fn registry_failure_degrades_to_zero_plugins() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/plugins"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        let registry =
            RegistryClient::new(&server.uri(), std::time::Duration::from_secs(5)).unwrap();

        let loader = FakeLoader::default().with_plugin("a", r#"{"routes":{"/a":"A"}}"#);
        let hub = PluginHub::new(Arc::new(loader));
        hub.set_plugins(&ids(&["a"])).await;

        let err = hub.refresh_from_registry(&registry).await.unwrap_err();
        assert!(matches!(err, FlowdeckError::RegistryFetch { .. }));

        let snapshot = hub.snapshot();
        assert_eq!(snapshot.phase, HubPhase::Empty);
        assert!(snapshot.tables.is_empty());
    }

    #[tokio::test]
    async fn registry_success_feeds_identifier_order() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/plugins"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "plugins": ["a", "b"]
            })))
            .mount(&server)
            .await;
        let registry =
            RegistryClient::new(&server.uri(), std::time::Duration::from_secs(5)).unwrap();

        let loader = FakeLoader::default()
            .with_plugin("a", r#"{"routes":{"/x":"FromA"}}"#)
            .with_plugin("b", r#"{"routes":{"/x":"FromB"}}"#);
        let hub = PluginHub::new(Arc::new(loader));

        let count = hub.refresh_from_registry(&registry).await.unwrap();
        assert_eq!(count, 2);
        assert_eq!(
            hub.snapshot().tables.routes.get("/x").unwrap().plugin(),
            "b",
            "later identifier in registry order wins"
        );
    }
}
