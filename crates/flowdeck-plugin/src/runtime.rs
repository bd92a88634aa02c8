// SPDX-FileCopyrightText: 2026 Flowdeck Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! WebAssembly plugin runtime using wasmtime.
//!
//! Each guest invocation (the one-time `describe` call at load, every `render`
//! call afterwards) creates a fresh [`wasmtime::Store`] with per-invocation
//! fuel and epoch controls, so a runaway plugin traps instead of hanging the
//! dashboard. The [`Engine`] and compiled [`Module`] are shared across
//! invocations; compilation happens once at load time.
//!
//! Guest ABI (import namespace `flowdeck`):
//! - `get_input_len() -> i32` / `get_input(ptr)` -- read the invocation input
//!   JSON (`{"component", "data", "host"}` for renders, `{}` for describe).
//! - `set_output(ptr, len)` -- hand the result (descriptor JSON or HTML) back.
//! - `log(level, ptr, len)` -- structured guest logging.
//! - `host_render(name_ptr, name_len, props_ptr, props_len) -> i32` -- render
//!   a host capability; returns the fragment length, or -1 on failure.
//! - `host_fragment_read(ptr)` -- copy the last `host_render` fragment.

use std::sync::Arc;

use anyhow::anyhow;
use async_trait::async_trait;
use flowdeck_core::FlowdeckError;
use tracing::{debug, warn};
use wasmtime::{Caller, Config, Engine, Linker, Memory, Module, Store};

use crate::host::HostCapabilities;
use crate::tables::ComponentSource;

/// Resource bounds for one guest invocation.
#[derive(Debug, Clone)]
pub struct GuestLimits {
    /// Fuel budget per invocation.
    pub fuel: u64,
    /// Wall-clock epoch deadline per invocation, in seconds.
    pub epoch_timeout_secs: u64,
}

impl Default for GuestLimits {
    fn default() -> Self {
        Self {
            fuel: 50_000_000,
            epoch_timeout_secs: 5,
        }
    }
}

/// State stored in each wasmtime Store for a single invocation.
struct GuestState {
    /// Owning plugin identifier, for log attribution.
    plugin_id: String,
    /// Input JSON passed to the guest.
    input_json: String,
    /// Result written by the guest via `set_output`.
    output_json: Option<String>,
    /// Host capability set reachable via `host_render`.
    host: Arc<HostCapabilities>,
    /// Fragment produced by the last `host_render` call.
    host_fragment: Option<String>,
}

/// Create the shared engine with fuel metering and epoch interruption enabled.
pub(crate) fn plugin_engine() -> Result<Engine, FlowdeckError> {
    let mut config = Config::new();
    config.consume_fuel(true);
    config.epoch_interruption(true);

    Engine::new(&config).map_err(|e| FlowdeckError::Internal(format!(
        "failed to create wasmtime engine: {e}"
    )))
}

/// One evaluated plugin bundle.
///
/// Holds the compiled module; every invocation gets a fresh store. Dropping
/// the module drops the plugin's code -- the loader never mutates any global.
pub struct PluginModule {
    plugin_id: String,
    engine: Engine,
    module: Module,
    limits: GuestLimits,
    host: Arc<HostCapabilities>,
}

impl PluginModule {
    /// Compile a fetched bundle. Compilation failure is a load error scoped
    /// to this plugin.
    pub(crate) fn compile(
        engine: &Engine,
        plugin_id: &str,
        bytes: &[u8],
        limits: GuestLimits,
        host: Arc<HostCapabilities>,
    ) -> Result<Self, FlowdeckError> {
        let module = Module::new(engine, bytes).map_err(|e| FlowdeckError::PluginLoad {
            plugin: plugin_id.to_string(),
            message: format!("failed to compile bundle: {e}"),
            source: None,
        })?;

        Ok(Self {
            plugin_id: plugin_id.to_string(),
            engine: engine.clone(),
            module,
            limits,
            host,
        })
    }

    pub fn plugin_id(&self) -> &str {
        &self.plugin_id
    }

    /// Invoke a guest export with JSON input and return its JSON/HTML output.
    ///
    /// Runs the guest on a blocking thread so the epoch ticker can advance on
    /// the runtime while the WASM executes. A missing or mis-typed export is
    /// a malformed plugin; traps (including fuel and deadline) are render
    /// errors attributed to the plugin.
    pub async fn invoke(&self, export: &str, input_json: String) -> Result<String, FlowdeckError> {
        let state = GuestState {
            plugin_id: self.plugin_id.clone(),
            input_json,
            output_json: None,
            host: self.host.clone(),
            host_fragment: None,
        };
        let mut store = Store::new(&self.engine, state);

        store
            .set_fuel(self.limits.fuel)
            .map_err(|e| FlowdeckError::Internal(format!("failed to set fuel: {e}")))?;
        store.epoch_deadline_trap();
        store.set_epoch_deadline(self.limits.epoch_timeout_secs);

        let mut linker = Linker::new(&self.engine);
        define_host_imports(&mut linker)?;

        // Epoch ticker: increments the engine epoch every second so the
        // deadline fires even while the guest spins.
        let engine = self.engine.clone();
        let timeout_secs = self.limits.epoch_timeout_secs;
        let ticker = tokio::spawn(async move {
            for _ in 0..timeout_secs + 1 {
                tokio::time::sleep(std::time::Duration::from_secs(1)).await;
                engine.increment_epoch();
            }
        });

        let module = self.module.clone();
        let export_name = export.to_string();
        let wasm_result = tokio::task::spawn_blocking(move || {
            let instance = linker.instantiate(&mut store, &module)?;
            let func = instance
                .get_typed_func::<(), ()>(&mut store, &export_name)
                .map_err(|e| anyhow!("missing export '{export_name}': {e}"))?;
            func.call(&mut store, ())?;
            Ok::<Store<GuestState>, anyhow::Error>(store)
        })
        .await
        .map_err(|e| FlowdeckError::Internal(format!("guest execution task panicked: {e}")))?;

        ticker.abort();

        let plugin = &self.plugin_id;
        let fuel = self.limits.fuel;
        match wasm_result {
            Ok(store) => {
                store
                    .into_data()
                    .output_json
                    .ok_or_else(|| FlowdeckError::MalformedPlugin {
                        plugin: plugin.clone(),
                        reason: format!("export '{export}' completed without producing output"),
                    })
            }
            Err(e) => {
                // {e:#} renders the full error chain including nested causes.
                let message = format!("{e:#}");
                if message.contains("missing export") {
                    Err(FlowdeckError::MalformedPlugin {
                        plugin: plugin.clone(),
                        reason: message,
                    })
                } else if message.contains("all fuel consumed") {
                    Err(FlowdeckError::Render {
                        message: format!(
                            "plugin '{plugin}' exceeded fuel limit ({fuel} units): {message}"
                        ),
                    })
                } else if message.contains("wasm trap: interrupt") {
                    Err(FlowdeckError::Render {
                        message: format!(
                            "plugin '{plugin}' exceeded wall-clock deadline ({timeout_secs}s): {message}"
                        ),
                    })
                } else {
                    Err(FlowdeckError::Render {
                        message: format!("plugin '{plugin}' execution error: {message}"),
                    })
                }
            }
        }
    }
}

#[async_trait]
impl ComponentSource for PluginModule {
    async fn render_component(
        &self,
        component: &str,
        props: &serde_json::Value,
    ) -> Result<String, FlowdeckError> {
        let input = serde_json::json!({
            "component": component,
            "data": props,
            "host": self.host.names(),
        })
        .to_string();
        self.invoke("render", input).await
    }
}

/// Defines the `flowdeck` import namespace in the linker.
fn define_host_imports(linker: &mut Linker<GuestState>) -> Result<(), FlowdeckError> {
    // --- input plumbing ---
    linker
        .func_wrap(
            "flowdeck",
            "get_input_len",
            |caller: Caller<'_, GuestState>| -> i32 { caller.data().input_json.len() as i32 },
        )
        .map_err(linker_err)?;

    linker
        .func_wrap(
            "flowdeck",
            "get_input",
            |mut caller: Caller<'_, GuestState>, ptr: i32| {
                let input = caller.data().input_json.clone();
                let memory = match caller.get_export("memory") {
                    Some(wasmtime::Extern::Memory(mem)) => mem,
                    _ => return,
                };
                write_bytes_to_memory(&memory, &mut caller, ptr, input.as_bytes());
            },
        )
        .map_err(linker_err)?;

    // --- output ---
    linker
        .func_wrap(
            "flowdeck",
            "set_output",
            |mut caller: Caller<'_, GuestState>, ptr: i32, len: i32| {
                if len < 0 {
                    return;
                }
                let memory = match caller.get_export("memory") {
                    Some(wasmtime::Extern::Memory(mem)) => mem,
                    _ => return,
                };
                if let Some(output) = read_string_from_memory(&memory, &caller, ptr, len) {
                    caller.data_mut().output_json = Some(output);
                }
            },
        )
        .map_err(linker_err)?;

    // --- guest logging ---
    linker
        .func_wrap(
            "flowdeck",
            "log",
            |mut caller: Caller<'_, GuestState>, level: i32, ptr: i32, len: i32| {
                let memory = match caller.get_export("memory") {
                    Some(wasmtime::Extern::Memory(mem)) => mem,
                    _ => return,
                };
                if let Some(msg) = read_string_from_memory(&memory, &caller, ptr, len) {
                    let level_str = match level {
                        0 => "TRACE",
                        1 => "DEBUG",
                        2 => "INFO",
                        3 => "WARN",
                        4 => "ERROR",
                        _ => "INFO",
                    };
                    let plugin = caller.data().plugin_id.clone();
                    debug!(plugin = %plugin, level = level_str, guest_log = %msg, "plugin log");
                }
            },
        )
        .map_err(linker_err)?;

    // --- host capability composition ---
    linker
        .func_wrap(
            "flowdeck",
            "host_render",
            |mut caller: Caller<'_, GuestState>,
             name_ptr: i32,
             name_len: i32,
             props_ptr: i32,
             props_len: i32|
             -> i32 {
                let memory = match caller.get_export("memory") {
                    Some(wasmtime::Extern::Memory(mem)) => mem,
                    _ => return -1,
                };
                let name = match read_string_from_memory(&memory, &caller, name_ptr, name_len) {
                    Some(n) => n,
                    None => return -1,
                };
                let props_json =
                    match read_string_from_memory(&memory, &caller, props_ptr, props_len) {
                        Some(p) => p,
                        None => return -1,
                    };
                let props: serde_json::Value = match serde_json::from_str(&props_json) {
                    Ok(v) => v,
                    Err(e) => {
                        warn!(capability = %name, error = %e, "host_render props are not valid JSON");
                        return -1;
                    }
                };

                // We are inside spawn_blocking, so Handle::current() is available.
                let host = caller.data().host.clone();
                let handle = tokio::runtime::Handle::current();
                match handle.block_on(async { host.render(&name, &props).await }) {
                    Ok(fragment) => {
                        let len = fragment.len() as i32;
                        caller.data_mut().host_fragment = Some(fragment);
                        len
                    }
                    Err(e) => {
                        let plugin = caller.data().plugin_id.clone();
                        warn!(plugin = %plugin, capability = %name, error = %e, "host_render failed");
                        -1
                    }
                }
            },
        )
        .map_err(linker_err)?;

    linker
        .func_wrap(
            "flowdeck",
            "host_fragment_read",
            |mut caller: Caller<'_, GuestState>, ptr: i32| {
                let fragment = match caller.data_mut().host_fragment.take() {
                    Some(f) => f,
                    None => return,
                };
                let memory = match caller.get_export("memory") {
                    Some(wasmtime::Extern::Memory(mem)) => mem,
                    _ => return,
                };
                write_bytes_to_memory(&memory, &mut caller, ptr, fragment.as_bytes());
            },
        )
        .map_err(linker_err)?;

    Ok(())
}

/// Helper: read a UTF-8 string from WASM memory.
fn read_string_from_memory(
    memory: &Memory,
    caller: &Caller<'_, GuestState>,
    ptr: i32,
    len: i32,
) -> Option<String> {
    let ptr = ptr as usize;
    let len = len as usize;
    let data = memory.data(caller);
    if ptr + len > data.len() {
        return None;
    }
    String::from_utf8(data[ptr..ptr + len].to_vec()).ok()
}

/// Helper: write bytes into WASM memory.
fn write_bytes_to_memory(
    memory: &Memory,
    caller: &mut Caller<'_, GuestState>,
    ptr: i32,
    bytes: &[u8],
) {
    let ptr = ptr as usize;
    let data = memory.data_mut(caller);
    if ptr + bytes.len() <= data.len() {
        data[ptr..ptr + bytes.len()].copy_from_slice(bytes);
    }
}

/// Helper: convert linker errors to FlowdeckError.
fn linker_err(e: anyhow::Error) -> FlowdeckError {
    FlowdeckError::Internal(format!("failed to define host import: {e}"))
}
