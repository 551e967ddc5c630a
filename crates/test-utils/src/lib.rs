//! Telaio test utilities.
//!
//! Helpers for integration testing: scripted components with a shared call
//! journal, probe extensions, and in-memory implementations of the
//! registry's collaborator traits.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Result, anyhow, bail};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value as JsonValue;
use telaio_registry::ConfigSource;
use telaio_registry::persist::{HandleBinder, PersistedRecord, SnapshotStore};
use telaio_sdk::{
    CaptureState, Component, Configure, Extension, HealthCheck, Initialize, Terminate,
};

/// Initialize tracing for a test binary; safe to call repeatedly.
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Shared, cloneable journal recording capability invocations in order.
#[derive(Debug, Clone, Default)]
pub struct Journal {
    entries: Arc<Mutex<Vec<String>>>,
}

impl Journal {
    /// Create an empty journal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event.
    pub fn record(&self, event: impl Into<String>) {
        self.entries.lock().push(event.into());
    }

    /// Snapshot of all events in record order.
    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().clone()
    }

    /// Position of `event`, if recorded.
    pub fn position(&self, event: &str) -> Option<usize> {
        self.entries.lock().iter().position(|e| e == event)
    }
}

/// How a scripted capability behaves when invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Behavior {
    Absent,
    Succeed,
    Fail,
}

/// Create a scripted component with succeeding init/terminate capabilities.
pub fn scripted_component(name: &str) -> ScriptedComponent {
    ScriptedComponent {
        name: name.to_string(),
        journal: None,
        init: Behavior::Succeed,
        terminate: Behavior::Succeed,
        health: None,
        state: None,
        configurable: false,
        received_config: Arc::new(Mutex::new(None)),
    }
}

/// A test component whose capabilities are scripted by the builder.
///
/// Invocations are recorded as `init:{name}`, `terminate:{name}`, and
/// `configure:{name}` in the attached [`Journal`], if any.
pub struct ScriptedComponent {
    name: String,
    journal: Option<Journal>,
    init: Behavior,
    terminate: Behavior,
    health: Option<bool>,
    state: Option<JsonValue>,
    configurable: bool,
    received_config: Arc<Mutex<Option<JsonValue>>>,
}

impl ScriptedComponent {
    /// Record invocations into `journal`.
    pub fn with_journal(mut self, journal: &Journal) -> Self {
        self.journal = Some(journal.clone());
        self
    }

    /// Make `initialize` fail.
    pub fn failing_init(mut self) -> Self {
        self.init = Behavior::Fail;
        self
    }

    /// Drop the `Initialize` capability entirely.
    pub fn without_init(mut self) -> Self {
        self.init = Behavior::Absent;
        self
    }

    /// Make `terminate` fail.
    pub fn failing_terminate(mut self) -> Self {
        self.terminate = Behavior::Fail;
        self
    }

    /// Drop the `Terminate` capability entirely.
    pub fn without_terminate(mut self) -> Self {
        self.terminate = Behavior::Absent;
        self
    }

    /// Expose a `HealthCheck` capability reporting `healthy`.
    pub fn with_health(mut self, healthy: bool) -> Self {
        self.health = Some(healthy);
        self
    }

    /// Expose a `CaptureState` capability returning `state`.
    pub fn with_state(mut self, state: JsonValue) -> Self {
        self.state = Some(state);
        self
    }

    /// Expose a `Configure` capability recording what it receives.
    pub fn configurable(mut self) -> Self {
        self.configurable = true;
        self
    }

    /// Shared cell holding the last configuration this component received.
    pub fn config_cell(&self) -> Arc<Mutex<Option<JsonValue>>> {
        self.received_config.clone()
    }

    fn log(&self, what: &str) {
        if let Some(journal) = &self.journal {
            journal.record(format!("{what}:{}", self.name));
        }
    }
}

#[async_trait]
impl Initialize for ScriptedComponent {
    async fn initialize(&self) -> Result<()> {
        self.log("init");
        if self.init == Behavior::Fail {
            bail!("scripted initialization failure in '{}'", self.name);
        }
        Ok(())
    }
}

#[async_trait]
impl Terminate for ScriptedComponent {
    async fn terminate(&self) -> Result<()> {
        self.log("terminate");
        if self.terminate == Behavior::Fail {
            bail!("scripted termination failure in '{}'", self.name);
        }
        Ok(())
    }
}

#[async_trait]
impl HealthCheck for ScriptedComponent {
    async fn check_health(&self) -> bool {
        self.health.unwrap_or(true)
    }
}

#[async_trait]
impl Configure for ScriptedComponent {
    async fn configure(&self, config: &JsonValue) -> Result<()> {
        self.log("configure");
        *self.received_config.lock() = Some(config.clone());
        Ok(())
    }
}

impl CaptureState for ScriptedComponent {
    fn capture_state(&self) -> Result<JsonValue> {
        self.state
            .clone()
            .ok_or_else(|| anyhow!("no state scripted for '{}'", self.name))
    }
}

impl Component for ScriptedComponent {
    fn as_initialize(&self) -> Option<&dyn Initialize> {
        (self.init != Behavior::Absent).then_some(self as &dyn Initialize)
    }

    fn as_terminate(&self) -> Option<&dyn Terminate> {
        (self.terminate != Behavior::Absent).then_some(self as &dyn Terminate)
    }

    fn as_health_check(&self) -> Option<&dyn HealthCheck> {
        self.health.map(|_| self as &dyn HealthCheck)
    }

    fn as_configure(&self) -> Option<&dyn Configure> {
        self.configurable.then_some(self as &dyn Configure)
    }

    fn as_capture_state(&self) -> Option<&dyn CaptureState> {
        self.state.as_ref().map(|_| self as &dyn CaptureState)
    }
}

/// Create a probe extension declaring the given contracts.
pub fn probe_extension(contracts: &[&str]) -> ProbeExtension {
    ProbeExtension {
        contracts: contracts.iter().map(|c| (*c).to_string()).collect(),
    }
}

/// A test extension satisfying a fixed set of contracts.
pub struct ProbeExtension {
    contracts: Vec<String>,
}

impl Extension for ProbeExtension {
    fn capability(&self, contract: &str) -> Option<&dyn Any> {
        self.contracts
            .iter()
            .any(|c| c == contract)
            .then_some(self as &dyn Any)
    }
}

/// In-memory snapshot store for persistence tests.
#[derive(Default)]
pub struct MemorySnapshotStore {
    records: Mutex<HashMap<String, PersistedRecord>>,
}

impl MemorySnapshotStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }
}

#[async_trait]
impl SnapshotStore for MemorySnapshotStore {
    async fn put(&self, id: &str, record: PersistedRecord) -> Result<()> {
        self.records.lock().insert(id.to_string(), record);
        Ok(())
    }

    async fn get_all(&self) -> Result<Vec<PersistedRecord>> {
        let mut records: Vec<PersistedRecord> = self.records.lock().values().cloned().collect();
        records.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(records)
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.records.lock().remove(id);
        Ok(())
    }
}

/// Static config source backed by a map.
#[derive(Default)]
pub struct StaticConfigSource {
    blobs: HashMap<String, JsonValue>,
}

impl StaticConfigSource {
    /// Create an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a config blob for `id`.
    pub fn with(mut self, id: &str, blob: JsonValue) -> Self {
        self.blobs.insert(id.to_string(), blob);
        self
    }
}

impl ConfigSource for StaticConfigSource {
    fn config_for(&self, id: &str) -> Option<JsonValue> {
        self.blobs.get(id).cloned()
    }
}

/// Binder that re-creates a scripted component for every restored record,
/// except ids it was told to refuse.
#[derive(Default)]
pub struct ScriptedBinder {
    refused: Vec<String>,
}

impl ScriptedBinder {
    /// Create a binder that binds everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse to bind `id`, so its record is skipped on restore.
    pub fn refusing(mut self, id: &str) -> Self {
        self.refused.push(id.to_string());
        self
    }
}

impl HandleBinder for ScriptedBinder {
    fn bind(&self, record: &PersistedRecord) -> Option<Arc<dyn Component>> {
        if self.refused.iter().any(|r| r == &record.id) {
            return None;
        }
        Some(Arc::new(scripted_component(&record.id)))
    }
}
