//! Lifecycle orchestration.
//!
//! Drives component initialization and shutdown in resolver-determined
//! order. Resolution completes fully before any capability is invoked, so
//! a cycle can never leave a partial init behind. Per-component failures
//! are caught, logged, and accumulated into the run report; the walk is
//! best-effort and never aborts on a single component.
//!
//! Cancellation is cooperative: the token is checked between component
//! steps only. A capability call that has started runs to completion or
//! failure.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::RegistryError;
use crate::registry::Registry;

/// State of an orchestration run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Resolving the order; no side effects yet.
    Planning,
    /// Walking the initialization order.
    Initializing,
    /// Initialization walk completed.
    Ready,
    /// Walking the reverse order.
    ShuttingDown,
    /// Shutdown walk completed.
    Stopped,
    /// Planning failed before any side effect (cycle detected).
    Failed,
}

/// One component's failure during a run.
#[derive(Debug, Clone)]
pub struct ComponentFailure {
    /// Id of the failing component.
    pub id: String,
    /// Rendered error chain from the component's capability.
    pub error: String,
}

/// Outcome of one orchestration run.
///
/// `state` is the terminal state of the walk; a cancelled run stays in
/// `Initializing`/`ShuttingDown` with `cancelled` set, since the walk did
/// not complete.
#[derive(Debug, Clone)]
pub struct LifecycleReport {
    /// Unique id of this run, for log correlation.
    pub run_id: Uuid,
    /// Terminal state of the run.
    pub state: RunState,
    /// Ids walked, in walk order.
    pub attempted: Vec<String>,
    /// Ids whose capability ran successfully or was absent.
    pub completed: Vec<String>,
    /// Accumulated per-component failures.
    pub failures: Vec<ComponentFailure>,
    /// Whether the run was cancelled between steps.
    pub cancelled: bool,
}

impl LifecycleReport {
    fn new(run_id: Uuid, state: RunState) -> Self {
        Self {
            run_id,
            state,
            attempted: Vec::new(),
            completed: Vec::new(),
            failures: Vec::new(),
            cancelled: false,
        }
    }

    /// True when every attempted component completed and nothing was
    /// cancelled.
    pub fn is_fully_successful(&self) -> bool {
        self.failures.is_empty() && !self.cancelled
    }
}

/// Drives init/shutdown of registered components in dependency order.
///
/// Holds the registry by `Arc`; construct one per collaborator that needs
/// to trigger runs.
pub struct Orchestrator {
    registry: Arc<Registry>,
}

impl Orchestrator {
    /// Create an orchestrator over `registry`.
    pub fn new(registry: Arc<Registry>) -> Self {
        Self { registry }
    }

    /// Initialize every registered component in dependency order.
    ///
    /// Resolution happens first and in full; a cycle fails the run during
    /// planning with `CircularDependency` and no component is touched.
    /// Component failures do not stop the walk — later components may be
    /// independently useful — and are returned in the report.
    pub async fn initialize_all(
        &self,
        cancel: &CancellationToken,
    ) -> Result<LifecycleReport, RegistryError> {
        let run_id = Uuid::now_v7();

        let resolution = match self.registry.resolve() {
            Ok(resolution) => resolution,
            Err(e) => {
                warn!(run = %run_id, state = ?RunState::Failed, error = %e, "initialization planning failed");
                return Err(e);
            }
        };

        let pairs = self.registry.handles_for(resolution.init_order());
        info!(run = %run_id, count = pairs.len(), "starting initialization run");

        let mut report = LifecycleReport::new(run_id, RunState::Initializing);
        for (id, handle) in pairs {
            if cancel.is_cancelled() {
                warn!(run = %run_id, "initialization cancelled between steps");
                report.cancelled = true;
                break;
            }

            report.attempted.push(id.clone());
            match handle.as_initialize() {
                Some(init) => match init.initialize().await {
                    Ok(()) => {
                        debug!(run = %run_id, component = %id, "initialized");
                        report.completed.push(id);
                    }
                    Err(e) => {
                        warn!(run = %run_id, component = %id, error = %e, "component initialization failed, continuing");
                        report.failures.push(ComponentFailure {
                            id,
                            error: format!("{e:#}"),
                        });
                    }
                },
                None => report.completed.push(id),
            }
        }

        if !report.cancelled {
            report.state = RunState::Ready;
        }
        info!(
            run = %run_id,
            completed = report.completed.len(),
            failures = report.failures.len(),
            "initialization run finished"
        );
        Ok(report)
    }

    /// Shut down every registered component in reverse dependency order.
    ///
    /// Same best-effort policy as initialization: a component that fails to
    /// terminate cleanly never blocks the components after it.
    pub async fn shutdown_all(
        &self,
        cancel: &CancellationToken,
    ) -> Result<LifecycleReport, RegistryError> {
        let run_id = Uuid::now_v7();

        let resolution = match self.registry.resolve() {
            Ok(resolution) => resolution,
            Err(e) => {
                warn!(run = %run_id, state = ?RunState::Failed, error = %e, "shutdown planning failed");
                return Err(e);
            }
        };

        let pairs = self.registry.handles_for(&resolution.shutdown_order());
        info!(run = %run_id, count = pairs.len(), "starting shutdown run");

        let mut report = LifecycleReport::new(run_id, RunState::ShuttingDown);
        for (id, handle) in pairs {
            if cancel.is_cancelled() {
                warn!(run = %run_id, "shutdown cancelled between steps");
                report.cancelled = true;
                break;
            }

            report.attempted.push(id.clone());
            match handle.as_terminate() {
                Some(terminate) => match terminate.terminate().await {
                    Ok(()) => {
                        debug!(run = %run_id, component = %id, "terminated");
                        report.completed.push(id);
                    }
                    Err(e) => {
                        warn!(run = %run_id, component = %id, error = %e, "component termination failed, continuing");
                        report.failures.push(ComponentFailure {
                            id,
                            error: format!("{e:#}"),
                        });
                    }
                },
                None => report.completed.push(id),
            }
        }

        if !report.cancelled {
            report.state = RunState::Stopped;
        }
        info!(
            run = %run_id,
            completed = report.completed.len(),
            failures = report.failures.len(),
            "shutdown run finished"
        );
        Ok(report)
    }

    /// Probe one component's health, independent of any run.
    ///
    /// Components without the capability are reported healthy.
    pub async fn check_health(&self, id: &str) -> Result<bool, RegistryError> {
        let handle = self
            .registry
            .handle_of(id)
            .ok_or_else(|| RegistryError::component_not_found(id))?;

        match handle.as_health_check() {
            Some(probe) => Ok(probe.check_health().await),
            None => Ok(true),
        }
    }
}
