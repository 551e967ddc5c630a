//! Optional capability interfaces for component handles.
//!
//! A component implements only the capabilities it needs; the registry
//! discovers them through the accessors on [`crate::Component`]. Errors are
//! `anyhow::Error` — the registry treats them as opaque and reports them
//! back to the caller without interpreting them.

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value as JsonValue;

/// Startup capability, invoked by the lifecycle orchestrator in dependency
/// order.
///
/// A call, once started, runs to completion or failure — it is never
/// forcibly interrupted. Bound any internal I/O yourself.
#[async_trait]
pub trait Initialize: Send + Sync {
    /// Bring the component into a usable state.
    async fn initialize(&self) -> Result<()>;
}

/// Teardown capability, invoked in reverse dependency order.
#[async_trait]
pub trait Terminate: Send + Sync {
    /// Release the component's resources.
    async fn terminate(&self) -> Result<()>;
}

/// On-demand health probe, independent of the init/shutdown sequence.
#[async_trait]
pub trait HealthCheck: Send + Sync {
    /// Report whether the component is currently healthy.
    async fn check_health(&self) -> bool;
}

/// Configuration capability, invoked immediately after registration when a
/// config source supplies a blob for the component's id.
#[async_trait]
pub trait Configure: Send + Sync {
    /// Apply a configuration blob.
    async fn configure(&self, config: &JsonValue) -> Result<()>;
}

/// State-capture capability used by export snapshots.
pub trait CaptureState: Send + Sync {
    /// Produce a serializable blob of the component's current state.
    fn capture_state(&self) -> Result<JsonValue>;
}
