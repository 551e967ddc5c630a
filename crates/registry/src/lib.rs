//! Telaio Registry
//!
//! Component lifecycle and dependency-resolution registry: tracks modular
//! components, resolves declared dependencies into a deterministic
//! init/shutdown order, hosts pluggable extension points, and enforces
//! per-owner visibility and export boundaries.

pub mod config;
pub mod descriptor;
pub mod error;
pub mod export;
pub mod extension;
pub mod lifecycle;
pub mod ownership;
pub mod persist;
pub mod record;
pub mod registry;
pub mod resolver;

pub use config::ConfigSource;
pub use descriptor::ComponentDescriptor;
pub use error::RegistryError;
pub use export::{BundledExtension, ExportGate, ExportSnapshot, OwnerBundle};
pub use extension::RegisteredExtension;
pub use lifecycle::{ComponentFailure, LifecycleReport, Orchestrator, RunState};
pub use persist::{HandleBinder, PersistedRecord, SnapshotStore};
pub use record::{ComponentInfo, ComponentRecord, ListFilter, SYSTEM_OWNER};
pub use registry::{Registry, RegistryConfig};
pub use resolver::{GraphSnapshot, Resolution, ResolutionWarning};
