//! Export gating and serializable snapshots.
//!
//! Determines which components and extensions may leave the system based
//! on ownership plus the exportable flag, and produces the serializable
//! records an external packager consumes. The packager itself — file
//! formats, artifact layout — is a collaborator, not part of this crate.

use std::collections::BTreeSet;
use std::sync::Arc;

use semver::Version;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tracing::{debug, warn};

use crate::error::RegistryError;
use crate::registry::Registry;

/// Serializable view of one exportable component.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportSnapshot {
    pub id: String,
    pub version: Version,
    pub description: String,
    pub dependencies: Vec<String>,
    pub tags: BTreeSet<String>,
    pub owner_id: Option<String>,
    /// State blob captured from the component, when it exposes the
    /// capability.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<JsonValue>,
}

/// One extension pair included in an owner bundle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BundledExtension {
    pub point: String,
    pub name: String,
    pub contract: String,
}

/// Everything one owner may take out of the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OwnerBundle {
    pub owner_id: String,
    pub components: Vec<ExportSnapshot>,
    pub extensions: Vec<BundledExtension>,
}

/// Gate deciding what is eligible for external packaging.
pub struct ExportGate {
    registry: Arc<Registry>,
}

impl ExportGate {
    /// Create an export gate over `registry`.
    pub fn new(registry: Arc<Registry>) -> Self {
        Self { registry }
    }

    /// Ids of every exportable component, any owner, sorted.
    pub fn list_exportable(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .registry
            .list(None)
            .into_iter()
            .filter(|info| info.exportable)
            .map(|info| info.id)
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Snapshot one component for the packager.
    ///
    /// Fails with `NotExportable` unless the component is flagged; a
    /// failing state capture is logged and the snapshot ships without a
    /// state blob.
    pub fn export_snapshot(&self, id: &str) -> Result<ExportSnapshot, RegistryError> {
        let (info, handle) = self
            .registry
            .info_and_handle(id)
            .ok_or_else(|| RegistryError::component_not_found(id))?;

        if !info.exportable {
            return Err(RegistryError::NotExportable { id: id.to_string() });
        }

        let state = handle.as_capture_state().and_then(|capture| {
            match capture.capture_state() {
                Ok(blob) => Some(blob),
                Err(e) => {
                    warn!(component = %id, error = %e, "state capture failed, exporting without state");
                    None
                }
            }
        });

        debug!(component = %id, with_state = state.is_some(), "exported snapshot");
        Ok(ExportSnapshot {
            id: info.id,
            version: info.version,
            description: info.description,
            dependencies: info.dependencies,
            tags: info.tags,
            owner_id: info.owner_id,
            state,
        })
    }

    /// Bundle everything `owner` may export.
    ///
    /// Aggregates a snapshot for each of the owner's individually
    /// exportable components — non-exportable owned components are
    /// silently skipped, owners are not guaranteed that everything they
    /// own can leave the system — plus the owner's extension pairs.
    /// An unknown owner yields an empty bundle, not an error.
    pub fn export_owner_bundle(&self, owner: &str) -> OwnerBundle {
        let mut components = Vec::new();
        for id in self.registry.get_by_owner(owner) {
            match self.export_snapshot(&id) {
                Ok(snapshot) => components.push(snapshot),
                Err(RegistryError::NotExportable { .. }) => {
                    debug!(component = %id, owner = %owner, "skipping non-exportable owned component");
                }
                Err(e) => {
                    // Removed between the owner listing and the snapshot;
                    // treat like non-exportable.
                    warn!(component = %id, owner = %owner, error = %e, "skipping owned component");
                }
            }
        }

        let extensions = self
            .registry
            .owned_extensions(owner)
            .into_iter()
            .map(|(point, name, contract)| BundledExtension {
                point,
                name,
                contract,
            })
            .collect();

        OwnerBundle {
            owner_id: owner.to_string(),
            components,
            extensions,
        }
    }
}
