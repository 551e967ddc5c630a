//! Optional durable persistence for warm restarts.
//!
//! `persist`/`restore` are a save/load pair over an external key-value
//! store, not part of normal operation. Only metadata is persisted — a
//! handle is a live instance and cannot be serialized — so `restore` asks
//! a [`HandleBinder`] collaborator to re-attach instances, skipping
//! records it cannot bind.

use std::collections::BTreeSet;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use semver::Version;
use serde::{Deserialize, Serialize};
use telaio_sdk::Component;
use tracing::{info, warn};

use crate::error::RegistryError;
use crate::record::ComponentRecord;
use crate::registry::Registry;

/// Serializable form of a component record, minus the handle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedRecord {
    pub id: String,
    pub version: Version,
    pub description: String,
    pub dependencies: Vec<String>,
    pub tags: BTreeSet<String>,
    pub owner_id: Option<String>,
    pub exportable: bool,
    pub registered_at: i64,
    pub updated_at: i64,
}

/// Durable key-value store keyed by component id.
///
/// Implementations own the storage medium; errors are opaque to the
/// registry and surface as `RegistryError::Persistence`.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Store or overwrite the record for `id`.
    async fn put(&self, id: &str, record: PersistedRecord) -> Result<()>;

    /// Load every stored record.
    async fn get_all(&self) -> Result<Vec<PersistedRecord>>;

    /// Delete the record for `id`; deleting an absent id is not an error.
    async fn delete(&self, id: &str) -> Result<()>;
}

/// Re-attaches live handles to restored metadata.
pub trait HandleBinder: Send + Sync {
    /// Produce a handle for the restored record, or `None` if this binder
    /// cannot (the record is then skipped).
    fn bind(&self, record: &PersistedRecord) -> Option<Arc<dyn Component>>;
}

impl Registry {
    /// Save every registered component's metadata to `store`.
    ///
    /// Returns the number of records written.
    pub async fn persist(&self, store: &dyn SnapshotStore) -> Result<usize, RegistryError> {
        let records: Vec<PersistedRecord> = self
            .list(None)
            .into_iter()
            .map(|info| PersistedRecord {
                id: info.id,
                version: info.version,
                description: info.description,
                dependencies: info.dependencies,
                tags: info.tags,
                owner_id: info.owner_id,
                exportable: info.exportable,
                registered_at: info.registered_at,
                updated_at: info.updated_at,
            })
            .collect();

        let count = records.len();
        for record in records {
            let id = record.id.clone();
            store
                .put(&id, record)
                .await
                .map_err(|e| RegistryError::persistence(format!("put '{id}'"), &e))?;
        }

        info!(count, "persisted registry metadata");
        Ok(count)
    }

    /// Restore component records from `store`, binding live handles via
    /// `binder`.
    ///
    /// Restored records replace same-id registrations and keep their
    /// persisted timestamps and ownership. Records the binder cannot bind
    /// are skipped with a warning. Returns the number restored.
    pub async fn restore(
        &self,
        store: &dyn SnapshotStore,
        binder: &dyn HandleBinder,
    ) -> Result<usize, RegistryError> {
        let records = store
            .get_all()
            .await
            .map_err(|e| RegistryError::persistence("get_all", &e))?;

        let mut restored = 0usize;
        for persisted in records {
            let Some(handle) = binder.bind(&persisted) else {
                warn!(component = %persisted.id, "no handle binder for persisted record, skipping");
                continue;
            };

            let record = ComponentRecord {
                id: persisted.id,
                version: persisted.version,
                description: persisted.description,
                dependencies: persisted.dependencies,
                tags: persisted.tags,
                owner_id: persisted.owner_id,
                exportable: persisted.exportable,
                handle,
                registered_at: persisted.registered_at,
                updated_at: persisted.updated_at,
            };
            self.insert_restored(record);
            restored += 1;
        }

        info!(count = restored, "restored registry metadata");
        Ok(restored)
    }
}
