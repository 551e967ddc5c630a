//! The registry facade.
//!
//! One [`Registry`] instance owns the metadata store, ownership index, and
//! extension point registry behind a single `parking_lot::RwLock`. The
//! coarse lock serializes mutations; read operations clone consistent
//! point-in-time snapshots out of it. The lock is never held across an
//! `.await`.
//!
//! Construct one instance and pass it (usually as `Arc<Registry>`) to every
//! collaborator; there is no global state.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::RwLock;
use serde_json::Value as JsonValue;
use telaio_sdk::Component;
use tracing::{debug, info, warn};

use crate::config::ConfigSource;
use crate::descriptor::ComponentDescriptor;
use crate::error::RegistryError;
use crate::extension::{ExtensionEntry, ExtensionPoint, RegisteredExtension, is_valid_name};
use crate::ownership::OwnershipIndex;
use crate::record::{ComponentInfo, ComponentRecord, ListFilter, normalize_owner};
use crate::resolver::{self, GraphSnapshot, Resolution};

/// Behavior switches for a registry instance.
#[derive(Debug, Clone, Default)]
pub struct RegistryConfig {
    /// Fail re-registration of an existing id with `AlreadyExists` instead
    /// of replacing the record.
    pub strict_replace: bool,

    /// Require ownership transfers to be requested by the current owner;
    /// violations fail with `OwnershipConflict`. Off by default: the
    /// registry's caller is trusted to mediate transfers.
    pub enforce_transfer_authorization: bool,
}

/// Mutable registry state guarded by the coarse lock.
#[derive(Default)]
struct RegistryState {
    components: HashMap<String, ComponentRecord>,
    points: HashMap<String, ExtensionPoint>,
    ownership: OwnershipIndex,
}

/// Component lifecycle and dependency-resolution registry.
pub struct Registry {
    state: RwLock<RegistryState>,
    config: RegistryConfig,
    config_source: Option<Arc<dyn ConfigSource>>,
    /// Config blobs successfully applied per component id.
    applied_config: DashMap<String, JsonValue>,
}

fn now_ts() -> i64 {
    chrono::Utc::now().timestamp()
}

impl Registry {
    /// Create a registry with the given behavior switches.
    pub fn new(config: RegistryConfig) -> Self {
        Self {
            state: RwLock::new(RegistryState::default()),
            config,
            config_source: None,
            applied_config: DashMap::new(),
        }
    }

    /// Attach a config source consulted after every registration.
    pub fn with_config_source(mut self, source: Arc<dyn ConfigSource>) -> Self {
        self.config_source = Some(source);
        self
    }

    // -----------------------------------------------------------------------
    // Metadata store & ownership index
    // -----------------------------------------------------------------------

    /// Register a component, replacing any existing record with the same id.
    ///
    /// Replacement detaches the prior record from its owner's index entry
    /// and attaches the new one atomically with the store update. In strict
    /// mode replacement fails with `AlreadyExists` instead.
    ///
    /// Dependencies on ids that are not registered yet are allowed (late
    /// binding) and returned as warnings; if still missing at resolution
    /// time they surface as [`crate::resolver::ResolutionWarning`]s and
    /// contribute no ordering edge.
    ///
    /// If a config source is attached and supplies a blob for this id, the
    /// component's `Configure` capability (when present) is invoked before
    /// this call returns; a configure failure is logged and does not undo
    /// the registration.
    pub async fn register(
        &self,
        mut record: ComponentRecord,
    ) -> Result<Vec<String>, RegistryError> {
        if !is_valid_name(&record.id) {
            return Err(RegistryError::InvalidName {
                entity: "component",
                name: record.id,
            });
        }

        record.owner_id = normalize_owner(record.owner_id.as_deref());

        // Ordered set semantics: keep first occurrence of each dependency.
        let mut seen: HashSet<String> = HashSet::new();
        record.dependencies.retain(|d| seen.insert(d.clone()));

        let id = record.id.clone();
        let handle = record.handle.clone();
        let now = now_ts();

        let warnings: Vec<String> = {
            let mut guard = self.state.write();
            let state = &mut *guard;

            if let Some(existing) = state.components.get(&id) {
                if self.config.strict_replace {
                    return Err(RegistryError::AlreadyExists { id });
                }
                warn!(component = %id, "replacing existing registration");
                record.registered_at = existing.registered_at;
                if let Some(owner) = existing.owner_id.clone() {
                    state.ownership.detach_component(&owner, &id);
                }
            } else {
                record.registered_at = now;
            }
            record.updated_at = now;

            if let Some(owner) = record.owner_id.as_deref() {
                state.ownership.attach_component(owner, &id);
            }

            let warnings: Vec<String> = record
                .dependencies
                .iter()
                .filter(|dep| !state.components.contains_key(*dep) && **dep != id)
                .map(|dep| format!("component '{id}' depends on '{dep}' which is not registered yet"))
                .collect();

            state.components.insert(id.clone(), record);
            warnings
        };

        for warning in &warnings {
            warn!("{warning}");
        }
        debug!(component = %id, "registered component");

        self.apply_config(&id, handle.as_ref()).await;

        Ok(warnings)
    }

    /// Register a component from a parsed descriptor plus its live handle.
    pub async fn register_with_descriptor(
        &self,
        descriptor: &ComponentDescriptor,
        handle: Arc<dyn Component>,
    ) -> Result<Vec<String>, RegistryError> {
        let version = semver::Version::parse(&descriptor.version)
            .map_err(|e| RegistryError::invalid_version(&descriptor.name, &descriptor.version, &e))?;

        let mut record = ComponentRecord::new(&descriptor.name, version, handle)
            .with_description(&descriptor.description)
            .with_dependencies(descriptor.dependencies.iter().map(String::as_str));
        for tag in &descriptor.tags {
            record = record.with_tag(tag);
        }
        if let Some(owner) = &descriptor.owner {
            record = record.with_owner(owner);
        }
        record.exportable = descriptor.exportable;

        self.register(record).await
    }

    /// Invoke the component's `Configure` capability with the blob the
    /// config source supplies for it, if both exist.
    async fn apply_config(&self, id: &str, handle: &dyn Component) {
        let Some(source) = &self.config_source else {
            return;
        };
        let Some(blob) = source.config_for(id) else {
            return;
        };
        let Some(configure) = handle.as_configure() else {
            debug!(component = %id, "config blob present but component is not configurable");
            return;
        };

        match configure.configure(&blob).await {
            Ok(()) => {
                self.applied_config.insert(id.to_string(), blob);
                debug!(component = %id, "configuration applied");
            }
            Err(e) => {
                warn!(component = %id, error = %e, "configure failed, component stays registered");
            }
        }
    }

    /// Handle-free view of a registered component.
    pub fn get(&self, id: &str) -> Option<ComponentInfo> {
        self.state.read().components.get(id).map(ComponentRecord::info)
    }

    /// All registered components matching `filter`, sorted by id.
    pub fn list(&self, filter: Option<&ListFilter>) -> Vec<ComponentInfo> {
        let state = self.state.read();
        let mut infos: Vec<ComponentInfo> = state
            .components
            .values()
            .map(ComponentRecord::info)
            .filter(|info| filter.is_none_or(|f| f.matches(info)))
            .collect();
        infos.sort_by(|a, b| a.id.cmp(&b.id));
        infos
    }

    /// Remove a component and its ownership entry.
    ///
    /// Does not cascade into resolution: callers holding a [`Resolution`]
    /// must re-resolve if they depend on fresh ordering.
    pub fn remove(&self, id: &str) -> Result<(), RegistryError> {
        let mut guard = self.state.write();
        let state = &mut *guard;

        let record = state
            .components
            .remove(id)
            .ok_or_else(|| RegistryError::component_not_found(id))?;
        if let Some(owner) = record.owner_id.as_deref() {
            state.ownership.detach_component(owner, id);
        }
        drop(guard);

        self.applied_config.remove(id);
        debug!(component = %id, "removed component");
        Ok(())
    }

    /// Component ids owned by `owner`; empty for unknown owners.
    pub fn get_by_owner(&self, owner: &str) -> BTreeSet<String> {
        self.state.read().ownership.components_of(owner)
    }

    /// Transfer a component to a new owner (`None` for system ownership).
    ///
    /// When `enforce_transfer_authorization` is set, `requester` must be
    /// the current owner or the call fails with `OwnershipConflict`.
    pub fn transfer_ownership(
        &self,
        id: &str,
        new_owner: Option<&str>,
        requester: Option<&str>,
    ) -> Result<(), RegistryError> {
        let mut guard = self.state.write();
        let state = &mut *guard;

        let record = state
            .components
            .get_mut(id)
            .ok_or_else(|| RegistryError::component_not_found(id))?;
        let current = record.owner_id.clone();

        if self.config.enforce_transfer_authorization
            && normalize_owner(requester) != current
        {
            return Err(RegistryError::OwnershipConflict {
                id: id.to_string(),
                owner: current.unwrap_or_else(|| "system".to_string()),
                requester: requester.unwrap_or("system").to_string(),
            });
        }

        let new_owner = normalize_owner(new_owner);
        record.owner_id = new_owner.clone();
        record.updated_at = now_ts();
        state
            .ownership
            .move_component(current.as_deref(), new_owner.as_deref(), id);

        info!(component = %id, from = ?current, to = ?new_owner, "ownership transferred");
        Ok(())
    }

    /// Rebuild the ownership index from the metadata store and extension
    /// point registry.
    ///
    /// The index is a derived cache; this consistency-repair pass restores
    /// it if it ever drifts from the source of truth.
    pub fn rebuild_ownership_index(&self) {
        let mut guard = self.state.write();
        let state = &mut *guard;

        let rebuilt = OwnershipIndex::rebuild(
            state
                .components
                .iter()
                .map(|(id, r)| (id.as_str(), r.owner_id.as_deref())),
            state.points.iter().flat_map(|(point, p)| {
                p.extensions
                    .iter()
                    .map(move |(name, e)| (point.as_str(), name.as_str(), e.owner_id.as_deref()))
            }),
        );
        state.ownership = rebuilt;
        info!("ownership index rebuilt from source data");
    }

    /// Config blob last applied to `id`, if any.
    pub fn applied_config(&self, id: &str) -> Option<JsonValue> {
        self.applied_config.get(id).map(|entry| entry.value().clone())
    }

    // -----------------------------------------------------------------------
    // Extension point registry
    // -----------------------------------------------------------------------

    /// Register an extension point declaring `contract`.
    ///
    /// Redefining an existing point replaces its definition and **discards
    /// every extension registered at it** — a rare, destructive operation.
    pub fn register_point(&self, name: &str, contract: &str) -> Result<(), RegistryError> {
        if !is_valid_name(name) {
            return Err(RegistryError::InvalidName {
                entity: "extension point",
                name: name.to_string(),
            });
        }
        if !is_valid_name(contract) {
            return Err(RegistryError::InvalidName {
                entity: "contract",
                name: contract.to_string(),
            });
        }

        let mut guard = self.state.write();
        let state = &mut *guard;

        if let Some(old) = state.points.remove(name) {
            warn!(
                point = %name,
                discarded = old.extensions.len(),
                "redefining extension point, discarding its extensions"
            );
            for (ext_name, entry) in &old.extensions {
                if let Some(owner) = entry.owner_id.as_deref() {
                    state.ownership.detach_extension(owner, name, ext_name);
                }
            }
        }

        state
            .points
            .insert(name.to_string(), ExtensionPoint::new(contract));
        debug!(point = %name, contract = %contract, "registered extension point");
        Ok(())
    }

    /// Add an extension at `point`, replacing any prior extension with the
    /// same name there.
    ///
    /// Fails with `ContractViolation` unless the instance produces a
    /// capability object for the point's declared contract.
    pub fn add_extension(
        &self,
        point: &str,
        name: &str,
        instance: Arc<dyn telaio_sdk::Extension>,
        owner: Option<&str>,
    ) -> Result<(), RegistryError> {
        if !is_valid_name(name) {
            return Err(RegistryError::InvalidName {
                entity: "extension",
                name: name.to_string(),
            });
        }

        let owner = normalize_owner(owner);

        let mut guard = self.state.write();
        let state = &mut *guard;

        let p = state
            .points
            .get_mut(point)
            .ok_or_else(|| RegistryError::point_not_found(point))?;

        if instance.capability(&p.contract).is_none() {
            return Err(RegistryError::ContractViolation {
                point: point.to_string(),
                extension: name.to_string(),
                contract: p.contract.clone(),
            });
        }

        let prior_owner = match p.extensions.insert(
            name.to_string(),
            ExtensionEntry {
                instance,
                owner_id: owner.clone(),
            },
        ) {
            Some(prior) => {
                warn!(point = %point, extension = %name, "replacing existing extension");
                prior.owner_id
            }
            None => None,
        };

        if let Some(old) = prior_owner.as_deref() {
            state.ownership.detach_extension(old, point, name);
        }
        if let Some(new) = owner.as_deref() {
            state.ownership.attach_extension(new, point, name);
        }

        debug!(point = %point, extension = %name, "added extension");
        Ok(())
    }

    /// Remove one extension from a point.
    pub fn remove_extension(&self, point: &str, name: &str) -> Result<(), RegistryError> {
        let mut guard = self.state.write();
        let state = &mut *guard;

        let p = state
            .points
            .get_mut(point)
            .ok_or_else(|| RegistryError::point_not_found(point))?;
        let entry = p
            .extensions
            .remove(name)
            .ok_or_else(|| RegistryError::extension_not_found(point, name))?;

        if let Some(owner) = entry.owner_id.as_deref() {
            state.ownership.detach_extension(owner, point, name);
        }
        debug!(point = %point, extension = %name, "removed extension");
        Ok(())
    }

    /// All extensions at a point, in name order.
    pub fn get_extensions(&self, point: &str) -> Result<Vec<RegisteredExtension>, RegistryError> {
        let state = self.state.read();
        let p = state
            .points
            .get(point)
            .ok_or_else(|| RegistryError::point_not_found(point))?;

        Ok(p.extensions
            .iter()
            .map(|(name, entry)| RegisteredExtension {
                name: name.clone(),
                owner_id: entry.owner_id.clone(),
                contract: p.contract.clone(),
                instance: entry.instance.clone(),
            })
            .collect())
    }

    /// Extensions at a point owned by `owner`, in name order.
    pub fn get_extensions_by_owner(
        &self,
        point: &str,
        owner: &str,
    ) -> Result<Vec<RegisteredExtension>, RegistryError> {
        let mut extensions = self.get_extensions(point)?;
        extensions.retain(|e| e.owner_id.as_deref() == Some(owner));
        Ok(extensions)
    }

    // -----------------------------------------------------------------------
    // Resolution
    // -----------------------------------------------------------------------

    /// Point-in-time snapshot of the dependency graph.
    ///
    /// Mutations after the snapshot is taken are not reflected in it;
    /// re-snapshot if you need fresh ordering.
    pub fn graph_snapshot(&self) -> GraphSnapshot {
        let state = self.state.read();
        GraphSnapshot::from_components(
            state
                .components
                .iter()
                .map(|(id, r)| (id.clone(), r.dependencies.clone())),
        )
    }

    /// Resolve an initialization order from the current graph, logging any
    /// missing-dependency warnings.
    pub fn resolve(&self) -> Result<Resolution, RegistryError> {
        let resolution = resolver::resolve(&self.graph_snapshot())?;
        for warning in resolution.warnings() {
            warn!("{warning}");
        }
        Ok(resolution)
    }

    // -----------------------------------------------------------------------
    // Internal accessors for the orchestrator and export gate
    // -----------------------------------------------------------------------

    pub(crate) fn handle_of(&self, id: &str) -> Option<Arc<dyn Component>> {
        self.state.read().components.get(id).map(|r| r.handle.clone())
    }

    /// Handles for `order`, skipping ids removed since the snapshot.
    pub(crate) fn handles_for(&self, order: &[String]) -> Vec<(String, Arc<dyn Component>)> {
        let state = self.state.read();
        order
            .iter()
            .filter_map(|id| match state.components.get(id) {
                Some(r) => Some((id.clone(), r.handle.clone())),
                None => {
                    warn!(component = %id, "component removed between resolution and orchestration, skipping");
                    None
                }
            })
            .collect()
    }

    pub(crate) fn info_and_handle(&self, id: &str) -> Option<(ComponentInfo, Arc<dyn Component>)> {
        self.state
            .read()
            .components
            .get(id)
            .map(|r| (r.info(), r.handle.clone()))
    }

    /// `(point, name, contract)` for every extension pair owned by `owner`.
    pub(crate) fn owned_extensions(&self, owner: &str) -> Vec<(String, String, String)> {
        let state = self.state.read();
        state
            .ownership
            .extensions_of(owner)
            .into_iter()
            .filter_map(|(point, name)| {
                state
                    .points
                    .get(&point)
                    .map(|p| (point.clone(), name, p.contract.clone()))
            })
            .collect()
    }

    pub(crate) fn insert_restored(&self, record: ComponentRecord) {
        let mut guard = self.state.write();
        let state = &mut *guard;

        if let Some(existing) = state.components.get(&record.id)
            && let Some(owner) = existing.owner_id.clone()
        {
            state.ownership.detach_component(&owner, &record.id);
        }
        if let Some(owner) = record.owner_id.as_deref() {
            state.ownership.attach_component(owner, &record.id);
        }
        state.components.insert(record.id.clone(), record);
    }
}
