//! Component records and their read models.
//!
//! [`ComponentRecord`] is what callers hand to `register`; the registry
//! owns it exclusively afterwards. [`ComponentInfo`] is the handle-free
//! view returned by read operations.

use std::collections::BTreeSet;
use std::sync::Arc;

use semver::Version;
use serde::{Deserialize, Serialize};
use telaio_sdk::Component;

/// Owner id reserved for system-owned components.
///
/// Registering with this owner is equivalent to registering with no owner.
pub const SYSTEM_OWNER: &str = "system";

/// Normalize an owner id: `None` and `"system"` both mean system-owned.
pub(crate) fn normalize_owner(owner: Option<&str>) -> Option<String> {
    match owner {
        None => None,
        Some(SYSTEM_OWNER) => None,
        Some(o) => Some(o.to_string()),
    }
}

/// A component registration: identity, declared dependencies, ownership and
/// export flags, and the live instance handle.
#[derive(Clone)]
pub struct ComponentRecord {
    /// Unique id, immutable once registered.
    pub id: String,

    /// Semantic version of the component.
    pub version: Version,

    /// Human-readable description.
    pub description: String,

    /// Ids of components that must initialize before this one.
    ///
    /// May name ids that are not registered yet; late binding is allowed
    /// and surfaces as a registration warning.
    pub dependencies: Vec<String>,

    /// Capability tags for lookup.
    pub tags: BTreeSet<String>,

    /// Owning tenant, `None` for system-owned.
    pub owner_id: Option<String>,

    /// Whether this component may leave the system through the export gate.
    pub exportable: bool,

    /// Live instance handle, exclusively owned by the registry while
    /// registered.
    pub handle: Arc<dyn Component>,

    /// Unix timestamp of first registration under this id.
    pub registered_at: i64,

    /// Unix timestamp of the last mutation (re-registration or transfer).
    pub updated_at: i64,
}

impl ComponentRecord {
    /// Create a record with the given identity and handle.
    ///
    /// Timestamps are filled in by the registry at registration time.
    pub fn new(id: impl Into<String>, version: Version, handle: Arc<dyn Component>) -> Self {
        Self {
            id: id.into(),
            version,
            description: String::new(),
            dependencies: Vec::new(),
            tags: BTreeSet::new(),
            owner_id: None,
            exportable: false,
            handle,
            registered_at: 0,
            updated_at: 0,
        }
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Declare dependencies on other component ids.
    pub fn with_dependencies<I, S>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies = deps.into_iter().map(Into::into).collect();
        self
    }

    /// Add a capability tag.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    /// Set the owning tenant.
    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner_id = Some(owner.into());
        self
    }

    /// Mark the component as eligible for export.
    pub fn exportable(mut self) -> Self {
        self.exportable = true;
        self
    }

    /// Handle-free view of this record.
    pub(crate) fn info(&self) -> ComponentInfo {
        ComponentInfo {
            id: self.id.clone(),
            version: self.version.clone(),
            description: self.description.clone(),
            dependencies: self.dependencies.clone(),
            tags: self.tags.clone(),
            owner_id: self.owner_id.clone(),
            exportable: self.exportable,
            registered_at: self.registered_at,
            updated_at: self.updated_at,
        }
    }
}

impl std::fmt::Debug for ComponentRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentRecord")
            .field("id", &self.id)
            .field("version", &self.version)
            .field("dependencies", &self.dependencies)
            .field("owner_id", &self.owner_id)
            .field("exportable", &self.exportable)
            .finish_non_exhaustive()
    }
}

/// Read model for a registered component. Never exposes the handle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentInfo {
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

/// Filter for `Registry::list`.
///
/// All set fields must match; an empty filter matches everything.
#[derive(Debug, Clone, Default)]
pub struct ListFilter {
    owner: Option<String>,
    tag: Option<String>,
    exportable: Option<bool>,
}

impl ListFilter {
    /// Match only components owned by `owner`.
    pub fn owned_by(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    /// Match only components carrying `tag`.
    pub fn tagged(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Match on the exportable flag.
    pub fn exportable(mut self, exportable: bool) -> Self {
        self.exportable = Some(exportable);
        self
    }

    pub(crate) fn matches(&self, info: &ComponentInfo) -> bool {
        if let Some(owner) = &self.owner
            && info.owner_id.as_deref() != Some(owner.as_str())
        {
            return false;
        }
        if let Some(tag) = &self.tag
            && !info.tags.contains(tag)
        {
            return false;
        }
        if let Some(exportable) = self.exportable
            && info.exportable != exportable
        {
            return false;
        }
        true
    }
}
