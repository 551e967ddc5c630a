//! Extension points and their registered instances.
//!
//! An extension point declares a contract by name; extensions are admitted
//! only if they produce a capability object for that contract. Points keep
//! their extensions keyed by name with deterministic iteration order.

use std::collections::BTreeMap;
use std::sync::Arc;

use telaio_sdk::Extension;

/// Validate a point or extension name: non-empty, alphanumeric/underscore/
/// hyphen, starts with a letter or underscore, max 64 chars.
pub(crate) fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= 64
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        && name.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_')
}

/// One extension registered at a point.
#[derive(Clone)]
pub(crate) struct ExtensionEntry {
    pub instance: Arc<dyn Extension>,
    pub owner_id: Option<String>,
}

/// A named extension point with its declared contract and extensions.
#[derive(Clone)]
pub(crate) struct ExtensionPoint {
    pub contract: String,
    pub extensions: BTreeMap<String, ExtensionEntry>,
}

impl ExtensionPoint {
    pub fn new(contract: impl Into<String>) -> Self {
        Self {
            contract: contract.into(),
            extensions: BTreeMap::new(),
        }
    }
}

/// Read model for one extension at a point, including the live instance so
/// callers can invoke its contract capability.
#[derive(Clone)]
pub struct RegisteredExtension {
    /// Extension name, unique within its point.
    pub name: String,
    /// Owning tenant, `None` for system-owned.
    pub owner_id: Option<String>,
    /// The contract declared by the point this extension is registered at.
    pub contract: String,
    /// The live extension instance.
    pub instance: Arc<dyn Extension>,
}

impl std::fmt::Debug for RegisteredExtension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisteredExtension")
            .field("name", &self.name)
            .field("owner_id", &self.owner_id)
            .field("contract", &self.contract)
            .finish_non_exhaustive()
    }
}
