//! Derived ownership index.
//!
//! Maps an owner id to the component ids and `(point, extension)` pairs it
//! owns. This is a cached view over the metadata store and extension point
//! registry — never the source of truth — and can be rebuilt from them at
//! any time via [`OwnershipIndex::rebuild`].

use std::collections::{BTreeMap, BTreeSet};

/// Owner → owned entities, kept consistent on every register/remove/transfer.
#[derive(Debug, Clone, Default)]
pub struct OwnershipIndex {
    components: BTreeMap<String, BTreeSet<String>>,
    extensions: BTreeMap<String, BTreeSet<(String, String)>>,
}

impl OwnershipIndex {
    /// Record `id` as owned by `owner`.
    pub fn attach_component(&mut self, owner: &str, id: &str) {
        self.components
            .entry(owner.to_string())
            .or_default()
            .insert(id.to_string());
    }

    /// Drop `id` from `owner`'s set, removing the owner entry if empty.
    pub fn detach_component(&mut self, owner: &str, id: &str) {
        if let Some(set) = self.components.get_mut(owner) {
            set.remove(id);
            if set.is_empty() {
                self.components.remove(owner);
            }
        }
    }

    /// Move `id` between owners; either side may be unowned.
    pub fn move_component(&mut self, from: Option<&str>, to: Option<&str>, id: &str) {
        if let Some(owner) = from {
            self.detach_component(owner, id);
        }
        if let Some(owner) = to {
            self.attach_component(owner, id);
        }
    }

    /// Record `(point, name)` as owned by `owner`.
    pub fn attach_extension(&mut self, owner: &str, point: &str, name: &str) {
        self.extensions
            .entry(owner.to_string())
            .or_default()
            .insert((point.to_string(), name.to_string()));
    }

    /// Drop `(point, name)` from `owner`'s set.
    pub fn detach_extension(&mut self, owner: &str, point: &str, name: &str) {
        if let Some(set) = self.extensions.get_mut(owner) {
            set.remove(&(point.to_string(), name.to_string()));
            if set.is_empty() {
                self.extensions.remove(owner);
            }
        }
    }

    /// Component ids owned by `owner`; empty for unknown owners.
    pub fn components_of(&self, owner: &str) -> BTreeSet<String> {
        self.components.get(owner).cloned().unwrap_or_default()
    }

    /// `(point, extension)` pairs owned by `owner`; empty for unknown owners.
    pub fn extensions_of(&self, owner: &str) -> BTreeSet<(String, String)> {
        self.extensions.get(owner).cloned().unwrap_or_default()
    }

    /// Reconstruct the index from the source-of-truth data.
    ///
    /// `components` yields `(id, owner)` for every registered component;
    /// `extensions` yields `(point, name, owner)` for every registered
    /// extension. Entries with no owner contribute nothing.
    pub fn rebuild<'a>(
        components: impl IntoIterator<Item = (&'a str, Option<&'a str>)>,
        extensions: impl IntoIterator<Item = (&'a str, &'a str, Option<&'a str>)>,
    ) -> Self {
        let mut index = Self::default();
        for (id, owner) in components {
            if let Some(owner) = owner {
                index.attach_component(owner, id);
            }
        }
        for (point, name, owner) in extensions {
            if let Some(owner) = owner {
                index.attach_extension(owner, point, name);
            }
        }
        index
    }
}
