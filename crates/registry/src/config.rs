//! Configuration source collaborator.
//!
//! An external config source supplies per-component configuration blobs
//! keyed by component id. The registry applies a blob by invoking the
//! component's `Configure` capability immediately after registration;
//! components without the capability are left alone.

use serde_json::Value as JsonValue;

/// Supplier of per-component configuration blobs.
///
/// Lookups must not block: this is consulted inline during registration.
/// Anything that needs I/O should be loaded ahead of time by the
/// collaborator that implements this.
pub trait ConfigSource: Send + Sync {
    /// Configuration blob for `id`, or `None` if the source has nothing
    /// for this component.
    fn config_for(&self, id: &str) -> Option<JsonValue>;
}
