//! Extension instance trait.
//!
//! Extension points declare a contract by name; an instance is accepted at
//! a point only if it can produce a capability object for that contract.
//! This is an inspection of what the instance implements, not an identity
//! check on its type.

use std::any::Any;

/// An instance registered at an extension point.
pub trait Extension: Send + Sync {
    /// Return the capability object for `contract`, or `None` if this
    /// extension does not implement it.
    ///
    /// Callers that know the concrete capability type behind a contract
    /// name downcast the returned `Any`. The registry itself only checks
    /// for `Some` when admitting an extension to a point.
    fn capability(&self, contract: &str) -> Option<&dyn Any>;
}
