//! Registry error types with clear, actionable messages.
//!
//! All errors name the component, point, or extension involved so callers
//! can identify the offending registration without digging through logs.

use thiserror::Error;

/// Errors returned by registry operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Unknown component id, extension point, or extension name.
    #[error("{entity} '{name}' is not registered")]
    NotFound { entity: &'static str, name: String },

    /// Strict-mode registration over an existing id.
    #[error("component '{id}' is already registered and strict mode forbids replacement")]
    AlreadyExists { id: String },

    /// Circular dependency detected at resolution time.
    ///
    /// `cycle` holds the full path, closed back on its first node, e.g.
    /// `["a", "b", "c", "a"]`.
    #[error("circular dependency detected: {}", cycle.join(" -> "))]
    CircularDependency { cycle: Vec<String> },

    /// Extension does not satisfy the point's declared contract.
    #[error(
        "extension '{extension}' does not satisfy contract '{contract}' declared by point '{point}'"
    )]
    ContractViolation {
        point: String,
        extension: String,
        contract: String,
    },

    /// Export requested on a component that is not flagged exportable.
    #[error("component '{id}' is not flagged exportable")]
    NotExportable { id: String },

    /// Ownership transfer requested by a caller that is not the current owner.
    #[error("component '{id}' is owned by '{owner}', not by requester '{requester}'")]
    OwnershipConflict {
        id: String,
        owner: String,
        requester: String,
    },

    /// Name fails the registry naming rules.
    #[error(
        "{entity} name '{name}' is invalid: names are alphanumeric/underscore/hyphen, \
         start with a letter or underscore, max 64 chars"
    )]
    InvalidName { entity: &'static str, name: String },

    /// Version string is not a valid semantic version.
    #[error("component '{id}': version '{version}' is not a valid semantic version: {details}")]
    InvalidVersion {
        id: String,
        version: String,
        details: String,
    },

    /// Durable backing store failure during persist/restore.
    #[error("backing store {operation} failed: {details}")]
    Persistence { operation: String, details: String },
}

impl RegistryError {
    /// Create a component-not-found error.
    pub fn component_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: "component",
            name: id.into(),
        }
    }

    /// Create an extension-point-not-found error.
    pub fn point_not_found(point: impl Into<String>) -> Self {
        Self::NotFound {
            entity: "extension point",
            name: point.into(),
        }
    }

    /// Create an extension-not-found error.
    pub fn extension_not_found(point: &str, name: &str) -> Self {
        Self::NotFound {
            entity: "extension",
            name: format!("{point}/{name}"),
        }
    }

    /// Create an invalid-version error from a semver parse failure.
    pub fn invalid_version(id: impl Into<String>, version: impl Into<String>, err: &semver::Error) -> Self {
        Self::InvalidVersion {
            id: id.into(),
            version: version.into(),
            details: err.to_string(),
        }
    }

    /// Create a persistence error from an opaque store failure.
    pub fn persistence(operation: impl Into<String>, err: &anyhow::Error) -> Self {
        Self::Persistence {
            operation: operation.into(),
            details: format!("{err:#}"),
        }
    }
}
