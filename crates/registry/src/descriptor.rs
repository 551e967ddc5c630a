//! Parser for component descriptor TOML.
//!
//! A descriptor declares a component's metadata out-of-band:
//! - name, version, description
//! - dependencies (components that must initialize first)
//! - tags, owner, exportable flag
//!
//! Pair a descriptor with a live handle via
//! `Registry::register_with_descriptor`.

use std::path::Path;

use anyhow::{Context, Result};
use semver::Version;
use serde::Deserialize;

/// Component metadata parsed from a descriptor file.
#[derive(Debug, Clone, Deserialize)]
pub struct ComponentDescriptor {
    /// Component machine name.
    pub name: String,

    /// Human-readable description.
    pub description: String,

    /// Semantic version (e.g., "1.0.0").
    pub version: String,

    /// Other components this one depends on (initialized first).
    #[serde(default)]
    pub dependencies: Vec<String>,

    /// Capability tags for lookup.
    #[serde(default)]
    pub tags: Vec<String>,

    /// Owning tenant; omitted or "system" means system-owned.
    #[serde(default)]
    pub owner: Option<String>,

    /// Whether the component may be exported.
    #[serde(default)]
    pub exportable: bool,
}

impl ComponentDescriptor {
    /// Parse a descriptor file from the given path.
    pub fn parse(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read component descriptor: {}", path.display()))?;

        Self::parse_str(&content, &path.display().to_string())
    }

    /// Parse a descriptor from a TOML string.
    ///
    /// `origin` names the source (a path or label) for error messages.
    pub fn parse_str(content: &str, origin: &str) -> Result<Self> {
        let descriptor: ComponentDescriptor = toml::from_str(content)
            .with_context(|| format!("failed to parse component descriptor TOML at {origin}"))?;

        descriptor.validate(origin)?;
        Ok(descriptor)
    }

    /// Parsed semantic version.
    ///
    /// Infallible after `validate` has passed.
    pub fn semver(&self) -> Result<Version> {
        Version::parse(&self.version).with_context(|| {
            format!(
                "component '{}' has invalid version '{}'",
                self.name, self.version
            )
        })
    }

    /// Validate the parsed descriptor.
    fn validate(&self, origin: &str) -> Result<()> {
        if self.name.is_empty() {
            anyhow::bail!("component descriptor at {origin} has empty 'name' field");
        }

        Version::parse(&self.version).with_context(|| {
            format!(
                "component '{}' at {} has invalid semantic version '{}'",
                self.name, origin, self.version
            )
        })?;

        if self.dependencies.iter().any(|d| d == &self.name) {
            anyhow::bail!(
                "component '{}' at {} declares a dependency on itself",
                self.name,
                origin
            );
        }

        Ok(())
    }
}

#[cfg(test)]
// Tests are allowed to use unwrap/expect freely.
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn parse_valid_descriptor() {
        let toml = r#"
name = "indexer"
description = "Builds the search index"
version = "1.2.0"
dependencies = ["store", "tokenizer"]
tags = ["search"]
owner = "tenant1"
exportable = true
"#;

        let d = ComponentDescriptor::parse_str(toml, "test.toml").unwrap();
        assert_eq!(d.name, "indexer");
        assert_eq!(d.version, "1.2.0");
        assert_eq!(d.dependencies, vec!["store", "tokenizer"]);
        assert_eq!(d.tags, vec!["search"]);
        assert_eq!(d.owner.as_deref(), Some("tenant1"));
        assert!(d.exportable);
        assert_eq!(d.semver().unwrap(), Version::new(1, 2, 0));
    }

    #[test]
    fn parse_minimal_descriptor() {
        let toml = r#"
name = "minimal"
description = "A minimal component"
version = "0.1.0"
"#;

        let d = ComponentDescriptor::parse_str(toml, "test.toml").unwrap();
        assert_eq!(d.name, "minimal");
        assert!(d.dependencies.is_empty());
        assert!(d.tags.is_empty());
        assert!(d.owner.is_none());
        assert!(!d.exportable);
    }

    #[test]
    fn reject_empty_name() {
        let toml = r#"
name = ""
description = "Empty name"
version = "1.0.0"
"#;

        let result = ComponentDescriptor::parse_str(toml, "test.toml");
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("empty 'name'"));
    }

    #[test]
    fn reject_invalid_version() {
        let toml = r#"
name = "bad"
description = "Not semver"
version = "one point oh"
"#;

        let result = ComponentDescriptor::parse_str(toml, "test.toml");
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("invalid semantic version")
        );
    }

    #[test]
    fn reject_self_dependency() {
        let toml = r#"
name = "ouroboros"
description = "Depends on itself"
version = "1.0.0"
dependencies = ["ouroboros"]
"#;

        let result = ComponentDescriptor::parse_str(toml, "test.toml");
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("itself"));
    }
}
