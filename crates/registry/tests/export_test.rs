#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Integration tests for export gating, snapshots, and owner bundles.
//!
//! ## Test Coverage
//!
//! - `NotExportable` gating and the flag flip via re-registration
//! - Snapshot contents, including captured state blobs
//! - Owner bundles skipping non-exportable components
//! - Serializability of everything handed to the packager

use std::sync::Arc;

use semver::Version;
use telaio_registry::{
    ComponentRecord, ExportGate, ExportSnapshot, Registry, RegistryConfig, RegistryError,
};
use telaio_test_utils::{init_test_logging, probe_extension, scripted_component};

fn registry() -> Arc<Registry> {
    init_test_logging();
    Arc::new(Registry::new(RegistryConfig::default()))
}

fn record(id: &str) -> ComponentRecord {
    ComponentRecord::new(id, Version::new(1, 0, 0), Arc::new(scripted_component(id)))
}

#[tokio::test]
async fn snapshot_requires_the_exportable_flag() {
    let registry = registry();
    registry.register(record("cache")).await.unwrap();

    let gate = ExportGate::new(registry.clone());
    assert!(matches!(
        gate.export_snapshot("cache"),
        Err(RegistryError::NotExportable { .. })
    ));

    // Flip the flag by re-registering; the same call now succeeds.
    registry.register(record("cache").exportable()).await.unwrap();
    let snapshot = gate.export_snapshot("cache").unwrap();
    assert_eq!(snapshot.id, "cache");

    assert!(matches!(
        gate.export_snapshot("ghost"),
        Err(RegistryError::NotFound { .. })
    ));
}

#[tokio::test]
async fn snapshot_carries_metadata_and_captured_state() {
    let registry = registry();
    registry
        .register(
            ComponentRecord::new(
                "indexer",
                Version::new(2, 0, 1),
                Arc::new(
                    scripted_component("indexer")
                        .with_state(serde_json::json!({"documents": 42})),
                ),
            )
            .with_description("Builds the search index")
            .with_dependencies(["store"])
            .with_tag("search")
            .with_owner("tenant1")
            .exportable(),
        )
        .await
        .unwrap();

    let gate = ExportGate::new(registry);
    let snapshot = gate.export_snapshot("indexer").unwrap();

    assert_eq!(snapshot.version, Version::new(2, 0, 1));
    assert_eq!(snapshot.description, "Builds the search index");
    assert_eq!(snapshot.dependencies, vec!["store"]);
    assert!(snapshot.tags.contains("search"));
    assert_eq!(snapshot.owner_id.as_deref(), Some("tenant1"));
    assert_eq!(snapshot.state, Some(serde_json::json!({"documents": 42})));
}

#[tokio::test]
async fn snapshot_without_capture_capability_has_no_state() {
    let registry = registry();
    registry.register(record("cache").exportable()).await.unwrap();

    let gate = ExportGate::new(registry);
    let snapshot = gate.export_snapshot("cache").unwrap();
    assert!(snapshot.state.is_none());

    // The packager-facing JSON omits the field entirely.
    let json = serde_json::to_value(&snapshot).unwrap();
    assert!(json.get("state").is_none());
}

#[tokio::test]
async fn list_exportable_spans_all_owners() {
    let registry = registry();
    registry
        .register(record("b-comp").with_owner("tenant1").exportable())
        .await
        .unwrap();
    registry
        .register(record("a-comp").with_owner("tenant2").exportable())
        .await
        .unwrap();
    registry.register(record("internal")).await.unwrap();

    let gate = ExportGate::new(registry);
    assert_eq!(gate.list_exportable(), vec!["a-comp", "b-comp"]);
}

#[tokio::test]
async fn owner_bundle_skips_non_exportable_components() {
    let registry = registry();
    registry
        .register(record("public").with_owner("tenant1").exportable())
        .await
        .unwrap();
    registry
        .register(record("private").with_owner("tenant1"))
        .await
        .unwrap();

    registry.register_point("render", "renderer").unwrap();
    registry
        .add_extension(
            "render",
            "markdown",
            Arc::new(probe_extension(&["renderer"])),
            Some("tenant1"),
        )
        .unwrap();

    let gate = ExportGate::new(registry);
    let bundle = gate.export_owner_bundle("tenant1");

    assert_eq!(bundle.owner_id, "tenant1");
    // "private" is silently skipped, not an error.
    assert_eq!(bundle.components.len(), 1);
    assert_eq!(bundle.components[0].id, "public");
    assert_eq!(bundle.extensions.len(), 1);
    assert_eq!(bundle.extensions[0].point, "render");
    assert_eq!(bundle.extensions[0].name, "markdown");
    assert_eq!(bundle.extensions[0].contract, "renderer");
}

#[tokio::test]
async fn unknown_owner_bundle_is_empty_not_an_error() {
    let registry = registry();
    let gate = ExportGate::new(registry);

    let bundle = gate.export_owner_bundle("nobody");
    assert!(bundle.components.is_empty());
    assert!(bundle.extensions.is_empty());
}

#[tokio::test]
async fn bundle_round_trips_through_json() {
    let registry = registry();
    registry
        .register(record("public").with_owner("tenant1").exportable())
        .await
        .unwrap();

    let gate = ExportGate::new(registry);
    let bundle = gate.export_owner_bundle("tenant1");

    let json = serde_json::to_string(&bundle).unwrap();
    let parsed: telaio_registry::OwnerBundle = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed.owner_id, "tenant1");
    assert_eq!(parsed.components.len(), 1);

    let snapshot_json = serde_json::to_string(&bundle.components[0]).unwrap();
    let parsed_snapshot: ExportSnapshot = serde_json::from_str(&snapshot_json).unwrap();
    assert_eq!(parsed_snapshot.id, "public");
}
