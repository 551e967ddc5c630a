#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Integration tests for dependency resolution and lifecycle orchestration.
//!
//! ## Test Coverage
//!
//! - Deterministic resolution over an unchanged graph
//! - Cycle detection naming every node in the cycle
//! - Init order honoring chains and diamonds; shutdown as exact reverse
//! - Best-effort init/shutdown with accumulated failures
//! - Cooperative cancellation between component steps
//! - On-demand health probes

use std::sync::Arc;

use semver::Version;
use telaio_registry::{
    ComponentRecord, Orchestrator, Registry, RegistryConfig, RegistryError, RunState,
};
use telaio_test_utils::{Journal, ScriptedComponent, init_test_logging, scripted_component};
use tokio_util::sync::CancellationToken;

fn registry() -> Arc<Registry> {
    init_test_logging();
    Arc::new(Registry::new(RegistryConfig::default()))
}

async fn register(
    registry: &Registry,
    component: ScriptedComponent,
    id: &str,
    deps: &[&str],
) {
    registry
        .register(
            ComponentRecord::new(id, Version::new(1, 0, 0), Arc::new(component))
                .with_dependencies(deps.iter().copied()),
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn resolution_is_deterministic_over_unchanged_graph() {
    let registry = registry();
    for (id, deps) in [
        ("web", vec!["cache", "auth"]),
        ("auth", vec!["store"]),
        ("cache", vec!["store"]),
        ("store", vec![]),
        ("metrics", vec![]),
    ] {
        register(&registry, scripted_component(id), id, &deps).await;
    }

    let first = registry.resolve().unwrap();
    let second = registry.resolve().unwrap();
    assert_eq!(first.init_order(), second.init_order());
    assert_eq!(first.shutdown_order(), second.shutdown_order());
}

#[tokio::test]
async fn three_cycle_fails_naming_all_ids() {
    let registry = registry();
    register(&registry, scripted_component("a"), "a", &["b"]).await;
    register(&registry, scripted_component("b"), "b", &["c"]).await;
    register(&registry, scripted_component("c"), "c", &["a"]).await;

    match registry.resolve() {
        Err(RegistryError::CircularDependency { cycle }) => {
            for id in ["a", "b", "c"] {
                assert!(cycle.contains(&id.to_string()), "cycle missing '{id}'");
            }
        }
        other => panic!("expected CircularDependency, got {other:?}"),
    }
}

#[tokio::test]
async fn cycle_fails_the_run_before_any_side_effect() {
    let registry = registry();
    let journal = Journal::new();
    register(
        &registry,
        scripted_component("a").with_journal(&journal),
        "a",
        &["b"],
    )
    .await;
    register(
        &registry,
        scripted_component("b").with_journal(&journal),
        "b",
        &["a"],
    )
    .await;

    let orchestrator = Orchestrator::new(registry);
    let result = orchestrator
        .initialize_all(&CancellationToken::new())
        .await;

    assert!(matches!(
        result,
        Err(RegistryError::CircularDependency { .. })
    ));
    assert!(journal.entries().is_empty(), "no initialize may run");
}

#[tokio::test]
async fn diamond_initializes_dependencies_first() {
    let registry = registry();
    let journal = Journal::new();
    // a depends on b and c, both depend on d.
    register(
        &registry,
        scripted_component("d").with_journal(&journal),
        "d",
        &[],
    )
    .await;
    register(
        &registry,
        scripted_component("b").with_journal(&journal),
        "b",
        &["d"],
    )
    .await;
    register(
        &registry,
        scripted_component("c").with_journal(&journal),
        "c",
        &["d"],
    )
    .await;
    register(
        &registry,
        scripted_component("a").with_journal(&journal),
        "a",
        &["b", "c"],
    )
    .await;

    let orchestrator = Orchestrator::new(registry);
    let report = orchestrator
        .initialize_all(&CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.state, RunState::Ready);
    assert!(report.is_fully_successful());
    // Lexicographic tie-breaking makes the full order exact.
    assert_eq!(
        journal.entries(),
        ["init:d", "init:b", "init:c", "init:a"]
    );

    let report = orchestrator
        .shutdown_all(&CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(report.state, RunState::Stopped);
    assert_eq!(
        journal.entries()[4..],
        ["terminate:a", "terminate:c", "terminate:b", "terminate:d"]
    );
}

#[tokio::test]
async fn chain_orders_dependency_before_dependent() {
    let registry = registry();
    let journal = Journal::new();
    register(
        &registry,
        scripted_component("api").with_journal(&journal),
        "api",
        &["db"],
    )
    .await;
    register(
        &registry,
        scripted_component("db").with_journal(&journal),
        "db",
        &[],
    )
    .await;

    let orchestrator = Orchestrator::new(registry);
    orchestrator
        .initialize_all(&CancellationToken::new())
        .await
        .unwrap();

    assert!(journal.position("init:db").unwrap() < journal.position("init:api").unwrap());
}

#[tokio::test]
async fn middle_failure_does_not_stop_the_walk() {
    let registry = registry();
    let journal = Journal::new();
    register(
        &registry,
        scripted_component("first").with_journal(&journal),
        "first",
        &[],
    )
    .await;
    register(
        &registry,
        scripted_component("middle")
            .with_journal(&journal)
            .failing_init(),
        "middle",
        &["first"],
    )
    .await;
    register(
        &registry,
        scripted_component("last").with_journal(&journal),
        "last",
        &["middle"],
    )
    .await;

    let orchestrator = Orchestrator::new(registry);
    let report = orchestrator
        .initialize_all(&CancellationToken::new())
        .await
        .unwrap();

    // All three got their initialize call.
    assert_eq!(
        journal.entries(),
        ["init:first", "init:middle", "init:last"]
    );
    // Exactly one failure reported, and the run still reached Ready.
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].id, "middle");
    assert_eq!(report.completed, vec!["first", "last"]);
    assert_eq!(report.state, RunState::Ready);
    assert!(!report.is_fully_successful());
}

#[tokio::test]
async fn shutdown_failure_does_not_block_later_components() {
    let registry = registry();
    let journal = Journal::new();
    register(
        &registry,
        scripted_component("base").with_journal(&journal),
        "base",
        &[],
    )
    .await;
    register(
        &registry,
        scripted_component("top")
            .with_journal(&journal)
            .failing_terminate(),
        "top",
        &["base"],
    )
    .await;

    let orchestrator = Orchestrator::new(registry);
    let report = orchestrator
        .shutdown_all(&CancellationToken::new())
        .await
        .unwrap();

    // "top" shuts down first (reverse order) and fails; "base" still runs.
    assert_eq!(journal.entries(), ["terminate:top", "terminate:base"]);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].id, "top");
    assert_eq!(report.state, RunState::Stopped);
}

#[tokio::test]
async fn component_without_init_capability_counts_as_completed() {
    let registry = registry();
    let journal = Journal::new();
    register(
        &registry,
        scripted_component("passive")
            .with_journal(&journal)
            .without_init(),
        "passive",
        &[],
    )
    .await;

    let orchestrator = Orchestrator::new(registry);
    let report = orchestrator
        .initialize_all(&CancellationToken::new())
        .await
        .unwrap();

    assert!(journal.entries().is_empty());
    assert_eq!(report.completed, vec!["passive"]);
    assert!(report.is_fully_successful());
}

#[tokio::test]
async fn cancellation_stops_between_steps() {
    let registry = registry();
    let journal = Journal::new();
    register(
        &registry,
        scripted_component("a").with_journal(&journal),
        "a",
        &[],
    )
    .await;
    register(
        &registry,
        scripted_component("b").with_journal(&journal),
        "b",
        &[],
    )
    .await;

    let cancel = CancellationToken::new();
    cancel.cancel();

    let orchestrator = Orchestrator::new(registry);
    let report = orchestrator.initialize_all(&cancel).await.unwrap();

    assert!(report.cancelled);
    assert_eq!(report.state, RunState::Initializing);
    assert!(report.attempted.is_empty());
    assert!(journal.entries().is_empty());
}

#[tokio::test]
async fn health_probe_defaults_to_healthy_without_capability() {
    let registry = registry();
    register(&registry, scripted_component("plain"), "plain", &[]).await;
    register(
        &registry,
        scripted_component("sick").with_health(false),
        "sick",
        &[],
    )
    .await;
    register(
        &registry,
        scripted_component("fit").with_health(true),
        "fit",
        &[],
    )
    .await;

    let orchestrator = Orchestrator::new(registry);
    assert!(orchestrator.check_health("plain").await.unwrap());
    assert!(!orchestrator.check_health("sick").await.unwrap());
    assert!(orchestrator.check_health("fit").await.unwrap());
    assert!(matches!(
        orchestrator.check_health("ghost").await,
        Err(RegistryError::NotFound { .. })
    ));
}
