//! Dependency resolution over a snapshot of the component graph.
//!
//! Pure functions: build a directed graph from declared dependencies,
//! detect cycles, and produce a deterministic initialization order with
//! dependencies before dependents. Shutdown order is the exact reverse of
//! the initialization order, never recomputed.
//!
//! Resolution always operates on a snapshot taken at call time; nothing is
//! cached across registry mutations. Callers that need a stable order for
//! a batch of operations must take one [`Resolution`] and reuse it.

use std::collections::BTreeMap;

use crate::error::RegistryError;

/// Point-in-time view of the dependency graph: id → declared dependencies.
///
/// Dependencies may name ids absent from the snapshot; those become
/// [`ResolutionWarning::MissingDependency`] entries rather than edges.
#[derive(Debug, Clone, Default)]
pub struct GraphSnapshot {
    nodes: BTreeMap<String, Vec<String>>,
}

impl GraphSnapshot {
    /// Build a snapshot from `(id, dependencies)` pairs.
    pub fn from_components<I, S, D>(components: I) -> Self
    where
        I: IntoIterator<Item = (S, D)>,
        S: Into<String>,
        D: IntoIterator<Item = S>,
    {
        let nodes = components
            .into_iter()
            .map(|(id, deps)| (id.into(), deps.into_iter().map(Into::into).collect()))
            .collect();
        Self { nodes }
    }

    /// Number of components in the snapshot.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the snapshot is empty.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// A non-fatal finding produced during resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionWarning {
    /// A component depends on an id that is not currently registered.
    /// No edge is added; late binding is allowed.
    MissingDependency { component: String, dependency: String },
}

impl std::fmt::Display for ResolutionWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingDependency {
                component,
                dependency,
            } => write!(
                f,
                "component '{component}' depends on '{dependency}' which is not registered"
            ),
        }
    }
}

/// Result of a successful resolution: a deterministic initialization order
/// and any warnings gathered while building the graph.
#[derive(Debug, Clone)]
pub struct Resolution {
    init_order: Vec<String>,
    warnings: Vec<ResolutionWarning>,
}

impl Resolution {
    /// Initialization order: every dependency precedes its dependents.
    pub fn init_order(&self) -> &[String] {
        &self.init_order
    }

    /// Shutdown order: the exact reverse of the initialization order.
    pub fn shutdown_order(&self) -> Vec<String> {
        self.init_order.iter().rev().cloned().collect()
    }

    /// Warnings gathered while building the graph.
    pub fn warnings(&self) -> &[ResolutionWarning] {
        &self.warnings
    }
}

/// DFS node state for cycle detection.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    InProgress,
    Done,
}

/// Resolve an initialization order for the snapshot.
///
/// Iteration over nodes and edges is lexicographic, so repeated resolution
/// of an unchanged graph yields byte-identical output.
///
/// # Errors
///
/// Returns [`RegistryError::CircularDependency`] naming the full cycle path
/// if the graph (restricted to registered ids) contains a cycle.
pub fn resolve(snapshot: &GraphSnapshot) -> Result<Resolution, RegistryError> {
    let mut warnings = Vec::new();

    // Edge lists restricted to registered ids, sorted and deduplicated so
    // traversal order is deterministic.
    let mut edges: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for (id, deps) in &snapshot.nodes {
        let mut registered: Vec<&str> = Vec::with_capacity(deps.len());
        for dep in deps {
            if snapshot.nodes.contains_key(dep) {
                registered.push(dep.as_str());
            } else {
                warnings.push(ResolutionWarning::MissingDependency {
                    component: id.clone(),
                    dependency: dep.clone(),
                });
            }
        }
        registered.sort_unstable();
        registered.dedup();
        edges.insert(id.as_str(), registered);
    }

    let mut marks: BTreeMap<&str, Mark> = edges.keys().map(|id| (*id, Mark::Unvisited)).collect();
    let mut order: Vec<String> = Vec::with_capacity(edges.len());
    let mut path: Vec<&str> = Vec::new();

    // Post-order over dependency edges emits dependencies first, which is
    // the initialization order directly.
    fn visit<'a>(
        node: &'a str,
        edges: &BTreeMap<&'a str, Vec<&'a str>>,
        marks: &mut BTreeMap<&'a str, Mark>,
        path: &mut Vec<&'a str>,
        order: &mut Vec<String>,
    ) -> Result<(), RegistryError> {
        marks.insert(node, Mark::InProgress);
        path.push(node);

        for &dep in &edges[node] {
            match marks[dep] {
                Mark::Done => {}
                Mark::InProgress => {
                    // Back-edge: the cycle is the path from the first
                    // occurrence of `dep`, closed back on itself.
                    let start = path.iter().position(|n| *n == dep).unwrap_or(0);
                    let mut cycle: Vec<String> =
                        path[start..].iter().map(|n| (*n).to_string()).collect();
                    cycle.push(dep.to_string());
                    return Err(RegistryError::CircularDependency { cycle });
                }
                Mark::Unvisited => visit(dep, edges, marks, path, order)?,
            }
        }

        path.pop();
        marks.insert(node, Mark::Done);
        order.push(node.to_string());
        Ok(())
    }

    let ids: Vec<&str> = edges.keys().copied().collect();
    for id in ids {
        if marks[id] == Mark::Unvisited {
            visit(id, &edges, &mut marks, &mut path, &mut order)?;
        }
    }

    Ok(Resolution {
        init_order: order,
        warnings,
    })
}
