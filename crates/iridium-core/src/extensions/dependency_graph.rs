//! Extension dependency graph construction and queries.
//!
//! Builds the directed graph of required dependencies among registered
//! extensions, detects cycles, and produces deterministic topological
//! orderings for bulk lifecycle operations.

use std::collections::{HashMap, HashSet};
use thiserror::Error;

/// Dependency graph errors.
#[derive(Debug, Error)]
pub enum DependencyGraphError {
    /// Extension not found.
    #[error("extension not found: {0}")]
    ExtensionNotFound(String),

    /// Circular dependency detected. Carries the offending cycle path.
    #[error("Circular dependency detected: {}", .0.join(" -> "))]
    CircularDependency(Vec<String>),
}

/// Result type for graph operations.
pub type Result<T> = std::result::Result<T, DependencyGraphError>;

/// Dependency graph node.
#[derive(Debug, Clone)]
pub struct GraphNode {
    /// Extension id.
    pub id: String,
    /// Extension version.
    pub version: String,
    /// Required dependency ids, in declaration order.
    pub dependencies: Vec<String>,
}

/// Directed graph of required dependencies.
///
/// Node insertion order is preserved so traversals are deterministic: ties
/// among independent extensions resolve in registration order. Edges to ids
/// absent from the node set are kept; the loader reports them as missing
/// dependencies.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    /// Graph nodes (extension id -> node).
    nodes: HashMap<String, GraphNode>,
    /// Node ids in insertion order.
    order: Vec<String>,
    /// Reverse edges (extension id -> ids that depend on it).
    reverse_deps: HashMap<String, Vec<String>>,
}

impl DependencyGraph {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a graph from `(id, version, required dependency ids)` tuples.
    pub fn from_nodes(nodes: impl IntoIterator<Item = (String, String, Vec<String>)>) -> Self {
        let mut graph = Self::new();
        for (id, version, dependencies) in nodes {
            graph.insert(id, version, dependencies);
        }
        graph
    }

    /// Inserts a node, replacing any node with the same id.
    pub fn insert(&mut self, id: String, version: String, dependencies: Vec<String>) {
        if let Some(previous) = self.nodes.get(&id) {
            let stale: Vec<String> = previous.dependencies.clone();
            for dep in stale {
                if let Some(dependents) = self.reverse_deps.get_mut(&dep) {
                    dependents.retain(|d| d != &id);
                }
            }
        } else {
            self.order.push(id.clone());
        }

        for dep in &dependencies {
            self.reverse_deps.entry(dep.clone()).or_default().push(id.clone());
        }
        self.nodes.insert(id.clone(), GraphNode { id, version, dependencies });
    }

    /// Gets a node by id.
    pub fn get_node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.get(id)
    }

    /// Node ids in insertion order.
    pub fn ids(&self) -> &[String] {
        &self.order
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when the graph has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Ids of extensions that directly depend on `id`.
    pub fn dependents_of(&self, id: &str) -> &[String] {
        self.reverse_deps.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Transitive required dependencies of `id` (not including `id` itself).
    pub fn transitive_deps(&self, id: &str) -> HashSet<String> {
        let mut deps = HashSet::new();
        let mut to_process = vec![id.to_string()];

        while let Some(current) = to_process.pop() {
            if let Some(node) = self.nodes.get(&current) {
                for dep in &node.dependencies {
                    if deps.insert(dep.clone()) {
                        to_process.push(dep.clone());
                    }
                }
            }
        }

        deps
    }

    /// Detects circular dependencies.
    ///
    /// Returns every cycle found, each reconstructed as the path from the
    /// repeated node back to itself.
    pub fn detect_cycles(&self) -> Vec<Vec<String>> {
        let mut cycles = Vec::new();
        let mut visited = HashSet::new();
        let mut rec_stack = HashSet::new();
        let mut path = Vec::new();

        for id in &self.order {
            if !visited.contains(id) {
                self.dfs_cycle(id, &mut visited, &mut rec_stack, &mut path, &mut cycles);
            }
        }

        cycles
    }

    fn dfs_cycle(
        &self,
        node: &str,
        visited: &mut HashSet<String>,
        rec_stack: &mut HashSet<String>,
        path: &mut Vec<String>,
        cycles: &mut Vec<Vec<String>>,
    ) {
        visited.insert(node.to_string());
        rec_stack.insert(node.to_string());
        path.push(node.to_string());

        if let Some(node_data) = self.nodes.get(node) {
            for dep in &node_data.dependencies {
                if rec_stack.contains(dep) {
                    // Back edge: the cycle is the path from the repeated
                    // node to the current one, closed with the repeat.
                    let cycle_start = path.iter().position(|n| n == dep).unwrap_or(0);
                    let mut cycle = path[cycle_start..].to_vec();
                    cycle.push(dep.clone());
                    cycles.push(cycle);
                } else if !visited.contains(dep) {
                    self.dfs_cycle(dep, visited, rec_stack, path, cycles);
                }
            }
        }

        rec_stack.remove(node);
        path.pop();
    }

    /// Computes a deterministic topological order: every extension precedes
    /// all extensions that depend on it.
    ///
    /// Fails with [`DependencyGraphError::CircularDependency`] carrying the
    /// first offending cycle before producing any ordering.
    pub fn topological_sort(&self) -> Result<Vec<String>> {
        let cycles = self.detect_cycles();
        if let Some(cycle) = cycles.into_iter().next() {
            return Err(DependencyGraphError::CircularDependency(cycle));
        }

        let mut result = Vec::with_capacity(self.nodes.len());
        let mut visited = HashSet::new();

        for id in &self.order {
            if !visited.contains(id) {
                self.dfs_topological(id, &mut visited, &mut result);
            }
        }

        Ok(result)
    }

    fn dfs_topological(&self, node: &str, visited: &mut HashSet<String>, result: &mut Vec<String>) {
        visited.insert(node.to_string());

        if let Some(node_data) = self.nodes.get(node) {
            for dep in &node_data.dependencies {
                if !visited.contains(dep) && self.nodes.contains_key(dep) {
                    self.dfs_topological(dep, visited, result);
                }
            }
        }

        result.push(node.to_string());
    }

    /// Exports the graph to DOT format for diagnostics.
    pub fn to_dot(&self) -> String {
        let mut dot = String::from("digraph ExtensionDependencies {\n");
        dot.push_str("  rankdir=LR;\n");
        dot.push_str("  node [shape=box];\n\n");

        for id in &self.order {
            if let Some(node) = self.nodes.get(id) {
                dot.push_str(&format!(
                    "  \"{}\" [label=\"{}\\n{}\"];\n",
                    node.id, node.id, node.version
                ));
                for dep in &node.dependencies {
                    dot.push_str(&format!("  \"{}\" -> \"{}\";\n", node.id, dep));
                }
            }
        }

        dot.push_str("}\n");
        dot
    }
}
