//! Include Graph
//!
//! Directed graph of dialect files keyed by base filename, with an edge from
//! each file to every file it includes. The graph is kept acyclic: an include
//! that would close a cycle is rejected and leaves the graph as it was.
//!
//! [`resolver`] expands a seed set of dialects into the full include closure
//! and [`loader`] ties the gate, resolver and validators together.

pub mod loader;
pub mod resolver;

pub use loader::{collect_dialects, DialectLoader, ResolvedDialects};
pub use resolver::{
    absolutize, assign_dependencies, check_unique, resolve_include_path, IncludeResolver, Uniqueness,
};

use std::collections::HashMap;

use petgraph::algo::{is_cyclic_directed, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::{DfsPostOrder, EdgeRef};
use petgraph::Direction;

use crate::error::{DialectError, Result};

/// Include relationships between dialect files
#[derive(Debug, Clone, Default)]
pub struct IncludeGraph {
    graph: DiGraph<String, ()>,
    node_indices: HashMap<String, NodeIndex>,
}

impl IncludeGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file node; adding an existing filename is a no-op
    pub fn add_node(&mut self, filename: &str) -> NodeIndex {
        if let Some(&idx) = self.node_indices.get(filename) {
            return idx;
        }
        let idx = self.graph.add_node(filename.to_string());
        self.node_indices.insert(filename.to_string(), idx);
        idx
    }

    /// Record that `from` includes `to`.
    ///
    /// Fails with [`DialectError::CircularDependency`] if the edge would make
    /// the graph cyclic; the edge is not kept in that case.
    pub fn add_include(&mut self, from: &str, to: &str) -> Result<()> {
        let circular = || DialectError::CircularDependency {
            from: from.to_string(),
            to: to.to_string(),
        };
        if from == to {
            return Err(circular());
        }

        let source = self.add_node(from);
        let target = self.add_node(to);
        let edge = self.graph.update_edge(source, target, ());

        if is_cyclic_directed(&self.graph) {
            self.graph.remove_edge(edge);
            return Err(circular());
        }
        Ok(())
    }

    pub fn contains(&self, filename: &str) -> bool {
        self.node_indices.contains_key(filename)
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Filenames in sorted order
    pub fn nodes(&self) -> Vec<&str> {
        let mut nodes: Vec<&str> = self.node_indices.keys().map(String::as_str).collect();
        nodes.sort_unstable();
        nodes
    }

    /// Files directly included by `filename`, sorted
    pub fn includes(&self, filename: &str) -> Vec<&str> {
        self.neighbors(filename, Direction::Outgoing)
    }

    /// Files that directly include `filename`, sorted
    pub fn included_by(&self, filename: &str) -> Vec<&str> {
        self.neighbors(filename, Direction::Incoming)
    }

    fn neighbors(&self, filename: &str, direction: Direction) -> Vec<&str> {
        let Some(&idx) = self.node_indices.get(filename) else {
            return Vec::new();
        };
        let mut found: Vec<&str> = self
            .graph
            .neighbors_directed(idx, direction)
            .map(|n| self.graph[n].as_str())
            .collect();
        found.sort_unstable();
        found
    }

    /// Every file directly or transitively included by `filename`.
    ///
    /// Depth-first post-order, so a file's own includes come before it; the
    /// starting file is never part of the result.
    pub fn dependencies(&self, filename: &str) -> Vec<String> {
        let Some(&start) = self.node_indices.get(filename) else {
            return Vec::new();
        };

        let mut dfs = DfsPostOrder::new(&self.graph, start);
        let mut deps = Vec::new();
        while let Some(idx) = dfs.next(&self.graph) {
            if idx != start {
                deps.push(self.graph[idx].clone());
            }
        }
        deps
    }

    /// All `(includer, included)` pairs, sorted
    pub fn edges(&self) -> Vec<(&str, &str)> {
        let mut edges: Vec<(&str, &str)> = self
            .graph
            .edge_references()
            .map(|e| (self.graph[e.source()].as_str(), self.graph[e.target()].as_str()))
            .collect();
        edges.sort_unstable();
        edges
    }

    /// Files ordered so every file comes after everything it includes
    pub fn generation_order(&self) -> Vec<String> {
        match toposort(&self.graph, None) {
            Ok(order) => order.into_iter().rev().map(|idx| self.graph[idx].clone()).collect(),
            // unreachable while add_include keeps the graph acyclic
            Err(_) => Vec::new(),
        }
    }

    /// Export the include graph to GraphViz DOT format
    pub fn to_dot(&self) -> String {
        let mut output = String::new();
        output.push_str("digraph IncludeGraph {\n");
        output.push_str("  rankdir=LR;\n");
        output.push_str("  node [shape=box, style=rounded, fontname=\"Helvetica\", fontsize=10];\n");
        output.push('\n');

        for node in self.nodes() {
            let color = if self.included_by(node).is_empty() { "#2196F3" } else { "#9E9E9E" };
            output.push_str(&format!("  \"{}\" [color=\"{}\"];\n", node, color));
        }
        output.push('\n');

        for (from, to) in self.edges() {
            output.push_str(&format!("  \"{}\" -> \"{}\";\n", from, to));
        }
        output.push_str("}\n");
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph(edges: &[(&str, &str)]) -> IncludeGraph {
        let mut graph = IncludeGraph::new();
        for (from, to) in edges {
            graph.add_include(from, to).unwrap();
        }
        graph
    }

    #[test]
    fn test_self_include_is_circular() {
        let mut graph = IncludeGraph::new();
        graph.add_node("a.xml");
        assert!(matches!(
            graph.add_include("a.xml", "a.xml"),
            Err(DialectError::CircularDependency { .. })
        ));
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn test_cycle_edge_is_rolled_back() {
        let mut graph = graph(&[("a.xml", "b.xml"), ("b.xml", "c.xml")]);
        match graph.add_include("c.xml", "a.xml") {
            Err(DialectError::CircularDependency { from, to }) => {
                assert_eq!(from, "c.xml");
                assert_eq!(to, "a.xml");
            }
            other => panic!("Expected CircularDependency, got {:?}", other),
        }
        assert_eq!(graph.edge_count(), 2);
        assert!(graph.includes("c.xml").is_empty());
    }

    #[test]
    fn test_repeated_edge_is_kept_once() {
        let mut graph = graph(&[("a.xml", "b.xml")]);
        graph.add_include("a.xml", "b.xml").unwrap();
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn test_dependencies_diamond() {
        let graph = graph(&[
            ("top.xml", "left.xml"),
            ("top.xml", "right.xml"),
            ("left.xml", "base.xml"),
            ("right.xml", "base.xml"),
        ]);

        let mut deps = graph.dependencies("top.xml");
        assert_eq!(deps.len(), 3);
        // post-order: base precedes whichever branch reached it first
        assert_eq!(deps[0], "base.xml");
        deps.sort();
        assert_eq!(deps, vec!["base.xml", "left.xml", "right.xml"]);
        assert!(graph.dependencies("base.xml").is_empty());
        assert!(graph.dependencies("missing.xml").is_empty());
    }

    #[test]
    fn test_neighbors_and_order() {
        let graph = graph(&[("top.xml", "common.xml"), ("common.xml", "minimal.xml")]);
        assert_eq!(graph.includes("top.xml"), vec!["common.xml"]);
        assert_eq!(graph.included_by("minimal.xml"), vec!["common.xml"]);
        assert_eq!(graph.generation_order(), vec!["minimal.xml", "common.xml", "top.xml"]);
        assert_eq!(graph.nodes(), vec!["common.xml", "minimal.xml", "top.xml"]);
    }

    #[test]
    fn test_to_dot() {
        let graph = graph(&[("top.xml", "common.xml")]);
        let dot = graph.to_dot();
        assert!(dot.starts_with("digraph IncludeGraph {"));
        assert!(dot.contains("\"top.xml\" -> \"common.xml\";"));
        assert!(dot.trim_end().ends_with('}'));
    }
}
