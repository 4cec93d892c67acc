//! Dependency-cycle rejection over the linked graph.
//!
//! Every downstream lowering walks dependency edges to a fixpoint, so a
//! cycle would loop it; the graph fails fast instead, naming the cycle
//! path. Detection is DFS with the classic three-color marking.

use std::collections::HashMap;

use anyhow::Result;
use petgraph::graph::{DiGraph, NodeIndex};

use crate::core::error::PolybuildError;

/// Color states for cycle detection using DFS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    /// Node has not been visited.
    White,
    /// Node is currently on the DFS stack.
    Gray,
    /// Node has been fully visited.
    Black,
}

/// Directed graph over target full paths.
pub(crate) struct EdgeGraph {
    graph: DiGraph<String, ()>,
    node_map: HashMap<String, NodeIndex>,
}

impl EdgeGraph {
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            node_map: HashMap::new(),
        }
    }

    fn ensure_node(&mut self, full_path: &str) -> NodeIndex {
        if let Some(&index) = self.node_map.get(full_path) {
            index
        } else {
            let index = self.graph.add_node(full_path.to_string());
            self.node_map.insert(full_path.to_string(), index);
            index
        }
    }

    /// Records that `from` depends on `to`.
    pub fn add_dependency(&mut self, from: &str, to: &str) {
        let from_idx = self.ensure_node(from);
        let to_idx = self.ensure_node(to);
        if !self.graph.contains_edge(from_idx, to_idx) {
            self.graph.add_edge(from_idx, to_idx, ());
        }
    }

    /// Fails with [`PolybuildError::DependencyCycle`] if any cycle exists.
    pub fn detect_cycles(&self) -> Result<()> {
        let mut colors: HashMap<NodeIndex, Color> = HashMap::new();
        let mut path: Vec<NodeIndex> = Vec::new();

        for node in self.graph.node_indices() {
            colors.insert(node, Color::White);
        }

        for node in self.graph.node_indices() {
            if colors[&node] == Color::White {
                if let Some(cycle) = self.dfs_visit(node, &mut colors, &mut path) {
                    let cycle_str = cycle
                        .iter()
                        .map(|idx| self.graph[*idx].as_str())
                        .collect::<Vec<_>>()
                        .join(" -> ");
                    return Err(PolybuildError::DependencyCycle { cycle: cycle_str }.into());
                }
            }
        }
        Ok(())
    }

    fn dfs_visit(
        &self,
        node: NodeIndex,
        colors: &mut HashMap<NodeIndex, Color>,
        path: &mut Vec<NodeIndex>,
    ) -> Option<Vec<NodeIndex>> {
        colors.insert(node, Color::Gray);
        path.push(node);

        for neighbor in self.graph.neighbors(node) {
            match colors.get(&neighbor) {
                Some(Color::Gray) => {
                    // The cycle is the path suffix starting at the revisited
                    // node, closed by the node itself.
                    let start = path.iter().position(|idx| *idx == neighbor)?;
                    let mut cycle = path[start..].to_vec();
                    cycle.push(neighbor);
                    return Some(cycle);
                }
                Some(Color::White) => {
                    if let Some(cycle) = self.dfs_visit(neighbor, colors, path) {
                        return Some(cycle);
                    }
                }
                _ => {}
            }
        }

        path.pop();
        colors.insert(node, Color::Black);
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_has_no_cycle() {
        let mut graph = EdgeGraph::new();
        graph.add_dependency("//a:x", "//b:y");
        graph.add_dependency("//b:y", "//c:z");
        assert!(graph.detect_cycles().is_ok());
    }

    #[test]
    fn diamond_has_no_cycle() {
        let mut graph = EdgeGraph::new();
        graph.add_dependency("//a:x", "//b:y");
        graph.add_dependency("//a:x", "//c:z");
        graph.add_dependency("//b:y", "//d:w");
        graph.add_dependency("//c:z", "//d:w");
        assert!(graph.detect_cycles().is_ok());
    }

    #[test]
    fn mutual_dependency_is_reported_with_path() {
        let mut graph = EdgeGraph::new();
        graph.add_dependency("//a:x", "//b:y");
        graph.add_dependency("//b:y", "//a:x");
        let err = graph.detect_cycles().unwrap_err();
        match err.downcast_ref::<PolybuildError>() {
            Some(PolybuildError::DependencyCycle { cycle }) => {
                assert!(cycle.contains("//a:x"));
                assert!(cycle.contains("//b:y"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn self_dependency_is_a_cycle() {
        let mut graph = EdgeGraph::new();
        graph.add_dependency("//a:x", "//a:x");
        assert!(graph.detect_cycles().is_err());
    }

    #[test]
    fn duplicate_edges_collapse() {
        let mut graph = EdgeGraph::new();
        graph.add_dependency("//a:x", "//b:y");
        graph.add_dependency("//a:x", "//b:y");
        assert!(graph.detect_cycles().is_ok());
    }
}
