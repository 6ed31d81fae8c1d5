//! Call graph over the `order` edges of a lifecycle document.
//!
//! Nodes are qualified instances (`Parent.aboutToAppear`) in order of first
//! appearance. Each takes its scope and description from the function with
//! the same base name.

use std::collections::{HashMap, VecDeque};

use petgraph::algo::{astar, is_cyclic_directed};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use serde::Serialize;
use tracing::debug;

use crate::error::GraphError;
use crate::model::{LifecycleDocument, Scope};
use crate::normalize::base_name;

/// A qualified function instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallNode {
    /// Qualified name, e.g. `Child.aboutToAppear`
    pub instance: String,
    pub scope: Scope,
    pub description: String,
}

/// Summary of a call graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphStats {
    pub node_count: usize,
    pub edge_count: usize,
    pub has_cycles: bool,
    /// Instances nothing runs before
    pub root_nodes: Vec<String>,
    /// Instances nothing runs after
    pub leaf_nodes: Vec<String>,
}

/// Directed "runs before" graph.
#[derive(Debug, Clone)]
pub struct CallGraph {
    graph: DiGraph<CallNode, ()>,
    index: HashMap<String, NodeIndex>,
    dynamic_behavior: String,
}

impl CallGraph {
    /// Build the graph from a normalized document.
    pub fn from_document(document: &LifecycleDocument) -> Result<Self, GraphError> {
        let lifecycle = &document.lifecycle;
        let functions: HashMap<&str, _> = lifecycle
            .functions
            .iter()
            .map(|f| (f.name.as_str(), f))
            .collect();

        let mut graph = DiGraph::new();
        let mut index: HashMap<String, NodeIndex> = HashMap::new();

        for edge in &lifecycle.order {
            let mut endpoints = [NodeIndex::end(); 2];
            for (slot, instance) in [&edge.pred, &edge.succ].into_iter().enumerate() {
                endpoints[slot] = match index.get(instance) {
                    Some(&idx) => idx,
                    None => {
                        let base = base_name(instance);
                        let function = functions.get(base).ok_or_else(|| {
                            GraphError::UnknownFunction {
                                instance: instance.clone(),
                                base: base.to_string(),
                            }
                        })?;
                        let idx = graph.add_node(CallNode {
                            instance: instance.clone(),
                            scope: function.scope,
                            description: function.description.clone(),
                        });
                        index.insert(instance.clone(), idx);
                        idx
                    }
                };
            }
            graph.update_edge(endpoints[0], endpoints[1], ());
        }

        debug!(
            "Built call graph with {} nodes and {} edges",
            graph.node_count(),
            graph.edge_count()
        );

        Ok(Self {
            graph,
            index,
            dynamic_behavior: lifecycle.dynamic_behavior.clone(),
        })
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Nodes in order of first appearance.
    pub fn nodes(&self) -> impl Iterator<Item = &CallNode> {
        self.graph.node_weights()
    }

    /// Look up a node by qualified name.
    #[must_use]
    pub fn node(&self, instance: &str) -> Option<&CallNode> {
        self.index.get(instance).map(|&idx| &self.graph[idx])
    }

    /// Instances that run directly after `instance`.
    #[must_use]
    pub fn successors(&self, instance: &str) -> Vec<&str> {
        self.neighbors(instance, Direction::Outgoing)
    }

    /// Instances that run directly before `instance`.
    #[must_use]
    pub fn predecessors(&self, instance: &str) -> Vec<&str> {
        self.neighbors(instance, Direction::Incoming)
    }

    fn neighbors(&self, instance: &str, direction: Direction) -> Vec<&str> {
        let Some(&idx) = self.index.get(instance) else {
            return Vec::new();
        };
        // petgraph walks adjacency lists newest first
        let mut names: Vec<&str> = self
            .graph
            .neighbors_directed(idx, direction)
            .map(|n| self.graph[n].instance.as_str())
            .collect();
        names.reverse();
        names
    }

    /// Kahn's algorithm. Ties resolve in order of first appearance.
    pub fn topological_order(&self) -> Result<Vec<&str>, GraphError> {
        let mut in_degree: Vec<usize> = self
            .graph
            .node_indices()
            .map(|n| {
                self.graph
                    .neighbors_directed(n, Direction::Incoming)
                    .count()
            })
            .collect();

        let mut queue: VecDeque<NodeIndex> = self
            .graph
            .node_indices()
            .filter(|n| in_degree[n.index()] == 0)
            .collect();
        let mut order = Vec::with_capacity(self.graph.node_count());

        while let Some(node) = queue.pop_front() {
            order.push(self.graph[node].instance.as_str());

            let mut next: Vec<NodeIndex> = self
                .graph
                .neighbors_directed(node, Direction::Outgoing)
                .collect();
            next.sort_unstable();
            for succ in next {
                in_degree[succ.index()] -= 1;
                if in_degree[succ.index()] == 0 {
                    queue.push_back(succ);
                }
            }
        }

        if order.len() == self.graph.node_count() {
            Ok(order)
        } else {
            Err(GraphError::Cycle)
        }
    }

    #[must_use]
    pub fn has_cycles(&self) -> bool {
        is_cyclic_directed(&self.graph)
    }

    /// Shortest path from `from` to `to`, inclusive.
    ///
    /// `None` when either end is unknown or `to` is unreachable.
    #[must_use]
    pub fn find_path(&self, from: &str, to: &str) -> Option<Vec<&str>> {
        let start = *self.index.get(from)?;
        let goal = *self.index.get(to)?;

        let (_, path) = astar(&self.graph, start, |n| n == goal, |_| 1usize, |_| 0)?;
        Some(
            path.into_iter()
                .map(|n| self.graph[n].instance.as_str())
                .collect(),
        )
    }

    #[must_use]
    pub fn stats(&self) -> GraphStats {
        let with_no = |direction: Direction| -> Vec<String> {
            self.graph
                .node_indices()
                .filter(|&n| {
                    self.graph
                        .neighbors_directed(n, direction)
                        .next()
                        .is_none()
                })
                .map(|n| self.graph[n].instance.clone())
                .collect()
        };

        GraphStats {
            node_count: self.node_count(),
            edge_count: self.edge_count(),
            has_cycles: self.has_cycles(),
            root_nodes: with_no(Direction::Incoming),
            leaf_nodes: with_no(Direction::Outgoing),
        }
    }

    /// Graphviz DOT rendering.
    #[must_use]
    pub fn to_dot(&self) -> String {
        let mut lines = vec![
            "digraph LifecycleCallGraph {".to_string(),
            "  rankdir=TB;".to_string(),
            "  node [shape=box, style=rounded];".to_string(),
            String::new(),
        ];

        for node in self.graph.node_weights() {
            let color = match node.scope {
                Scope::Page => "lightblue",
                Scope::Component => "lightgreen",
            };
            lines.push(format!(
                "  \"{}\" [label=\"{}\\n[{}]\\n{}\", fillcolor=\"{}\", style=\"rounded,filled\"];",
                escape(&node.instance),
                escape(&node.instance),
                node.scope,
                escape(&node.description),
                color
            ));
        }

        if self.graph.edge_count() > 0 {
            lines.push(String::new());
            for edge in self.graph.raw_edges() {
                lines.push(format!(
                    "  \"{}\" -> \"{}\";",
                    escape(&self.graph[edge.source()].instance),
                    escape(&self.graph[edge.target()].instance)
                ));
            }
        }

        if !self.dynamic_behavior.is_empty() {
            lines.push(String::new());
            lines.push(format!(
                "  note [shape=note, label=\"{}\"];",
                escape(&self.dynamic_behavior)
            ));
        }

        lines.push("}".to_string());
        lines.join("\n")
    }
}

fn escape(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}
