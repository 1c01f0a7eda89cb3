use crate::aggregate::PairTotal;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use std::collections::HashMap;

/// Which half of the bipartite node list a node belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowSide {
    Source,
    Target,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlowNode {
    pub label: String,
    pub side: FlowSide,
}

/// Edge as handed to a renderer: indices into the node list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FlowEdge {
    pub source: usize,
    pub target: usize,
    pub value: u64,
}

/// Bipartite flow diagram (e.g. country → cluster).
///
/// Source nodes come first in first-seen order, then target nodes in
/// first-seen order. A label present on both sides yields two nodes.
#[derive(Debug, Clone, Default)]
pub struct FlowGraph {
    graph: DiGraph<FlowNode, u64>,
    sources: usize,
}

impl FlowGraph {
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Nodes in renderer index order
    pub fn nodes(&self) -> impl Iterator<Item = &FlowNode> {
        self.graph.node_indices().map(move |idx| &self.graph[idx])
    }

    pub fn labels(&self) -> Vec<&str> {
        self.nodes().map(|node| node.label.as_str()).collect()
    }

    /// Number of source-side nodes; target indices start here
    pub fn source_count(&self) -> usize {
        self.sources
    }

    pub fn edges(&self) -> Vec<FlowEdge> {
        self.graph
            .edge_references()
            .map(|edge| FlowEdge {
                source: edge.source().index(),
                target: edge.target().index(),
                value: *edge.weight(),
            })
            .collect()
    }

    /// Sum of all edge values
    pub fn total_flow(&self) -> u64 {
        self.graph
            .edge_weights()
            .fold(0u64, |total, value| total.saturating_add(*value))
    }

    pub fn find_node(&self, label: &str, side: FlowSide) -> Option<usize> {
        self.graph
            .node_indices()
            .find(|idx| {
                let node = &self.graph[*idx];
                node.side == side && node.label == label
            })
            .map(NodeIndex::index)
    }
}

impl Serialize for FlowGraph {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let nodes: Vec<&FlowNode> = self.nodes().collect();
        let mut state = serializer.serialize_struct("FlowGraph", 2)?;
        state.serialize_field("nodes", &nodes)?;
        state.serialize_field("edges", &self.edges())?;
        state.end()
    }
}

/// Build the flow graph from pair totals. Every source and target gets a
/// node; zero-valued pairs add no edge.
pub fn build_flow(pairs: &[PairTotal]) -> FlowGraph {
    let mut graph = DiGraph::new();
    let mut sources: HashMap<&str, NodeIndex> = HashMap::new();
    let mut targets: HashMap<&str, NodeIndex> = HashMap::new();

    for pair in pairs {
        sources.entry(pair.source.as_str()).or_insert_with(|| {
            graph.add_node(FlowNode {
                label: pair.source.clone(),
                side: FlowSide::Source,
            })
        });
    }
    let source_count = graph.node_count();

    for pair in pairs {
        targets.entry(pair.target.as_str()).or_insert_with(|| {
            graph.add_node(FlowNode {
                label: pair.target.clone(),
                side: FlowSide::Target,
            })
        });
    }

    for pair in pairs.iter().filter(|pair| pair.value > 0) {
        let from = sources[pair.source.as_str()];
        let to = targets[pair.target.as_str()];
        graph.add_edge(from, to, pair.value);
    }

    log::debug!(
        "Built flow graph: {} sources, {} targets, {} edges",
        source_count,
        graph.node_count() - source_count,
        graph.edge_count()
    );

    FlowGraph {
        graph,
        sources: source_count,
    }
}
