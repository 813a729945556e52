use crate::pipeline::HandleRef;
use crate::registry::{HandleDefinition, NodeMetadata};
use ahash::AHashMap;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use serde_json::Value;

mod builder;

pub use builder::GraphBuilder;

/// A node instance, with its kind resolved against the registry when possible.
#[derive(Debug, Clone)]
pub struct GraphNode<'r> {
    pub id: String,
    pub kind: String,
    pub data: Value,
    /// `None` when the kind is not registered.
    pub metadata: Option<&'r NodeMetadata>,
}

/// An edge instance with whatever could be resolved of its two endpoints.
#[derive(Debug, Clone)]
pub struct GraphEdge<'r> {
    pub id: String,
    pub source: HandleRef,
    pub target: HandleRef,
    pub source_node: Option<usize>,
    pub target_node: Option<usize>,
    pub source_handle: Option<&'r HandleDefinition>,
    pub target_handle: Option<&'r HandleDefinition>,
}

impl GraphEdge<'_> {
    /// Both endpoint nodes exist.
    pub fn is_connected(&self) -> bool {
        self.source_node.is_some() && self.target_node.is_some()
    }

    /// Both endpoint handles exist, in the right direction.
    pub fn is_resolved(&self) -> bool {
        self.source_handle.is_some() && self.target_handle.is_some()
    }
}

/// Summary figures about a graph's shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphStats {
    pub node_count: usize,
    pub edge_count: usize,
    pub max_in_degree: usize,
    pub max_out_degree: usize,
    pub isolated_nodes: usize,
}

/// The in-memory graph for one request.
///
/// Nodes and edges keep submission order; every later pass iterates them in that
/// order so findings come out in a stable sequence.
#[derive(Debug, Clone, Default)]
pub struct PipelineGraph<'r> {
    nodes: Vec<GraphNode<'r>>,
    edges: Vec<GraphEdge<'r>>,
    index: AHashMap<String, usize>,
    // Edge indices per node; only edges whose both endpoints exist are indexed.
    outgoing: Vec<Vec<usize>>,
    incoming: Vec<Vec<usize>>,
}

impl<'r> PipelineGraph<'r> {
    pub fn nodes(&self) -> &[GraphNode<'r>] {
        &self.nodes
    }

    pub fn edges(&self) -> &[GraphEdge<'r>] {
        &self.edges
    }

    pub fn node(&self, idx: usize) -> &GraphNode<'r> {
        &self.nodes[idx]
    }

    pub fn edge(&self, idx: usize) -> &GraphEdge<'r> {
        &self.edges[idx]
    }

    pub fn node_index(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn node_by_id(&self, id: &str) -> Option<&GraphNode<'r>> {
        self.node_index(id).map(|idx| &self.nodes[idx])
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn outgoing_indices(&self, node: usize) -> &[usize] {
        &self.outgoing[node]
    }

    pub fn incoming_indices(&self, node: usize) -> &[usize] {
        &self.incoming[node]
    }

    pub fn outgoing(&self, node: usize) -> impl Iterator<Item = &GraphEdge<'r>> {
        self.outgoing[node].iter().map(|&e| &self.edges[e])
    }

    pub fn incoming(&self, node: usize) -> impl Iterator<Item = &GraphEdge<'r>> {
        self.incoming[node].iter().map(|&e| &self.edges[e])
    }

    /// Distinct direct predecessors of a node, in ascending index order.
    pub fn predecessors(&self, node: usize) -> Vec<usize> {
        self.incoming(node)
            .filter_map(|e| e.source_node)
            .sorted_unstable()
            .dedup()
            .collect()
    }

    pub fn stats(&self) -> GraphStats {
        let max_in_degree = self.incoming.iter().map(Vec::len).max().unwrap_or(0);
        let max_out_degree = self.outgoing.iter().map(Vec::len).max().unwrap_or(0);
        let isolated_nodes = (0..self.nodes.len())
            .filter(|&n| self.incoming[n].is_empty() && self.outgoing[n].is_empty())
            .count();
        GraphStats {
            node_count: self.nodes.len(),
            edge_count: self.edges.len(),
            max_in_degree,
            max_out_degree,
            isolated_nodes,
        }
    }
}
