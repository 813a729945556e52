//! Deterministic topological ordering of a validated graph.

use crate::error::{EngineError, PlanError};
use crate::graph::PipelineGraph;
use ahash::AHashMap;
use serde::{Deserialize, Serialize};

/// An execution order split into layers.
///
/// Every node of a layer depends only on nodes of earlier layers, and nodes within
/// a layer are sorted by ascending id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Schedule {
    layers: Vec<Vec<String>>,
}

impl Schedule {
    pub fn layers(&self) -> &[Vec<String>] {
        &self.layers
    }

    /// The total order: layers concatenated.
    pub fn order(&self) -> Vec<&str> {
        self.layers.iter().flatten().map(String::as_str).collect()
    }

    pub fn position(&self, node_id: &str) -> Option<usize> {
        self.layers.iter().flatten().position(|id| id == node_id)
    }

    pub fn len(&self) -> usize {
        self.layers.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Checks that this schedule can drive `graph`.
    ///
    /// Every node of the graph must appear exactly once, no unknown id may appear,
    /// and every edge must run from an earlier layer to a strictly later one.
    pub fn check_against(&self, graph: &PipelineGraph<'_>) -> Result<(), PlanError> {
        let mut layer_of: AHashMap<&str, usize> = AHashMap::with_capacity(graph.len());
        for (layer_no, layer) in self.layers.iter().enumerate() {
            for id in layer {
                if graph.node_index(id).is_none() {
                    return Err(PlanError::ScheduleMismatch(format!(
                        "node '{}' is scheduled but not part of the pipeline",
                        id
                    )));
                }
                if layer_of.insert(id.as_str(), layer_no).is_some() {
                    return Err(PlanError::ScheduleMismatch(format!(
                        "node '{}' is scheduled more than once",
                        id
                    )));
                }
            }
        }

        if let Some(missing) = graph
            .nodes()
            .iter()
            .find(|node| !layer_of.contains_key(node.id.as_str()))
        {
            return Err(PlanError::ScheduleMismatch(format!(
                "node '{}' is never scheduled",
                missing.id
            )));
        }

        for edge in graph.edges() {
            let (Some(source), Some(target)) = (edge.source_node, edge.target_node) else {
                continue;
            };
            let from = layer_of.get(graph.node(source).id.as_str()).copied();
            let to = layer_of.get(graph.node(target).id.as_str()).copied();
            if let (Some(from), Some(to)) = (from, to) {
                if from < to {
                    continue;
                }
                return Err(PlanError::ScheduleMismatch(format!(
                    "edge '{}' runs from layer {} to layer {}",
                    edge.id, from, to
                )));
            }
        }
        Ok(())
    }
}

/// Kahn's algorithm over whole layers.
pub struct Scheduler;

impl Scheduler {
    /// Orders `graph`, which must already have passed cycle detection.
    ///
    /// A residual cycle here means validation let one through. That is a contract
    /// violation and comes back as `EngineError::ResidualCycle`, never as a finding.
    pub fn schedule(graph: &PipelineGraph<'_>) -> Result<Schedule, EngineError> {
        let mut in_degree: Vec<usize> = (0..graph.len())
            .map(|n| graph.incoming_indices(n).len())
            .collect();

        let mut ready: Vec<usize> = (0..graph.len()).filter(|&n| in_degree[n] == 0).collect();
        let mut layers = Vec::new();
        let mut processed = 0;

        while !ready.is_empty() {
            ready.sort_by(|&a, &b| graph.node(a).id.cmp(&graph.node(b).id));
            let mut next = Vec::new();
            for &node in &ready {
                for edge in graph.outgoing(node) {
                    if let Some(target) = edge.target_node {
                        in_degree[target] -= 1;
                        if in_degree[target] == 0 {
                            next.push(target);
                        }
                    }
                }
            }
            processed += ready.len();
            layers.push(ready.iter().map(|&n| graph.node(n).id.clone()).collect());
            ready = next;
        }

        if processed < graph.len() {
            let mut nodes: Vec<String> = (0..graph.len())
                .filter(|&n| in_degree[n] > 0)
                .map(|n| graph.node(n).id.clone())
                .collect();
            nodes.sort();
            tracing::error!(?nodes, "Scheduler found a residual cycle after validation");
            return Err(EngineError::ResidualCycle { nodes });
        }

        tracing::debug!(
            layers = layers.len(),
            nodes = processed,
            "Computed execution schedule"
        );
        Ok(Schedule { layers })
    }
}
