use super::{GraphEdge, GraphNode, PipelineGraph};
use crate::pipeline::{ErrorKind, PipelineRequest, ValidationError};
use crate::registry::TypeRegistry;
use ahash::{AHashMap, AHashSet};

/// Turns a flat `PipelineRequest` into a `PipelineGraph`.
///
/// Unknown kinds and duplicate ids are collected for the whole batch instead of
/// aborting on the first one.
pub struct GraphBuilder<'r> {
    registry: &'r TypeRegistry,
}

impl<'r> GraphBuilder<'r> {
    pub fn new(registry: &'r TypeRegistry) -> Self {
        Self { registry }
    }

    pub fn build(&self, request: &PipelineRequest) -> (PipelineGraph<'r>, Vec<ValidationError>) {
        let mut errors = Vec::new();
        let mut nodes = Vec::with_capacity(request.nodes.len());
        let mut index: AHashMap<String, usize> = AHashMap::with_capacity(request.nodes.len());

        for record in &request.nodes {
            if record.id.is_empty() {
                errors.push(ValidationError::new(
                    ErrorKind::DuplicateId,
                    format!("Node of kind '{}' has an empty id", record.kind),
                ));
                continue;
            }
            if index.contains_key(&record.id) {
                errors.push(
                    ValidationError::new(
                        ErrorKind::DuplicateId,
                        format!("Duplicate node id '{}'", record.id),
                    )
                    .with_node(&record.id),
                );
                continue;
            }

            let metadata = self.registry.metadata(&record.kind);
            if metadata.is_none() {
                errors.push(
                    ValidationError::new(
                        ErrorKind::UnknownNodeKind,
                        format!(
                            "Node '{}' has an unregistered kind '{}'",
                            record.id, record.kind
                        ),
                    )
                    .with_node(&record.id),
                );
            }

            index.insert(record.id.clone(), nodes.len());
            nodes.push(GraphNode {
                id: record.id.clone(),
                kind: record.kind.clone(),
                data: record.data.clone(),
                metadata,
            });
        }

        let mut outgoing = vec![Vec::new(); nodes.len()];
        let mut incoming = vec![Vec::new(); nodes.len()];
        let mut edges = Vec::with_capacity(request.edges.len());
        let mut seen_edge_ids: AHashSet<&str> = AHashSet::with_capacity(request.edges.len());

        for record in &request.edges {
            if record.id.is_empty() {
                errors.push(ValidationError::new(
                    ErrorKind::DuplicateId,
                    format!(
                        "Edge from '{}' to '{}' has an empty id",
                        record.source.node_id, record.target.node_id
                    ),
                ));
            } else if !seen_edge_ids.insert(record.id.as_str()) {
                errors.push(
                    ValidationError::new(
                        ErrorKind::DuplicateId,
                        format!("Duplicate edge id '{}'", record.id),
                    )
                    .with_edge(&record.id),
                );
            }

            let source_node = index.get(&record.source.node_id).copied();
            let target_node = index.get(&record.target.node_id).copied();
            let source_handle = source_node
                .and_then(|n| nodes[n].metadata)
                .and_then(|m| m.output(&record.source.handle));
            let target_handle = target_node
                .and_then(|n| nodes[n].metadata)
                .and_then(|m| m.input(&record.target.handle));

            let edge_idx = edges.len();
            if let (Some(s), Some(t)) = (source_node, target_node) {
                outgoing[s].push(edge_idx);
                incoming[t].push(edge_idx);
            }
            edges.push(GraphEdge {
                id: record.id.clone(),
                source: record.source.clone(),
                target: record.target.clone(),
                source_node,
                target_node,
                source_handle,
                target_handle,
            });
        }

        tracing::debug!(
            nodes = nodes.len(),
            edges = edges.len(),
            errors = errors.len(),
            "Built pipeline graph"
        );

        let graph = PipelineGraph {
            nodes,
            edges,
            index,
            outgoing,
            incoming,
        };
        (graph, errors)
    }
}
