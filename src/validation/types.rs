use crate::graph::PipelineGraph;
use crate::pipeline::{ErrorKind, ValidationError};

/// Checks that every resolved edge joins compatible data types.
pub struct TypeValidator<'g, 'r> {
    graph: &'g PipelineGraph<'r>,
}

impl<'g, 'r> TypeValidator<'g, 'r> {
    pub fn new(graph: &'g PipelineGraph<'r>) -> Self {
        Self { graph }
    }

    pub fn validate(&self) -> Vec<ValidationError> {
        self.graph
            .edges()
            .iter()
            .filter_map(|edge| {
                let (source, target) = (edge.source_handle?, edge.target_handle?);
                if source.data_type.is_compatible_with(&target.data_type) {
                    return None;
                }
                Some(
                    ValidationError::new(
                        ErrorKind::TypeMismatch,
                        format!(
                            "Edge '{}' connects output '{}' ({}) of node '{}' to input '{}' ({}) of node '{}'",
                            edge.id,
                            source.name,
                            source.data_type,
                            edge.source.node_id,
                            target.name,
                            target.data_type,
                            edge.target.node_id
                        ),
                    )
                    .with_node(&edge.target.node_id)
                    .with_edge(&edge.id),
                )
            })
            .collect()
    }
}
