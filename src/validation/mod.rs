//! Structural and type validation of a built `PipelineGraph`.

use crate::graph::{GraphBuilder, PipelineGraph};
use crate::pipeline::{ErrorKind, PipelineRequest, ValidationError, ValidationResult};
use crate::registry::TypeRegistry;

mod structural;
mod types;

pub use structural::StructuralValidator;
pub use types::TypeValidator;

/// Runs the structural pass, then the type pass when no edge is dangling.
pub fn validate_graph(graph: &PipelineGraph<'_>) -> Vec<ValidationError> {
    let mut errors = StructuralValidator::new(graph).validate();
    if errors.iter().any(|e| e.kind == ErrorKind::DanglingEdge) {
        tracing::debug!("Skipping type validation: graph has dangling edges");
    } else {
        errors.extend(TypeValidator::new(graph).validate());
    }
    errors
}

/// Builds the graph for `request` and validates it, returning both.
///
/// Builder findings (unknown kinds, duplicate ids) come first, followed by the
/// structural and type findings.
pub fn validate_request<'r>(
    registry: &'r TypeRegistry,
    request: &PipelineRequest,
) -> (PipelineGraph<'r>, ValidationResult) {
    let (graph, mut errors) = GraphBuilder::new(registry).build(request);
    errors.extend(validate_graph(&graph));
    tracing::debug!(errors = errors.len(), "Validation finished");
    (graph, ValidationResult::from_errors(errors))
}
