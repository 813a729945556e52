use crate::graph::{GraphEdge, PipelineGraph};
use crate::pipeline::{ErrorKind, ValidationError};
use ahash::AHashSet;
use itertools::Itertools;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    Unvisited,
    InProgress,
    Done,
}

/// Checks graph well-formedness independent of data types.
///
/// Runs four checks in a fixed order (dangling edges, duplicate inputs, missing
/// required inputs, cycles) and keeps every finding.
pub struct StructuralValidator<'g, 'r> {
    graph: &'g PipelineGraph<'r>,
    errors: Vec<ValidationError>,
}

impl<'g, 'r> StructuralValidator<'g, 'r> {
    pub fn new(graph: &'g PipelineGraph<'r>) -> Self {
        Self {
            graph,
            errors: Vec::new(),
        }
    }

    pub fn validate(mut self) -> Vec<ValidationError> {
        self.validate_edge_endpoints();
        self.validate_single_edge_per_input();
        self.validate_required_inputs();
        self.detect_cycles();
        self.errors
    }

    fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    fn validate_edge_endpoints(&mut self) {
        let graph = self.graph;
        for edge in graph.edges() {
            self.check_endpoint(edge, true);
            self.check_endpoint(edge, false);
        }
    }

    fn check_endpoint(&mut self, edge: &GraphEdge<'_>, is_source: bool) {
        let (reference, node_idx, resolved, end) = if is_source {
            (&edge.source, edge.source_node, edge.source_handle.is_some(), "source")
        } else {
            (&edge.target, edge.target_node, edge.target_handle.is_some(), "target")
        };

        let Some(node_idx) = node_idx else {
            self.add_error(
                ValidationError::new(
                    ErrorKind::DanglingEdge,
                    format!(
                        "Edge '{}' {} references non-existent node '{}'",
                        edge.id, end, reference.node_id
                    ),
                )
                .with_edge(&edge.id),
            );
            return;
        };

        // Unknown kinds were already reported by the graph builder.
        let Some(metadata) = self.graph.node(node_idx).metadata else {
            return;
        };
        if resolved {
            return;
        }

        let (expected, opposite_exists) = if is_source {
            ("output", metadata.input(&reference.handle).is_some())
        } else {
            ("input", metadata.output(&reference.handle).is_some())
        };
        let message = if opposite_exists {
            format!(
                "Edge '{}' {} handle '{}' on node '{}' is not an {} of kind '{}'",
                edge.id, end, reference.handle, reference.node_id, expected, metadata.kind
            )
        } else {
            format!(
                "Edge '{}' {} handle '{}' does not exist on node '{}' of kind '{}'",
                edge.id, end, reference.handle, reference.node_id, metadata.kind
            )
        };
        self.add_error(
            ValidationError::new(ErrorKind::DanglingEdge, message)
                .with_node(&reference.node_id)
                .with_edge(&edge.id),
        );
    }

    fn validate_single_edge_per_input(&mut self) {
        let graph = self.graph;
        for (idx, node) in graph.nodes().iter().enumerate() {
            let Some(metadata) = node.metadata else {
                continue;
            };
            for handle in &metadata.inputs {
                let feeding: Vec<&str> = graph
                    .incoming(idx)
                    .filter(|e| e.target_handle.is_some() && e.target.handle == handle.name)
                    .map(|e| e.id.as_str())
                    .collect();
                if feeding.len() > 1 {
                    self.add_error(
                        ValidationError::new(
                            ErrorKind::MultipleEdgesOnInput,
                            format!(
                                "Input '{}' on node '{}' receives {} edges ({}), but accepts at most one",
                                handle.name,
                                node.id,
                                feeding.len(),
                                feeding.iter().join(", ")
                            ),
                        )
                        .with_node(&node.id)
                        .with_edge(feeding[1]),
                    );
                }
            }
        }
    }

    fn validate_required_inputs(&mut self) {
        let graph = self.graph;
        for (idx, node) in graph.nodes().iter().enumerate() {
            let Some(metadata) = node.metadata else {
                continue;
            };
            for handle in metadata.inputs.iter().filter(|h| h.required) {
                let connected = graph
                    .incoming(idx)
                    .any(|e| e.target_handle.is_some() && e.target.handle == handle.name);
                if !connected {
                    self.add_error(
                        ValidationError::new(
                            ErrorKind::MissingRequiredInput,
                            format!(
                                "Required input '{}' on node '{}' is not connected",
                                handle.name, node.id
                            ),
                        )
                        .with_node(&node.id),
                    );
                }
            }
        }
    }

    /// Iterative three-color depth-first search; every back edge yields one cycle.
    fn detect_cycles(&mut self) {
        let graph = self.graph;
        let mut color = vec![Color::Unvisited; graph.len()];
        let mut reported: AHashSet<Vec<usize>> = AHashSet::new();

        for start in 0..graph.len() {
            if color[start] != Color::Unvisited {
                continue;
            }
            color[start] = Color::InProgress;
            // (node, position of the next outgoing edge to follow)
            let mut stack: Vec<(usize, usize)> = vec![(start, 0)];

            while let Some(frame) = stack.last_mut() {
                let node = frame.0;
                let outgoing = graph.outgoing_indices(node);
                if frame.1 >= outgoing.len() {
                    color[node] = Color::Done;
                    stack.pop();
                    continue;
                }
                let edge = graph.edge(outgoing[frame.1]);
                frame.1 += 1;

                let Some(next) = edge.target_node else {
                    continue;
                };
                match color[next] {
                    Color::Unvisited => {
                        color[next] = Color::InProgress;
                        stack.push((next, 0));
                    }
                    Color::InProgress => {
                        let from = stack.iter().position(|&(n, _)| n == next).unwrap_or(0);
                        let cycle: Vec<usize> = stack[from..].iter().map(|&(n, _)| n).collect();
                        if reported.insert(canonical_rotation(&cycle)) {
                            self.report_cycle(&cycle, edge);
                        }
                    }
                    Color::Done => {}
                }
            }
        }
    }

    fn report_cycle(&mut self, cycle: &[usize], closing_edge: &GraphEdge<'_>) {
        let ids: Vec<&str> = cycle
            .iter()
            .map(|&n| self.graph.node(n).id.as_str())
            .collect();
        let path = ids
            .iter()
            .chain(ids.first())
            .join(" -> ");
        self.add_error(
            ValidationError::new(
                ErrorKind::CycleDetected,
                format!("Cycle detected through nodes [{}]: {}", ids.join(", "), path),
            )
            .with_node(ids[0])
            .with_edge(&closing_edge.id),
        );
    }
}

/// Rotates a cycle so it starts at its smallest node index.
fn canonical_rotation(cycle: &[usize]) -> Vec<usize> {
    let start = cycle
        .iter()
        .position_min()
        .unwrap_or(0);
    cycle[start..].iter().chain(&cycle[..start]).copied().collect()
}
