use crate::config::EngineConfig;
use crate::error::ComputeError;
use crate::graph::PipelineGraph;
use crate::pipeline::{ErrorKind, NodeResults, ValidationError};
use crate::registry::{Invocation, NodeComputation, PortValues, TypeRegistry};
use crate::schedule::Schedule;
use itertools::Itertools;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodeState {
    Pending,
    Running,
    Succeeded,
    Failed,
    Skipped,
}

/// Why a run stopped before its last layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interruption {
    /// The wall-clock bound expired; partial results are discarded.
    Timeout,
    /// The caller cancelled; seen at a layer checkpoint. Completed layers are kept.
    Cancelled,
}

/// What the execution phase produced.
#[derive(Debug, Clone, Default)]
pub struct ExecutionOutcome {
    pub results: NodeResults,
    pub errors: Vec<ValidationError>,
    pub completed_layers: usize,
    pub interruption: Option<Interruption>,
}

type TaskResult = (usize, Result<Result<PortValues, ComputeError>, JoinError>);

/// Runs a validated graph layer by layer.
///
/// Each node of a layer becomes its own task; the layer is joined completely before
/// the next one starts, so a node never runs before its predecessors finished.
pub(crate) struct Executor<'a, 'r> {
    graph: &'a PipelineGraph<'r>,
    registry: &'r TypeRegistry,
    config: &'a EngineConfig,
    cancel: CancellationToken,
}

impl<'a, 'r> Executor<'a, 'r> {
    pub(crate) fn new(
        graph: &'a PipelineGraph<'r>,
        registry: &'r TypeRegistry,
        config: &'a EngineConfig,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            graph,
            registry,
            config,
            cancel,
        }
    }

    pub(crate) async fn execute(&self, schedule: &Schedule) -> ExecutionOutcome {
        let graph = self.graph;
        let deadline = self.config.timeout.and_then(|t| Instant::now().checked_add(t));
        let semaphore = Arc::new(Semaphore::new(
            self.config
                .max_concurrent_nodes
                .clamp(1, Semaphore::MAX_PERMITS),
        ));

        let mut states = vec![NodeState::Pending; graph.len()];
        let mut outputs: Vec<Option<PortValues>> = vec![None; graph.len()];
        let mut outcome = ExecutionOutcome::default();

        for (layer_no, layer) in schedule.layers().iter().enumerate() {
            if self.stop_if_cancelled(layer_no, &mut outcome) {
                break;
            }
            tracing::debug!(layer = layer_no, nodes = layer.len(), "Starting layer");

            let mut tasks: JoinSet<TaskResult> = JoinSet::new();
            for node_id in layer {
                let Some(idx) = graph.node_index(node_id) else {
                    continue;
                };
                if let Some(error) = self.upstream_failure(idx, &states) {
                    tracing::warn!(node_id = %node_id, "Skipping node after upstream failure");
                    states[idx] = NodeState::Skipped;
                    outcome.errors.push(error);
                    continue;
                }

                let node = graph.node(idx);
                let Some(computation) = self.registry.computation(&node.kind) else {
                    states[idx] = NodeState::Failed;
                    outcome.errors.push(
                        ValidationError::new(
                            ErrorKind::NodeExecutionError,
                            format!("Node '{}' has no computation for kind '{}'", node.id, node.kind),
                        )
                        .with_node(&node.id),
                    );
                    continue;
                };

                let invocation = self.invocation(idx, &outputs);
                states[idx] = NodeState::Running;
                spawn_node(&mut tasks, idx, computation, invocation, Arc::clone(&semaphore));
            }

            let joined = match deadline {
                Some(deadline) => tokio::time::timeout_at(
                    deadline,
                    self.join_layer(&mut tasks, &mut states, &mut outputs, &mut outcome),
                )
                .await
                .is_ok(),
                None => {
                    self.join_layer(&mut tasks, &mut states, &mut outputs, &mut outcome)
                        .await;
                    true
                }
            };

            if !joined {
                // Running computations finish on their own; their outputs are dropped.
                tasks.detach_all();
                let bound = self.config.timeout.unwrap_or_default();
                tracing::warn!(
                    timeout_ms = u64::try_from(bound.as_millis()).unwrap_or(u64::MAX),
                    completed_layers = layer_no,
                    "Execution timed out"
                );
                outcome.errors.push(ValidationError::new(
                    ErrorKind::ExecutionTimeout,
                    format!(
                        "Execution exceeded the {} ms bound after {} completed layer(s)",
                        bound.as_millis(),
                        layer_no
                    ),
                ));
                outcome.interruption = Some(Interruption::Timeout);
                outcome.completed_layers = layer_no;
                return outcome;
            }

            for idx in layer.iter().filter_map(|id| graph.node_index(id)) {
                if states[idx] == NodeState::Running {
                    states[idx] = NodeState::Failed;
                    outcome.errors.push(
                        ValidationError::new(
                            ErrorKind::NodeExecutionError,
                            format!("Node '{}' did not report a result", graph.node(idx).id),
                        )
                        .with_node(&graph.node(idx).id),
                    );
                }
            }
            outcome.completed_layers = layer_no + 1;
        }

        // Checkpoint after the final layer.
        if outcome.interruption.is_none() && outcome.completed_layers == schedule.layers().len() {
            self.stop_if_cancelled(outcome.completed_layers, &mut outcome);
        }

        outcome.results = states
            .iter()
            .enumerate()
            .filter(|(_, state)| **state == NodeState::Succeeded)
            .filter_map(|(idx, _)| {
                outputs[idx]
                    .take()
                    .map(|values| (graph.node(idx).id.clone(), values))
            })
            .collect();
        outcome
    }

    fn stop_if_cancelled(&self, completed_layers: usize, outcome: &mut ExecutionOutcome) -> bool {
        if !self.cancel.is_cancelled() {
            return false;
        }
        tracing::info!(completed_layers, "Execution cancelled");
        outcome.errors.push(ValidationError::new(
            ErrorKind::ExecutionCancelled,
            format!(
                "Execution was cancelled after {} completed layer(s)",
                completed_layers
            ),
        ));
        outcome.interruption = Some(Interruption::Cancelled);
        true
    }

    async fn join_layer(
        &self,
        tasks: &mut JoinSet<TaskResult>,
        states: &mut [NodeState],
        outputs: &mut [Option<PortValues>],
        outcome: &mut ExecutionOutcome,
    ) {
        while let Some(joined) = tasks.join_next().await {
            let (idx, result) = match joined {
                Ok(task_result) => task_result,
                Err(e) => {
                    tracing::error!(error = %e, "Node task was lost");
                    continue;
                }
            };
            let node = self.graph.node(idx);
            match self.check_outputs(idx, result) {
                Ok(values) => {
                    tracing::debug!(node_id = %node.id, "Node succeeded");
                    states[idx] = NodeState::Succeeded;
                    outputs[idx] = Some(values);
                }
                Err(cause) => {
                    tracing::warn!(node_id = %node.id, cause = %cause, "Node failed");
                    states[idx] = NodeState::Failed;
                    outcome.errors.push(
                        ValidationError::new(
                            ErrorKind::NodeExecutionError,
                            format!("Node '{}' failed: {}", node.id, cause),
                        )
                        .with_node(&node.id),
                    );
                }
            }
        }
    }

    /// Keeps the declared outputs of a finished computation, or explains why it failed.
    fn check_outputs(
        &self,
        idx: usize,
        result: Result<Result<PortValues, ComputeError>, JoinError>,
    ) -> Result<PortValues, String> {
        let mut produced = match result {
            Ok(Ok(values)) => values,
            Ok(Err(e)) => return Err(e.to_string()),
            Err(e) => return Err(describe_join_error(e)),
        };
        let Some(metadata) = self.graph.node(idx).metadata else {
            return Ok(produced);
        };

        let missing: Vec<&str> = metadata
            .outputs
            .iter()
            .filter(|h| !produced.contains_key(&h.name))
            .map(|h| h.name.as_str())
            .collect();
        if !missing.is_empty() {
            return Err(format!(
                "computation did not produce declared output(s) {}",
                missing.iter().map(|m| format!("'{}'", m)).join(", ")
            ));
        }
        produced.retain(|name, _| metadata.output(name).is_some());
        Ok(produced)
    }

    fn upstream_failure(&self, idx: usize, states: &[NodeState]) -> Option<ValidationError> {
        let failed: Vec<&str> = self
            .graph
            .predecessors(idx)
            .into_iter()
            .filter(|&p| matches!(states[p], NodeState::Failed | NodeState::Skipped))
            .map(|p| self.graph.node(p).id.as_str())
            .collect();
        if failed.is_empty() {
            return None;
        }
        let node = self.graph.node(idx);
        Some(
            ValidationError::new(
                ErrorKind::SkippedDueToUpstreamFailure,
                format!(
                    "Node '{}' was skipped because upstream node(s) {} did not complete",
                    node.id,
                    failed.iter().map(|f| format!("'{}'", f)).join(", ")
                ),
            )
            .with_node(&node.id),
        )
    }

    /// Resolves a node's inputs from its predecessors' outputs and its own data.
    ///
    /// Unconnected optional inputs take `data[handle]` when present and are left out
    /// otherwise.
    fn invocation(&self, idx: usize, outputs: &[Option<PortValues>]) -> Invocation {
        let node = self.graph.node(idx);
        let mut inputs = PortValues::new();

        for edge in self.graph.incoming(idx) {
            let (Some(source), Some(_)) = (edge.source_node, edge.target_handle) else {
                continue;
            };
            if let Some(value) = outputs[source]
                .as_ref()
                .and_then(|values| values.get(&edge.source.handle))
            {
                inputs.insert(edge.target.handle.clone(), value.clone());
            }
        }

        if let Some(metadata) = node.metadata {
            for handle in &metadata.inputs {
                if inputs.contains_key(&handle.name) {
                    continue;
                }
                if let Some(default) = node.data.get(&handle.name) {
                    inputs.insert(handle.name.clone(), default.clone());
                }
            }
        }

        Invocation {
            node_id: node.id.clone(),
            kind: node.kind.clone(),
            data: node.data.clone(),
            inputs,
        }
    }
}

fn spawn_node(
    tasks: &mut JoinSet<TaskResult>,
    idx: usize,
    computation: Arc<dyn NodeComputation>,
    invocation: Invocation,
    semaphore: Arc<Semaphore>,
) {
    tasks.spawn(async move {
        let _permit = semaphore.acquire_owned().await.ok();
        let result =
            tokio::task::spawn_blocking(move || computation.compute(&invocation)).await;
        (idx, result)
    });
}

fn describe_join_error(error: JoinError) -> String {
    if !error.is_panic() {
        return format!("computation was aborted: {}", error);
    }
    let payload = error.into_panic();
    let message = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic payload".to_string());
    format!("computation panicked: {}", message)
}
