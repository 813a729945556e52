//! The request-level entry point tying validation, scheduling and execution together.

use crate::aggregate::aggregate;
use crate::config::EngineConfig;
use crate::error::{EngineError, PlanError};
use crate::graph::GraphStats;
use crate::pipeline::{ErrorKind, PipelineRequest, PipelineResponse, ValidationResult};
use crate::plan::ExecutionPlan;
use crate::registry::TypeRegistry;
use crate::schedule::Scheduler;
use crate::validation::validate_request;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

mod executor;

use executor::Executor;
pub use executor::{ExecutionOutcome, Interruption};

/// A validation-only inspection of a request, with graph figures attached.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Analysis {
    pub response: PipelineResponse,
    pub stats: GraphStats,
    pub is_dag: bool,
    pub processing_time_ms: f64,
}

/// Validates, schedules and executes pipeline requests.
///
/// An `Engine` holds no per-request state. Wrap it in an `Arc` and share it across
/// as many concurrent requests as needed.
#[derive(Debug, Clone)]
pub struct Engine {
    registry: Arc<TypeRegistry>,
    config: EngineConfig,
}

pub struct EngineBuilder {
    registry: Arc<TypeRegistry>,
    config: EngineConfig,
}

impl EngineBuilder {
    pub fn new(registry: Arc<TypeRegistry>) -> Self {
        Self {
            registry,
            config: EngineConfig::default(),
        }
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_max_concurrent_nodes(mut self, max: usize) -> Self {
        self.config.max_concurrent_nodes = max.max(1);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = Some(timeout);
        self
    }

    pub fn build(self) -> Engine {
        Engine {
            registry: self.registry,
            config: self.config,
        }
    }
}

impl Engine {
    pub fn builder(registry: Arc<TypeRegistry>) -> EngineBuilder {
        EngineBuilder::new(registry)
    }

    pub fn new(registry: Arc<TypeRegistry>) -> Self {
        EngineBuilder::new(registry).build()
    }

    pub fn registry(&self) -> &Arc<TypeRegistry> {
        &self.registry
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Builds and validates the graph without running anything.
    pub fn validate(&self, request: &PipelineRequest) -> ValidationResult {
        validate_request(&self.registry, request).1
    }

    /// Validation-only response: `valid` or `invalid`.
    pub fn check(&self, request: &PipelineRequest) -> PipelineResponse {
        aggregate(&self.validate(request), None)
    }

    pub fn analyze(&self, request: &PipelineRequest) -> Analysis {
        let started = Instant::now();
        let (graph, validation) = validate_request(&self.registry, request);
        let stats = graph.stats();
        let is_dag = !validation.has(ErrorKind::CycleDetected);
        let response = aggregate(&validation, None);
        let processing_time_ms = started.elapsed().as_secs_f64() * 1000.0;

        tracing::info!(
            nodes = stats.node_count,
            edges = stats.edge_count,
            is_dag,
            errors = response.errors.len(),
            processing_time_ms,
            "Pipeline analysis complete"
        );
        Analysis {
            response,
            stats,
            is_dag,
            processing_time_ms,
        }
    }

    /// Validates and schedules a request once, for repeated execution later.
    pub fn plan(&self, request: &PipelineRequest) -> Result<ExecutionPlan, EngineError> {
        let (graph, validation) = validate_request(&self.registry, request);
        if !validation.is_valid {
            return Err(PlanError::InvalidPipeline(validation.errors.len()).into());
        }
        let schedule = Scheduler::schedule(&graph)?;
        Ok(ExecutionPlan::new(
            request.clone(),
            schedule,
            self.registry.fingerprint(),
        ))
    }

    /// Validates, schedules and executes a request.
    ///
    /// The only `Err` is an internal invariant violation; every user-facing problem
    /// is reported inside the returned response.
    pub async fn run(&self, request: &PipelineRequest) -> Result<PipelineResponse, EngineError> {
        self.run_with_cancellation(request, CancellationToken::new())
            .await
    }

    /// Like `run`, but stops at the next layer boundary once `cancel` fires.
    pub async fn run_with_cancellation(
        &self,
        request: &PipelineRequest,
        cancel: CancellationToken,
    ) -> Result<PipelineResponse, EngineError> {
        let started = Instant::now();
        tracing::info!(
            nodes = request.nodes.len(),
            edges = request.edges.len(),
            "Processing pipeline"
        );

        let (graph, validation) = validate_request(&self.registry, request);
        if !validation.is_valid {
            tracing::info!(errors = validation.errors.len(), "Pipeline is invalid");
            return Ok(aggregate(&validation, None));
        }

        let schedule = Scheduler::schedule(&graph)?;
        let outcome = Executor::new(&graph, &self.registry, &self.config, cancel)
            .execute(&schedule)
            .await;
        let response = aggregate(&validation, Some(outcome));

        tracing::info!(
            status = %response.status,
            errors = response.errors.len(),
            elapsed_ms = started.elapsed().as_secs_f64() * 1000.0,
            "Pipeline run complete"
        );
        Ok(response)
    }

    /// Executes a previously built plan.
    ///
    /// The plan's request is validated again and its schedule checked against the
    /// rebuilt graph, since a plan loaded from disk may have been edited. Mismatches
    /// come back as `Err`, never as a partial run.
    pub async fn execute_plan(&self, plan: &ExecutionPlan) -> Result<PipelineResponse, EngineError> {
        self.execute_plan_with_cancellation(plan, CancellationToken::new())
            .await
    }

    pub async fn execute_plan_with_cancellation(
        &self,
        plan: &ExecutionPlan,
        cancel: CancellationToken,
    ) -> Result<PipelineResponse, EngineError> {
        let fingerprint = self.registry.fingerprint();
        if plan.registry_fingerprint() != fingerprint {
            return Err(PlanError::RegistryMismatch {
                expected: plan.registry_fingerprint(),
                found: fingerprint,
            }
            .into());
        }

        let (graph, validation) = validate_request(&self.registry, plan.request());
        if !validation.is_valid {
            tracing::warn!(errors = validation.errors.len(), "Plan request no longer validates");
            return Err(PlanError::InvalidPipeline(validation.errors.len()).into());
        }
        if let Err(e) = plan.schedule().check_against(&graph) {
            tracing::warn!(error = %e, "Plan schedule rejected");
            return Err(e.into());
        }

        let outcome = Executor::new(&graph, &self.registry, &self.config, cancel)
            .execute(plan.schedule())
            .await;
        Ok(aggregate(&validation, Some(outcome)))
    }
}
