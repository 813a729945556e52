//! Prelude module for convenient imports
//!
//! This module re-exports the most commonly used types and traits from the nagare crate.
//!
//! # Example
//!
//! ```rust,no_run
//! use nagare::prelude::*;
//!
//! # fn run_example() -> Result<()> {
//! let registry = Arc::new(TypeRegistry::builder().with_builtin_kinds().build()?);
//! let engine = Engine::new(registry);
//!
//! let request_json = std::fs::read_to_string("path/to/pipeline.json")?;
//! let request = PipelineRequest::from_json(&request_json)?;
//!
//! let response = tokio_test::block_on(engine.run(&request))?;
//! println!("{}", ReportFormatter::format_response(&response));
//! # Ok(())
//! # }
//! ```

// Engine and configuration
pub use crate::config::EngineConfig;
pub use crate::engine::{Analysis, Engine, EngineBuilder};
pub use crate::plan::ExecutionPlan;
pub use crate::schedule::{Schedule, Scheduler};

// Registry
pub use crate::registry::{
    DataType, HandleDefinition, Invocation, NodeComputation, NodeMetadata, PortValues,
    RegistryBuilder, TypeRegistry,
};

// Request and response contract
pub use crate::editor::CanvasDocument;
pub use crate::pipeline::{
    EdgeRecord, ErrorKind, HandleRef, IntoPipeline, NodeRecord, PipelineRequest,
    PipelineResponse, PipelineStatus, ValidationError, ValidationResult,
};

// Error types
pub use crate::error::{ComputeError, EngineError, PlanError, RegistryError, RequestError};

// Report formatting
pub use crate::report::ReportFormatter;

pub use std::sync::Arc;
pub use tokio_util::sync::CancellationToken;

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;
