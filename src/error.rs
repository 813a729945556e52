use thiserror::Error;

/// Errors that can occur while assembling a `TypeRegistry`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Node kind name must not be empty")]
    EmptyKind,

    #[error("Node kind '{0}' is registered more than once")]
    DuplicateKind(String),

    #[error("Node kind '{kind}' declares the {direction} handle '{handle}' more than once")]
    DuplicateHandle {
        kind: String,
        direction: &'static str,
        handle: String,
    },

    #[error("Catalogue entry '{0}' has no computation bound to it")]
    UnboundKind(String),

    #[error("Failed to parse node catalogue: {0}")]
    CatalogueParseError(String),
}

/// Errors raised by a node computation at runtime.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ComputeError {
    #[error("{0}")]
    Failed(String),

    #[error("Input '{0}' was not provided")]
    MissingInput(String),

    #[error("Invalid node data: {0}")]
    InvalidData(String),

    #[error("Expected {expected} on '{handle}', but found {found}")]
    TypeMismatch {
        handle: String,
        expected: &'static str,
        found: serde_json::Value,
    },
}

/// Errors that can occur when reading a pipeline request off the wire.
#[derive(Error, Debug, Clone)]
pub enum RequestError {
    #[error("Request size {size} bytes exceeds maximum allowed size of {limit} bytes")]
    PayloadTooLarge { size: usize, limit: usize },

    #[error("Failed to parse pipeline request JSON: {0}")]
    JsonParseError(String),

    #[error("Invalid canvas document: {0}")]
    ConversionError(String),
}

/// Errors that can occur when persisting or loading an `ExecutionPlan`.
#[derive(Error, Debug, Clone)]
pub enum PlanError {
    #[error("Plan error: {0}")]
    Generic(String),

    #[error(
        "Plan was built against registry {expected:016x}, but the engine runs registry {found:016x}"
    )]
    RegistryMismatch { expected: u64, found: u64 },

    #[error("Plan cannot be built: the pipeline has {0} validation error(s)")]
    InvalidPipeline(usize),

    #[error("Plan schedule does not match its pipeline: {0}")]
    ScheduleMismatch(String),
}

/// Unrecoverable engine failures. These are contract violations, never user findings.
#[derive(Error, Debug, Clone)]
pub enum EngineError {
    #[error(
        "Internal invariant violated: scheduler found a residual cycle among nodes [{}] after validation passed",
        nodes.join(", ")
    )]
    ResidualCycle { nodes: Vec<String> },

    #[error(transparent)]
    Plan(#[from] PlanError),
}
