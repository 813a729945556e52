use crate::error::ComputeError;
use serde_json::Value;
use std::collections::BTreeMap;

/// Values flowing through a node's handles, keyed by handle name.
pub type PortValues = BTreeMap<String, Value>;

/// Everything a computation gets to see about the node it runs for.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub node_id: String,
    pub kind: String,
    pub data: Value,
    pub inputs: PortValues,
}

impl Invocation {
    pub fn input(&self, handle: &str) -> Result<&Value, ComputeError> {
        self.inputs
            .get(handle)
            .ok_or_else(|| ComputeError::MissingInput(handle.to_string()))
    }

    pub fn number(&self, handle: &str) -> Result<f64, ComputeError> {
        let value = self.input(handle)?;
        value.as_f64().ok_or_else(|| ComputeError::TypeMismatch {
            handle: handle.to_string(),
            expected: "number",
            found: value.clone(),
        })
    }

    pub fn text(&self, handle: &str) -> Result<&str, ComputeError> {
        let value = self.input(handle)?;
        value.as_str().ok_or_else(|| ComputeError::TypeMismatch {
            handle: handle.to_string(),
            expected: "string",
            found: value.clone(),
        })
    }

    /// Looks up a configuration field in the node's `data` object.
    pub fn data_field(&self, field: &str) -> Option<&Value> {
        self.data.get(field)
    }
}

/// The contract every node kind's computation fulfils.
///
/// Computations must be pure given their invocation: the engine may run them on any
/// worker thread, concurrently with unrelated nodes of the same request.
pub trait NodeComputation: Send + Sync {
    fn compute(&self, invocation: &Invocation) -> Result<PortValues, ComputeError>;
}

impl<F> NodeComputation for F
where
    F: Fn(&Invocation) -> Result<PortValues, ComputeError> + Send + Sync,
{
    fn compute(&self, invocation: &Invocation) -> Result<PortValues, ComputeError> {
        self(invocation)
    }
}
