//! Folds validation findings and execution outcomes into a `PipelineResponse`.

use crate::engine::{ExecutionOutcome, Interruption};
use crate::pipeline::{PipelineResponse, PipelineStatus, ValidationResult};

/// Merges the upstream result sets into the response contract.
///
/// Status precedence: `invalid` when validation found anything, `valid` when no
/// execution was requested, `executed` when every node produced results, `failed`
/// otherwise. A timed-out run discards its partial results.
pub fn aggregate(validation: &ValidationResult, execution: Option<ExecutionOutcome>) -> PipelineResponse {
    if !validation.is_valid {
        return PipelineResponse {
            status: PipelineStatus::Invalid,
            results: None,
            errors: validation.errors.clone(),
        };
    }

    let Some(outcome) = execution else {
        return PipelineResponse {
            status: PipelineStatus::Valid,
            results: None,
            errors: Vec::new(),
        };
    };

    let status = if outcome.errors.is_empty() {
        PipelineStatus::Executed
    } else {
        PipelineStatus::Failed
    };
    let results = match outcome.interruption {
        Some(Interruption::Timeout) => None,
        _ => Some(outcome.results),
    };

    PipelineResponse {
        status,
        results,
        errors: outcome.errors,
    }
}
