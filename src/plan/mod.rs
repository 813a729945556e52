use crate::error::PlanError;
use crate::pipeline::PipelineRequest;
use crate::schedule::Schedule;
use bincode::config::standard;
use bincode::serde::{decode_from_slice, encode_to_vec};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{Read, Write};

const PLAN_FORMAT_VERSION: u32 = 1;

/// A request that has already been validated and scheduled.
///
/// Produced by `Engine::plan` and run with `Engine::execute_plan`, which refuses
/// plans built against another registry or whose schedule no longer fits the
/// request.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionPlan {
    request: PipelineRequest,
    schedule: Schedule,
    registry_fingerprint: u64,
}

// On-disk form. Node data is free-form JSON, which bincode cannot encode directly,
// so the request travels as a JSON string.
#[derive(Serialize, Deserialize)]
struct PlanArtifact {
    version: u32,
    registry_fingerprint: u64,
    request_json: String,
    schedule: Schedule,
}

impl ExecutionPlan {
    pub fn new(request: PipelineRequest, schedule: Schedule, registry_fingerprint: u64) -> Self {
        Self {
            request,
            schedule,
            registry_fingerprint,
        }
    }

    pub fn request(&self) -> &PipelineRequest {
        &self.request
    }

    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    pub fn registry_fingerprint(&self) -> u64 {
        self.registry_fingerprint
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, PlanError> {
        let request_json = serde_json::to_string(&self.request)
            .map_err(|e| PlanError::Generic(format!("Request encoding failed: {}", e)))?;
        let artifact = PlanArtifact {
            version: PLAN_FORMAT_VERSION,
            registry_fingerprint: self.registry_fingerprint,
            request_json,
            schedule: self.schedule.clone(),
        };
        encode_to_vec(&artifact, standard())
            .map_err(|e| PlanError::Generic(format!("Serialization failed: {}", e)))
    }

    /// Deserializes a plan from a byte slice.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PlanError> {
        let (artifact, _): (PlanArtifact, usize) = decode_from_slice(bytes, standard())
            .map_err(|e| PlanError::Generic(format!("Deserialization failed: {}", e)))?;
        if artifact.version != PLAN_FORMAT_VERSION {
            return Err(PlanError::Generic(format!(
                "Unsupported plan format version {} (expected {})",
                artifact.version, PLAN_FORMAT_VERSION
            )));
        }
        let request = PipelineRequest::from_json(&artifact.request_json)
            .map_err(|e| PlanError::Generic(e.to_string()))?;
        Ok(Self {
            request,
            schedule: artifact.schedule,
            registry_fingerprint: artifact.registry_fingerprint,
        })
    }

    /// Saves the plan to a file using the bincode format.
    pub fn save(&self, path: &str) -> Result<(), PlanError> {
        let bytes = self.to_bytes()?;
        let mut file = fs::File::create(path)
            .map_err(|e| PlanError::Generic(format!("Could not create file '{}': {}", path, e)))?;
        file.write_all(&bytes).map_err(|e| {
            PlanError::Generic(format!("Could not write to file '{}': {}", path, e))
        })?;
        Ok(())
    }

    /// Loads a plan from a file.
    pub fn from_file(path: &str) -> Result<Self, PlanError> {
        let mut file = fs::File::open(path)
            .map_err(|e| PlanError::Generic(format!("Could not open file '{}': {}", path, e)))?;
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes).map_err(|e| {
            PlanError::Generic(format!("Could not read from file '{}': {}", path, e))
        })?;
        Self::from_bytes(&bytes)
    }
}
