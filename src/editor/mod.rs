//! The canvas document as the visual editor stores and submits it.
//!
//! Canvas edges are flat (`source`, `sourceHandle`, `target`, `targetHandle`) and nodes
//! carry their kind under `type` alongside layout information the engine ignores.

use crate::error::RequestError;
use crate::pipeline::{EdgeRecord, HandleRef, IntoPipeline, NodeRecord, PipelineRequest};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CanvasPoint {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanvasNode {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub position: CanvasPoint,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(default)]
    pub source_handle: Option<String>,
    #[serde(default)]
    pub target_handle: Option<String>,
}

/// Version stamp the editor writes next to the graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanvasMetadata {
    #[serde(default = "default_version")]
    pub version: String,
}

fn default_version() -> String {
    "1.0.0".to_string()
}

/// A complete canvas as exported by the editor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanvasDocument {
    pub nodes: Vec<CanvasNode>,
    #[serde(default)]
    pub edges: Vec<CanvasEdge>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<CanvasMetadata>,
}

impl CanvasDocument {
    pub fn from_json(json: &str) -> Result<Self, RequestError> {
        serde_json::from_str(json).map_err(|e| RequestError::JsonParseError(e.to_string()))
    }

    pub fn from_json_limited(json: &str, limit: usize) -> Result<Self, RequestError> {
        if json.len() > limit {
            return Err(RequestError::PayloadTooLarge {
                size: json.len(),
                limit,
            });
        }
        Self::from_json(json)
    }
}

fn require_handle(edge: &CanvasEdge, handle: &Option<String>, side: &str) -> Result<String, RequestError> {
    match handle.as_deref() {
        Some(name) if !name.trim().is_empty() => Ok(name.to_string()),
        _ => Err(RequestError::ConversionError(format!(
            "Edge '{}' has no {} handle",
            edge.id, side
        ))),
    }
}

impl IntoPipeline for CanvasDocument {
    fn into_pipeline(self) -> Result<PipelineRequest, RequestError> {
        let nodes = self
            .nodes
            .into_iter()
            .map(|node| {
                let record = NodeRecord::new(node.id, node.node_type);
                match node.data {
                    Some(data) if !data.is_null() => record.with_data(data),
                    _ => record,
                }
            })
            .collect();

        let edges = self
            .edges
            .iter()
            .map(|edge| {
                let source = require_handle(edge, &edge.source_handle, "source")?;
                let target = require_handle(edge, &edge.target_handle, "target")?;
                Ok(EdgeRecord::new(
                    edge.id.clone(),
                    HandleRef::new(edge.source.clone(), source),
                    HandleRef::new(edge.target.clone(), target),
                ))
            })
            .collect::<Result<Vec<_>, RequestError>>()?;

        Ok(PipelineRequest::new(nodes, edges))
    }
}
