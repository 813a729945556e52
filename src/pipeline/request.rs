use crate::error::RequestError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One end of an edge: a node id and a handle name on that node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandleRef {
    pub node_id: String,
    pub handle: String,
}

impl HandleRef {
    pub fn new(node_id: impl Into<String>, handle: impl Into<String>) -> Self {
        Self {
            node_id: node_id.into(),
            handle: handle.into(),
        }
    }
}

fn empty_object() -> Value {
    Value::Object(serde_json::Map::new())
}

/// A node placed on the canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub id: String,
    pub kind: String,
    #[serde(default = "empty_object")]
    pub data: Value,
}

impl NodeRecord {
    pub fn new(id: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
            data: empty_object(),
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = data;
        self
    }
}

/// A connection from an output handle to an input handle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeRecord {
    pub id: String,
    pub source: HandleRef,
    pub target: HandleRef,
}

impl EdgeRecord {
    pub fn new(id: impl Into<String>, source: HandleRef, target: HandleRef) -> Self {
        Self {
            id: id.into(),
            source,
            target,
        }
    }
}

/// The flat graph description submitted by the editor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineRequest {
    pub nodes: Vec<NodeRecord>,
    #[serde(default)]
    pub edges: Vec<EdgeRecord>,
}

impl PipelineRequest {
    pub fn new(nodes: Vec<NodeRecord>, edges: Vec<EdgeRecord>) -> Self {
        Self { nodes, edges }
    }

    pub fn from_json(json: &str) -> Result<Self, RequestError> {
        serde_json::from_str(json).map_err(|e| RequestError::JsonParseError(e.to_string()))
    }

    /// Parses a request, refusing payloads larger than `limit` bytes before touching them.
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
