use serde::{Deserialize, Serialize};
use std::fmt;

/// Semantic type tag carried by a handle, e.g. `string`, `number` or `any`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DataType(String);

impl DataType {
    pub const ANY: &'static str = "any";

    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    pub fn any() -> Self {
        Self::new(Self::ANY)
    }

    pub fn string() -> Self {
        Self::new("string")
    }

    pub fn number() -> Self {
        Self::new("number")
    }

    pub fn boolean() -> Self {
        Self::new("boolean")
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_any(&self) -> bool {
        self.0 == Self::ANY
    }

    /// An edge may connect two handles when their tags match or either side is `any`.
    pub fn is_compatible_with(&self, target: &DataType) -> bool {
        self == target || self.is_any() || target.is_any()
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn default_required() -> bool {
    true
}

/// A named, typed port declared by a node kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandleDefinition {
    pub name: String,
    pub data_type: DataType,
    /// Only meaningful for inputs.
    #[serde(default = "default_required")]
    pub required: bool,
}

impl HandleDefinition {
    pub fn required(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            required: true,
        }
    }

    pub fn optional(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            required: false,
        }
    }

    pub fn output(name: impl Into<String>, data_type: DataType) -> Self {
        Self::required(name, data_type)
    }
}

/// The immutable description of one node kind: its handles, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeMetadata {
    pub kind: String,
    #[serde(default)]
    pub inputs: Vec<HandleDefinition>,
    #[serde(default)]
    pub outputs: Vec<HandleDefinition>,
}

impl NodeMetadata {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }

    pub fn with_input(mut self, handle: HandleDefinition) -> Self {
        self.inputs.push(handle);
        self
    }

    pub fn with_output(mut self, handle: HandleDefinition) -> Self {
        self.outputs.push(handle);
        self
    }

    pub fn input(&self, name: &str) -> Option<&HandleDefinition> {
        self.inputs.iter().find(|h| h.name == name)
    }

    pub fn output(&self, name: &str) -> Option<&HandleDefinition> {
        self.outputs.iter().find(|h| h.name == name)
    }
}
