use crate::core::ProcessingNode;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Metadata describing a port (input or output)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortMetadata {
    pub id: String,
    pub name: String,
    pub data_type: String,
    #[serde(default)]
    pub optional: bool,
}

/// Schema for a configurable parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSchema {
    pub name: String,
    #[serde(rename = "type")]
    pub param_type: String,
    pub default: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ParameterSchema {
    /// JSON-Schema property for this parameter. Array parameters are
    /// arrays of strings.
    pub fn to_json_schema(&self) -> Value {
        let mut prop = Map::new();
        prop.insert("type".to_string(), json!(self.param_type));
        if let Some(description) = &self.description {
            prop.insert("description".to_string(), json!(description));
        }
        if self.param_type == "array" {
            prop.insert("items".to_string(), json!({ "type": "string" }));
        }
        if !self.default.is_null() {
            prop.insert("default".to_string(), self.default.clone());
        }
        Value::Object(prop)
    }
}

/// Factory function type for creating node instances
pub type NodeFactory = fn() -> Box<dyn ProcessingNode>;

/// Complete metadata for a node type
#[derive(Clone)]
pub struct NodeMetadata {
    pub id: String,
    pub name: String,
    pub category: String,
    pub inputs: Vec<PortMetadata>,
    pub outputs: Vec<PortMetadata>,
    pub parameters: Vec<ParameterSchema>,
    pub factory: NodeFactory,
}

impl NodeMetadata {
    /// Create a new instance of this node type
    pub fn create_instance(&self) -> Box<dyn ProcessingNode> {
        (self.factory)()
    }

    pub fn input(&self, id: &str) -> Option<&PortMetadata> {
        self.inputs.iter().find(|p| p.id == id)
    }

    pub fn output(&self, id: &str) -> Option<&PortMetadata> {
        self.outputs.iter().find(|p| p.id == id)
    }

    /// JSON-Schema object describing the node configuration.
    pub fn conf_schema(&self, description: &str) -> Value {
        let properties: Map<String, Value> = self
            .parameters
            .iter()
            .map(|p| (p.name.clone(), p.to_json_schema()))
            .collect();

        json!({
            "title": format!("{} Node configure", self.name),
            "type": "object",
            "description": description,
            "properties": properties,
            "required": [],
        })
    }
}

impl std::fmt::Debug for NodeMetadata {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeMetadata")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("category", &self.category)
            .field("inputs", &self.inputs)
            .field("outputs", &self.outputs)
            .field("parameters", &self.parameters)
            .finish()
    }
}

// Factory type for creating node metadata at runtime
pub type NodeMetadataFactory = fn() -> NodeMetadata;

// Wrapper for inventory collection
pub struct NodeMetadataFactoryWrapper(pub NodeMetadataFactory);

// Inventory submission type
inventory::collect!(NodeMetadataFactoryWrapper);
