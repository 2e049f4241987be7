pub mod metadata;

pub use metadata::{
    NodeFactory, NodeMetadata, NodeMetadataFactory, NodeMetadataFactoryWrapper, ParameterSchema,
    PortMetadata,
};

use anyhow::Result;
use indexmap::IndexMap;
use serde_json::Value;

use crate::core::ProcessingNode;
use crate::error::FlowError;

/// Every node type submitted through `#[derive(FlowNode)]`.
pub fn all_nodes() -> Vec<NodeMetadata> {
    inventory::iter::<NodeMetadataFactoryWrapper>
        .into_iter()
        .map(|wrapper| (wrapper.0)())
        .collect()
}

/// Metadata for a single node type by id.
pub fn find(id: &str) -> Option<NodeMetadata> {
    all_nodes().into_iter().find(|n| n.id == id)
}

/// Node types keyed by id, snapshotted from the inventory.
pub struct NodeRegistry {
    nodes: IndexMap<String, NodeMetadata>,
}

impl Default for NodeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeRegistry {
    pub fn new() -> Self {
        let mut nodes: Vec<NodeMetadata> = all_nodes();
        nodes.sort_by(|a, b| a.id.cmp(&b.id));
        Self {
            nodes: nodes.into_iter().map(|n| (n.id.clone(), n)).collect(),
        }
    }

    pub fn get(&self, id: &str) -> Option<&NodeMetadata> {
        self.nodes.get(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(String::as_str)
    }

    /// Instantiate a node type and hand it its configuration.
    pub fn create(&self, id: &str, config: Value) -> Result<Box<dyn ProcessingNode>> {
        let meta = self
            .get(id)
            .ok_or_else(|| FlowError::UnknownNode(id.to_string()))?;
        let mut node = meta.create_instance();
        node.on_create(config)?;
        log::debug!("created node '{}' ({})", meta.id, meta.name);
        Ok(node)
    }
}
