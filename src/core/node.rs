use anyhow::Result;
use serde_json::Value;

use super::{MetaData, NodeContext, NodePorts, PortPayloads};

/// Base trait for all processing nodes in a graph
///
/// Planning calls (`ports_setup`, `meta_setup`) may be repeated any number of
/// times as the graph is edited and must depend only on the node's
/// configuration and the supplied context.
pub trait ProcessingNode: Send + Sync {
    /// Called once when node is instantiated with config from JSON
    fn on_create(&mut self, config: Value) -> Result<()>;

    /// Port types to advertise given the current connectivity
    fn ports_setup(&self, ctx: &NodeContext) -> NodePorts;

    /// Column requirements and guarantees given upstream metadata
    fn meta_setup(&self, ctx: &NodeContext) -> MetaData;

    /// Run the node on concrete inputs, returning payloads for connected outputs only
    fn process(&self, ctx: &NodeContext, inputs: PortPayloads) -> Result<PortPayloads>;
}
