use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

use super::ColumnSet;

/// Data type advertised on a port, e.g. `dataframe` or `normalization_data`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PortType(pub String);

impl PortType {
    pub const ANY_FRAME: &'static str = "dataframe";
    pub const NORMALIZATION_MODEL: &'static str = "normalization_data";

    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Generic tabular type, used while nothing is known upstream.
    pub fn any_frame() -> Self {
        Self::new(Self::ANY_FRAME)
    }

    pub fn normalization_model() -> Self {
        Self::new(Self::NORMALIZATION_MODEL)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortSpec {
    pub port_type: PortType,
    #[serde(default)]
    pub optional: bool,
}

impl PortSpec {
    pub fn required(port_type: PortType) -> Self {
        Self { port_type, optional: false }
    }

    pub fn optional(port_type: PortType) -> Self {
        Self { port_type, optional: true }
    }
}

/// Port-type declarations for every port of a node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodePorts {
    pub inports: IndexMap<String, PortSpec>,
    pub outports: IndexMap<String, PortSpec>,
}

/// Column requirements on inputs and guarantees on outputs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaData {
    pub inports: IndexMap<String, ColumnSet>,
    pub outports: IndexMap<String, ColumnSet>,
}

/// Snapshot of graph state handed to a node by the engine.
///
/// Nodes only read it; the engine rebuilds it whenever the graph changes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeContext {
    /// Connected input ports and the type declared by their producer
    pub connected_inports: IndexMap<String, PortType>,
    /// Output ports wired to at least one consumer
    pub connected_outports: IndexSet<String>,
    /// Column sets advertised by producers, per input port
    pub input_meta: IndexMap<String, ColumnSet>,
}

impl NodeContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connect_input(mut self, port: impl Into<String>, port_type: PortType) -> Self {
        self.connected_inports.insert(port.into(), port_type);
        self
    }

    pub fn connect_output(mut self, port: impl Into<String>) -> Self {
        self.connected_outports.insert(port.into());
        self
    }

    pub fn with_input_meta(mut self, port: impl Into<String>, meta: ColumnSet) -> Self {
        self.input_meta.insert(port.into(), meta);
        self
    }

    pub fn inport_connected(&self, port: &str) -> bool {
        self.connected_inports.contains_key(port)
    }

    pub fn outport_connected(&self, port: &str) -> bool {
        self.connected_outports.contains(port)
    }

    pub fn input_meta(&self, port: &str) -> Option<&ColumnSet> {
        self.input_meta.get(port)
    }
}
