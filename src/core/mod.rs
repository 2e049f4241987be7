pub mod columns;
pub mod dataframe;
pub mod model;
pub mod node;
pub mod payload;
pub mod ports;

pub use columns::{resolve_target_columns, ColumnSet, ColumnType, NormalizationConfig};
pub use dataframe::{DataFrame, Table};
pub use model::NormalizationModel;
pub use node::ProcessingNode;
pub use payload::{Payload, PortPayloads};
pub use ports::{MetaData, NodeContext, NodePorts, PortSpec, PortType};
