pub mod core;
pub mod error;
pub mod nodes;
pub mod registry;

pub use error::FlowError;
