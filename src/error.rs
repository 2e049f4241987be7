use thiserror::Error;

/// Errors raised by nodes and the registry.
///
/// Planning (`ports_setup` / `meta_setup`) never fails; everything here
/// surfaces from construction or execution.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FlowError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("column '{column}' not found in input table")]
    SchemaMismatch { column: String },

    #[error("column '{column}' not present in normalization model")]
    ModelMismatch { column: String },

    #[error("missing payload on input port '{port}'")]
    MissingInput { port: String },

    #[error("input port '{port}' expected a {expected} payload")]
    PayloadType { port: String, expected: &'static str },

    #[error("unknown node type: {0}")]
    UnknownNode(String),
}
