use indexmap::IndexMap;

use super::{DataFrame, NormalizationModel};
use crate::error::FlowError;

/// Value flowing through a single port.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Frame(DataFrame),
    Model(NormalizationModel),
}

/// Payloads keyed by port name.
pub type PortPayloads = IndexMap<String, Payload>;

impl Payload {
    pub fn as_frame(&self) -> Option<&DataFrame> {
        match self {
            Payload::Frame(df) => Some(df),
            _ => None,
        }
    }

    pub fn as_model(&self) -> Option<&NormalizationModel> {
        match self {
            Payload::Model(m) => Some(m),
            _ => None,
        }
    }
}

/// Frame on `port`, failing if it is missing or of another kind.
pub fn frame_input<'a>(inputs: &'a PortPayloads, port: &str) -> Result<&'a DataFrame, FlowError> {
    inputs
        .get(port)
        .ok_or_else(|| FlowError::MissingInput { port: port.to_string() })?
        .as_frame()
        .ok_or_else(|| FlowError::PayloadType {
            port: port.to_string(),
            expected: "dataframe",
        })
}

/// Model on `port` if one was supplied.
pub fn model_input<'a>(
    inputs: &'a PortPayloads,
    port: &str,
) -> Result<Option<&'a NormalizationModel>, FlowError> {
    match inputs.get(port) {
        None => Ok(None),
        Some(payload) => payload.as_model().map(Some).ok_or_else(|| FlowError::PayloadType {
            port: port.to_string(),
            expected: "normalization model",
        }),
    }
}
