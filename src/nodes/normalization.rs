//! Column-wise normalization to zero mean and unit standard deviation.
//!
//! The node has a primary table input (`df_in`) and an optional model input
//! (`norm_data_in`) carrying statistics fitted elsewhere. When a model is
//! supplied it decides which columns are normalized and with which
//! statistics; otherwise the statistics are fitted on the incoming table.

use anyhow::Result;
use indexmap::IndexMap;
use log::{debug, trace, warn};
use serde_json::{json, Value};
use tabflow_macros::FlowNode;

use crate::core::payload::{frame_input, model_input};
use crate::core::{
    resolve_target_columns, ColumnSet, MetaData, NodeContext, NodePorts, NormalizationConfig,
    NormalizationModel, Payload, PortPayloads, PortSpec, PortType, ProcessingNode, Table,
};
use crate::error::FlowError;

pub const INPUT_PORT_NAME: &str = "df_in";
pub const OUTPUT_PORT_NAME: &str = "df_out";
pub const INPUT_NORM_MODEL_NAME: &str = "norm_data_in";
pub const OUTPUT_NORM_MODEL_NAME: &str = "norm_data_out";

const DESCRIPTION: &str = "Normalize the columns to have zero mean and std 1";

#[derive(FlowNode, Debug, Clone, Default)]
#[node_meta(name = "Normalization", category = "Transform")]
#[input(id = "df_in", name = "Table In", data_type = "dataframe")]
#[input(id = "norm_data_in", name = "Model In", data_type = "normalization_data", optional)]
#[output(id = "df_out", name = "Table Out", data_type = "dataframe")]
#[output(id = "norm_data_out", name = "Model Out", data_type = "normalization_data")]
#[param(
    name = "columns",
    kind = "array",
    description = "columns to normalize, or to leave out of normalization when `include` is false"
)]
#[param(
    name = "include",
    kind = "boolean",
    default = "true",
    description = "if true, `columns` are normalized; if false, every other column is"
)]
pub struct NormalizationNode {
    conf: NormalizationConfig,
}

impl NormalizationNode {
    pub fn new(conf: NormalizationConfig) -> Self {
        Self { conf }
    }

    pub fn config(&self) -> &NormalizationConfig {
        &self.conf
    }

    /// JSON-Schema for the node configuration. Once the table input
    /// advertises its columns they are offered as the allowed values of
    /// `columns`.
    pub fn conf_schema(&self, ctx: &NodeContext) -> Value {
        let mut schema = Self::node_metadata().conf_schema(DESCRIPTION);
        if let Some(upstream) = ctx.input_meta(INPUT_PORT_NAME) {
            schema["properties"]["columns"]["items"]["enum"] = json!(upstream.names());
        }
        schema
    }
}

impl ProcessingNode for NormalizationNode {
    fn on_create(&mut self, config: Value) -> Result<()> {
        let config = match config {
            Value::Null => json!({}),
            other => other,
        };
        self.conf = serde_json::from_value(config)
            .map_err(|e| FlowError::Configuration(e.to_string()))?;
        Ok(())
    }

    fn ports_setup(&self, ctx: &NodeContext) -> NodePorts {
        resolve_ports(ctx)
    }

    fn meta_setup(&self, ctx: &NodeContext) -> MetaData {
        drop_unconnected_optional(propagate(&self.conf, ctx), ctx)
    }

    fn process(&self, ctx: &NodeContext, inputs: PortPayloads) -> Result<PortPayloads> {
        let input = frame_input(&inputs, INPUT_PORT_NAME)?;
        let model = model_input(&inputs, INPUT_NORM_MODEL_NAME)?;

        let normalized = normalize(&self.conf, ctx, input, model)?;

        let mut outputs = PortPayloads::new();
        if let Some(frame) = normalized.frame {
            outputs.insert(OUTPUT_PORT_NAME.to_string(), Payload::Frame(frame));
        }
        if let Some(model) = normalized.model {
            outputs.insert(OUTPUT_NORM_MODEL_NAME.to_string(), Payload::Model(model));
        }
        Ok(outputs)
    }
}

/// Table ports follow the upstream table type once `df_in` is connected.
pub fn resolve_ports(ctx: &NodeContext) -> NodePorts {
    let frame_type = ctx
        .connected_inports
        .get(INPUT_PORT_NAME)
        .cloned()
        .unwrap_or_else(PortType::any_frame);

    let mut ports = NodePorts::default();
    ports
        .inports
        .insert(INPUT_PORT_NAME.to_string(), PortSpec::required(frame_type.clone()));
    ports.inports.insert(
        INPUT_NORM_MODEL_NAME.to_string(),
        PortSpec::optional(PortType::normalization_model()),
    );
    ports
        .outports
        .insert(OUTPUT_PORT_NAME.to_string(), PortSpec::required(frame_type));
    ports.outports.insert(
        OUTPUT_NORM_MODEL_NAME.to_string(),
        PortSpec::required(PortType::normalization_model()),
    );
    ports
}

/// Metadata for every port as if all of them were wired.
///
/// A model advertised on `norm_data_in` is authoritative for the normalized
/// columns; otherwise the configuration is applied to the table's columns.
pub fn propagate(conf: &NormalizationConfig, ctx: &NodeContext) -> MetaData {
    let model_meta = ctx.input_meta(INPUT_NORM_MODEL_NAME);
    let frame_meta = ctx.input_meta(INPUT_PORT_NAME);

    match (model_meta, frame_meta) {
        (Some(model), Some(frame)) => {
            debug!("meta: model and table metadata known, model columns rule");
            planned(model.clone(), frame.clone(), model.clone())
        }
        (Some(model), None) => {
            debug!("meta: only model metadata known");
            planned(model.clone(), model.clone(), model.clone())
        }
        (None, Some(frame)) => match resolve_target_columns(conf, Some(&frame.names())) {
            Ok(columns) => {
                debug!("meta: only table metadata known");
                trace!("meta: working columns {:?}", columns);
                let working = frame.project(&columns);
                planned(working.clone(), frame.clone(), working)
            }
            Err(_) => unconstrained(conf),
        },
        (None, None) => {
            debug!("meta: no upstream metadata");
            unconstrained(conf)
        }
    }
}

/// Remove requirements on optional inputs that are not wired.
pub fn drop_unconnected_optional(mut meta: MetaData, ctx: &NodeContext) -> MetaData {
    if !ctx.inport_connected(INPUT_NORM_MODEL_NAME) {
        meta.inports.shift_remove(INPUT_NORM_MODEL_NAME);
    }
    meta
}

fn planned(required: ColumnSet, frame_out: ColumnSet, model_out: ColumnSet) -> MetaData {
    let mut meta = MetaData::default();
    meta.inports
        .insert(INPUT_PORT_NAME.to_string(), required.clone());
    meta.inports
        .insert(INPUT_NORM_MODEL_NAME.to_string(), required);
    meta.outports
        .insert(OUTPUT_PORT_NAME.to_string(), frame_out);
    meta.outports
        .insert(OUTPUT_NORM_MODEL_NAME.to_string(), model_out);
    meta
}

// Nothing upstream: only an explicit include list says anything about outputs.
fn unconstrained(conf: &NormalizationConfig) -> MetaData {
    let partial = match (&conf.columns, conf.include) {
        (Some(columns), true) => ColumnSet::untyped(columns.iter().cloned()),
        _ => ColumnSet::new(),
    };
    planned(ColumnSet::new(), partial.clone(), partial)
}

/// Outputs of one execution. A field is `None` when its port is not
/// connected.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized<T> {
    pub frame: Option<T>,
    pub model: Option<NormalizationModel>,
}

/// Normalize `input`, fitting statistics unless `model` is supplied.
///
/// Only the outputs connected in `ctx` are computed; with neither connected
/// the table is not touched at all.
pub fn normalize<T: Table>(
    conf: &NormalizationConfig,
    ctx: &NodeContext,
    input: &T,
    model: Option<&NormalizationModel>,
) -> Result<Normalized<T>, FlowError> {
    let want_frame = ctx.outport_connected(OUTPUT_PORT_NAME);
    let want_model = ctx.outport_connected(OUTPUT_NORM_MODEL_NAME);
    if !want_frame && !want_model {
        debug!("process: no output connected, skipping");
        return Ok(Normalized {
            frame: None,
            model: None,
        });
    }

    let stats = match model {
        Some(model) => apply_stats(ctx, input, model)?,
        None => fit_stats(conf, ctx, input)?,
    };

    let frame = if want_frame {
        Some(apply(input, &stats)?)
    } else {
        None
    };

    Ok(Normalized {
        frame,
        model: want_model.then_some(stats),
    })
}

// Columns come from the metadata advertised for the model port, not from
// the configuration.
fn apply_stats<T: Table>(
    ctx: &NodeContext,
    input: &T,
    model: &NormalizationModel,
) -> Result<NormalizationModel, FlowError> {
    let columns = ctx
        .input_meta(INPUT_NORM_MODEL_NAME)
        .map(ColumnSet::names)
        .unwrap_or_else(|| model.columns());
    debug!("process: applying supplied model to {} columns", columns.len());

    let mut stats = NormalizationModel::new();
    for column in columns {
        if input.column(&column).is_none() {
            return Err(FlowError::SchemaMismatch { column });
        }
        let (mean, std) = model
            .stats(&column)
            .ok_or_else(|| FlowError::ModelMismatch {
                column: column.clone(),
            })?;
        stats = stats.with_column(column, mean, std);
    }
    Ok(stats)
}

fn fit_stats<T: Table>(
    conf: &NormalizationConfig,
    ctx: &NodeContext,
    input: &T,
) -> Result<NormalizationModel, FlowError> {
    let known = match (&conf.columns, conf.include) {
        (Some(_), true) => None,
        (Some(_), false) => Some(declared_order(ctx, input.column_names())),
        (None, _) => ctx.input_meta(INPUT_PORT_NAME).map(ColumnSet::names),
    };
    let columns = resolve_target_columns(conf, known.as_deref())?;
    debug!("process: fitting statistics on {} columns", columns.len());
    trace!("process: target columns {:?}", columns);

    let mut stats = NormalizationModel::new();
    for column in columns {
        let (Some(mean), Some(std)) = (input.mean(&column), input.std(&column)) else {
            return Err(FlowError::SchemaMismatch { column });
        };
        stats = stats.with_column(column, mean, std);
    }
    Ok(stats)
}

// Columns the table actually has, in the order declared upstream for
// `df_in`; columns the metadata does not mention follow in table order.
fn declared_order(ctx: &NodeContext, actual: Vec<String>) -> Vec<String> {
    let Some(declared) = ctx.input_meta(INPUT_PORT_NAME) else {
        return actual;
    };
    let mut ordered: Vec<String> = declared
        .iter()
        .map(|(name, _)| name)
        .filter(|name| actual.contains(*name))
        .cloned()
        .collect();
    ordered.extend(actual.into_iter().filter(|name| !declared.contains(name)));
    ordered
}

fn apply<T: Table>(input: &T, stats: &NormalizationModel) -> Result<T, FlowError> {
    let mut normalized = IndexMap::with_capacity(stats.mean.len());
    for (column, &mean) in &stats.mean {
        let std = stats.std.get(column).copied().unwrap_or(f64::NAN);
        if std == 0.0 || !std.is_finite() {
            warn!("column '{}' has std {}, output will not be finite", column, std);
        }
        let values = input
            .column(column)
            .ok_or_else(|| FlowError::SchemaMismatch {
                column: column.clone(),
            })?;
        normalized.insert(
            column.clone(),
            values.iter().map(|&v| (v - mean) / std).collect(),
        );
    }
    Ok(input.assign(normalized))
}
