use std::cell::Cell;

use indexmap::IndexMap;
use serde_json::json;
use tabflow::core::{
    ColumnSet, DataFrame, NodeContext, NormalizationConfig, NormalizationModel, Payload,
    PortPayloads, PortType, ProcessingNode, Table,
};
use tabflow::nodes::normalization::{
    normalize, INPUT_NORM_MODEL_NAME, INPUT_PORT_NAME, OUTPUT_NORM_MODEL_NAME, OUTPUT_PORT_NAME,
};
use tabflow::nodes::NormalizationNode;
use tabflow::FlowError;

fn node(config: serde_json::Value) -> NormalizationNode {
    let mut node = NormalizationNode::default();
    node.on_create(config).unwrap();
    node
}

fn both_outputs() -> NodeContext {
    NodeContext::new()
        .connect_input(INPUT_PORT_NAME, PortType::any_frame())
        .connect_output(OUTPUT_PORT_NAME)
        .connect_output(OUTPUT_NORM_MODEL_NAME)
}

fn inputs(df: DataFrame) -> PortPayloads {
    let mut inputs = PortPayloads::new();
    inputs.insert(INPUT_PORT_NAME.to_string(), Payload::Frame(df));
    inputs
}

fn inputs_with_model(df: DataFrame, model: NormalizationModel) -> PortPayloads {
    let mut inputs = inputs(df);
    inputs.insert(INPUT_NORM_MODEL_NAME.to_string(), Payload::Model(model));
    inputs
}

fn frame_out(outputs: &PortPayloads) -> &DataFrame {
    outputs[OUTPUT_PORT_NAME].as_frame().expect("frame on df_out")
}

fn model_out(outputs: &PortPayloads) -> &NormalizationModel {
    outputs[OUTPUT_NORM_MODEL_NAME].as_model().expect("model on norm_data_out")
}

fn flow_error(err: &anyhow::Error) -> &FlowError {
    err.downcast_ref::<FlowError>().expect("FlowError")
}

#[test]
fn test_fit_single_column() {
    let node = node(json!({"columns": ["a"]}));
    let df = DataFrame::new()
        .with_column("a", vec![1.0, 2.0, 3.0])
        .with_column("b", vec![10.0, 20.0, 30.0]);

    let outputs = node.process(&both_outputs(), inputs(df)).unwrap();

    let out = frame_out(&outputs);
    assert_eq!(out.column("a").unwrap(), &[-1.0, 0.0, 1.0]);
    assert_eq!(out.column("b").unwrap(), &[10.0, 20.0, 30.0]);
    assert_eq!(out.column_names(), vec!["a", "b"]);

    assert_eq!(model_out(&outputs), &NormalizationModel::new().with_column("a", 2.0, 1.0));
}

#[test]
fn test_apply_supplied_model_without_refitting() {
    let node = node(json!({"columns": ["zzz"]}));
    let model = NormalizationModel::new().with_column("a", 2.0, 1.0);
    let ctx = both_outputs()
        .connect_input(INPUT_NORM_MODEL_NAME, PortType::normalization_model())
        .with_input_meta(INPUT_NORM_MODEL_NAME, ColumnSet::untyped(["a"]));
    let df = DataFrame::new().with_column("a", vec![2.0, 3.0, 4.0]);

    let outputs = node.process(&ctx, inputs_with_model(df, model.clone())).unwrap();

    assert_eq!(frame_out(&outputs).column("a").unwrap(), &[0.0, 1.0, 2.0]);
    assert_eq!(model_out(&outputs), &model);
}

#[test]
fn test_apply_columns_come_from_model_port_metadata() {
    let node = node(json!({}));
    let model = NormalizationModel::new()
        .with_column("a", 1.0, 2.0)
        .with_column("b", 10.0, 5.0);
    let ctx = both_outputs()
        .connect_input(INPUT_NORM_MODEL_NAME, PortType::normalization_model())
        .with_input_meta(INPUT_NORM_MODEL_NAME, ColumnSet::untyped(["b"]));
    let df = DataFrame::new()
        .with_column("a", vec![1.0, 3.0])
        .with_column("b", vec![10.0, 20.0]);

    let outputs = node.process(&ctx, inputs_with_model(df, model)).unwrap();

    let out = frame_out(&outputs);
    assert_eq!(out.column("a").unwrap(), &[1.0, 3.0]);
    assert_eq!(out.column("b").unwrap(), &[0.0, 2.0]);
    assert_eq!(model_out(&outputs), &NormalizationModel::new().with_column("b", 10.0, 5.0));
}

#[test]
fn test_apply_without_model_metadata_uses_model_columns() {
    let node = node(json!({}));
    let model = NormalizationModel::new().with_column("a", 1.0, 2.0);
    let df = DataFrame::new().with_column("a", vec![1.0, 5.0]);

    let outputs = node.process(&both_outputs(), inputs_with_model(df, model)).unwrap();
    assert_eq!(frame_out(&outputs).column("a").unwrap(), &[0.0, 2.0]);
}

#[test]
fn test_fit_then_apply_matches() {
    let df = DataFrame::new()
        .with_column("x", vec![0.3, 1.7, -2.2, 9.1, 4.4])
        .with_column("y", vec![1.0, 1.0, 2.0, 3.0, 5.0])
        .with_column("z", vec![7.0, 8.0, 9.0, 10.0, 11.0]);
    let node = node(json!({"columns": ["z"], "include": false}));

    let fitted = node.process(&both_outputs(), inputs(df.clone())).unwrap();
    let model = model_out(&fitted).clone();
    assert_eq!(model.columns(), vec!["x", "y"]);

    let ctx = both_outputs()
        .connect_input(INPUT_NORM_MODEL_NAME, PortType::normalization_model())
        .with_input_meta(INPUT_NORM_MODEL_NAME, ColumnSet::untyped(model.columns()));
    let applied = node.process(&ctx, inputs_with_model(df, model.clone())).unwrap();

    assert_eq!(frame_out(&applied), frame_out(&fitted));
    assert_eq!(model_out(&applied), &model);
}

#[test]
fn test_exclude_without_metadata_uses_table_order() {
    let node = node(json!({"columns": ["b"], "include": false}));
    let df = DataFrame::new()
        .with_column("c", vec![1.0, 3.0])
        .with_column("b", vec![5.0, 7.0])
        .with_column("a", vec![0.0, 2.0]);

    let outputs = node.process(&both_outputs(), inputs(df)).unwrap();

    assert_eq!(model_out(&outputs).columns(), vec!["c", "a"]);
    let out = frame_out(&outputs);
    assert_eq!(out.column_names(), vec!["c", "b", "a"]);
    assert_eq!(out.column("b").unwrap(), &[5.0, 7.0]);
}

#[test]
fn test_exclude_follows_declared_order() {
    let node = node(json!({"columns": ["b"], "include": false}));
    let ctx = both_outputs().with_input_meta(INPUT_PORT_NAME, ColumnSet::untyped(["a", "b", "c"]));
    let df = DataFrame::new()
        .with_column("c", vec![1.0, 3.0])
        .with_column("b", vec![5.0, 7.0])
        .with_column("a", vec![0.0, 2.0]);

    let planned = node.meta_setup(&ctx).outports[OUTPUT_NORM_MODEL_NAME].names();
    let outputs = node.process(&ctx, inputs(df)).unwrap();

    assert_eq!(planned, vec!["a", "c"]);
    assert_eq!(model_out(&outputs).columns(), planned);
    // the table itself keeps its own layout
    assert_eq!(frame_out(&outputs).column_names(), vec!["c", "b", "a"]);
}

#[test]
fn test_exclude_appends_undeclared_columns() {
    let node = node(json!({"columns": ["b"], "include": false}));
    let ctx = both_outputs().with_input_meta(INPUT_PORT_NAME, ColumnSet::untyped(["c", "b", "gone"]));
    let df = DataFrame::new()
        .with_column("d", vec![1.0, 2.0])
        .with_column("b", vec![5.0, 7.0])
        .with_column("c", vec![0.0, 2.0]);

    let outputs = node.process(&ctx, inputs(df)).unwrap();
    assert_eq!(model_out(&outputs).columns(), vec!["c", "d"]);
}

#[test]
fn test_on_create_null_config_uses_defaults() {
    let node = node(serde_json::Value::Null);
    assert_eq!(node.config(), &NormalizationConfig::default());

    let excluding = self::node(json!({"columns": ["a"], "include": false}));
    assert_eq!(excluding.config().columns, Some(vec!["a".to_string()]));
    assert!(!excluding.config().include);
}

#[test]
fn test_absent_columns_use_upstream_metadata() {
    let node = node(json!({}));
    let ctx = both_outputs().with_input_meta(INPUT_PORT_NAME, ColumnSet::untyped(["b"]));
    let df = DataFrame::new()
        .with_column("a", vec![1.0, 2.0])
        .with_column("b", vec![1.0, 3.0]);

    let outputs = node.process(&ctx, inputs(df)).unwrap();
    assert_eq!(model_out(&outputs).columns(), vec!["b"]);
    assert_eq!(frame_out(&outputs).column("a").unwrap(), &[1.0, 2.0]);
}

#[test]
fn test_absent_columns_without_metadata_is_configuration_error() {
    let node = node(json!({}));
    let df = DataFrame::new().with_column("a", vec![1.0, 2.0]);

    let err = node.process(&both_outputs(), inputs(df)).unwrap_err();
    assert!(matches!(flow_error(&err), FlowError::Configuration(_)));
}

#[test]
fn test_missing_target_column_is_schema_mismatch() {
    let node = node(json!({"columns": ["a", "q"]}));
    let df = DataFrame::new().with_column("a", vec![1.0, 2.0]);

    let err = node.process(&both_outputs(), inputs(df)).unwrap_err();
    assert_eq!(
        flow_error(&err),
        &FlowError::SchemaMismatch { column: "q".to_string() }
    );
}

#[test]
fn test_apply_path_errors() {
    let node = node(json!({}));
    let ctx = both_outputs()
        .connect_input(INPUT_NORM_MODEL_NAME, PortType::normalization_model())
        .with_input_meta(INPUT_NORM_MODEL_NAME, ColumnSet::untyped(["a", "b"]));
    let model = NormalizationModel::new().with_column("a", 0.0, 1.0);

    let df = DataFrame::new().with_column("a", vec![1.0]);
    let err = node.process(&ctx, inputs_with_model(df, model.clone())).unwrap_err();
    assert_eq!(flow_error(&err), &FlowError::SchemaMismatch { column: "b".to_string() });

    let df = DataFrame::new()
        .with_column("a", vec![1.0])
        .with_column("b", vec![1.0]);
    let err = node.process(&ctx, inputs_with_model(df, model)).unwrap_err();
    assert_eq!(flow_error(&err), &FlowError::ModelMismatch { column: "b".to_string() });
}

#[test]
fn test_bad_payloads() {
    let node = node(json!({"columns": ["a"]}));

    let err = node.process(&both_outputs(), PortPayloads::new()).unwrap_err();
    assert_eq!(
        flow_error(&err),
        &FlowError::MissingInput { port: INPUT_PORT_NAME.to_string() }
    );

    let mut wrong = PortPayloads::new();
    wrong.insert(INPUT_PORT_NAME.to_string(), Payload::Model(NormalizationModel::new()));
    let err = node.process(&both_outputs(), wrong).unwrap_err();
    assert!(matches!(flow_error(&err), FlowError::PayloadType { .. }));

    let mut wrong = inputs(DataFrame::new().with_column("a", vec![1.0, 2.0]));
    wrong.insert(INPUT_NORM_MODEL_NAME.to_string(), Payload::Frame(DataFrame::new()));
    let err = node.process(&both_outputs(), wrong).unwrap_err();
    assert!(matches!(flow_error(&err), FlowError::PayloadType { .. }));
}

#[test]
fn test_only_connected_outputs_are_returned() {
    let node = node(json!({"columns": ["a"]}));
    let df = DataFrame::new().with_column("a", vec![1.0, 2.0, 3.0]);

    let ctx = NodeContext::new().connect_output(OUTPUT_PORT_NAME);
    let outputs = node.process(&ctx, inputs(df.clone())).unwrap();
    assert_eq!(outputs.len(), 1);
    assert!(outputs.contains_key(OUTPUT_PORT_NAME));

    let ctx = NodeContext::new().connect_output(OUTPUT_NORM_MODEL_NAME);
    let outputs = node.process(&ctx, inputs(df.clone())).unwrap();
    assert_eq!(outputs.len(), 1);
    assert_eq!(model_out(&outputs), &NormalizationModel::new().with_column("a", 2.0, 1.0));

    let outputs = node.process(&NodeContext::new(), inputs(df)).unwrap();
    assert!(outputs.is_empty());
}

/// Table that counts every access made by the executor.
#[derive(Default)]
struct CountingTable {
    inner: DataFrame,
    reads: Cell<usize>,
    stats: Cell<usize>,
    assigns: Cell<usize>,
}

impl CountingTable {
    fn new(inner: DataFrame) -> Self {
        Self { inner, ..Default::default() }
    }
}

impl Table for CountingTable {
    fn column_names(&self) -> Vec<String> {
        self.reads.set(self.reads.get() + 1);
        self.inner.column_names()
    }

    fn column(&self, name: &str) -> Option<&[f64]> {
        self.reads.set(self.reads.get() + 1);
        self.inner.column(name)
    }

    fn mean(&self, name: &str) -> Option<f64> {
        self.stats.set(self.stats.get() + 1);
        self.inner.mean(name)
    }

    fn std(&self, name: &str) -> Option<f64> {
        self.stats.set(self.stats.get() + 1);
        self.inner.std(name)
    }

    fn assign(&self, columns: IndexMap<String, Vec<f64>>) -> Self {
        self.assigns.set(self.assigns.get() + 1);
        CountingTable::new(self.inner.assign(columns))
    }
}

#[test]
fn test_no_computation_without_connected_outputs() {
    let conf = NormalizationConfig {
        columns: Some(vec!["a".to_string()]),
        include: true,
    };
    let table = CountingTable::new(DataFrame::new().with_column("a", vec![1.0, 2.0, 3.0]));
    let ctx = NodeContext::new().connect_input(INPUT_PORT_NAME, PortType::any_frame());

    let out = normalize(&conf, &ctx, &table, None).unwrap();

    assert!(out.frame.is_none());
    assert!(out.model.is_none());
    assert_eq!(table.reads.get(), 0);
    assert_eq!(table.stats.get(), 0);
    assert_eq!(table.assigns.get(), 0);
}

#[test]
fn test_model_only_output_skips_frame_rewrite() {
    let conf = NormalizationConfig {
        columns: Some(vec!["a".to_string()]),
        include: true,
    };
    let table = CountingTable::new(DataFrame::new().with_column("a", vec![1.0, 2.0, 3.0]));
    let ctx = NodeContext::new().connect_output(OUTPUT_NORM_MODEL_NAME);

    let out = normalize(&conf, &ctx, &table, None).unwrap();

    assert!(out.frame.is_none());
    assert_eq!(out.model, Some(NormalizationModel::new().with_column("a", 2.0, 1.0)));
    assert_eq!(table.stats.get(), 2);
    assert_eq!(table.assigns.get(), 0);
}

#[test]
fn test_apply_path_never_fits() {
    let conf = NormalizationConfig::default();
    let table = CountingTable::new(DataFrame::new().with_column("a", vec![2.0, 3.0, 4.0]));
    let model = NormalizationModel::new().with_column("a", 2.0, 1.0);
    let ctx = both_outputs();

    let out = normalize(&conf, &ctx, &table, Some(&model)).unwrap();

    assert_eq!(table.stats.get(), 0);
    assert_eq!(table.assigns.get(), 1);
    assert_eq!(out.frame.unwrap().inner.column("a").unwrap(), &[0.0, 1.0, 2.0]);
}
