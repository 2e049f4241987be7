use darling::{FromAttributes, FromMeta};
use syn::{Attribute, DeriveInput};

/// Parsed attributes from #[node_meta(...)]
#[derive(Debug, FromAttributes)]
#[darling(attributes(node_meta))]
pub struct NodeMetaArgs {
    pub name: String,
    pub category: String,
}

/// One #[input(...)] or #[output(...)] declaration on the node struct
#[derive(Debug, FromMeta)]
pub struct PortArgs {
    pub id: String,

    #[darling(default)]
    pub name: Option<String>,

    #[darling(default)]
    pub data_type: Option<String>,

    #[darling(default)]
    pub optional: bool,
}

/// One #[param(...)] declaration on the node struct
#[derive(Debug, FromMeta)]
pub struct ParamArgs {
    pub name: String,

    /// JSON-Schema type name: `array`, `boolean`, `number`, `string`
    pub kind: String,

    /// JSON text, e.g. `"true"` or `"[\"a\"]"`
    #[darling(default)]
    pub default: Option<String>,

    #[darling(default)]
    pub description: Option<String>,
}

pub fn parse_node_info(input: &DeriveInput) -> darling::Result<NodeMetaArgs> {
    NodeMetaArgs::from_attributes(&input.attrs)
}

fn parse_repeated<T: FromMeta>(attrs: &[Attribute], ident: &str) -> darling::Result<Vec<T>> {
    let mut errors = darling::Error::accumulator();
    let parsed = attrs
        .iter()
        .filter(|attr| attr.path().is_ident(ident))
        .filter_map(|attr| errors.handle(T::from_meta(&attr.meta)))
        .collect();
    errors.finish_with(parsed)
}

pub fn parse_ports(input: &DeriveInput) -> darling::Result<(Vec<PortArgs>, Vec<PortArgs>)> {
    let inputs = parse_repeated(&input.attrs, "input")?;
    let outputs = parse_repeated(&input.attrs, "output")?;
    Ok((inputs, outputs))
}

pub fn parse_params(input: &DeriveInput) -> darling::Result<Vec<ParamArgs>> {
    parse_repeated(&input.attrs, "param")
}
