use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, DeriveInput};

mod node_meta;
use node_meta::{parse_node_info, parse_params, parse_ports, PortArgs};

#[proc_macro_derive(FlowNode, attributes(node_meta, param, input, output))]
pub fn derive_flow_node(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    let node_info = match parse_node_info(&input) {
        Ok(info) => info,
        Err(e) => return e.write_errors().into(),
    };

    let (inputs, outputs) = match parse_ports(&input) {
        Ok(ports) => ports,
        Err(e) => return e.write_errors().into(),
    };

    let params = match parse_params(&input) {
        Ok(params) => params,
        Err(e) => return e.write_errors().into(),
    };

    let struct_name = &input.ident;
    let node_id = struct_name.to_string().to_lowercase();
    let node_name = &node_info.name;
    let category = &node_info.category;

    let param_metas = params.iter().map(|p| {
        let name = &p.name;
        let param_type = &p.kind;
        let default_json = p.default.as_deref().unwrap_or("null");
        let description = match &p.description {
            Some(d) => quote! { Some(#d.to_string()) },
            None => quote! { None },
        };

        quote! {
            crate::registry::ParameterSchema {
                name: #name.to_string(),
                param_type: #param_type.to_string(),
                default: ::serde_json::from_str(#default_json)
                    .unwrap_or(::serde_json::Value::Null),
                description: #description,
            }
        }
    });

    let input_metas = inputs.iter().map(port_tokens);
    let output_metas = outputs.iter().map(port_tokens);

    let mod_name = syn::Ident::new(
        &format!("__node_registration_{}", node_id),
        struct_name.span(),
    );

    let factory_fn_name = syn::Ident::new(
        &format!("create_metadata_{}", node_id),
        struct_name.span(),
    );

    let expanded = quote! {
        mod #mod_name {
            use super::*;

            pub(super) fn #factory_fn_name() -> crate::registry::NodeMetadata {
                crate::registry::NodeMetadata {
                    id: #node_id.to_string(),
                    name: #node_name.to_string(),
                    category: #category.to_string(),
                    inputs: vec![#(#input_metas),*],
                    outputs: vec![#(#output_metas),*],
                    parameters: vec![#(#param_metas),*],
                    factory: || Box::new(#struct_name::default()),
                }
            }

            ::inventory::submit! {
                crate::registry::NodeMetadataFactoryWrapper(#factory_fn_name)
            }
        }

        impl #struct_name {
            /// Registry metadata generated for this node type.
            pub fn node_metadata() -> crate::registry::NodeMetadata {
                #mod_name::#factory_fn_name()
            }
        }
    };

    TokenStream::from(expanded)
}

fn port_tokens(port: &PortArgs) -> proc_macro2::TokenStream {
    let port_id = &port.id;
    let port_name = port.name.as_ref().unwrap_or(&port.id);
    let data_type = port.data_type.as_deref().unwrap_or("any");
    let optional = port.optional;

    quote! {
        crate::registry::PortMetadata {
            id: #port_id.to_string(),
            name: #port_name.to_string(),
            data_type: #data_type.to_string(),
            optional: #optional,
        }
    }
}
