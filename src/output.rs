//! Human-readable renderings for the CLI: type listings as tables, schemas
//! as trees, instance state as JSON.

use tabled::builder::Builder;
use tabled::settings::Style;
use termtree::Tree;

use crate::error::ProviderError;
use crate::network::Platform;
use crate::provider::Registry;
use crate::terraform::schema::{Field, FieldType, Presence, Schema};
use crate::terraform::state::ResourceData;

fn platform_list(platforms: &[Platform]) -> String {
    platforms
        .iter()
        .map(|p| p.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Table of every registered type with the platforms it runs on.
pub fn types_table(registry: &Registry) -> String {
    let mut builder = Builder::default();
    builder.push_record(["TYPE", "KIND", "PLATFORMS"]);

    for type_name in registry.resource_types() {
        if let Ok(resource) = registry.resource(type_name) {
            builder.push_record([
                type_name.to_string(),
                "resource".to_string(),
                platform_list(resource.platforms()),
            ]);
        }
    }
    for type_name in registry.data_source_types() {
        if let Ok(data_source) = registry.data_source(type_name) {
            builder.push_record([
                type_name.to_string(),
                "data source".to_string(),
                platform_list(data_source.platforms()),
            ]);
        }
    }

    builder.build().with(Style::rounded()).to_string()
}

fn field_label(field: &Field) -> String {
    let presence = match field.presence {
        Presence::Required => "required",
        Presence::Optional => "optional",
        Presence::Computed => "computed",
        Presence::OptionalComputed => "optional, computed",
    };
    let mut label = format!("{} ({}, {}", field.name, field.ty, presence);
    if field.force_new {
        label.push_str(", force new");
    }
    if field.sensitive {
        label.push_str(", sensitive");
    }
    if let Some(max) = field.max_items {
        label.push_str(&format!(", max {}", max));
    }
    label.push(')');
    if !field.description.is_empty() {
        label.push_str(&format!(": {}", field.description));
    }
    label
}

fn nested_schema(ty: &FieldType) -> Option<&Schema> {
    match ty {
        FieldType::Block(schema) => Some(schema),
        FieldType::List(inner) | FieldType::Set(inner) => nested_schema(inner),
        _ => None,
    }
}

fn schema_leaves(schema: &Schema) -> Vec<Tree<String>> {
    schema
        .fields
        .iter()
        .map(|field| {
            let mut node = Tree::new(field_label(field));
            if let Some(nested) = nested_schema(&field.ty) {
                for leaf in schema_leaves(nested) {
                    node.push(leaf);
                }
            }
            node
        })
        .collect()
}

pub fn schema_tree(type_name: &str, schema: &Schema) -> Tree<String> {
    let mut tree = Tree::new(type_name.to_string());
    for leaf in schema_leaves(schema) {
        tree.push(leaf);
    }
    tree
}

pub fn state_json(data: &ResourceData) -> Result<String, ProviderError> {
    Ok(serde_json::to_string_pretty(&data.to_state())?)
}
