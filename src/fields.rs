use serde::Serialize;

use crate::schema::types::is_optional_tag;
use crate::schema::SchemaSource;

/// An input field to render for one declared parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParameterSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub type_tag: String,
    pub optional: bool,
}

impl ParameterSpec {
    /// Stable identity for the field across re-renders.
    pub fn key(&self) -> String {
        format!("{}-{}", self.name, self.type_tag)
    }
}

/// Derive the ordered fields for `(group, operation)`.
///
/// Pure and idempotent: the result depends only on the arguments, so calling
/// it after every selection change never carries fields over from a previous
/// operation.
pub fn synthesize<S: SchemaSource + ?Sized>(
    schema: Option<&S>,
    group: &str,
    operation: &str,
) -> Vec<ParameterSpec> {
    let Some(schema) = schema else {
        return Vec::new();
    };
    if group.is_empty() || operation.is_empty() {
        return Vec::new();
    }
    let Some(op) = schema.operation(group, operation) else {
        return Vec::new();
    };
    op.params
        .iter()
        .map(|p| ParameterSpec {
            name: p.name.clone(),
            type_tag: p.type_tag.clone(),
            optional: is_optional_tag(&p.type_tag),
        })
        .collect()
}
