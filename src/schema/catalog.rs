use serde::Serialize;

use super::SchemaSource;

/// A dropdown entry: the identifier to select and the label to show.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChoiceOption {
    pub id: String,
    pub label: String,
}

impl ChoiceOption {
    fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            label: id.to_string(),
        }
    }
}

/// Every group with at least one operation, sorted by id.
/// An unconnected schema yields an empty list, which callers read as "not ready".
pub fn list_groups<S: SchemaSource + ?Sized>(schema: Option<&S>) -> Vec<ChoiceOption> {
    let Some(schema) = schema else {
        return Vec::new();
    };
    let mut groups: Vec<ChoiceOption> = schema
        .groups()
        .iter()
        .filter(|g| !g.operations.is_empty())
        .map(|g| ChoiceOption::new(&g.name))
        .collect();
    groups.sort_by(|a, b| a.id.cmp(&b.id));
    groups
}

/// Every operation in `group`, sorted by id. Empty when the schema is not
/// connected, the id is empty, or the group is unknown.
pub fn list_operations<S: SchemaSource + ?Sized>(schema: Option<&S>, group: &str) -> Vec<ChoiceOption> {
    let Some(schema) = schema else {
        return Vec::new();
    };
    if group.is_empty() {
        return Vec::new();
    }
    let Some(g) = schema.group(group) else {
        return Vec::new();
    };
    let mut ops: Vec<ChoiceOption> = g.operations.iter().map(|op| ChoiceOption::new(&op.name)).collect();
    ops.sort_by(|a, b| a.id.cmp(&b.id));
    ops
}
