pub mod catalog;
pub mod types;

use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::encoder::Payload;
use crate::error::ExplorerError;
use crate::project::{read_json, ProjectError};

use types::TypeDef;

// ── Declared schema model ───────────────────────────────────────

/// One declared parameter of an operation, exactly as the schema lists it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamDef {
    pub name: String,
    #[serde(rename = "type")]
    pub type_tag: String,
}

/// A callable operation. Parameters keep their declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    pub name: String,
    pub index: u8,
    #[serde(default)]
    pub params: Vec<ParamDef>,
}

/// A named group of operations (a pallet, module, or RPC namespace).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationGroup {
    pub name: String,
    pub index: u8,
    #[serde(default)]
    pub operations: Vec<Operation>,
}

impl OperationGroup {
    pub fn operation(&self, name: &str) -> Option<&Operation> {
        self.operations.iter().find(|op| op.name == name)
    }
}

// ── Schema source ───────────────────────────────────────────────

/// The externally supplied schema: groups → operations → parameters, a
/// registry of named types, and the binding step that turns coerced
/// arguments into call data.
pub trait SchemaSource: Send + Sync {
    fn groups(&self) -> &[OperationGroup];

    fn type_def(&self, name: &str) -> Option<&TypeDef>;

    /// Bind already-encoded arguments to `(group, operation)`.
    fn bind(&self, group: &str, operation: &str, args: &[Vec<u8>]) -> Result<Payload, ExplorerError>;

    fn group(&self, name: &str) -> Option<&OperationGroup> {
        self.groups().iter().find(|g| g.name == name)
    }

    fn operation(&self, group: &str, operation: &str) -> Option<&Operation> {
        self.group(group)?.operation(operation)
    }
}

/// Resolve `(group, operation)` or say which half is missing.
pub fn resolve_operation<'a, S: SchemaSource + ?Sized>(
    schema: &'a S,
    group: &str,
    operation: &str,
) -> Result<&'a Operation, ExplorerError> {
    let g = schema.group(group).ok_or_else(|| ExplorerError::UnknownGroup {
        group: group.to_string(),
    })?;
    g.operation(operation)
        .ok_or_else(|| ExplorerError::UnknownOperation {
            group: group.to_string(),
            operation: operation.to_string(),
        })
}

// ── JSON snapshot ───────────────────────────────────────────────

/// A schema snapshot loaded from JSON.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChainMetadata {
    pub groups: Vec<OperationGroup>,
    #[serde(default)]
    pub types: IndexMap<String, TypeDef>,
}

impl ChainMetadata {
    pub fn from_json_str(json: &str) -> Result<Self, ProjectError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self, ProjectError> {
        read_json(path)
    }
}

impl SchemaSource for ChainMetadata {
    fn groups(&self) -> &[OperationGroup] {
        &self.groups
    }

    fn type_def(&self, name: &str) -> Option<&TypeDef> {
        self.types.get(name)
    }

    fn bind(&self, group: &str, operation: &str, args: &[Vec<u8>]) -> Result<Payload, ExplorerError> {
        let g = self.group(group).ok_or_else(|| ExplorerError::UnknownGroup {
            group: group.to_string(),
        })?;
        let op = resolve_operation(self, group, operation)?;
        if args.len() != op.params.len() {
            return Err(ExplorerError::ArityMismatch {
                expected: op.params.len(),
                actual: args.len(),
            });
        }
        let mut call = Vec::with_capacity(2 + args.iter().map(Vec::len).sum::<usize>());
        call.push(g.index);
        call.push(op.index);
        for arg in args {
            call.extend_from_slice(arg);
        }
        Ok(Payload::new(group, operation, call))
    }
}


#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn loads_snapshot_and_resolves_operations() {
        let metadata = fixtures::sample_metadata();
        assert_eq!(metadata.groups.len(), 4);
        let op = metadata.operation("balances", "transfer").unwrap();
        assert_eq!(op.params.len(), 2);
        assert_eq!(op.params[1].type_tag, "Option<Balance>");
        assert!(metadata.operation("balances", "nope").is_none());
        assert!(metadata.type_def("Point").is_some());
    }

    #[test]
    fn bind_prefixes_group_and_operation_indices() {
        let metadata = fixtures::sample_metadata();
        let payload = metadata
            .bind("system", "remark", &[vec![0x08, 0xab, 0xcd]])
            .unwrap();
        assert_eq!(payload.call_data(), &[0x00, 0x01, 0x08, 0xab, 0xcd]);
    }

    #[test]
    fn bind_refuses_wrong_arity() {
        let metadata = fixtures::sample_metadata();
        let err = metadata.bind("balances", "transfer", &[vec![0u8; 32]]).unwrap_err();
        assert_eq!(
            err,
            ExplorerError::ArityMismatch {
                expected: 2,
                actual: 1
            }
        );
    }

    #[test]
    fn resolve_reports_which_key_is_missing() {
        let metadata = fixtures::sample_metadata();
        assert!(matches!(
            resolve_operation(&metadata, "nope", "transfer"),
            Err(ExplorerError::UnknownGroup { .. })
        ));
        assert!(matches!(
            resolve_operation(&metadata, "balances", "nope"),
            Err(ExplorerError::UnknownOperation { .. })
        ));
    }
}
