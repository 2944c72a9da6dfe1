//! The operator's current selection and the three ways to change it.
//!
//! Changing the group clears the operation and every parameter value;
//! changing the operation clears every parameter value. Parameter values are
//! index-aligned with the selected operation's declared parameters.

use serde::{Deserialize, Serialize};

use crate::settings::InteractionMode;

/// One operator-entered argument. `type_tag` is copied from the parameter the
/// value was entered against; `value` is the raw, uncoerced text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterValue {
    #[serde(rename = "type")]
    pub type_tag: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub group: String,
    pub operation: String,
    pub params: Vec<ParameterValue>,
}

impl Selection {
    /// Raw text at `index`, or `""` if nothing was entered there.
    pub fn value_at(&self, index: usize) -> &str {
        self.params.get(index).map_or("", |p| p.value.as_str())
    }

    /// Both the group and the operation have been chosen.
    pub fn is_complete(&self) -> bool {
        !self.group.is_empty() && !self.operation.is_empty()
    }
}

/// A single form interaction, already classified by kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum FormEvent {
    GroupChanged(String),
    OperationChanged(String),
    ParameterChanged {
        index: usize,
        type_tag: String,
        value: String,
    },
}

impl FormEvent {
    /// Group and operation changes alter the set of fields to render.
    pub fn reshapes_fields(&self) -> bool {
        matches!(self, FormEvent::GroupChanged(_) | FormEvent::OperationChanged(_))
    }
}

/// Holds the single mutable [`Selection`].
#[derive(Debug, Default)]
pub struct FormState {
    selection: Selection,
}

impl FormState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn set_group(&mut self, group: impl Into<String>) {
        self.selection.group = group.into();
        self.selection.operation.clear();
        self.selection.params.clear();
    }

    pub fn set_operation(&mut self, operation: impl Into<String>) {
        self.selection.operation = operation.into();
        self.selection.params.clear();
    }

    /// Store a raw value at `index`, padding with empty slots as needed.
    /// An index with no representable successor is ignored.
    pub fn set_parameter(&mut self, index: usize, type_tag: impl Into<String>, value: impl Into<String>) {
        let Some(len) = index.checked_add(1) else {
            return;
        };
        let params = &mut self.selection.params;
        if params.len() < len {
            params.resize_with(len, ParameterValue::default);
        }
        if let Some(slot) = params.get_mut(index) {
            *slot = ParameterValue {
                type_tag: type_tag.into(),
                value: value.into(),
            };
        }
    }

    pub fn apply(&mut self, event: FormEvent) {
        match event {
            FormEvent::GroupChanged(group) => self.set_group(group),
            FormEvent::OperationChanged(operation) => self.set_operation(operation),
            FormEvent::ParameterChanged {
                index,
                type_tag,
                value,
            } => self.set_parameter(index, type_tag, value),
        }
    }
}

/// Hint shown under an optional parameter field.
pub fn optional_msg(mode: InteractionMode) -> &'static str {
    match mode {
        InteractionMode::Rpc => "Optional Parameter",
        InteractionMode::Extrinsic => "Leaving this field as blank will submit a NONE value",
    }
}
