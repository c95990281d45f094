// SPDX-License-Identifier: MIT

//! Partial state updates returned by nodes

use serde_json::Value;

/// What to do with one field
#[derive(Debug, Clone, PartialEq)]
pub enum FieldPatch {
    /// Combine the value with the current one using the field's reducer
    Apply(Value),
    /// Restore the field to its initial value, bypassing the reducer
    Reset,
}

/// An ordered set of field patches, applied atomically by
/// [`WorkflowState::merge`](super::WorkflowState::merge)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StateUpdate {
    patches: Vec<(String, FieldPatch)>,
}

impl StateUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed `value` through the field's reducer
    pub fn set(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.patches
            .push((field.to_string(), FieldPatch::Apply(value.into())));
        self
    }

    /// Restore `field` to its initial value
    pub fn reset(mut self, field: &str) -> Self {
        self.patches.push((field.to_string(), FieldPatch::Reset));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.patches.is_empty()
    }

    pub fn len(&self) -> usize {
        self.patches.len()
    }

    /// Field names touched by this update, in order
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.patches.iter().map(|(f, _)| f.as_str())
    }

    /// Last patch for `field`, if any
    pub fn get(&self, field: &str) -> Option<&FieldPatch> {
        self.patches
            .iter()
            .rev()
            .find(|(f, _)| f == field)
            .map(|(_, p)| p)
    }

    pub(crate) fn into_patches(self) -> Vec<(String, FieldPatch)> {
        self.patches
    }
}
