// SPDX-License-Identifier: MIT

//! State schema definitions
//!
//! The schema is the single source of truth for which fields exist and how
//! incoming values combine with the current ones.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Schema defining the workflow state structure
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
pub struct StateSchema {
    /// Field definitions
    #[serde(flatten)]
    pub fields: HashMap<String, StateFieldDef>,
}

impl StateSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a field with no explicit default
    pub fn field(mut self, name: &str, field_type: FieldType, reducer: ReducerType) -> Self {
        self.fields.insert(
            name.to_string(),
            StateFieldDef {
                field_type,
                reducer,
                default: None,
            },
        );
        self
    }

    /// Declare a field with an explicit default value
    pub fn field_with_default(
        mut self,
        name: &str,
        field_type: FieldType,
        reducer: ReducerType,
        default: Value,
    ) -> Self {
        self.fields.insert(
            name.to_string(),
            StateFieldDef {
                field_type,
                reducer,
                default: Some(default),
            },
        );
        self
    }

    pub fn get(&self, name: &str) -> Option<&StateFieldDef> {
        self.fields.get(name)
    }

    /// Values every field starts a run with
    pub fn initial_values(&self) -> Map<String, Value> {
        self.fields
            .iter()
            .map(|(name, def)| (name.clone(), def.initial_value()))
            .collect()
    }
}

/// Definition of a single state field
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct StateFieldDef {
    /// Type of the field
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Reducer for merging values
    #[serde(default)]
    pub reducer: ReducerType,
    /// Default value
    pub default: Option<Value>,
}

impl StateFieldDef {
    /// The declared default, or the empty value for the field type
    pub fn initial_value(&self) -> Value {
        match &self.default {
            Some(v) => v.clone(),
            None => match self.field_type {
                FieldType::Array => Value::Array(vec![]),
                FieldType::Object => Value::Object(Map::new()),
                _ => Value::Null,
            },
        }
    }
}

/// Supported field types
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Number,
    Boolean,
    Array,
    Object,
}

impl FieldType {
    /// Whether a value has this type. Null is handled by the reducer.
    pub fn accepts(&self, value: &Value) -> bool {
        matches!(
            (self, value),
            (FieldType::String, Value::String(_))
                | (FieldType::Number, Value::Number(_))
                | (FieldType::Boolean, Value::Bool(_))
                | (FieldType::Array, Value::Array(_))
                | (FieldType::Object, Value::Object(_))
        )
    }
}

/// JSON kind name, for error messages
pub(crate) fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Reducer types for merging values into state
#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ReducerType {
    /// Replace the value (default)
    #[default]
    #[serde(alias = "overwrite")]
    Replace,
    /// Append to array
    Append,
    /// Insert/overwrite object entries by key
    Merge,
}
