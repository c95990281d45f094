// SPDX-License-Identifier: MIT

//! Runtime state storage for workflow execution

use serde::de::DeserializeOwned;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::sync::Arc;

use super::schema::{kind_of, FieldType, ReducerType, StateSchema};
use super::update::{FieldPatch, StateUpdate};
use crate::waypoint::workflow::error::ValidationError;

/// Runtime workflow state with reducer support
///
/// Every field declared by the schema is always present. Nodes never mutate
/// a state in place: they return a [`StateUpdate`] which [`merge`](Self::merge)
/// turns into a new state.
#[derive(Debug, Clone)]
pub struct WorkflowState {
    /// Current state values
    fields: Map<String, Value>,
    /// Field declarations and their reducers
    schema: Arc<StateSchema>,
}

impl WorkflowState {
    /// Create a new WorkflowState with every field at its initial value
    pub fn new(schema: Arc<StateSchema>) -> Self {
        Self {
            fields: schema.initial_values(),
            schema,
        }
    }

    /// Rebuild a state from stored values, checking them against the schema
    ///
    /// Fields missing from `values` start at their initial value.
    pub fn from_values(
        schema: Arc<StateSchema>,
        values: Map<String, Value>,
    ) -> Result<Self, ValidationError> {
        let mut fields = schema.initial_values();
        for (name, value) in values {
            let def = schema
                .get(&name)
                .ok_or_else(|| ValidationError::UnknownField(name.clone()))?;
            if !def.field_type.accepts(&value) && !nullable(def.field_type, &value) {
                return Err(ValidationError::TypeMismatch {
                    field: name,
                    expected: def.field_type,
                    found: kind_of(&value),
                });
            }
            fields.insert(name, value);
        }
        Ok(Self { fields, schema })
    }

    /// Merge a partial update, returning the new state
    ///
    /// The update is applied to a copy; if any patch is rejected the error is
    /// returned and `self` is left as it was.
    pub fn merge(&self, update: StateUpdate) -> Result<Self, ValidationError> {
        let mut next = self.clone();
        for (field, patch) in update.into_patches() {
            next.apply(&field, patch)?;
        }
        Ok(next)
    }

    /// Apply one patch using the field's reducer
    fn apply(&mut self, key: &str, patch: FieldPatch) -> Result<(), ValidationError> {
        let def = self
            .schema
            .get(key)
            .ok_or_else(|| ValidationError::UnknownField(key.to_string()))?;

        let value = match patch {
            FieldPatch::Reset => {
                self.fields.insert(key.to_string(), def.initial_value());
                return Ok(());
            }
            FieldPatch::Apply(value) => value,
        };

        let mismatch = |found: &Value| ValidationError::TypeMismatch {
            field: key.to_string(),
            expected: def.field_type,
            found: kind_of(found),
        };

        match def.reducer {
            ReducerType::Replace => {
                if !def.field_type.accepts(&value) && !nullable(def.field_type, &value) {
                    return Err(mismatch(&value));
                }
                self.fields.insert(key.to_string(), value);
            }
            ReducerType::Append => {
                match self
                    .fields
                    .entry(key.to_string())
                    .or_insert(Value::Array(vec![]))
                {
                    Value::Array(a) => match value {
                        Value::Array(new_items) => a.extend(new_items),
                        other => a.push(other),
                    },
                    current => return Err(mismatch(&*current)),
                }
            }
            ReducerType::Merge => {
                let new_obj = match value {
                    Value::Object(obj) => obj,
                    other => return Err(mismatch(&other)),
                };
                match self
                    .fields
                    .entry(key.to_string())
                    .or_insert(Value::Object(Map::new()))
                {
                    Value::Object(current_obj) => current_obj.extend(new_obj),
                    current => return Err(mismatch(&*current)),
                }
            }
        }

        log::debug!("Merged field '{}' ({:?})", key, def.reducer);
        Ok(())
    }

    /// Get a field value
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Get a string field, treating null as absent
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    /// Get a nested field value using dot notation (e.g., "facts.Chile")
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        let mut parts = path.split('.');
        let mut current = self.fields.get(parts.next()?)?;
        for part in parts {
            current = current.get(part)?;
        }
        Some(current)
    }

    /// Number of elements in an array field (0 for anything else)
    pub fn array_len(&self, key: &str) -> usize {
        self.fields
            .get(key)
            .and_then(Value::as_array)
            .map_or(0, Vec::len)
    }

    /// Deserialize the whole state into a typed view
    pub fn view<T: DeserializeOwned>(&self) -> Result<T, ValidationError> {
        serde_json::from_value(self.to_json())
            .map_err(|e| ValidationError::InvalidState(e.to_string()))
    }

    /// Convert state to JSON object
    pub fn to_json(&self) -> Value {
        Value::Object(self.fields.clone())
    }

    /// Borrow the raw field map
    pub fn values(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn into_values(self) -> Map<String, Value> {
        self.fields
    }

    pub fn schema(&self) -> &Arc<StateSchema> {
        &self.schema
    }

    /// Get all field names
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.fields.keys()
    }
}

/// Scalars may be cleared with null; collections may not
fn nullable(field_type: FieldType, value: &Value) -> bool {
    value.is_null() && !matches!(field_type, FieldType::Array | FieldType::Object)
}

impl Serialize for WorkflowState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.fields.serialize(serializer)
    }
}
