use bandstand_core::{AppError, AppResult};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A stored JSON document with camelCase keys and an `_id` field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document(Map<String, Value>);

impl Document {
    /// Wraps a JSON object.
    #[must_use]
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Serializes an entity into its document form.
    pub fn from_entity<T: Serialize>(entity: &T) -> AppResult<Self> {
        match serde_json::to_value(entity) {
            Ok(Value::Object(fields)) => Ok(Self(fields)),
            Ok(other) => Err(AppError::Internal(format!(
                "entity serialized to non-object document: {other}"
            ))),
            Err(error) => Err(AppError::Internal(format!(
                "failed to serialize entity document: {error}"
            ))),
        }
    }

    /// Deserializes the document into an entity.
    pub fn to_entity<T: DeserializeOwned>(&self) -> AppResult<T> {
        serde_json::from_value(Value::Object(self.0.clone())).map_err(|error| {
            AppError::Internal(format!(
                "stored document '{}' is not a valid entity: {error}",
                self.id().unwrap_or("?")
            ))
        })
    }

    /// Returns the `_id` value.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.get("_id").and_then(Value::as_str)
    }

    /// Returns a field value.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Returns the underlying JSON object.
    #[must_use]
    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Sets a field value.
    pub fn set(&mut self, field: impl Into<String>, value: Value) {
        self.0.insert(field.into(), value);
    }

    /// Appends a value to an array field unless already present.
    pub fn push_unique(&mut self, field: &str, value: Value) {
        let entry = self
            .0
            .entry(field.to_owned())
            .or_insert_with(|| Value::Array(Vec::new()));
        match entry {
            Value::Array(members) => {
                if !members.contains(&value) {
                    members.push(value);
                }
            }
            other => *other = Value::Array(vec![value]),
        }
    }

    /// Removes every occurrence of a value from an array field.
    pub fn pull(&mut self, field: &str, value: &Value) {
        if let Some(Value::Array(members)) = self.0.get_mut(field) {
            members.retain(|member| member != value);
        }
    }

    /// Returns the fields of `self` that differ from `original`, and the
    /// fields `original` has that `self` dropped.
    #[must_use]
    pub fn changes_from(&self, original: &Document) -> (Map<String, Value>, Vec<String>) {
        let changes = self
            .0
            .iter()
            .filter(|(field, value)| original.get(field) != Some(*value))
            .map(|(field, value)| (field.clone(), value.clone()))
            .collect();
        let unset = original
            .0
            .keys()
            .filter(|field| !self.0.contains_key(*field))
            .cloned()
            .collect();

        (changes, unset)
    }

    /// Applies changes computed by [`Document::changes_from`].
    pub fn apply_changes(&mut self, changes: Map<String, Value>, unset: &[String]) {
        for field in unset {
            self.0.remove(field);
        }
        self.0.extend(changes);
    }

    /// Consumes the document, returning the JSON object.
    #[must_use]
    pub fn into_fields(self) -> Map<String, Value> {
        self.0
    }
}
