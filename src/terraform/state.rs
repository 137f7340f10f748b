//! State of one resource instance as exchanged with the caller.

use std::time::Duration;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::ProviderError;

/// Per-operation timeout overrides from a `timeouts` object, in humantime
/// syntax (`"30m"`, `"1h 30m"`).
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Timeouts {
    #[serde(default, with = "humantime_serde")]
    pub create: Option<Duration>,
    #[serde(default, with = "humantime_serde")]
    pub read: Option<Duration>,
    #[serde(default, with = "humantime_serde")]
    pub update: Option<Duration>,
    #[serde(default, with = "humantime_serde")]
    pub delete: Option<Duration>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Read,
    Update,
    Delete,
}

impl Timeouts {
    pub fn get(&self, operation: Operation) -> Option<Duration> {
        match operation {
            Operation::Create => self.create,
            Operation::Read => self.read,
            Operation::Update => self.update,
            Operation::Delete => self.delete,
        }
    }

    /// Fills unset entries from `defaults`.
    pub fn or(&self, defaults: &Timeouts) -> Timeouts {
        Timeouts {
            create: self.create.or(defaults.create),
            read: self.read.or(defaults.read),
            update: self.update.or(defaults.update),
            delete: self.delete.or(defaults.delete),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceData {
    id: Option<String>,
    attributes: Map<String, Value>,
    timeouts: Timeouts,
}

impl ResourceData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds instance data from a JSON object. `id` and `timeouts` are
    /// lifted out of the attribute map.
    pub fn from_value(value: Value) -> Result<Self, ProviderError> {
        let Value::Object(mut attributes) = value else {
            return Err(ProviderError::Config(
                "resource configuration must be a JSON object".to_string(),
            ));
        };

        let id = match attributes.remove("id") {
            Some(Value::String(id)) if !id.is_empty() => Some(id),
            _ => None,
        };
        let timeouts = match attributes.remove("timeouts") {
            Some(Value::Null) | None => Timeouts::default(),
            Some(value) => serde_json::from_value(value)
                .map_err(|e| ProviderError::Config(format!("invalid timeouts: {}", e)))?,
        };

        Ok(Self {
            id,
            attributes,
            timeouts,
        })
    }

    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::default()
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn require_id(&self) -> Result<&str, ProviderError> {
        self.id()
            .ok_or_else(|| ProviderError::MissingAttribute("id".to_string()))
    }

    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = Some(id.into());
    }

    /// Marks the instance as gone on the remote side.
    pub fn clear_id(&mut self) {
        self.id = None;
    }

    pub fn attributes(&self) -> &Map<String, Value> {
        &self.attributes
    }

    pub fn timeouts(&self) -> &Timeouts {
        &self.timeouts
    }

    pub fn set_timeouts(&mut self, timeouts: Timeouts) {
        self.timeouts = timeouts;
    }

    pub fn timeout(&self, operation: Operation, default: Duration) -> Duration {
        self.timeouts.get(operation).unwrap_or(default)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key).filter(|v| !v.is_null())
    }

    /// String attribute; empty strings read as unset.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(|v| v.as_str()).filter(|s| !s.is_empty())
    }

    pub fn get_string(&self, key: &str) -> Option<String> {
        self.get_str(key).map(|s| s.to_string())
    }

    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(|v| v.as_i64())
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(|v| v.as_bool())
    }

    pub fn get_list(&self, key: &str) -> Vec<Value> {
        self.get(key)
            .and_then(|v| v.as_array())
            .cloned()
            .unwrap_or_default()
    }

    pub fn get_string_list(&self, key: &str) -> Vec<String> {
        self.get_list(key)
            .into_iter()
            .filter_map(|v| v.as_str().map(|s| s.to_string()))
            .collect()
    }

    /// List of nested blocks as JSON objects.
    pub fn get_blocks(&self, key: &str) -> Vec<Map<String, Value>> {
        self.get_list(key)
            .into_iter()
            .filter_map(|v| match v {
                Value::Object(map) => Some(map),
                _ => None,
            })
            .collect()
    }

    pub fn require_str(&self, key: &str) -> Result<&str, ProviderError> {
        self.get_str(key)
            .ok_or_else(|| ProviderError::MissingAttribute(key.to_string()))
    }

    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        self.attributes.insert(key.to_string(), value.into());
    }

    /// Sets `key` to a string, or null when absent.
    pub fn set_opt(&mut self, key: &str, value: Option<impl Into<String>>) {
        let value = value.map(|v| Value::String(v.into())).unwrap_or(Value::Null);
        self.attributes.insert(key.to_string(), value);
    }

    /// Whether `key` differs from the prior instance. Null and absent are
    /// the same.
    pub fn changed(&self, prior: &ResourceData, key: &str) -> bool {
        self.get(key) != prior.get(key)
    }

    /// Keys among `keys` that changed against `prior`.
    pub fn changed_keys<'a>(
        &self,
        prior: &ResourceData,
        keys: impl IntoIterator<Item = &'a str>,
    ) -> Vec<String> {
        keys.into_iter()
            .filter(|k| self.changed(prior, k))
            .map(|k| k.to_string())
            .collect()
    }

    /// Serialised state: attributes plus `id`.
    pub fn to_state(&self) -> Value {
        let mut state = self.attributes.clone();
        if let Some(id) = &self.id {
            state.insert("id".to_string(), Value::String(id.clone()));
        }
        Value::Object(state)
    }
}
