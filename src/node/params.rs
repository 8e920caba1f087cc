use cloudconvert_common::{Error, Result};
use serde_json::{Map, Value};

/// Parameter access provided by the workflow host.
///
/// Values may differ per input item, so every lookup carries the index of
/// the item being processed.
pub trait NodeParameters: Send + Sync {
    /// Raw parameter value, `None` when unset.
    fn parameter(&self, name: &str, item_index: usize) -> Option<Value>;

    /// String parameter; numbers are rendered, empty strings count as unset.
    fn string(&self, name: &str, item_index: usize) -> Option<String> {
        match self.parameter(name, item_index)? {
            Value::String(s) if s.is_empty() => None,
            Value::String(s) => Some(s),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    fn string_or(&self, name: &str, item_index: usize, default: &str) -> String {
        self.string(name, item_index)
            .unwrap_or_else(|| default.to_string())
    }

    fn boolean(&self, name: &str, item_index: usize, default: bool) -> Result<bool> {
        match self.parameter(name, item_index) {
            None | Some(Value::Null) => Ok(default),
            Some(Value::Bool(b)) => Ok(b),
            Some(Value::String(s)) => match s.as_str() {
                "true" => Ok(true),
                "false" => Ok(false),
                "" => Ok(default),
                other => Err(Error::invalid_parameter(
                    name,
                    format!("expected a boolean, got '{}'", other),
                )),
            },
            Some(other) => Err(Error::invalid_parameter(
                name,
                format!("expected a boolean, got {}", other),
            )),
        }
    }

    /// List of strings; a single string counts as a one-element list.
    fn string_list(&self, name: &str, item_index: usize) -> Result<Vec<String>> {
        match self.parameter(name, item_index) {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(Value::String(s)) if s.is_empty() => Ok(Vec::new()),
            Some(Value::String(s)) => Ok(vec![s]),
            Some(Value::Array(values)) => values
                .into_iter()
                .map(|v| match v {
                    Value::String(s) => Ok(s),
                    other => Err(Error::invalid_parameter(
                        name,
                        format!("expected a list of strings, got {}", other),
                    )),
                })
                .collect(),
            Some(other) => Err(Error::invalid_parameter(
                name,
                format!("expected a list of strings, got {}", other),
            )),
        }
    }

    /// Collection parameter; unset yields an empty map.
    fn collection(&self, name: &str, item_index: usize) -> Result<Map<String, Value>> {
        match self.parameter(name, item_index) {
            None | Some(Value::Null) => Ok(Map::new()),
            Some(Value::Object(map)) => Ok(map),
            Some(other) => Err(Error::invalid_parameter(
                name,
                format!("expected an object, got {}", other),
            )),
        }
    }
}

/// Parameters that are identical for every item.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StaticParameters {
    values: Map<String, Value>,
}

impl StaticParameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<K: Into<String>, V: Into<Value>>(mut self, name: K, value: V) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    pub fn set<K: Into<String>, V: Into<Value>>(&mut self, name: K, value: V) {
        self.values.insert(name.into(), value.into());
    }
}

impl From<Map<String, Value>> for StaticParameters {
    fn from(values: Map<String, Value>) -> Self {
        Self { values }
    }
}

impl NodeParameters for StaticParameters {
    fn parameter(&self, name: &str, _item_index: usize) -> Option<Value> {
        self.values.get(name).cloned()
    }
}
