use anyhow::{Result, anyhow, bail};
use serde_json::{Map, Value};

use crate::description::NodeDescription;

/// Guards against display conditions that reference each other.
const MAX_RESOLVE_DEPTH: usize = 8;

/// Read access to the parameter values carried by one input record.
///
/// Values the host did not supply resolve to the default of the declaration
/// that is visible under the record's current selection.
pub struct NodeParameters<'a> {
    description: &'a NodeDescription,
    values: &'a Map<String, Value>,
}

impl<'a> NodeParameters<'a> {
    pub fn new(description: &'a NodeDescription, values: &'a Map<String, Value>) -> Self {
        Self {
            description,
            values,
        }
    }

    pub fn get(&self, name: &str) -> Result<Value> {
        self.lookup(name)
            .ok_or_else(|| anyhow!("Could not get parameter \"{}\"", name))
    }

    /// Like [`get`](Self::get) but yields `None` for parameters that are not
    /// available under the current selection.
    pub fn lookup(&self, name: &str) -> Option<Value> {
        self.resolve(name, 0)
    }

    fn resolve(&self, name: &str, depth: usize) -> Option<Value> {
        if let Some(value) = self.values.get(name) {
            return Some(value.clone());
        }
        if depth > MAX_RESOLVE_DEPTH {
            tracing::warn!(parameter = %name, "Parameter resolution exceeded depth limit");
            return None;
        }

        self.description
            .declarations(name)
            .find(|param| {
                param.is_visible(|key| self.resolve(key.trim_start_matches('/'), depth + 1))
            })
            .map(|param| param.default.clone())
    }

    /// Numbers are accepted and rendered as decimal text, since chat and
    /// message ids frequently arrive numeric.
    pub fn get_string(&self, name: &str) -> Result<String> {
        match self.get(name)? {
            Value::String(s) => Ok(s),
            Value::Number(n) => Ok(n.to_string()),
            other => bail!("Parameter \"{}\" must be a string, got {}", name, other),
        }
    }

    pub fn get_object(&self, name: &str) -> Result<Map<String, Value>> {
        match self.get(name)? {
            Value::Object(map) => Ok(map),
            Value::Null => Ok(Map::new()),
            other => bail!("Parameter \"{}\" must be an object, got {}", name, other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn with_params<T>(v: Value, f: impl FnOnce(&NodeParameters) -> T) -> T {
        let description = NodeDescription::telegram().unwrap();
        let values = v.as_object().cloned().unwrap();
        let params = NodeParameters::new(&description, &values);
        f(&params)
    }

    #[test]
    fn test_explicit_value_wins() {
        with_params(json!({ "resource": "chat" }), |p| {
            assert_eq!(p.get_string("resource").unwrap(), "chat");
        });
    }

    #[test]
    fn test_operation_default_depends_on_resource() {
        with_params(json!({ "resource": "chat" }), |p| {
            assert_eq!(p.get_string("operation").unwrap(), "get");
        });
        with_params(json!({ "resource": "callback" }), |p| {
            assert_eq!(p.get_string("operation").unwrap(), "answerQuery");
        });
        with_params(json!({}), |p| {
            assert_eq!(p.get_string("operation").unwrap(), "sendMessage");
        });
    }

    #[test]
    fn test_nested_defaults() {
        with_params(
            json!({ "resource": "message", "operation": "editMessageText" }),
            |p| {
                assert_eq!(p.get_string("messageType").unwrap(), "message");
                assert_eq!(p.get_string("chatId").unwrap(), "");
                assert_eq!(p.get_string("replyMarkup").unwrap(), "none");
                assert!(p.get_object("additionalFields").unwrap().is_empty());
            },
        );
    }

    #[test]
    fn test_hidden_parameter_is_unavailable() {
        with_params(json!({ "resource": "chat", "operation": "get" }), |p| {
            let err = p.get("text").unwrap_err();
            assert_eq!(err.to_string(), "Could not get parameter \"text\"");
            assert!(p.lookup("replyMarkup").is_none());
        });
    }

    #[test]
    fn test_number_coerces_to_string() {
        with_params(json!({ "resource": "chat", "chatId": -100123 }), |p| {
            assert_eq!(p.get_string("chatId").unwrap(), "-100123");
        });
    }

    #[test]
    fn test_type_mismatch() {
        with_params(
            json!({ "resource": "message", "additionalFields": "oops" }),
            |p| {
                assert!(p.get_object("additionalFields").is_err());
            },
        );
        with_params(json!({ "resource": "chat", "chatId": true }), |p| {
            assert!(p.get_string("chatId").is_err());
        });
    }
}
