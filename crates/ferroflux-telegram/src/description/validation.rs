use serde::Serialize;
use serde_json::{Map, Value};

use super::{NodeDescription, ParameterDef, ParameterType};
use crate::parameters::NodeParameters;

/// A problem found by checking values against the schema's validation hints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    /// Dotted path to the offending field (e.g. `additionalFields.cache_time`).
    pub parameter: String,
    pub message: String,
}

impl ValidationIssue {
    fn new(parameter: &str, message: impl Into<String>) -> Self {
        Self {
            parameter: parameter.to_string(),
            message: message.into(),
        }
    }
}

impl NodeDescription {
    /// Checks explicit values against required flags, numeric bounds and
    /// enumerated choices of the visible fields.
    ///
    /// Hints only: execution never consults this.
    pub fn validate(&self, values: &Map<String, Value>) -> Vec<ValidationIssue> {
        let params = NodeParameters::new(self, values);
        let root = |key: &str| params.lookup(key.trim_start_matches('/'));
        let mut issues = Vec::new();

        for param in self.visible_parameters(values) {
            match values.get(&param.name) {
                None => {
                    if param.required && is_blank(&param.default) {
                        issues.push(ValidationIssue::new(&param.name, "is required"));
                    }
                }
                Some(value) => {
                    if param.required && is_blank(value) {
                        issues.push(ValidationIssue::new(&param.name, "is required"));
                        continue;
                    }
                    check_value(param, value, &param.name, &root, &mut issues);
                }
            }
        }

        issues
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

fn check_value<F>(
    param: &ParameterDef,
    value: &Value,
    path: &str,
    root: &F,
    issues: &mut Vec<ValidationIssue>,
) where
    F: Fn(&str) -> Option<Value>,
{
    match param.kind {
        ParameterType::String => {
            if !(value.is_string() || value.is_number()) {
                issues.push(ValidationIssue::new(path, "must be a string"));
            }
        }
        ParameterType::Boolean => {
            if !value.is_boolean() {
                issues.push(ValidationIssue::new(path, "must be a boolean"));
            }
        }
        ParameterType::Number => check_number(param, value, path, issues),
        ParameterType::Options => {
            let Some(choices) = param.choices() else {
                return;
            };
            match value.as_str() {
                Some(v) if choices.contains(&v) => {}
                _ => issues.push(ValidationIssue::new(
                    path,
                    format!("{} is not one of: {}", value, choices.join(", ")),
                )),
            }
        }
        ParameterType::Collection => {
            let Some(entries) = value.as_object() else {
                issues.push(ValidationIssue::new(path, "must be an object"));
                return;
            };
            for (key, entry) in entries {
                let field_path = format!("{}.{}", path, key);
                let Some(field) = param.field(key) else {
                    issues.push(ValidationIssue::new(&field_path, "is not a known field"));
                    continue;
                };
                // Keys without a leading slash refer to siblings in the collection
                let visible = field.is_visible(|k| match k.strip_prefix('/') {
                    Some(root_key) => root(root_key),
                    None => entries.get(k).cloned(),
                });
                if !visible {
                    issues.push(ValidationIssue::new(
                        &field_path,
                        "is not available for the selected operation",
                    ));
                    continue;
                }
                check_value(field, entry, &field_path, root, issues);
            }
        }
        ParameterType::FixedCollection => {
            let Some(groups) = value.as_object() else {
                issues.push(ValidationIssue::new(path, "must be an object"));
                return;
            };
            for (group_name, group_value) in groups {
                let group_path = format!("{}.{}", path, group_name);
                let Some(group) = param.group(group_name) else {
                    issues.push(ValidationIssue::new(&group_path, "is not a known field"));
                    continue;
                };
                let entries: Vec<&Value> = match group_value {
                    Value::Array(items) => items.iter().collect(),
                    other => vec![other],
                };
                for (index, entry) in entries.into_iter().enumerate() {
                    let Some(fields) = entry.as_object() else {
                        issues.push(ValidationIssue::new(
                            &format!("{}[{}]", group_path, index),
                            "must be an object",
                        ));
                        continue;
                    };
                    for (key, field_value) in fields {
                        let field_path = format!("{}[{}].{}", group_path, index, key);
                        match group.values.iter().find(|f| &f.name == key) {
                            Some(field) => {
                                check_value(field, field_value, &field_path, root, issues)
                            }
                            None => issues
                                .push(ValidationIssue::new(&field_path, "is not a known field")),
                        }
                    }
                }
            }
        }
    }
}

fn check_number(
    param: &ParameterDef,
    value: &Value,
    path: &str,
    issues: &mut Vec<ValidationIssue>,
) {
    let Some(number) = value.as_f64() else {
        issues.push(ValidationIssue::new(path, "must be a number"));
        return;
    };
    let Some(bounds) = &param.type_options else {
        return;
    };
    if let Some(min) = bounds.min_value
        && number < min
    {
        issues.push(ValidationIssue::new(path, format!("must be at least {}", min)));
    }
    if let Some(max) = bounds.max_value
        && number > max
    {
        issues.push(ValidationIssue::new(path, format!("must be at most {}", max)));
    }
}
