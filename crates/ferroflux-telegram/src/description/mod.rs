use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::parameters::NodeParameters;

mod validation;

pub use validation::ValidationIssue;

const TELEGRAM_NODE_YAML: &str = include_str!("../../nodes/telegram.yaml");

/// Top-level description of a node as consumed by a host form renderer.
///
/// Pure data: it is parsed once and never mutated at runtime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeDescription {
    pub display_name: String,
    /// Internal node name (e.g. "telegram").
    pub name: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub group: Vec<String>,
    pub version: u32,
    /// Expression the host uses to render a subtitle under the node.
    #[serde(default)]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub defaults: NodeDefaults,
    #[serde(default)]
    pub inputs: Vec<String>,
    #[serde(default)]
    pub outputs: Vec<String>,
    #[serde(default)]
    pub credentials: Vec<CredentialRequirement>,
    pub properties: Vec<ParameterDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeDefaults {
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialRequirement {
    pub name: String,
    #[serde(default)]
    pub required: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ParameterType {
    Options,
    String,
    Number,
    Boolean,
    Collection,
    FixedCollection,
}

/// Definition of a single user-facing field.
///
/// The same `name` may be declared several times with disjoint
/// `display_options`; only one of them is visible for a given selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParameterDef {
    pub display_name: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ParameterType,
    #[serde(default)]
    pub default: Value,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_options: Option<DisplayOptions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_options: Option<TypeOptions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<ParameterOptions>,
}

/// Nested options of a parameter. Which shape applies depends on the
/// parameter type: `options` lists choices, `collection` lists fields and
/// `fixedCollection` lists named groups of fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParameterOptions {
    Groups(Vec<FieldGroup>),
    Fields(Vec<ParameterDef>),
    Choices(Vec<OptionChoice>),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionChoice {
    pub name: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldGroup {
    pub display_name: String,
    pub name: String,
    pub values: Vec<ParameterDef>,
}

/// Visibility conditions keyed by parameter name.
///
/// Keys starting with `/` address root parameters from inside a collection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DisplayOptions {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub show: BTreeMap<String, Vec<Value>>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub hide: BTreeMap<String, Vec<Value>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TypeOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_value: Option<f64>,
    #[serde(default)]
    pub multiple_values: bool,
    #[serde(default)]
    pub always_open_edit_window: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NodeMetadata {
    pub id: String,
    pub name: String,
    pub category: String,
    pub description: Option<String>,
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
    pub credentials: Vec<String>,
}

impl DisplayOptions {
    /// Evaluates the conditions. `lookup` receives the raw key (including a
    /// leading `/`) and returns the current value of that parameter.
    pub fn matches<F>(&self, mut lookup: F) -> bool
    where
        F: FnMut(&str) -> Option<Value>,
    {
        for (key, allowed) in &self.show {
            match lookup(key) {
                Some(current) if allowed.contains(&current) => {}
                _ => return false,
            }
        }

        for (key, hidden) in &self.hide {
            if let Some(current) = lookup(key)
                && hidden.contains(&current)
            {
                return false;
            }
        }

        true
    }
}

impl ParameterDef {
    pub fn is_visible<F>(&self, lookup: F) -> bool
    where
        F: FnMut(&str) -> Option<Value>,
    {
        self.display_options
            .as_ref()
            .is_none_or(|options| options.matches(lookup))
    }

    /// Choice values for an `options` parameter.
    pub fn choices(&self) -> Option<Vec<&str>> {
        match &self.options {
            Some(ParameterOptions::Choices(choices)) => {
                Some(choices.iter().map(|c| c.value.as_str()).collect())
            }
            _ => None,
        }
    }

    pub fn field(&self, name: &str) -> Option<&ParameterDef> {
        match &self.options {
            Some(ParameterOptions::Fields(fields)) => fields.iter().find(|f| f.name == name),
            _ => None,
        }
    }

    pub fn group(&self, name: &str) -> Option<&FieldGroup> {
        match &self.options {
            Some(ParameterOptions::Groups(groups)) => groups.iter().find(|g| g.name == name),
            _ => None,
        }
    }
}

impl NodeDescription {
    /// The Telegram node description shipped with this crate.
    pub fn telegram() -> Result<Self> {
        Self::from_yaml_str(TELEGRAM_NODE_YAML).context("Failed to parse bundled Telegram node")
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let description: NodeDescription =
            serde_yaml::from_str(content).context("Failed to parse node description YAML")?;
        Ok(description)
    }

    #[tracing::instrument]
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read node description: {:?}", path))?;
        let description = Self::from_yaml_str(&content)
            .with_context(|| format!("Failed to parse YAML: {:?}", path))?;

        tracing::info!(node = %description.name, properties = description.properties.len(), "Loaded node description");
        Ok(description)
    }

    /// All top-level declarations sharing `name`, in declaration order.
    pub fn declarations<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a ParameterDef> {
        self.properties.iter().filter(move |p| p.name == name)
    }

    /// Top-level fields a form renderer shows for the given values.
    /// Unset dependencies are evaluated with their defaults.
    pub fn visible_parameters(&self, values: &Map<String, Value>) -> Vec<&ParameterDef> {
        let params = NodeParameters::new(self, values);
        self.properties
            .iter()
            .filter(|p| p.is_visible(|key| params.lookup(key.trim_start_matches('/'))))
            .collect()
    }

    pub fn metadata(&self) -> NodeMetadata {
        NodeMetadata {
            id: self.name.clone(),
            name: self.display_name.clone(),
            category: self
                .group
                .first()
                .cloned()
                .unwrap_or_else(|| "output".to_string()),
            description: self.description.clone(),
            inputs: self.inputs.clone(),
            outputs: self.outputs.clone(),
            credentials: self.credentials.iter().map(|c| c.name.clone()).collect(),
        }
    }
}
