use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One host-supplied input record with its resolved parameter values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InputRecord {
    #[serde(default)]
    pub parameters: Map<String, Value>,
}

impl InputRecord {
    pub fn new(parameters: Map<String, Value>) -> Self {
        Self { parameters }
    }
}

/// Host output envelope: the dispatcher response for one input record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputRecord {
    pub json: Value,
    /// Index of the input record this output was produced from.
    pub paired_item: usize,
}
