use anyhow::Result;
use async_trait::async_trait;
use serde_json::Map;
use uuid::Uuid;

use crate::description::NodeDescription;
use crate::dispatch::ApiDispatcher;
use crate::operations::TelegramRequest;
use crate::parameters::NodeParameters;
use crate::records::{InputRecord, OutputRecord};

/// A node type the host can render (via its description) and execute.
#[async_trait]
pub trait NodeType: Send + Sync {
    fn description(&self) -> &NodeDescription;

    /// Runs the node over `items` in order, producing one output per input.
    async fn execute(
        &self,
        dispatcher: &dyn ApiDispatcher,
        items: &[InputRecord],
    ) -> Result<Vec<OutputRecord>>;
}

pub struct TelegramNode {
    description: NodeDescription,
}

impl TelegramNode {
    pub fn new() -> Result<Self> {
        Ok(Self::with_description(NodeDescription::telegram()?))
    }

    pub fn with_description(description: NodeDescription) -> Self {
        Self { description }
    }

    /// Maps one record onto its request without dispatching it.
    pub fn prepare(&self, item: &InputRecord) -> Result<TelegramRequest> {
        let params = NodeParameters::new(&self.description, &item.parameters);
        TelegramRequest::from_parameters(&params)
    }
}

#[async_trait]
impl NodeType for TelegramNode {
    fn description(&self) -> &NodeDescription {
        &self.description
    }

    #[tracing::instrument(skip(self, dispatcher, items), fields(execution_id = %Uuid::new_v4(), items = items.len()))]
    async fn execute(
        &self,
        dispatcher: &dyn ApiDispatcher,
        items: &[InputRecord],
    ) -> Result<Vec<OutputRecord>> {
        let mut results = Vec::with_capacity(items.len());

        for (index, item) in items.iter().enumerate() {
            // Any failure aborts the remaining items.
            let request = self.prepare(item).inspect_err(|e| {
                tracing::error!(item_index = index, error = %e, "Failed to map Telegram request");
            })?;

            let endpoint = request.endpoint();
            tracing::debug!(item_index = index, endpoint, "Dispatching Telegram request");

            let response = dispatcher
                .request(request.method(), endpoint, request.body(), Map::new())
                .await
                .inspect_err(|e| {
                    tracing::error!(item_index = index, endpoint, error = %e, "Telegram request failed");
                })?;

            results.push(OutputRecord {
                json: response,
                paired_item: index,
            });
        }

        tracing::info!(count = results.len(), "Telegram node finished");
        Ok(results)
    }
}
