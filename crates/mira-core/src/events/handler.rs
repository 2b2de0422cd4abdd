use anyhow::Result;
use async_trait::async_trait;

/// Handler for `custom` events, registered by name on the event processor.
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Handle one event and return a one-line summary for the log.
    async fn handle(&self, payload: &serde_json::Value) -> Result<String>;
}
