use askdb_persist::{PersistenceClient, Result};
use async_trait::async_trait;

use crate::strategy::{ContextStrategy, ContextWindow};

/// All summaries plus the newest `window_size` raw messages
pub struct RecentWindowStrategy {
    window_size: usize,
}

impl RecentWindowStrategy {
    pub fn new(window_size: usize) -> Self {
        Self { window_size }
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }
}

#[async_trait]
impl ContextStrategy for RecentWindowStrategy {
    async fn get_context_window(
        &self,
        conversation_id: &str,
        persist_client: &dyn PersistenceClient,
    ) -> Result<ContextWindow> {
        let summaries = persist_client.get_summaries(conversation_id).await?;
        let recent_messages = persist_client
            .get_recent_messages(conversation_id, self.window_size)
            .await?
            .into_iter()
            .map(|record| record.decode())
            .collect();

        Ok(ContextWindow {
            summaries,
            recent_messages,
        })
    }
}
