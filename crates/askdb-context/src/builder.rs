use std::sync::Arc;

use askdb_persist::{IdService, PersistenceClient};

use crate::compaction::CompactionPolicy;
use crate::config::MemoryConfig;
use crate::default::RecentWindowStrategy;
use crate::error::{MemoryError, Result};
use crate::manager::ConversationManager;
use crate::strategy::ContextStrategy;
use crate::summarizer::Summarizer;

pub struct ConversationManagerBuilder {
    persist: Option<Arc<dyn PersistenceClient>>,
    summarizer: Option<Arc<dyn Summarizer>>,
    context_strategy: Option<Arc<dyn ContextStrategy>>,
    ids: Option<Arc<IdService>>,
    config: MemoryConfig,
}

impl ConversationManagerBuilder {
    pub fn new() -> Self {
        Self {
            persist: None,
            summarizer: None,
            context_strategy: None,
            ids: None,
            config: MemoryConfig::default(),
        }
    }

    pub fn persistence(mut self, persist: Arc<dyn PersistenceClient>) -> Self {
        self.persist = Some(persist);
        self
    }

    pub fn summarizer(mut self, summarizer: Arc<dyn Summarizer>) -> Self {
        self.summarizer = Some(summarizer);
        self
    }

    /// Replace the default recent-window strategy
    pub fn context_strategy(mut self, strategy: Arc<dyn ContextStrategy>) -> Self {
        self.context_strategy = Some(strategy);
        self
    }

    pub fn id_service(mut self, ids: Arc<IdService>) -> Self {
        self.ids = Some(ids);
        self
    }

    pub fn config(mut self, config: MemoryConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Result<ConversationManager> {
        self.config.validate()?;

        let persist = self
            .persist
            .ok_or_else(|| MemoryError::InvalidInput("persistence client is required".to_string()))?;
        let summarizer = self
            .summarizer
            .ok_or_else(|| MemoryError::InvalidInput("summarizer is required".to_string()))?;
        let ids = self.ids.unwrap_or_default();
        let context_strategy = self
            .context_strategy
            .unwrap_or_else(|| Arc::new(RecentWindowStrategy::new(self.config.window_size)));

        let compaction = CompactionPolicy::new(persist.clone(), summarizer, ids.clone(), &self.config);
        Ok(ConversationManager::from_parts(
            persist,
            context_strategy,
            compaction,
            ids,
            self.config,
        ))
    }
}

impl Default for ConversationManagerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
