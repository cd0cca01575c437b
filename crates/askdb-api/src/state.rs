use std::sync::Arc;

use askdb_context::ConversationManager;

use crate::config::Config;

/// Shared application state passed to all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub manager: Arc<ConversationManager>,
}

impl AppState {
    pub fn new(config: Config, manager: ConversationManager) -> Self {
        Self {
            config: Arc::new(config),
            manager: Arc::new(manager),
        }
    }
}
