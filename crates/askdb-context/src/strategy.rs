use askdb_persist::{Message, MessageRole, PersistenceClient, Summary};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::text::ellipsize;

/// What the answer generator sees of a conversation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContextWindow {
    /// Every summary of the conversation, oldest first
    pub summaries: Vec<Summary>,
    /// The newest raw messages, oldest first
    pub recent_messages: Vec<Message>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryRenderOptions {
    pub max_summaries: usize,
    pub max_message_chars: usize,
}

impl Default for HistoryRenderOptions {
    fn default() -> Self {
        Self {
            max_summaries: 3,
            max_message_chars: 1200,
        }
    }
}

impl ContextWindow {
    pub fn is_empty(&self) -> bool {
        self.summaries.is_empty() && self.recent_messages.is_empty()
    }

    /// Flatten the window into prompt text.
    ///
    /// The newest `max_summaries` summaries come first as `SUMMARY:` lines,
    /// then one `USER:`/`ASSISTANT:` line per recent message. Blank bodies are
    /// skipped and long ones cut to `max_message_chars` with a trailing `...`.
    pub fn render_history(&self, options: &HistoryRenderOptions) -> String {
        let skip = self.summaries.len().saturating_sub(options.max_summaries);
        let summaries = self.summaries[skip..]
            .iter()
            .map(|s| s.content.trim())
            .filter(|content| !content.is_empty())
            .map(|content| format!("SUMMARY: {}", content));

        let turns = self
            .recent_messages
            .iter()
            .filter(|m| !m.content_markdown.trim().is_empty())
            .map(|m| {
                let label = match m.role {
                    MessageRole::User => "USER",
                    MessageRole::Assistant => "ASSISTANT",
                };
                format!(
                    "{}: {}",
                    label,
                    ellipsize(m.content_markdown.trim(), options.max_message_chars)
                )
            });

        summaries.chain(turns).collect::<Vec<_>>().join("\n")
    }
}

/// Strategy for building a context window from stored history
#[async_trait]
pub trait ContextStrategy: Send + Sync {
    /// Get context window for a conversation
    async fn get_context_window(
        &self,
        conversation_id: &str,
        persist_client: &dyn PersistenceClient,
    ) -> askdb_persist::Result<ContextWindow>;
}
