use serde::{Deserialize, Serialize};

use crate::error::{MemoryError, Result};
use crate::strategy::HistoryRenderOptions;

/// Tuning for conversation memory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    /// Compaction triggers once a conversation holds more raw messages than this;
    /// each pass folds this many of the oldest messages into one summary
    pub compaction_threshold: usize,
    /// Raw messages included in a context window
    pub window_size: usize,
    /// Summaries rendered into the prompt history, newest kept
    pub max_summaries_in_prompt: usize,
    /// Per-message cap when rendering history
    pub max_message_chars: usize,
    /// Per-message cap when feeding the summarizer
    pub summary_input_chars: usize,
    pub summarizer_timeout_ms: u64,
    pub summarizer_model: String,
    /// Charts kept per assistant message, extra ones are dropped
    pub max_charts_per_message: usize,
    /// Upper bound on compaction passes after one turn
    pub max_compaction_passes: usize,
    /// Fact snapshots handed to exploration
    pub past_facts_limit: usize,
    pub list_limit: usize,
    /// Used when a conversation is created without a database name
    pub default_database: Option<String>,
    /// Databases the caller may pick from
    pub databases: Vec<String>,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            compaction_threshold: 10,
            window_size: 6,
            max_summaries_in_prompt: 3,
            max_message_chars: 1200,
            summary_input_chars: 600,
            summarizer_timeout_ms: 30_000,
            summarizer_model: "gpt-4o-mini".to_string(),
            max_charts_per_message: 4,
            max_compaction_passes: 4,
            past_facts_limit: 5,
            list_limit: 100,
            default_database: None,
            databases: Vec::new(),
        }
    }
}

impl MemoryConfig {
    pub fn validate(&self) -> Result<()> {
        if self.compaction_threshold == 0 {
            return Err(MemoryError::InvalidInput(
                "compaction_threshold must be at least 1".to_string(),
            ));
        }
        if self.window_size == 0 {
            return Err(MemoryError::InvalidInput(
                "window_size must be at least 1".to_string(),
            ));
        }
        if self.max_compaction_passes == 0 {
            return Err(MemoryError::InvalidInput(
                "max_compaction_passes must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn history_render_options(&self) -> HistoryRenderOptions {
        HistoryRenderOptions {
            max_summaries: self.max_summaries_in_prompt,
            max_message_chars: self.max_message_chars,
        }
    }

    /// Database for a new conversation: explicit choice, else the configured default
    pub fn resolve_database(&self, requested: Option<&str>) -> Option<String> {
        requested
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .or_else(|| self.default_database.clone())
    }
}
