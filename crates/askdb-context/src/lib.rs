//! Conversation memory for AskDB.
//!
//! [`ConversationManager`] records user/assistant turns, hands the answer
//! pipeline a bounded [`ContextWindow`] (all summaries plus the newest raw
//! messages) and folds old messages into summaries once a conversation grows
//! past the compaction threshold.

mod builder;
mod compaction;
mod config;
mod default;
mod error;
mod locks;
mod manager;
mod strategy;
mod summarizer;
mod templates;
mod text;
mod turn;

pub use builder::ConversationManagerBuilder;
pub use compaction::{transcript_lines, CompactionOutcome, CompactionPolicy};
pub use config::MemoryConfig;
pub use default::RecentWindowStrategy;
pub use error::{MemoryError, Result};
pub use locks::ConversationLocks;
pub use manager::{title_hint, ConversationManager, TITLE_HINT_CHARS};
pub use strategy::{ContextStrategy, ContextWindow, HistoryRenderOptions};
pub use summarizer::{LlmSummarizer, Summarizer};
pub use templates::{DEFAULT_SUMMARIZATION_PROMPT, EMPTY_BATCH_SUMMARY, PAST_FACTS_PREFIX};
pub use turn::{
    AnswerGenerator, Exchange, ExchangeOutcome, GeneratedAnswer, NewMessage, TurnOutcome,
    TurnRequest,
};
