//! Prelude module for convenient imports
//!
//! ```rust
//! use askdb::prelude::*;
//! ```

pub use crate::{
    AnswerGenerator, Chart, ChatClient, CompactionOutcome, ContextWindow, Conversation,
    ConversationManager, Exchange, GeneratedAnswer, LlmSummarizer, MemoryConfig, MemoryError,
    MemoryPersistenceClient, Message, MessageRole, NewMessage, OpenAIClient, PersistenceClient,
    Summarizer, TurnRequest,
};
