//! # AskDB
//!
//! Conversation memory for a natural-language analytics assistant.
//!
//! A user asks questions about a database; every question and answer is kept
//! as a conversation. This crate stores those turns, builds the bounded
//! context handed to the answer pipeline and compacts old turns into
//! summaries so history never grows without bound.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use askdb::prelude::*;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let llm = Arc::new(OpenAIClient::new(std::env::var("OPENAI_API_KEY")?)?);
//!     let summarizer = Arc::new(LlmSummarizer::new(llm, "gpt-4o-mini"));
//!
//!     let manager = ConversationManager::builder()
//!         .persistence(Arc::new(MemoryPersistenceClient::new()))
//!         .summarizer(summarizer)
//!         .config(MemoryConfig::default())
//!         .build()?;
//!
//!     let id = manager.create_conversation(None, Some("sales")).await?;
//!     manager
//!         .record_exchange(&id, Exchange {
//!             question: "How many orders in March?".into(),
//!             answer: GeneratedAnswer {
//!                 content_markdown: "42 orders.".into(),
//!                 ..Default::default()
//!             },
//!         })
//!         .await?;
//!
//!     let window = manager.build_context(&id).await?;
//!     println!("{}", window.render_history(&manager.config().history_render_options()));
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - **`askdb-persist`**: conversations, messages and summaries (in-memory or MongoDB)
//! - **`askdb-llm`**: chat client used by the summarizer
//! - **`askdb-context`**: conversation manager, context windows and compaction
//!
//! ## License
//!
//! MIT

pub mod prelude;

pub use askdb_persist::{
    chart_token, Chart, Conversation, IdService, MemoryPersistenceClient, Message, MessageRecord,
    MessageRole, PersistError, PersistenceClient, Summary, DEFAULT_CONVERSATION_TITLE,
};

#[cfg(feature = "mongodb")]
pub use askdb_persist::MongoPersistenceClient;

pub use askdb_llm::{
    ChatClient, ChatRequest, ChatResponse, Message as ChatMessage, OpenAIClient,
};

pub use askdb_context::{
    AnswerGenerator, CompactionOutcome, ContextStrategy, ContextWindow, ConversationManager,
    ConversationManagerBuilder, Exchange, ExchangeOutcome, GeneratedAnswer, HistoryRenderOptions,
    LlmSummarizer, MemoryConfig, MemoryError, NewMessage, RecentWindowStrategy, Summarizer,
    TurnOutcome, TurnRequest,
};
