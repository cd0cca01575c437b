//! Durable storage for AskDB conversations.
//!
//! Three record kinds are persisted: conversations, messages and summaries.
//! [`PersistenceClient`] is the storage seam; [`MemoryPersistenceClient`] keeps
//! everything in process and `MongoPersistenceClient` (feature `mongodb`)
//! stores it in MongoDB.

pub mod dbs;
pub mod error;
pub mod ids;
pub mod models;
pub mod trait_client;

pub use dbs::memory::MemoryPersistenceClient;
#[cfg(feature = "mongodb")]
pub use dbs::mongo::MongoPersistenceClient;
pub use error::{PersistError, Result};
pub use ids::IdService;
pub use models::{
    chart_token, Chart, Conversation, Message, MessageRecord, MessageRole, Summary,
    DEFAULT_CONVERSATION_TITLE,
};
pub use trait_client::PersistenceClient;
