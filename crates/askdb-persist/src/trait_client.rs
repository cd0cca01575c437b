use async_trait::async_trait;

use crate::error::Result;
use crate::models::{Conversation, MessageRecord, Summary};

/// Trait for durable storage of conversations, messages and summaries
///
/// Implementations must make every method atomic on its own. Sequences returned
/// for a conversation are ascending by creation order unless stated otherwise.
#[async_trait]
pub trait PersistenceClient: Send + Sync {
    /// Insert a new conversation
    async fn insert_conversation(&self, conversation: Conversation) -> Result<()>;

    /// Get a conversation by ID
    async fn get_conversation(&self, conversation_id: &str) -> Result<Option<Conversation>>;

    /// List conversations, most recently active first
    async fn list_conversations(&self, limit: Option<i64>) -> Result<Vec<Conversation>>;

    /// Change a conversation's title. Returns false if it does not exist.
    async fn rename_conversation(&self, conversation_id: &str, title: &str) -> Result<bool>;

    /// Delete a conversation with its messages and summaries.
    /// Deleting an unknown id succeeds.
    async fn delete_conversation(&self, conversation_id: &str) -> Result<()>;

    /// Insert messages of one conversation, in order, as one unit and bump the
    /// parent's `updated_at` to the newest `created_at`. Fails with
    /// `ConversationNotFound` if the parent is missing; nothing is written then.
    async fn append_messages(&self, messages: Vec<MessageRecord>) -> Result<()>;

    /// All messages of a conversation
    async fn get_messages(&self, conversation_id: &str) -> Result<Vec<MessageRecord>>;

    /// The `limit` newest messages, returned oldest first
    async fn get_recent_messages(
        &self,
        conversation_id: &str,
        limit: usize,
    ) -> Result<Vec<MessageRecord>>;

    /// The `limit` oldest messages
    async fn get_oldest_messages(
        &self,
        conversation_id: &str,
        limit: usize,
    ) -> Result<Vec<MessageRecord>>;

    /// Number of raw messages currently stored for a conversation
    async fn count_messages(&self, conversation_id: &str) -> Result<u64>;

    /// All summaries of a conversation
    async fn get_summaries(&self, conversation_id: &str) -> Result<Vec<Summary>>;

    /// Fact snapshots of assistant messages, newest first
    async fn get_recent_facts(&self, conversation_id: &str, limit: usize) -> Result<Vec<String>>;

    /// Persist `summary` and hard-delete the compacted messages as one unit.
    ///
    /// If any of `compacted_ids` is no longer stored the unit is rejected with
    /// `PersistError::Conflict` and nothing changes.
    async fn commit_compaction(&self, summary: Summary, compacted_ids: &[String]) -> Result<()>;
}
