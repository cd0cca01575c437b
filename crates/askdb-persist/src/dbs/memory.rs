//! In-process backend.
//!
//! All state sits behind one mutex, so each trait method (cascade delete and
//! compaction commit included) runs as a single critical section. Messages are
//! kept in insertion order, which breaks `created_at` ties by insertion sequence.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::error::{PersistError, Result};
use crate::models::{Conversation, MessageRecord, MessageRole, Summary};
use crate::trait_client::PersistenceClient;

#[derive(Debug, Default)]
struct MemoryState {
    conversations: HashMap<String, Conversation>,
    messages: Vec<MessageRecord>,
    summaries: Vec<Summary>,
}

impl MemoryState {
    fn messages_of<'a>(&'a self, conversation_id: &'a str) -> impl Iterator<Item = &'a MessageRecord> + 'a {
        self.messages
            .iter()
            .filter(move |m| m.conversation_id == conversation_id)
    }

    fn sorted_messages(&self, conversation_id: &str) -> Vec<MessageRecord> {
        let mut messages: Vec<MessageRecord> = self.messages_of(conversation_id).cloned().collect();
        // Stable sort keeps insertion order for equal timestamps
        messages.sort_by_key(|m| m.created_at);
        messages
    }
}

/// In-memory persistence client backed by a `Mutex<MemoryState>`.
#[derive(Debug, Default)]
pub struct MemoryPersistenceClient {
    state: Mutex<MemoryState>,
}

impl MemoryPersistenceClient {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl PersistenceClient for MemoryPersistenceClient {
    async fn insert_conversation(&self, conversation: Conversation) -> Result<()> {
        let mut state = self.state();
        if state.conversations.contains_key(&conversation.id) {
            return Err(PersistError::Conflict {
                conversation_id: conversation.id,
                reason: "conversation id already exists".to_string(),
            });
        }
        state
            .conversations
            .insert(conversation.id.clone(), conversation);
        Ok(())
    }

    async fn get_conversation(&self, conversation_id: &str) -> Result<Option<Conversation>> {
        Ok(self.state().conversations.get(conversation_id).cloned())
    }

    async fn list_conversations(&self, limit: Option<i64>) -> Result<Vec<Conversation>> {
        let state = self.state();
        let mut conversations: Vec<Conversation> = state.conversations.values().cloned().collect();
        conversations.sort_by(|a, b| {
            b.updated_at
                .cmp(&a.updated_at)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });
        if let Some(limit) = limit {
            conversations.truncate(usize::try_from(limit.max(0)).unwrap_or(usize::MAX));
        }
        Ok(conversations)
    }

    async fn rename_conversation(&self, conversation_id: &str, title: &str) -> Result<bool> {
        let mut state = self.state();
        match state.conversations.get_mut(conversation_id) {
            Some(conversation) => {
                conversation.title = title.to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_conversation(&self, conversation_id: &str) -> Result<()> {
        let mut state = self.state();
        state.messages.retain(|m| m.conversation_id != conversation_id);
        state.summaries.retain(|s| s.conversation_id != conversation_id);
        state.conversations.remove(conversation_id);
        Ok(())
    }

    async fn append_messages(&self, messages: Vec<MessageRecord>) -> Result<()> {
        let conversation_id = match messages.first() {
            Some(first) => first.conversation_id.clone(),
            None => return Ok(()),
        };
        if messages.iter().any(|m| m.conversation_id != conversation_id) {
            return Err(PersistError::Internal(
                "append_messages called with messages of several conversations".to_string(),
            ));
        }

        let mut state = self.state();
        let conversation = state
            .conversations
            .get_mut(&conversation_id)
            .ok_or_else(|| PersistError::ConversationNotFound(conversation_id.clone()))?;

        if let Some(newest) = messages.iter().map(|m| m.created_at).max() {
            if newest > conversation.updated_at {
                conversation.updated_at = newest;
            }
        }
        state.messages.extend(messages);
        Ok(())
    }

    async fn get_messages(&self, conversation_id: &str) -> Result<Vec<MessageRecord>> {
        Ok(self.state().sorted_messages(conversation_id))
    }

    async fn get_recent_messages(
        &self,
        conversation_id: &str,
        limit: usize,
    ) -> Result<Vec<MessageRecord>> {
        let mut messages = self.state().sorted_messages(conversation_id);
        let skip = messages.len().saturating_sub(limit);
        Ok(messages.split_off(skip))
    }

    async fn get_oldest_messages(
        &self,
        conversation_id: &str,
        limit: usize,
    ) -> Result<Vec<MessageRecord>> {
        let mut messages = self.state().sorted_messages(conversation_id);
        messages.truncate(limit);
        Ok(messages)
    }

    async fn count_messages(&self, conversation_id: &str) -> Result<u64> {
        Ok(self.state().messages_of(conversation_id).count() as u64)
    }

    async fn get_summaries(&self, conversation_id: &str) -> Result<Vec<Summary>> {
        let state = self.state();
        let mut summaries: Vec<Summary> = state
            .summaries
            .iter()
            .filter(|s| s.conversation_id == conversation_id)
            .cloned()
            .collect();
        summaries.sort_by_key(|s| s.created_at);
        Ok(summaries)
    }

    async fn get_recent_facts(&self, conversation_id: &str, limit: usize) -> Result<Vec<String>> {
        let state = self.state();
        let facts = state
            .sorted_messages(conversation_id)
            .into_iter()
            .rev()
            .filter(|m| m.role == MessageRole::Assistant)
            .filter_map(|m| m.facts)
            .filter(|f| !f.trim().is_empty())
            .take(limit)
            .collect();
        Ok(facts)
    }

    async fn commit_compaction(&self, summary: Summary, compacted_ids: &[String]) -> Result<()> {
        let mut state = self.state();
        let conversation_id = summary.conversation_id.clone();

        if !state.conversations.contains_key(&conversation_id) {
            return Err(PersistError::ConversationNotFound(conversation_id));
        }

        let batch: HashSet<&str> = compacted_ids.iter().map(String::as_str).collect();
        let present = state
            .messages_of(&conversation_id)
            .filter(|m| batch.contains(m.id.as_str()))
            .count();
        if present != batch.len() {
            return Err(PersistError::Conflict {
                conversation_id,
                reason: format!(
                    "{} of {} compacted messages are no longer stored",
                    batch.len() - present,
                    batch.len()
                ),
            });
        }

        state
            .messages
            .retain(|m| !(m.conversation_id == conversation_id && batch.contains(m.id.as_str())));
        state.summaries.push(summary);
        Ok(())
    }
}
