use std::sync::Arc;

use askdb_persist::{
    Conversation, IdService, Message, MessageRecord, MessageRole, PersistenceClient,
};

use crate::compaction::{CompactionOutcome, CompactionPolicy};
use crate::config::MemoryConfig;
use crate::error::{MemoryError, Result};
use crate::locks::ConversationLocks;
use crate::strategy::{ContextStrategy, ContextWindow};
use crate::templates::PAST_FACTS_PREFIX;
use crate::text::truncate_chars;
use crate::turn::{AnswerGenerator, Exchange, ExchangeOutcome, NewMessage, TurnOutcome, TurnRequest};

/// Titles derived from a question keep this many characters
pub const TITLE_HINT_CHARS: usize = 80;

/// Title derived from the first question, `None` if it is blank
pub fn title_hint(question: &str) -> Option<String> {
    let hint = truncate_chars(question.trim(), TITLE_HINT_CHARS).trim_end();
    (!hint.is_empty()).then(|| hint.to_string())
}

/// Owns conversation memory: records turns, builds context windows and keeps
/// raw history bounded through compaction.
pub struct ConversationManager {
    persist: Arc<dyn PersistenceClient>,
    context_strategy: Arc<dyn ContextStrategy>,
    compaction: CompactionPolicy,
    ids: Arc<IdService>,
    locks: ConversationLocks,
    config: MemoryConfig,
}

impl ConversationManager {
    pub(crate) fn from_parts(
        persist: Arc<dyn PersistenceClient>,
        context_strategy: Arc<dyn ContextStrategy>,
        compaction: CompactionPolicy,
        ids: Arc<IdService>,
        config: MemoryConfig,
    ) -> Self {
        Self {
            persist,
            context_strategy,
            compaction,
            ids,
            locks: ConversationLocks::new(),
            config,
        }
    }

    pub fn builder() -> crate::builder::ConversationManagerBuilder {
        crate::builder::ConversationManagerBuilder::new()
    }

    pub fn config(&self) -> &MemoryConfig {
        &self.config
    }

    pub fn persistence(&self) -> &Arc<dyn PersistenceClient> {
        &self.persist
    }

    pub async fn create_conversation(
        &self,
        title: Option<&str>,
        database_name: Option<&str>,
    ) -> Result<String> {
        let conversation = Conversation::new(
            self.ids.conversation_id(),
            title.map(str::to_string),
            self.config.resolve_database(database_name),
            self.ids.now(),
        );
        let id = conversation.id.clone();
        self.persist.insert_conversation(conversation).await?;

        tracing::info!(conversation_id = %id, "Conversation created");
        Ok(id)
    }

    pub async fn get_conversation(&self, conversation_id: &str) -> Result<Option<Conversation>> {
        Ok(self.persist.get_conversation(conversation_id).await?)
    }

    pub async fn conversation_exists(&self, conversation_id: &str) -> Result<bool> {
        Ok(self.get_conversation(conversation_id).await?.is_some())
    }

    /// Most recently active first; `None` uses the configured list limit
    pub async fn list_conversations(&self, limit: Option<usize>) -> Result<Vec<Conversation>> {
        let limit = limit.unwrap_or(self.config.list_limit);
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        Ok(self.persist.list_conversations(Some(limit)).await?)
    }

    pub async fn rename_conversation(&self, conversation_id: &str, title: &str) -> Result<Conversation> {
        let title = title.trim();
        if title.is_empty() {
            return Err(MemoryError::InvalidInput("title must not be blank".to_string()));
        }
        if !self.persist.rename_conversation(conversation_id, title).await? {
            return Err(MemoryError::NotFound(conversation_id.to_string()));
        }
        self.get_conversation(conversation_id)
            .await?
            .ok_or_else(|| MemoryError::NotFound(conversation_id.to_string()))
    }

    /// Remove a conversation with all its messages and summaries.
    /// Unknown ids are a no-op.
    pub async fn delete_conversation(&self, conversation_id: &str) -> Result<()> {
        let _turn = self.locks.acquire(conversation_id).await;
        self.persist.delete_conversation(conversation_id).await?;
        tracing::info!(conversation_id = %conversation_id, "Conversation deleted");
        Ok(())
    }

    /// Raw messages still stored, oldest first. Compacted turns are gone.
    pub async fn get_history(&self, conversation_id: &str) -> Result<Vec<Message>> {
        let records = self.persist.get_messages(conversation_id).await?;
        Ok(records.into_iter().map(MessageRecord::decode).collect())
    }

    /// Append one message. Compaction is not run; call [`Self::compact`] or use
    /// [`Self::record_exchange`] to append and compact in one step.
    pub async fn add_message(
        &self,
        conversation_id: &str,
        role: MessageRole,
        message: NewMessage,
    ) -> Result<String> {
        let _turn = self.locks.acquire(conversation_id).await;
        let conversation = self.require_conversation(conversation_id).await?;

        let record = self.build_record(conversation_id, role, message)?;
        let id = record.id.clone();
        let content = record.content_markdown.clone();
        self.persist.append_messages(vec![record]).await?;

        if role == MessageRole::User {
            if let Err(e) = self.adopt_title_hint(&conversation, &content).await {
                tracing::warn!(conversation_id = %conversation_id, error = %e, "Could not set title");
            }
        }
        Ok(id)
    }

    pub async fn build_context(&self, conversation_id: &str) -> Result<ContextWindow> {
        Ok(self
            .context_strategy
            .get_context_window(conversation_id, self.persist.as_ref())
            .await?)
    }

    /// `Previous exploration: ...` lines from assistant facts, newest first
    pub async fn past_facts(&self, conversation_id: &str, limit: Option<usize>) -> Result<Vec<String>> {
        let limit = limit.unwrap_or(self.config.past_facts_limit);
        let facts = self.persist.get_recent_facts(conversation_id, limit).await?;
        Ok(facts
            .into_iter()
            .map(|f| format!("{}{}", PAST_FACTS_PREFIX, f.trim()))
            .collect())
    }

    /// Run compaction now under the conversation's turn lock
    pub async fn compact(&self, conversation_id: &str) -> CompactionOutcome {
        let _turn = self.locks.acquire(conversation_id).await;
        self.compaction.maybe_compact(conversation_id).await
    }

    /// Record a question and its answer, then compact.
    ///
    /// Both messages are stored together or not at all; a storage failure
    /// surfaces as [`MemoryError::Turn`].
    pub async fn record_exchange(
        &self,
        conversation_id: &str,
        exchange: Exchange,
    ) -> Result<ExchangeOutcome> {
        let _turn = self.locks.acquire(conversation_id).await;
        let conversation = self.require_conversation(conversation_id).await?;
        self.append_exchange(&conversation, exchange).await
    }

    /// The full cycle for one question: context, answer, persist, compact.
    ///
    /// Turns on the same conversation are serialized. When the generator
    /// fails nothing is appended.
    pub async fn run_turn(
        &self,
        request: TurnRequest,
        generator: &dyn AnswerGenerator,
    ) -> Result<TurnOutcome> {
        let question = request.question.trim().to_string();
        if question.is_empty() {
            return Err(MemoryError::InvalidInput("question must not be blank".to_string()));
        }

        let (conversation_id, created) = match request.conversation_id.as_deref() {
            Some(id) => {
                self.require_conversation(id).await?;
                (id.to_string(), false)
            }
            None => {
                let title = title_hint(&question);
                let id = self
                    .create_conversation(title.as_deref(), request.database_name.as_deref())
                    .await?;
                (id, true)
            }
        };

        let _turn = self.locks.acquire(&conversation_id).await;
        // Re-read under the lock: a delete may have won the race
        let conversation = self.require_conversation(&conversation_id).await?;
        let context = self.build_context(&conversation_id).await?;
        let past_facts = self.past_facts(&conversation_id, None).await?;

        let answer = match generator
            .generate(&question, &conversation, &context, &past_facts)
            .await
        {
            Ok(answer) => answer,
            Err(e) => {
                tracing::warn!(
                    conversation_id = %conversation_id,
                    error = %e,
                    "Answer generation failed, nothing recorded"
                );
                if created {
                    if let Err(cleanup) = self.persist.delete_conversation(&conversation_id).await {
                        tracing::warn!(
                            conversation_id = %conversation_id,
                            error = %cleanup,
                            "Could not remove empty conversation"
                        );
                    }
                }
                return Err(MemoryError::Generation(e));
            }
        };

        let exchange = Exchange {
            question,
            answer: answer.clone(),
        };
        let recorded = self.append_exchange(&conversation, exchange).await?;

        Ok(TurnOutcome {
            conversation_id,
            created_conversation: created,
            user_message_id: recorded.user_message_id,
            assistant_message_id: recorded.assistant_message_id,
            answer,
            compaction: recorded.compaction,
        })
    }

    /// Caller holds the turn lock
    async fn append_exchange(
        &self,
        conversation: &Conversation,
        exchange: Exchange,
    ) -> Result<ExchangeOutcome> {
        let question = exchange.question.trim().to_string();
        if question.is_empty() {
            return Err(MemoryError::InvalidInput("question must not be blank".to_string()));
        }

        let user = self
            .build_record(&conversation.id, MessageRole::User, NewMessage::text(question.clone()))
            .map_err(MemoryError::turn)?;
        let assistant = self
            .build_record(&conversation.id, MessageRole::Assistant, exchange.answer.into())
            .map_err(MemoryError::turn)?;
        let user_message_id = user.id.clone();
        let assistant_message_id = assistant.id.clone();

        self.persist
            .append_messages(vec![user, assistant])
            .await
            .map_err(|e| MemoryError::turn(e.into()))?;

        tracing::info!(
            conversation_id = %conversation.id,
            user_message_id = %user_message_id,
            assistant_message_id = %assistant_message_id,
            "Exchange recorded"
        );

        if let Err(e) = self.adopt_title_hint(conversation, &question).await {
            tracing::warn!(conversation_id = %conversation.id, error = %e, "Could not set title");
        }

        let compaction = self.compaction.maybe_compact(&conversation.id).await;
        Ok(ExchangeOutcome {
            user_message_id,
            assistant_message_id,
            compaction,
        })
    }

    fn build_record(
        &self,
        conversation_id: &str,
        role: MessageRole,
        message: NewMessage,
    ) -> Result<MessageRecord> {
        let mut charts = message.charts;
        match role {
            MessageRole::User if !charts.is_empty() => {
                tracing::warn!(
                    conversation_id = %conversation_id,
                    dropped = charts.len(),
                    "User messages carry no charts, dropping them"
                );
                charts.clear();
            }
            MessageRole::Assistant if charts.len() > self.config.max_charts_per_message => {
                tracing::warn!(
                    conversation_id = %conversation_id,
                    dropped = charts.len() - self.config.max_charts_per_message,
                    "Too many charts on one message, keeping the first ones"
                );
                charts.truncate(self.config.max_charts_per_message);
            }
            _ => {}
        }

        let facts = message.facts.filter(|f| !f.trim().is_empty());
        Ok(MessageRecord::new(
            self.ids.message_id(),
            conversation_id.to_string(),
            role,
            message.content_markdown,
            &charts,
            facts,
            self.ids.now(),
        )?)
    }

    async fn require_conversation(&self, conversation_id: &str) -> Result<Conversation> {
        self.persist
            .get_conversation(conversation_id)
            .await?
            .ok_or_else(|| MemoryError::NotFound(conversation_id.to_string()))
    }

    /// Give a still-untitled conversation the first question as its title
    async fn adopt_title_hint(&self, conversation: &Conversation, question: &str) -> Result<()> {
        if !conversation.has_placeholder_title() {
            return Ok(());
        }
        if let Some(title) = title_hint(question) {
            self.persist.rename_conversation(&conversation.id, &title).await?;
        }
        Ok(())
    }
}
