use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{bson::doc, Client, Collection, IndexModel};

use crate::dbs::mongo::models::{MongoConversation, MongoMessage, MongoSummary};
use crate::error::{PersistError, Result};
use crate::models::{Conversation, MessageRecord, Summary};
use crate::trait_client::PersistenceClient;

/// MongoDB-backed store.
///
/// Message appends, cascade deletes and compaction commits run in a
/// multi-document transaction,
/// which requires a replica set or sharded deployment.
pub struct MongoPersistenceClient {
    client: Client,
    conversations: Collection<MongoConversation>,
    messages: Collection<MongoMessage>,
    summaries: Collection<MongoSummary>,
}

impl MongoPersistenceClient {
    /// Connect to MongoDB and create client
    pub async fn connect(mongodb_uri: &str, database: &str) -> Result<Self> {
        let client = Client::with_uri_str(mongodb_uri)
            .await
            .map_err(|e| PersistError::Connection(e.to_string()))?;

        let db = client.database(database);
        let store = Self {
            conversations: db.collection("conversations"),
            messages: db.collection("messages"),
            summaries: db.collection("summaries"),
            client,
        };
        store.ensure_indexes().await?;

        tracing::info!(database = database, "MongoDB persistence ready");
        Ok(store)
    }

    async fn ensure_indexes(&self) -> Result<()> {
        self.conversations
            .create_index(IndexModel::builder().keys(doc! { "updated_at": -1 }).build())
            .await?;
        self.messages
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "conversation_id": 1, "created_at": 1 })
                    .build(),
            )
            .await?;
        self.summaries
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "conversation_id": 1, "created_at": 1 })
                    .build(),
            )
            .await?;
        Ok(())
    }
}

#[async_trait]
impl PersistenceClient for MongoPersistenceClient {
    async fn insert_conversation(&self, conversation: Conversation) -> Result<()> {
        let doc: MongoConversation = conversation.into();
        self.conversations.insert_one(&doc).await?;
        Ok(())
    }

    async fn get_conversation(&self, conversation_id: &str) -> Result<Option<Conversation>> {
        let found = self
            .conversations
            .find_one(doc! { "_id": conversation_id })
            .await?;
        Ok(found.map(Into::into))
    }

    async fn list_conversations(&self, limit: Option<i64>) -> Result<Vec<Conversation>> {
        let mut find = self
            .conversations
            .find(doc! {})
            .sort(doc! { "updated_at": -1, "created_at": -1 });
        if let Some(limit) = limit {
            find = find.limit(limit);
        }

        let conversations: Vec<MongoConversation> = find.await?.try_collect().await?;
        Ok(conversations.into_iter().map(Into::into).collect())
    }

    async fn rename_conversation(&self, conversation_id: &str, title: &str) -> Result<bool> {
        let result = self
            .conversations
            .update_one(
                doc! { "_id": conversation_id },
                doc! { "$set": { "title": title } },
            )
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn delete_conversation(&self, conversation_id: &str) -> Result<()> {
        let mut session = self.client.start_session().await?;
        session.start_transaction().await?;

        let outcome: Result<()> = async {
            self.messages
                .delete_many(doc! { "conversation_id": conversation_id })
                .session(&mut session)
                .await?;
            self.summaries
                .delete_many(doc! { "conversation_id": conversation_id })
                .session(&mut session)
                .await?;
            self.conversations
                .delete_one(doc! { "_id": conversation_id })
                .session(&mut session)
                .await?;
            Ok(())
        }
        .await;

        match outcome {
            Ok(()) => {
                session.commit_transaction().await?;
                Ok(())
            }
            Err(e) => {
                session.abort_transaction().await?;
                Err(e)
            }
        }
    }

    async fn append_messages(&self, messages: Vec<MessageRecord>) -> Result<()> {
        let conversation_id = match messages.first() {
            Some(first) => first.conversation_id.clone(),
            None => return Ok(()),
        };
        let newest = messages
            .iter()
            .map(|m| m.created_at)
            .max()
            .unwrap_or_else(chrono::Utc::now);
        let docs: Vec<MongoMessage> = messages.into_iter().map(Into::into).collect();

        let mut session = self.client.start_session().await?;
        session.start_transaction().await?;

        let outcome: Result<()> = async {
            let touched = self
                .conversations
                .update_one(
                    doc! { "_id": &conversation_id },
                    doc! { "$max": { "updated_at": bson::DateTime::from_chrono(newest) } },
                )
                .session(&mut session)
                .await?;
            if touched.matched_count == 0 {
                return Err(PersistError::ConversationNotFound(conversation_id.clone()));
            }
            self.messages.insert_many(&docs).session(&mut session).await?;
            Ok(())
        }
        .await;

        match outcome {
            Ok(()) => {
                session.commit_transaction().await?;
                Ok(())
            }
            Err(e) => {
                session.abort_transaction().await?;
                Err(e)
            }
        }
    }

    async fn get_messages(&self, conversation_id: &str) -> Result<Vec<MessageRecord>> {
        let messages: Vec<MongoMessage> = self
            .messages
            .find(doc! { "conversation_id": conversation_id })
            .sort(doc! { "created_at": 1, "_id": 1 })
            .await?
            .try_collect()
            .await?;
        Ok(messages.into_iter().map(Into::into).collect())
    }

    async fn get_recent_messages(
        &self,
        conversation_id: &str,
        limit: usize,
    ) -> Result<Vec<MessageRecord>> {
        let mut messages: Vec<MongoMessage> = self
            .messages
            .find(doc! { "conversation_id": conversation_id })
            .sort(doc! { "created_at": -1, "_id": -1 })
            .limit(i64::try_from(limit).unwrap_or(i64::MAX))
            .await?
            .try_collect()
            .await?;
        messages.reverse(); // Return in chronological order
        Ok(messages.into_iter().map(Into::into).collect())
    }

    async fn get_oldest_messages(
        &self,
        conversation_id: &str,
        limit: usize,
    ) -> Result<Vec<MessageRecord>> {
        let messages: Vec<MongoMessage> = self
            .messages
            .find(doc! { "conversation_id": conversation_id })
            .sort(doc! { "created_at": 1, "_id": 1 })
            .limit(i64::try_from(limit).unwrap_or(i64::MAX))
            .await?
            .try_collect()
            .await?;
        Ok(messages.into_iter().map(Into::into).collect())
    }

    async fn count_messages(&self, conversation_id: &str) -> Result<u64> {
        Ok(self
            .messages
            .count_documents(doc! { "conversation_id": conversation_id })
            .await?)
    }

    async fn get_summaries(&self, conversation_id: &str) -> Result<Vec<Summary>> {
        let summaries: Vec<MongoSummary> = self
            .summaries
            .find(doc! { "conversation_id": conversation_id })
            .sort(doc! { "created_at": 1, "_id": 1 })
            .await?
            .try_collect()
            .await?;
        Ok(summaries.into_iter().map(Into::into).collect())
    }

    async fn get_recent_facts(&self, conversation_id: &str, limit: usize) -> Result<Vec<String>> {
        let messages: Vec<MongoMessage> = self
            .messages
            .find(doc! {
                "conversation_id": conversation_id,
                "role": "assistant",
                "facts": { "$nin": [null, ""] },
            })
            .sort(doc! { "created_at": -1, "_id": -1 })
            .limit(i64::try_from(limit).unwrap_or(i64::MAX))
            .await?
            .try_collect()
            .await?;
        Ok(messages.into_iter().filter_map(|m| m.facts).collect())
    }

    async fn commit_compaction(&self, summary: Summary, compacted_ids: &[String]) -> Result<()> {
        let conversation_id = summary.conversation_id.clone();
        let expected = compacted_ids.len() as u64;
        let doc: MongoSummary = summary.into();

        let mut session = self.client.start_session().await?;
        session.start_transaction().await?;

        let outcome: Result<()> = async {
            self.summaries.insert_one(&doc).session(&mut session).await?;
            let deleted = self
                .messages
                .delete_many(doc! {
                    "conversation_id": &conversation_id,
                    "_id": { "$in": compacted_ids.to_vec() },
                })
                .session(&mut session)
                .await?;

            if deleted.deleted_count != expected {
                return Err(PersistError::Conflict {
                    conversation_id: conversation_id.clone(),
                    reason: format!(
                        "expected to compact {} messages, found {}",
                        expected, deleted.deleted_count
                    ),
                });
            }
            Ok(())
        }
        .await;

        match outcome {
            Ok(()) => {
                session.commit_transaction().await?;
                Ok(())
            }
            Err(e) => {
                session.abort_transaction().await?;
                Err(e)
            }
        }
    }
}
