use bson::serde_helpers::chrono_datetime_as_bson_datetime;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Conversation, MessageRecord, MessageRole, Summary};

/// MongoDB conversation document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoConversation {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub database_name: Option<String>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

/// MongoDB message document (charts stay a serialized string)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoMessage {
    #[serde(rename = "_id")]
    pub id: String,
    pub conversation_id: String,
    pub role: MessageRole,
    pub content_markdown: String,
    #[serde(default)]
    pub charts_json: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub facts: Option<String>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

/// MongoDB summary document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoSummary {
    #[serde(rename = "_id")]
    pub id: String,
    pub conversation_id: String,
    pub content: String,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

// Conversions between database-agnostic and MongoDB-specific models

impl From<Conversation> for MongoConversation {
    fn from(c: Conversation) -> Self {
        Self {
            id: c.id,
            title: c.title,
            database_name: c.database_name,
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}

impl From<MongoConversation> for Conversation {
    fn from(c: MongoConversation) -> Self {
        Self {
            id: c.id,
            title: c.title,
            database_name: c.database_name,
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}

impl From<MessageRecord> for MongoMessage {
    fn from(m: MessageRecord) -> Self {
        Self {
            id: m.id,
            conversation_id: m.conversation_id,
            role: m.role,
            content_markdown: m.content_markdown,
            charts_json: m.charts_json,
            facts: m.facts,
            created_at: m.created_at,
        }
    }
}

impl From<MongoMessage> for MessageRecord {
    fn from(m: MongoMessage) -> Self {
        Self {
            id: m.id,
            conversation_id: m.conversation_id,
            role: m.role,
            content_markdown: m.content_markdown,
            charts_json: m.charts_json,
            facts: m.facts,
            created_at: m.created_at,
        }
    }
}

impl From<Summary> for MongoSummary {
    fn from(s: Summary) -> Self {
        Self {
            id: s.id,
            conversation_id: s.conversation_id,
            content: s.content,
            created_at: s.created_at,
        }
    }
}

impl From<MongoSummary> for Summary {
    fn from(s: MongoSummary) -> Self {
        Self {
            id: s.id,
            conversation_id: s.conversation_id,
            content: s.content,
            created_at: s.created_at,
        }
    }
}
