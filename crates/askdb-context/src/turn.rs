use askdb_persist::{Chart, Conversation};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::compaction::CompactionOutcome;
use crate::strategy::ContextWindow;

/// Body of a new message
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewMessage {
    pub content_markdown: String,
    #[serde(default)]
    pub charts: Vec<Chart>,
    #[serde(default)]
    pub facts: Option<String>,
}

impl NewMessage {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content_markdown: content.into(),
            ..Default::default()
        }
    }

    pub fn with_charts(mut self, charts: Vec<Chart>) -> Self {
        self.charts = charts;
        self
    }

    pub fn with_facts(mut self, facts: impl Into<String>) -> Self {
        self.facts = Some(facts.into());
        self
    }
}

/// What the answer pipeline produced for one question
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeneratedAnswer {
    pub content_markdown: String,
    #[serde(default)]
    pub charts: Vec<Chart>,
    /// Exploration facts kept for later turns
    #[serde(default)]
    pub facts: Option<String>,
}

impl From<GeneratedAnswer> for NewMessage {
    fn from(answer: GeneratedAnswer) -> Self {
        Self {
            content_markdown: answer.content_markdown,
            charts: answer.charts,
            facts: answer.facts,
        }
    }
}

/// A question and its answer, recorded as one user/assistant pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exchange {
    pub question: String,
    pub answer: GeneratedAnswer,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExchangeOutcome {
    pub user_message_id: String,
    pub assistant_message_id: String,
    pub compaction: CompactionOutcome,
}

#[derive(Debug, Clone, Default)]
pub struct TurnRequest {
    /// Continue this conversation, or start a new one when `None`
    pub conversation_id: Option<String>,
    pub question: String,
    /// Database for a newly started conversation
    pub database_name: Option<String>,
}

impl TurnRequest {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            ..Default::default()
        }
    }

    pub fn in_conversation(mut self, conversation_id: impl Into<String>) -> Self {
        self.conversation_id = Some(conversation_id.into());
        self
    }

    pub fn on_database(mut self, database_name: impl Into<String>) -> Self {
        self.database_name = Some(database_name.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TurnOutcome {
    pub conversation_id: String,
    /// True when this turn started the conversation
    pub created_conversation: bool,
    pub user_message_id: String,
    pub assistant_message_id: String,
    pub answer: GeneratedAnswer,
    pub compaction: CompactionOutcome,
}

/// The answer pipeline (query planning, execution, charting) seen from memory
#[async_trait]
pub trait AnswerGenerator: Send + Sync {
    async fn generate(
        &self,
        question: &str,
        conversation: &Conversation,
        context: &ContextWindow,
        past_facts: &[String],
    ) -> anyhow::Result<GeneratedAnswer>;
}
