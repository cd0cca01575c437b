#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{anyhow, Result};
use askdb_context::{
    AnswerGenerator, ContextWindow, ConversationManager, GeneratedAnswer, MemoryConfig, Summarizer,
};
use askdb_persist::{
    Chart, Conversation, MemoryPersistenceClient, MessageRecord, PersistError, PersistenceClient,
    Summary,
};
use async_trait::async_trait;

/// Summarizer returning a fixed bullet per batch and remembering what it saw
#[derive(Default)]
pub struct FakeSummarizer {
    pub calls: Mutex<Vec<Vec<String>>>,
    pub fail: AtomicBool,
    pub delay: Mutex<Option<Duration>>,
}

impl FakeSummarizer {
    pub fn failing() -> Self {
        let summarizer = Self::default();
        summarizer.fail.store(true, Ordering::SeqCst);
        summarizer
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl Summarizer for FakeSummarizer {
    async fn summarize(&self, lines: &[String]) -> Result<String> {
        self.calls.lock().unwrap().push(lines.to_vec());
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(anyhow!("summarizer unavailable"));
        }
        Ok(format!("- {} turns discussed", lines.len()))
    }
}

/// Answer generator echoing the question, with optional facts and charts
#[derive(Default)]
pub struct EchoGenerator {
    pub fail: AtomicBool,
    pub charts: Vec<Chart>,
    pub delay: Option<Duration>,
    pub seen_contexts: Mutex<Vec<(ContextWindow, Vec<String>)>>,
    pub in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl EchoGenerator {
    pub fn failing() -> Self {
        let generator = Self::default();
        generator.fail.store(true, Ordering::SeqCst);
        generator
    }
}

#[async_trait]
impl AnswerGenerator for EchoGenerator {
    async fn generate(
        &self,
        question: &str,
        _conversation: &Conversation,
        context: &ContextWindow,
        past_facts: &[String],
    ) -> Result<GeneratedAnswer> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        self.seen_contexts
            .lock()
            .unwrap()
            .push((context.clone(), past_facts.to_vec()));

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.fail.load(Ordering::SeqCst) {
            return Err(anyhow!("query failed"));
        }
        Ok(GeneratedAnswer {
            content_markdown: format!("Answer to: {}", question),
            charts: self.charts.clone(),
            facts: Some(format!("explored for {}", question)),
        })
    }
}

/// Memory store that can be told to fail writes or reads
#[derive(Default)]
pub struct FlakyStore {
    pub inner: MemoryPersistenceClient,
    pub fail_appends: AtomicBool,
    pub fail_reads: AtomicBool,
    pub fail_compaction_commit: AtomicBool,
}

impl FlakyStore {
    fn check(&self, flag: &AtomicBool) -> askdb_persist::Result<()> {
        if flag.load(Ordering::SeqCst) {
            return Err(PersistError::Connection("store offline".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl PersistenceClient for FlakyStore {
    async fn insert_conversation(&self, conversation: Conversation) -> askdb_persist::Result<()> {
        self.inner.insert_conversation(conversation).await
    }

    async fn get_conversation(&self, id: &str) -> askdb_persist::Result<Option<Conversation>> {
        self.check(&self.fail_reads)?;
        self.inner.get_conversation(id).await
    }

    async fn list_conversations(&self, limit: Option<i64>) -> askdb_persist::Result<Vec<Conversation>> {
        self.check(&self.fail_reads)?;
        self.inner.list_conversations(limit).await
    }

    async fn rename_conversation(&self, id: &str, title: &str) -> askdb_persist::Result<bool> {
        self.inner.rename_conversation(id, title).await
    }

    async fn delete_conversation(&self, id: &str) -> askdb_persist::Result<()> {
        self.inner.delete_conversation(id).await
    }

    async fn append_messages(&self, messages: Vec<MessageRecord>) -> askdb_persist::Result<()> {
        self.check(&self.fail_appends)?;
        self.inner.append_messages(messages).await
    }

    async fn get_messages(&self, id: &str) -> askdb_persist::Result<Vec<MessageRecord>> {
        self.check(&self.fail_reads)?;
        self.inner.get_messages(id).await
    }

    async fn get_recent_messages(&self, id: &str, limit: usize) -> askdb_persist::Result<Vec<MessageRecord>> {
        self.check(&self.fail_reads)?;
        self.inner.get_recent_messages(id, limit).await
    }

    async fn get_oldest_messages(&self, id: &str, limit: usize) -> askdb_persist::Result<Vec<MessageRecord>> {
        self.check(&self.fail_reads)?;
        self.inner.get_oldest_messages(id, limit).await
    }

    async fn count_messages(&self, id: &str) -> askdb_persist::Result<u64> {
        self.check(&self.fail_reads)?;
        self.inner.count_messages(id).await
    }

    async fn get_summaries(&self, id: &str) -> askdb_persist::Result<Vec<Summary>> {
        self.check(&self.fail_reads)?;
        self.inner.get_summaries(id).await
    }

    async fn get_recent_facts(&self, id: &str, limit: usize) -> askdb_persist::Result<Vec<String>> {
        self.check(&self.fail_reads)?;
        self.inner.get_recent_facts(id, limit).await
    }

    async fn commit_compaction(&self, summary: Summary, ids: &[String]) -> askdb_persist::Result<()> {
        self.check(&self.fail_compaction_commit)?;
        self.inner.commit_compaction(summary, ids).await
    }
}

pub fn manager_with(
    store: Arc<dyn PersistenceClient>,
    summarizer: Arc<dyn Summarizer>,
    config: MemoryConfig,
) -> ConversationManager {
    ConversationManager::builder()
        .persistence(store)
        .summarizer(summarizer)
        .config(config)
        .build()
        .unwrap()
}

pub fn memory_manager(summarizer: Arc<FakeSummarizer>) -> (ConversationManager, Arc<MemoryPersistenceClient>) {
    let store = Arc::new(MemoryPersistenceClient::new());
    let manager = manager_with(store.clone(), summarizer, MemoryConfig::default());
    (manager, store)
}

pub fn chart(id: &str) -> Chart {
    Chart::new(serde_json::json!({
        "id": id,
        "title": format!("Chart {}", id),
        "chart_type": "bar",
        "data": [],
    }))
}
