//! Folding old messages into summaries.
//!
//! Once a conversation holds more than `threshold` raw messages, the
//! `threshold` oldest are summarized and replaced by one [`Summary`]. The
//! summary insert and the message deletes commit together; a failing or slow
//! summarizer leaves the conversation exactly as it was.

use std::sync::Arc;

use anyhow::Context as _;
use askdb_persist::{IdService, MessageRecord, PersistenceClient, Summary};
use serde::Serialize;

use crate::config::MemoryConfig;
use crate::summarizer::Summarizer;
use crate::templates::EMPTY_BATCH_SUMMARY;
use crate::text::truncate_chars;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CompactionOutcome {
    /// At or below the threshold, nothing to do
    NotNeeded { message_count: u64 },
    Compacted {
        summaries_created: usize,
        messages_removed: usize,
    },
    /// The first pass failed; the store is unchanged
    Skipped { reason: String },
}

impl CompactionOutcome {
    pub fn messages_removed(&self) -> usize {
        match self {
            CompactionOutcome::Compacted {
                messages_removed, ..
            } => *messages_removed,
            _ => 0,
        }
    }
}

enum Pass {
    BelowThreshold(u64),
    Compacted(usize),
}

/// `ROLE: text` lines fed to the summarizer, blank bodies left out
pub fn transcript_lines(batch: &[MessageRecord], max_chars: usize) -> Vec<String> {
    batch
        .iter()
        .filter_map(|m| {
            let content = m.content_markdown.trim();
            if content.is_empty() {
                return None;
            }
            Some(format!(
                "{}: {}",
                m.role.as_str().to_uppercase(),
                truncate_chars(content, max_chars)
            ))
        })
        .collect()
}

pub struct CompactionPolicy {
    persist: Arc<dyn PersistenceClient>,
    summarizer: Arc<dyn Summarizer>,
    ids: Arc<IdService>,
    threshold: usize,
    input_chars: usize,
    max_passes: usize,
}

impl CompactionPolicy {
    pub fn new(
        persist: Arc<dyn PersistenceClient>,
        summarizer: Arc<dyn Summarizer>,
        ids: Arc<IdService>,
        config: &MemoryConfig,
    ) -> Self {
        Self {
            persist,
            summarizer,
            ids,
            threshold: config.compaction_threshold,
            input_chars: config.summary_input_chars,
            max_passes: config.max_compaction_passes,
        }
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    /// Compact until the conversation is back at or below the threshold.
    ///
    /// Callers must hold the conversation's turn lock. Never fails: problems
    /// are logged and reported as [`CompactionOutcome::Skipped`].
    pub async fn maybe_compact(&self, conversation_id: &str) -> CompactionOutcome {
        let mut summaries_created = 0;
        let mut messages_removed = 0;
        let mut last_count = 0;

        for pass in 0..self.max_passes {
            match self.compact_once(conversation_id).await {
                Ok(Pass::BelowThreshold(count)) => {
                    last_count = count;
                    break;
                }
                Ok(Pass::Compacted(removed)) => {
                    summaries_created += 1;
                    messages_removed += removed;
                    tracing::info!(
                        conversation_id = %conversation_id,
                        pass = pass + 1,
                        messages_removed = removed,
                        "Compacted oldest messages into a summary"
                    );
                }
                Err(e) => {
                    let reason = format!("{:#}", e);
                    tracing::warn!(
                        conversation_id = %conversation_id,
                        pass = pass + 1,
                        error = %reason,
                        "Compaction skipped, history left unchanged"
                    );
                    if summaries_created == 0 {
                        return CompactionOutcome::Skipped { reason };
                    }
                    break;
                }
            }
        }

        if summaries_created == 0 {
            CompactionOutcome::NotNeeded {
                message_count: last_count,
            }
        } else {
            CompactionOutcome::Compacted {
                summaries_created,
                messages_removed,
            }
        }
    }

    async fn compact_once(&self, conversation_id: &str) -> anyhow::Result<Pass> {
        let count = self
            .persist
            .count_messages(conversation_id)
            .await
            .context("counting messages")?;
        if count <= self.threshold as u64 {
            return Ok(Pass::BelowThreshold(count));
        }

        let batch = self
            .persist
            .get_oldest_messages(conversation_id, self.threshold)
            .await
            .context("loading oldest messages")?;
        if batch.is_empty() {
            return Ok(Pass::BelowThreshold(count));
        }

        let lines = transcript_lines(&batch, self.input_chars);
        let content = if lines.is_empty() {
            EMPTY_BATCH_SUMMARY.to_string()
        } else {
            self.summarizer
                .summarize(&lines)
                .await
                .context("summarizer failed")?
        };
        let content = content.trim();
        if content.is_empty() {
            anyhow::bail!("summarizer returned an empty summary");
        }

        let summary = Summary {
            id: self.ids.summary_id(),
            conversation_id: conversation_id.to_string(),
            content: content.to_string(),
            created_at: self.ids.now(),
        };
        let compacted_ids: Vec<String> = batch.iter().map(|m| m.id.clone()).collect();

        self.persist
            .commit_compaction(summary, &compacted_ids)
            .await
            .context("committing compaction")?;
        Ok(Pass::Compacted(compacted_ids.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use askdb_persist::MessageRole;
    use chrono::Utc;

    fn record(role: MessageRole, content: &str) -> MessageRecord {
        MessageRecord::new(
            "msg_1".into(),
            "conv_1".into(),
            role,
            content.into(),
            &[],
            None,
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn test_transcript_lines_format() {
        let batch = vec![
            record(MessageRole::User, "  How many orders?  "),
            record(MessageRole::Assistant, ""),
            record(MessageRole::Assistant, "42 orders."),
        ];
        assert_eq!(
            transcript_lines(&batch, 600),
            vec!["USER: How many orders?", "ASSISTANT: 42 orders."]
        );
    }

    #[test]
    fn test_transcript_lines_truncate() {
        let batch = vec![record(MessageRole::User, &"é".repeat(700))];
        let lines = transcript_lines(&batch, 600);
        assert_eq!(lines[0].chars().count(), "USER: ".len() + 600);
    }

    #[test]
    fn test_outcome_serializes_with_status() {
        let outcome = CompactionOutcome::Compacted {
            summaries_created: 1,
            messages_removed: 10,
        };
        assert_eq!(
            serde_json::to_value(&outcome).unwrap(),
            serde_json::json!({"status": "compacted", "summaries_created": 1, "messages_removed": 10})
        );
    }
}
