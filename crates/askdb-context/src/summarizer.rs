use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, bail, Result};
use askdb_llm::{ChatClient, ChatRequest};
use async_trait::async_trait;

use crate::templates::DEFAULT_SUMMARIZATION_PROMPT;

/// Turns a batch of transcript lines into bullet-point text
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// `lines` are `ROLE: text` entries, oldest first
    async fn summarize(&self, lines: &[String]) -> Result<String>;
}

/// Summarizer backed by a chat model, bounded by a timeout
pub struct LlmSummarizer {
    client: Arc<dyn ChatClient>,
    model: String,
    timeout: Duration,
    prompt_template: String,
}

impl LlmSummarizer {
    pub fn new(client: Arc<dyn ChatClient>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
            timeout: Duration::from_millis(30_000),
            prompt_template: DEFAULT_SUMMARIZATION_PROMPT.to_string(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_prompt_template(mut self, template: impl Into<String>) -> Self {
        self.prompt_template = template.into();
        self
    }

    fn build_prompt(&self, lines: &[String]) -> String {
        self.prompt_template.replace("{content}", &lines.join("\n"))
    }
}

#[async_trait]
impl Summarizer for LlmSummarizer {
    async fn summarize(&self, lines: &[String]) -> Result<String> {
        if lines.is_empty() {
            bail!("nothing to summarize");
        }

        let request = ChatRequest::new(self.model.clone())
            .user(self.build_prompt(lines))
            .temperature(0.2);

        let response = tokio::time::timeout(self.timeout, self.client.chat(request))
            .await
            .map_err(|_| anyhow!("summarizer timed out after {:?}", self.timeout))??;

        let text = response.text();
        if text.is_empty() {
            bail!("summarizer returned an empty answer");
        }

        tracing::debug!(
            model = %self.model,
            lines = lines.len(),
            summary_chars = text.chars().count(),
            "Summary generated"
        );
        Ok(text.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use askdb_llm::{ChatResponse, Message};
    use std::sync::Mutex;

    struct ScriptedClient {
        answer: Option<String>,
        delay: Duration,
        seen: Mutex<Vec<ChatRequest>>,
    }

    impl ScriptedClient {
        fn answering(answer: Option<&str>) -> Self {
            Self {
                answer: answer.map(str::to_string),
                delay: Duration::ZERO,
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ChatClient for ScriptedClient {
        async fn chat(&self, request: ChatRequest) -> Result<ChatResponse> {
            self.seen.lock().unwrap().push(request);
            tokio::time::sleep(self.delay).await;
            Ok(ChatResponse {
                content: self.answer.clone(),
                ..ChatResponse::default()
            })
        }
    }

    fn lines() -> Vec<String> {
        vec!["USER: How many orders?".into(), "ASSISTANT: 42 orders.".into()]
    }

    #[tokio::test]
    async fn test_prompt_carries_instruction_and_transcript() {
        let client = Arc::new(ScriptedClient::answering(Some("  - 42 orders  ")));
        let summarizer = LlmSummarizer::new(client.clone(), "gpt-4o-mini");

        let summary = summarizer.summarize(&lines()).await.unwrap();
        assert_eq!(summary, "- 42 orders");

        let seen = client.seen.lock().unwrap();
        assert_eq!(seen[0].model, "gpt-4o-mini");
        assert_eq!(seen[0].temperature, Some(0.2));
        let Message { role, content } = &seen[0].messages[0];
        assert_eq!(*role, askdb_llm::Role::User);
        assert!(content.starts_with("Summarize the following chat turns into 4-6 concise bullet points"));
        assert!(content.ends_with("USER: How many orders?\nASSISTANT: 42 orders."));
    }

    #[tokio::test]
    async fn test_empty_answer_is_failure() {
        let summarizer = LlmSummarizer::new(Arc::new(ScriptedClient::answering(Some("   "))), "m");
        assert!(summarizer.summarize(&lines()).await.is_err());

        let summarizer = LlmSummarizer::new(Arc::new(ScriptedClient::answering(None)), "m");
        assert!(summarizer.summarize(&lines()).await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_is_failure() {
        let client = ScriptedClient {
            delay: Duration::from_secs(60),
            ..ScriptedClient::answering(Some("late"))
        };
        let summarizer =
            LlmSummarizer::new(Arc::new(client), "m").with_timeout(Duration::from_secs(30));

        let err = summarizer.summarize(&lines()).await.unwrap_err();
        assert!(err.to_string().contains("timed out"));
    }
}
