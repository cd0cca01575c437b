/// Instruction placed before the transcript when compacting old turns.
/// `{content}` is replaced with one `ROLE: text` line per message.
pub const DEFAULT_SUMMARIZATION_PROMPT: &str = "Summarize the following chat turns into 4-6 concise bullet points capturing key facts, user intent, and decisions. Keep numbers if present.\n\n{content}";

/// Prefix for fact snapshots handed to the exploration step
pub const PAST_FACTS_PREFIX: &str = "Previous exploration: ";

/// Stored when a compacted batch carried no text at all
pub const EMPTY_BATCH_SUMMARY: &str = "- Earlier turns carried no text content.";
