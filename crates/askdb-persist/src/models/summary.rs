use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

/// Condensed replacement for a batch of compacted messages.
/// Never mutated; removed only together with its conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub id: String,
    pub conversation_id: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}
