use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

/// Title given to conversations created without one
pub const DEFAULT_CONVERSATION_TITLE: &str = "New conversation";

/// Database-agnostic conversation thread
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: String,
    pub title: String,
    /// Backing data source this thread targets; fixed at creation
    pub database_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    pub fn new(
        id: String,
        title: Option<String>,
        database_name: Option<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        let title = title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| DEFAULT_CONVERSATION_TITLE.to_string());

        Self {
            id,
            title,
            database_name,
            created_at,
            updated_at: created_at,
        }
    }

    /// True while the thread still carries the placeholder title
    pub fn has_placeholder_title(&self) -> bool {
        self.title.trim().is_empty() || self.title == DEFAULT_CONVERSATION_TITLE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_title_falls_back_to_placeholder() {
        let conv = Conversation::new("conv_1".into(), Some("   ".into()), None, Utc::now());
        assert_eq!(conv.title, DEFAULT_CONVERSATION_TITLE);
        assert!(conv.has_placeholder_title());
        assert_eq!(conv.created_at, conv.updated_at);
    }

    #[test]
    fn test_explicit_title_is_kept() {
        let conv = Conversation::new(
            "conv_1".into(),
            Some("Revenue by region".into()),
            Some("sales".into()),
            Utc::now(),
        );
        assert_eq!(conv.title, "Revenue by region");
        assert!(!conv.has_placeholder_title());
    }
}
