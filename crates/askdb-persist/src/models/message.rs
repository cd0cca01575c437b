use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use chrono::{DateTime, Utc};

use crate::error::{PersistError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Chart payload produced by the chart-building collaborator.
///
/// Opaque JSON: stored and returned exactly as the producer wrote it. Only the
/// surrounding array is checked when a stored message is decoded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Chart(Value);

impl Chart {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// The `id` referenced by a `{{chart:<id>}}` token, when the payload has one
    pub fn id(&self) -> Option<&str> {
        self.0.get("id").and_then(Value::as_str)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }
}

impl From<Value> for Chart {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

/// Placeholder embedded in assistant markdown where a chart renders
pub fn chart_token(chart_id: &str) -> String {
    format!("{{{{chart:{}}}}}", chart_id)
}

/// Message row as persisted: charts are kept as a serialized JSON string
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageRecord {
    pub id: String,
    pub conversation_id: String,
    pub role: MessageRole,
    pub content_markdown: String,
    pub charts_json: String,
    pub facts: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl MessageRecord {
    pub fn new(
        id: String,
        conversation_id: String,
        role: MessageRole,
        content_markdown: String,
        charts: &[Chart],
        facts: Option<String>,
        created_at: DateTime<Utc>,
    ) -> Result<Self> {
        Ok(Self {
            id,
            conversation_id,
            role,
            content_markdown,
            charts_json: serde_json::to_string(charts)?,
            facts,
            created_at,
        })
    }

    fn parse_charts(&self) -> Result<Vec<Chart>> {
        if self.charts_json.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&self.charts_json).map_err(|e| PersistError::CorruptRecord {
            record_id: self.id.clone(),
            reason: format!("charts_json: {}", e),
        })
    }

    /// Decode into the read model.
    ///
    /// A chart payload that fails to parse degrades to an empty chart list;
    /// the markdown body is returned untouched.
    pub fn decode(self) -> Message {
        let charts = match self.parse_charts() {
            Ok(charts) => charts,
            Err(e) => {
                tracing::warn!(
                    conversation_id = %self.conversation_id,
                    error = %e,
                    "Unreadable chart payload, returning message without charts"
                );
                Vec::new()
            }
        };

        Message {
            id: self.id,
            conversation_id: self.conversation_id,
            role: self.role,
            content_markdown: self.content_markdown,
            charts,
            facts: self.facts,
            created_at: self.created_at,
        }
    }
}

/// One turn of a conversation, with charts decoded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub conversation_id: String,
    pub role: MessageRole,
    pub content_markdown: String,
    pub charts: Vec<Chart>,
    /// Exploration facts behind an assistant answer; never shown to end users
    #[serde(skip_serializing_if = "Option::is_none")]
    pub facts: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(charts_json: &str) -> MessageRecord {
        MessageRecord {
            id: "msg_1".into(),
            conversation_id: "conv_1".into(),
            role: MessageRole::Assistant,
            content_markdown: "Sales doubled. {{chart:c1}}".into(),
            charts_json: charts_json.into(),
            facts: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_chart_token_format() {
        assert_eq!(chart_token("c1"), "{{chart:c1}}");
    }

    #[test]
    fn test_role_serializes_lowercase() {
        assert_eq!(serde_json::to_value(MessageRole::User).unwrap(), json!("user"));
        assert_eq!(MessageRole::Assistant.to_string(), "assistant");
    }

    #[test]
    fn test_chart_round_trips_verbatim() {
        let raw = json!({
            "title": "Orders per month",
            "chart_type": "bar",
            "data": [{"label": "Jan", "value": 3, "color": "red"}],
            "stacked": true
        });

        let chart: Chart = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(chart.id(), None);
        assert_eq!(serde_json::to_value(&chart).unwrap(), raw);
    }

    #[test]
    fn test_decode_keeps_missing_and_null_fields_as_written() {
        let stored = r#"[{"title":"Orders","chart_type":"bar","data":[{"label":"Jan","value":3}]},{"id":"c1","title":null,"x_axis":null}]"#;
        let message = record(stored).decode();

        assert_eq!(message.charts.len(), 2);
        assert_eq!(message.charts[1].id(), Some("c1"));
        let reencoded = serde_json::to_value(&message.charts).unwrap();
        let expected: Value = serde_json::from_str(stored).unwrap();
        assert_eq!(reencoded, expected);
    }

    #[test]
    fn test_record_stores_charts_unchanged() {
        let charts = vec![Chart::new(json!({"id": "c2", "title": null, "data": []}))];
        let record = MessageRecord::new(
            "msg_2".into(),
            "conv_1".into(),
            MessageRole::Assistant,
            "{{chart:c2}}".into(),
            &charts,
            None,
            Utc::now(),
        )
        .unwrap();

        let stored: Value = serde_json::from_str(&record.charts_json).unwrap();
        assert_eq!(stored, json!([{"id": "c2", "title": null, "data": []}]));
        assert_eq!(record.decode().charts, charts);
    }

    #[test]
    fn test_decode_non_array_payload_is_corrupt() {
        let message = record(r#"{"id":"c1"}"#).decode();
        assert!(message.charts.is_empty());
    }

    #[test]
    fn test_decode_valid_charts() {
        let message = record(r#"[{"id":"c1","chart_type":"pie","data":[]}]"#).decode();
        assert_eq!(message.charts.len(), 1);
        assert_eq!(message.charts[0].id(), Some("c1"));
        assert_eq!(message.charts[0].as_value()["chart_type"], "pie");
    }

    #[test]
    fn test_decode_empty_payload() {
        assert!(record("").decode().charts.is_empty());
    }

    #[test]
    fn test_decode_corrupt_payload_keeps_content() {
        let message = record("{not json").decode();
        assert!(message.charts.is_empty());
        assert_eq!(message.content_markdown, "Sales doubled. {{chart:c1}}");
    }

    #[test]
    fn test_parse_charts_reports_corrupt_record() {
        let err = record("[1, 2").parse_charts().unwrap_err();
        assert!(matches!(err, PersistError::CorruptRecord { ref record_id, .. } if record_id == "msg_1"));
    }
}
