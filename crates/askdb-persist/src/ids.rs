//! Identifier and timestamp service.
//!
//! Every record gets an opaque `{prefix}_{12 hex}` id and a UTC timestamp
//! truncated to milliseconds (the precision a BSON date can hold). Timestamps
//! issued by one [`IdService`] are strictly increasing, so ordering records by
//! `created_at` is a total order within a process.

use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Duration, DurationRound, Utc};

pub const CONVERSATION_PREFIX: &str = "conv";
pub const MESSAGE_PREFIX: &str = "msg";
pub const SUMMARY_PREFIX: &str = "sum";

/// Generate an opaque id such as `msg_3f2a9c01b7de`
pub fn generate_id(prefix: &str) -> String {
    let hex = uuid::Uuid::new_v4().simple().to_string();
    format!("{}_{}", prefix, &hex[..12])
}

/// Truncate a timestamp to millisecond precision
pub fn normalize_timestamp(ts: DateTime<Utc>) -> DateTime<Utc> {
    ts.duration_trunc(Duration::milliseconds(1)).unwrap_or(ts)
}

#[derive(Debug, Default)]
pub struct IdService {
    last_issued: Mutex<Option<DateTime<Utc>>>,
}

impl IdService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn conversation_id(&self) -> String {
        generate_id(CONVERSATION_PREFIX)
    }

    pub fn message_id(&self) -> String {
        generate_id(MESSAGE_PREFIX)
    }

    pub fn summary_id(&self) -> String {
        generate_id(SUMMARY_PREFIX)
    }

    /// Current time, normalized and strictly after any instant this service
    /// has already handed out.
    pub fn now(&self) -> DateTime<Utc> {
        let wall = normalize_timestamp(Utc::now());
        let mut last = self
            .last_issued
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let next = match *last {
            Some(prev) if wall <= prev => prev + Duration::milliseconds(1),
            _ => wall,
        };
        *last = Some(next);
        next
    }
}
