use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{Mutex as TurnMutex, OwnedMutexGuard};

/// One async mutex per conversation.
///
/// Turns on the same conversation queue up; different conversations never
/// wait on each other. Idle entries are dropped on the next acquire.
#[derive(Debug, Default)]
pub struct ConversationLocks {
    inner: Mutex<HashMap<String, Arc<TurnMutex<()>>>>,
}

impl ConversationLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, conversation_id: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            map.retain(|id, lock| id == conversation_id || Arc::strong_count(lock) > 1);
            map.entry(conversation_id.to_string())
                .or_insert_with(|| Arc::new(TurnMutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }

    /// Conversations with a held or awaited lock
    pub fn active(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|lock| Arc::strong_count(lock) > 1)
            .count()
    }
}
