use askdb_persist::PersistError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MemoryError {
    #[error("Conversation not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(#[source] PersistError),

    #[error("Answer generation failed: {0}")]
    Generation(#[source] anyhow::Error),

    /// A turn failed after the answer was produced; nothing was persisted.
    #[error("could not process your question: {source}")]
    Turn {
        #[source]
        source: Box<MemoryError>,
    },
}

impl MemoryError {
    pub(crate) fn turn(source: MemoryError) -> Self {
        MemoryError::Turn {
            source: Box::new(source),
        }
    }
}

impl From<PersistError> for MemoryError {
    fn from(err: PersistError) -> Self {
        match err {
            PersistError::ConversationNotFound(id) => MemoryError::NotFound(id),
            other => MemoryError::StorageUnavailable(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, MemoryError>;
