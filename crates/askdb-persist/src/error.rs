use thiserror::Error;

#[derive(Error, Debug)]
pub enum PersistError {
    #[cfg(feature = "mongodb")]
    #[error("Database error: {0}")]
    Database(#[from] mongodb::error::Error),

    #[cfg(feature = "mongodb")]
    #[error("BSON serialization error: {0}")]
    BsonSerialization(#[from] bson::ser::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Conversation not found: {0}")]
    ConversationNotFound(String),

    /// The store no longer matches what the caller read (e.g. a compaction
    /// batch lost a message before it could be committed).
    #[error("Conflicting write on conversation {conversation_id}: {reason}")]
    Conflict {
        conversation_id: String,
        reason: String,
    },

    #[error("Corrupt record {record_id}: {reason}")]
    CorruptRecord { record_id: String, reason: String },

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, PersistError>;
