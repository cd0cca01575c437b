mod conversation;
mod message;
mod summary;

pub use conversation::{Conversation, DEFAULT_CONVERSATION_TITLE};
pub use message::{chart_token, Chart, Message, MessageRecord, MessageRole};
pub use summary::Summary;
