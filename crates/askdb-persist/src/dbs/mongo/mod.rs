mod client;
mod models;

pub use client::MongoPersistenceClient;
pub use models::{MongoConversation, MongoMessage, MongoSummary};
