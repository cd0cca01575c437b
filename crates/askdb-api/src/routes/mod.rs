pub mod context;
pub mod conversations;
pub mod databases;
pub mod exchanges;
pub mod health;
pub mod messages;
