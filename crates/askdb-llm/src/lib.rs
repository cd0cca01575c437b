pub mod openai;
pub mod traits;
pub mod types;

pub use openai::OpenAIClient;
pub use traits::{ChatClient, ChatRequest, ChatResponse};
pub use types::{Message, Role};
