use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use askdb_persist::{Chart, Message};
use crate::{error::{ApiError, ApiResult}, state::AppState};

/// A stored turn as shown to end users; exploration facts stay internal
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message_id: String,
    #[schema(value_type = String, example = "assistant")]
    pub role: askdb_persist::MessageRole,
    pub content_markdown: String,
    #[schema(value_type = Vec<Object>)]
    pub charts: Vec<Chart>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<Message> for MessageResponse {
    fn from(message: Message) -> Self {
        Self {
            message_id: message.id,
            role: message.role,
            content_markdown: message.content_markdown,
            charts: message.charts,
            created_at: message.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ListMessagesResponse {
    pub messages: Vec<MessageResponse>,
}

/// Raw messages still stored for a conversation, oldest first
#[utoipa::path(
    get,
    path = "/conversations/{conversation_id}/messages",
    params(
        ("conversation_id" = String, Path, description = "Conversation ID")
    ),
    responses(
        (status = 200, description = "Conversation history", body = ListMessagesResponse),
        (status = 404, description = "Conversation not found")
    ),
    tag = "messages"
)]
pub async fn list_messages(
    State(state): State<Arc<AppState>>,
    Path(conversation_id): Path<String>,
) -> ApiResult<Json<ListMessagesResponse>> {
    if !state.manager.conversation_exists(&conversation_id).await? {
        return Err(ApiError::ConversationNotFound(conversation_id));
    }

    let messages = state.manager.get_history(&conversation_id).await?;
    Ok(Json(ListMessagesResponse {
        messages: messages.into_iter().map(Into::into).collect(),
    }))
}
