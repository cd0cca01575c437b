use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use askdb_persist::Summary;
use crate::{
    error::{ApiError, ApiResult},
    routes::messages::MessageResponse,
    state::AppState,
};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SummaryResponse {
    pub summary_id: String,
    pub content: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<Summary> for SummaryResponse {
    fn from(summary: Summary) -> Self {
        Self {
            summary_id: summary.id,
            content: summary.content,
            created_at: summary.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ContextResponse {
    pub conversation_id: String,
    pub summaries: Vec<SummaryResponse>,
    pub recent_messages: Vec<MessageResponse>,
    /// Prompt-ready history text
    pub history: String,
    pub past_facts: Vec<String>,
}

/// Context the answer pipeline would see for the next question
#[utoipa::path(
    get,
    path = "/conversations/{conversation_id}/context",
    params(
        ("conversation_id" = String, Path, description = "Conversation ID")
    ),
    responses(
        (status = 200, description = "Context window", body = ContextResponse),
        (status = 404, description = "Conversation not found")
    ),
    tag = "messages"
)]
pub async fn get_context(
    State(state): State<Arc<AppState>>,
    Path(conversation_id): Path<String>,
) -> ApiResult<Json<ContextResponse>> {
    if !state.manager.conversation_exists(&conversation_id).await? {
        return Err(ApiError::ConversationNotFound(conversation_id));
    }

    let window = state.manager.build_context(&conversation_id).await?;
    let past_facts = state.manager.past_facts(&conversation_id, None).await?;
    let history = window.render_history(&state.manager.config().history_render_options());

    Ok(Json(ContextResponse {
        conversation_id,
        summaries: window.summaries.into_iter().map(Into::into).collect(),
        recent_messages: window.recent_messages.into_iter().map(Into::into).collect(),
        history,
        past_facts,
    }))
}
