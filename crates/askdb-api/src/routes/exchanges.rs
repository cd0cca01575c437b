use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use askdb_context::{CompactionOutcome, Exchange, GeneratedAnswer};
use askdb_persist::Chart;
use crate::{error::{ApiError, ApiResult}, state::AppState};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AnswerPayload {
    pub content_markdown: String,
    #[serde(default)]
    #[schema(value_type = Vec<Object>)]
    pub charts: Vec<Chart>,
    /// Exploration facts reused by later questions
    #[serde(default)]
    pub facts: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RecordExchangeRequest {
    pub question: String,
    pub answer: AnswerPayload,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ExchangeResponse {
    pub user_message_id: String,
    pub assistant_message_id: String,
    #[schema(value_type = Object)]
    pub compaction: CompactionOutcome,
}

/// Record a question with its answer and compact old history
#[utoipa::path(
    post,
    path = "/conversations/{conversation_id}/exchanges",
    params(
        ("conversation_id" = String, Path, description = "Conversation ID")
    ),
    request_body = RecordExchangeRequest,
    responses(
        (status = 201, description = "Exchange recorded", body = ExchangeResponse),
        (status = 400, description = "Blank question"),
        (status = 404, description = "Conversation not found"),
        (status = 500, description = "Could not process your question")
    ),
    tag = "messages"
)]
pub async fn record_exchange(
    State(state): State<Arc<AppState>>,
    Path(conversation_id): Path<String>,
    Json(req): Json<RecordExchangeRequest>,
) -> ApiResult<(StatusCode, Json<ExchangeResponse>)> {
    if req.question.trim().is_empty() {
        return Err(ApiError::BadRequest("question must not be blank".to_string()));
    }

    let exchange = Exchange {
        question: req.question,
        answer: GeneratedAnswer {
            content_markdown: req.answer.content_markdown,
            charts: req.answer.charts,
            facts: req.answer.facts,
        },
    };
    let outcome = state.manager.record_exchange(&conversation_id, exchange).await?;

    Ok((
        StatusCode::CREATED,
        Json(ExchangeResponse {
            user_message_id: outcome.user_message_id,
            assistant_message_id: outcome.assistant_message_id,
            compaction: outcome.compaction,
        }),
    ))
}
