use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use askdb_persist::Conversation;
use crate::{error::{ApiError, ApiResult}, state::AppState};

/// Hard cap on one listing page
const MAX_LIST_LIMIT: usize = 100;

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct CreateConversationRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub database_name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RenameConversationRequest {
    pub title: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ConversationResponse {
    pub conversation_id: String,
    pub title: String,
    pub database_name: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<Conversation> for ConversationResponse {
    fn from(conversation: Conversation) -> Self {
        Self {
            conversation_id: conversation.id,
            title: conversation.title,
            database_name: conversation.database_name,
            created_at: conversation.created_at,
            updated_at: conversation.updated_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ListConversationsQuery {
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ListConversationsResponse {
    pub conversations: Vec<ConversationResponse>,
}

/// Create a new conversation
#[utoipa::path(
    post,
    path = "/conversations",
    request_body = CreateConversationRequest,
    responses(
        (status = 201, description = "Conversation created", body = ConversationResponse),
        (status = 400, description = "Invalid request")
    ),
    tag = "conversations"
)]
pub async fn create_conversation(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateConversationRequest>,
) -> ApiResult<(StatusCode, Json<ConversationResponse>)> {
    let databases = &state.manager.config().databases;
    if let Some(name) = req.database_name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
        if !databases.is_empty() && !databases.iter().any(|d| d == name) {
            return Err(ApiError::BadRequest(format!("Unknown database: {}", name)));
        }
    }

    let id = state
        .manager
        .create_conversation(req.title.as_deref(), req.database_name.as_deref())
        .await?;
    let conversation = state
        .manager
        .get_conversation(&id)
        .await?
        .ok_or_else(|| ApiError::ConversationNotFound(id.clone()))?;

    Ok((StatusCode::CREATED, Json(conversation.into())))
}

/// List conversations, most recently active first
#[utoipa::path(
    get,
    path = "/conversations",
    params(
        ("limit" = Option<usize>, Query, description = "Maximum number of conversations to return (default and cap: 100)")
    ),
    responses(
        (status = 200, description = "List of conversations", body = ListConversationsResponse)
    ),
    tag = "conversations"
)]
pub async fn list_conversations(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListConversationsQuery>,
) -> ApiResult<Json<ListConversationsResponse>> {
    let limit = query.limit.map(|l| l.min(MAX_LIST_LIMIT));
    let conversations = state.manager.list_conversations(limit).await?;

    Ok(Json(ListConversationsResponse {
        conversations: conversations.into_iter().map(Into::into).collect(),
    }))
}

/// Get a specific conversation by ID
#[utoipa::path(
    get,
    path = "/conversations/{conversation_id}",
    params(
        ("conversation_id" = String, Path, description = "Conversation ID")
    ),
    responses(
        (status = 200, description = "Conversation details", body = ConversationResponse),
        (status = 404, description = "Conversation not found")
    ),
    tag = "conversations"
)]
pub async fn get_conversation(
    State(state): State<Arc<AppState>>,
    Path(conversation_id): Path<String>,
) -> ApiResult<Json<ConversationResponse>> {
    let conversation = state
        .manager
        .get_conversation(&conversation_id)
        .await?
        .ok_or(ApiError::ConversationNotFound(conversation_id))?;

    Ok(Json(conversation.into()))
}

/// Rename a conversation
#[utoipa::path(
    patch,
    path = "/conversations/{conversation_id}",
    params(
        ("conversation_id" = String, Path, description = "Conversation ID")
    ),
    request_body = RenameConversationRequest,
    responses(
        (status = 200, description = "Conversation renamed", body = ConversationResponse),
        (status = 400, description = "Blank title"),
        (status = 404, description = "Conversation not found")
    ),
    tag = "conversations"
)]
pub async fn rename_conversation(
    State(state): State<Arc<AppState>>,
    Path(conversation_id): Path<String>,
    Json(req): Json<RenameConversationRequest>,
) -> ApiResult<Json<ConversationResponse>> {
    let conversation = state
        .manager
        .rename_conversation(&conversation_id, &req.title)
        .await?;

    Ok(Json(conversation.into()))
}

/// Delete a conversation with its messages and summaries
///
/// Deleting an unknown conversation also answers 204.
#[utoipa::path(
    delete,
    path = "/conversations/{conversation_id}",
    params(
        ("conversation_id" = String, Path, description = "Conversation ID")
    ),
    responses(
        (status = 204, description = "Conversation deleted")
    ),
    tag = "conversations"
)]
pub async fn delete_conversation(
    State(state): State<Arc<AppState>>,
    Path(conversation_id): Path<String>,
) -> ApiResult<StatusCode> {
    state.manager.delete_conversation(&conversation_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
