use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DatabasesResponse {
    pub databases: Vec<String>,
    pub default_database: Option<String>,
}

/// Databases a conversation can be bound to
#[utoipa::path(
    get,
    path = "/databases",
    responses(
        (status = 200, description = "Registered databases", body = DatabasesResponse)
    ),
    tag = "databases"
)]
pub async fn list_databases(State(state): State<Arc<AppState>>) -> Json<DatabasesResponse> {
    let memory = state.manager.config();
    Json(DatabasesResponse {
        databases: memory.databases.clone(),
        default_database: memory.default_database.clone(),
    })
}
