pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod state;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::{HeaderValue, Method},
    middleware as axum_middleware,
    routing::get,
    Json, Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use utoipa::OpenApi;

use crate::config::Config;
use crate::routes::{context, conversations, databases, exchanges, health, messages};
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        databases::list_databases,
        conversations::create_conversation,
        conversations::list_conversations,
        conversations::get_conversation,
        conversations::rename_conversation,
        conversations::delete_conversation,
        messages::list_messages,
        context::get_context,
        exchanges::record_exchange,
    ),
    components(schemas(
        health::HealthResponse,
        databases::DatabasesResponse,
        conversations::CreateConversationRequest,
        conversations::RenameConversationRequest,
        conversations::ConversationResponse,
        conversations::ListConversationsResponse,
        messages::MessageResponse,
        messages::ListMessagesResponse,
        context::SummaryResponse,
        context::ContextResponse,
        exchanges::AnswerPayload,
        exchanges::RecordExchangeRequest,
        exchanges::ExchangeResponse,
    )),
    tags(
        (name = "health"),
        (name = "databases"),
        (name = "conversations"),
        (name = "messages")
    )
)]
pub struct ApiDoc;

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

pub fn build_router(state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        // Health
        .route("/health", get(health::health_check))
        .route("/databases", get(databases::list_databases))
        // Conversations
        .route(
            "/conversations",
            get(conversations::list_conversations).post(conversations::create_conversation),
        )
        .route(
            "/conversations/:conversation_id",
            get(conversations::get_conversation)
                .patch(conversations::rename_conversation)
                .delete(conversations::delete_conversation),
        )
        // Messages
        .route("/conversations/:conversation_id/messages", get(messages::list_messages))
        .route("/conversations/:conversation_id/context", get(context::get_context))
        .route(
            "/conversations/:conversation_id/exchanges",
            axum::routing::post(exchanges::record_exchange),
        )
        .route("/api-docs/openapi.json", get(openapi_json));

    let timeout = Duration::from_secs(state.config.server.request_timeout_secs);
    Router::new()
        .merge(api_routes)
        .layer(axum_middleware::from_fn(middleware::logging::log_request))
        .layer(TimeoutLayer::new(timeout))
        .layer(CompressionLayer::new())
        .layer(build_cors_layer(&state.config))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn build_cors_layer(config: &Config) -> CorsLayer {
    if !config.cors.enabled {
        return CorsLayer::new();
    }

    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any);

    if config.cors.origins.iter().any(|o| o == "*") {
        cors.allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> = config
            .cors
            .origins
            .iter()
            .filter_map(|o| o.parse::<HeaderValue>().ok())
            .collect();
        cors.allow_origin(origins)
    }
}
