//! HTTP routes (spec §6): root/status/health, ingest, and the three query
//! surfaces (`/query`, `/prompt`, `/query/stream`).

use axum::extract::{Query, State};
use axum::http::{HeaderValue, Method};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use txrag_core::{RagResponse, Transaction};
use txrag_rag::CorpusStatus;

use crate::error::ServerError;
use crate::orchestrator::{build_corpus, run_query, run_query_stream};
use crate::state::AppState;

pub fn create_router(state: AppState) -> Router {
    let cors_layer = build_cors_layer(&state.config.server.allow_origins);

    Router::new()
        .route("/", get(root))
        .route("/status", get(status))
        .route("/test-connection", post(test_connection))
        .route("/ingest", post(ingest))
        .route("/query", post(query))
        .route("/prompt", post(prompt))
        .route("/query/stream", post(query_stream))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors_layer)
        .with_state(state)
}

fn build_cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST]);
    }

    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| {
            o.parse::<HeaderValue>()
                .map_err(|_| tracing::warn!(origin = %o, "invalid ALLOW_ORIGINS entry, skipping"))
                .ok()
        })
        .collect();

    if parsed.is_empty() {
        return CorsLayer::new().allow_origin(Any).allow_methods([Method::GET, Method::POST]);
    }

    CorsLayer::new()
        .allow_origin(parsed)
        .allow_methods([Method::GET, Method::POST])
        .allow_credentials(true)
}

async fn root() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

#[derive(Debug, Deserialize)]
struct StatusQuery {
    user_id: String,
}

#[derive(Debug, Serialize)]
struct StatusResponse {
    ingested: bool,
    count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    updated_at: Option<chrono::DateTime<chrono::Utc>>,
}

async fn status(State(state): State<AppState>, Query(q): Query<StatusQuery>) -> Json<StatusResponse> {
    let response = match state.stores.status(&q.user_id) {
        CorpusStatus::NotIngested | CorpusStatus::Expired => {
            StatusResponse { ingested: false, count: 0, updated_at: None }
        }
        CorpusStatus::Ready { document_count, updated_at } => {
            StatusResponse { ingested: true, count: document_count, updated_at: Some(updated_at) }
        }
    };
    Json(response)
}

#[derive(Debug, Serialize)]
struct TestConnectionResponse {
    llm_reachable: bool,
    embedding_loaded: bool,
}

async fn test_connection(State(state): State<AppState>) -> Json<TestConnectionResponse> {
    let llm_reachable = state.llm.is_available().await;
    Json(TestConnectionResponse { llm_reachable, embedding_loaded: true })
}

#[derive(Debug, Deserialize)]
struct IngestRequest {
    context_data: Vec<Transaction>,
    user_id: String,
}

#[derive(Debug, Serialize)]
struct IngestResponse {
    ingested: usize,
    user_id: String,
}

async fn ingest(
    State(state): State<AppState>,
    Json(req): Json<IngestRequest>,
) -> Result<Json<IngestResponse>, ServerError> {
    let count = req.context_data.len();
    let corpus = build_corpus(state.embedder.as_ref(), req.context_data, state.config.rag.corpus_max_docs)
        .map_err(ServerError)?;

    // Concurrent /ingest calls for the same user are serialized by the
    // store's per-slot lock; the last writer wins (spec §5, §9 Open
    // Question 1: replace, not append).
    state.stores.replace(&req.user_id, corpus);
    crate::telemetry::record_ingest(count);

    Ok(Json(IngestResponse { ingested: count, user_id: req.user_id }))
}

/// Shared body shape for `/query`, `/prompt`, and `/query/stream` (spec
/// §6). `/prompt` never carries `context_data`; the orchestrator treats
/// its absence identically whichever route it arrived from.
#[derive(Debug, Clone, Deserialize)]
pub struct QueryRequest {
    pub prompt: String,
    #[serde(default)]
    pub context_data: Option<Vec<Transaction>>,
    pub user_id: String,
    #[serde(default)]
    pub page: Option<usize>,
    #[serde(default)]
    pub page_size: Option<usize>,
    #[serde(default)]
    pub show_all: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct PromptRequest {
    prompt: String,
    user_id: String,
    #[serde(default)]
    page: Option<usize>,
    #[serde(default)]
    page_size: Option<usize>,
    #[serde(default)]
    show_all: Option<bool>,
}

impl From<PromptRequest> for QueryRequest {
    fn from(p: PromptRequest) -> Self {
        QueryRequest {
            prompt: p.prompt,
            context_data: None,
            user_id: p.user_id,
            page: p.page,
            page_size: p.page_size,
            show_all: p.show_all,
        }
    }
}

async fn query(
    State(state): State<AppState>,
    Json(req): Json<QueryRequest>,
) -> Result<Json<RagResponse>, ServerError> {
    let response = run_query(&state, &req).await?;
    Ok(Json(response))
}

async fn prompt(
    State(state): State<AppState>,
    Json(req): Json<PromptRequest>,
) -> Result<Json<RagResponse>, ServerError> {
    let response = run_query(&state, &req.into()).await?;
    Ok(Json(response))
}

async fn query_stream(
    State(state): State<AppState>,
    Json(req): Json<QueryRequest>,
) -> impl IntoResponse {
    let stream = run_query_stream(state, req);
    Sse::new(stream).keep_alive(KeepAlive::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use txrag_config::Settings;

    #[tokio::test]
    async fn router_builds_with_default_settings() {
        let state = AppState::new(Settings::default()).await.unwrap();
        let _ = create_router(state);
    }
}
