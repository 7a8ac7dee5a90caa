//! REST API Server for the multi-agent assistant
//!
//! Exposes the agents via HTTP endpoints and serves the web UI

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Html,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::error::MISSING_KEY_MESSAGE;
use crate::finance::render_stock_info;
use crate::history::{session_uuid, Interaction, SessionStore, DISPLAY_LIMIT};
use crate::insights::{
    find_topic, quick_stock_query, AnalysisType, MARKET_OVERVIEW_QUERY, POPULAR_STOCKS,
    QUICK_QUERIES, TRENDING_TOPICS,
};
use crate::market::normalize_symbol;
use crate::router::{AgentKind, SharedSystem};
use crate::ui;

/// =============================
/// Request Models
/// =============================

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ChatRequest {
    pub session_id: Option<String>,
    pub query: String,
    pub symbol: Option<String>,
    #[serde(default)]
    pub agent: AgentKind,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StockRequest {
    pub symbol: String,
    #[serde(default)]
    pub analysis_type: AnalysisType,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SearchRequest {
    pub query: String,
}

#[derive(Debug, Deserialize)]
pub struct SessionQuery {
    pub session_id: Option<String>,
}

/// =============================
/// Response Wrapper
/// =============================

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse {
    pub success: bool,
    pub data: Option<serde_json::Value>,
    pub error: Option<String>,
    pub timestamp: String,
}

impl ApiResponse {
    pub fn success<T: Serialize>(data: T) -> Self {
        Self {
            success: true,
            data: serde_json::to_value(data).ok(),
            error: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

type ApiResult = (StatusCode, Json<ApiResponse>);

fn ok<T: Serialize>(data: T) -> ApiResult {
    (StatusCode::OK, Json(ApiResponse::success(data)))
}

fn bad_request(message: &str) -> ApiResult {
    (
        StatusCode::BAD_REQUEST,
        Json(ApiResponse::error(message.to_string())),
    )
}

/// =============================
/// API State
/// =============================

#[derive(Clone)]
pub struct ApiState {
    pub system: SharedSystem,
    pub sessions: Arc<SessionStore>,
    pub api_key_configured: bool,
}

impl ApiState {
    pub fn new(system: SharedSystem, api_key_configured: bool) -> Self {
        Self {
            system,
            sessions: Arc::new(SessionStore::new()),
            api_key_configured,
        }
    }
}

#[derive(Debug, Serialize)]
struct InteractionView {
    user: String,
    response: String,
    time: String,
    agent: AgentKind,
    agent_name: &'static str,
}

impl From<&Interaction> for InteractionView {
    fn from(i: &Interaction) -> Self {
        Self {
            user: i.user_text.clone(),
            response: i.agent_text.clone(),
            time: i.display_time(),
            agent: i.agent,
            agent_name: i.agent.display_name(),
        }
    }
}

/// =============================
/// Health & Status
/// =============================

async fn index() -> Html<&'static str> {
    Html(ui::INDEX_HTML)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

async fn status(State(state): State<ApiState>) -> ApiResult {
    let message = if state.api_key_configured {
        "✅ Groq API Key Found"
    } else {
        MISSING_KEY_MESSAGE
    };

    ok(serde_json::json!({
        "api_key_configured": state.api_key_configured,
        "message": message,
    }))
}

async fn agents() -> ApiResult {
    let list: Vec<_> = AgentKind::ALL
        .iter()
        .map(|a| {
            serde_json::json!({
                "id": a,
                "name": a.display_name(),
                "description": a.description(),
            })
        })
        .collect();
    ok(list)
}

/// =============================
/// Chat
/// =============================

async fn chat_handler(State(state): State<ApiState>, Json(req): Json<ChatRequest>) -> ApiResult {
    let query = req.query.trim();
    if query.is_empty() {
        return bad_request("Please enter a query before submitting.");
    }

    let session = session_uuid(req.session_id.as_deref());
    let symbol = req.symbol.as_deref().and_then(normalize_symbol);

    info!(
        session = %session,
        agent = %req.agent,
        symbol = ?symbol,
        "Received chat query"
    );

    let response = state
        .system
        .dispatch(req.agent, query, symbol.as_deref())
        .await;

    let interaction = Interaction::new(query.to_string(), response, req.agent);
    let view = InteractionView::from(&interaction);
    state.sessions.record(session, interaction).await;

    ok(serde_json::json!({
        "session_id": session.to_string(),
        "interaction": view,
    }))
}

async fn history_handler(
    State(state): State<ApiState>,
    Query(params): Query<SessionQuery>,
) -> ApiResult {
    let session = session_uuid(params.session_id.as_deref());
    let recent = state.sessions.recent(session, DISPLAY_LIMIT).await;
    let total = state.sessions.len(session).await;

    let interactions: Vec<InteractionView> = recent.iter().map(InteractionView::from).collect();
    ok(serde_json::json!({
        "session_id": session.to_string(),
        "total": total,
        "interactions": interactions,
    }))
}

async fn clear_history(
    State(state): State<ApiState>,
    Query(params): Query<SessionQuery>,
) -> ApiResult {
    let session = session_uuid(params.session_id.as_deref());
    state.sessions.clear(session).await;
    info!(session = %session, "Chat history cleared");

    ok(serde_json::json!({ "session_id": session.to_string(), "cleared": true }))
}

/// =============================
/// Stock Analysis
/// =============================

async fn stock_handler(State(state): State<ApiState>, Json(req): Json<StockRequest>) -> ApiResult {
    let Some(symbol) = normalize_symbol(&req.symbol) else {
        return bad_request("Please enter a valid stock symbol.");
    };

    let finance = state.system.finance();
    if !finance.is_configured() {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ApiResponse::error(MISSING_KEY_MESSAGE.to_string())),
        );
    }

    let data = finance.market().get_stock_data(&symbol).await;

    let warning = if data.is_fallback() {
        warn!(symbol = %symbol, "Stock dashboard serving fallback data");
        data.note
            .as_ref()
            .map(|note| format!("⚠️ API Rate Limited: {}", note))
    } else {
        None
    };

    let query = req.analysis_type.query_for(&symbol);
    let analysis = finance.analyze_record(&query, &data).await;

    ok(serde_json::json!({
        "symbol": symbol,
        "analysis_type": req.analysis_type.label(),
        "warning": warning,
        "table": render_stock_info(&data),
        "stock": data,
        "analysis": analysis,
    }))
}

/// =============================
/// Web Search
/// =============================

async fn search_handler(State(state): State<ApiState>, Json(req): Json<SearchRequest>) -> ApiResult {
    let query = req.query.trim();
    if query.is_empty() {
        return bad_request("Please enter a search query.");
    }

    let response = state.system.web().search(query).await;
    ok(serde_json::json!({ "query": query, "response": response }))
}

async fn topics() -> ApiResult {
    ok(serde_json::json!({
        "trending": TRENDING_TOPICS,
        "quick_queries": QUICK_QUERIES,
        "popular_stocks": POPULAR_STOCKS,
    }))
}

async fn topic_handler(State(state): State<ApiState>, Path(name): Path<String>) -> ApiResult {
    let Some(topic) = find_topic(&name) else {
        return (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::error(format!("Unknown topic: {}", name))),
        );
    };

    let response = state.system.web().search(topic.query).await;
    ok(serde_json::json!({ "topic": topic.name, "response": response }))
}

/// =============================
/// Quick Insights
/// =============================

async fn quick_stock_handler(
    State(state): State<ApiState>,
    Path(symbol): Path<String>,
) -> ApiResult {
    let Some(symbol) = normalize_symbol(&symbol) else {
        return bad_request("Please enter a valid stock symbol.");
    };

    let query = quick_stock_query(&symbol);
    let response = state.system.respond(&query, Some(symbol.as_str())).await;
    ok(serde_json::json!({ "symbol": symbol, "response": response }))
}

async fn market_overview(State(state): State<ApiState>) -> ApiResult {
    let response = state.system.web().search(MARKET_OVERVIEW_QUERY).await;
    ok(serde_json::json!({ "response": response }))
}

/// =============================
/// Router
/// =============================

pub fn create_router(state: ApiState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/api/status", get(status))
        .route("/api/agents", get(agents))
        .route("/api/chat", post(chat_handler))
        .route("/api/history", get(history_handler).delete(clear_history))
        .route("/api/stock", post(stock_handler))
        .route("/api/search", post(search_handler))
        .route("/api/topics", get(topics))
        .route("/api/topics/:name", post(topic_handler))
        .route("/api/insights/stock/:symbol", post(quick_stock_handler))
        .route("/api/insights/market-overview", post(market_overview))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// =============================
/// Server Startup
/// =============================

pub async fn start_server(
    state: ApiState,
    port: u16,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

    info!("API Server listening on http://0.0.0.0:{}", port);
    info!("Local: http://127.0.0.1:{}", port);

    axum::serve(listener, router).await?;

    Ok(())
}
