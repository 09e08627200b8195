//! REST API Server for the currency converter
//!
//! Exposes the conversion and history flows via HTTP endpoints
//! for a browser front end.

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, Instrument};

use crate::conversion::convert_currency;
use crate::gemini::ContentGenerator;
use crate::history::historical_trends;
use crate::models::{CurrencyCode, CurrencyPair, CURRENCIES};
use crate::session::ConverterSession;

/// =============================
/// Request Models
/// =============================

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ConvertRequest {
    pub amount: f64,
    pub from: CurrencyCode,
    pub to: CurrencyCode,
    pub compare_from: Option<CurrencyCode>,
    pub compare_to: Option<CurrencyCode>,
}

impl ConvertRequest {
    /// Comparison needs both sides
    fn compare_pair(&self) -> Option<CurrencyPair> {
        match (self.compare_from, self.compare_to) {
            (Some(from), Some(to)) => Some(CurrencyPair::new(from, to)),
            _ => None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRequest {
    pub from: CurrencyCode,
    pub to: CurrencyCode,
    pub compare_from: Option<CurrencyCode>,
    pub compare_to: Option<CurrencyCode>,
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

/// =============================
/// API State
/// =============================

#[derive(Clone)]
pub struct ApiState {
    pub generator: Arc<dyn ContentGenerator>,
}

/// =============================
/// Health & Metadata
/// =============================

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

async fn list_currencies() -> Json<ApiResponse> {
    Json(ApiResponse::success(&CURRENCIES[..]))
}

/// =============================
/// Full Flow Endpoint
/// =============================

/// Conversion, then history. A conversion failure is reported in `error`
/// while the history part is still returned.
async fn run_convert(
    State(state): State<ApiState>,
    Json(req): Json<ConvertRequest>,
) -> (StatusCode, Json<ApiResponse>) {
    if req.amount.is_nan() || req.amount <= 0.0 {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error("Amount must be greater than zero".into())),
        );
    }

    let request_id = uuid::Uuid::new_v4();
    let span = tracing::info_span!("convert", %request_id);

    async move {
        info!(amount = req.amount, from = %req.from, to = %req.to, "Received convert request");

        let mut session = ConverterSession::new(state.generator.clone());
        session.set_amount(req.amount);
        session.set_from(req.from);
        session.set_to(req.to);
        if let Some(compare) = req.compare_pair() {
            session.set_compare_from(compare.from);
            session.set_compare_to(compare.to);
            session.set_comparing(true);
        }

        session.submit().await;
        let view = session.view();

        let mut response = ApiResponse::success(&view);
        response.error = view.error.clone();
        (StatusCode::OK, Json(response))
    }
    .instrument(span)
    .await
}

/// =============================
/// Single Flow Endpoints
/// =============================

async fn run_conversion(
    State(state): State<ApiState>,
    Json(req): Json<ConvertRequest>,
) -> (StatusCode, Json<ApiResponse>) {
    if req.amount.is_nan() || req.amount <= 0.0 {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error("Amount must be greater than zero".into())),
        );
    }

    match convert_currency(state.generator.as_ref(), req.amount, req.from, req.to).await {
        Ok(result) => (StatusCode::OK, Json(ApiResponse::success(result))),
        Err(e) => (StatusCode::BAD_GATEWAY, Json(ApiResponse::error(e.to_string()))),
    }
}

async fn run_history(
    State(state): State<ApiState>,
    Json(req): Json<HistoryRequest>,
) -> (StatusCode, Json<ApiResponse>) {
    let compare = match (req.compare_from, req.compare_to) {
        (Some(from), Some(to)) => Some(CurrencyPair::new(from, to)),
        _ => None,
    };

    let history = historical_trends(state.generator.as_ref(), req.from, req.to, compare).await;
    (StatusCode::OK, Json(ApiResponse::success(history)))
}

/// =============================
/// Router
/// =============================

pub fn create_router(generator: Arc<dyn ContentGenerator>) -> Router {
    let state = ApiState { generator };

    Router::new()
        .route("/health", get(health))
        .route("/api/currencies", get(list_currencies))
        .route("/api/convert", post(run_convert))
        .route("/api/conversion", post(run_conversion))
        .route("/api/history", post(run_history))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// =============================
/// Server Startup
/// =============================

pub async fn start_server(
    generator: Arc<dyn ContentGenerator>,
    port: u16,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let router = create_router(generator);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

    info!("API Server listening on http://0.0.0.0:{}", port);
    info!("Local: http://127.0.0.1:{}", port);

    axum::serve(listener, router).await?;

    Ok(())
}
