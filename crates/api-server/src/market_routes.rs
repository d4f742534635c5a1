use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use dashboard_core::{DashboardError, Interval, Period, Quote};
use quote_orchestrator::IndexOverview;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{AppError, AppState};

#[derive(Deserialize)]
pub struct PricesQuery {
    pub symbols: Option<String>,
}

#[derive(Deserialize)]
pub struct IndicesQuery {
    pub category: Option<String>,
}

#[derive(Deserialize)]
pub struct HistoryQuery {
    pub period: Option<String>,
    pub interval: Option<String>,
}

#[derive(Serialize)]
pub struct QuotesResponse {
    pub results: Vec<Quote>,
}

#[derive(Serialize)]
pub struct IndicesResponse {
    pub indices: Vec<IndexOverview>,
}

#[derive(Serialize)]
pub struct ConstituentsResponse {
    pub symbol: String,
    pub constituents: Vec<String>,
}

pub fn market_routes() -> Router<AppState> {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/prices", get(get_prices))
        .route("/api/hot", get(get_hot))
        .route("/api/indices", get(get_indices))
        .route("/api/indices/:symbol/constituents", get(get_constituents))
        .route("/api/history/:symbol", get(get_history))
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// Comma-separated symbols, trimmed and uppercased, blanks dropped.
fn parse_symbols(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Quotes for `?symbols=A,B`, or for the watchlist when absent.
async fn get_prices(
    State(state): State<AppState>,
    Query(query): Query<PricesQuery>,
) -> Json<QuotesResponse> {
    let symbols = match query.symbols.as_deref().filter(|s| !s.is_empty()) {
        Some(raw) => parse_symbols(raw),
        None => state.watchlist.load().await,
    };
    let results = state.orchestrator.quotes(&symbols).await;
    Json(QuotesResponse { results })
}

async fn get_hot(State(state): State<AppState>) -> Json<QuotesResponse> {
    let results = state.orchestrator.quotes(&state.universe.hot_list).await;
    Json(QuotesResponse { results })
}

async fn get_indices(
    State(state): State<AppState>,
    Query(query): Query<IndicesQuery>,
) -> Json<IndicesResponse> {
    let defs: Vec<_> = state
        .universe
        .indices_in(query.category.as_deref())
        .collect();
    let indices = state.orchestrator.index_overview(&defs).await;
    Json(IndicesResponse { indices })
}

async fn get_constituents(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<Json<ConstituentsResponse>, AppError> {
    let index = state
        .universe
        .find_index(&symbol)
        .ok_or_else(|| AppError::not_found("index not found"))?;

    Ok(Json(ConstituentsResponse {
        symbol: index.symbol.clone(),
        constituents: index.constituents.clone(),
    }))
}

/// Unknown symbols give an empty report; other upstream failures are a 500
/// carrying the symbol.
async fn get_history(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Result<Response, AppError> {
    let period: Period = match query.period.as_deref() {
        Some(raw) => raw.parse()?,
        None => Period::default(),
    };
    let interval: Interval = match query.interval.as_deref() {
        Some(raw) => raw.parse()?,
        None => Interval::default(),
    };

    match state.orchestrator.history_report(&symbol, period, interval).await {
        Ok(report) => Ok(Json(report).into_response()),
        Err(e @ DashboardError::InvalidInput(_)) => Err(e.into()),
        Err(e) => {
            let symbol = symbol.trim().to_uppercase();
            Ok((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "symbol": symbol, "error": e.to_string() })),
            )
                .into_response())
        }
    }
}
