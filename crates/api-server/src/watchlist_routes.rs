//! Watchlist API Routes

use axum::{
    extract::{Path, State},
    routing::{delete, get},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::{AppError, AppState};

#[derive(Deserialize, Default)]
pub struct AddSymbolRequest {
    #[serde(default)]
    pub symbol: Option<String>,
}

#[derive(Serialize)]
pub struct WatchlistResponse {
    pub symbols: Vec<String>,
}

pub fn watchlist_routes() -> Router<AppState> {
    Router::new()
        .route("/api/watchlist", get(get_watchlist).post(add_symbol))
        .route("/api/watchlist/:symbol", delete(remove_symbol))
}

async fn get_watchlist(State(state): State<AppState>) -> Json<WatchlistResponse> {
    Json(WatchlistResponse {
        symbols: state.watchlist.load().await,
    })
}

async fn add_symbol(
    State(state): State<AppState>,
    body: Option<Json<AddSymbolRequest>>,
) -> Result<Json<WatchlistResponse>, AppError> {
    let request = body.map(|Json(b)| b).unwrap_or_default();
    let symbol = request
        .symbol
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::bad_request("symbol is required"))?;

    let symbols = state.watchlist.add(&symbol).await?;
    tracing::info!("Added {} to watchlist", symbol);
    Ok(Json(WatchlistResponse { symbols }))
}

async fn remove_symbol(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<Json<WatchlistResponse>, AppError> {
    let symbols = state.watchlist.remove(&symbol).await?;
    tracing::info!("Removed {} from watchlist", symbol.trim().to_uppercase());
    Ok(Json(WatchlistResponse { symbols }))
}
