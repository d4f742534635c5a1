use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use quote_orchestrator::CompanyReport;

use crate::{AppError, AppState};

pub fn company_routes() -> Router<AppState> {
    Router::new().route("/api/company/:symbol", get(get_company))
}

/// Profile, valuation fundamentals and a latest-period statement snapshot.
async fn get_company(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<Json<CompanyReport>, AppError> {
    let report = state.orchestrator.company_report(&symbol).await?;
    Ok(Json(report))
}
