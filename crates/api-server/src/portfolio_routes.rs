use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use dashboard_core::DashboardError;
use portfolio_diagnostics::{DiagnosticReport, HoldingInput};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{AppError, AppState};

#[derive(Deserialize, Default)]
pub struct DiagnosticRequest {
    #[serde(default)]
    pub holdings: Vec<HoldingInput>,
}

#[derive(Serialize)]
pub struct DiagnosticResponse {
    pub ok: bool,
    #[serde(flatten)]
    pub report: DiagnosticReport,
}

pub fn portfolio_routes() -> Router<AppState> {
    Router::new().route("/api/portfolio/diagnostic", post(portfolio_diagnostic))
}

async fn portfolio_diagnostic(
    State(state): State<AppState>,
    Json(request): Json<DiagnosticRequest>,
) -> Result<Response, AppError> {
    match state.orchestrator.diagnose_portfolio(&request.holdings).await {
        Ok(report) => Ok(Json(DiagnosticResponse { ok: true, report }).into_response()),
        Err(e @ DashboardError::InvalidInput(_)) => Err(e.into()),
        Err(e) => {
            tracing::error!("Portfolio diagnostic failed: {}", e);
            Ok((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "ok": false,
                    "error": "portfolio_diagnostic_failed",
                    "detail": e.to_string(),
                })),
            )
                .into_response())
        }
    }
}
