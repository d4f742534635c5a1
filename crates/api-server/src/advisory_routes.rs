use advisory::{AdvisoryRequest, AdvisoryResponse};
use axum::{extract::State, routing::post, Json, Router};

use crate::AppState;

pub fn advisory_routes() -> Router<AppState> {
    Router::new().route("/api/ai_analysis", post(ai_analysis))
}

/// Always answers 200: provider failures fall back to local rules and are
/// reported in `warning`/`error`.
async fn ai_analysis(
    State(state): State<AppState>,
    body: Option<Json<AdvisoryRequest>>,
) -> Json<AdvisoryResponse> {
    let request = body.map(|Json(b)| b).unwrap_or_default();
    Json(state.advisor.advise(&request).await)
}
