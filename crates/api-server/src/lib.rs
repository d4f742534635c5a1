pub mod advisory_routes;
pub mod company_routes;
pub mod config;
pub mod market_routes;
pub mod portfolio_routes;
pub mod request_id;
pub mod watchlist;
pub mod watchlist_routes;

#[cfg(test)]
mod router_tests;

use advisory::{Advisor, AdvisoryProvider, ChatClient};
use anyhow::Context;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    Json, Router,
};
use dashboard_core::{DashboardError, MarketUniverse};
use market_data::{YahooClient, YahooConfig};
use quote_orchestrator::QuoteOrchestrator;
use serde_json::json;
use std::path::Path;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};
use tracing_subscriber::EnvFilter;

use crate::config::ServerConfig;
use crate::watchlist::WatchlistStore;

const DEFAULT_LOG_FILTER: &str = "api_server=info,quote_orchestrator=info,market_data=info,tower_http=info";

/// Shared application state, passed to handlers via `axum::extract::State`.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<QuoteOrchestrator>,
    pub universe: Arc<MarketUniverse>,
    pub watchlist: Arc<WatchlistStore>,
    pub advisor: Advisor,
}

/// Error returned by handlers, rendered as `{"error": message}`.
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    message: String,
}

impl AppError {
    pub fn with_status(status: StatusCode, message: impl std::fmt::Display) -> Self {
        Self {
            status,
            message: message.to_string(),
        }
    }

    pub fn bad_request(message: impl std::fmt::Display) -> Self {
        Self::with_status(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl std::fmt::Display) -> Self {
        Self::with_status(StatusCode::NOT_FOUND, message)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<DashboardError> for AppError {
    fn from(e: DashboardError) -> Self {
        let status = match &e {
            DashboardError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            DashboardError::NotFound(_) => StatusCode::NOT_FOUND,
            DashboardError::UpstreamUnavailable(_) => StatusCode::BAD_GATEWAY,
            DashboardError::InsufficientHistory(_) | DashboardError::ComputationFailure(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        Self::with_status(status, e)
    }
}

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        Self::with_status(StatusCode::INTERNAL_SERVER_ERROR, e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!("Request failed ({}): {}", self.status, self.message);
        }
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

/// All API routes plus static files from `static_dir`, falling back to
/// `index.html` for client-side routing.
pub fn build_router(state: AppState, static_dir: &Path) -> Router {
    let static_files =
        ServeDir::new(static_dir).fallback(ServeFile::new(static_dir.join("index.html")));

    let api = Router::new()
        .merge(market_routes::market_routes())
        .merge(watchlist_routes::watchlist_routes())
        .merge(company_routes::company_routes())
        .merge(portfolio_routes::portfolio_routes())
        .merge(advisory_routes::advisory_routes());

    api.fallback_service(static_files)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                    )
                }))
                .layer(middleware::from_fn(request_id::request_id_middleware))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let json = std::env::var("RUST_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Build state from `config`, wiring the Yahoo gateway and the advisory provider.
pub fn build_state(config: &ServerConfig) -> anyhow::Result<AppState> {
    let universe = MarketUniverse::load(config.market_universe_path.as_deref())
        .context("failed to load market universe")?;

    let yahoo = YahooClient::new(YahooConfig {
        rate_limit: config.yahoo_rate_limit,
        timeout: config.yahoo_timeout,
        ..YahooConfig::default()
    })
    .context("failed to create Yahoo client")?;
    let orchestrator =
        QuoteOrchestrator::new(Arc::new(yahoo)).with_concurrency(config.quote_batch_concurrency);

    let advisor = match &config.advisory {
        Some(chat) => {
            let client = ChatClient::new(chat.clone()).context("failed to create advisory client")?;
            tracing::info!("Advisory provider: {} ({})", chat.model, chat.base_url);
            Advisor::new(Some(Arc::new(client) as Arc<dyn AdvisoryProvider>))
        }
        None => {
            tracing::info!("No advisory API key set, using local rules");
            Advisor::local()
        }
    };

    Ok(AppState {
        orchestrator: Arc::new(orchestrator),
        universe: Arc::new(universe),
        watchlist: Arc::new(WatchlistStore::new(config.watchlist_path.clone())),
        advisor,
    })
}

pub async fn run_server() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ServerConfig::from_env()?;
    let state = build_state(&config)?;
    tracing::info!(
        "Market universe: {} hot symbols, {} indices",
        state.universe.hot_list.len(),
        state.universe.indices.len()
    );

    let app = build_router(state, &config.static_dir);

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    tracing::info!("API server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
