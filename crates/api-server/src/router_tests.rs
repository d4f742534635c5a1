use super::*;
use async_trait::async_trait;
use axum::http::{header, Method};
use dashboard_core::{
    DashboardResult, FinancialStatements, Fundamentals, Interval, MarketDataGateway, Period,
    PricePoint, PriceSeries, QuoteSummary,
};
use serde_json::Value;
use tower::ServiceExt;

/// Gateway with canned data for AAPL and MSFT, `BROKEN` always failing
/// upstream and everything else unknown.
struct StubGateway;

#[async_trait]
impl MarketDataGateway for StubGateway {
    async fn get_quote_summary(&self, symbol: &str) -> DashboardResult<QuoteSummary> {
        match symbol {
            "AAPL" | "MSFT" => Ok(QuoteSummary {
                price: Some(110.0),
                prev_close: Some(100.0),
                currency: Some("USD".to_string()),
                ..Default::default()
            }),
            "BROKEN" => Err(DashboardError::UpstreamUnavailable("timeout".to_string())),
            other => Err(DashboardError::NotFound(other.to_string())),
        }
    }

    async fn get_history(&self, symbol: &str, _period: Period, _interval: Interval) -> DashboardResult<PriceSeries> {
        match symbol {
            "AAPL" | "MSFT" => {
                let points = (0..60)
                    .map(|i| PricePoint::from_close(i * 86_400_000, 100.0 + i as f64))
                    .collect();
                Ok(PriceSeries::new(symbol, points))
            }
            "BROKEN" => Err(DashboardError::UpstreamUnavailable("timeout".to_string())),
            other => Err(DashboardError::NotFound(other.to_string())),
        }
    }

    async fn get_fundamentals(&self, symbol: &str) -> DashboardResult<Fundamentals> {
        let mut f = Fundamentals::default();
        match symbol {
            "AAPL" => {
                f.insert("longName", serde_json::json!("Apple Inc."));
                f.insert("sector", serde_json::json!("Technology"));
                f.insert("trailingPE", serde_json::json!(30.0));
                Ok(f)
            }
            "MSFT" => {
                f.insert("sector", serde_json::json!("Technology"));
                f.insert("trailingPE", serde_json::json!(34.0));
                Ok(f)
            }
            other => Err(DashboardError::NotFound(other.to_string())),
        }
    }

    async fn get_financial_statements(&self, symbol: &str) -> DashboardResult<FinancialStatements> {
        Err(DashboardError::NotFound(symbol.to_string()))
    }

    fn name(&self) -> &'static str {
        "stub"
    }
}

struct TestApp {
    router: Router,
    _dir: tempfile::TempDir,
}

fn app() -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let static_dir = dir.path().join("static");
    std::fs::create_dir_all(&static_dir).unwrap();
    std::fs::write(static_dir.join("index.html"), "<html>dashboard</html>").unwrap();

    let state = AppState {
        orchestrator: Arc::new(QuoteOrchestrator::new(Arc::new(StubGateway))),
        universe: Arc::new(MarketUniverse::builtin()),
        watchlist: Arc::new(WatchlistStore::new(dir.path().join("watchlist.json"))),
        advisor: Advisor::local(),
    };

    TestApp {
        router: build_router(state, &static_dir),
        _dir: dir,
    }
}

async fn send(app: &TestApp, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Response) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    let response = app
        .router
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();
    (response.status(), response)
}

async fn json_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn get_json(app: &TestApp, uri: &str) -> (StatusCode, Value) {
    let (status, response) = send(app, Method::GET, uri, None).await;
    (status, json_body(response).await)
}

#[tokio::test]
async fn test_health_and_request_id() {
    let app = app();
    let (status, response) = send(&app, Method::GET, "/api/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
    assert_eq!(json_body(response).await, serde_json::json!({"status": "ok"}));
}

#[tokio::test]
async fn test_inbound_request_id_is_echoed() {
    let app = app();
    let request = Request::builder()
        .uri("/api/health")
        .header("x-request-id", "abc-123")
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();

    assert_eq!(response.headers()["x-request-id"], "abc-123");
}

#[tokio::test]
async fn test_prices_default_to_watchlist() {
    let app = app();
    let (status, body) = get_json(&app, "/api/prices").await;

    assert_eq!(status, StatusCode::OK);
    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0]["symbol"], "AAPL");
    assert_eq!(results[0]["price"], 110.0);
    assert_eq!(results[0]["change_percent"], 10.0);
    assert!(results[0]["indicators"]["sma50"].is_number());
}

#[tokio::test]
async fn test_prices_isolate_failing_symbol() {
    let app = app();
    let (status, body) = get_json(&app, "/api/prices?symbols=msft,BROKEN").await;

    assert_eq!(status, StatusCode::OK);
    let results = body["results"].as_array().unwrap();
    assert_eq!(results[0]["symbol"], "MSFT");
    assert!(results[0].get("error").is_none());
    assert_eq!(results[1]["symbol"], "BROKEN");
    assert!(results[1]["price"].is_null());
    assert!(results[1]["error"].is_string());
}

#[tokio::test]
async fn test_hot_list_has_one_quote_per_symbol() {
    let app = app();
    let (_, body) = get_json(&app, "/api/hot").await;

    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), MarketUniverse::builtin().hot_list.len());
}

#[tokio::test]
async fn test_indices_category_filter() {
    let app = app();
    let (_, body) = get_json(&app, "/api/indices?category=global").await;

    let indices = body["indices"].as_array().unwrap();
    assert!(!indices.is_empty());
    assert!(indices.iter().all(|i| i["category"] == "global"));
    assert!(indices.iter().all(|i| i["constituents"] == serde_json::json!([])));
}

#[tokio::test]
async fn test_constituents() {
    let app = app();
    let (status, body) = get_json(&app, "/api/indices/xlk/constituents").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["symbol"], "XLK");
    assert!(body["constituents"].as_array().unwrap().contains(&Value::from("AAPL")));

    let (status, body) = get_json(&app, "/api/indices/NOPE/constituents").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "index not found");
}

#[tokio::test]
async fn test_history_routes() {
    let app = app();

    let (status, body) = get_json(&app, "/api/history/aapl?period=1y&interval=1d").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ts"].as_array().unwrap().len(), 60);
    assert_eq!(body["indicators"]["sma20"].as_array().unwrap().len(), 60);

    let (status, body) = get_json(&app, "/api/history/UNKNOWN").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["close"], serde_json::json!([]));

    let (status, body) = get_json(&app, "/api/history/BROKEN").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["symbol"], "BROKEN");
    assert!(body["error"].is_string());

    let (status, _) = get_json(&app, "/api/history/AAPL?period=7w").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_company_report() {
    let app = app();
    let (status, body) = get_json(&app, "/api/company/aapl").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["info"]["name"], "Apple Inc.");
    assert_eq!(body["fundamentals"]["pe"], 30.0);
    assert!(body["financials"]["annual"]["revenue"].is_null());
}

#[tokio::test]
async fn test_watchlist_lifecycle() {
    let app = app();

    let (status, body) = get_json(&app, "/api/watchlist").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["symbols"], serde_json::json!(["AAPL", "MSFT"]));

    let (status, response) = send(
        &app,
        Method::POST,
        "/api/watchlist",
        Some(serde_json::json!({"symbol": " nvda "})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_body(response).await["symbols"], serde_json::json!(["AAPL", "MSFT", "NVDA"]));

    let (status, response) = send(&app, Method::DELETE, "/api/watchlist/aapl", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_body(response).await["symbols"], serde_json::json!(["MSFT", "NVDA"]));

    let (status, response) = send(
        &app,
        Method::POST,
        "/api/watchlist",
        Some(serde_json::json!({"symbol": "  "})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], "symbol is required");
}

#[tokio::test]
async fn test_portfolio_diagnostic() {
    let app = app();
    let request = serde_json::json!({
        "holdings": [{"symbol": "aapl", "weight": 60}, {"symbol": "MSFT", "weight": 40}, {"symbol": ""}]
    });
    let (status, response) = send(&app, Method::POST, "/api/portfolio/diagnostic", Some(request)).await;
    let body = json_body(response).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
    assert_eq!(body["analysis"]["risk_level"], "High");
    assert_eq!(body["analysis"]["metrics"]["avg_pe"], 31.6);
    assert_eq!(body["holdings"].as_array().unwrap().len(), 2);
    assert!(body["summary_text"].as_str().unwrap().contains("Diversity score"));

    let bad = serde_json::json!({"holdings": [{"symbol": "AAPL", "weight": -1}]});
    let (status, _) = send(&app, Method::POST, "/api/portfolio/diagnostic", Some(bad)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_ai_analysis_falls_back_to_local_rules() {
    let app = app();
    let request = serde_json::json!({
        "symbol": "aapl",
        "financial_data": {"currentPrice": 190.1, "changePercent": 2.4, "peRatio": 31, "rsi14": 72}
    });
    let (status, response) = send(&app, Method::POST, "/api/ai_analysis", Some(request)).await;
    let body = json_body(response).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["symbol"], "AAPL");
    assert_eq!(body["source"], "local");
    assert_eq!(body["warning"], "fallback");
    assert!(body["analysis"].as_str().unwrap().starts_with("Technical: RSI high"));
}

#[tokio::test]
async fn test_spa_fallback_serves_index() {
    let app = app();
    let (status, response) = send(&app, Method::GET, "/portfolio/overview", None).await;

    assert_eq!(status, StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"<html>dashboard</html>");
}
