//! Yahoo Finance implementation of [`MarketDataGateway`].

mod rate_limiter;
mod responses;

use async_trait::async_trait;
use dashboard_core::{
    DashboardError, DashboardResult, FinancialStatements, Fundamentals, Interval,
    MarketDataGateway, Period, PriceSeries, QuoteSummary,
};
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tokio::sync::Mutex;

use rate_limiter::RateLimiter;
use responses::{FUNDAMENTAL_MODULES, STATEMENT_MODULES};

const BASE_URL: &str = "https://query1.finance.yahoo.com";
const COOKIE_URL: &str = "https://fc.yahoo.com";
const CRUMB_PATH: &str = "/v1/test/getcrumb";
const REFERER: &str = "https://finance.yahoo.com/";
const USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

const MAX_RETRIES: u32 = 3;
const RETRY_BASE_DELAY: Duration = Duration::from_secs(2);

#[derive(Debug, Clone)]
pub struct YahooConfig {
    pub base_url: String,
    /// Page that sets the session cookie before a crumb is requested.
    pub cookie_url: String,
    /// Requests per minute
    pub rate_limit: usize,
    pub timeout: Duration,
}

impl Default for YahooConfig {
    fn default() -> Self {
        Self {
            base_url: BASE_URL.to_string(),
            cookie_url: COOKIE_URL.to_string(),
            rate_limit: 120,
            timeout: Duration::from_secs(20),
        }
    }
}

pub struct YahooClient {
    base_url: String,
    cookie_url: String,
    client: Client,
    rate_limiter: RateLimiter,
    /// Cached crumb; the session cookie lives in the client's cookie jar.
    crumb: Mutex<Option<String>>,
}

impl YahooClient {
    pub fn new(config: YahooConfig) -> DashboardResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .cookie_store(true)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| DashboardError::UpstreamUnavailable(format!("http client: {}", e)))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            cookie_url: config.cookie_url,
            client,
            rate_limiter: RateLimiter::new(config.rate_limit, Duration::from_secs(60)),
            crumb: Mutex::new(None),
        })
    }

    /// Send a request with rate limiting and automatic 429 retry.
    async fn send_request(&self, builder: reqwest::RequestBuilder) -> DashboardResult<reqwest::Response> {
        let request = builder
            .header(reqwest::header::REFERER, REFERER)
            .build()
            .map_err(|e| DashboardError::UpstreamUnavailable(e.to_string()))?;

        for attempt in 0..MAX_RETRIES {
            self.rate_limiter.acquire().await;
            let req_clone = request
                .try_clone()
                .ok_or_else(|| DashboardError::UpstreamUnavailable("Cannot clone request".to_string()))?;
            let response = self
                .client
                .execute(req_clone)
                .await
                .map_err(|e| DashboardError::UpstreamUnavailable(format!("yahoo transport error: {}", e)))?;

            if response.status() != StatusCode::TOO_MANY_REQUESTS {
                return Ok(response);
            }

            let wait = RETRY_BASE_DELAY * 2u32.pow(attempt);
            tracing::warn!(
                "Yahoo 429 rate limited, waiting {}s before retry {}/{}",
                wait.as_secs(),
                attempt + 1,
                MAX_RETRIES
            );
            tokio::time::sleep(wait).await;
        }

        Err(DashboardError::UpstreamUnavailable(format!(
            "Rate limited by Yahoo after {} retries",
            MAX_RETRIES
        )))
    }

    /// Crumb for authenticated endpoints, fetched once and cached.
    ///
    /// `None` when Yahoo refuses to hand one out; most endpoints still answer
    /// without it.
    async fn crumb(&self) -> Option<String> {
        let mut cached = self.crumb.lock().await;
        if let Some(crumb) = cached.as_ref() {
            return Some(crumb.clone());
        }

        match self.fetch_crumb().await {
            Ok(crumb) => {
                tracing::debug!("Obtained Yahoo crumb");
                *cached = Some(crumb.clone());
                Some(crumb)
            }
            Err(e) => {
                tracing::warn!("Yahoo crumb unavailable: {}", e);
                None
            }
        }
    }

    async fn fetch_crumb(&self) -> DashboardResult<String> {
        // Sets the session cookie; the status is irrelevant (usually 404).
        let _ = self.send_request(self.client.get(&self.cookie_url)).await?;

        let response = self
            .send_request(self.client.get(format!("{}{}", self.base_url, CRUMB_PATH)))
            .await?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| DashboardError::UpstreamUnavailable(e.to_string()))?;
        let crumb = body.trim();

        if !status.is_success() || crumb.is_empty() || crumb.len() >= 100 || crumb.contains(' ') || crumb.contains('<') {
            return Err(DashboardError::UpstreamUnavailable(format!(
                "crumb endpoint returned HTTP {}",
                status
            )));
        }
        Ok(crumb.to_string())
    }

    async fn invalidate_crumb(&self) {
        *self.crumb.lock().await = None;
    }

    /// GET `path` and return the body, refreshing the crumb once on 401/403.
    async fn get_text(&self, path: &str, query: &[(&str, String)], symbol: &str) -> DashboardResult<String> {
        let url = format!("{}{}", self.base_url, path);

        for auth_attempt in 0..2 {
            let mut params: Vec<(&str, String)> = query.to_vec();
            if let Some(crumb) = self.crumb().await {
                params.push(("crumb", crumb));
            }

            let response = self.send_request(self.client.get(&url).query(&params)).await?;
            let status = response.status();

            if (status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN) && auth_attempt == 0 {
                tracing::warn!("Yahoo returned {} for {}, refreshing crumb", status, symbol);
                self.invalidate_crumb().await;
                continue;
            }

            let body = response
                .text()
                .await
                .map_err(|e| DashboardError::UpstreamUnavailable(e.to_string()))?;

            // 404 bodies carry the structured "Not Found" error the parsers map.
            if status.is_success() || status == StatusCode::NOT_FOUND {
                return Ok(body);
            }
            return Err(DashboardError::UpstreamUnavailable(format!(
                "HTTP {}: {}",
                status,
                truncate(&body, 200)
            )));
        }

        Err(DashboardError::UpstreamUnavailable(format!(
            "Yahoo authentication failed for {}",
            symbol
        )))
    }

    async fn quote_summary_modules(&self, symbol: &str, modules: &[&str]) -> DashboardResult<String> {
        let path = format!("/v10/finance/quoteSummary/{}", urlencoding::encode(symbol));
        self.get_text(&path, &[("modules", modules.join(","))], symbol).await
    }
}

#[async_trait]
impl MarketDataGateway for YahooClient {
    async fn get_quote_summary(&self, symbol: &str) -> DashboardResult<QuoteSummary> {
        let body = self
            .get_text("/v7/finance/quote", &[("symbols", symbol.to_string())], symbol)
            .await?;
        responses::parse_quote(&body, symbol)
    }

    async fn get_history(&self, symbol: &str, period: Period, interval: Interval) -> DashboardResult<PriceSeries> {
        let path = format!("/v8/finance/chart/{}", urlencoding::encode(symbol));
        let query = [
            ("range", period.as_str().to_string()),
            ("interval", interval.as_str().to_string()),
            ("includePrePost", "false".to_string()),
        ];
        let body = self.get_text(&path, &query, symbol).await?;
        let series = responses::parse_chart(&body, symbol)?;
        tracing::debug!("Fetched {} bars for {} ({}/{})", series.len(), symbol, period, interval);
        Ok(series)
    }

    async fn get_fundamentals(&self, symbol: &str) -> DashboardResult<Fundamentals> {
        let body = self.quote_summary_modules(symbol, FUNDAMENTAL_MODULES).await?;
        responses::parse_fundamentals(&body, symbol)
    }

    async fn get_financial_statements(&self, symbol: &str) -> DashboardResult<FinancialStatements> {
        let body = self.quote_summary_modules(symbol, STATEMENT_MODULES).await?;
        responses::parse_statements(&body, symbol)
    }

    fn name(&self) -> &'static str {
        "yahoo"
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}
