use async_trait::async_trait;
use dashboard_core::{
    DashboardError, DashboardResult, FinancialStatements, Fundamentals, Interval,
    MarketDataGateway, Period, PricePoint, PriceSeries, QuoteSummary,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// In-memory gateway. Anything not configured answers `NotFound`.
#[derive(Default)]
pub(crate) struct FakeGateway {
    summaries: HashMap<String, QuoteSummary>,
    histories: HashMap<String, Vec<PricePoint>>,
    day_histories: HashMap<String, Vec<PricePoint>>,
    fundamentals: HashMap<String, Fundamentals>,
    statements: HashMap<String, FinancialStatements>,
    failing: HashMap<String, String>,
    fundamentals_calls: AtomicUsize,
}

impl FakeGateway {
    pub(crate) fn with_summary(mut self, symbol: &str, summary: QuoteSummary) -> Self {
        self.summaries.insert(symbol.to_string(), summary);
        self
    }

    pub(crate) fn with_history(mut self, symbol: &str, points: Vec<PricePoint>) -> Self {
        self.histories.insert(symbol.to_string(), points);
        self
    }

    pub(crate) fn with_day_history(mut self, symbol: &str, points: Vec<PricePoint>) -> Self {
        self.day_histories.insert(symbol.to_string(), points);
        self
    }

    pub(crate) fn with_fundamentals(mut self, symbol: &str, fundamentals: Fundamentals) -> Self {
        self.fundamentals.insert(symbol.to_string(), fundamentals);
        self
    }

    pub(crate) fn with_statements(mut self, symbol: &str, statements: FinancialStatements) -> Self {
        self.statements.insert(symbol.to_string(), statements);
        self
    }

    /// Every call for `symbol` fails with `UpstreamUnavailable`.
    pub(crate) fn failing(mut self, symbol: &str, message: &str) -> Self {
        self.failing.insert(symbol.to_string(), message.to_string());
        self
    }

    pub(crate) fn fundamentals_calls(&self) -> usize {
        self.fundamentals_calls.load(Ordering::SeqCst)
    }

    fn lookup<T: Clone>(&self, map: &HashMap<String, T>, symbol: &str) -> DashboardResult<T> {
        if let Some(message) = self.failing.get(symbol) {
            return Err(DashboardError::UpstreamUnavailable(message.clone()));
        }
        map.get(symbol)
            .cloned()
            .ok_or_else(|| DashboardError::NotFound(symbol.to_string()))
    }
}

#[async_trait]
impl MarketDataGateway for FakeGateway {
    async fn get_quote_summary(&self, symbol: &str) -> DashboardResult<QuoteSummary> {
        self.lookup(&self.summaries, symbol)
    }

    async fn get_history(&self, symbol: &str, period: Period, _interval: Interval) -> DashboardResult<PriceSeries> {
        let source = if period == Period::OneDay {
            &self.day_histories
        } else {
            &self.histories
        };
        self.lookup(source, symbol)
            .map(|points| PriceSeries::new(symbol, points))
    }

    async fn get_fundamentals(&self, symbol: &str) -> DashboardResult<Fundamentals> {
        self.fundamentals_calls.fetch_add(1, Ordering::SeqCst);
        self.lookup(&self.fundamentals, symbol)
    }

    async fn get_financial_statements(&self, symbol: &str) -> DashboardResult<FinancialStatements> {
        self.lookup(&self.statements, symbol)
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}
