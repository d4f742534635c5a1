use async_trait::async_trait;
use crate::{DashboardResult, FinancialStatements, Fundamentals, Interval, Period, PriceSeries, QuoteSummary};

/// Source of raw market data for a ticker symbol.
///
/// Implementations report a failed call as `Err`, distinct from a call that
/// succeeded but left individual fields empty. An unknown symbol should be
/// reported as `DashboardError::NotFound`.
#[async_trait]
pub trait MarketDataGateway: Send + Sync {
    /// Near-real-time summary (last price, day range, previous close, ...).
    async fn get_quote_summary(&self, symbol: &str) -> DashboardResult<QuoteSummary>;

    /// OHLCV bars in ascending timestamp order.
    async fn get_history(
        &self,
        symbol: &str,
        period: Period,
        interval: Interval,
    ) -> DashboardResult<PriceSeries>;

    /// Flat mapping of named company and valuation fields.
    async fn get_fundamentals(&self, symbol: &str) -> DashboardResult<Fundamentals>;

    /// Income, balance sheet and cash flow statements, most recent period first.
    async fn get_financial_statements(&self, symbol: &str) -> DashboardResult<FinancialStatements>;

    fn name(&self) -> &'static str;
}
