use chrono::Utc;
use dashboard_core::{
    DashboardResult, Fundamentals, Interval, MarketDataGateway, Period, PriceSeries, Quote,
    QuoteSummary,
};
use futures_util::stream::{self, StreamExt};
use std::sync::Arc;
use technical_analysis::IndicatorEngine;

use crate::fallback::Fallback;

const SUMMARY: &str = "summary";
const INFO: &str = "info";
const HISTORY: &str = "history";

/// Builds one [`Quote`] per symbol from the gateway's three sources:
/// fast summary, info blob and price history, in that precedence.
///
/// Never fails. Upstream errors degrade individual fields to null; a quote
/// that ends up without a price carries the first upstream error.
pub struct QuoteAssembler {
    gateway: Arc<dyn MarketDataGateway>,
    engine: IndicatorEngine,
    indicator_period: Period,
    indicator_interval: Interval,
    concurrency: usize,
}

impl QuoteAssembler {
    pub fn new(gateway: Arc<dyn MarketDataGateway>) -> Self {
        Self {
            gateway,
            engine: IndicatorEngine::new(),
            indicator_period: Period::SixMonths,
            indicator_interval: Interval::Day1,
            concurrency: 1,
        }
    }

    /// Number of symbols assembled at once in a batch (1 = sequential).
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_engine(mut self, engine: IndicatorEngine) -> Self {
        self.engine = engine;
        self
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Quotes for `symbols`, in input order, one per symbol.
    pub async fn assemble_batch(&self, symbols: &[String]) -> Vec<Quote> {
        stream::iter(symbols.iter().cloned())
            .map(|symbol| async move { self.assemble(&symbol).await })
            .buffered(self.concurrency)
            .collect()
            .await
    }

    pub async fn assemble(&self, symbol: &str) -> Quote {
        let symbol = symbol.trim().to_uppercase();
        let mut quote = Quote::skeleton(symbol.clone(), Utc::now().timestamp_millis());
        let mut failures = Failures::default();

        let (summary, history) = tokio::join!(
            self.gateway.get_quote_summary(&symbol),
            self.gateway
                .get_history(&symbol, self.indicator_period, self.indicator_interval),
        );
        let summary = failures.record("quote summary", &symbol, summary).unwrap_or_default();
        let history = failures
            .record("price history", &symbol, history)
            .unwrap_or_else(|| PriceSeries::empty(symbol.clone()));

        // The info blob is only consulted when the summary has no price.
        let info = if summary.price.is_none() {
            let fetched = self.gateway.get_fundamentals(&symbol).await;
            failures.record("info", &symbol, fetched).unwrap_or_default()
        } else {
            Fundamentals::default()
        };

        let price = Fallback::new()
            .or(SUMMARY, summary.price)
            .or(INFO, info.first_number(&["regularMarketPrice", "currentPrice"]));
        let price = if price.is_resolved() {
            price
        } else {
            let day = self
                .gateway
                .get_history(&symbol, Period::OneDay, Interval::Day1)
                .await;
            let day = failures.record("intraday history", &symbol, day);
            price.or_else(HISTORY, || day.and_then(|d| d.close_from_end(0)))
        };
        if let Some(source) = price.source() {
            tracing::debug!("{} price from {}", symbol, source);
        }

        let prev_close = Fallback::new()
            .or(SUMMARY, summary.prev_close)
            .or(INFO, info.first_number(&["previousClose", "regularMarketPreviousClose"]))
            .or_else(HISTORY, || history.close_from_end(1))
            .resolve();

        merge_fields(&mut quote, &summary, &info);
        quote.price = price.resolve();
        quote.prev_close = prev_close;

        if let (Some(price), Some(prev)) = (quote.price, quote.prev_close) {
            let change = price - prev;
            quote.change = Some(change);
            if prev != 0.0 {
                quote.change_percent = Some(change / prev * 100.0);
            }
        }

        quote.indicators = self.engine.snapshot(&history.closes());

        if quote.price.is_none() {
            if let Some(err) = failures.first() {
                quote.error = Some(err.to_string());
            }
        }
        quote
    }
}

/// Non-price fields: summary first, info blob second.
fn merge_fields(quote: &mut Quote, summary: &QuoteSummary, info: &Fundamentals) {
    quote.currency = Fallback::new()
        .or(SUMMARY, summary.currency.clone())
        .or(INFO, info.text("currency"))
        .resolve();
    quote.open = first(summary.open, info, &["open", "regularMarketOpen"]);
    quote.high = first(summary.high, info, &["dayHigh", "regularMarketDayHigh"]);
    quote.low = first(summary.low, info, &["dayLow", "regularMarketDayLow"]);
    quote.volume = first(summary.volume, info, &["volume", "regularMarketVolume"]);
    quote.market_cap = first(summary.market_cap, info, &["marketCap"]);
    quote.year_high = first(summary.year_high, info, &["fiftyTwoWeekHigh"]);
    quote.year_low = first(summary.year_low, info, &["fiftyTwoWeekLow"]);
}

fn first(summary: Option<f64>, info: &Fundamentals, keys: &[&str]) -> Option<f64> {
    Fallback::new()
        .or(SUMMARY, summary)
        .or(INFO, info.first_number(keys))
        .resolve()
}

/// Upstream failures seen while assembling one quote.
#[derive(Default)]
struct Failures(Vec<String>);

impl Failures {
    fn record<T>(&mut self, what: &str, symbol: &str, result: DashboardResult<T>) -> Option<T> {
        match result {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::warn!("{} unavailable for {}: {}", what, symbol, e);
                self.0.push(format!("{}: {}", what, e));
                None
            }
        }
    }

    fn first(&self) -> Option<&str> {
        self.0.first().map(String::as_str)
    }
}
