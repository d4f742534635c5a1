use dashboard_core::{
    DashboardError, DashboardResult, FinancialStatements, Fundamentals, IndexDefinition,
    IndicatorSnapshot, Interval, MarketDataGateway, Period, Quote,
};
use portfolio_diagnostics::{diagnose, prepare_holdings, CompanyBasics, DiagnosticReport, HoldingInput};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use technical_analysis::IndicatorEngine;

pub mod assembler;
pub mod company;
pub mod fallback;
pub mod history;
pub mod portfolio;
#[cfg(test)]
mod test_support;

pub use assembler::QuoteAssembler;
pub use company::CompanyReport;
pub use history::HistoryReport;

/// One row of the index overview: the index definition joined with its live quote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexOverview {
    pub symbol: String,
    pub name: String,
    pub category: String,
    pub price: Option<f64>,
    pub change_percent: Option<f64>,
    pub indicators: IndicatorSnapshot,
    pub constituents: Vec<String>,
}

/// Entry point for everything the dashboard asks of the market: quotes,
/// history, company reports and portfolio diagnostics.
pub struct QuoteOrchestrator {
    gateway: Arc<dyn MarketDataGateway>,
    assembler: QuoteAssembler,
    engine: IndicatorEngine,
}

impl QuoteOrchestrator {
    pub fn new(gateway: Arc<dyn MarketDataGateway>) -> Self {
        Self {
            assembler: QuoteAssembler::new(gateway.clone()),
            gateway,
            engine: IndicatorEngine::new(),
        }
    }

    /// Symbols assembled at once in batch requests. Results keep input order
    /// regardless of this setting.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.assembler = self.assembler.with_concurrency(concurrency);
        self
    }

    pub fn gateway_name(&self) -> &'static str {
        self.gateway.name()
    }

    pub async fn quote(&self, symbol: &str) -> Quote {
        self.assembler.assemble(symbol).await
    }

    pub async fn quotes(&self, symbols: &[String]) -> Vec<Quote> {
        tracing::info!(
            "Assembling {} quotes via {} (concurrency {})",
            symbols.len(),
            self.gateway.name(),
            self.assembler.concurrency()
        );
        self.assembler.assemble_batch(symbols).await
    }

    pub async fn index_overview(&self, indices: &[&IndexDefinition]) -> Vec<IndexOverview> {
        let symbols: Vec<String> = indices.iter().map(|d| d.symbol.clone()).collect();
        let quotes = self.quotes(&symbols).await;

        indices
            .iter()
            .zip(quotes)
            .map(|(def, quote)| IndexOverview {
                symbol: def.symbol.clone(),
                name: def.name.clone(),
                category: def.category.clone(),
                price: quote.price,
                change_percent: quote.change_percent,
                indicators: quote.indicators,
                constituents: def.constituents.clone(),
            })
            .collect()
    }

    /// OHLCV plus indicator series. An unknown symbol gives an empty report;
    /// any other upstream failure is returned.
    pub async fn history_report(
        &self,
        symbol: &str,
        period: Period,
        interval: Interval,
    ) -> DashboardResult<HistoryReport> {
        let symbol = normalize_symbol(symbol)?;
        match self.gateway.get_history(&symbol, period, interval).await {
            Ok(series) => Ok(HistoryReport::from_series(&series, &self.engine)),
            Err(DashboardError::NotFound(_)) => {
                tracing::debug!("No history for {} ({}/{})", symbol, period, interval);
                Ok(HistoryReport::empty(symbol))
            }
            Err(e) => {
                tracing::warn!("History for {} failed: {}", symbol, e);
                Err(e)
            }
        }
    }

    /// Info blob and statements are fetched independently; either failing
    /// leaves only its own fields null.
    pub async fn company_report(&self, symbol: &str) -> DashboardResult<CompanyReport> {
        let symbol = normalize_symbol(symbol)?;
        let (info, statements) = tokio::join!(
            self.gateway.get_fundamentals(&symbol),
            self.gateway.get_financial_statements(&symbol),
        );

        let info = info.unwrap_or_else(|e| {
            tracing::warn!("Company info for {} unavailable: {}", symbol, e);
            Fundamentals::default()
        });
        let statements = statements.unwrap_or_else(|e| {
            tracing::warn!("Financial statements for {} unavailable: {}", symbol, e);
            FinancialStatements::default()
        });

        Ok(CompanyReport::build(&symbol, &info, &statements))
    }

    pub async fn diagnose_portfolio(&self, inputs: &[HoldingInput]) -> DashboardResult<DiagnosticReport> {
        let holdings = prepare_holdings(inputs)?;

        let mut basics: HashMap<String, CompanyBasics> = HashMap::new();
        for holding in &holdings {
            if basics.contains_key(&holding.symbol) {
                continue;
            }
            let entry = match self.gateway.get_fundamentals(&holding.symbol).await {
                Ok(info) => portfolio::company_basics(&info),
                Err(e) => {
                    tracing::warn!("Basics for {} unavailable: {}", holding.symbol, e);
                    CompanyBasics::default()
                }
            };
            basics.insert(holding.symbol.clone(), entry);
        }

        tracing::info!("Diagnosing portfolio of {} holdings", holdings.len());
        Ok(diagnose(&holdings, &basics))
    }
}

fn normalize_symbol(symbol: &str) -> DashboardResult<String> {
    let symbol = symbol.trim().to_uppercase();
    if symbol.is_empty() {
        return Err(DashboardError::InvalidInput("symbol is required".to_string()));
    }
    Ok(symbol)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FakeGateway;
    use dashboard_core::{PricePoint, QuoteSummary};
    use portfolio_diagnostics::RiskLevel;
    use serde_json::json;

    fn closes(n: usize) -> Vec<PricePoint> {
        (0..n)
            .map(|i| PricePoint::from_close(i as i64 * 86_400_000, 100.0 + i as f64))
            .collect()
    }

    fn info(sector: &str, pe: f64) -> Fundamentals {
        let mut f = Fundamentals::default();
        f.insert("sector", json!(sector));
        f.insert("trailingPE", json!(pe));
        f
    }

    fn holding(symbol: &str, weight: f64) -> HoldingInput {
        HoldingInput {
            symbol: Some(symbol.to_string()),
            weight: Some(weight),
        }
    }

    #[tokio::test]
    async fn test_history_report_unknown_symbol_is_empty() {
        let orchestrator = QuoteOrchestrator::new(Arc::new(FakeGateway::default()));
        let report = orchestrator
            .history_report("nope", Period::SixMonths, Interval::Day1)
            .await
            .unwrap();

        assert_eq!(report.symbol, "NOPE");
        assert!(report.is_empty());
    }

    #[tokio::test]
    async fn test_history_report_upstream_failure_is_error() {
        let gateway = FakeGateway::default().failing("AAPL", "connection reset");
        let orchestrator = QuoteOrchestrator::new(Arc::new(gateway));
        let result = orchestrator
            .history_report("AAPL", Period::OneYear, Interval::Day1)
            .await;

        assert!(matches!(result, Err(DashboardError::UpstreamUnavailable(_))));
    }

    #[tokio::test]
    async fn test_history_report_with_data() {
        let gateway = FakeGateway::default().with_history("AAPL", closes(30));
        let orchestrator = QuoteOrchestrator::new(Arc::new(gateway));
        let report = orchestrator
            .history_report("AAPL", Period::SixMonths, Interval::Day1)
            .await
            .unwrap();

        assert_eq!(report.len(), 30);
        assert!(report.indicators.sma20[29].is_some());
    }

    #[tokio::test]
    async fn test_blank_symbol_rejected() {
        let orchestrator = QuoteOrchestrator::new(Arc::new(FakeGateway::default()));
        let result = orchestrator.company_report("  ").await;
        assert!(matches!(result, Err(DashboardError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_company_report_survives_statement_failure() {
        let gateway = FakeGateway::default().with_fundamentals("MSFT", info("Technology", 35.0));
        let orchestrator = QuoteOrchestrator::new(Arc::new(gateway));
        let report = orchestrator.company_report("msft").await.unwrap();

        assert_eq!(report.info.symbol, "MSFT");
        assert_eq!(report.info.sector.as_deref(), Some("Technology"));
        assert_eq!(report.fundamentals.pe, Some(35.0));
        assert_eq!(report.financials.annual.revenue, None);
    }

    #[tokio::test]
    async fn test_diagnose_portfolio_uses_lookups() {
        let gateway = FakeGateway::default()
            .with_fundamentals("AAPL", info("Technology", 30.0))
            .with_fundamentals("MSFT", info("Technology", 34.0));
        let orchestrator = QuoteOrchestrator::new(Arc::new(gateway));

        let report = orchestrator
            .diagnose_portfolio(&[holding("aapl", 0.6), holding("MSFT", 0.4)])
            .await
            .unwrap();

        assert_eq!(report.analysis.risk_level, RiskLevel::High);
        assert_eq!(report.analysis.metrics.sector_concentration, 1.0);
        assert_eq!(report.analysis.metrics.avg_pe, Some(31.6));
        assert_eq!(report.holdings[0].symbol, "AAPL");
    }

    #[tokio::test]
    async fn test_diagnose_portfolio_lookup_failure_is_unknown_sector() {
        let gateway = FakeGateway::default().failing("XYZ", "timeout");
        let orchestrator = QuoteOrchestrator::new(Arc::new(gateway));

        let report = orchestrator
            .diagnose_portfolio(&[holding("XYZ", 1.0)])
            .await
            .unwrap();

        assert_eq!(report.analysis.sector_weights.get("Unknown"), Some(&1.0));
        assert_eq!(report.analysis.metrics.avg_pe, None);
    }

    #[tokio::test]
    async fn test_diagnose_portfolio_rejects_negative_weight() {
        let orchestrator = QuoteOrchestrator::new(Arc::new(FakeGateway::default()));
        let result = orchestrator.diagnose_portfolio(&[holding("AAPL", -1.0)]).await;
        assert!(matches!(result, Err(DashboardError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_index_overview_joins_definitions() {
        let gateway = FakeGateway::default().with_summary(
            "XLK",
            QuoteSummary {
                price: Some(200.0),
                prev_close: Some(100.0),
                ..Default::default()
            },
        );
        let orchestrator = QuoteOrchestrator::new(Arc::new(gateway)).with_concurrency(2);
        let universe = dashboard_core::MarketUniverse::builtin();
        let defs: Vec<&IndexDefinition> = universe.indices_in(Some("sector_etf")).take(2).collect();

        let overview = orchestrator.index_overview(&defs).await;

        assert_eq!(overview.len(), 2);
        assert_eq!(overview[0].symbol, defs[0].symbol);
        assert_eq!(overview[0].constituents, defs[0].constituents);
        let xlk = overview.iter().find(|o| o.symbol == "XLK").unwrap();
        assert_eq!(xlk.change_percent, Some(100.0));
    }
}
