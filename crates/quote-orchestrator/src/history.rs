use dashboard_core::{IndicatorSeries, PriceSeries};
use serde::{Deserialize, Serialize};
use technical_analysis::IndicatorEngine;

/// OHLCV arrays plus every indicator series, all aligned by position.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoryReport {
    pub symbol: String,
    /// Milliseconds since the Unix epoch
    pub ts: Vec<i64>,
    pub open: Vec<Option<f64>>,
    pub high: Vec<Option<f64>>,
    pub low: Vec<Option<f64>>,
    pub close: Vec<Option<f64>>,
    pub volume: Vec<Option<f64>>,
    pub indicators: IndicatorSeries,
}

impl HistoryReport {
    pub fn empty(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            ..Default::default()
        }
    }

    pub fn from_series(series: &PriceSeries, engine: &IndicatorEngine) -> Self {
        let points = series.points();
        let close = series.closes();

        Self {
            symbol: series.symbol().to_string(),
            ts: points.iter().map(|p| p.timestamp).collect(),
            open: points.iter().map(|p| p.open).collect(),
            high: points.iter().map(|p| p.high).collect(),
            low: points.iter().map(|p| p.low).collect(),
            volume: points.iter().map(|p| p.volume).collect(),
            indicators: engine.series(&close),
            close,
        }
    }

    pub fn len(&self) -> usize {
        self.ts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ts.is_empty()
    }
}
