use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::DashboardError;

/// OHLCV bar. Only `close` is guaranteed; the rest may be missing in partial upstream data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: f64,
    pub volume: Option<f64>,
}

impl PricePoint {
    pub fn from_close(timestamp: i64, close: f64) -> Self {
        Self {
            timestamp,
            open: None,
            high: None,
            low: None,
            close,
            volume: None,
        }
    }
}

/// Price history for one symbol, ascending by timestamp with no duplicate timestamps.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    symbol: String,
    points: Vec<PricePoint>,
}

impl PriceSeries {
    /// Sorts the points and drops repeated timestamps (first occurrence wins).
    pub fn new(symbol: impl Into<String>, mut points: Vec<PricePoint>) -> Self {
        points.sort_by_key(|p| p.timestamp);
        points.dedup_by_key(|p| p.timestamp);
        Self {
            symbol: symbol.into(),
            points,
        }
    }

    pub fn empty(symbol: impl Into<String>) -> Self {
        Self::new(symbol, Vec::new())
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Close prices in the shape the series utilities consume.
    pub fn closes(&self) -> Vec<Option<f64>> {
        self.points.iter().map(|p| Some(p.close)).collect()
    }

    /// Close `n` bars back from the most recent one (`0` = latest).
    pub fn close_from_end(&self, n: usize) -> Option<f64> {
        self.points
            .len()
            .checked_sub(n + 1)
            .map(|idx| self.points[idx].close)
    }
}

/// Fast real-time summary for a symbol. Every field is independently optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuoteSummary {
    pub price: Option<f64>,
    pub currency: Option<String>,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub prev_close: Option<f64>,
    pub volume: Option<f64>,
    pub market_cap: Option<f64>,
    pub year_high: Option<f64>,
    pub year_low: Option<f64>,
}

/// Flat blob of named company fields (`trailingPE`, `sector`, `marketCap`, ...).
///
/// Upstream schemas are inconsistent, so lookups are by key with type checks
/// rather than a fixed struct.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fundamentals(serde_json::Map<String, serde_json::Value>);

impl Fundamentals {
    pub fn new(fields: serde_json::Map<String, serde_json::Value>) -> Self {
        Self(fields)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.0.insert(key.into(), value);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Finite numeric value for `key`.
    pub fn number(&self, key: &str) -> Option<f64> {
        self.0
            .get(key)
            .and_then(serde_json::Value::as_f64)
            .filter(|v| v.is_finite())
    }

    /// First key in `keys` holding a finite number.
    pub fn first_number(&self, keys: &[&str]) -> Option<f64> {
        keys.iter().find_map(|k| self.number(k))
    }

    pub fn integer(&self, key: &str) -> Option<i64> {
        let value = self.0.get(key)?;
        value
            .as_i64()
            .or_else(|| value.as_f64().filter(|v| v.is_finite()).map(|v| v as i64))
    }

    /// Non-blank string value for `key`.
    pub fn text(&self, key: &str) -> Option<String> {
        self.0
            .get(key)
            .and_then(serde_json::Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }

    pub fn first_text(&self, keys: &[&str]) -> Option<String> {
        keys.iter().find_map(|k| self.text(k))
    }
}

/// One financial statement: line item name -> values, most recent period first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Statement {
    rows: BTreeMap<String, Vec<Option<f64>>>,
}

impl Statement {
    pub fn insert_row(&mut self, name: impl Into<String>, values: Vec<Option<f64>>) {
        self.rows.insert(name.into(), values);
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Latest non-null value of the first matching row.
    ///
    /// Candidates are tried by exact name first, then case-insensitively.
    pub fn latest(&self, candidates: &[&str]) -> Option<f64> {
        let row = candidates
            .iter()
            .find_map(|name| self.rows.get(*name))
            .or_else(|| {
                candidates.iter().find_map(|name| {
                    let wanted = name.trim().to_lowercase();
                    self.rows
                        .iter()
                        .find(|(k, _)| k.trim().to_lowercase() == wanted)
                        .map(|(_, v)| v)
                })
            })?;

        row.iter().flatten().copied().find(|v| v.is_finite())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FinancialStatements {
    pub income: Statement,
    pub balance_sheet: Statement,
    pub cash_flow: Statement,
}

/// Lookback window for a history request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Period {
    OneDay,
    FiveDays,
    OneMonth,
    ThreeMonths,
    #[default]
    SixMonths,
    OneYear,
    TwoYears,
    FiveYears,
    TenYears,
    YearToDate,
    Max,
}

impl Period {
    pub fn as_str(&self) -> &'static str {
        match self {
            Period::OneDay => "1d",
            Period::FiveDays => "5d",
            Period::OneMonth => "1mo",
            Period::ThreeMonths => "3mo",
            Period::SixMonths => "6mo",
            Period::OneYear => "1y",
            Period::TwoYears => "2y",
            Period::FiveYears => "5y",
            Period::TenYears => "10y",
            Period::YearToDate => "ytd",
            Period::Max => "max",
        }
    }
}

impl FromStr for Period {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "1d" => Ok(Period::OneDay),
            "5d" => Ok(Period::FiveDays),
            "1mo" => Ok(Period::OneMonth),
            "3mo" => Ok(Period::ThreeMonths),
            "6mo" => Ok(Period::SixMonths),
            "1y" => Ok(Period::OneYear),
            "2y" => Ok(Period::TwoYears),
            "5y" => Ok(Period::FiveYears),
            "10y" => Ok(Period::TenYears),
            "ytd" => Ok(Period::YearToDate),
            "max" => Ok(Period::Max),
            other => Err(DashboardError::InvalidInput(format!("unsupported period '{}'", other))),
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bar size for a history request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Interval {
    Minute1,
    Minute2,
    Minute5,
    Minute15,
    Minute30,
    Minute60,
    Minute90,
    Hour1,
    #[default]
    Day1,
    Day5,
    Week1,
    Month1,
    Month3,
}

impl Interval {
    pub fn as_str(&self) -> &'static str {
        match self {
            Interval::Minute1 => "1m",
            Interval::Minute2 => "2m",
            Interval::Minute5 => "5m",
            Interval::Minute15 => "15m",
            Interval::Minute30 => "30m",
            Interval::Minute60 => "60m",
            Interval::Minute90 => "90m",
            Interval::Hour1 => "1h",
            Interval::Day1 => "1d",
            Interval::Day5 => "5d",
            Interval::Week1 => "1wk",
            Interval::Month1 => "1mo",
            Interval::Month3 => "3mo",
        }
    }
}

impl FromStr for Interval {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "1m" => Ok(Interval::Minute1),
            "2m" => Ok(Interval::Minute2),
            "5m" => Ok(Interval::Minute5),
            "15m" => Ok(Interval::Minute15),
            "30m" => Ok(Interval::Minute30),
            "60m" => Ok(Interval::Minute60),
            "90m" => Ok(Interval::Minute90),
            "1h" => Ok(Interval::Hour1),
            "1d" => Ok(Interval::Day1),
            "5d" => Ok(Interval::Day5),
            "1wk" => Ok(Interval::Week1),
            "1mo" => Ok(Interval::Month1),
            "3mo" => Ok(Interval::Month3),
            other => Err(DashboardError::InvalidInput(format!("unsupported interval '{}'", other))),
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MacdSnapshot {
    pub macd: Option<f64>,
    pub signal: Option<f64>,
    pub hist: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BollingerSnapshot {
    pub upper: Option<f64>,
    pub middle: Option<f64>,
    pub lower: Option<f64>,
}

/// Latest value of each indicator; a field is null when history is too short.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    pub sma20: Option<f64>,
    pub sma50: Option<f64>,
    pub rsi14: Option<f64>,
    pub macd: MacdSnapshot,
    pub bbands: BollingerSnapshot,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MacdSeries {
    pub macd: Vec<Option<f64>>,
    pub signal: Vec<Option<f64>>,
    pub hist: Vec<Option<f64>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BollingerSeries {
    pub upper: Vec<Option<f64>>,
    pub middle: Vec<Option<f64>>,
    pub lower: Vec<Option<f64>>,
}

/// Indicator values aligned position-by-position with a price series.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSeries {
    pub sma20: Vec<Option<f64>>,
    pub sma50: Vec<Option<f64>>,
    pub bbands: BollingerSeries,
    pub rsi14: Vec<Option<f64>>,
    pub macd: MacdSeries,
}

/// Normalized point-in-time record for one symbol.
///
/// Always fully shaped: a failed assembly still carries every field (as null)
/// plus an `error` message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub symbol: String,
    pub price: Option<f64>,
    pub currency: Option<String>,
    /// Assembly time, milliseconds since the Unix epoch
    #[serde(rename = "ts")]
    pub timestamp: i64,
    pub change: Option<f64>,
    pub change_percent: Option<f64>,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub prev_close: Option<f64>,
    pub volume: Option<f64>,
    pub market_cap: Option<f64>,
    pub year_high: Option<f64>,
    pub year_low: Option<f64>,
    pub indicators: IndicatorSnapshot,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Quote {
    /// All-null quote for `symbol`.
    pub fn skeleton(symbol: impl Into<String>, timestamp: i64) -> Self {
        Self {
            symbol: symbol.into(),
            price: None,
            currency: None,
            timestamp,
            change: None,
            change_percent: None,
            open: None,
            high: None,
            low: None,
            prev_close: None,
            volume: None,
            market_cap: None,
            year_high: None,
            year_low: None,
            indicators: IndicatorSnapshot::default(),
            error: None,
        }
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_price_series_sorted_and_deduplicated() {
        let series = PriceSeries::new(
            "AAPL",
            vec![
                PricePoint::from_close(3, 12.0),
                PricePoint::from_close(1, 10.0),
                PricePoint::from_close(2, 11.0),
                PricePoint::from_close(2, 99.0),
            ],
        );

        let ts: Vec<i64> = series.points().iter().map(|p| p.timestamp).collect();
        assert_eq!(ts, vec![1, 2, 3]);
        assert_eq!(series.close_from_end(0), Some(12.0));
        assert_eq!(series.close_from_end(1), Some(11.0));
        assert_eq!(series.close_from_end(3), None);
    }

    #[test]
    fn test_empty_series() {
        let series = PriceSeries::empty("ZZZZ");
        assert!(series.is_empty());
        assert!(series.closes().is_empty());
        assert_eq!(series.close_from_end(0), None);
    }

    #[test]
    fn test_fundamentals_lookups() {
        let mut f = Fundamentals::default();
        f.insert("trailingPE", json!(28.5));
        f.insert("forwardPE", json!(24.0));
        f.insert("sector", json!("Technology"));
        f.insert("industry", json!("  "));
        f.insert("fullTimeEmployees", json!(164000));
        f.insert("bogus", json!("not a number"));

        assert_eq!(f.first_number(&["missing", "trailingPE"]), Some(28.5));
        assert_eq!(f.number("bogus"), None);
        assert_eq!(f.text("industry"), None);
        assert_eq!(f.first_text(&["industry", "sector"]), Some("Technology".to_string()));
        assert_eq!(f.integer("fullTimeEmployees"), Some(164000));
    }

    #[test]
    fn test_statement_latest_matches_case_insensitively() {
        let mut s = Statement::default();
        s.insert_row("totalRevenue", vec![None, Some(383.0), Some(394.0)]);
        s.insert_row("Net Income", vec![Some(97.0)]);

        assert_eq!(s.latest(&["Total Revenue", "totalRevenue"]), Some(383.0));
        assert_eq!(s.latest(&["net income"]), Some(97.0));
        assert_eq!(s.latest(&["Gross Profit"]), None);
    }

    #[test]
    fn test_period_and_interval_parsing() {
        assert_eq!("6mo".parse::<Period>().unwrap(), Period::SixMonths);
        assert_eq!(" YTD ".parse::<Period>().unwrap(), Period::YearToDate);
        assert_eq!("1wk".parse::<Interval>().unwrap(), Interval::Week1);
        assert!(matches!(
            "7mo".parse::<Period>(),
            Err(DashboardError::InvalidInput(_))
        ));
        assert!("1y".parse::<Interval>().is_err());
        assert_eq!(Period::default().to_string(), "6mo");
        assert_eq!(Interval::default().to_string(), "1d");
    }

    #[test]
    fn test_quote_skeleton_serializes_all_fields() {
        let quote = Quote::skeleton("MSFT", 1_700_000_000_000).with_error("boom");
        let value = serde_json::to_value(&quote).unwrap();

        assert_eq!(value["symbol"], "MSFT");
        assert_eq!(value["ts"], 1_700_000_000_000i64);
        assert!(value["price"].is_null());
        assert!(value["indicators"]["macd"]["hist"].is_null());
        assert!(value["indicators"]["bbands"]["upper"].is_null());
        assert_eq!(value["error"], "boom");

        let ok = serde_json::to_value(Quote::skeleton("MSFT", 0)).unwrap();
        assert!(ok.get("error").is_none());
    }
}
