//! Yahoo Finance response shapes and their conversion into dashboard types.
//!
//! Upstream payloads are loosely typed (`{raw, fmt}` wrappers, missing
//! modules, nulls inside arrays), so only the envelopes are modelled as
//! structs and the rest is walked as `serde_json::Value`.

use dashboard_core::{
    DashboardError, DashboardResult, FinancialStatements, Fundamentals, PricePoint, PriceSeries,
    QuoteSummary, Statement,
};
use serde::Deserialize;
use serde_json::{Map, Value};

/// quoteSummary modules merged into the fundamentals blob, in precedence order.
pub(crate) const FUNDAMENTAL_MODULES: &[&str] = &[
    "price",
    "summaryDetail",
    "financialData",
    "defaultKeyStatistics",
    "assetProfile",
    "summaryProfile",
    "quoteType",
];

pub(crate) const STATEMENT_MODULES: &[&str] = &[
    "incomeStatementHistory",
    "balanceSheetHistory",
    "cashflowStatementHistory",
];

// ============================================================================
// v7 quote
// ============================================================================

#[derive(Debug, Deserialize)]
struct QuoteResponse {
    #[serde(rename = "quoteResponse")]
    quote_response: QuoteResponseData,
}

#[derive(Debug, Deserialize)]
struct QuoteResponseData {
    #[serde(default)]
    result: Vec<Map<String, Value>>,
    #[serde(default)]
    error: Option<Value>,
}

pub(crate) fn parse_quote(body: &str, symbol: &str) -> DashboardResult<QuoteSummary> {
    let response: QuoteResponse = serde_json::from_str(body)
        .map_err(|e| DashboardError::UpstreamUnavailable(format!("failed to parse yahoo quote: {}", e)))?;
    check_api_error(response.quote_response.error.as_ref(), symbol)?;

    let wanted = symbol.to_uppercase();
    let quote = response
        .quote_response
        .result
        .iter()
        .find(|q| {
            q.get("symbol")
                .and_then(Value::as_str)
                .is_some_and(|s| s.to_uppercase() == wanted)
        })
        .or_else(|| response.quote_response.result.first())
        .ok_or_else(|| DashboardError::NotFound(symbol.to_string()))?;

    let num = |key: &str| quote.get(key).and_then(raw_number);

    Ok(QuoteSummary {
        price: num("regularMarketPrice"),
        currency: quote
            .get("currency")
            .and_then(Value::as_str)
            .map(str::to_string),
        open: num("regularMarketOpen"),
        high: num("regularMarketDayHigh"),
        low: num("regularMarketDayLow"),
        prev_close: num("regularMarketPreviousClose"),
        volume: num("regularMarketVolume"),
        market_cap: num("marketCap"),
        year_high: num("fiftyTwoWeekHigh"),
        year_low: num("fiftyTwoWeekLow"),
    })
}

// ============================================================================
// v8 chart
// ============================================================================

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartData,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
    #[serde(default)]
    error: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    timestamp: Option<Vec<i64>>,
    indicators: ChartIndicators,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    #[serde(default)]
    quote: Vec<ChartQuote>,
}

#[derive(Debug, Default, Deserialize)]
struct ChartQuote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

/// Bars without a close are dropped; timestamps become milliseconds.
pub(crate) fn parse_chart(body: &str, symbol: &str) -> DashboardResult<PriceSeries> {
    let response: ChartResponse = serde_json::from_str(body)
        .map_err(|e| DashboardError::UpstreamUnavailable(format!("failed to parse yahoo chart: {}", e)))?;
    check_api_error(response.chart.error.as_ref(), symbol)?;

    let Some(result) = response.chart.result.and_then(|r| r.into_iter().next()) else {
        return Ok(PriceSeries::empty(symbol));
    };
    let timestamps = result.timestamp.unwrap_or_default();
    let quote = result.indicators.quote.into_iter().next().unwrap_or_default();

    let points = timestamps
        .iter()
        .enumerate()
        .filter_map(|(i, &ts)| {
            let close = value_at(&quote.close, i)?;
            Some(PricePoint {
                timestamp: ts * 1000,
                open: value_at(&quote.open, i),
                high: value_at(&quote.high, i),
                low: value_at(&quote.low, i),
                close,
                volume: value_at(&quote.volume, i),
            })
        })
        .collect();

    Ok(PriceSeries::new(symbol, points))
}

fn value_at(values: &[Option<f64>], i: usize) -> Option<f64> {
    values.get(i).copied().flatten().filter(|v| v.is_finite())
}

// ============================================================================
// v10 quoteSummary
// ============================================================================

#[derive(Debug, Deserialize)]
struct QuoteSummaryResponse {
    #[serde(rename = "quoteSummary")]
    quote_summary: QuoteSummaryData,
}

#[derive(Debug, Deserialize)]
struct QuoteSummaryData {
    #[serde(default)]
    result: Option<Vec<Map<String, Value>>>,
    #[serde(default)]
    error: Option<Value>,
}

fn parse_quote_summary(body: &str, symbol: &str) -> DashboardResult<Map<String, Value>> {
    let response: QuoteSummaryResponse = serde_json::from_str(body).map_err(|e| {
        DashboardError::UpstreamUnavailable(format!("failed to parse yahoo quoteSummary: {}", e))
    })?;
    check_api_error(response.quote_summary.error.as_ref(), symbol)?;

    response
        .quote_summary
        .result
        .and_then(|r| r.into_iter().next())
        .ok_or_else(|| DashboardError::NotFound(symbol.to_string()))
}

/// Merge the module objects into one flat blob. Earlier modules win on key
/// clashes; nested objects and arrays (officers, history lists) are skipped.
pub(crate) fn parse_fundamentals(body: &str, symbol: &str) -> DashboardResult<Fundamentals> {
    let modules = parse_quote_summary(body, symbol)?;
    let mut fundamentals = Fundamentals::default();
    let mut seen = std::collections::HashSet::new();

    for module in FUNDAMENTAL_MODULES {
        let Some(Value::Object(fields)) = modules.get(*module) else {
            continue;
        };
        for (key, value) in fields {
            if seen.contains(key) {
                continue;
            }
            if let Some(flat) = flatten_value(value) {
                seen.insert(key.clone());
                fundamentals.insert(key.clone(), flat);
            }
        }
    }

    Ok(fundamentals)
}

pub(crate) fn parse_statements(body: &str, symbol: &str) -> DashboardResult<FinancialStatements> {
    let modules = parse_quote_summary(body, symbol)?;

    Ok(FinancialStatements {
        income: statement(&modules, "incomeStatementHistory", "incomeStatementHistory"),
        balance_sheet: statement(&modules, "balanceSheetHistory", "balanceSheetStatements"),
        cash_flow: statement(&modules, "cashflowStatementHistory", "cashflowStatements"),
    })
}

/// One statement with rows ordered most recent period first.
fn statement(modules: &Map<String, Value>, module: &str, list: &str) -> Statement {
    let mut periods: Vec<&Map<String, Value>> = modules
        .get(module)
        .and_then(|m| m.get(list))
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(Value::as_object).collect())
        .unwrap_or_default();

    let end_date = |p: &Map<String, Value>| p.get("endDate").and_then(raw_number).unwrap_or(0.0);
    periods.sort_by(|a, b| end_date(*b).total_cmp(&end_date(*a)));

    let mut names: Vec<&String> = periods
        .iter()
        .flat_map(|p| p.keys())
        .filter(|k| k.as_str() != "endDate" && k.as_str() != "maxAge")
        .collect();
    names.sort();
    names.dedup();

    let mut out = Statement::default();
    for name in names {
        let values = periods.iter().map(|p| p.get(name).and_then(raw_number)).collect();
        out.insert_row(name.clone(), values);
    }
    out
}

// ============================================================================
// Helpers
// ============================================================================

/// Plain number, or the `raw` member of a `{raw, fmt}` wrapper.
pub(crate) fn raw_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        Value::Object(obj) => obj.get("raw").and_then(raw_number),
        _ => None,
    }
}

fn flatten_value(value: &Value) -> Option<Value> {
    match value {
        Value::Number(_) | Value::String(_) | Value::Bool(_) => Some(value.clone()),
        Value::Object(obj) => obj.get("raw").filter(|raw| raw.is_number()).cloned(),
        _ => None,
    }
}

/// Yahoo reports an unknown symbol as `{"code": "Not Found", ...}`.
fn check_api_error(error: Option<&Value>, symbol: &str) -> DashboardResult<()> {
    let Some(error) = error.filter(|e| !e.is_null()) else {
        return Ok(());
    };

    let code = error.get("code").and_then(Value::as_str).unwrap_or_default();
    let description = error
        .get("description")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| error.to_string());

    if code.eq_ignore_ascii_case("not found") {
        return Err(DashboardError::NotFound(format!("{}: {}", symbol, description)));
    }
    Err(DashboardError::UpstreamUnavailable(format!(
        "yahoo API error for {}: {}",
        symbol, description
    )))
}
