pub mod error;
pub mod local;
pub mod provider;

pub use error::{AdvisoryError, AdvisoryResult};
pub use local::local_analysis;
pub use provider::{AdvisoryProvider, ChatClient, ChatConfig};

use serde::{Deserialize, Deserializer, Serialize};
use std::sync::Arc;

const SYSTEM_PROMPT: &str =
    "You are a professional financial analyst who explains complex ideas in plain language.";

/// Metrics the front end sends along with an advisory request.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketMetrics {
    #[serde(default, deserialize_with = "lenient_number")]
    pub current_price: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub change_percent: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub pe_ratio: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub rsi14: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdvisoryRequest {
    #[serde(default)]
    pub symbol: String,
    #[serde(default)]
    pub financial_data: MarketMetrics,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AdvisorySource {
    Llm,
    Local,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AdvisoryWarning {
    InsufficientBalance,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdvisoryResponse {
    pub symbol: String,
    pub analysis: String,
    pub source: AdvisorySource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<AdvisoryWarning>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Produces advisory text from the configured provider, falling back to
/// [`local_analysis`] on any failure.
#[derive(Clone, Default)]
pub struct Advisor {
    provider: Option<Arc<dyn AdvisoryProvider>>,
}

impl Advisor {
    pub fn new(provider: Option<Arc<dyn AdvisoryProvider>>) -> Self {
        Self { provider }
    }

    /// Local rules only.
    pub fn local() -> Self {
        Self { provider: None }
    }

    pub fn is_remote(&self) -> bool {
        self.provider.is_some()
    }

    pub async fn advise(&self, request: &AdvisoryRequest) -> AdvisoryResponse {
        let symbol = request.symbol.trim().to_uppercase();
        let metrics = &request.financial_data;

        let result = match &self.provider {
            Some(provider) => provider.complete(SYSTEM_PROMPT, &prompt(&symbol, metrics)).await,
            None => Err(AdvisoryError::NotConfigured),
        };

        match result {
            Ok(analysis) => AdvisoryResponse {
                symbol,
                analysis,
                source: AdvisorySource::Llm,
                warning: None,
                error: None,
            },
            Err(e) if e.is_insufficient_balance() => {
                tracing::warn!("Advisory provider out of balance, using local rules for {}", symbol);
                AdvisoryResponse {
                    analysis: local_analysis(metrics),
                    symbol,
                    source: AdvisorySource::Local,
                    warning: Some(AdvisoryWarning::InsufficientBalance),
                    error: None,
                }
            }
            Err(e) => {
                tracing::warn!("Advisory provider failed for {}: {}", symbol, e);
                AdvisoryResponse {
                    analysis: local_analysis(metrics),
                    symbol,
                    source: AdvisorySource::Local,
                    warning: Some(AdvisoryWarning::Fallback),
                    error: Some(e.to_string()),
                }
            }
        }
    }
}

fn prompt(symbol: &str, metrics: &MarketMetrics) -> String {
    let show = |v: Option<f64>| v.map_or_else(|| "N/A".to_string(), |v| v.to_string());
    format!(
        "As an investment adviser, analyse {symbol}:\n\n\
         Current price: ${price}\n\
         Change: {change}%\n\
         P/E: {pe}\n\
         RSI: {rsi}\n\n\
         Give brief investment advice covering:\n\
         1. Technical picture\n\
         2. Risk warnings\n\
         3. Suggested action\n\n\
         Keep it professional but accessible, under 150 words.",
        symbol = symbol,
        price = show(metrics.current_price),
        change = show(metrics.change_percent),
        pe = show(metrics.pe_ratio),
        rsi = show(metrics.rsi14),
    )
}

/// Accepts a number, a numeric string or null. Anything else reads as missing.
fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) => n.as_f64(),
        Some(serde_json::Value::String(s)) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        _ => None,
    })
}
