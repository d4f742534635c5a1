use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A position expressed as a relative weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    pub symbol: String,
    pub weight: f64,
}

impl Holding {
    pub fn new(symbol: impl Into<String>, weight: f64) -> Self {
        Self {
            symbol: symbol.into(),
            weight,
        }
    }
}

/// Holding as submitted by a client, before validation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HoldingInput {
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub weight: Option<f64>,
}

/// Per-symbol classification data looked up from the market-data gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyBasics {
    pub sector: String,
    pub pe: Option<f64>,
}

impl Default for CompanyBasics {
    fn default() -> Self {
        Self {
            sector: UNKNOWN_SECTOR.to_string(),
            pe: None,
        }
    }
}

pub const UNKNOWN_SECTOR: &str = "Unknown";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioMetrics {
    pub hhi: f64,
    pub single_stock_weight: f64,
    pub sector_concentration: f64,
    pub avg_pe: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioAnalysis {
    /// 0 (fully concentrated) to 100
    pub diversity_score: f64,
    pub risk_level: RiskLevel,
    pub main_issues: Vec<String>,
    pub suggestions: Vec<String>,
    pub metrics: PortfolioMetrics,
    pub sector_weights: BTreeMap<String, f64>,
}

/// Scored portfolio plus the normalized holdings it was computed from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticReport {
    pub analysis: PortfolioAnalysis,
    pub summary_text: String,
    pub holdings: Vec<Holding>,
}
