//! Market universe
//!
//! The fixed symbol sets the dashboard tracks: the hot list and the index /
//! sector-ETF table. Loaded once at startup and shared read-only.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::{DashboardError, DashboardResult};

/// An index or ETF proxy with optional sample constituents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexDefinition {
    pub symbol: String,
    pub name: String,
    pub category: String,
    #[serde(default)]
    pub constituents: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketUniverse {
    pub hot_list: Vec<String>,
    pub indices: Vec<IndexDefinition>,
}

const HOT_LIST: &[&str] = &[
    "AAPL", "MSFT", "NVDA", "AMZN", "META", "TSLA", "GOOG", "NFLX", "AMD", "AVGO",
];

const GLOBAL_INDICES: &[(&str, &str)] = &[
    ("^GSPC", "S&P 500 Index"),
    ("^DJI", "Dow Jones Industrial Average"),
    ("^NDX", "Nasdaq 100 Index"),
    ("^FTSE", "FTSE 100 Index"),
    ("^GDAXI", "DAX Index"),
    ("^N225", "Nikkei 225 Index"),
    ("^HSI", "Hang Seng Index"),
];

const SECTOR_ETFS: &[(&str, &str, &[&str])] = &[
    ("XLK", "Technology Sector ETF", &["AAPL", "MSFT", "NVDA", "AVGO", "ADBE", "AMD", "CRM"]),
    ("XLF", "Financials Sector ETF", &["JPM", "BAC", "WFC", "GS", "MS", "SCHW", "C"]),
    ("XLE", "Energy Sector ETF", &["XOM", "CVX", "COP", "SLB", "EOG", "PSX", "MPC"]),
    ("XLV", "Health Care Sector ETF", &["UNH", "JNJ", "LLY", "ABBV", "MRK", "PFE", "TMO"]),
    ("XLY", "Consumer Discretionary Sector ETF", &["AMZN", "TSLA", "MCD", "NKE", "SBUX", "BKNG"]),
    ("XLP", "Consumer Staples Sector ETF", &["PG", "KO", "PEP", "WMT", "COST", "MDLZ"]),
    ("XLU", "Utilities Sector ETF", &["NEE", "DUK", "SO", "D", "AEP", "EXC"]),
    ("XLI", "Industrials Sector ETF", &["HON", "UNP", "RTX", "CAT", "LMT", "GE"]),
    ("IYR", "Real Estate Sector ETF", &["AMT", "PLD", "SPG", "EQIX", "WELL", "O"]),
];

impl Default for MarketUniverse {
    fn default() -> Self {
        Self::builtin()
    }
}

impl MarketUniverse {
    pub fn builtin() -> Self {
        let global = GLOBAL_INDICES.iter().map(|(symbol, name)| IndexDefinition {
            symbol: symbol.to_string(),
            name: format!("{} ({})", name, symbol),
            category: "global".to_string(),
            constituents: Vec::new(),
        });

        let sectors = SECTOR_ETFS.iter().map(|(symbol, name, members)| IndexDefinition {
            symbol: symbol.to_string(),
            name: format!("{} ({})", name, symbol),
            category: "sector_etf".to_string(),
            constituents: members.iter().map(|s| s.to_string()).collect(),
        });

        Self {
            hot_list: HOT_LIST.iter().map(|s| s.to_string()).collect(),
            indices: global.chain(sectors).collect(),
        }
    }

    pub fn from_json_str(raw: &str) -> DashboardResult<Self> {
        let mut universe: MarketUniverse = serde_json::from_str(raw)
            .map_err(|e| DashboardError::InvalidInput(format!("market universe: {}", e)))?;

        for s in universe.hot_list.iter_mut() {
            *s = s.trim().to_uppercase();
        }
        for idx in universe.indices.iter_mut() {
            idx.symbol = idx.symbol.trim().to_uppercase();
        }
        Ok(universe)
    }

    /// Load from a JSON file when `path` is given, otherwise use the built-in table.
    pub fn load(path: Option<&Path>) -> DashboardResult<Self> {
        let Some(path) = path else {
            return Ok(Self::builtin());
        };

        let raw = std::fs::read_to_string(path).map_err(|e| {
            DashboardError::InvalidInput(format!("cannot read {}: {}", path.display(), e))
        })?;
        let universe = Self::from_json_str(&raw)?;
        tracing::info!(
            "Loaded market universe from {} ({} hot symbols, {} indices)",
            path.display(),
            universe.hot_list.len(),
            universe.indices.len()
        );
        Ok(universe)
    }

    pub fn find_index(&self, symbol: &str) -> Option<&IndexDefinition> {
        let wanted = symbol.trim().to_uppercase();
        self.indices.iter().find(|i| i.symbol == wanted)
    }

    /// Indices in table order, optionally restricted to one category.
    pub fn indices_in<'a>(&'a self, category: Option<&'a str>) -> impl Iterator<Item = &'a IndexDefinition> + 'a {
        self.indices
            .iter()
            .filter(move |i| category.map_or(true, |c| c.is_empty() || i.category == c))
    }
}
