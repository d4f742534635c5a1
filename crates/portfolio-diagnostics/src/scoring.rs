//! Rule-based portfolio concentration and valuation scoring.
//!
//! Everything here is pure: holdings and per-symbol basics in, a
//! [`DiagnosticReport`] out.

use dashboard_core::{DashboardError, DashboardResult};
use std::collections::{BTreeMap, HashMap};

use crate::models::*;

const HIGH_SINGLE_STOCK: f64 = 0.30;
const HIGH_SECTOR: f64 = 0.70;
const HIGH_PE: f64 = 25.0;

const MEDIUM_SINGLE_STOCK: f64 = 0.20;
const MEDIUM_SECTOR: f64 = 0.50;
const MEDIUM_PE: f64 = 20.0;

/// Minimum total weight with a known P/E for the weighted average to be defined.
const MIN_PE_WEIGHT: f64 = 1e-9;

const BALANCED_ISSUE: &str = "Balanced overall structure";
const DEFAULT_SUGGESTION: &str = "Keep the current allocation and monitor company fundamentals";

/// A triggered diagnostic rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Finding {
    SectorOverConcentrated,
    SectorConcentrationElevated,
    SingleStockOverweight,
    TopHoldingElevated,
    ValuationRich,
    ValuationElevated,
}

impl Finding {
    pub fn issue(&self) -> &'static str {
        match self {
            Finding::SectorOverConcentrated => "Sector over-concentration",
            Finding::SectorConcentrationElevated => "Elevated sector concentration",
            Finding::SingleStockOverweight => "Single stock overweight",
            Finding::TopHoldingElevated => "Largest holding weight elevated",
            Finding::ValuationRich => "Overall valuation too high",
            Finding::ValuationElevated => "Valuation in an elevated range",
        }
    }

    pub fn suggestion(&self) -> &'static str {
        match self {
            Finding::SectorOverConcentrated => {
                "Add defensive sectors such as consumer staples, healthcare or utilities"
            }
            Finding::SectorConcentrationElevated => {
                "Introduce holdings from other industries to limit sector correlation"
            }
            Finding::SingleStockOverweight => "Keep any single stock below 20% of the portfolio",
            Finding::TopHoldingElevated => "Build up smaller positions to improve diversification",
            Finding::ValuationRich => "Balance with lower-valuation value or dividend names",
            Finding::ValuationElevated => {
                "Reduce growth exposure in favour of defensive or steady cash-flow names"
            }
        }
    }
}

/// Validate client-submitted holdings.
///
/// Symbols are trimmed and uppercased, blank symbols are skipped and a
/// missing weight counts as zero. Negative or non-finite weights are rejected.
pub fn prepare_holdings(inputs: &[HoldingInput]) -> DashboardResult<Vec<Holding>> {
    let mut holdings = Vec::with_capacity(inputs.len());

    for input in inputs {
        let symbol = input
            .symbol
            .as_deref()
            .map(|s| s.trim().to_uppercase())
            .unwrap_or_default();
        if symbol.is_empty() {
            continue;
        }

        let weight = input.weight.unwrap_or(0.0);
        if !weight.is_finite() || weight < 0.0 {
            return Err(DashboardError::InvalidInput(format!(
                "invalid weight {} for {}",
                weight, symbol
            )));
        }

        holdings.push(Holding::new(symbol, weight));
    }

    Ok(holdings)
}

/// Scale weights to sum to one; all-zero weights become equal weights.
/// Duplicate symbols are kept as separate entries.
pub fn normalize_weights(holdings: &[Holding]) -> Vec<Holding> {
    if holdings.is_empty() {
        return Vec::new();
    }

    let max = holdings.iter().map(|h| h.weight).fold(0.0, f64::max);
    if max <= 0.0 {
        let equal = 1.0 / holdings.len() as f64;
        return holdings
            .iter()
            .map(|h| Holding::new(h.symbol.clone(), equal))
            .collect();
    }

    // Scaling by the largest weight first keeps the sum finite.
    let scaled: Vec<f64> = holdings.iter().map(|h| h.weight / max).collect();
    let total: f64 = scaled.iter().sum();

    holdings
        .iter()
        .zip(scaled)
        .map(|(h, w)| Holding::new(h.symbol.clone(), w / total))
        .collect()
}

/// Herfindahl-Hirschman index of the weights.
pub fn hhi(weights: &[f64]) -> f64 {
    weights.iter().map(|w| w * w).sum()
}

pub fn diversity_score(hhi: f64) -> f64 {
    round_to((1.0 - hhi).clamp(0.0, 1.0) * 100.0, 1)
}

pub fn sector_weights(
    holdings: &[Holding],
    basics: &HashMap<String, CompanyBasics>,
) -> BTreeMap<String, f64> {
    let mut weights = BTreeMap::new();
    for h in holdings {
        let sector = basics
            .get(&h.symbol)
            .map(|b| b.sector.as_str())
            .filter(|s| !s.is_empty())
            .unwrap_or(UNKNOWN_SECTOR);
        *weights.entry(sector.to_string()).or_insert(0.0) += h.weight;
    }
    weights
}

/// Largest sector weight, rounded to 4 decimals.
pub fn sector_concentration(sector_weights: &BTreeMap<String, f64>) -> f64 {
    let max = sector_weights.values().copied().fold(0.0, f64::max);
    round_to(max, 4)
}

/// Weighted mean P/E over holdings with a known finite P/E, rounded to 2 decimals.
pub fn weighted_avg_pe(
    holdings: &[Holding],
    basics: &HashMap<String, CompanyBasics>,
) -> Option<f64> {
    let (num, den) = holdings
        .iter()
        .filter_map(|h| {
            let pe = basics.get(&h.symbol)?.pe.filter(|pe| pe.is_finite())?;
            Some((h.weight * pe, h.weight))
        })
        .fold((0.0, 0.0), |(n, d), (wp, w)| (n + wp, d + w));

    if den <= MIN_PE_WEIGHT {
        return None;
    }
    Some(round_to(num / den, 2))
}

/// First matching tier wins. A missing P/E compares as zero.
pub fn assess_risk(single_stock_weight: f64, sector_conc: f64, avg_pe: Option<f64>) -> RiskLevel {
    let pe = avg_pe.unwrap_or(0.0);

    if single_stock_weight > HIGH_SINGLE_STOCK || sector_conc > HIGH_SECTOR || pe > HIGH_PE {
        return RiskLevel::High;
    }
    if single_stock_weight > MEDIUM_SINGLE_STOCK || sector_conc > MEDIUM_SECTOR || pe > MEDIUM_PE {
        return RiskLevel::Medium;
    }
    RiskLevel::Low
}

/// Sector, single-stock and valuation checks, in that order, at most one tier each.
pub fn findings(single_stock_weight: f64, sector_conc: f64, avg_pe: Option<f64>) -> Vec<Finding> {
    let pe = avg_pe.unwrap_or(0.0);
    let mut out = Vec::new();

    if sector_conc > HIGH_SECTOR {
        out.push(Finding::SectorOverConcentrated);
    } else if sector_conc > MEDIUM_SECTOR {
        out.push(Finding::SectorConcentrationElevated);
    }

    if single_stock_weight > HIGH_SINGLE_STOCK {
        out.push(Finding::SingleStockOverweight);
    } else if single_stock_weight > MEDIUM_SINGLE_STOCK {
        out.push(Finding::TopHoldingElevated);
    }

    if pe > HIGH_PE {
        out.push(Finding::ValuationRich);
    } else if pe > MEDIUM_PE {
        out.push(Finding::ValuationElevated);
    }

    out
}

pub fn summary_text(analysis: &PortfolioAnalysis) -> String {
    let issues = if analysis.main_issues.is_empty() {
        BALANCED_ISSUE.to_string()
    } else {
        analysis.main_issues.join(", ")
    };
    let suggestions = if analysis.suggestions.is_empty() {
        DEFAULT_SUGGESTION.to_string()
    } else {
        analysis.suggestions.join("; ")
    };
    let avg_pe = analysis
        .metrics
        .avg_pe
        .map(|pe| format!("{:?}", pe))
        .unwrap_or_else(|| "-".to_string());

    format!(
        "Diversity score {:.1}, risk level {}; largest single-stock weight {:.1}%, sector concentration {:.1}%, weighted average P/E {}. Main issues: {}. Suggestions: {}.",
        analysis.diversity_score,
        analysis.risk_level.as_str(),
        analysis.metrics.single_stock_weight * 100.0,
        analysis.metrics.sector_concentration * 100.0,
        avg_pe,
        issues,
        suggestions
    )
}

/// Score a portfolio. `basics` is keyed by uppercase symbol; symbols
/// without an entry are treated as sector "Unknown" with no P/E.
pub fn diagnose(holdings: &[Holding], basics: &HashMap<String, CompanyBasics>) -> DiagnosticReport {
    let normalized = normalize_weights(holdings);
    let weights: Vec<f64> = normalized.iter().map(|h| h.weight).collect();

    let hhi = hhi(&weights);
    let diversity_score = diversity_score(hhi);
    let single_stock_weight = weights.iter().copied().fold(0.0, f64::max);

    let sector_weights = sector_weights(&normalized, basics);
    let sector_conc = sector_concentration(&sector_weights);
    let avg_pe = weighted_avg_pe(&normalized, basics);
    let risk_level = assess_risk(single_stock_weight, sector_conc, avg_pe);

    let triggered = findings(single_stock_weight, sector_conc, avg_pe);
    tracing::debug!(
        "Portfolio of {} holdings: hhi={:.4} sector_conc={:.4} avg_pe={:?} risk={}",
        normalized.len(),
        hhi,
        sector_conc,
        avg_pe,
        risk_level.as_str()
    );

    let analysis = PortfolioAnalysis {
        diversity_score,
        risk_level,
        main_issues: triggered.iter().map(|f| f.issue().to_string()).collect(),
        suggestions: triggered.iter().map(|f| f.suggestion().to_string()).collect(),
        metrics: PortfolioMetrics {
            hhi: round_to(hhi, 4),
            single_stock_weight: round_to(single_stock_weight, 4),
            sector_concentration: sector_conc,
            avg_pe,
        },
        sector_weights,
    };
    let summary_text = summary_text(&analysis);

    DiagnosticReport {
        analysis,
        summary_text,
        holdings: normalized,
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
