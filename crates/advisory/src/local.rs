use crate::MarketMetrics;

const MAX_CHARS: usize = 160;

/// Deterministic rule-based advisory paragraph, used whenever the
/// remote provider is unavailable.
pub fn local_analysis(metrics: &MarketMetrics) -> String {
    let mut parts = Vec::new();

    let mut technical = Vec::new();
    if let Some(rsi) = metrics.rsi14 {
        technical.push(if rsi <= 30.0 {
            "RSI low, oversold"
        } else if rsi >= 70.0 {
            "RSI high, overbought risk"
        } else {
            "RSI neutral"
        });
    }
    if let Some(change) = metrics.change_percent {
        if change >= 2.0 {
            technical.push("strong short-term upside momentum");
        } else if change <= -2.0 {
            technical.push("notable short-term pullback pressure");
        }
    }
    if !technical.is_empty() {
        parts.push(format!("Technical: {}", technical.join(", ")));
    }

    let mut risk = Vec::new();
    if let Some(pe) = metrics.pe_ratio {
        if pe >= 30.0 {
            risk.push("rich valuation may amplify swings");
        } else if pe <= 10.0 {
            risk.push("cheap valuation but verify fundamentals");
        }
    }
    risk.push("mind event risk and market conditions");
    parts.push(format!("Risk: {}", risk.join(", ")));

    let action = match metrics.rsi14 {
        Some(rsi) if rsi <= 30.0 => "small starter position, scale in gradually",
        Some(rsi) if rsi >= 70.0 => "trim cautiously and wait for a pullback",
        _ => "wait and watch support and volume",
    };
    parts.push(format!("Action: {}", action));

    parts.join("; ").chars().take(MAX_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics(change: Option<f64>, pe: Option<f64>, rsi: Option<f64>) -> MarketMetrics {
        MarketMetrics {
            current_price: Some(100.0),
            change_percent: change,
            pe_ratio: pe,
            rsi14: rsi,
        }
    }

    #[test]
    fn test_neutral_without_metrics() {
        let text = local_analysis(&metrics(None, None, None));
        assert_eq!(
            text,
            "Risk: mind event risk and market conditions; Action: wait and watch support and volume"
        );
    }

    #[test]
    fn test_oversold_rules() {
        let text = local_analysis(&metrics(Some(-3.0), Some(8.0), Some(25.0)));
        assert!(text.starts_with("Technical: RSI low, oversold, notable short-term pullback pressure"));
        assert!(text.contains("cheap valuation"));
    }

    #[test]
    fn test_overbought_action() {
        let text = local_analysis(&metrics(Some(0.5), Some(20.0), Some(70.0)));
        assert!(text.contains("RSI high"));
        assert!(text.contains("Action: trim cautiously"));
        assert!(!text.contains("momentum"));
    }

    #[test]
    fn test_truncated_to_limit() {
        let text = local_analysis(&metrics(Some(5.0), Some(45.0), Some(80.0)));
        assert_eq!(text.chars().count(), MAX_CHARS);
    }
}
