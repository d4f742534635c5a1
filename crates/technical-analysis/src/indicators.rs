use dashboard_core::{
    BollingerSeries, BollingerSnapshot, DashboardError, DashboardResult, IndicatorSeries,
    IndicatorSnapshot, MacdSeries, MacdSnapshot,
};
use serde::{Deserialize, Serialize};

use crate::series::{diff, ewm_mean, map_present, rolling_mean, rolling_std, zip_with};

/// Simple Moving Average
pub fn sma(close: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    rolling_mean(close, window)
}

/// Relative Strength Index over simple rolling averages of gains and losses.
///
/// A position whose average loss is zero is `None` rather than 100.
pub fn rsi(close: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    let delta = diff(close);
    let gain = map_present(&delta, |d| d.max(0.0));
    let loss = map_present(&delta, |d| (-d).max(0.0));

    let avg_gain = rolling_mean(&gain, period);
    let avg_loss = rolling_mean(&loss, period);

    zip_with(&avg_gain, &avg_loss, |g, l| {
        if l == 0.0 {
            return None;
        }
        let rs = g / l;
        Some(100.0 - 100.0 / (1.0 + rs))
    })
}

/// MACD (Moving Average Convergence Divergence) on unadjusted EWMs.
pub fn macd(
    close: &[Option<f64>],
    fast_period: usize,
    slow_period: usize,
    signal_period: usize,
) -> MacdSeries {
    let ema_fast = ewm_mean(close, fast_period);
    let ema_slow = ewm_mean(close, slow_period);

    let macd_line = zip_with(&ema_fast, &ema_slow, |f, s| Some(f - s));
    let signal = ewm_mean(&macd_line, signal_period);
    let hist = zip_with(&macd_line, &signal, |m, s| Some(m - s));

    MacdSeries {
        macd: macd_line,
        signal,
        hist,
    }
}

/// Bollinger Bands: SMA +/- `num_std` sample standard deviations.
pub fn bollinger_bands(close: &[Option<f64>], period: usize, num_std: f64) -> BollingerSeries {
    let middle = rolling_mean(close, period);
    let std = rolling_std(close, period);

    let upper = zip_with(&middle, &std, |m, s| Some(m + num_std * s));
    let lower = zip_with(&middle, &std, |m, s| Some(m - num_std * s));

    BollingerSeries {
        upper,
        middle,
        lower,
    }
}

/// Window lengths used by the dashboard indicators.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndicatorParams {
    pub sma_short: usize,
    pub sma_long: usize,
    pub rsi_period: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub bb_period: usize,
    pub bb_std: f64,
}

impl Default for IndicatorParams {
    fn default() -> Self {
        Self {
            sma_short: 20,
            sma_long: 50,
            rsi_period: 14,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            bb_period: 20,
            bb_std: 2.0,
        }
    }
}

/// Computes the dashboard indicator set from a close-price sequence.
///
/// Never fails: an indicator that cannot be computed (too little history,
/// non-finite arithmetic) degrades to `None` and is logged.
#[derive(Debug, Clone, Default)]
pub struct IndicatorEngine {
    params: IndicatorParams,
}

impl IndicatorEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_params(params: IndicatorParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &IndicatorParams {
        &self.params
    }

    /// Full aligned series; every vector has the same length as `close`.
    pub fn series(&self, close: &[Option<f64>]) -> IndicatorSeries {
        let p = &self.params;
        IndicatorSeries {
            sma20: sma(close, p.sma_short),
            sma50: sma(close, p.sma_long),
            bbands: bollinger_bands(close, p.bb_period, p.bb_std),
            rsi14: rsi(close, p.rsi_period),
            macd: macd(close, p.macd_fast, p.macd_slow, p.macd_signal),
        }
    }

    /// Latest value of each indicator.
    pub fn snapshot(&self, close: &[Option<f64>]) -> IndicatorSnapshot {
        if close.is_empty() {
            return IndicatorSnapshot::default();
        }

        let p = &self.params;
        let s = self.series(close);

        let mut bbands = BollingerSnapshot {
            upper: degrade(latest(&s.bbands.upper, p.bb_period, "bbands upper")),
            middle: degrade(latest(&s.bbands.middle, p.bb_period, "bbands middle")),
            lower: degrade(latest(&s.bbands.lower, p.bb_period, "bbands lower")),
        };
        // The bands are reported whole or not at all.
        if bbands.upper.is_none() || bbands.middle.is_none() || bbands.lower.is_none() {
            bbands = BollingerSnapshot::default();
        }

        IndicatorSnapshot {
            sma20: degrade(latest(&s.sma20, p.sma_short, "sma20")),
            sma50: degrade(latest(&s.sma50, p.sma_long, "sma50")),
            rsi14: degrade(latest(&s.rsi14, p.rsi_period + 1, "rsi14")),
            macd: MacdSnapshot {
                macd: degrade(latest(&s.macd.macd, 1, "macd")),
                signal: degrade(latest(&s.macd.signal, 1, "macd signal")),
                hist: degrade(latest(&s.macd.hist, 1, "macd hist")),
            },
            bbands,
        }
    }
}

/// Last value of an indicator series, requiring at least `required` input points.
pub fn latest(values: &[Option<f64>], required: usize, name: &str) -> DashboardResult<f64> {
    if values.len() < required {
        return Err(DashboardError::InsufficientHistory(format!(
            "{} needs {} points, have {}",
            name,
            required,
            values.len()
        )));
    }

    match values.last().copied().flatten() {
        Some(v) if v.is_finite() => Ok(v),
        Some(v) => Err(DashboardError::ComputationFailure(format!("{} produced {}", name, v))),
        None => Err(DashboardError::ComputationFailure(format!(
            "{} undefined at latest point",
            name
        ))),
    }
}

fn degrade(result: DashboardResult<f64>) -> Option<f64> {
    match result {
        Ok(v) => Some(v),
        Err(e) => {
            tracing::debug!("Indicator unavailable: {}", e);
            None
        }
    }
}
