//! Rolling-window and exponentially weighted operations over ordered
//! sequences with gaps. A gap (`None`) makes every window containing it
//! `None`; nothing looks ahead of the current position.

/// Mean of the trailing `window` values, `None` until the window is full and gap-free.
pub fn rolling_mean(series: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    rolling(series, window, |w| Some(w.iter().sum::<f64>() / w.len() as f64))
}

/// Sample standard deviation (divides by `window - 1`) of the trailing window.
pub fn rolling_std(series: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    rolling(series, window, |w| {
        if w.len() < 2 {
            return None;
        }
        let n = w.len() as f64;
        let mean = w.iter().sum::<f64>() / n;
        let variance = w.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1.0);
        Some(variance.sqrt())
    })
}

fn rolling<F>(series: &[Option<f64>], window: usize, f: F) -> Vec<Option<f64>>
where
    F: Fn(&[f64]) -> Option<f64>,
{
    let mut out = vec![None; series.len()];
    if window == 0 || series.len() < window {
        return out;
    }

    for i in window - 1..series.len() {
        let values: Option<Vec<f64>> = series[i + 1 - window..=i].iter().copied().collect();
        out[i] = values.and_then(|w| f(&w)).filter(|v| v.is_finite());
    }
    out
}

/// Unadjusted exponentially weighted mean with `alpha = 2 / (span + 1)`.
///
/// Seeds with the first present value; a gap carries the previous mean forward,
/// so no `None` appears after the first present value.
pub fn ewm_mean(series: &[Option<f64>], span: usize) -> Vec<Option<f64>> {
    if span == 0 {
        return vec![None; series.len()];
    }

    let alpha = 2.0 / (span as f64 + 1.0);
    let mut prev: Option<f64> = None;

    series
        .iter()
        .map(|v| {
            prev = match (prev, v.filter(|x| x.is_finite())) {
                (None, Some(x)) => Some(x),
                (Some(p), Some(x)) => Some(alpha * x + (1.0 - alpha) * p),
                (p, None) => p,
            };
            prev
        })
        .collect()
}

/// First difference, `None` at index 0 and wherever either neighbour is missing.
pub fn diff(series: &[Option<f64>]) -> Vec<Option<f64>> {
    (0..series.len())
        .map(|i| {
            if i == 0 {
                return None;
            }
            match (series[i], series[i - 1]) {
                (Some(cur), Some(prev)) => Some(cur - prev),
                _ => None,
            }
        })
        .collect()
}

/// Apply `f` to every present value.
pub fn map_present<F>(series: &[Option<f64>], f: F) -> Vec<Option<f64>>
where
    F: Fn(f64) -> f64,
{
    series.iter().map(|v| v.map(&f)).collect()
}

/// Combine two aligned series; positions where either side is missing stay `None`.
pub fn zip_with<F>(a: &[Option<f64>], b: &[Option<f64>], f: F) -> Vec<Option<f64>>
where
    F: Fn(f64, f64) -> Option<f64>,
{
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| match (x, y) {
            (Some(x), Some(y)) => f(*x, *y).filter(|v| v.is_finite()),
            _ => None,
        })
        .collect()
}
