// =============================================================================
// Wilder Smoothing
// =============================================================================
//
// Running mean shared by RSI (gains / losses) and ATR (true ranges):
//   avg_0 = SMA of the first `period` values
//   avg_t = (avg_{t-1} * (period - 1) + x_t) / period
// =============================================================================

/// Wilder-smoothed series of `values`.
///
/// The first output is the SMA seed over `values[..period]`; every later
/// value produces one more output.  Empty when `period` is zero or exceeds
/// the input length.
pub fn wilder_series(values: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || values.len() < period {
        return Vec::new();
    }

    let n = period as f64;
    let seed = values[..period].iter().sum::<f64>() / n;

    let mut out = Vec::with_capacity(values.len() - period + 1);
    out.push(seed);
    let mut avg = seed;
    for &x in &values[period..] {
        avg = (avg * (n - 1.0) + x) / n;
        out.push(avg);
    }
    out
}
