//! Price-series indicators used by the scoring strategies.
//!
//! # Conventions
//!
//! - Input slices are `&[f64]` closing prices, oldest first.
//! - Moving averages are **clipped** at the start of the series: the first
//!   `period - 1` outputs average however many points are available, so the
//!   output has the same length as the input and contains no NaN.

// ---------------------------------------------------------------------------
// Moving averages
// ---------------------------------------------------------------------------

/// Trailing simple moving average, clipped at the series start.
///
/// Uses a running window sum (O(N)) instead of re-summing each window.
///
/// # Example
///
/// ```
/// use rankbook::indicators::trailing_sma;
///
/// let ma = trailing_sma(&[2.0, 4.0, 6.0, 8.0], 2);
/// assert_eq!(ma, vec![2.0, 3.0, 5.0, 7.0]);
/// ```
pub fn trailing_sma(values: &[f64], period: usize) -> Vec<f64> {
    let mut out = Vec::with_capacity(values.len());
    if period == 0 {
        return out;
    }

    let mut window_sum = 0.0_f64;
    for (i, &v) in values.iter().enumerate() {
        window_sum += v;
        if i >= period {
            window_sum -= values[i - period];
        }
        let count = (i + 1).min(period);
        out.push(window_sum / count as f64);
    }
    out
}

/// Moving-average crossover momentum bounded to (-1, 1).
///
/// `tanh(scale * (short - long) / long)`. The scale sharpens sensitivity to
/// small spreads before `tanh` saturates.
pub fn crossover_momentum(short_ma: f64, long_ma: f64, scale: f64) -> f64 {
    ((short_ma - long_ma) / long_ma * scale).tanh()
}

// ---------------------------------------------------------------------------
// Returns
// ---------------------------------------------------------------------------

/// Simple period-over-period returns. Output has `len - 1` elements.
pub fn simple_returns(values: &[f64]) -> Vec<f64> {
    values.windows(2).map(|w| (w[1] - w[0]) / w[0]).collect()
}
