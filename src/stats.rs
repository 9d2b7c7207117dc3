//! Sample statistics over return series.

/// Trading days per year used to annualize daily volatility.
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Arithmetic mean. NaN for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n - 1 denominator). NaN for fewer than 2 values.
pub fn sample_std(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return f64::NAN;
    }
    let m = mean(values);
    let sq_sum: f64 = values.iter().map(|v| (v - m) * (v - m)).sum();
    (sq_sum / (n - 1) as f64).sqrt()
}

/// Sample standard deviation of daily returns scaled by √252.
pub fn annualized_volatility(daily_returns: &[f64]) -> f64 {
    sample_std(daily_returns) * TRADING_DAYS_PER_YEAR.sqrt()
}
