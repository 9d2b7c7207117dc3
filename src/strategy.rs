//! Scoring strategies: forward ROI estimates from a ticker's price history.
//!
//! Ranking and allocation code depends only on [`ScoringStrategy`]; concrete
//! strategies are interchangeable.
//!
//! # Example
//!
//! ```
//! use rankbook::strategy::{MovingAverageStrategy, ScoringStrategy};
//!
//! let strategy = MovingAverageStrategy::new(3, 5).unwrap();
//! let rising: Vec<f64> = (0..10).map(|i| 100.0 + i as f64).collect();
//! let roi = strategy.speculate(&rising, "2024-01-12", 10).unwrap();
//! assert!(roi > 0.0);
//! ```

use rand::Rng;

use crate::error::{Error, Result};
use crate::indicators::{crossover_momentum, simple_returns, trailing_sma};
use crate::stats::{TRADING_DAYS_PER_YEAR, annualized_volatility};

/// Produces a speculated ROI for a forward holding window.
pub trait ScoringStrategy {
    /// Stable identity, used as part of the speculated-ROI cache key.
    fn id(&self) -> &str;

    /// Whether identical inputs always yield identical estimates.
    ///
    /// Memoization freezes the first estimate per key; for a
    /// non-deterministic strategy that is a single random draw.
    fn is_deterministic(&self) -> bool {
        true
    }

    /// Estimate the ROI of holding for `holding_window` trading days.
    ///
    /// `prices` is the ascending close series up to and including `start_date`.
    fn speculate(&self, prices: &[f64], start_date: &str, holding_window: usize) -> Result<f64>;
}

// ============================================================================
// Random baseline
// ============================================================================

/// Uniform draw from [-0.1, 0.1] on every call, ignoring the prices.
#[derive(Clone, Debug)]
pub struct RandomStrategy {
    id: String,
}

impl RandomStrategy {
    /// Half-width of the uniform draw.
    pub const SPREAD: f64 = 0.1;

    pub fn new() -> Self {
        Self {
            id: "random".to_string(),
        }
    }
}

impl Default for RandomStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl ScoringStrategy for RandomStrategy {
    fn id(&self) -> &str {
        &self.id
    }

    fn is_deterministic(&self) -> bool {
        false
    }

    fn speculate(&self, _prices: &[f64], _start_date: &str, _holding_window: usize) -> Result<f64> {
        Ok(rand::thread_rng().gen_range(-Self::SPREAD..=Self::SPREAD))
    }
}

// ============================================================================
// Moving-average momentum / volatility
// ============================================================================

/// Momentum from a short/long moving-average spread, scaled by volatility.
///
/// `roi = tanh(10 * (short_ma - long_ma) / long_ma) * annual_vol * window / 252`
///
/// The score is a ranking heuristic, not a probability.
#[derive(Clone, Debug)]
pub struct MovingAverageStrategy {
    short_window: usize,
    long_window: usize,
    id: String,
}

impl MovingAverageStrategy {
    /// Multiplier applied to the relative MA spread before `tanh`.
    pub const MOMENTUM_SCALE: f64 = 10.0;

    /// Smallest long window: volatility needs at least two returns.
    pub const MIN_LONG_WINDOW: usize = 3;

    /// Create a strategy with explicit windows. `short_window` must be non-zero
    /// and `long_window` at least [`Self::MIN_LONG_WINDOW`].
    pub fn new(short_window: usize, long_window: usize) -> Result<Self> {
        if short_window == 0 || long_window < Self::MIN_LONG_WINDOW {
            return Err(Error::InvalidParameter(format!(
                "moving average needs short > 0 and long >= {}, got short={short_window} long={long_window}",
                Self::MIN_LONG_WINDOW
            )));
        }
        Ok(Self {
            short_window,
            long_window,
            id: format!("moving_average({short_window},{long_window})"),
        })
    }

    /// Windows derived from a lookback period: `min(lookback, 20)` and `min(lookback, 50)`.
    pub fn from_lookback(lookback_period: usize) -> Result<Self> {
        Self::new(lookback_period.min(20), lookback_period.min(50))
    }

    pub fn short_window(&self) -> usize {
        self.short_window
    }

    pub fn long_window(&self) -> usize {
        self.long_window
    }
}

impl Default for MovingAverageStrategy {
    fn default() -> Self {
        Self {
            short_window: 20,
            long_window: 50,
            id: "moving_average(20,50)".to_string(),
        }
    }
}

impl ScoringStrategy for MovingAverageStrategy {
    fn id(&self) -> &str {
        &self.id
    }

    fn speculate(&self, prices: &[f64], _start_date: &str, holding_window: usize) -> Result<f64> {
        if prices.len() < self.long_window {
            return Err(Error::InsufficientData(format!(
                "moving average needs {} prices, got {}",
                self.long_window,
                prices.len()
            )));
        }

        let short_ma = trailing_sma(prices, self.short_window);
        let long_ma = trailing_sma(prices, self.long_window);
        let last = prices.len() - 1;
        let momentum = crossover_momentum(short_ma[last], long_ma[last], Self::MOMENTUM_SCALE);

        let volatility = annualized_volatility(&simple_returns(prices));
        let roi = momentum * volatility * (holding_window as f64 / TRADING_DAYS_PER_YEAR);

        if !roi.is_finite() {
            return Err(Error::StrategyFailure {
                strategy: self.id.clone(),
                reason: format!("non-finite estimate (momentum={momentum}, volatility={volatility})"),
            });
        }
        Ok(roi)
    }
}
