//! Memoized speculated and realized ROI.
//!
//! [`RoiEstimator`] owns both caches for one engine instance. Nothing here is
//! process-global; call [`RoiEstimator::clear`] between independent runs.
//!
//! Speculated ROI never fails: a strategy error degrades to
//! [`RoiScore::Failed`], whose [`value`](RoiScore::value) is `0.0`.
//! Realized ROI is best-effort: any missing price or future date yields `None`.

use log::{debug, warn};
use rustc_hash::FxHashMap;

use crate::index::PriceIndex;
use crate::strategy::ScoringStrategy;

/// Outcome of a speculated-ROI request.
#[derive(Clone, Debug, PartialEq)]
pub enum RoiScore {
    /// The strategy produced an estimate (which may itself be `0.0`).
    Scored(f64),
    /// The strategy failed; ranking treats this as `0.0`.
    Failed { reason: String },
}

impl RoiScore {
    /// Numeric score, with failures mapped to `0.0`.
    #[inline]
    pub fn value(&self) -> f64 {
        match self {
            RoiScore::Scored(v) => *v,
            RoiScore::Failed { .. } => 0.0,
        }
    }

    #[inline]
    pub fn is_failed(&self) -> bool {
        matches!(self, RoiScore::Failed { .. })
    }
}

/// Realized price move over a holding window.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RealizedRoi {
    pub start_price: f64,
    pub end_price: f64,
    /// `(end_price - start_price) / start_price`
    pub roi: f64,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct SpeculationKey {
    ticker: String,
    date: String,
    holding_window: usize,
    strategy: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct RealizationKey {
    ticker: String,
    date: String,
    holding_window: usize,
}

/// ROI lookups with per-instance memoization.
#[derive(Debug, Default)]
pub struct RoiEstimator {
    speculated: FxHashMap<SpeculationKey, RoiScore>,
    realized: FxHashMap<RealizationKey, RealizedRoi>,
}

impl RoiEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Speculated ROI of `ticker` on `date`, keyed by the strategy's [`id`](ScoringStrategy::id).
    ///
    /// A cache hit returns the stored outcome without invoking the strategy.
    /// Failures are logged and cached as [`RoiScore::Failed`].
    pub fn speculated_roi<S: ScoringStrategy + ?Sized>(
        &mut self,
        series: &[f64],
        strategy: &S,
        ticker: &str,
        date: &str,
        holding_window: usize,
    ) -> RoiScore {
        let key = SpeculationKey {
            ticker: ticker.to_string(),
            date: date.to_string(),
            holding_window,
            strategy: strategy.id().to_string(),
        };

        if let Some(score) = self.speculated.get(&key) {
            debug!("speculated ROI cache hit: {ticker} {date} w={holding_window}");
            return score.clone();
        }

        let score = match strategy.speculate(series, date, holding_window) {
            Ok(roi) => RoiScore::Scored(roi),
            Err(e) => {
                warn!("error scoring {ticker} on {date} with {}: {e}", strategy.id());
                RoiScore::Failed {
                    reason: e.to_string(),
                }
            }
        };
        self.speculated.insert(key, score.clone());
        score
    }

    /// Realized ROI of `ticker` from `start_date` over `holding_window` trading days.
    ///
    /// Returns `None` when `series` is empty or any lookup fails; only
    /// successful results are cached.
    pub fn actual_roi(
        &mut self,
        index: &PriceIndex,
        series: &[f64],
        ticker: &str,
        start_date: &str,
        holding_window: usize,
    ) -> Option<RealizedRoi> {
        let key = RealizationKey {
            ticker: ticker.to_string(),
            date: start_date.to_string(),
            holding_window,
        };
        if let Some(realized) = self.realized.get(&key) {
            return Some(*realized);
        }
        if series.is_empty() {
            return None;
        }

        let lookup = || -> crate::Result<RealizedRoi> {
            let start_price = index.price_on(ticker, start_date)?;
            let end_date = index.future_date(start_date, holding_window)?;
            let end_price = index.price_on(ticker, end_date)?;
            Ok(RealizedRoi {
                start_price,
                end_price,
                roi: (end_price - start_price) / start_price,
            })
        };

        match lookup() {
            Ok(realized) => {
                self.realized.insert(key, realized);
                Some(realized)
            }
            Err(e) => {
                debug!("no realized ROI for {ticker} from {start_date}: {e}");
                None
            }
        }
    }

    /// Drop every cached value.
    pub fn clear(&mut self) {
        self.speculated.clear();
        self.realized.clear();
    }

    /// Number of cached speculated scores.
    pub fn speculated_len(&self) -> usize {
        self.speculated.len()
    }

    /// Number of cached realized outcomes.
    pub fn realized_len(&self) -> usize {
        self.realized.len()
    }
}
