//! The rebalancer: ranking, selection, allocation, and realized outcomes.
//!
//! A [`Rebalancer`] owns the read-only [`PriceIndex`] and the mutable ROI
//! caches for one engine instance. It is single-threaded by construction;
//! use one instance per thread.

use log::{info, warn};

use crate::action::{RebalanceAction, RebalanceSummary};
use crate::allocation::{AllocationEngine, MarkedPortfolio};
use crate::error::{Error, Result};
use crate::estimator::RoiEstimator;
use crate::index::PriceIndex;
use crate::ranking::{self, Pick, RankedTicker};
use crate::strategy::ScoringStrategy;
use crate::types::{Portfolio, Position, PriceRecord};

/// Tunable inputs of a rebalance.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RebalanceParams {
    /// Trading days between this rebalance and the next
    pub holding_window: usize,
    /// Cap on candidates drawn from the universe
    pub max_holdings: usize,
    /// Allowed gap between the most and least represented sector
    pub max_sector_lead: usize,
    /// Blend factor toward the new targets, in [0, 1]
    pub adjust_by: f64,
}

impl Default for RebalanceParams {
    fn default() -> Self {
        Self {
            holding_window: 10,
            max_holdings: 50,
            max_sector_lead: 5,
            adjust_by: 1.0,
        }
    }
}

impl RebalanceParams {
    pub fn validate(&self) -> Result<()> {
        if self.holding_window == 0 {
            return Err(Error::InvalidParameter("holding_window must be >= 1".into()));
        }
        if self.max_holdings == 0 {
            return Err(Error::InvalidParameter("max_holdings must be >= 1".into()));
        }
        if !(0.0..=1.0).contains(&self.adjust_by) {
            return Err(Error::InvalidParameter(format!(
                "adjust_by must be in [0.0, 1.0], got {}",
                self.adjust_by
            )));
        }
        Ok(())
    }
}

/// Everything a rebalance produces.
#[derive(Clone, Debug)]
pub struct RebalanceOutcome {
    /// Final ranked list fed to allocation, in rank order
    pub ranked: Vec<Pick>,
    pub actions: Vec<RebalanceAction>,
    pub summary: RebalanceSummary,
    /// Successor snapshot dated `holding_window` trading days ahead
    pub portfolio: Portfolio,
}

/// Rebalancing engine over one price dataset.
#[derive(Debug, Default)]
pub struct Rebalancer {
    index: PriceIndex,
    estimator: RoiEstimator,
}

impl Rebalancer {
    pub fn new(index: PriceIndex) -> Self {
        Self {
            index,
            estimator: RoiEstimator::new(),
        }
    }

    /// Build the index from raw records.
    pub fn from_records(records: &[PriceRecord]) -> Self {
        Self::new(PriceIndex::build(records))
    }

    pub fn index(&self) -> &PriceIndex {
        &self.index
    }

    pub fn estimator(&self) -> &RoiEstimator {
        &self.estimator
    }

    /// Empty both ROI caches.
    pub fn clear_caches(&mut self) {
        self.estimator.clear();
    }

    /// Universe on `date` ranked by speculated ROI, zero scores excluded.
    pub fn rank<S: ScoringStrategy + ?Sized>(
        &mut self,
        strategy: &S,
        date: &str,
        holding_window: usize,
    ) -> Vec<RankedTicker> {
        ranking::ranked_universe(
            &self.index,
            &mut self.estimator,
            strategy,
            date,
            holding_window,
        )
    }

    /// Rebalance `portfolio` on its own date.
    ///
    /// Missing prices for held tickers, an unknown portfolio date, and too
    /// few trading days after it are fatal. Strategy failures and missing
    /// realized data are not.
    pub fn rebalance<S: ScoringStrategy + ?Sized>(
        &mut self,
        portfolio: &Portfolio,
        strategy: &S,
        params: &RebalanceParams,
    ) -> Result<RebalanceOutcome> {
        params.validate()?;
        if !strategy.is_deterministic() {
            warn!(
                "strategy {} is non-deterministic; cached scores freeze the first draw per ticker",
                strategy.id()
            );
        }

        let date = portfolio.date.as_str();
        let window = params.holding_window;
        let book = MarkedPortfolio::mark(portfolio, &self.index)?;
        info!(
            "rebalancing {} on {date}: ${:.2} total value, {} holdings",
            portfolio.id,
            book.total_value(),
            portfolio.holdings.len()
        );

        let held = ranking::ranked_holdings(
            &self.index,
            &mut self.estimator,
            strategy,
            book.tickers(),
            date,
            window,
        );
        let universe =
            ranking::ranked_universe(&self.index, &mut self.estimator, strategy, date, window);
        info!("{} tickers ranked on {date}", universe.len());

        let ranked = ranking::select_balanced(
            &self.index,
            date,
            held,
            universe,
            params.max_holdings,
            params.max_sector_lead,
        )?;

        let allocation = AllocationEngine::new(&self.index, date, params.max_holdings, params.adjust_by)?
            .plan(&ranked, &book)?;
        let mut actions = allocation.actions;

        self.attach_realized(&mut actions, date, window);

        let summary = RebalanceSummary::from_actions(&actions, allocation.remaining_cash);
        let next_date = self.index.future_date(date, window)?.to_string();
        let holdings = actions
            .iter()
            .filter(|a| a.outstanding_shares > 0)
            .map(|a| Position::new(a.ticker.clone(), a.outstanding_shares))
            .collect();

        info!(
            "{} actions, ${:.2} cash remaining, next rebalance {next_date}",
            actions.len(),
            allocation.remaining_cash
        );
        if allocation.remaining_cash < 0.0 {
            warn!(
                "{}: buy reservation overdrew cash by ${:.2}",
                portfolio.id, -allocation.remaining_cash
            );
        }

        Ok(RebalanceOutcome {
            ranked,
            actions,
            summary,
            portfolio: Portfolio {
                id: portfolio.id.clone(),
                date: next_date,
                cash: allocation.remaining_cash,
                holdings,
            },
        })
    }

    /// Attach realized ROI from the full price history (future included).
    fn attach_realized(&mut self, actions: &mut [RebalanceAction], date: &str, window: usize) {
        for action in actions.iter_mut() {
            let series = self.index.full_history(&action.ticker);
            if let Some(realized) =
                self.estimator
                    .actual_roi(&self.index, &series, &action.ticker, date, window)
            {
                action.actual_roi = Some(realized.roi);
                action.actual_net_capital =
                    Some(realized.roi * action.outstanding_shares as f64 * realized.start_price);
            }
        }
    }
}
