//! # rankbook
//!
//! Sector-balanced, cash-constrained portfolio rebalancing driven by pluggable
//! ROI scoring strategies, replayable over historical daily prices.
//!
//! ## Features
//!
//! - **Pluggable scoring**: any [`ScoringStrategy`] estimates ROI from a price history
//! - **Memoized estimates**: speculated and realized ROI cached per engine instance
//! - **Sector fairness**: no sector pulls more than `max_sector_lead` picks ahead
//! - **Triangular weighting**: higher-ranked picks receive proportionally more capital
//! - **Whole shares**: share counts are floored; leftover cash buys one extra share per pick
//! - **Realized outcomes**: actions are annotated with the actual ROI over the holding window
//!
//! ## Quick Start
//!
//! ```
//! use rankbook::{MovingAverageStrategy, Portfolio, PriceRecord, RebalanceParams, Rebalancer};
//!
//! let mut records = Vec::new();
//! for day in 1..=30 {
//!     let date = format!("2024-{day:03}");
//!     records.push(PriceRecord::close_only("AAPL", "Tech", &date, 100.0 + day as f64));
//!     records.push(PriceRecord::close_only("XOM", "Energy", &date, 80.0 - day as f64 * 0.5));
//! }
//!
//! let mut engine = Rebalancer::from_records(&records);
//! let strategy = MovingAverageStrategy::new(5, 10).unwrap();
//! let portfolio = Portfolio::with_cash("demo", "2024-020", 10_000.0);
//! let params = RebalanceParams { holding_window: 5, ..Default::default() };
//!
//! let outcome = engine.rebalance(&portfolio, &strategy, &params).unwrap();
//! assert_eq!(outcome.ranked[0].ticker, "AAPL");
//! assert_eq!(outcome.portfolio.date, "2024-025");
//! assert!((outcome.summary.total_portfolio_value - 10_000.0).abs() < 1e-6);
//! ```
//!
//! ## Chaining Rebalances
//!
//! The successor snapshot is dated `holding_window` trading days ahead and
//! can be fed straight back in:
//!
//! ```
//! use rankbook::{MovingAverageStrategy, Portfolio, PriceRecord, RebalanceParams, Rebalancer};
//!
//! let records: Vec<_> = (1..=40)
//!     .map(|d| PriceRecord::close_only("AAPL", "Tech", &format!("2024-{d:03}"), 50.0 + d as f64))
//!     .collect();
//! let mut engine = Rebalancer::from_records(&records);
//! let strategy = MovingAverageStrategy::new(3, 6).unwrap();
//! let params = RebalanceParams { holding_window: 5, ..Default::default() };
//!
//! let mut portfolio = Portfolio::with_cash("demo", "2024-010", 1_000.0);
//! for _ in 0..3 {
//!     portfolio = engine.rebalance(&portfolio, &strategy, &params).unwrap().portfolio;
//! }
//! assert_eq!(portfolio.date, "2024-025");
//! ```

mod action;
pub mod allocation;
mod engine;
mod error;
mod estimator;
mod index;
pub mod indicators;
#[cfg(feature = "persistence")]
pub mod persistence;
pub mod ranking;
pub mod stats;
pub mod strategy;
mod types;

// Re-export public API
pub use action::{ActionType, RebalanceAction, RebalanceSummary};
pub use allocation::{Allocation, AllocationEngine, MarkedPortfolio};
pub use engine::{RebalanceOutcome, RebalanceParams, Rebalancer};
pub use error::{Error, Result};
pub use estimator::{RealizedRoi, RoiEstimator, RoiScore};
pub use index::PriceIndex;
pub use ranking::{Pick, PickOrigin, RankedTicker};
pub use strategy::{MovingAverageStrategy, RandomStrategy, ScoringStrategy};
pub use types::{Portfolio, Position, PriceRecord};
