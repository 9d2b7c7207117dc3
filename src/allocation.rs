//! Target weighting, valuation blending, and the sell/buy passes.
//!
//! The ranked list is walked twice in rank order. The sell pass trims every
//! position whose blended target is below its current value, crediting cash.
//! The buy pass reserves cash for every remaining candidate up front, then
//! makes a single greedy round that buys one extra share per candidate while
//! cash covers it. The reservation is not capped, so remaining cash may end up
//! below zero.

use log::debug;
use rustc_hash::FxHashMap;

use crate::action::{ActionType, RebalanceAction};
use crate::error::{Error, Result};
use crate::index::PriceIndex;
use crate::ranking::Pick;
use crate::types::Portfolio;

/// Tolerance when converting a value back to whole shares, so that
/// `q * price / price` is not floored to `q - 1`.
const SHARE_EPSILON: f64 = 1e-9;

/// Whole shares affordable for `value` at `price`.
pub fn shares_for(value: f64, price: f64) -> u64 {
    if price.is_nan() || value.is_nan() || price <= 0.0 || value <= 0.0 {
        return 0;
    }
    (value / price + SHARE_EPSILON).floor() as u64
}

/// Triangular weights for the top `n` picks: `2 * (n - i) / n^2`.
///
/// Strictly decreasing. They sum to `(n + 1) / n`, so the targets overshoot
/// the marked total and the buy reservation can leave cash negative.
pub fn triangular_weights(n: usize) -> Vec<f64> {
    if n == 0 {
        return Vec::new();
    }
    let denom = (n * n) as f64;
    (0..n).map(|i| 2.0 * (n - i) as f64 / denom).collect()
}

/// Target value per ranked ticker: triangular shares of `total_value` for the
/// first `min(max_holdings, ranked.len())` picks, zero for the rest.
pub fn target_valuations(
    ranked: &[Pick],
    max_holdings: usize,
    total_value: f64,
) -> FxHashMap<String, f64> {
    let n = max_holdings.min(ranked.len());
    let weights = triangular_weights(n);
    ranked
        .iter()
        .enumerate()
        .map(|(i, pick)| {
            let target = weights.get(i).map_or(0.0, |w| w * total_value);
            (pick.ticker.clone(), target)
        })
        .collect()
}

/// `old * (1 - adjust_by) + target * adjust_by` over the union of tickers.
pub fn blend_valuations(
    old: &FxHashMap<String, f64>,
    target: &FxHashMap<String, f64>,
    adjust_by: f64,
) -> FxHashMap<String, f64> {
    let mut blended = FxHashMap::default();
    for ticker in old.keys().chain(target.keys()) {
        if blended.contains_key(ticker) {
            continue;
        }
        let old_val = old.get(ticker).copied().unwrap_or(0.0);
        let new_val = target.get(ticker).copied().unwrap_or(0.0);
        blended.insert(ticker.clone(), old_val * (1.0 - adjust_by) + new_val * adjust_by);
    }
    blended
}

/// A portfolio marked to market on its own date.
#[derive(Clone, Debug)]
pub struct MarkedPortfolio {
    quantities: FxHashMap<String, u64>,
    valuations: FxHashMap<String, f64>,
    cash: f64,
    total_value: f64,
}

impl MarkedPortfolio {
    /// Value every holding at its close on `portfolio.date`.
    ///
    /// A holding without a price on that date is an error.
    pub fn mark(portfolio: &Portfolio, index: &PriceIndex) -> Result<Self> {
        let mut quantities: FxHashMap<String, u64> = FxHashMap::default();
        for pos in &portfolio.holdings {
            *quantities.entry(pos.ticker.clone()).or_insert(0) += pos.quantity;
        }

        let mut valuations = FxHashMap::default();
        let mut total_value = portfolio.cash;
        for (ticker, &qty) in &quantities {
            let price = index.price_on(ticker, &portfolio.date)?;
            let value = price * qty as f64;
            total_value += value;
            valuations.insert(ticker.clone(), value);
        }

        Ok(Self {
            quantities,
            valuations,
            cash: portfolio.cash,
            total_value,
        })
    }

    pub fn quantity_of(&self, ticker: &str) -> u64 {
        self.quantities.get(ticker).copied().unwrap_or(0)
    }

    pub fn value_of(&self, ticker: &str) -> f64 {
        self.valuations.get(ticker).copied().unwrap_or(0.0)
    }

    pub fn valuations(&self) -> &FxHashMap<String, f64> {
        &self.valuations
    }

    pub fn tickers(&self) -> impl Iterator<Item = &str> {
        self.quantities.keys().map(String::as_str)
    }

    pub fn cash(&self) -> f64 {
        self.cash
    }

    /// Cash plus marked holdings.
    pub fn total_value(&self) -> f64 {
        self.total_value
    }
}

/// Result of the sell and buy passes.
#[derive(Clone, Debug)]
pub struct Allocation {
    pub actions: Vec<RebalanceAction>,
    pub remaining_cash: f64,
    /// Blended target value per ticker
    pub blended: FxHashMap<String, f64>,
}

struct BuyCandidate {
    ticker: String,
    roi: f64,
    current_qty: u64,
    shares_to_buy: i64,
    price: f64,
}

/// Turns a ranked list and a marked portfolio into actions.
#[derive(Clone, Debug)]
pub struct AllocationEngine<'a> {
    index: &'a PriceIndex,
    date: &'a str,
    max_holdings: usize,
    adjust_by: f64,
}

impl<'a> AllocationEngine<'a> {
    /// `adjust_by` must lie in [0, 1].
    pub fn new(
        index: &'a PriceIndex,
        date: &'a str,
        max_holdings: usize,
        adjust_by: f64,
    ) -> Result<Self> {
        if !(0.0..=1.0).contains(&adjust_by) {
            return Err(Error::InvalidParameter(format!(
                "adjust_by must be in [0.0, 1.0], got {adjust_by}"
            )));
        }
        Ok(Self {
            index,
            date,
            max_holdings,
            adjust_by,
        })
    }

    /// Run both passes over `ranked` (rank order) against `book`.
    pub fn plan(&self, ranked: &[Pick], book: &MarkedPortfolio) -> Result<Allocation> {
        let targets = target_valuations(ranked, self.max_holdings, book.total_value());
        let blended = blend_valuations(book.valuations(), &targets, self.adjust_by);

        let mut cash = book.cash();
        let mut actions = Vec::new();

        // === Sell pass ===
        for pick in ranked {
            let current_val = book.value_of(&pick.ticker);
            let target_val = blended.get(&pick.ticker).copied().unwrap_or(0.0);
            if current_val <= target_val {
                continue;
            }

            let price = self.index.price_on(&pick.ticker, self.date)?;
            let current_qty = book.quantity_of(&pick.ticker);
            let target_qty = shares_for(target_val, price);
            let new_value = target_qty as f64 * price;

            if current_qty > target_qty {
                let sold = current_qty - target_qty;
                debug!("sell {sold} {} @ {price}", pick.ticker);
                cash += price * sold as f64;
                actions.push(RebalanceAction::new(
                    ActionType::Sell,
                    pick.ticker.clone(),
                    sold,
                    pick.roi,
                    target_qty,
                    new_value,
                ));
            } else if target_qty > 0 {
                actions.push(RebalanceAction::new(
                    ActionType::Hold,
                    pick.ticker.clone(),
                    0,
                    pick.roi,
                    target_qty,
                    new_value,
                ));
            }
        }

        // === Buy pass: reserve in rank order ===
        let mut candidates = Vec::new();
        for pick in ranked {
            let current_val = book.value_of(&pick.ticker);
            let target_val = blended.get(&pick.ticker).copied().unwrap_or(0.0);
            if target_val < current_val {
                continue;
            }

            let price = self.index.price_on(&pick.ticker, self.date)?;
            let current_qty = book.quantity_of(&pick.ticker);
            let target_qty = shares_for(target_val, price);
            let shares_to_buy = target_qty as i64 - current_qty as i64;
            cash -= price * shares_to_buy as f64;
            candidates.push(BuyCandidate {
                ticker: pick.ticker.clone(),
                roi: pick.roi,
                current_qty,
                shares_to_buy,
                price,
            });
        }

        // One greedy round with whatever cash is left.
        for c in candidates.iter_mut() {
            if c.price > 0.0 && cash >= c.price {
                c.shares_to_buy += 1;
                cash -= c.price;
            }
        }

        for c in candidates {
            let outstanding = (c.current_qty as i64 + c.shares_to_buy).max(0) as u64;
            let new_value = outstanding as f64 * c.price;
            if c.shares_to_buy > 0 {
                debug!("buy {} {} @ {}", c.shares_to_buy, c.ticker, c.price);
                actions.push(RebalanceAction::new(
                    ActionType::Buy,
                    c.ticker,
                    c.shares_to_buy as u64,
                    c.roi,
                    outstanding,
                    new_value,
                ));
            } else if outstanding > 0 {
                actions.push(RebalanceAction::new(
                    ActionType::Hold,
                    c.ticker,
                    0,
                    c.roi,
                    outstanding,
                    new_value,
                ));
            }
        }

        Ok(Allocation {
            actions,
            remaining_cash: cash,
            blended,
        })
    }
}
