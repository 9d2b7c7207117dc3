//! Price and sector lookups over the full historical dataset.
//!
//! The index is built once per run from every [`PriceRecord`] and is
//! read-only afterward. Dates are kept in a `BTreeMap` so that history
//! slices and forward offsets walk trading days in ascending order.

use std::collections::{BTreeMap, BTreeSet};
use std::ops::Bound;

use rustc_hash::FxHashMap;

use crate::error::{Error, Result};
use crate::types::PriceRecord;

/// Lookups: date → ticker → close, ticker → sector, date → sectors.
#[derive(Clone, Debug, Default)]
pub struct PriceIndex {
    closes: BTreeMap<String, FxHashMap<String, f64>>,
    sectors: FxHashMap<String, String>,
    date_sectors: FxHashMap<String, BTreeSet<String>>,
    /// Distinct dates, ascending (mirrors `closes` keys)
    dates: Vec<String>,
}

impl PriceIndex {
    /// Build the index in one pass over `records`.
    ///
    /// Duplicate (date, ticker) rows and re-sectored tickers are last-write-wins.
    pub fn build(records: &[PriceRecord]) -> Self {
        let mut closes: BTreeMap<String, FxHashMap<String, f64>> = BTreeMap::new();
        let mut sectors = FxHashMap::default();
        let mut date_sectors: FxHashMap<String, BTreeSet<String>> = FxHashMap::default();

        for r in records {
            closes
                .entry(r.date.clone())
                .or_default()
                .insert(r.ticker.clone(), r.close);
            sectors.insert(r.ticker.clone(), r.sector.clone());
            date_sectors
                .entry(r.date.clone())
                .or_default()
                .insert(r.sector.clone());
        }

        let dates = closes.keys().cloned().collect();
        Self {
            closes,
            sectors,
            date_sectors,
            dates,
        }
    }

    /// Number of distinct trading dates.
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// All distinct dates, ascending.
    pub fn dates(&self) -> &[String] {
        &self.dates
    }

    /// Sectors observed on `date`.
    pub fn sectors_on(&self, date: &str) -> Result<&BTreeSet<String>> {
        self.date_sectors
            .get(date)
            .ok_or_else(|| Error::DateNotFound { date: date.into() })
    }

    /// Sector of `ticker` (the last one seen in the dataset).
    pub fn sector_of(&self, ticker: &str) -> Option<&str> {
        self.sectors.get(ticker).map(String::as_str)
    }

    /// Closing price of `ticker` on `date`.
    pub fn price_on(&self, ticker: &str, date: &str) -> Result<f64> {
        let prices = self
            .closes
            .get(date)
            .ok_or_else(|| Error::DateNotFound { date: date.into() })?;
        prices
            .get(ticker)
            .copied()
            .ok_or_else(|| Error::PriceNotFound {
                ticker: ticker.into(),
                date: date.into(),
            })
    }

    /// The date `window` distinct trading days after `current`.
    ///
    /// Offsets count dates present in the dataset, not calendar days.
    pub fn future_date(&self, current: &str, window: usize) -> Result<&str> {
        let pos = self
            .dates
            .binary_search_by(|d| d.as_str().cmp(current))
            .map_err(|_| Error::DateNotFound {
                date: current.into(),
            })?;

        let remaining = self.dates.len() - pos - 1;
        if remaining < window {
            return Err(Error::InsufficientData(format!(
                "{window} trading days needed after {current}, only {remaining} available"
            )));
        }
        Ok(&self.dates[pos + window])
    }

    /// Tickers priced on `date`, sorted. Empty if the date is unknown.
    pub fn tickers_on(&self, date: &str) -> Vec<&str> {
        let mut tickers: Vec<&str> = self
            .closes
            .get(date)
            .map(|prices| prices.keys().map(String::as_str).collect())
            .unwrap_or_default();
        tickers.sort_unstable();
        tickers
    }

    /// Ascending close series of `ticker` for dates `<= until`.
    pub fn history_until(&self, ticker: &str, until: &str) -> Vec<f64> {
        self.closes
            .range::<str, _>((Bound::Unbounded, Bound::Included(until)))
            .filter_map(|(_, prices)| prices.get(ticker).copied())
            .collect()
    }

    /// Ascending close series of `ticker` across every date, future included.
    pub fn full_history(&self, ticker: &str) -> Vec<f64> {
        self.closes
            .values()
            .filter_map(|prices| prices.get(ticker).copied())
            .collect()
    }
}
