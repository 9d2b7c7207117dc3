//! Candidate ranking and sector-balanced selection.
//!
//! Both rankings score every ticker through the shared [`RoiEstimator`], so a
//! ticker held in the portfolio gets the same score in both lists. Tickers are
//! visited in sorted order and sorted stably by descending ROI, which makes
//! tie order deterministic and identical across the two lists.

use std::cmp::Ordering;
use std::collections::{BTreeSet, VecDeque};

use log::debug;
use rustc_hash::FxHashMap;

use crate::error::Result;
use crate::estimator::RoiEstimator;
use crate::index::PriceIndex;
use crate::strategy::ScoringStrategy;

/// A ticker with its speculated ROI.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RankedTicker {
    pub ticker: String,
    pub roi: f64,
}

/// How a ticker entered the selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PickOrigin {
    /// Top of both rankings at once: a held top performer, kept unconditionally.
    Retained,
    /// Admitted from the universe under the sector-lead cap.
    Admitted,
    /// Held ticker appended after selection, beyond the size cap if needed.
    CarriedOver,
}

/// One entry of the final ranked list.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Pick {
    pub ticker: String,
    pub roi: f64,
    pub origin: PickOrigin,
}

fn sort_descending(rankings: &mut [RankedTicker]) {
    rankings.sort_by(|a, b| b.roi.partial_cmp(&a.roi).unwrap_or(Ordering::Equal));
}

/// Every ticker priced on `date`, ranked by speculated ROI (descending).
///
/// Tickers scoring exactly `0.0` are excluded; that covers both a literal
/// zero estimate and a failed strategy call.
pub fn ranked_universe<S: ScoringStrategy + ?Sized>(
    index: &PriceIndex,
    estimator: &mut RoiEstimator,
    strategy: &S,
    date: &str,
    holding_window: usize,
) -> Vec<RankedTicker> {
    let mut rankings = Vec::new();
    for ticker in index.tickers_on(date) {
        let series = index.history_until(ticker, date);
        let roi = estimator
            .speculated_roi(&series, strategy, ticker, date, holding_window)
            .value();
        if roi != 0.0 {
            rankings.push(RankedTicker {
                ticker: ticker.to_string(),
                roi,
            });
        } else {
            debug!("{ticker} excluded from ranking (zero score)");
        }
    }
    sort_descending(&mut rankings);
    rankings
}

/// Currently held tickers ranked by speculated ROI (descending), zeros kept.
pub fn ranked_holdings<'a, S, I>(
    index: &PriceIndex,
    estimator: &mut RoiEstimator,
    strategy: &S,
    holdings: I,
    date: &str,
    holding_window: usize,
) -> Vec<RankedTicker>
where
    S: ScoringStrategy + ?Sized,
    I: IntoIterator<Item = &'a str>,
{
    let tickers: BTreeSet<&str> = holdings.into_iter().collect();
    let mut rankings: Vec<RankedTicker> = tickers
        .into_iter()
        .map(|ticker| {
            let series = index.history_until(ticker, date);
            let roi = estimator
                .speculated_roi(&series, strategy, ticker, date, holding_window)
                .value();
            RankedTicker {
                ticker: ticker.to_string(),
                roi,
            }
        })
        .collect();
    sort_descending(&mut rankings);
    rankings
}

/// Build the sector-balanced candidate list.
///
/// Up to `max_holdings` picks come from the universe: a ticker on top of both
/// lists is retained unconditionally; otherwise the universe head is admitted
/// only while its sector count is below `min_sector_count + max_sector_lead`,
/// and is discarded either way. Held tickers not yet picked are then appended,
/// which can push the list past `max_holdings`. A held ticker that was
/// already picked is not appended a second time, so the list never carries
/// duplicates that would zero out a pick's target.
///
/// Sector counts start at zero for every sector observed on `date`.
pub fn select_balanced(
    index: &PriceIndex,
    date: &str,
    ranked_holdings: Vec<RankedTicker>,
    ranked_universe: Vec<RankedTicker>,
    max_holdings: usize,
    max_sector_lead: usize,
) -> Result<Vec<Pick>> {
    let mut holdings: VecDeque<RankedTicker> = ranked_holdings.into();
    let mut universe: VecDeque<RankedTicker> = ranked_universe.into();

    let mut sector_counts: FxHashMap<String, usize> = index
        .sectors_on(date)?
        .iter()
        .map(|s| (s.clone(), 0))
        .collect();

    let mut picks: Vec<Pick> = Vec::new();

    while picks.len() < max_holdings {
        let Some(candidate) = universe.pop_front() else {
            break;
        };

        if holdings.front().is_some_and(|h| h.ticker == candidate.ticker) {
            holdings.pop_front();
            debug!("retaining top holding {}", candidate.ticker);
            picks.push(Pick {
                ticker: candidate.ticker,
                roi: candidate.roi,
                origin: PickOrigin::Retained,
            });
            continue;
        }

        let min_sector_count = sector_counts.values().copied().min().unwrap_or(0);
        let sector = index.sector_of(&candidate.ticker).unwrap_or_default();
        let count = sector_counts.entry(sector.to_string()).or_insert(0);

        if *count < min_sector_count + max_sector_lead {
            *count += 1;
            picks.push(Pick {
                ticker: candidate.ticker,
                roi: candidate.roi,
                origin: PickOrigin::Admitted,
            });
        } else {
            debug!(
                "{} discarded: sector {sector} at {count} (min {min_sector_count}, lead {max_sector_lead})",
                candidate.ticker
            );
        }
    }

    for held in holdings {
        if picks.iter().any(|p| p.ticker == held.ticker) {
            continue;
        }
        picks.push(Pick {
            ticker: held.ticker,
            roi: held.roi,
            origin: PickOrigin::CarriedOver,
        });
    }

    Ok(picks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, Result as EngineResult};
    use crate::types::PriceRecord;

    /// Scores from a fixed table keyed by the last price in the series.
    struct LastPrice;

    impl ScoringStrategy for LastPrice {
        fn id(&self) -> &str {
            "last_price"
        }
        fn speculate(&self, prices: &[f64], _: &str, _: usize) -> EngineResult<f64> {
            match prices.last() {
                Some(p) if *p < 0.5 => Err(Error::InsufficientData("tiny".into())),
                Some(p) => Ok(p / 100.0 - 0.5),
                None => Err(Error::InsufficientData("empty".into())),
            }
        }
    }

    fn rt(ticker: &str, roi: f64) -> RankedTicker {
        RankedTicker {
            ticker: ticker.into(),
            roi,
        }
    }

    fn sector_index(rows: &[(&str, &str)]) -> PriceIndex {
        let recs: Vec<PriceRecord> = rows
            .iter()
            .map(|(t, s)| PriceRecord::close_only(t, s, "d1", 10.0))
            .collect();
        PriceIndex::build(&recs)
    }

    #[test]
    fn universe_sorted_and_zero_excluded() {
        let idx = PriceIndex::build(&[
            PriceRecord::close_only("A", "Tech", "d1", 70.0),
            PriceRecord::close_only("B", "Tech", "d1", 90.0),
            PriceRecord::close_only("C", "Energy", "d1", 50.0), // scores exactly 0
            PriceRecord::close_only("D", "Energy", "d1", 0.1),  // strategy fails
            PriceRecord::close_only("E", "Energy", "d1", 20.0),
            PriceRecord::close_only("F", "Energy", "d2", 99.0), // not priced on d1
        ]);
        let mut est = RoiEstimator::new();
        let ranked = ranked_universe(&idx, &mut est, &LastPrice, "d1", 10);
        let tickers: Vec<&str> = ranked.iter().map(|r| r.ticker.as_str()).collect();
        assert_eq!(tickers, vec!["B", "A", "E"]);
        assert!(ranked[0].roi > ranked[1].roi);
    }

    #[test]
    fn universe_series_excludes_future_prices() {
        let idx = PriceIndex::build(&[
            PriceRecord::close_only("A", "Tech", "d1", 70.0),
            PriceRecord::close_only("A", "Tech", "d2", 10.0),
        ]);
        let mut est = RoiEstimator::new();
        let ranked = ranked_universe(&idx, &mut est, &LastPrice, "d1", 10);
        assert!((ranked[0].roi - 0.2).abs() < 1e-12);
    }

    #[test]
    fn holdings_keep_zero_scores() {
        let idx = PriceIndex::build(&[
            PriceRecord::close_only("A", "Tech", "d1", 70.0),
            PriceRecord::close_only("C", "Energy", "d1", 50.0),
        ]);
        let mut est = RoiEstimator::new();
        let ranked = ranked_holdings(&idx, &mut est, &LastPrice, ["C", "A", "C"], "d1", 10);
        assert_eq!(ranked, vec![rt("A", 0.2), rt("C", 0.0)]);
    }

    #[test]
    fn retains_shared_top() {
        let idx = sector_index(&[("A", "Tech"), ("B", "Energy")]);
        let picks = select_balanced(
            &idx,
            "d1",
            vec![rt("A", 0.3)],
            vec![rt("A", 0.3), rt("B", 0.1)],
            5,
            1,
        )
        .unwrap();
        assert_eq!(picks.len(), 2);
        assert_eq!(picks[0].origin, PickOrigin::Retained);
        assert_eq!(picks[1].origin, PickOrigin::Admitted);
    }

    #[test]
    fn sector_lead_caps_admission() {
        let idx = sector_index(&[("T1", "Tech"), ("T2", "Tech"), ("T3", "Tech"), ("E1", "Energy")]);
        let universe = vec![rt("T1", 0.9), rt("T2", 0.8), rt("T3", 0.7), rt("E1", 0.1)];
        let picks = select_balanced(&idx, "d1", vec![], universe, 10, 1).unwrap();
        let tickers: Vec<&str> = picks.iter().map(|p| p.ticker.as_str()).collect();
        // T2 and T3 are discarded: Tech already leads Energy by 1
        assert_eq!(tickers, vec!["T1", "E1"]);
    }

    #[test]
    fn discarded_candidates_do_not_return() {
        let idx = sector_index(&[("T1", "Tech"), ("T2", "Tech"), ("E1", "Energy"), ("E2", "Energy")]);
        let universe = vec![rt("T1", 0.9), rt("T2", 0.8), rt("E1", 0.5), rt("E2", 0.4)];
        let picks = select_balanced(&idx, "d1", vec![], universe, 10, 1).unwrap();
        let tickers: Vec<&str> = picks.iter().map(|p| p.ticker.as_str()).collect();
        assert_eq!(tickers, vec!["T1", "E1", "E2"]);
    }

    #[test]
    fn max_holdings_caps_universe_picks() {
        let idx = sector_index(&[("A", "S1"), ("B", "S2"), ("C", "S3")]);
        let universe = vec![rt("A", 0.3), rt("B", 0.2), rt("C", 0.1)];
        let picks = select_balanced(&idx, "d1", vec![], universe, 2, 5).unwrap();
        assert_eq!(picks.len(), 2);
    }

    #[test]
    fn held_tickers_carried_over_past_cap() {
        let idx = sector_index(&[("A", "S1"), ("B", "S2"), ("H", "S3")]);
        let holdings = vec![rt("H", -0.2)];
        let universe = vec![rt("A", 0.3), rt("B", 0.2), rt("H", -0.2)];
        let picks = select_balanced(&idx, "d1", holdings, universe, 2, 5).unwrap();
        let tickers: Vec<&str> = picks.iter().map(|p| p.ticker.as_str()).collect();
        assert_eq!(tickers, vec!["A", "B", "H"]);
        assert_eq!(picks[2].origin, PickOrigin::CarriedOver);
    }

    #[test]
    fn carry_over_skips_already_picked() {
        // Z is held with a zero score, so it never reaches the universe and
        // blocks the retention check for X below it.
        let idx = sector_index(&[("X", "S1"), ("Z", "S2")]);
        let holdings = vec![rt("Z", 0.0), rt("X", -0.1)];
        let universe = vec![rt("X", -0.1)];
        let picks = select_balanced(&idx, "d1", holdings, universe, 5, 5).unwrap();
        let tickers: Vec<&str> = picks.iter().map(|p| p.ticker.as_str()).collect();
        assert_eq!(tickers, vec!["X", "Z"]);
    }

    #[test]
    fn unknown_date_is_not_found() {
        let idx = sector_index(&[("A", "S1")]);
        let err = select_balanced(&idx, "d9", vec![], vec![], 5, 1).unwrap_err();
        assert!(err.is_not_found());
    }
}
