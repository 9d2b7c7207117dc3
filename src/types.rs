//! Core records: PriceRecord, Position, Portfolio

/// One row of historical market data.
///
/// `date` is a lexicographically sortable trading-day key (e.g. `2024-01-31`).
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PriceRecord {
    pub ticker: String,
    pub sector: String,
    pub date: String,
    pub close: f64,
    pub open: f64,
    pub low: f64,
    pub high: f64,
    pub volume: u64,
}

impl PriceRecord {
    /// Record with only the fields the engine reads; OHLV mirror the close.
    pub fn close_only(ticker: &str, sector: &str, date: &str, close: f64) -> Self {
        Self {
            ticker: ticker.to_string(),
            sector: sector.to_string(),
            date: date.to_string(),
            close,
            open: close,
            low: close,
            high: close,
            volume: 0,
        }
    }
}

/// A holding of whole shares.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Position {
    pub ticker: String,
    pub quantity: u64,
}

impl Position {
    pub fn new(ticker: impl Into<String>, quantity: u64) -> Self {
        Self {
            ticker: ticker.into(),
            quantity,
        }
    }
}

/// A portfolio snapshot on a trading date.
///
/// Snapshots are never mutated by a rebalance; the engine produces a successor.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Portfolio {
    pub id: String,
    pub date: String,
    pub cash: f64,
    pub holdings: Vec<Position>,
}

impl Portfolio {
    /// A portfolio holding only cash.
    pub fn with_cash(id: impl Into<String>, date: impl Into<String>, cash: f64) -> Self {
        Self {
            id: id.into(),
            date: date.into(),
            cash,
            holdings: Vec::new(),
        }
    }

    /// Quantity held for `ticker`, summing duplicate entries.
    pub fn quantity_of(&self, ticker: &str) -> u64 {
        self.holdings
            .iter()
            .filter(|p| p.ticker == ticker)
            .map(|p| p.quantity)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn close_only_mirrors_close() {
        let r = PriceRecord::close_only("AAPL", "Tech", "2024-01-02", 185.5);
        assert_eq!(r.open, 185.5);
        assert_eq!(r.high, 185.5);
        assert_eq!(r.volume, 0);
    }

    #[test]
    fn quantity_of_sums_duplicates() {
        let mut p = Portfolio::with_cash("p1", "2024-01-02", 100.0);
        p.holdings.push(Position::new("AAPL", 3));
        p.holdings.push(Position::new("MSFT", 1));
        p.holdings.push(Position::new("AAPL", 2));
        assert_eq!(p.quantity_of("AAPL"), 5);
        assert_eq!(p.quantity_of("XOM"), 0);
    }
}
