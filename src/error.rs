//! Error types for price lookups, strategies, and rebalance parameters.

/// Errors raised by the rebalancing engine.
///
/// `DateNotFound` and `PriceNotFound` form the "not found" class; see
/// [`Error::is_not_found`].
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum Error {
    /// No price records exist for the date.
    #[error("no data found for date: {date}")]
    DateNotFound { date: String },

    /// No closing price exists for the (ticker, date) pair.
    #[error("no price data found for ticker: {ticker} on date: {date}")]
    PriceNotFound { ticker: String, date: String },

    /// Not enough history for a strategy, or not enough future dates.
    #[error("insufficient data: {0}")]
    InsufficientData(String),

    /// A scoring strategy could not produce an estimate.
    #[error("strategy {strategy} failed: {reason}")]
    StrategyFailure { strategy: String, reason: String },

    /// A rebalance parameter is out of range.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

impl Error {
    /// True for missing dates and missing prices.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::DateNotFound { .. } | Error::PriceNotFound { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display() {
        let err = Error::PriceNotFound {
            ticker: "AAPL".into(),
            date: "2024-01-02".into(),
        };
        assert_eq!(
            err.to_string(),
            "no price data found for ticker: AAPL on date: 2024-01-02"
        );
        assert_eq!(
            Error::InsufficientData("need 50 prices, got 3".into()).to_string(),
            "insufficient data: need 50 prices, got 3"
        );
    }

    #[test]
    fn not_found_class() {
        assert!(Error::DateNotFound { date: "d".into() }.is_not_found());
        assert!(
            Error::PriceNotFound {
                ticker: "T".into(),
                date: "d".into()
            }
            .is_not_found()
        );
        assert!(!Error::InsufficientData("x".into()).is_not_found());
    }

    #[test]
    fn is_error() {
        let err: Box<dyn std::error::Error> = Box::new(Error::InvalidParameter("adjust_by".into()));
        assert!(err.to_string().contains("adjust_by"));
    }
}
