//! Rebalance outputs: per-ticker actions and the run summary.

use std::fmt;

/// What happened to a ticker in a rebalance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "UPPERCASE"))]
pub enum ActionType {
    Buy,
    Sell,
    Hold,
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionType::Buy => write!(f, "BUY"),
            ActionType::Sell => write!(f, "SELL"),
            ActionType::Hold => write!(f, "HOLD"),
        }
    }
}

/// One ticker's outcome from the sell or buy pass.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RebalanceAction {
    pub action_type: ActionType,
    pub ticker: String,
    /// Shares bought or sold (0 for HOLD)
    pub traded_shares: u64,
    pub speculated_roi: f64,
    /// `new_holding_value * speculated_roi`
    pub speculated_net_capital: f64,
    /// Shares held after the action
    pub outstanding_shares: u64,
    pub new_holding_value: f64,
    /// Realized ROI over the holding window, when future prices exist
    pub actual_roi: Option<f64>,
    /// `actual_roi * outstanding_shares * start_price`
    pub actual_net_capital: Option<f64>,
}

impl RebalanceAction {
    /// Action without realized data; net capital derived from value and ROI.
    pub fn new(
        action_type: ActionType,
        ticker: impl Into<String>,
        traded_shares: u64,
        speculated_roi: f64,
        outstanding_shares: u64,
        new_holding_value: f64,
    ) -> Self {
        Self {
            action_type,
            ticker: ticker.into(),
            traded_shares,
            speculated_roi,
            speculated_net_capital: new_holding_value * speculated_roi,
            outstanding_shares,
            new_holding_value,
            actual_roi: None,
            actual_net_capital: None,
        }
    }
}

impl fmt::Display for RebalanceAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{}: {} shares of {}",
            self.action_type, self.traded_shares, self.ticker
        )?;
        writeln!(f, "  New holding value:      ${:.2}", self.new_holding_value)?;
        writeln!(f, "  Outstanding shares:     {}", self.outstanding_shares)?;
        writeln!(f, "  Speculated ROI:         {:.2}%", self.speculated_roi * 100.0)?;
        write!(f, "  Speculated net capital: ${:.2}", self.speculated_net_capital)?;
        if let (Some(roi), Some(net)) = (self.actual_roi, self.actual_net_capital) {
            writeln!(f)?;
            writeln!(f, "  Actual ROI:             {:.2}%", roi * 100.0)?;
            write!(f, "  Actual net capital:     ${net:.2}")?;
        }
        Ok(())
    }
}

/// Aggregate view of a rebalance.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RebalanceSummary {
    pub total_portfolio_value: f64,
    pub remaining_cash: f64,
    pub average_speculated_roi: f64,
    pub total_speculated_net_capital: f64,
    /// Mean over actions with realized data; `None` if there are none
    pub average_actual_roi: Option<f64>,
    pub total_actual_net_capital: Option<f64>,
}

impl RebalanceSummary {
    /// Summarize `actions` given the cash left after the buy pass.
    pub fn from_actions(actions: &[RebalanceAction], remaining_cash: f64) -> Self {
        if actions.is_empty() {
            return Self {
                total_portfolio_value: remaining_cash,
                remaining_cash,
                average_speculated_roi: 0.0,
                total_speculated_net_capital: 0.0,
                average_actual_roi: None,
                total_actual_net_capital: None,
            };
        }

        let holdings_value: f64 = actions.iter().map(|a| a.new_holding_value).sum();
        let speculated_sum: f64 = actions.iter().map(|a| a.speculated_roi).sum();
        let speculated_net: f64 = actions.iter().map(|a| a.speculated_net_capital).sum();

        let realized: Vec<(f64, f64)> = actions
            .iter()
            .filter_map(|a| a.actual_roi.zip(a.actual_net_capital))
            .collect();
        let (average_actual_roi, total_actual_net_capital) = if realized.is_empty() {
            (None, None)
        } else {
            let roi_sum: f64 = realized.iter().map(|(roi, _)| roi).sum();
            let net_sum: f64 = realized.iter().map(|(_, net)| net).sum();
            (Some(roi_sum / realized.len() as f64), Some(net_sum))
        };

        Self {
            total_portfolio_value: remaining_cash + holdings_value,
            remaining_cash,
            average_speculated_roi: speculated_sum / actions.len() as f64,
            total_speculated_net_capital: speculated_net,
            average_actual_roi,
            total_actual_net_capital,
        }
    }
}

impl fmt::Display for RebalanceSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Rebalance Summary")?;
        writeln!(f, "  Total portfolio value:        ${:.2}", self.total_portfolio_value)?;
        writeln!(f, "  Remaining cash:               ${:.2}", self.remaining_cash)?;
        writeln!(
            f,
            "  Average speculated ROI:       {:.2}%",
            self.average_speculated_roi * 100.0
        )?;
        write!(
            f,
            "  Total speculated net capital: ${:.2}",
            self.total_speculated_net_capital
        )?;
        if let (Some(roi), Some(net)) = (self.average_actual_roi, self.total_actual_net_capital) {
            writeln!(f)?;
            writeln!(f, "  Average actual ROI:           {:.2}%", roi * 100.0)?;
            write!(f, "  Total actual net capital:     ${net:.2}")?;
        }
        Ok(())
    }
}
