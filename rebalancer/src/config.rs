//! TOML configuration loading and validation.

use std::path::{Path, PathBuf};

use rankbook::{MovingAverageStrategy, RandomStrategy, RebalanceParams, ScoringStrategy};
use serde::Deserialize;

use crate::error::{Error, Result};

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub data: DataConfig,
    #[serde(default)]
    pub strategy: StrategyConfig,
    #[serde(default)]
    pub rebalance: RebalanceConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataConfig {
    /// Price CSV (`ticker,sector,date,close,open,low,high,volume`)
    pub prices: PathBuf,
    /// Portfolio snapshot to rebalance
    pub portfolio: PathBuf,
    /// Where the successor snapshot is written
    pub output: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    MovingAverage,
    Random,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StrategyConfig {
    #[serde(default = "default_kind")]
    pub kind: StrategyKind,
    #[serde(default = "default_lookback")]
    pub lookback_period: usize,
    pub short_window: Option<usize>,
    pub long_window: Option<usize>,
}

fn default_kind() -> StrategyKind {
    StrategyKind::MovingAverage
}
fn default_lookback() -> usize {
    50
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            kind: default_kind(),
            lookback_period: default_lookback(),
            short_window: None,
            long_window: None,
        }
    }
}

impl StrategyConfig {
    /// Effective (short, long) windows: explicit values win over the lookback.
    pub fn windows(&self) -> (usize, usize) {
        (
            self.short_window.unwrap_or(self.lookback_period.min(20)),
            self.long_window.unwrap_or(self.lookback_period.min(50)),
        )
    }

    /// Instantiate the configured strategy.
    pub fn build(&self) -> Result<Box<dyn ScoringStrategy>> {
        match self.kind {
            StrategyKind::Random => Ok(Box::new(RandomStrategy::new())),
            StrategyKind::MovingAverage => {
                let (short, long) = self.windows();
                Ok(Box::new(MovingAverageStrategy::new(short, long)?))
            }
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RebalanceConfig {
    #[serde(default = "default_holding_window")]
    pub holding_window: usize,
    #[serde(default = "default_max_holdings")]
    pub max_holdings: usize,
    #[serde(default = "default_max_sector_lead")]
    pub max_sector_lead: usize,
    #[serde(default = "default_adjust_by")]
    pub adjust_by: f64,
}

fn default_holding_window() -> usize {
    10
}
fn default_max_holdings() -> usize {
    50
}
fn default_max_sector_lead() -> usize {
    5
}
fn default_adjust_by() -> f64 {
    1.0
}

impl Default for RebalanceConfig {
    fn default() -> Self {
        Self {
            holding_window: default_holding_window(),
            max_holdings: default_max_holdings(),
            max_sector_lead: default_max_sector_lead(),
            adjust_by: default_adjust_by(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_dir")]
    pub dir: String,
    #[serde(default = "default_audit_file")]
    pub audit_file: String,
}

fn default_log_dir() -> String {
    "./logs".into()
}
fn default_audit_file() -> String {
    "audit.jsonl".into()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: default_log_dir(),
            audit_file: default_audit_file(),
        }
    }
}

impl Config {
    /// Load config from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| Error::ConfigRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::parse(&contents)
    }

    /// Parse and validate TOML text.
    pub fn parse(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate config invariants.
    fn validate(&self) -> Result<()> {
        let r = &self.rebalance;
        if r.holding_window == 0 {
            return Err(Error::Config("holding_window must be >= 1".into()));
        }
        if r.max_holdings == 0 {
            return Err(Error::Config("max_holdings must be >= 1".into()));
        }
        if !r.adjust_by.is_finite() || !(0.0..=1.0).contains(&r.adjust_by) {
            return Err(Error::Config("adjust_by must be in [0.0, 1.0]".into()));
        }
        if self.strategy.kind == StrategyKind::MovingAverage {
            let (short, long) = self.strategy.windows();
            if short == 0 {
                return Err(Error::Config("short_window must be >= 1".into()));
            }
            if long < MovingAverageStrategy::MIN_LONG_WINDOW {
                return Err(Error::Config(format!(
                    "long_window must be >= {}, got {long}",
                    MovingAverageStrategy::MIN_LONG_WINDOW
                )));
            }
            if long < short {
                return Err(Error::Config(format!(
                    "long_window ({long}) must be >= short_window ({short})"
                )));
            }
        }
        Ok(())
    }

    /// Engine parameters for this run.
    pub fn params(&self) -> RebalanceParams {
        RebalanceParams {
            holding_window: self.rebalance.holding_window,
            max_holdings: self.rebalance.max_holdings,
            max_sector_lead: self.rebalance.max_sector_lead,
            adjust_by: self.rebalance.adjust_by,
        }
    }

    /// Full path to the audit log file.
    pub fn audit_path(&self) -> PathBuf {
        Path::new(&self.logging.dir).join(&self.logging.audit_file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn example_toml() -> &'static str {
        r#"
[data]
prices = "./data/stock_data.csv"
portfolio = "./data/portfolio.json"
output = "./data/next_portfolio.json"

[strategy]
kind = "moving_average"
lookback_period = 50

[rebalance]
holding_window = 10
max_holdings = 50
max_sector_lead = 5
adjust_by = 1.0

[logging]
dir = "./logs"
audit_file = "audit.jsonl"
"#
    }

    #[test]
    fn parse_example_config() {
        let config = Config::parse(example_toml()).unwrap();
        assert_eq!(config.data.prices, PathBuf::from("./data/stock_data.csv"));
        assert_eq!(config.strategy.kind, StrategyKind::MovingAverage);
        assert_eq!(config.rebalance.holding_window, 10);
        assert_eq!(config.rebalance.max_sector_lead, 5);
        assert_eq!(config.params(), RebalanceParams::default());
    }

    #[test]
    fn sections_default() {
        let config = Config::parse(
            r#"
[data]
prices = "p.csv"
portfolio = "p.json"
output = "o.json"
"#,
        )
        .unwrap();
        assert_eq!(config.strategy.lookback_period, 50);
        assert_eq!(config.rebalance.max_holdings, 50);
        assert_eq!(config.logging.audit_file, "audit.jsonl");
    }

    #[test]
    fn missing_data_section_rejected() {
        assert!(matches!(
            Config::parse("[rebalance]\nholding_window = 5\n"),
            Err(Error::ConfigParse(_))
        ));
    }

    #[test]
    fn validate_catches_bad_adjust_by() {
        let mut config = Config::parse(example_toml()).unwrap();
        config.rebalance.adjust_by = 1.5;
        assert!(config.validate().is_err());
        config.rebalance.adjust_by = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_catches_zero_window() {
        let mut config = Config::parse(example_toml()).unwrap();
        config.rebalance.holding_window = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_catches_inverted_windows() {
        let mut config = Config::parse(example_toml()).unwrap();
        config.strategy.short_window = Some(30);
        config.strategy.long_window = Some(10);
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_catches_tiny_long_window() {
        let mut config = Config::parse(example_toml()).unwrap();
        config.strategy.short_window = Some(1);
        config.strategy.long_window = Some(2);
        assert!(matches!(config.validate(), Err(Error::Config(_))));
        config.strategy.long_window = Some(3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn windows_from_lookback() {
        let mut config = Config::parse(example_toml()).unwrap();
        config.strategy.lookback_period = 30;
        assert_eq!(config.strategy.windows(), (20, 30));
        config.strategy.short_window = Some(5);
        assert_eq!(config.strategy.windows(), (5, 30));
    }

    #[test]
    fn random_strategy_kind() {
        let toml = example_toml().replace("\"moving_average\"", "\"random\"");
        let config = Config::parse(&toml).unwrap();
        let strategy = config.strategy.build().unwrap();
        assert_eq!(strategy.id(), "random");
        assert!(!strategy.is_deterministic());
    }

    #[test]
    fn audit_path() {
        let config = Config::parse(example_toml()).unwrap();
        assert_eq!(config.audit_path(), PathBuf::from("./logs/audit.jsonl"));
    }
}
