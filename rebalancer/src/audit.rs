//! JSONL audit trail logging.
//!
//! Each rebalancer run appends events to an audit.jsonl file,
//! one JSON object per line.

use std::fs::{self, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use chrono::{DateTime, Utc};
use rankbook::{Pick, Portfolio, RebalanceAction, RebalanceSummary};
use serde::Serialize;

use crate::error::Result;

/// An audit event written to the JSONL trail.
#[derive(Debug, Clone, Serialize)]
pub struct AuditEvent {
    pub event: &'static str,
    pub ts: DateTime<Utc>,
    #[serde(flatten)]
    pub data: serde_json::Value,
}

/// Append-only audit logger.
pub struct AuditLog {
    writer: BufWriter<std::fs::File>,
}

impl AuditLog {
    /// Open (or create) the audit log file for appending.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new().create(true).append(true).open(path)?;

        Ok(Self {
            writer: BufWriter::new(file),
        })
    }

    /// Log an event with arbitrary JSON data.
    pub fn log(&mut self, event: &'static str, data: serde_json::Value) -> Result<()> {
        let entry = AuditEvent {
            event,
            ts: Utc::now(),
            data,
        };
        let json = serde_json::to_string(&entry)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        writeln!(self.writer, "{json}")?;
        self.writer.flush()?;
        Ok(())
    }

    /// Log a simple event with no additional data.
    pub fn log_simple(&mut self, event: &'static str) -> Result<()> {
        self.log(event, serde_json::json!({}))
    }
}

pub fn log_run_started(
    audit: &mut AuditLog,
    command: &str,
    strategy_id: &str,
    dry_run: bool,
) -> Result<()> {
    audit.log(
        "run_started",
        serde_json::json!({
            "command": command,
            "strategy": strategy_id,
            "dry_run": dry_run,
        }),
    )
}

pub fn log_portfolio_loaded(
    audit: &mut AuditLog,
    portfolio: &Portfolio,
    price_records: usize,
) -> Result<()> {
    let holdings: Vec<_> = portfolio
        .holdings
        .iter()
        .map(|p| serde_json::json!({ "ticker": p.ticker, "qty": p.quantity }))
        .collect();

    audit.log(
        "portfolio_loaded",
        serde_json::json!({
            "id": portfolio.id,
            "date": portfolio.date,
            "cash": portfolio.cash,
            "holdings": holdings,
            "price_records": price_records,
        }),
    )
}

pub fn log_ranking(audit: &mut AuditLog, ranked: &[Pick]) -> Result<()> {
    let picks: Vec<_> = ranked
        .iter()
        .map(|p| {
            serde_json::json!({
                "ticker": p.ticker,
                "roi": p.roi,
                "origin": format!("{:?}", p.origin).to_lowercase(),
            })
        })
        .collect();

    audit.log("ranking_computed", serde_json::json!({ "ranked": picks }))
}

pub fn log_actions(audit: &mut AuditLog, actions: &[RebalanceAction]) -> Result<()> {
    let action_data: Vec<_> = actions
        .iter()
        .map(|a| {
            serde_json::json!({
                "ticker": a.ticker,
                "action": a.action_type.to_string(),
                "shares": a.traded_shares,
                "outstanding": a.outstanding_shares,
                "value": a.new_holding_value,
                "speculated_roi": a.speculated_roi,
                "actual_roi": a.actual_roi,
            })
        })
        .collect();

    audit.log("actions_planned", serde_json::json!({ "actions": action_data }))
}

pub fn log_summary(audit: &mut AuditLog, summary: &RebalanceSummary) -> Result<()> {
    let data = serde_json::to_value(summary)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    audit.log("summary", data)
}

pub fn log_portfolio_written(audit: &mut AuditLog, path: &Path, portfolio: &Portfolio) -> Result<()> {
    audit.log(
        "portfolio_written",
        serde_json::json!({
            "path": path.display().to_string(),
            "date": portfolio.date,
            "cash": portfolio.cash,
            "positions": portfolio.holdings.len(),
        }),
    )
}

pub fn log_run_completed(audit: &mut AuditLog, actions: usize, written: bool) -> Result<()> {
    audit.log(
        "run_completed",
        serde_json::json!({
            "actions": actions,
            "written": written,
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rankbook::ActionType;

    fn read_lines(path: &Path) -> Vec<serde_json::Value> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[test]
    fn audit_log_writes_jsonl() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test_audit.jsonl");

        {
            let mut log = AuditLog::open(&path).unwrap();
            log.log_simple("test_event").unwrap();
            log.log("test_data", serde_json::json!({"key": "value"}))
                .unwrap();
        }

        let lines = read_lines(&path);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["event"], "test_event");
        assert_eq!(lines[1]["key"], "value");
        assert!(lines[1]["ts"].is_string());
    }

    #[test]
    fn audit_log_appends_across_opens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.jsonl");
        AuditLog::open(&path).unwrap().log_simple("a").unwrap();
        AuditLog::open(&path).unwrap().log_simple("b").unwrap();
        assert_eq!(read_lines(&path).len(), 2);
    }

    #[test]
    fn audit_log_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("subdir").join("deep").join("audit.jsonl");

        let mut log = AuditLog::open(&path).unwrap();
        log.log_simple("test").unwrap();

        assert!(path.exists());
    }

    #[test]
    fn action_and_summary_events() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.jsonl");
        let action = RebalanceAction::new(ActionType::Buy, "AAPL", 5, 0.02, 5, 500.0);
        let summary = RebalanceSummary::from_actions(std::slice::from_ref(&action), 20.0);
        {
            let mut log = AuditLog::open(&path).unwrap();
            log_actions(&mut log, &[action]).unwrap();
            log_summary(&mut log, &summary).unwrap();
        }

        let lines = read_lines(&path);
        assert_eq!(lines[0]["event"], "actions_planned");
        assert_eq!(lines[0]["actions"][0]["action"], "BUY");
        assert_eq!(lines[0]["actions"][0]["shares"], 5);
        assert!(lines[0]["actions"][0]["actual_roi"].is_null());
        assert_eq!(lines[1]["event"], "summary");
        assert_eq!(lines[1]["remaining_cash"], 20.0);
        assert_eq!(lines[1]["total_portfolio_value"], 520.0);
    }
}
