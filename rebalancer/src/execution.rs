//! Execution orchestrator: load → rank → allocate → report → write.
//!
//! This is the main workflow that ties together all components.

use std::path::Path;

use log::info;
use rankbook::persistence;
use rankbook::{
    MarkedPortfolio, Portfolio, RankedTicker, RebalanceAction, RebalanceOutcome, Rebalancer,
};

use crate::audit::{self, AuditLog};
use crate::config::Config;
use crate::error::Result;

/// Options for a rebalance run.
pub struct RunOptions {
    /// Compute and report without writing the successor portfolio
    pub dry_run: bool,
}

/// Load the price index and the portfolio snapshot named in `config`.
fn load_inputs(config: &Config) -> Result<(Rebalancer, Portfolio, usize)> {
    let records = persistence::load_price_records(&config.data.prices)?;
    let portfolio = persistence::load_portfolio(&config.data.portfolio)?;
    info!(
        "Loaded {} price records and portfolio {} ({})",
        records.len(),
        portfolio.id,
        portfolio.date
    );
    Ok((Rebalancer::from_records(&records), portfolio, records.len()))
}

/// Execute a full rebalance run.
pub fn run(config: &Config, opts: &RunOptions) -> Result<RebalanceOutcome> {
    let strategy = config.strategy.build()?;

    // 1. Open audit log
    let mut audit = AuditLog::open(&config.audit_path())?;
    audit::log_run_started(&mut audit, "run", strategy.id(), opts.dry_run)?;

    // 2. Load prices and portfolio
    let (mut engine, portfolio, record_count) = load_inputs(config)?;
    audit::log_portfolio_loaded(&mut audit, &portfolio, record_count)?;

    // 3. Rebalance
    let outcome = engine.rebalance(&portfolio, strategy.as_ref(), &config.params())?;
    audit::log_ranking(&mut audit, &outcome.ranked)?;
    audit::log_actions(&mut audit, &outcome.actions)?;
    audit::log_summary(&mut audit, &outcome.summary)?;

    // 4. Report
    println!(
        "Portfolio {} on {} with {} ({} ranked)\n",
        portfolio.id,
        portfolio.date,
        strategy.id(),
        outcome.ranked.len()
    );
    display_actions(&outcome.actions);
    println!("\n{}", outcome.summary);

    // 5. Dry run stops here
    if opts.dry_run {
        println!("\n[DRY RUN] Successor portfolio not written.");
        audit::log_run_completed(&mut audit, outcome.actions.len(), false)?;
        return Ok(outcome);
    }

    // 6. Write the successor
    write_successor(&outcome.portfolio, &config.data.output)?;
    audit::log_portfolio_written(&mut audit, &config.data.output, &outcome.portfolio)?;
    audit::log_run_completed(&mut audit, outcome.actions.len(), true)?;
    println!(
        "\nNext portfolio ({}) written to {}. Audit logged to {}",
        outcome.portfolio.date,
        config.data.output.display(),
        config.audit_path().display()
    );

    Ok(outcome)
}

fn write_successor(portfolio: &Portfolio, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    persistence::save_portfolio(portfolio, path)?;
    Ok(())
}

/// Print the ranked universe on the portfolio date.
pub fn show_ranking(config: &Config, top: Option<usize>) -> Result<Vec<RankedTicker>> {
    let strategy = config.strategy.build()?;
    let (mut engine, portfolio, _) = load_inputs(config)?;

    let mut ranked = engine.rank(
        strategy.as_ref(),
        &portfolio.date,
        config.rebalance.holding_window,
    );
    if let Some(n) = top {
        ranked.truncate(n);
    }

    println!(
        "RANKING on {} ({}, {}-day window):",
        portfolio.date,
        strategy.id(),
        config.rebalance.holding_window
    );
    if ranked.is_empty() {
        println!("  No tickers scored.");
    }
    for (i, r) in ranked.iter().enumerate() {
        let sector = engine.index().sector_of(&r.ticker).unwrap_or("-");
        println!(
            "  {:>3}  {:8} {:16} {:>8.3}%",
            i + 1,
            r.ticker,
            sector,
            r.roi * 100.0
        );
    }
    Ok(ranked)
}

/// Print the current portfolio marked to market on its own date.
pub fn show_positions(config: &Config) -> Result<()> {
    let (engine, portfolio, _) = load_inputs(config)?;
    let book = MarkedPortfolio::mark(&portfolio, engine.index())?;

    println!(
        "Portfolio {} on {}: ${:.2} total, ${:.2} cash\n",
        portfolio.id,
        portfolio.date,
        book.total_value(),
        book.cash()
    );

    if portfolio.holdings.is_empty() {
        println!("No positions.");
        return Ok(());
    }

    println!("CURRENT PORTFOLIO:");
    let mut tickers: Vec<&str> = book.tickers().collect();
    tickers.sort_unstable();
    for ticker in tickers {
        let qty = book.quantity_of(ticker);
        let value = book.value_of(ticker);
        let weight = if book.total_value() > 0.0 {
            value / book.total_value()
        } else {
            0.0
        };
        println!(
            "  {:8} {:>6} @ ${:>8.2} = ${:>10.2}  ({:.1}%)",
            ticker,
            qty,
            value / qty.max(1) as f64,
            value,
            weight * 100.0,
        );
    }
    Ok(())
}

fn display_actions(actions: &[RebalanceAction]) {
    if actions.is_empty() {
        println!("No actions.");
        return;
    }

    println!("REBALANCE ACTIONS:");
    for action in actions {
        println!("{action}");
    }
}
