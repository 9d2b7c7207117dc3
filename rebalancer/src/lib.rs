//! rankbook-rebalancer: command-line driver for the rankbook engine.
//!
//! Loads a price CSV and a portfolio snapshot, rebalances it with the
//! configured strategy, prints the actions and summary, writes the successor
//! portfolio, and appends an audit trail.

pub mod audit;
pub mod config;
pub mod error;
pub mod execution;
