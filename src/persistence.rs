//! File-based input and output: price CSVs and portfolio JSON.
//!
//! Price files carry the header `ticker,sector,date,close,open,low,high,volume`.
//! Rows with fewer than eight fields are skipped; a field that fails to parse
//! aborts the load.
//!
//! # Usage
//!
//! ```ignore
//! use rankbook::persistence;
//! use std::path::Path;
//!
//! let records = persistence::load_price_records(Path::new("prices.csv"))?;
//! let portfolio = persistence::load_portfolio(Path::new("portfolio.json"))?;
//! persistence::save_portfolio(&portfolio, Path::new("next.json"))?;
//! ```

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use log::debug;

use crate::types::{Portfolio, PriceRecord};

const FIELD_COUNT: usize = 8;

/// Errors from reading or writing data files.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("line {line}: {reason}")]
    InvalidRecord { line: u64, reason: String },
}

fn open(path: &Path) -> Result<File, PersistenceError> {
    File::open(path).map_err(|source| PersistenceError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Load every price record from a CSV file.
pub fn load_price_records(path: &Path) -> Result<Vec<PriceRecord>, PersistenceError> {
    let records = parse_price_records(BufReader::new(open(path)?))?;
    debug!("loaded {} price records from {}", records.len(), path.display());
    Ok(records)
}

/// Parse price records from any CSV source with a header row.
pub fn parse_price_records<R: Read>(reader: R) -> Result<Vec<PriceRecord>, PersistenceError> {
    let mut csv = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut records = Vec::new();
    for row in csv.records() {
        let row = row?;
        let line = row.position().map_or(0, |p| p.line());
        if row.len() < FIELD_COUNT {
            debug!("skipping short row at line {line} ({} fields)", row.len());
            continue;
        }
        records.push(PriceRecord {
            ticker: row[0].to_string(),
            sector: row[1].to_string(),
            date: row[2].to_string(),
            close: field(&row[3], "close", line)?,
            open: field(&row[4], "open", line)?,
            low: field(&row[5], "low", line)?,
            high: field(&row[6], "high", line)?,
            volume: field(&row[7], "volume", line)?,
        });
    }
    Ok(records)
}

fn field<T: FromStr>(raw: &str, name: &str, line: u64) -> Result<T, PersistenceError>
where
    T::Err: std::fmt::Display,
{
    raw.parse().map_err(|e| PersistenceError::InvalidRecord {
        line,
        reason: format!("bad {name} {raw:?}: {e}"),
    })
}

/// Load a portfolio snapshot from a JSON file.
pub fn load_portfolio(path: &Path) -> Result<Portfolio, PersistenceError> {
    let portfolio = serde_json::from_reader(BufReader::new(open(path)?))?;
    Ok(portfolio)
}

/// Parse a portfolio snapshot from a JSON string.
pub fn portfolio_from_json(json: &str) -> Result<Portfolio, PersistenceError> {
    Ok(serde_json::from_str(json)?)
}

/// Serialize a portfolio snapshot as pretty JSON.
pub fn portfolio_to_json(portfolio: &Portfolio) -> Result<String, PersistenceError> {
    Ok(serde_json::to_string_pretty(portfolio)?)
}

/// Write a portfolio snapshot as pretty JSON, replacing any existing file.
pub fn save_portfolio(portfolio: &Portfolio, path: &Path) -> Result<(), PersistenceError> {
    let io_err = |source| PersistenceError::Io {
        path: path.to_path_buf(),
        source,
    };
    let file = File::create(path).map_err(io_err)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, portfolio)?;
    writeln!(writer).map_err(io_err)?;
    writer.flush().map_err(io_err)?;
    Ok(())
}
