//! Loading of fund snapshots and auxiliary files.
//!
//! The fund file is tab-separated, one fund per line:
//!
//! ```text
//! name  minimum  settlement_days  redemption_days  active  r_0  r_1 ... r_k
//! ```
//!
//! Returns are locale-formatted percentages (`1,10` is +1.10%), most recent
//! month first, and are stored as multipliers (`1.011`). Any malformed line
//! aborts loading with its line number.

use crate::benchmark::IndexSeries;
use crate::error::{FundError, Result};
use crate::strategies::PredictionTable;
use crate::types::FundRecord;
use csv::{ReaderBuilder, StringRecord};
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use tracing::{debug, info};

/// Number of leading fields before the monthly returns.
pub const HEADER_FIELDS: usize = 5;

/// Data source configuration.
#[derive(Debug, Clone)]
pub struct DataConfig {
    /// Field delimiter of the fund file.
    pub delimiter: u8,
    /// Drop funds whose history is shorter than this many months.
    pub min_months: usize,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            delimiter: b'\t',
            min_months: 1,
        }
    }
}

/// Parse a decimal written with either `,` or `.` as separator.
pub fn parse_decimal(s: &str) -> std::result::Result<f64, String> {
    let cleaned = s.trim().trim_end_matches('%').trim().replace(',', ".");
    cleaned
        .parse::<f64>()
        .map_err(|_| format!("invalid number '{}'", s.trim()))
}

/// Parse a percentage return into a multiplier: `"1,10"` becomes `1.011`.
pub fn parse_percentage(s: &str) -> std::result::Result<f64, String> {
    Ok(1.0 + parse_decimal(s)? / 100.0)
}

/// Parse an amount with `.` thousands separators and `,` decimals.
///
/// `"R$ 1.000,50"` becomes `1000.5`; an empty field is zero.
pub fn parse_amount(s: &str) -> std::result::Result<f64, String> {
    let trimmed = s.trim().trim_start_matches("R$").trim();
    if trimmed.is_empty() {
        return Ok(0.0);
    }
    trimmed
        .replace('.', "")
        .replace(',', ".")
        .parse::<f64>()
        .map_err(|_| format!("invalid amount '{}'", s.trim()))
}

/// Parse a day count such as `"30"` or `"D+30"`.
pub fn parse_days(s: &str) -> std::result::Result<u32, String> {
    let trimmed = s.trim().trim_start_matches("D+").trim();
    if trimmed.is_empty() {
        return Ok(0);
    }
    trimmed
        .parse::<u32>()
        .map_err(|_| format!("invalid day count '{}'", s.trim()))
}

fn parse_record(record: &StringRecord, line: usize) -> Result<FundRecord> {
    if record.len() <= HEADER_FIELDS {
        return Err(FundError::parse(
            line,
            format!(
                "expected at least {} fields, found {}",
                HEADER_FIELDS + 1,
                record.len()
            ),
        ));
    }
    let field = |i: usize| record.get(i).unwrap_or("");

    let name = field(0).trim().to_string();
    if name.is_empty() {
        return Err(FundError::parse(line, "empty fund name"));
    }
    let minimum_investment = parse_amount(field(1)).map_err(|e| FundError::parse(line, e))?;
    let settlement_days = parse_days(field(2)).map_err(|e| FundError::parse(line, e))?;
    let redemption_days = parse_days(field(3)).map_err(|e| FundError::parse(line, e))?;

    let mut monthly = Vec::with_capacity(record.len() - HEADER_FIELDS);
    for (i, raw) in record.iter().enumerate().skip(HEADER_FIELDS) {
        let multiplier = parse_percentage(raw)
            .map_err(|e| FundError::parse(line, format!("month field {}: {}", i, e)))?;
        if !(multiplier.is_finite() && multiplier > 0.0) {
            return Err(FundError::parse(
                line,
                format!("month field {}: return '{}' is not above -100%", i, raw.trim()),
            ));
        }
        monthly.push(multiplier);
    }

    Ok(FundRecord {
        name,
        minimum_investment,
        settlement_days,
        redemption_days,
        active: field(4).trim().to_string(),
        monthly,
    })
}

/// Parse fund records from any reader.
pub fn parse_funds<R: Read>(reader: R, config: &DataConfig) -> Result<Vec<FundRecord>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .delimiter(config.delimiter)
        .flexible(true)
        .quoting(false)
        .from_reader(reader);

    let mut funds = Vec::new();
    let mut dropped = 0;
    for result in reader.records() {
        let record = result?;
        let line = record.position().map_or(0, |p| p.line() as usize);
        if record.iter().all(|f| f.trim().is_empty()) {
            continue;
        }
        let fund = parse_record(&record, line)?;
        if fund.duration() < config.min_months {
            debug!("Dropping {}: {} months of history", fund.name, fund.duration());
            dropped += 1;
            continue;
        }
        funds.push(fund);
    }

    if dropped > 0 {
        info!("Dropped {} funds with short histories", dropped);
    }
    if funds.is_empty() {
        return Err(FundError::NoData);
    }
    Ok(funds)
}

/// Load fund records from a file.
pub fn load_funds(path: impl AsRef<Path>, config: &DataConfig) -> Result<Vec<FundRecord>> {
    let path = path.as_ref();
    info!("Loading funds from: {}", path.display());
    let funds = parse_funds(File::open(path)?, config)?;
    info!(
        "Loaded {} funds, longest history {} months",
        funds.len(),
        funds.iter().map(|f| f.duration()).max().unwrap_or(0)
    );
    Ok(funds)
}

fn non_empty_lines<R: Read>(reader: R) -> impl Iterator<Item = (usize, std::io::Result<String>)> {
    BufReader::new(reader)
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line))
        .filter(|(_, line)| line.as_ref().map_or(true, |l| !l.trim().is_empty()))
}

/// Parse a single-column percentage series, most recent month first.
pub fn parse_index_series<R: Read>(reader: R, name: &str) -> Result<IndexSeries> {
    let mut monthly = Vec::new();
    for (line, text) in non_empty_lines(reader) {
        let text = text?;
        let value = parse_percentage(&text).map_err(|e| FundError::parse(line, e))?;
        monthly.push(value);
    }
    if monthly.is_empty() {
        return Err(FundError::NoData);
    }
    Ok(IndexSeries::new(name, monthly))
}

/// Load a benchmark series; its name is the file stem.
pub fn load_index_series(path: impl AsRef<Path>) -> Result<IndexSeries> {
    let path = path.as_ref();
    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "index".to_string());
    let series = parse_index_series(File::open(path)?, &name)?;
    info!("Loaded benchmark {} ({} months)", series.name, series.len());
    Ok(series)
}

/// Pair a metadata reader (`name \t month`) with a predictions reader (one
/// score per line).
pub fn parse_predictions<M: Read, P: Read>(metadata: M, predictions: P) -> Result<PredictionTable> {
    let mut keys = Vec::new();
    for (line, text) in non_empty_lines(metadata) {
        let text = text?;
        let mut fields = text.split('\t');
        let name = fields.next().unwrap_or("").trim();
        let month = fields
            .next()
            .ok_or_else(|| FundError::parse(line, "missing month field"))?
            .trim()
            .parse::<usize>()
            .map_err(|_| FundError::parse(line, "invalid month field"))?;
        keys.push((name.to_string(), month));
    }

    let mut scores = Vec::new();
    for (line, text) in non_empty_lines(predictions) {
        let text = text?;
        scores.push(parse_decimal(&text).map_err(|e| FundError::parse(line, e))?);
    }
    PredictionTable::from_pairs(keys, scores)
}

/// Load a prediction table when both files are given and exist.
///
/// Returns `Ok(None)` when either file is missing, so the strategy relying
/// on it can be left out.
pub fn load_predictions(
    metadata: Option<&Path>,
    predictions: Option<&Path>,
) -> Result<Option<PredictionTable>> {
    let (Some(metadata), Some(predictions)) = (metadata, predictions) else {
        return Ok(None);
    };
    if !metadata.exists() || !predictions.exists() {
        info!("Prediction files not found, prediction strategies disabled");
        return Ok(None);
    }
    let table = parse_predictions(File::open(metadata)?, File::open(predictions)?)?;
    info!("Loaded {} predictions", table.len());
    Ok(Some(table))
}
