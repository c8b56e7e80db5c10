//! Export utilities.
//!
//! Two kinds of files are written here:
//!
//! | Files | Use |
//! |-------|-----|
//! | `<prefix>_data.tsv`, `<prefix>_labels.tsv`, `<prefix>_metadata.tsv` | training data for an external model |
//! | sweep results (TSV, JSON) | archiving and comparing sweeps |
//! | `<fund>.tsv` sub-period tables | inspecting how evenly a fund earned its return |
//!
//! The metadata file written here is the same `name \t month` format the
//! prediction loader reads back, so a model trained on the export can feed
//! [`crate::strategies::PredictionReplay`].

use crate::analytics::annualize;
use crate::benchmark::IndexSeries;
use crate::engine::BacktestResult;
use crate::error::{FundError, Result};
use crate::universe::Universe;
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

/// One training example: a fund at an as-of month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MlRow {
    pub name: String,
    /// As-of month (months ago).
    pub month: usize,
    /// Annualized return from the fund's inception up to and including `month`.
    pub features: Vec<f64>,
    /// Annualized return realized after `month`, up to the split end.
    pub label: f64,
}

/// Rows for as-of months `split_end + 1 ..= split_start` of every fund.
///
/// Labels measure months `month - 1` down to `split_end`. A fund contributes
/// only the months its history covers.
pub fn build_rows(universe: &Universe, split_end: usize, split_start: usize) -> Vec<MlRow> {
    let mut rows = Vec::new();
    for fund in universe.funds() {
        let returns = fund.features.returns();
        for month in split_end + 1..=split_start {
            if !fund.covers(month) {
                break;
            }
            let history = fund.duration() - month;
            let future = month - split_end;
            rows.push(MlRow {
                name: fund.name().to_string(),
                month,
                features: vec![annualize(returns.value_at(month, history - 1), history)],
                label: annualize(returns.value_at(split_end, future - 1), future),
            });
        }
    }
    rows
}

/// Paths of the three files of a split.
pub fn split_paths(dir: &Path, prefix: &str) -> [PathBuf; 3] {
    [
        dir.join(format!("{}_data.tsv", prefix)),
        dir.join(format!("{}_labels.tsv", prefix)),
        dir.join(format!("{}_metadata.tsv", prefix)),
    ]
}

/// Write rows as the data, labels and metadata files of one split.
pub fn write_split(rows: &[MlRow], dir: &Path, prefix: &str) -> Result<()> {
    let [data_path, labels_path, metadata_path] = split_paths(dir, prefix);
    let mut data = BufWriter::new(File::create(data_path)?);
    let mut labels = BufWriter::new(File::create(labels_path)?);
    let mut metadata = BufWriter::new(File::create(metadata_path)?);

    for row in rows {
        let features: Vec<String> = row.features.iter().map(|v| v.to_string()).collect();
        writeln!(data, "{}", features.join("\t"))?;
        writeln!(labels, "{}", row.label)?;
        writeln!(metadata, "{}\t{}", row.name, row.month)?;
    }
    data.flush()?;
    labels.flush()?;
    metadata.flush()?;
    Ok(())
}

/// Row counts of an export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MlExportSummary {
    pub train_rows: usize,
    pub test_rows: usize,
}

/// Write `train_*` and `test_*` files into `dir`.
///
/// The most recent `test_months` months form the test split; older months
/// form the training split, whose labels stop where the test split begins.
pub fn export_ml(universe: &Universe, test_months: usize, dir: &Path) -> Result<MlExportSummary> {
    let duration = universe.max_duration();
    if test_months == 0 || test_months >= duration {
        return Err(FundError::InvalidInput(format!(
            "test months must be between 1 and {}",
            duration.saturating_sub(1)
        )));
    }

    let train = build_rows(universe, test_months, duration);
    let test = build_rows(universe, 0, test_months);
    write_split(&train, dir, "train")?;
    write_split(&test, dir, "test")?;

    info!(
        "Exported {} training and {} test rows to {}",
        train.len(),
        test.len(),
        dir.display()
    );
    Ok(MlExportSummary {
        train_rows: train.len(),
        test_rows: test.len(),
    })
}

/// Export sweep results as tab-separated lines with a header.
pub fn export_results_tsv(results: &[BacktestResult], path: impl AsRef<Path>) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    writeln!(writer, "name\tscore\tmonths\tvs_optimum\telapsed_ms")?;
    for result in results {
        writeln!(
            writer,
            "{}\t{}\t{}\t{}\t{}",
            result.strategy_name,
            result.score,
            result.months_used,
            result.vs_optimum,
            result.elapsed_ms
        )?;
    }
    writer.flush()?;
    Ok(())
}

/// Export sweep results as a JSON array.
pub fn export_results_json(results: &[BacktestResult], path: impl AsRef<Path>) -> Result<()> {
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, results)?;
    Ok(())
}

/// Export results, as JSON when the path ends in `.json` and as TSV otherwise.
pub fn export_results(results: &[BacktestResult], path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if is_json {
        export_results_json(results, path)?;
    } else {
        export_results_tsv(results, path)?;
    }
    info!("Wrote {} results to {}", results.len(), path.display());
    Ok(())
}

/// Write one `<fund>.tsv` per fund holding its mean sub-period return table.
///
/// Line `end` lists the cells `(end, 0)`, `(end, 1)`, ... separated by tabs.
/// With a benchmark every cell is divided by the benchmark's annualized
/// return over the same months. Returns the number of files written.
pub fn write_sub_periods(
    universe: &Universe,
    index: Option<&IndexSeries>,
    dir: &Path,
) -> Result<usize> {
    if let Some(index) = index {
        if index.len() < universe.max_duration() {
            return Err(FundError::InvalidInput(format!(
                "benchmark '{}' covers {} months, {} needed",
                index.name,
                index.len(),
                universe.max_duration()
            )));
        }
    }
    std::fs::create_dir_all(dir)?;

    for fund in universe.funds() {
        let table = fund.features.sub_period_table();
        let file_name = format!("{}.tsv", fund.name().replace(&['/', '\\'][..], "_"));
        let mut writer = BufWriter::new(File::create(dir.join(file_name))?);
        for end in 0..table.duration() {
            let cells: Vec<String> = table
                .row(end)
                .iter()
                .enumerate()
                .map(|(span, &mean)| {
                    let scale = index.and_then(|i| i.annualized(end, span)).unwrap_or(1.0);
                    (mean / scale).to_string()
                })
                .collect();
            writeln!(writer, "{}", cells.join("\t"))?;
        }
        writer.flush()?;
    }

    info!(
        "Wrote sub-period tables of {} funds to {}",
        universe.len(),
        dir.display()
    );
    Ok(universe.len())
}
