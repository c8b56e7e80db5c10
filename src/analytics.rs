//! Aggregate statistics and report formatting.

use crate::engine::BacktestResult;
use crate::features::FundSummary;
use colored::Colorize;
use serde::{Deserialize, Serialize};
use tabled::{builder::Builder, settings::Style};

/// Score reported when no time point produced a value.
pub const NOT_COMPUTABLE: f64 = -1.0;

/// Annualize a compounded multiplier earned over `months` months.
pub fn annualize(multiplier: f64, months: usize) -> f64 {
    if months == 0 {
        return multiplier;
    }
    multiplier.powf(12.0 / months as f64)
}

/// Insert `value` into an ascending vector, after any equal elements.
pub fn insert_sorted(sorted: &mut Vec<f64>, value: f64) {
    let i = sorted.partition_point(|&x| x <= value);
    sorted.insert(i, value);
}

/// Median of an ascending, non-empty slice.
pub fn median_from_sorted(sorted: &[f64]) -> f64 {
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        sorted[mid]
    } else {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    }
}

/// Median of a sample; [`NOT_COMPUTABLE`] when empty.
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return NOT_COMPUTABLE;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    median_from_sorted(&sorted)
}

/// Arithmetic mean of a sample; [`NOT_COMPUTABLE`] when empty.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return NOT_COMPUTABLE;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// How per-month performances are combined into one score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregation {
    /// Robust to single-fund blowups.
    #[default]
    Median,
    Mean,
}

impl Aggregation {
    /// Aggregate a sample, returning [`NOT_COMPUTABLE`] when it is empty.
    pub fn apply(self, values: &[f64]) -> f64 {
        match self {
            Aggregation::Median => median(values),
            Aggregation::Mean => mean(values),
        }
    }
}

/// How a realized multiplier is turned into a performance number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReturnMeasure {
    /// Compounded multiplier scaled to twelve months.
    #[default]
    Annualized,
    /// Compounded multiplier over the holding window.
    Simple,
}

impl ReturnMeasure {
    /// Apply the measure to a multiplier earned over `months` months.
    pub fn measure(self, multiplier: f64, months: usize) -> f64 {
        match self {
            ReturnMeasure::Annualized => annualize(multiplier, months),
            ReturnMeasure::Simple => multiplier,
        }
    }
}

/// Format backtest results for terminal display and export.
pub struct ResultFormatter;

impl ResultFormatter {
    /// One tab-separated line: name, score and optional details.
    pub fn to_tsv_line(result: &BacktestResult, details: bool) -> String {
        if details {
            format!(
                "{}\t{}\t{}\t{}\t{}",
                result.strategy_name,
                result.score,
                result.months_used,
                result.vs_optimum,
                result.elapsed_ms
            )
        } else {
            format!("{}\t{}", result.strategy_name, result.score)
        }
    }

    /// Print results as tab-separated lines in input order.
    pub fn print_tsv(results: &[BacktestResult], details: bool) {
        for result in results {
            println!("{}", Self::to_tsv_line(result, details));
        }
    }

    /// Print results as a table.
    pub fn print_table(results: &[BacktestResult]) {
        let mut builder = Builder::new();
        builder.push_record(["Strategy", "Score", "Months", "vs Optimum", "Elapsed ms"]);

        for result in results {
            builder.push_record([
                result.strategy_name.clone(),
                Self::format_score(result.score),
                result.months_used.to_string(),
                format!("{:.4}", result.vs_optimum),
                result.elapsed_ms.to_string(),
            ]);
        }

        let table = builder.build().with(Style::rounded()).to_string();
        println!("{}", " STRATEGY SWEEP ".bold().blue());
        println!("{}", table);
    }

    /// Export results to JSON.
    pub fn to_json(results: &[BacktestResult]) -> String {
        serde_json::to_string_pretty(results).unwrap_or_else(|_| "[]".to_string())
    }

    /// Print one row per fund with whole-history statistics.
    pub fn print_fund_summaries(rows: &[(String, f64, u32, FundSummary)]) {
        println!("name\tminimum\tredemption_days\tage_months\tstd_dev\tnegative_months\tgreatest_fall\tgreatest_fall_months\tannualized_return");
        for (name, minimum, days, s) in rows {
            println!(
                "{}\t{:.2}\t{}\t{}\t{:.2}%\t{:.2}%\t{:.2}%\t{}\t{:.2}%",
                name,
                minimum,
                days,
                s.age_months,
                100.0 * s.std_dev,
                100.0 * s.negative_month_ratio,
                100.0 * (s.greatest_fall - 1.0),
                s.greatest_fall_length,
                100.0 * (s.annualized_return - 1.0)
            );
        }
    }

    fn format_score(score: f64) -> String {
        if score == NOT_COMPUTABLE {
            "n/a".yellow().to_string()
        } else {
            format!("{:.4}", score)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_median() {
        assert_eq!(median(&[]), NOT_COMPUTABLE);
        assert_eq!(median(&[7.0]), 7.0);
        assert_eq!(median(&[1.0, 2.0, 3.0]), 2.0);
        assert_eq!(median(&[1.0, 2.0, 3.0, 4.0]), 2.5);
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), 2.5);
    }

    #[test]
    fn test_mean() {
        assert_eq!(mean(&[]), NOT_COMPUTABLE);
        assert_eq!(mean(&[1.0, 2.0, 6.0]), 3.0);
    }

    #[test]
    fn test_insert_sorted_keeps_order() {
        let mut sorted = Vec::new();
        for v in [3.0, 1.0, 2.0, 2.0, 5.0, 0.5] {
            insert_sorted(&mut sorted, v);
        }
        assert_eq!(sorted, vec![0.5, 1.0, 2.0, 2.0, 3.0, 5.0]);
    }

    #[test]
    fn test_median_from_sorted_even() {
        assert_eq!(median_from_sorted(&[0.9, 1.1]), 1.0);
    }

    #[test]
    fn test_annualize() {
        assert!((annualize(1.21, 24) - 1.1).abs() < 1e-12);
        assert_eq!(annualize(1.5, 0), 1.5);
    }

    #[test]
    fn test_aggregation_apply() {
        let values = [1.0, 10.0, 2.0];
        assert_eq!(Aggregation::Median.apply(&values), 2.0);
        assert!((Aggregation::Mean.apply(&values) - 13.0 / 3.0).abs() < 1e-12);
        assert_eq!(Aggregation::Median.apply(&[]), NOT_COMPUTABLE);
    }

    #[test]
    fn test_return_measure() {
        assert_eq!(ReturnMeasure::Simple.measure(1.21, 24), 1.21);
        assert!((ReturnMeasure::Annualized.measure(1.21, 24) - 1.1).abs() < 1e-12);
    }

    #[test]
    fn test_tsv_line() {
        let result = BacktestResult {
            strategy_name: "top(3)".to_string(),
            score: 1.25,
            months_used: 10,
            vs_optimum: 0.5,
            elapsed_ms: 7,
        };
        assert_eq!(ResultFormatter::to_tsv_line(&result, false), "top(3)\t1.25");
        assert_eq!(
            ResultFormatter::to_tsv_line(&result, true),
            "top(3)\t1.25\t10\t0.5\t7"
        );
    }
}
