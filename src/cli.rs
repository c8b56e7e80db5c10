//! Command-line interface for the fund strategy simulator.

use fundsim::analytics::{Aggregation, ResultFormatter, ReturnMeasure};
use fundsim::benchmark::{BenchmarkComparison, BenchmarkSummary};
use fundsim::config::SweepFileConfig;
use fundsim::data::{load_funds, load_index_series, load_predictions, DataConfig};
use fundsim::engine::{BacktestConfig, BacktestResult};
use fundsim::error::{FundError, Result};
use fundsim::export::{export_ml, export_results, write_sub_periods};
use fundsim::optimize::{OptimizerConfig, WeightOptimizer};
use fundsim::sweep::{IntRange, StrategySweep, SweepGrid};
use fundsim::types::{Direction, FeatureKind};
use fundsim::universe::Universe;

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

/// Fundsim - backtests of investment fund selection strategies.
#[derive(Parser)]
#[command(name = "fundsim")]
#[command(version)]
#[command(about = "Backtests fund selection strategies over monthly return histories")]
#[command(long_about = None)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Output format
    #[arg(short, long, value_enum, default_value = "tsv", global = true)]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Sweep single-feature strategies over a parameter grid
    Sweep {
        /// Path to the fund file
        #[arg(short, long, default_value = "get.tsv")]
        data: PathBuf,

        /// Largest number of funds to pick
        #[arg(long, default_value = "10")]
        max_funds: usize,

        /// Smallest number of funds to pick
        #[arg(long, default_value = "1")]
        min_funds: usize,

        /// Largest look-back and minimum-history window in months
        #[arg(long, default_value = "60")]
        max_months: usize,

        /// Step between windows
        #[arg(long, default_value = "1")]
        month_step: usize,

        /// Features to rank by (default: all)
        #[arg(short, long, value_delimiter = ',')]
        features: Vec<FeatureKind>,

        /// Leave out the random baselines
        #[arg(long)]
        no_random: bool,

        /// Metadata file of precomputed predictions
        #[arg(long, requires = "predictions")]
        prediction_metadata: Option<PathBuf>,

        /// Predictions file, one score per metadata line
        #[arg(long, requires = "prediction_metadata")]
        predictions: Option<PathBuf>,

        /// Number of funds for the prediction strategy
        #[arg(long, default_value = "10")]
        prediction_funds: usize,

        /// Also write the results to this file (JSON for `.json`, TSV otherwise)
        #[arg(long)]
        export: Option<PathBuf>,

        #[command(flatten)]
        backtest: BacktestArgs,
    },

    /// Run the sweep, benchmark and optimizer sections of a configuration file
    RunConfig {
        /// Path to TOML configuration file
        #[arg(short, long)]
        config: PathBuf,

        /// Show a progress bar
        #[arg(long)]
        progress: bool,

        /// Print months used, ratio to optimum and elapsed time
        #[arg(long)]
        details: bool,

        /// Also write the results to this file (JSON for `.json`, TSV otherwise)
        #[arg(long)]
        export: Option<PathBuf>,
    },

    /// Generate an example configuration file
    Init {
        /// Output path for config file
        #[arg(long, default_value = "sweep.toml")]
        path: PathBuf,
    },

    /// Print whole-history statistics of every fund
    Summary {
        /// Path to the fund file
        #[arg(short, long, default_value = "get.tsv")]
        data: PathBuf,
    },

    /// Print each fund's mean annualized return over all of its sub-periods
    SubPeriods {
        /// Path to the fund file
        #[arg(short, long, default_value = "get.tsv")]
        data: PathBuf,

        /// Write one table per fund into this directory
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Divide the written tables by this benchmark series
        #[arg(short, long, requires = "output_dir")]
        index: Option<PathBuf>,
    },

    /// Compare the funds and the optimum fund against a benchmark series
    Compare {
        /// Path to the fund file
        #[arg(short, long, default_value = "get.tsv")]
        data: PathBuf,

        /// Benchmark series, one percentage per line
        #[arg(short, long, default_value = "cdi.tsv")]
        index: PathBuf,

        /// Most recent months to compare (default: all)
        #[arg(short, long)]
        months: Option<usize>,
    },

    /// Search weights of the weighted multi-feature strategy
    Optimize {
        /// Path to the fund file
        #[arg(short, long, default_value = "get.tsv")]
        data: PathBuf,

        /// Number of funds to pick
        #[arg(short, long, default_value = "1")]
        num_funds: usize,

        /// Look-back window in months
        #[arg(long, default_value = "3")]
        lookback: usize,

        /// Minimum history in months
        #[arg(long, default_value = "6")]
        min_history: usize,

        /// One weight vector per picked fund
        #[arg(long)]
        per_slot: bool,

        /// Number of rounds
        #[arg(short, long, default_value = "20")]
        rounds: usize,

        /// Largest move of a weight in the first round
        #[arg(long, default_value = "1.0")]
        step: f64,

        #[command(flatten)]
        backtest: BacktestArgs,
    },

    /// Export train and test files for an external model
    ExportMl {
        /// Path to the fund file
        #[arg(short, long, default_value = "get.tsv")]
        data: PathBuf,

        /// Output directory
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,

        /// Most recent months reserved for the test split
        #[arg(short, long, default_value = "1")]
        test_months: usize,
    },

    /// Validate a fund file
    Validate {
        /// Path to the fund file
        #[arg(short, long)]
        data: PathBuf,
    },

    /// Show information about available strategies
    Strategies,
}

/// Backtest settings shared by several commands.
#[derive(Args, Clone, Debug)]
pub struct BacktestArgs {
    /// Aggregation of monthly performances
    #[arg(long, value_enum, default_value = "median")]
    pub aggregation: AggregationArg,

    /// Realized return measure
    #[arg(long, value_enum, default_value = "annualized")]
    pub measure: MeasureArg,

    /// Months of realized future (0 = up to the present)
    #[arg(long, default_value = "0")]
    pub holding: usize,

    /// An as-of month needs more active funds than this
    #[arg(long, default_value = "0")]
    pub threshold: usize,

    /// Oldest as-of month to evaluate
    #[arg(long)]
    pub max_as_of: Option<usize>,

    /// Base seed of random strategies
    #[arg(long, default_value = "42")]
    pub seed: u64,

    /// Show a progress bar
    #[arg(long)]
    pub progress: bool,

    /// Print months used, ratio to optimum and elapsed time
    #[arg(long)]
    pub details: bool,
}

impl BacktestArgs {
    fn to_config(&self) -> BacktestConfig {
        BacktestConfig {
            aggregation: self.aggregation.into(),
            return_measure: self.measure.into(),
            holding_months: self.holding,
            min_funds_threshold: self.threshold,
            max_as_of: self.max_as_of,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Tsv,
    Table,
    Json,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum AggregationArg {
    Median,
    Mean,
}

impl From<AggregationArg> for Aggregation {
    fn from(arg: AggregationArg) -> Self {
        match arg {
            AggregationArg::Median => Aggregation::Median,
            AggregationArg::Mean => Aggregation::Mean,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum MeasureArg {
    Annualized,
    Simple,
}

impl From<MeasureArg> for ReturnMeasure {
    fn from(arg: MeasureArg) -> Self {
        match arg {
            MeasureArg::Annualized => ReturnMeasure::Annualized,
            MeasureArg::Simple => ReturnMeasure::Simple,
        }
    }
}

impl Cli {
    /// Initialize logging based on verbosity level.
    pub fn init_logging(&self) {
        let level = match self.verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            2 => Level::DEBUG,
            _ => Level::TRACE,
        };

        let subscriber = FmtSubscriber::builder()
            .with_max_level(level)
            .with_target(false)
            .with_writer(std::io::stderr)
            .finish();

        if tracing::subscriber::set_global_default(subscriber).is_err() {
            eprintln!("Warning: a tracing subscriber was already installed");
        }
    }
}

/// Run the CLI application.
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    cli.init_logging();

    match &cli.command {
        Commands::Sweep {
            data,
            max_funds,
            min_funds,
            max_months,
            month_step,
            features,
            no_random,
            prediction_metadata,
            predictions,
            prediction_funds,
            export,
            backtest,
        } => {
            let grid = SweepGrid {
                fund_counts: IntRange::new(*min_funds, *max_funds, 1),
                lookbacks: IntRange::new(0, *max_months, *month_step),
                min_histories: IntRange::new(0, *max_months, *month_step),
                features: if features.is_empty() {
                    FeatureKind::ALL.to_vec()
                } else {
                    features.clone()
                },
                directions: vec![Direction::Highest, Direction::Lowest],
                include_random: !no_random,
            };
            run_sweep(
                data,
                grid,
                prediction_metadata.as_deref(),
                predictions.as_deref(),
                *prediction_funds,
                export.as_deref(),
                backtest,
                cli.output,
            )
        }

        Commands::RunConfig {
            config,
            progress,
            details,
            export,
        } => run_from_config(config, *progress, *details, export.as_deref(), cli.output),

        Commands::Init { path } => init_config(path),

        Commands::Summary { data } => print_summary(data),

        Commands::SubPeriods {
            data,
            output_dir,
            index,
        } => print_sub_periods(data, output_dir.as_deref(), index.as_deref()),

        Commands::Compare {
            data,
            index,
            months,
        } => compare_index(data, index, *months),

        Commands::Optimize {
            data,
            num_funds,
            lookback,
            min_history,
            per_slot,
            rounds,
            step,
            backtest,
        } => {
            let config = OptimizerConfig {
                num_funds: *num_funds,
                lookback: *lookback,
                min_history: *min_history,
                per_slot: *per_slot,
                rounds: *rounds,
                initial_step: *step,
                seed: backtest.seed,
            };
            run_optimizer(data, config, backtest, cli.output)
        }

        Commands::ExportMl {
            data,
            output_dir,
            test_months,
        } => {
            let universe = load_universe(data, &DataConfig::default())?;
            let summary = export_ml(&universe, *test_months, output_dir)?;
            println!(
                "Wrote {} training rows and {} test rows to {}",
                summary.train_rows,
                summary.test_rows,
                output_dir.display()
            );
            Ok(())
        }

        Commands::Validate { data } => validate_data(data),

        Commands::Strategies => {
            print_strategies();
            Ok(())
        }
    }
}

fn load_universe(path: &Path, config: &DataConfig) -> Result<Universe> {
    let records = load_funds(path, config)?;
    Universe::build(records)
}

fn emit(results: &[BacktestResult], output: OutputFormat, details: bool) {
    match output {
        OutputFormat::Tsv => ResultFormatter::print_tsv(results, details),
        OutputFormat::Table => ResultFormatter::print_table(results),
        OutputFormat::Json => println!("{}", ResultFormatter::to_json(results)),
    }
}

fn run_sweep(
    data: &Path,
    grid: SweepGrid,
    prediction_metadata: Option<&Path>,
    predictions: Option<&Path>,
    prediction_funds: usize,
    export: Option<&Path>,
    backtest: &BacktestArgs,
    output: OutputFormat,
) -> Result<()> {
    grid.validate()?;
    let universe = load_universe(data, &DataConfig::default())?;
    let predictions = load_predictions(prediction_metadata, predictions)?.map(Arc::new);

    let mut specs = grid.generate();
    if predictions.is_some() {
        specs.push(fundsim::strategies::StrategySpec::Prediction {
            num_funds: prediction_funds,
        });
    }

    let config = backtest.to_config();
    let results = StrategySweep::new(&universe, &config)
        .with_seed(backtest.seed)
        .with_predictions(predictions)
        .with_progress(backtest.progress)
        .run(&specs)?;
    emit(&results, output, backtest.details);
    if let Some(path) = export {
        export_results(&results, path)?;
    }
    Ok(())
}

fn run_from_config(
    config_path: &Path,
    progress: bool,
    details: bool,
    export: Option<&Path>,
    output: OutputFormat,
) -> Result<()> {
    let file_config = SweepFileConfig::load(config_path)?;
    let run = file_config.run(progress)?;

    if let Some(path) = export {
        export_results(&run.results, path)?;
    }
    if output == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&run)?);
        return Ok(());
    }

    if !run.results.is_empty() {
        emit(&run.results, output, details);
    }
    if let Some(summary) = &run.benchmark {
        print_benchmark(summary);
    }
    if let Some(rounds) = &run.optimizer {
        for round in rounds {
            println!("{}", round.to_tsv_line());
        }
    }
    Ok(())
}

fn init_config(path: &Path) -> Result<()> {
    std::fs::write(path, SweepFileConfig::example())?;
    println!("Created example configuration file: {}", path.display());
    println!("\nEdit this file to customize your sweep, then run:");
    println!("  fundsim run-config -c {}", path.display());
    Ok(())
}

fn print_summary(data: &Path) -> Result<()> {
    let universe = load_universe(data, &DataConfig::default())?;
    let rows: Vec<_> = universe
        .funds()
        .iter()
        .filter_map(|fund| {
            fund.features.summary().map(|summary| {
                (
                    fund.name().to_string(),
                    fund.record.minimum_investment,
                    fund.record.redemption_delay(),
                    summary,
                )
            })
        })
        .collect();
    ResultFormatter::print_fund_summaries(&rows);
    Ok(())
}

fn compare_index(data: &Path, index: &Path, months: Option<usize>) -> Result<()> {
    let universe = load_universe(data, &DataConfig::default())?;
    let series = load_index_series(index)?;
    let summary = BenchmarkComparison::new(&universe, &series).summary(months)?;
    print_benchmark(&summary);
    Ok(())
}

fn print_benchmark(summary: &BenchmarkSummary) {
    println!("average/{}\t{}", summary.index, summary.average_ratio);
    println!("optimum/{}\t{}", summary.index, summary.optimum_ratio);
}

fn print_sub_periods(data: &Path, output_dir: Option<&Path>, index: Option<&Path>) -> Result<()> {
    let universe = load_universe(data, &DataConfig::default())?;
    for fund in universe.funds() {
        let Some(span) = fund.duration().checked_sub(1) else {
            continue;
        };
        println!("{}\t{}", fund.name(), fund.features.mean_sub_period_return(0, span));
    }

    if let Some(dir) = output_dir {
        let series = index.map(load_index_series).transpose()?;
        let written = write_sub_periods(&universe, series.as_ref(), dir)?;
        info!("Wrote {} sub-period tables", written);
    }
    Ok(())
}

fn run_optimizer(
    data: &Path,
    config: OptimizerConfig,
    backtest: &BacktestArgs,
    output: OutputFormat,
) -> Result<()> {
    let universe = load_universe(data, &DataConfig::default())?;
    let backtest_config = backtest.to_config();
    let start = vec![0.0; config.dimension()];
    let mut optimizer = WeightOptimizer::new(&universe, &backtest_config, config)?;

    match output {
        OutputFormat::Json => {
            let rounds = optimizer.run_from(start)?;
            let json = serde_json::to_string_pretty(&rounds)?;
            println!("{}", json);
        }
        _ => {
            optimizer.run_with(start, |round| println!("{}", round.to_tsv_line()))?;
        }
    }
    Ok(())
}

fn validate_data(data: &Path) -> Result<()> {
    println!("Validating fund file: {}", data.display());

    let records = load_funds(data, &DataConfig::default())?;
    let durations: Vec<usize> = records.iter().map(|r| r.duration()).collect();
    let longest = durations.iter().copied().max().unwrap_or(0);
    let shortest = durations.iter().copied().min().unwrap_or(0);
    let average = durations.iter().sum::<usize>() as f64 / durations.len() as f64;

    println!("\nData Summary:");
    println!("  Funds: {}", records.len());
    println!("  History: {} - {} months (average {:.1})", shortest, longest, average);

    let universe = Universe::build(records)?;
    let as_of_months = universe.max_duration().saturating_sub(1);
    if as_of_months == 0 {
        return Err(FundError::InvalidInput(
            "no fund has more than one month of history".to_string(),
        ));
    }
    println!("  As-of months available: {}", as_of_months);

    println!("\nValidation: PASSED");
    Ok(())
}

fn print_strategies() {
    println!("\nAvailable Strategies:\n");

    println!("Baselines:");
    println!("  random");
    println!("    Uniformly random eligible funds. Parameters: num_funds, min_history");
    println!();
    println!("  fixed");
    println!("    The funds at fixed positions of the input file. Parameters: indices");
    println!();
    println!("  all");
    println!("    Every eligible fund, equally weighted. Parameters: min_history");
    println!();

    println!("Feature-driven:");
    println!("  top_by_feature");
    println!("    Best or worst funds by one feature over a look-back window.");
    println!("    Parameters: num_funds, feature, direction, lookback, min_history");
    println!();
    println!("  weighted");
    println!("    Greedy picks by a weighted sum of ratio-to-best features.");
    println!("    Parameters: num_funds, weights (6 shared or 6 per fund), lookback, min_history");
    println!();
    println!("  budget_greedy");
    println!("    Best annualized returns first, investing each minimum within a budget.");
    println!("    Parameters: budget, min_history");
    println!();

    println!("External scores:");
    println!("  prediction");
    println!("    Ranks funds by scores from a metadata/predictions file pair.");
    println!("    Parameters: num_funds");
    println!();

    println!("Features:");
    for kind in FeatureKind::ALL {
        println!("  {}", kind);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_sweep() {
        let cli = Cli::try_parse_from([
            "fundsim",
            "sweep",
            "-d",
            "funds.tsv",
            "--max-funds",
            "3",
            "--features",
            "return,stdDev",
            "--aggregation",
            "mean",
            "-vv",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Sweep {
                max_funds,
                features,
                backtest,
                ..
            } => {
                assert_eq!(max_funds, 3);
                assert_eq!(features, vec![FeatureKind::Return, FeatureKind::StdDev]);
                assert_eq!(backtest.to_config().aggregation, Aggregation::Mean);
            }
            _ => panic!("Expected Sweep command"),
        }
    }

    #[test]
    fn test_cli_parse_run_config() {
        let cli = Cli::try_parse_from(["fundsim", "run-config", "-c", "sweep.toml", "-o", "json"])
            .unwrap();
        assert!(cli.output == OutputFormat::Json);
        assert!(matches!(cli.command, Commands::RunConfig { .. }));
    }

    #[test]
    fn test_cli_parse_init_keeps_global_output() {
        let cli = Cli::try_parse_from(["fundsim", "init", "--path", "my.toml", "-o", "table"])
            .unwrap();
        assert!(cli.output == OutputFormat::Table);
        match cli.command {
            Commands::Init { path } => assert_eq!(path, PathBuf::from("my.toml")),
            _ => panic!("Expected Init command"),
        }
    }

    #[test]
    fn test_cli_parse_init_defaults() {
        let cli = Cli::try_parse_from(["fundsim", "init"]).unwrap();
        assert!(cli.output == OutputFormat::Tsv);
        match cli.command {
            Commands::Init { path } => assert_eq!(path, PathBuf::from("sweep.toml")),
            _ => panic!("Expected Init command"),
        }
    }

    #[test]
    fn test_cli_parse_export_paths() {
        let cli = Cli::try_parse_from([
            "fundsim",
            "run-config",
            "-c",
            "sweep.toml",
            "--export",
            "results.json",
        ])
        .unwrap();
        match cli.command {
            Commands::RunConfig { export, .. } => {
                assert_eq!(export, Some(PathBuf::from("results.json")))
            }
            _ => panic!("Expected RunConfig command"),
        }

        let cli = Cli::try_parse_from(["fundsim", "sweep", "--export", "out.tsv"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Sweep { export: Some(_), .. }
        ));
    }

    #[test]
    fn test_cli_parse_sub_periods() {
        let cli = Cli::try_parse_from([
            "fundsim",
            "sub-periods",
            "-d",
            "funds.tsv",
            "--output-dir",
            "subperiods",
            "-i",
            "cdi.tsv",
        ])
        .unwrap();
        match cli.command {
            Commands::SubPeriods {
                output_dir, index, ..
            } => {
                assert_eq!(output_dir, Some(PathBuf::from("subperiods")));
                assert_eq!(index, Some(PathBuf::from("cdi.tsv")));
            }
            _ => panic!("Expected SubPeriods command"),
        }
        assert!(Cli::try_parse_from(["fundsim", "sub-periods", "-i", "cdi.tsv"]).is_err());
    }

    #[test]
    fn test_predictions_require_both_files() {
        let result = Cli::try_parse_from([
            "fundsim",
            "sweep",
            "--prediction-metadata",
            "meta.tsv",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_feature_is_rejected() {
        let result = Cli::try_parse_from(["fundsim", "sweep", "--features", "sharpe"]);
        assert!(result.is_err());
    }
}
