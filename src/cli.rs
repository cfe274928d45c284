//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::info;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::text_report::TextReport;
use crate::domain::backtest::{self as backtest_engine, BacktestConfig, BacktestResult};
use crate::domain::candle::CandleSeries;
use crate::domain::config_validation::{build_backtest_config, data_path};
use crate::domain::error::TraderError;
use crate::domain::indicator::pattern::{is_doji, support_level, SUPPORT_LOOKBACK};
use crate::domain::indicator_engine::compute_indicators;
use crate::domain::signal::{volume_spike, OpportunityChecklist};
use crate::domain::strategy::{StrategyConfig, StrategyKind};
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "candletrader", about = "Single-asset candle strategy backtester")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a backtest over a candle file
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        /// Candle CSV, overrides [backtest] data
        #[arg(short, long)]
        data: Option<PathBuf>,
        /// Write the report here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Include one indicator line per candle
        #[arg(long)]
        diagnostics: bool,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Check the latest candle for a multi-factor entry
    Detect {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        data: Option<PathBuf>,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let outcome = match cli.command {
        Command::Backtest {
            config,
            data,
            output,
            diagnostics,
        } => run_backtest(&config, data, output, diagnostics),
        Command::Validate { config } => run_validate(&config),
        Command::Detect { config, data } => run_detect(&config, data),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn load_config(path: &Path) -> Result<(FileConfigAdapter, BacktestConfig), TraderError> {
    eprintln!("Loading config from {}", path.display());
    let adapter = FileConfigAdapter::from_file(path)?;
    let config = build_backtest_config(&adapter)?;
    Ok((adapter, config))
}

/// `--data` wins over `[backtest] data`.
fn resolve_data_path(
    cli_data: Option<PathBuf>,
    adapter: &FileConfigAdapter,
) -> Result<PathBuf, TraderError> {
    cli_data
        .or_else(|| data_path(adapter).map(PathBuf::from))
        .ok_or_else(|| TraderError::ConfigMissing {
            section: "backtest".into(),
            key: "data".into(),
        })
}

/// Fetch and ingest candles. Malformed records are dropped and logged; an
/// empty result is an error.
pub fn load_series(data_port: &dyn DataPort) -> Result<CandleSeries, TraderError> {
    let raws = data_port.fetch_candles()?;
    let total = raws.len();
    let (series, rejected) = CandleSeries::ingest(raws);
    info!(
        source = %data_port.describe(),
        total,
        accepted = series.len(),
        rejected = rejected.len(),
        "candles loaded"
    );

    if series.is_empty() {
        return Err(TraderError::NoData {
            origin: data_port.describe(),
        });
    }
    Ok(series)
}

pub fn run_backtest_pipeline(
    data_port: &dyn DataPort,
    config: &BacktestConfig,
    report: &dyn ReportPort,
) -> Result<BacktestResult, TraderError> {
    let series = load_series(data_port)?;
    let result = backtest_engine::run_backtest(&series, config)?;
    report.write(&result, config)?;
    Ok(result)
}

fn run_backtest(
    config_path: &Path,
    data: Option<PathBuf>,
    output: Option<PathBuf>,
    diagnostics: bool,
) -> Result<(), TraderError> {
    let (adapter, config) = load_config(config_path)?;
    let data_path = resolve_data_path(data, &adapter)?;
    eprintln!(
        "Running {} backtest on {}",
        config.strategy.kind,
        data_path.display()
    );

    let data_port = CsvAdapter::new(data_path);
    let report = TextReport::new(output.clone(), diagnostics);
    let result = run_backtest_pipeline(&data_port, &config, &report)?;

    eprintln!(
        "Processed {} candles, {} trades",
        result.candles_processed,
        result.ledger.len()
    );
    if let Some(path) = output {
        eprintln!("Report written to {}", path.display());
    }
    Ok(())
}

fn run_validate(config_path: &Path) -> Result<(), TraderError> {
    let (adapter, config) = load_config(config_path)?;
    let strategy = &config.strategy;

    eprintln!("\nStrategy:         {}", strategy.kind);
    eprintln!("Initial balance:  {:.2}", config.initial_balance);
    eprintln!(
        "RSI thresholds:   buy < {}, sell > {}",
        strategy.rsi_buy_threshold, strategy.rsi_sell_threshold
    );
    eprintln!("Profit cap:       {}%", strategy.profit_cap_pct);

    let mut indicators: Vec<String> = strategy
        .required_indicators()
        .iter()
        .map(|i| i.to_string())
        .collect();
    indicators.sort();
    eprintln!("\nIndicators to compute:");
    for ind in &indicators {
        eprintln!("  {}", ind);
    }

    match data_path(&adapter) {
        Some(path) => eprintln!("\nData: {}", path),
        None => eprintln!("\nData: none configured (pass --data)"),
    }

    eprintln!("\nConfiguration is valid.");
    Ok(())
}

/// Multi-factor readout for the latest candle.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub index: usize,
    pub close: f64,
    /// `None` while any of the six inputs is still warming up.
    pub checklist: Option<OpportunityChecklist>,
    pub volume_spike: Option<bool>,
    pub doji: bool,
    pub support: Option<f64>,
}

impl Detection {
    pub fn is_opportunity(&self) -> bool {
        self.checklist.is_some_and(|c| c.all())
    }
}

pub fn detect_opportunity(series: &CandleSeries, strategy: &StrategyConfig) -> Option<Detection> {
    let last = series.last()?;
    let index = series.len() - 1;
    let strategy = StrategyConfig {
        kind: StrategyKind::MultiFactor,
        ..strategy.clone()
    };

    let indicators = compute_indicators(series, &strategy.required_indicators());
    let sample = indicators.sample(series, index, &strategy)?;

    Some(Detection {
        index,
        close: last.close,
        checklist: OpportunityChecklist::evaluate(&sample, &strategy),
        volume_spike: volume_spike(&sample, &strategy),
        doji: is_doji(last),
        support: support_level(series.candles(), SUPPORT_LOOKBACK),
    })
}

fn yes_no(flag: bool) -> &'static str {
    if flag { "yes" } else { "no" }
}

fn run_detect(config_path: &Path, data: Option<PathBuf>) -> Result<(), TraderError> {
    let (adapter, config) = load_config(config_path)?;
    let data_port = CsvAdapter::new(resolve_data_path(data, &adapter)?);
    let series = load_series(&data_port)?;

    let Some(detection) = detect_opportunity(&series, &config.strategy) else {
        return Err(TraderError::NoData {
            origin: data_port.describe(),
        });
    };

    println!("Candle {} close {}", detection.index, detection.close);
    match &detection.checklist {
        Some(checklist) => {
            for (name, passed) in checklist.checks() {
                println!("  [{}] {}", if passed { "x" } else { " " }, name);
            }
        }
        None => println!("  insufficient data for the multi-factor checks"),
    }
    match detection.volume_spike {
        Some(spike) => println!("Volume spike:     {}", yes_no(spike)),
        None => println!("Volume spike:     n/a"),
    }
    println!("Doji:             {}", yes_no(detection.doji));
    match detection.support {
        Some(level) => println!("Support level:    {}", level),
        None => println!("Support level:    n/a"),
    }
    println!(
        "Buy opportunity:  {}",
        yes_no(detection.is_opportunity())
    );
    Ok(())
}
